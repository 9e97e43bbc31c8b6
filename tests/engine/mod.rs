// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use anyhow::Result;
use qval::operators::{and, or, ArithOp, CmpOp};
use qval::*;

const VALUES: &[&str] = &[
    "null",
    "null.int",
    "$missing::null",
    "true",
    "0",
    "-17",
    "9223372036854775808",
    "1.9",
    "-2.50",
    "1234",
    "0.1",
    "1.5e0",
    "nan",
    "-inf",
    "$date::2021-02-28",
    "$time::{hour: 23, minute: 59, second: 59.125}",
    "2007-02-23T12:14:33.079-08:00",
    "2007-02-23T00:00Z",
    "\"\"",
    "\"abcde\"",
    "\"12\"",
    "\"true\"",
    "\"2020-01-02\"",
    "'sym'",
    "{{ \"clob\" }}",
    "{{ aGVsbG8= }}",
    "[1, \"a\", null]",
    "(1 2)",
    "{a: 1, b: $missing::null}",
    "$ordered::{a: 1}",
    "$bag::[1, 1]",
];

const TYPES: &[&str] = &[
    "ANY",
    "NULL",
    "MISSING",
    "BOOL",
    "SMALLINT",
    "INT4",
    "INT",
    "FLOAT",
    "DECIMAL",
    "DECIMAL(3)",
    "DECIMAL(5, 2)",
    "DATE",
    "TIME",
    "TIME(2) WITH TIME ZONE",
    "TIMESTAMP",
    "CHAR(3)",
    "VARCHAR(4)",
    "STRING",
    "SYMBOL",
    "CLOB",
    "BLOB",
    "LIST",
    "SEXP",
    "STRUCT",
    "BAG",
];

fn values() -> Result<Vec<Value>> {
    Ok(VALUES
        .iter()
        .map(|t| Value::from_text(t))
        .collect::<qval::Result<Vec<_>>>()?)
}

fn engines() -> Result<Vec<Engine>> {
    let mut engines = vec![];
    for cast_mode in [CastMode::Unconstrained, CastMode::Honored] {
        for typing_mode in [TypingMode::Legacy, TypingMode::Permissive] {
            engines.push(Engine::with_options(
                EvaluationOptions::new()
                    .with_cast_mode(cast_mode)
                    .with_typing_mode(typing_mode),
            )?);
        }
    }
    Ok(engines)
}

#[test]
fn encoding_round_trips() -> Result<()> {
    for v in values()? {
        let text = v.to_text();
        let back = Value::from_text(&text)?;
        assert!(back.strict_eq(&v), "{text} read back as {back}");
    }
    Ok(())
}

#[test]
fn casts_are_total() -> Result<()> {
    for engine in engines()? {
        for t in TYPES {
            let target = engine.compile_type(t)?;
            for v in values()? {
                match engine.cast(&v, &target) {
                    Ok(_) => (),
                    Err(e) => assert!(
                        e.code().cast_failure_kind().is_some(),
                        "CAST({v} AS {t}) raised {}",
                        e.code()
                    ),
                }
            }
        }
    }
    Ok(())
}

#[test]
fn sentinels_are_preserved() -> Result<()> {
    for engine in engines()? {
        for t in TYPES {
            let target = engine.compile_type(t)?;
            for v in [Value::Missing, Value::NULL, Value::typed_null(Kind::String)] {
                assert!(engine.cast(&v, &target)?.strict_eq(&v));
                assert!(engine.can_cast(&v, &target)?);
                assert!(engine.can_lossless_cast(&v, &target)?);
            }
        }
    }
    Ok(())
}

#[test]
fn lossless_implies_can_cast_implies_cast() -> Result<()> {
    for engine in engines()? {
        for t in TYPES {
            let target = engine.compile_type(t)?;
            for v in values()? {
                let lossless = engine.can_lossless_cast(&v, &target)?;
                let can = engine.can_cast(&v, &target)?;
                assert!(!lossless || can, "{v} AS {t}");
                assert_eq!(can, engine.cast(&v, &target).is_ok(), "{v} AS {t}");
            }
        }
    }
    Ok(())
}

#[test]
fn and_or_absorb_unknowns() -> Result<()> {
    for unknown in [Value::NULL, Value::Missing] {
        assert_eq!(and(Value::from(false), || Ok(unknown.clone()))?, Value::from(false));
        assert_eq!(and(unknown.clone(), || Ok(Value::from(false)))?, Value::from(false));
        assert_eq!(or(Value::from(true), || Ok(unknown.clone()))?, Value::from(true));
        assert_eq!(or(unknown.clone(), || Ok(Value::from(true)))?, Value::from(true));
    }
    Ok(())
}

#[test]
fn honored_parameters_truncate() -> Result<()> {
    let engine = Engine::with_options(EvaluationOptions::new().with_cast_mode(CastMode::Honored))?;
    let varchar = engine.compile_type("VARCHAR(4)")?;
    let abcde = Value::string("abcde");
    assert_eq!(engine.cast(&abcde, &varchar)?, Value::string("abcd"));
    assert!(!engine.can_lossless_cast(&abcde, &varchar)?);
    assert!(engine.can_lossless_cast(&Value::string(""), &varchar)?);

    let err = engine
        .cast(&Value::from(1234), &engine.compile_type("DECIMAL(3)")?)
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::EvaluatorDecimalOverflow);
    assert_eq!(err.property(Property::Precision).and_then(|p| p.as_integer()), Some(3));
    Ok(())
}

#[test]
fn integer_cast_depends_on_mode() -> Result<()> {
    let v = Value::from_text("1.9")?;
    let unconstrained = Engine::new();
    assert_eq!(unconstrained.cast(&v, &unconstrained.compile_type("INT")?)?, Value::from(1));
    let honored = Engine::with_options(EvaluationOptions::new().with_cast_mode(CastMode::Honored))?;
    assert_eq!(honored.cast(&v, &honored.compile_type("INT")?)?, Value::from(2));
    Ok(())
}

#[test]
fn distinct_keeps_null_and_missing_apart() {
    let rows = Engine::new().distinct([Value::Missing, Value::NULL, Value::NULL, Value::Missing]);
    assert_eq!(rows.len(), 2);
}

fn failing_expressions(engine: &Engine) -> Result<Vec<(ErrorCode, Ref<Expr>)>> {
    let at = SourceLocation::new(3, 14);
    let lit = |text: &str| -> Result<Ref<Expr>> { Ok(Expr::literal(at, Value::from_text(text)?)) };
    let cast = |text: &str, t: &str| -> Result<Ref<Expr>> {
        Ok(Expr::cast(at, CastOp::Cast, lit(text)?, engine.compile_type(t)?))
    };
    Ok(vec![
        (ErrorCode::EvaluatorCastFailed, cast("\"a\"", "INT")?),
        (ErrorCode::EvaluatorInvalidCast, cast("[1]", "INT")?),
        (ErrorCode::EvaluatorIntegerOverflow, cast("40000", "SMALLINT")?),
        (ErrorCode::EvaluatorDecimalOverflow, cast("1234", "DECIMAL(3)")?),
        (
            ErrorCode::EvaluatorDivideByZero,
            Expr::arith(at, ArithOp::Div, lit("1")?, lit("0")?),
        ),
        (
            ErrorCode::EvaluatorModuloByZero,
            Expr::arith(at, ArithOp::Mod, lit("1")?, lit("0")?),
        ),
        (
            ErrorCode::EvaluatorIncompatibleOperands,
            Expr::arith(at, ArithOp::Add, lit("1")?, lit("\"a\"")?),
        ),
        (
            ErrorCode::EvaluatorInvalidComparison,
            Expr::cmp(at, CmpOp::Lt, lit("1")?, lit("\"a\"")?),
        ),
        (
            ErrorCode::EvaluatorIncorrectTypeOfArgumentsToFuncCall,
            Expr::call(at, "upper", vec![lit("1")?])?,
        ),
    ])
}

#[test]
fn permissive_mode_demotes_evaluator_failures() -> Result<()> {
    let honored = EvaluationOptions::new().with_cast_mode(CastMode::Honored);
    let legacy = Engine::with_options(honored.clone())?;
    let permissive = Engine::with_options(honored.with_typing_mode(TypingMode::Permissive))?;

    for (code, expr) in failing_expressions(&legacy)? {
        let err = legacy.eval(&expr, &Bindings::new()).unwrap_err();
        assert_eq!(err.code(), code);
        assert_eq!(err.location(), Some(SourceLocation::new(3, 14)));
        assert_eq!(
            err.property(Property::LineNumber).and_then(|p| p.as_integer()),
            Some(3)
        );
        assert!(err.is_demotable());

        let v = permissive.eval(&expr, &Bindings::new())?;
        assert!(v.is_missing(), "{code} gave {v}");
        assert!(legacy.observe(Value::Missing).is_null());
    }
    Ok(())
}

#[test]
fn custom_union_types() -> Result<()> {
    let engine = Engine::new();
    engine.register_type("INT_OR_BOOL", &["INT", "BOOL"])?;
    let t = engine.compile_type("int_or_bool")?;
    assert_eq!(engine.cast(&Value::from(true), &t)?, Value::from(true));
    assert_eq!(engine.cast(&Value::string("7"), &t)?, Value::from(7));
    assert_eq!(
        engine.cast(&Value::string("x"), &t).unwrap_err().code(),
        ErrorCode::EvaluatorCastFailed
    );
    assert_eq!(
        engine.cast(&Value::from_text("[1]")?, &t).unwrap_err().code(),
        ErrorCode::EvaluatorInvalidCast
    );

    let err = engine.register_type("bad", &["INT_OR_BOOL", "STRING"]).unwrap_err();
    assert_eq!(err.code(), ErrorCode::SemanticUnionTypeInvalid);
    let err = engine.compile_type("NO_SUCH_TYPE").unwrap_err();
    assert_eq!(err.code(), ErrorCode::SemanticUnknownType);
    Ok(())
}
