// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use anyhow::{bail, Result};
use qval::operators::{ArithOp, CmpOp};
use qval::*;
use serde::{Deserialize, Serialize};
use test_generator::test_resources;

#[derive(Serialize, Deserialize, PartialEq, Debug)]
#[serde(deny_unknown_fields)]
struct Case {
    note: String,
    op: String,
    args: Vec<String>,
    #[serde(default)]
    permissive: bool,
    result: Option<String>,
    error: Option<String>,
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct Test {
    cases: Vec<Case>,
}

fn build(op: &str, args: Vec<Ref<Expr>>) -> qval::Result<Ref<Expr>> {
    let at = SourceLocation::new(1, 1);
    let arg = |i: usize| args[i].clone();
    let cmp = |op| Expr::cmp(at, op, arg(0), arg(1));
    let arith = |op| Expr::arith(at, op, arg(0), arg(1));
    Ok(match op {
        "not" => Expr::unary(at, UnaryOp::Not, arg(0)),
        "neg" => Expr::unary(at, UnaryOp::Neg, arg(0)),
        "and" => Expr::and(at, arg(0), arg(1)),
        "or" => Expr::or(at, arg(0), arg(1)),
        "=" => cmp(CmpOp::Eq),
        "<>" => cmp(CmpOp::Ne),
        "<" => cmp(CmpOp::Lt),
        "<=" => cmp(CmpOp::Le),
        ">" => cmp(CmpOp::Gt),
        ">=" => cmp(CmpOp::Ge),
        "+" => arith(ArithOp::Add),
        "-" => arith(ArithOp::Sub),
        "*" => arith(ArithOp::Mul),
        "/" => arith(ArithOp::Div),
        "%" => arith(ArithOp::Mod),
        "||" => Expr::concat(at, arg(0), arg(1)),
        "in" => Expr::in_collection(at, arg(0), arg(1), false),
        "not in" => Expr::in_collection(at, arg(0), arg(1), true),
        "between" => Expr::between(at, arg(0), arg(1), arg(2), false),
        "like" => Expr::like(at, arg(0), arg(1), args.get(2).cloned(), false)?,
        "is null" => Expr::is_null(at, arg(0), false),
        "is missing" => Expr::is_missing(at, arg(0), false),
        name => Expr::call(at, name, args.clone())?,
    })
}

fn run_case(case: &Case) -> Result<()> {
    let mode = if case.permissive {
        TypingMode::Permissive
    } else {
        TypingMode::Legacy
    };
    let engine = Engine::with_options(EvaluationOptions::new().with_typing_mode(mode))?;
    let at = SourceLocation::new(1, 1);
    let args = case
        .args
        .iter()
        .map(|a| Ok(Expr::literal(at, Value::from_text(a)?)))
        .collect::<qval::Result<Vec<_>>>()?;

    let outcome = build(&case.op, args).and_then(|e| engine.eval(&e, &Bindings::new()));
    match (outcome, &case.result, &case.error) {
        (Ok(actual), Some(expected), None) => {
            let expected = Value::from_text(expected)?;
            if actual.kind() != expected.kind() || !(actual == expected || actual.value_eq(&expected)) {
                bail!("expected {expected}, got {actual}");
            }
        }
        (Err(e), None, Some(expected)) => {
            if e.code().name() != expected.as_str() {
                bail!("expected {expected}, got {}: {e}", e.code());
            }
        }
        (Ok(actual), _, Some(expected)) => bail!("expected {expected}, got {actual}"),
        (Err(e), _, _) => return Err(e.into()),
        (Ok(_), None, None) => bail!("case has neither result nor error"),
    }
    Ok(())
}

fn yaml_test_impl(file: &str) -> Result<()> {
    println!("\nrunning {file}");

    let yaml = std::fs::read_to_string(file)?;
    let test: Test = serde_yaml::from_str(&yaml)?;

    for case in &test.cases {
        print!("case {} ", &case.note);
        if let Err(e) = run_case(case) {
            bail!("case `{}` failed: {e}", case.note);
        }
        println!("passed");
    }
    println!("{} cases passed.", test.cases.len());
    Ok(())
}

fn yaml_test(file: &str) -> Result<()> {
    match yaml_test_impl(file) {
        Ok(_) => Ok(()),
        Err(e) => {
            // Errors returned from a test are not always printed by cargo test.
            panic!("{}", e);
        }
    }
}

#[test_resources("tests/operators/*.yaml")]
fn run(path: &str) {
    yaml_test(path).unwrap()
}
