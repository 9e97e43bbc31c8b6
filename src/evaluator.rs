// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::cast;
use crate::error::{Error, ErrorCode, Property, Result};
use crate::expr::{CastOp, CollectionKind, Expr, UnaryOp};
use crate::operators::*;
use crate::options::EvaluationOptions;
use crate::value::{StructOrdering, Value};
use crate::Rc;

use std::collections::BTreeMap;

use tracing::debug;

/// Named values visible to an expression.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    vars: BTreeMap<Rc<str>, Value>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind every field of a struct. Anything else yields no bindings.
    pub fn from_struct(value: &Value) -> Self {
        let mut b = Self::new();
        if let Some(s) = value.as_struct() {
            for (name, v) in s.fields() {
                b.vars.entry(name.clone()).or_insert_with(|| v.clone());
            }
        }
        b
    }

    pub fn insert(&mut self, name: &str, value: Value) -> Option<Value> {
        self.vars.insert(name.into(), value)
    }

    pub fn with(mut self, name: &str, value: Value) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str, options: &EvaluationOptions) -> Option<&Value> {
        if let Some(v) = self.vars.get(name) {
            return Some(v);
        }
        self.vars
            .iter()
            .find(|(n, _)| options.case_sensitivity.names_match(n, name))
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// Tree-walking evaluator.
///
/// In permissive typing mode a demotable failure at any node becomes
/// `MISSING` at that node and evaluation of the enclosing expression goes on.
pub struct Evaluator<'a> {
    options: &'a EvaluationOptions,
}

impl<'a> Evaluator<'a> {
    pub fn new(options: &'a EvaluationOptions) -> Self {
        Self { options }
    }

    pub fn eval(&self, expr: &Expr, bindings: &Bindings) -> Result<Value> {
        self.eval_expr(expr, bindings)
    }

    fn eval_expr(&self, expr: &Expr, bindings: &Bindings) -> Result<Value> {
        match self.eval_node(expr, bindings) {
            Ok(v) => Ok(v),
            Err(err) => {
                let err = err.at_if_unknown(expr.loc());
                if self.options.is_permissive() && err.is_demotable() {
                    debug!(code = %err.code(), location = %expr.loc(), "demoted to MISSING");
                    Ok(Value::Missing)
                } else {
                    Err(err)
                }
            }
        }
    }

    fn eval_all(&self, exprs: &[crate::expr::Ref<Expr>], bindings: &Bindings) -> Result<Vec<Value>> {
        exprs.iter().map(|e| self.eval_expr(e, bindings)).collect()
    }

    fn negate_if(negated: bool, v: Value) -> Result<Value> {
        if negated {
            not(&v)
        } else {
            Ok(v)
        }
    }

    fn eval_node(&self, expr: &Expr, bindings: &Bindings) -> Result<Value> {
        match expr {
            Expr::Literal { value, .. } => Ok(value.clone()),

            Expr::Var { name, .. } => bindings.get(name, self.options).cloned().ok_or_else(|| {
                Error::new(
                    ErrorCode::EvaluatorBindingDoesNotExist,
                    format!("no such binding `{name}`"),
                )
                .with_property(Property::BindingName, name.as_ref())
            }),

            Expr::Field { base, name, .. } => Ok(self
                .eval_expr(base, bindings)?
                .field(name, self.options.case_sensitivity)),

            Expr::Index { base, index, .. } => {
                let base = self.eval_expr(base, bindings)?;
                let index = self.eval_expr(index, bindings)?;
                Ok(match index.as_i64().and_then(|i| usize::try_from(i).ok()) {
                    Some(i) => base.index(i),
                    None => Value::Missing,
                })
            }

            Expr::Unary { op, operand, .. } => {
                let v = self.eval_expr(operand, bindings)?;
                match op {
                    UnaryOp::Neg => negate(&v),
                    UnaryOp::Plus => unary_plus(&v),
                    UnaryOp::Not => not(&v),
                }
            }

            Expr::Arith { op, lhs, rhs, .. } => {
                let (a, b) = (self.eval_expr(lhs, bindings)?, self.eval_expr(rhs, bindings)?);
                arithmetic(*op, &a, &b)
            }

            Expr::Cmp { op, lhs, rhs, .. } => {
                let (a, b) = (self.eval_expr(lhs, bindings)?, self.eval_expr(rhs, bindings)?);
                compare(*op, &a, &b)
            }

            Expr::Concat { lhs, rhs, .. } => {
                let (a, b) = (self.eval_expr(lhs, bindings)?, self.eval_expr(rhs, bindings)?);
                concat(&a, &b)
            }

            Expr::And { lhs, rhs, .. } => {
                let a = self.eval_expr(lhs, bindings)?;
                and(a, || self.eval_expr(rhs, bindings))
            }

            Expr::Or { lhs, rhs, .. } => {
                let a = self.eval_expr(lhs, bindings)?;
                or(a, || self.eval_expr(rhs, bindings))
            }

            Expr::Between {
                value,
                low,
                high,
                negated,
                ..
            } => {
                let v = self.eval_expr(value, bindings)?;
                let low = self.eval_expr(low, bindings)?;
                let high = self.eval_expr(high, bindings)?;
                Self::negate_if(*negated, between(&v, &low, &high)?)
            }

            Expr::In {
                value,
                collection,
                negated,
                ..
            } => {
                let v = self.eval_expr(value, bindings)?;
                let c = self.eval_expr(collection, bindings)?;
                if *negated {
                    not_in_collection(&v, &c)
                } else {
                    in_collection(&v, &c)
                }
            }

            Expr::Like {
                value,
                pattern,
                escape,
                matcher,
                negated,
                ..
            } => {
                let v = self.eval_expr(value, bindings)?;
                let r = match matcher {
                    Some(m) => like_with(&v, m)?,
                    None => {
                        let p = self.eval_expr(pattern, bindings)?;
                        let e = match escape {
                            Some(e) => Some(self.eval_expr(e, bindings)?),
                            None => None,
                        };
                        debug!(pattern = %p, "compiling LIKE pattern for one row");
                        like(&v, &p, e.as_ref())?
                    }
                };
                Self::negate_if(*negated, r)
            }

            Expr::Cast {
                op, value, target, ..
            } => {
                let v = self.eval_expr(value, bindings)?;
                match op {
                    CastOp::Cast => cast::cast(&v, target, self.options),
                    CastOp::CanCast => cast::can_cast(&v, target, self.options).map(Value::Bool),
                    CastOp::CanLosslessCast => {
                        cast::can_lossless_cast(&v, target, self.options).map(Value::Bool)
                    }
                }
            }

            Expr::IsType {
                value,
                target,
                negated,
                ..
            } => {
                let v = self.eval_expr(value, bindings)?;
                target.validate(self.options)?;
                Ok(Value::Bool(
                    cast::is_type(&v, target, self.options) != *negated,
                ))
            }

            Expr::IsNull { value, negated, .. } => {
                let v = self.eval_expr(value, bindings)?;
                Ok(Value::Bool(v.is_unknown() != *negated))
            }

            Expr::IsMissing { value, negated, .. } => {
                let v = self.eval_expr(value, bindings)?;
                Ok(Value::Bool(v.is_missing() != *negated))
            }

            Expr::Call { builtin, args, .. } => {
                let args = self.eval_all(args, bindings)?;
                builtin.invoke(&args)
            }

            Expr::Collection { kind, items, .. } => {
                let items = self.eval_all(items, bindings)?;
                Ok(match kind {
                    CollectionKind::List => Value::list(items),
                    CollectionKind::Sexp => Value::sexp(items),
                    CollectionKind::Bag => Value::bag(items),
                })
            }

            Expr::Struct {
                fields, ordered, ..
            } => {
                let mut out = Vec::with_capacity(fields.len());
                for (name, e) in fields {
                    let v = self.eval_expr(e, bindings)?;
                    if !v.is_missing() {
                        out.push((name.clone(), v));
                    }
                }
                let ordering = if *ordered {
                    StructOrdering::Ordered
                } else {
                    StructOrdering::Unordered
                };
                Ok(Value::from_struct(out, ordering))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Ref;
    use crate::lexer::SourceLocation;
    use crate::options::{CaseSensitivity, TypingMode};
    use crate::types::TypeDescriptor;

    fn at(col: u32) -> SourceLocation {
        SourceLocation::new(1, col)
    }

    fn lit(text: &str) -> Ref<Expr> {
        Expr::literal(at(1), Value::from_text(text).unwrap())
    }

    fn permissive() -> EvaluationOptions {
        EvaluationOptions::new().with_typing_mode(TypingMode::Permissive)
    }

    #[test]
    fn failures_carry_the_node_location() {
        let e = Expr::arith(at(7), ArithOp::Div, lit("1"), lit("0"));
        let err = Evaluator::new(&EvaluationOptions::new())
            .eval(&e, &Bindings::new())
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::EvaluatorDivideByZero);
        assert_eq!(err.location(), Some(at(7)));
    }

    #[test]
    fn permissive_demotes_per_node() {
        let opts = permissive();
        let e = Expr::collection(
            at(1),
            CollectionKind::List,
            vec![Expr::arith(at(2), ArithOp::Div, lit("1"), lit("0")), lit("2")],
        );
        let v = Evaluator::new(&opts).eval(&e, &Bindings::new()).unwrap();
        assert!(v.index(0).is_missing());
        assert_eq!(v.index(1), Value::from(2));

        let e = Expr::cast(
            at(1),
            CastOp::Cast,
            lit("\"abc\""),
            TypeDescriptor::parse("INT", None).unwrap(),
        );
        assert!(Evaluator::new(&opts).eval(&e, &Bindings::new()).unwrap().is_missing());
    }

    #[test]
    fn missing_bindings_are_not_demoted() {
        let e = Expr::var(at(4), "nope");
        let err = Evaluator::new(&permissive())
            .eval(&e, &Bindings::new())
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::EvaluatorBindingDoesNotExist);
        assert_eq!(err.property(Property::BindingName).and_then(|p| p.as_text()), Some("nope"));
    }

    #[test]
    fn binding_lookup_follows_case_sensitivity() {
        let b = Bindings::new().with("Foo", Value::from(1));
        let e = Expr::var(at(1), "foo");
        let opts = EvaluationOptions::new();
        assert_eq!(Evaluator::new(&opts).eval(&e, &b).unwrap(), Value::from(1));
        let opts = opts.with_case_sensitivity(CaseSensitivity::Sensitive);
        assert!(Evaluator::new(&opts).eval(&e, &b).is_err());
    }

    #[test]
    fn and_short_circuits() {
        let boom = Expr::arith(at(9), ArithOp::Div, lit("1"), lit("0"));
        let e = Expr::and(at(1), lit("false"), boom.clone());
        let opts = EvaluationOptions::new();
        assert_eq!(
            Evaluator::new(&opts).eval(&e, &Bindings::new()).unwrap(),
            Value::from(false)
        );
        let e = Expr::or(at(1), lit("true"), boom);
        assert_eq!(
            Evaluator::new(&opts).eval(&e, &Bindings::new()).unwrap(),
            Value::from(true)
        );
    }

    #[test]
    fn paths_and_constructors() {
        let b = Bindings::from_struct(&Value::from_text("{a: {b: [10, 20]}}").unwrap());
        let path = Expr::index(
            at(1),
            Expr::field(at(1), Expr::var(at(1), "a"), "B"),
            lit("1"),
        );
        let opts = EvaluationOptions::new();
        let ev = Evaluator::new(&opts);
        assert_eq!(ev.eval(&path, &b).unwrap(), Value::from(20));
        let out_of_range = Expr::index(at(1), Expr::field(at(1), Expr::var(at(1), "a"), "b"), lit("5"));
        assert!(ev.eval(&out_of_range, &b).unwrap().is_missing());

        let s = Expr::struct_of(
            at(1),
            vec![("x", lit("1")), ("y", Expr::field(at(1), lit("1"), "z")), ("n", lit("null"))],
            false,
        );
        let v = ev.eval(&s, &b).unwrap();
        assert_eq!(v.as_struct().map(|s| s.len()), Some(2));
    }

    #[test]
    fn predicates() {
        let opts = EvaluationOptions::new();
        let ev = Evaluator::new(&opts);
        let b = Bindings::new();
        let is_null = Expr::is_null(at(1), lit("$missing::null"), false);
        assert_eq!(ev.eval(&is_null, &b).unwrap(), Value::from(true));
        let is_missing = Expr::is_missing(at(1), lit("null"), false);
        assert_eq!(ev.eval(&is_missing, &b).unwrap(), Value::from(false));
        let like = Expr::like(at(1), lit("\"abc\""), lit("\"a_c\""), None, true).unwrap();
        assert_eq!(ev.eval(&like, &b).unwrap(), Value::from(false));
        let dynamic = Expr::like(at(1), lit("\"abc\""), Expr::var(at(1), "p"), None, false).unwrap();
        let b = Bindings::new().with("p", Value::string("%c"));
        assert_eq!(ev.eval(&dynamic, &b).unwrap(), Value::from(true));
        let call = Expr::call(at(1), "upper", vec![lit("\"abc\"")]).unwrap();
        assert_eq!(ev.eval(&call, &b).unwrap(), Value::string("ABC"));
    }
}
