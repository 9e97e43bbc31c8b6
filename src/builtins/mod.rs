// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builtin scalar functions.

pub mod nulls;
pub mod numbers;
pub mod strings;
pub mod utils;

use crate::error::{Error, ErrorCode, Property, Result};
use crate::operators::propagate_unknown;
use crate::value::Value;

use std::collections::HashMap;

use lazy_static::lazy_static;

pub type BuiltinFcn = fn(&'static str, &[Value]) -> Result<Value>;

/// How a function treats `NULL` and `MISSING` arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownPolicy {
    /// The strict unknown rule applies before the body runs.
    Propagate,
    /// The body sees unknown arguments.
    PassThrough,
}

#[derive(Debug, Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub min_arity: usize,
    pub max_arity: usize,
    pub policy: UnknownPolicy,
    pub fcn: BuiltinFcn,
}

impl Builtin {
    pub fn check_arity(&self, actual: usize) -> Result<()> {
        if (self.min_arity..=self.max_arity).contains(&actual) {
            return Ok(());
        }
        let expected = if self.min_arity == self.max_arity {
            format!("{}", self.min_arity)
        } else if self.max_arity == usize::MAX {
            format!("at least {}", self.min_arity)
        } else {
            format!("{} to {}", self.min_arity, self.max_arity)
        };
        Err(Error::new(
            ErrorCode::SemanticIncorrectNumberOfArgumentsToFuncCall,
            format!("`{}` expects {expected} argument(s), got {actual}", self.name),
        )
        .with_property(Property::FunctionName, self.name)
        .with_property(Property::ExpectedArityMin, self.min_arity)
        .with_property(Property::ExpectedArityMax, self.max_arity)
        .with_property(Property::ActualArity, actual))
    }

    pub fn invoke(&self, args: &[Value]) -> Result<Value> {
        self.check_arity(args.len())?;
        if self.policy == UnknownPolicy::Propagate {
            if let Some(unknown) = propagate_unknown(args) {
                return Ok(unknown);
            }
        }
        (self.fcn)(self.name, args)
    }
}

pub(crate) fn register(
    m: &mut HashMap<&'static str, Builtin>,
    name: &'static str,
    arity: (usize, usize),
    policy: UnknownPolicy,
    fcn: BuiltinFcn,
) {
    m.insert(
        name,
        Builtin {
            name,
            min_arity: arity.0,
            max_arity: arity.1,
            policy,
            fcn,
        },
    );
}

#[rustfmt::skip]
lazy_static! {
    pub static ref BUILTINS: HashMap<&'static str, Builtin> = {
	let mut m: HashMap<&'static str, Builtin> = HashMap::new();

	nulls::register(&mut m);
	numbers::register(&mut m);
	strings::register(&mut m);

	m
    };
}

/// Find a builtin by case-insensitive name.
pub fn lookup(name: &str) -> Result<&'static Builtin> {
    BUILTINS.get(name.to_ascii_lowercase().as_str()).ok_or_else(|| {
        Error::new(
            ErrorCode::SemanticNoSuchFunction,
            format!("no such function `{name}`"),
        )
        .with_property(Property::FunctionName, name)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_and_arity() {
        assert_eq!(lookup("UPPER").unwrap().name, "upper");
        let err = lookup("frobnicate").unwrap_err();
        assert_eq!(err.code(), ErrorCode::SemanticNoSuchFunction);

        let err = lookup("nullif").unwrap().check_arity(3).unwrap_err();
        assert_eq!(err.code(), ErrorCode::SemanticIncorrectNumberOfArgumentsToFuncCall);
        assert_eq!(err.property(Property::ExpectedArityMin).and_then(|p| p.as_integer()), Some(2));
        assert_eq!(err.property(Property::ActualArity).and_then(|p| p.as_integer()), Some(3));
        assert!(lookup("coalesce").unwrap().check_arity(0).is_err());
    }

    #[test]
    fn policies() {
        let upper = lookup("upper").unwrap();
        assert!(upper.invoke(&[Value::Missing]).unwrap().is_missing());
        let coalesce = lookup("coalesce").unwrap();
        assert_eq!(coalesce.invoke(&[Value::NULL, Value::from(2)]).unwrap(), Value::from(2));
    }
}
