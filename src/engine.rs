// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::aggregates::{aggregate, AggregateFunction};
use crate::cast;
use crate::error::Result;
use crate::evaluator::{Bindings, Evaluator};
use crate::expr::Expr;
use crate::grouping::{self, GroupBy};
use crate::options::{EvaluationOptions, TypingMode};
use crate::registry::TypeRegistry;
use crate::types::TypeDescriptor;
use crate::value::Value;
use crate::Rc;

/// The evaluation engine.
///
/// Holds the options and the custom type registry. Clones share the registry.
#[derive(Debug, Clone)]
pub struct Engine {
    options: EvaluationOptions,
    registry: Rc<TypeRegistry>,
}

/// Create an engine with default options.
impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self {
            options: EvaluationOptions::default(),
            registry: Rc::new(TypeRegistry::new()),
        }
    }

    /// Create an engine with the given options.
    ///
    /// Fails with `SEMANTIC_INVALID_OPTION` if the options are out of range.
    pub fn with_options(options: EvaluationOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            options,
            registry: Rc::new(TypeRegistry::new()),
        })
    }

    pub fn options(&self) -> &EvaluationOptions {
        &self.options
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Register a custom type whose members are given as type text.
    ///
    /// ```text
    /// engine.register_type("ES_ANY", &["INT", "FLOAT", "STRING"])?;
    /// ```
    pub fn register_type(&self, name: &str, members: &[&str]) -> Result<TypeDescriptor> {
        let members = members
            .iter()
            .map(|m| self.compile_type(m))
            .collect::<Result<Vec<_>>>()?;
        self.registry
            .register(name, members)
            .map(TypeDescriptor::Custom)
    }

    /// Parse type text against the registry and check it under the current options.
    pub fn compile_type(&self, text: &str) -> Result<TypeDescriptor> {
        let t = TypeDescriptor::parse(text, Some(self.registry.as_ref()))?;
        t.validate(&self.options)?;
        Ok(t)
    }

    pub fn eval(&self, expr: &Expr, bindings: &Bindings) -> Result<Value> {
        Evaluator::new(&self.options).eval(expr, bindings)
    }

    /// Evaluate and convert the result to what the host sees.
    pub fn eval_and_observe(&self, expr: &Expr, bindings: &Bindings) -> Result<Value> {
        Ok(self.observe(self.eval(expr, bindings)?))
    }

    /// Legacy typing mode shows a top-level `MISSING` to the host as `NULL`.
    pub fn observe(&self, value: Value) -> Value {
        match (self.options.typing_mode, value) {
            (TypingMode::Legacy, Value::Missing) => Value::NULL,
            (_, v) => v,
        }
    }

    pub fn cast(&self, value: &Value, target: &TypeDescriptor) -> Result<Value> {
        cast::cast(value, target, &self.options)
    }

    pub fn can_cast(&self, value: &Value, target: &TypeDescriptor) -> Result<bool> {
        cast::can_cast(value, target, &self.options)
    }

    pub fn can_lossless_cast(&self, value: &Value, target: &TypeDescriptor) -> Result<bool> {
        cast::can_lossless_cast(value, target, &self.options)
    }

    pub fn is_type(&self, value: &Value, target: &TypeDescriptor) -> bool {
        cast::is_type(value, target, &self.options)
    }

    pub fn distinct(&self, values: impl IntoIterator<Item = Value>) -> Vec<Value> {
        grouping::distinct(values)
    }

    /// Partition `rows` by the values of `keys` evaluated with each row's fields bound.
    pub fn group_by(&self, rows: impl IntoIterator<Item = Value>, keys: &[&Expr]) -> Result<GroupBy> {
        let evaluator = Evaluator::new(&self.options);
        let mut groups = GroupBy::new();
        for row in rows {
            let bindings = Bindings::from_struct(&row);
            let key = keys
                .iter()
                .map(|k| evaluator.eval(k, &bindings))
                .collect::<Result<Vec<_>>>()?;
            groups.add(key, row);
        }
        Ok(groups)
    }

    pub fn aggregate(&self, function: AggregateFunction, distinct: bool, values: &[Value]) -> Result<Value> {
        aggregate(function, distinct, values)
    }
}
