// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::builtins::utils::incorrect_argument;
use crate::error::Result;
use crate::grouping::GroupKey;
use crate::operators::{arithmetic, ArithOp};
use crate::value::Value;

use core::cmp::Ordering;
use core::fmt;
use std::collections::BTreeSet;

use bigdecimal::BigDecimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    /// `COUNT(*)`: every row, unknowns included.
    CountStar,
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AggregateFunction::CountStar => "count(*)",
            AggregateFunction::Count => "count",
            AggregateFunction::Sum => "sum",
            AggregateFunction::Avg => "avg",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
        })
    }
}

/// Running state of one aggregate over a group.
#[derive(Debug, Clone)]
pub struct Accumulator {
    function: AggregateFunction,
    seen: Option<BTreeSet<GroupKey>>,
    count: u64,
    acc: Option<Value>,
}

impl Accumulator {
    pub fn new(function: AggregateFunction, distinct: bool) -> Self {
        Self {
            function,
            seen: distinct.then(BTreeSet::new),
            count: 0,
            acc: None,
        }
    }

    pub fn add(&mut self, v: &Value) -> Result<()> {
        if v.is_unknown() && self.function != AggregateFunction::CountStar {
            return Ok(());
        }
        if let Some(seen) = &mut self.seen {
            if !seen.insert(GroupKey::single(v.clone())) {
                return Ok(());
            }
        }
        match self.function {
            AggregateFunction::CountStar | AggregateFunction::Count => {}
            AggregateFunction::Sum | AggregateFunction::Avg => {
                if !v.kind().is_number() {
                    let name = self.function.to_string();
                    return Err(incorrect_argument(&name, 0, "INT, FLOAT or DECIMAL", v));
                }
                self.acc = Some(match self.acc.take() {
                    None => v.clone(),
                    Some(total) => arithmetic(ArithOp::Add, &total, v)?,
                });
            }
            AggregateFunction::Min | AggregateFunction::Max => {
                let wanted = if self.function == AggregateFunction::Min {
                    Ordering::Less
                } else {
                    Ordering::Greater
                };
                let replace = self
                    .acc
                    .as_ref()
                    .map_or(true, |current| v.total_cmp(current) == wanted);
                if replace {
                    self.acc = Some(v.clone());
                }
            }
        }
        self.count += 1;
        Ok(())
    }

    pub fn finish(self) -> Result<Value> {
        match self.function {
            AggregateFunction::CountStar | AggregateFunction::Count => Ok(Value::from(self.count)),
            AggregateFunction::Avg => match self.acc {
                None => Ok(Value::NULL),
                Some(Value::Float(total)) => {
                    #[allow(clippy::as_conversions)]
                    let n = self.count as f64;
                    Ok(Value::Float(total / n))
                }
                Some(total) => {
                    let n = Value::decimal(BigDecimal::from(self.count));
                    let total = match total {
                        Value::Int(i) => Value::decimal(i.to_decimal()),
                        other => other,
                    };
                    arithmetic(ArithOp::Div, &total, &n)
                }
            },
            _ => Ok(self.acc.unwrap_or(Value::NULL)),
        }
    }
}

/// Aggregate a whole group of values at once.
pub fn aggregate(function: AggregateFunction, distinct: bool, values: &[Value]) -> Result<Value> {
    let mut acc = Accumulator::new(function, distinct);
    for v in values {
        acc.add(v)?;
    }
    acc.finish()
}
