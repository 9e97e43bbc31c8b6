// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Equivalence relations and the total order over values.
//!
//! Container comparison runs on an explicit worklist so that nesting depth never
//! translates into native recursion. Multiset comparison (bags, and structs
//! compared by name) needs the children in canonical order. That order is built
//! once per payload, bottom-up, before the comparison starts.

use crate::datetime::{Time, Timestamp};
use crate::number::{decimal_to_f64, float_to_exact_decimal};
use crate::value::{StructOrdering, StructValue, Value};
use crate::Rc;

use core::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use bigdecimal::BigDecimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Equivalence {
    /// Used by `=`, `IN` and the total order. All unknowns are equal.
    Value,
    /// Used by `GROUP BY` and `DISTINCT`. `NULL` and `MISSING` differ.
    Grouping,
    /// Kind-discriminating at every depth.
    Strict,
}

enum Frame<'a> {
    Pair(&'a Value, &'a Value),
    Seq {
        left: Vec<&'a Value>,
        right: Vec<&'a Value>,
        next: usize,
    },
    Fields {
        left: Vec<(&'a str, &'a Value)>,
        right: Vec<(&'a str, &'a Value)>,
        next: usize,
    },
}

enum Visit<'a> {
    Enter(&'a Value),
    Exit(&'a Value),
}

type PayloadId = *const ();

fn vec_id(items: &Rc<Vec<Value>>) -> PayloadId {
    Rc::as_ptr(items).cast()
}

fn struct_id(s: &Rc<StructValue>) -> PayloadId {
    Rc::as_ptr(s).cast()
}

/// Comparison class. Values of different classes are ordered by class.
fn rank(v: &Value, eq: Equivalence) -> u8 {
    match v {
        Value::Missing => 0,
        Value::Null(_) if eq == Equivalence::Value => 0,
        Value::Null(_) => 1,
        Value::Bool(_) => 2,
        Value::Int(_) | Value::Float(_) | Value::Decimal(_) => 3,
        Value::Date(_) => 4,
        Value::Time(_) => 5,
        Value::Timestamp(_) => 6,
        Value::String(_) | Value::Symbol(_) => 7,
        Value::Clob(_) | Value::Blob(_) => 8,
        Value::List(_) | Value::Sexp(_) => 9,
        Value::Struct(_) => 10,
        Value::Bag(_) => 11,
    }
}

/// Compare two values under an equivalence. `Ordering::Equal` means equivalent.
pub fn compare(a: &Value, b: &Value, eq: Equivalence) -> Ordering {
    let mut comparator = Comparator {
        eq,
        orders: BTreeMap::new(),
    };
    comparator.canonicalize(&[a, b]);
    comparator.compare(a, b)
}

pub fn equals(a: &Value, b: &Value, eq: Equivalence) -> bool {
    compare(a, b, eq) == Ordering::Equal
}

struct Comparator {
    eq: Equivalence,
    /// Canonical child order of each bag and struct payload.
    orders: BTreeMap<PayloadId, Vec<usize>>,
}

impl Comparator {
    /// Post-order walk of every container reachable from `roots`. Each payload is
    /// visited once per role, and its children are sorted only after their own
    /// children are. A list payload may also be shared by a bag.
    fn canonicalize<'a>(&mut self, roots: &[&'a Value]) {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<Visit<'a>> = roots.iter().rev().map(|v| Visit::Enter(*v)).collect();
        while let Some(visit) = stack.pop() {
            match visit {
                Visit::Enter(v) => match v {
                    Value::List(items) | Value::Sexp(items) => {
                        if seen.insert((vec_id(items), false)) {
                            stack.extend(items.iter().map(Visit::Enter));
                        }
                    }
                    Value::Bag(items) => {
                        if seen.insert((vec_id(items), true)) {
                            stack.push(Visit::Exit(v));
                            stack.extend(items.iter().map(Visit::Enter));
                        }
                    }
                    Value::Struct(s) => {
                        if seen.insert((struct_id(s), true)) {
                            stack.push(Visit::Exit(v));
                            stack.extend(s.fields().iter().map(|(_, fv)| Visit::Enter(fv)));
                        }
                    }
                    _ => {}
                },
                Visit::Exit(Value::Bag(items)) => {
                    let mut order: Vec<usize> = (0..items.len()).collect();
                    order.sort_by(|&i, &j| self.compare(&items[i], &items[j]));
                    self.orders.insert(vec_id(items), order);
                }
                Visit::Exit(Value::Struct(s)) => {
                    let fields = s.fields();
                    let mut order: Vec<usize> = (0..fields.len()).collect();
                    order.sort_by(|&i, &j| {
                        let ((n1, v1), (n2, v2)) = (&fields[i], &fields[j]);
                        n1.cmp(n2).then_with(|| self.compare(v1, v2))
                    });
                    self.orders.insert(struct_id(s), order);
                }
                Visit::Exit(_) => {}
            }
        }
    }

    fn canonical(&self, id: PayloadId, len: usize) -> Vec<usize> {
        self.orders
            .get(&id)
            .filter(|order| order.len() == len)
            .cloned()
            .unwrap_or_else(|| (0..len).collect())
    }

    fn bag<'a>(&self, items: &'a Rc<Vec<Value>>) -> Vec<&'a Value> {
        self.canonical(vec_id(items), items.len())
            .into_iter()
            .map(|i| &items[i])
            .collect()
    }

    fn fields<'a>(&self, s: &'a Rc<StructValue>, positional: bool) -> Vec<(&'a str, &'a Value)> {
        let fields = s.fields();
        let order = if positional {
            (0..fields.len()).collect()
        } else {
            self.canonical(struct_id(s), fields.len())
        };
        order
            .into_iter()
            .map(|i| (fields[i].0.as_ref(), &fields[i].1))
            .collect()
    }

    fn compare<'a>(&self, a: &'a Value, b: &'a Value) -> Ordering {
        let mut stack = vec![Frame::Pair(a, b)];
        while let Some(frame) = stack.pop() {
            let ord = match frame {
                Frame::Pair(a, b) => self.compare_heads(a, b, &mut stack),
                Frame::Seq { left, right, next } => {
                    if next < left.len() && next < right.len() {
                        let (l, r) = (left[next], right[next]);
                        stack.push(Frame::Seq {
                            left,
                            right,
                            next: next + 1,
                        });
                        stack.push(Frame::Pair(l, r));
                        Ordering::Equal
                    } else {
                        left.len().cmp(&right.len())
                    }
                }
                Frame::Fields { left, right, next } => {
                    if next < left.len() && next < right.len() {
                        let ((ln, lv), (rn, rv)) = (left[next], right[next]);
                        let ord = ln.cmp(rn);
                        if ord == Ordering::Equal {
                            stack.push(Frame::Fields {
                                left,
                                right,
                                next: next + 1,
                            });
                            stack.push(Frame::Pair(lv, rv));
                        }
                        ord
                    } else {
                        left.len().cmp(&right.len())
                    }
                }
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    fn compare_heads<'a>(
        &self,
        a: &'a Value,
        b: &'a Value,
        stack: &mut Vec<Frame<'a>>,
    ) -> Ordering {
        let eq = self.eq;
        let (ra, rb) = (rank(a, eq), rank(b, eq));
        if ra != rb {
            return ra.cmp(&rb);
        }

        match (a, b) {
            (Value::Null(x), Value::Null(y)) if eq == Equivalence::Strict => x.cmp(y),
            (Value::Missing | Value::Null(_), _) => Ordering::Equal,
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            (Value::Int(_) | Value::Float(_) | Value::Decimal(_), _) => {
                strict_tiebreak(a, b, eq, compare_numbers(a, b))
            }
            (Value::Date(x), Value::Date(y)) => x.cmp(y),
            (Value::Time(x), Value::Time(y)) => compare_times(x, y, eq),
            (Value::Timestamp(x), Value::Timestamp(y)) => compare_timestamps(x, y, eq),
            (Value::String(x) | Value::Symbol(x), Value::String(y) | Value::Symbol(y)) => {
                x.cmp(y).then_with(|| a.kind().cmp(&b.kind()))
            }
            (Value::Clob(x) | Value::Blob(x), Value::Clob(y) | Value::Blob(y)) => {
                strict_tiebreak(a, b, eq, x.cmp(y))
            }
            (Value::List(x) | Value::Sexp(x), Value::List(y) | Value::Sexp(y)) => {
                let ord = strict_tiebreak(a, b, eq, Ordering::Equal);
                if ord == Ordering::Equal && !Rc::ptr_eq(x, y) {
                    stack.push(Frame::Seq {
                        left: x.iter().collect(),
                        right: y.iter().collect(),
                        next: 0,
                    });
                }
                ord
            }
            (Value::Bag(x), Value::Bag(y)) => {
                if !Rc::ptr_eq(x, y) {
                    stack.push(Frame::Seq {
                        left: self.bag(x),
                        right: self.bag(y),
                        next: 0,
                    });
                }
                Ordering::Equal
            }
            (Value::Struct(x), Value::Struct(y)) => {
                if eq == Equivalence::Strict && x.ordering() != y.ordering() {
                    return x.ordering().cmp(&y.ordering());
                }
                if !Rc::ptr_eq(x, y) {
                    let positional = x.ordering() == StructOrdering::Ordered
                        && y.ordering() == StructOrdering::Ordered;
                    stack.push(Frame::Fields {
                        left: self.fields(x, positional),
                        right: self.fields(y, positional),
                        next: 0,
                    });
                }
                Ordering::Equal
            }
            _ => a.kind().cmp(&b.kind()),
        }
    }
}

fn strict_tiebreak(a: &Value, b: &Value, eq: Equivalence, ord: Ordering) -> Ordering {
    if eq == Equivalence::Strict {
        ord.then_with(|| a.kind().cmp(&b.kind()))
    } else {
        ord
    }
}

fn compare_times(x: &Time, y: &Time, eq: Equivalence) -> Ordering {
    let ord = x
        .normalized_nanos()
        .cmp(&y.normalized_nanos())
        .then_with(|| x.offset_minutes().is_some().cmp(&y.offset_minutes().is_some()));
    if eq == Equivalence::Strict {
        ord.then_with(|| x.precision().cmp(&y.precision()))
            .then_with(|| x.offset_minutes().cmp(&y.offset_minutes()))
    } else {
        ord
    }
}

fn compare_timestamps(x: &Timestamp, y: &Timestamp, eq: Equivalence) -> Ordering {
    let ord = x.naive_utc().cmp(&y.naive_utc());
    if eq == Equivalence::Strict {
        ord.then_with(|| x.offset_minutes().cmp(&y.offset_minutes()))
            .then_with(|| x.precision().cmp(&y.precision()))
    } else {
        ord
    }
}

fn compare_float_exact(x: f64, y: &BigDecimal) -> Ordering {
    match float_to_exact_decimal(x) {
        Some(exact) => exact.cmp(y),
        None => Ordering::Equal,
    }
}

/// Numeric comparison across INT, DECIMAL and FLOAT. NaN is the lowest number and
/// equal to itself.
pub(crate) fn compare_numbers(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        (Value::Decimal(x), Value::Decimal(y)) => x.as_ref().cmp(y.as_ref()),
        (Value::Int(x), Value::Decimal(y)) => x.to_decimal().cmp(y.as_ref()),
        (Value::Decimal(x), Value::Int(y)) => x.as_ref().cmp(&y.to_decimal()),
        (Value::Float(x), Value::Float(y)) => compare_floats(*x, *y),
        (Value::Float(x), other) => compare_float_with(*x, other),
        (other, Value::Float(y)) => compare_float_with(*y, other).reverse(),
        _ => Ordering::Equal,
    }
}

fn compare_floats(x: f64, y: f64) -> Ordering {
    match (x.is_nan(), y.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
    }
}

fn compare_float_with(x: f64, other: &Value) -> Ordering {
    if x.is_nan() {
        return Ordering::Less;
    }
    let (approx, exact) = match other {
        Value::Int(i) => (i.to_f64(), i.to_decimal()),
        Value::Decimal(d) => (decimal_to_f64(d), d.as_ref().clone()),
        _ => return Ordering::Equal,
    };
    // Rounding to f64 is monotonic, so unequal approximations order correctly.
    match compare_floats(x, approx) {
        Ordering::Equal if x.is_finite() => compare_float_exact(x, &exact),
        ord => ord,
    }
}

impl Value {
    pub fn value_eq(&self, other: &Value) -> bool {
        equals(self, other, Equivalence::Value)
    }

    pub fn grouping_eq(&self, other: &Value) -> bool {
        equals(self, other, Equivalence::Grouping)
    }

    pub fn strict_eq(&self, other: &Value) -> bool {
        equals(self, other, Equivalence::Strict)
    }

    /// Total order consistent with value equality.
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        compare(self, other, Equivalence::Value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Kind;
    use core::str::FromStr;

    fn dec(s: &str) -> Value {
        Value::decimal(BigDecimal::from_str(s).unwrap())
    }

    #[test]
    fn numbers_compare_across_kinds() {
        assert!(Value::from(1).value_eq(&dec("1.00")));
        assert!(Value::from(1).value_eq(&Value::from(1.0)));
        assert!(dec("0.5").value_eq(&Value::from(0.5)));
        assert!(!dec("0.1").value_eq(&Value::from(0.1)));
        assert!(Value::from(-0.0).value_eq(&Value::from(0.0)));
        assert!(Value::from(f64::NAN).value_eq(&Value::from(f64::NAN)));
        assert_eq!(
            Value::from(f64::NAN).total_cmp(&Value::from(i64::MIN)),
            Ordering::Less
        );
        assert_eq!(
            Value::from(f64::INFINITY).total_cmp(&dec("1e400")),
            Ordering::Greater
        );
        assert!(!Value::from(1).strict_eq(&dec("1")));
    }

    #[test]
    fn unknowns_per_equivalence() {
        let (m, n, ni) = (Value::Missing, Value::NULL, Value::Null(Some(Kind::Int)));
        assert!(m.value_eq(&n));
        assert!(!m.grouping_eq(&n));
        assert!(n.grouping_eq(&ni));
        assert!(!n.strict_eq(&ni));
        assert_eq!(m.total_cmp(&Value::from(false)), Ordering::Less);
    }

    #[test]
    fn text_and_lobs() {
        assert!(!Value::string("a").value_eq(&Value::symbol("a")));
        assert!(Value::clob(b"ab").value_eq(&Value::blob(b"ab")));
        assert!(!Value::clob(b"ab").strict_eq(&Value::blob(b"ab")));
    }

    #[test]
    fn sequences_and_bags() {
        let l = Value::list(vec![1.into(), 2.into()]);
        let s = Value::sexp(vec![1.into(), 2.into()]);
        assert!(l.value_eq(&s));
        assert!(!l.strict_eq(&s));

        let b1 = Value::bag(vec![1.into(), 2.into(), 2.into()]);
        let b2 = Value::bag(vec![2.into(), 1.into(), 2.into()]);
        let b3 = Value::bag(vec![2.into(), 1.into(), 1.into()]);
        assert!(b1.value_eq(&b2));
        assert!(!b1.value_eq(&b3));
        assert!(!l.value_eq(&Value::bag(vec![1.into(), 2.into()])));
    }

    #[test]
    fn structs() {
        let a = Value::struct_from([("a", 1.into()), ("b", 2.into())]);
        let b = Value::struct_from([("b", 2.into()), ("a", dec("1.0"))]);
        assert!(a.value_eq(&b));
        assert!(!a.strict_eq(&b));

        let o1 = Value::ordered_struct_from([("a", 1.into()), ("b", 2.into())]);
        let o2 = Value::ordered_struct_from([("b", 2.into()), ("a", 1.into())]);
        assert!(!o1.value_eq(&o2));
        assert!(o1.value_eq(&a));
        assert!(!o1.strict_eq(&a));
    }

    #[test]
    fn times_and_timestamps() {
        let t1 = Value::from_text("$time::{hour:12,minute:0,second:0.,timezone_hour:1,timezone_minute:0}").unwrap();
        let t2 = Value::from_text("$time::{hour:11,minute:0,second:0.,timezone_hour:0,timezone_minute:0}").unwrap();
        let t3 = Value::from_text("$time::{hour:11,minute:0,second:0.}").unwrap();
        assert!(t1.value_eq(&t2));
        assert!(!t2.value_eq(&t3));

        let ts1 = Value::from_text("2007-02-23T12:14:33-08:00").unwrap();
        let ts2 = Value::from_text("2007-02-23T20:14:33Z").unwrap();
        assert!(ts1.value_eq(&ts2));
        assert!(!ts1.strict_eq(&ts2));
    }

    #[test]
    fn deep_nesting_does_not_overflow() {
        let mut a = Value::from(1);
        let mut b = Value::from(1);
        for _ in 0..100_000 {
            a = Value::list(vec![a]);
            b = Value::sexp(vec![b]);
        }
        assert!(a.value_eq(&b));
        assert!(!a.strict_eq(&b));
        // Leak the deep values; dropping them recurses.
        core::mem::forget(a);
        core::mem::forget(b);
    }

    #[test]
    fn nested_bags_and_structs() {
        let bag = Value::bag;
        let b1 = bag(vec![bag(vec![1.into(), 2.into()]), bag(vec![3.into()])]);
        let b2 = bag(vec![bag(vec![3.into()]), bag(vec![2.into(), dec("1.0")])]);
        let b3 = bag(vec![bag(vec![3.into()]), bag(vec![2.into(), 2.into()])]);
        assert!(b1.value_eq(&b2));
        assert!(!b1.strict_eq(&b2));
        assert!(!b1.value_eq(&b3));
        assert_eq!(b1.total_cmp(&b3), b2.total_cmp(&b3));

        let s1 = Value::struct_from([("a", 1.into()), ("a", b1.clone())]);
        let s2 = Value::struct_from([("a", b2.clone()), ("a", 1.into())]);
        let s3 = Value::struct_from([("a", 1.into()), ("a", 1.into())]);
        assert!(s1.value_eq(&s2));
        assert!(!s1.value_eq(&s3));
        let o = Value::ordered_struct_from([("a", b2), ("a", 1.into())]);
        assert!(o.value_eq(&s1));
    }

    #[test]
    fn deep_bags_and_structs_do_not_overflow() {
        let mut a = Value::from(1);
        let mut b = Value::from(1);
        let mut s = Value::from(1);
        let mut t = Value::from(1);
        for _ in 0..100_000 {
            a = Value::bag(vec![a, Value::bag(vec![])]);
            b = Value::bag(vec![Value::bag(vec![]), b]);
            s = Value::struct_from([("f", s), ("f", Value::from(1))]);
            t = Value::struct_from([("f", Value::from(1)), ("f", t)]);
        }
        assert!(a.value_eq(&b));
        assert!(a.grouping_eq(&a.clone()));
        assert!(s.value_eq(&t));
        assert!(!a.value_eq(&s));
        core::mem::forget(a);
        core::mem::forget(b);
        core::mem::forget(s);
        core::mem::forget(t);
    }

    #[test]
    fn shared_payloads_are_ordered_once() {
        let build = |depth: usize| {
            let mut x = Value::from(1);
            for _ in 0..depth {
                x = Value::bag(vec![x.clone(), Value::bag(vec![]), x]);
            }
            x
        };
        let deep = build(64);
        assert!(deep.value_eq(&deep.clone()));
        assert_eq!(deep.total_cmp(&build(3)), Ordering::Greater);
        assert!(build(8).value_eq(&build(8)));
    }
}
