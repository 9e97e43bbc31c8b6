// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! `DISTINCT` and `GROUP BY` under grouping equality.
//!
//! Grouping equality is value equality except that `NULL` and `MISSING` are
//! told apart at every depth.

use crate::equality::{compare, Equivalence};
use crate::value::Value;

use core::cmp::Ordering;
use std::collections::BTreeMap;

/// A tuple of values ordered by the grouping comparator.
#[derive(Debug, Clone)]
pub struct GroupKey(Vec<Value>);

impl GroupKey {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn single(value: Value) -> Self {
        Self(vec![value])
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }

    pub fn into_values(self) -> Vec<Value> {
        self.0
    }
}

impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        for (a, b) in self.0.iter().zip(other.0.iter()) {
            match compare(a, b, Equivalence::Grouping) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        self.0.len().cmp(&other.0.len())
    }
}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GroupKey {}

/// The first value of each grouping-equal class, in first-seen order.
pub fn distinct(values: impl IntoIterator<Item = Value>) -> Vec<Value> {
    let mut seen = BTreeMap::new();
    let mut out = vec![];
    for v in values {
        let key = GroupKey::single(v);
        if seen.contains_key(&key) {
            continue;
        }
        out.push(key.values()[0].clone());
        seen.insert(key, ());
    }
    out
}

#[derive(Debug, Clone)]
pub struct Group {
    key: Vec<Value>,
    rows: Vec<Value>,
}

impl Group {
    /// The key as first seen for this group.
    pub fn key(&self) -> &[Value] {
        &self.key
    }

    pub fn rows(&self) -> &[Value] {
        &self.rows
    }
}

/// Rows partitioned by key tuple, groups kept in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct GroupBy {
    index: BTreeMap<GroupKey, usize>,
    groups: Vec<Group>,
}

impl GroupBy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: Vec<Value>, row: Value) {
        let key = GroupKey::new(key);
        match self.index.get(&key) {
            Some(&i) => self.groups[i].rows.push(row),
            None => {
                self.groups.push(Group {
                    key: key.values().to_vec(),
                    rows: vec![row],
                });
                self.index.insert(key, self.groups.len() - 1);
            }
        }
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn into_groups(self) -> Vec<Group> {
        self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(text: &str) -> Value {
        Value::from_text(text).unwrap()
    }

    #[test]
    fn distinct_tells_null_from_missing() {
        let rows = distinct([Value::Missing, Value::NULL, Value::NULL, Value::Missing]);
        assert_eq!(rows.len(), 2);
        assert!(rows[0].is_missing());
        assert!(rows[1].is_null());

        let rows = distinct([v("null.int"), v("null")]);
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn distinct_uses_numeric_equality() {
        let rows = distinct([v("1"), v("1.0"), v("1e0"), v("[1, null]"), v("[1.0, null]"), v("[1, $missing::null]")]);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], v("1"));
    }

    #[test]
    fn group_by_keeps_first_key() {
        let mut g = GroupBy::new();
        g.add(vec![v("1.0"), v("a")], v("{x: 1}"));
        g.add(vec![v("1"), v("a")], v("{x: 2}"));
        g.add(vec![Value::Missing, v("a")], v("{x: 3}"));
        g.add(vec![Value::NULL, v("a")], v("{x: 4}"));
        assert_eq!(g.len(), 3);
        assert_eq!(g.groups()[0].key()[0], v("1.0"));
        assert_eq!(g.groups()[0].rows().len(), 2);
    }
}
