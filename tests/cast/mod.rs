// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use anyhow::{bail, Result};
use qval::*;
use serde::{Deserialize, Serialize};
use std::env;
use test_generator::test_resources;

#[derive(Serialize, Deserialize, PartialEq, Debug)]
#[serde(deny_unknown_fields)]
struct Case {
    note: String,
    value: String,
    #[serde(rename = "type")]
    target: String,
    #[serde(default)]
    honored: bool,
    result: Option<String>,
    error: Option<String>,
    lossless: Option<bool>,
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct Test {
    cases: Vec<Case>,
}

fn same(actual: &Value, expected: &Value) -> bool {
    actual.kind() == expected.kind() && (actual == expected || actual.value_eq(expected))
}

fn run_case(case: &Case) -> Result<()> {
    let mode = if case.honored {
        CastMode::Honored
    } else {
        CastMode::Unconstrained
    };
    let engine = Engine::with_options(EvaluationOptions::new().with_cast_mode(mode))?;
    let value = Value::from_text(&case.value)?;
    let target = engine.compile_type(&case.target)?;

    match (engine.cast(&value, &target), &case.result, &case.error) {
        (Ok(actual), Some(expected), None) => {
            let expected = Value::from_text(expected)?;
            if !same(&actual, &expected) {
                bail!("expected {expected}, got {actual}");
            }
            if !engine.can_cast(&value, &target)? {
                bail!("cast succeeded but CAN_CAST is false");
            }
        }
        (Err(e), None, Some(expected)) => {
            if e.code().name() != expected.as_str() {
                bail!("expected {expected}, got {}: {e}", e.code());
            }
            if e.code().cast_failure_kind().is_none() {
                bail!("{} is not a cast failure", e.code());
            }
            if engine.can_cast(&value, &target)? {
                bail!("cast failed but CAN_CAST is true");
            }
        }
        (Ok(actual), _, Some(expected)) => bail!("expected {expected}, got {actual}"),
        (Err(e), _, _) => return Err(e.into()),
        (Ok(_), None, None) => bail!("case has neither result nor error"),
    }

    if let Some(lossless) = case.lossless {
        let actual = engine.can_lossless_cast(&value, &target)?;
        if actual != lossless {
            bail!("CAN_LOSSLESS_CAST expected {lossless}, got {actual}");
        }
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

#[test]
#[ignore = "intended for running a single case file"]
fn one_yaml() -> Result<()> {
    let mut file = String::default();
    for a in env::args() {
        if a.ends_with(".yaml") {
            file = a;
            break;
        }
    }

    if file.is_empty() {
        bail!("missing yaml test file");
    }

    yaml_test(file.as_str())
}

#[test_resources("tests/cast/*.yaml")]
fn run(path: &str) {
    yaml_test(path).unwrap()
}
