//! The validation vocabulary: pure assertions over the local instance value.
//!
//! Every keyword here is inapplicable (and silently passes) when the
//! instance is not of its governing type, per the specification.

use indexmap::IndexMap;
use serde_json::{Number, Value};

use crate::compare::{is_multiple_of, json_equal};
use crate::context::KeywordOutcome;
use crate::draft::{Draft, DraftRange};
use crate::error::Result;
use crate::keyword::{KeywordClass, KeywordSpec};
use crate::schema::{CompiledPattern, InstanceType};
use crate::vocabulary::Vocabulary;

use super::KeywordEnv;

pub fn specs() -> Vec<KeywordSpec> {
    let assertion = |name, drafts| KeywordSpec {
        name,
        class: KeywordClass::Assertion,
        drafts,
        vocabulary: Vocabulary::Validation,
        depends_on: &[],
    };
    vec![
        assertion("type", DraftRange::all()),
        assertion("enum", DraftRange::all()),
        assertion("const", DraftRange::all()),
        assertion("multipleOf", DraftRange::all()),
        assertion("maximum", DraftRange::all()),
        assertion("exclusiveMaximum", DraftRange::all()),
        assertion("minimum", DraftRange::all()),
        assertion("exclusiveMinimum", DraftRange::all()),
        assertion("maxLength", DraftRange::all()),
        assertion("minLength", DraftRange::all()),
        assertion("pattern", DraftRange::all()),
        assertion("maxItems", DraftRange::all()),
        assertion("minItems", DraftRange::all()),
        assertion("uniqueItems", DraftRange::all()),
        assertion("maxProperties", DraftRange::all()),
        assertion("minProperties", DraftRange::all()),
        assertion("required", DraftRange::all()),
        assertion(
            "dependentRequired",
            DraftRange::since(Draft::Draft201909),
        ),
    ]
}

pub fn eval_type(env: &KeywordEnv<'_>, types: &[InstanceType]) -> Result<KeywordOutcome> {
    if types.iter().any(|t| t.matches(env.instance)) {
        Ok(KeywordOutcome::pass("type"))
    } else {
        let names: Vec<&str> = types.iter().map(|t| t.as_str()).collect();
        Ok(KeywordOutcome::fail(
            "type",
            format!("expected {}", names.join(" or ")),
        ))
    }
}

pub fn eval_enum(env: &KeywordEnv<'_>, values: &[Value]) -> Result<KeywordOutcome> {
    if values.iter().any(|value| json_equal(value, env.instance)) {
        Ok(KeywordOutcome::pass("enum"))
    } else {
        Ok(KeywordOutcome::fail("enum", "value is not one of the allowed values"))
    }
}

pub fn eval_const(env: &KeywordEnv<'_>, value: &Value) -> Result<KeywordOutcome> {
    if json_equal(value, env.instance) {
        Ok(KeywordOutcome::pass("const"))
    } else {
        Ok(KeywordOutcome::fail("const", "value does not equal the constant"))
    }
}

fn number(env: &KeywordEnv<'_>) -> Option<f64> {
    env.instance.as_f64()
}

pub fn eval_multiple_of(env: &KeywordEnv<'_>, divisor: &Number) -> Result<KeywordOutcome> {
    let Some(n) = number(env) else {
        return Ok(KeywordOutcome::inapplicable("multipleOf"));
    };
    let divisor = divisor.as_f64().unwrap_or(0.0);
    if is_multiple_of(n, divisor) {
        Ok(KeywordOutcome::pass("multipleOf"))
    } else {
        Ok(KeywordOutcome::fail(
            "multipleOf",
            format!("{n} is not a multiple of {divisor}"),
        ))
    }
}

fn bound(
    env: &KeywordEnv<'_>,
    keyword: &'static str,
    limit: &Number,
    ok: impl Fn(f64, f64) -> bool,
    relation: &str,
) -> Result<KeywordOutcome> {
    let Some(n) = number(env) else {
        return Ok(KeywordOutcome::inapplicable(keyword));
    };
    let limit = limit.as_f64().unwrap_or(f64::NAN);
    if ok(n, limit) {
        Ok(KeywordOutcome::pass(keyword))
    } else {
        Ok(KeywordOutcome::fail(
            keyword,
            format!("{n} must be {relation} {limit}"),
        ))
    }
}

pub fn eval_maximum(env: &KeywordEnv<'_>, limit: &Number) -> Result<KeywordOutcome> {
    bound(env, "maximum", limit, |n, m| n <= m, "at most")
}

pub fn eval_exclusive_maximum(env: &KeywordEnv<'_>, limit: &Number) -> Result<KeywordOutcome> {
    bound(env, "exclusiveMaximum", limit, |n, m| n < m, "less than")
}

pub fn eval_minimum(env: &KeywordEnv<'_>, limit: &Number) -> Result<KeywordOutcome> {
    bound(env, "minimum", limit, |n, m| n >= m, "at least")
}

pub fn eval_exclusive_minimum(env: &KeywordEnv<'_>, limit: &Number) -> Result<KeywordOutcome> {
    bound(env, "exclusiveMinimum", limit, |n, m| n > m, "greater than")
}

/// String length in Unicode code points, as the specification requires.
fn string_length(value: &Value) -> Option<usize> {
    value.as_str().map(|s| s.chars().count())
}

pub fn eval_max_length(env: &KeywordEnv<'_>, limit: u64) -> Result<KeywordOutcome> {
    let Some(length) = string_length(env.instance) else {
        return Ok(KeywordOutcome::inapplicable("maxLength"));
    };
    if length as u64 <= limit {
        Ok(KeywordOutcome::pass("maxLength"))
    } else {
        Ok(KeywordOutcome::fail(
            "maxLength",
            format!("string has {length} characters, expected at most {limit}"),
        ))
    }
}

pub fn eval_min_length(env: &KeywordEnv<'_>, limit: u64) -> Result<KeywordOutcome> {
    let Some(length) = string_length(env.instance) else {
        return Ok(KeywordOutcome::inapplicable("minLength"));
    };
    if length as u64 >= limit {
        Ok(KeywordOutcome::pass("minLength"))
    } else {
        Ok(KeywordOutcome::fail(
            "minLength",
            format!("string has {length} characters, expected at least {limit}"),
        ))
    }
}

pub fn eval_pattern(env: &KeywordEnv<'_>, pattern: &CompiledPattern) -> Result<KeywordOutcome> {
    let Some(s) = env.instance.as_str() else {
        return Ok(KeywordOutcome::inapplicable("pattern"));
    };
    match pattern.is_match(s) {
        Some(true) => Ok(KeywordOutcome::pass("pattern")),
        Some(false) => Ok(KeywordOutcome::fail(
            "pattern",
            format!("string does not match {:?}", pattern.source()),
        )),
        None => Ok(KeywordOutcome::fail(
            "pattern",
            format!("pattern {:?} is not a valid regular expression", pattern.source()),
        )),
    }
}

fn count_check(
    count: Option<usize>,
    keyword: &'static str,
    limit: u64,
    ok: impl Fn(u64, u64) -> bool,
    message: impl Fn(usize) -> String,
) -> Result<KeywordOutcome> {
    match count {
        None => Ok(KeywordOutcome::inapplicable(keyword)),
        Some(count) if ok(count as u64, limit) => Ok(KeywordOutcome::pass(keyword)),
        Some(count) => Ok(KeywordOutcome::fail(keyword, message(count))),
    }
}

pub fn eval_max_items(env: &KeywordEnv<'_>, limit: u64) -> Result<KeywordOutcome> {
    count_check(
        env.instance.as_array().map(Vec::len),
        "maxItems",
        limit,
        |n, m| n <= m,
        |n| format!("array has {n} items, expected at most {limit}"),
    )
}

pub fn eval_min_items(env: &KeywordEnv<'_>, limit: u64) -> Result<KeywordOutcome> {
    count_check(
        env.instance.as_array().map(Vec::len),
        "minItems",
        limit,
        |n, m| n >= m,
        |n| format!("array has {n} items, expected at least {limit}"),
    )
}

pub fn eval_unique_items(env: &KeywordEnv<'_>, unique: bool) -> Result<KeywordOutcome> {
    let Some(elements) = env.instance.as_array() else {
        return Ok(KeywordOutcome::inapplicable("uniqueItems"));
    };
    if !unique {
        return Ok(KeywordOutcome::pass("uniqueItems"));
    }
    for (i, a) in elements.iter().enumerate() {
        for b in &elements[i + 1..] {
            if json_equal(a, b) {
                return Ok(KeywordOutcome::fail(
                    "uniqueItems",
                    format!("duplicate item at index {i}"),
                ));
            }
        }
    }
    Ok(KeywordOutcome::pass("uniqueItems"))
}

pub fn eval_max_properties(env: &KeywordEnv<'_>, limit: u64) -> Result<KeywordOutcome> {
    count_check(
        env.instance.as_object().map(|o| o.len()),
        "maxProperties",
        limit,
        |n, m| n <= m,
        |n| format!("object has {n} properties, expected at most {limit}"),
    )
}

pub fn eval_min_properties(env: &KeywordEnv<'_>, limit: u64) -> Result<KeywordOutcome> {
    count_check(
        env.instance.as_object().map(|o| o.len()),
        "minProperties",
        limit,
        |n, m| n >= m,
        |n| format!("object has {n} properties, expected at least {limit}"),
    )
}

pub fn eval_required(env: &KeywordEnv<'_>, names: &[String]) -> Result<KeywordOutcome> {
    let Some(object) = env.instance.as_object() else {
        return Ok(KeywordOutcome::inapplicable("required"));
    };
    let missing: Vec<&str> = names
        .iter()
        .filter(|name| !object.contains_key(name.as_str()))
        .map(String::as_str)
        .collect();
    if missing.is_empty() {
        Ok(KeywordOutcome::pass("required"))
    } else {
        Ok(KeywordOutcome::fail(
            "required",
            format!("missing required properties {missing:?}"),
        ))
    }
}

pub fn eval_dependent_required(
    env: &KeywordEnv<'_>,
    map: &IndexMap<String, Vec<String>>,
) -> Result<KeywordOutcome> {
    let Some(object) = env.instance.as_object() else {
        return Ok(KeywordOutcome::inapplicable("dependentRequired"));
    };
    let mut missing = Vec::new();
    for (key, names) in map {
        if !object.contains_key(key) {
            continue;
        }
        for name in names {
            if !object.contains_key(name) {
                missing.push(format!("{key} requires {name}"));
            }
        }
    }
    if missing.is_empty() {
        Ok(KeywordOutcome::pass("dependentRequired"))
    } else {
        Ok(KeywordOutcome::fail("dependentRequired", missing.join("; ")))
    }
}
