//! Array applicators and the contains-count assertions.
//!
//! The positional keywords follow the annotation protocol: a prefix-style
//! keyword annotates the largest index it applied to (or `true` when it
//! covered the whole array), the rest-style keywords annotate `true` when
//! they applied at all, and `contains` annotates the matching indices.

use serde_json::{json, Value};

use crate::context::{EvalContext, EvaluationNode, KeywordOutcome};
use crate::dispatch::eval_schema;
use crate::draft::{Draft, DraftRange};
use crate::error::Result;
use crate::keyword::{KeywordClass, KeywordSpec};
use crate::schema::{Items, Keyword, SchemaRef};
use crate::vocabulary::Vocabulary;

use super::KeywordEnv;

pub fn specs() -> Vec<KeywordSpec> {
    let row = |name, drafts, vocabulary, depends_on| KeywordSpec {
        name,
        class: KeywordClass::Assertion,
        drafts,
        vocabulary,
        depends_on,
    };
    vec![
        row(
            "prefixItems",
            DraftRange::since(Draft::Draft202012),
            Vocabulary::Applicator,
            &[],
        ),
        row(
            "items",
            DraftRange::all(),
            Vocabulary::Applicator,
            &["prefixItems"],
        ),
        row(
            "additionalItems",
            DraftRange::new(Draft::Draft6, Draft::Draft201909),
            Vocabulary::Applicator,
            &["items"],
        ),
        row(
            "contains",
            DraftRange::all(),
            Vocabulary::Applicator,
            &[],
        ),
        row(
            "minContains",
            DraftRange::since(Draft::Draft201909),
            Vocabulary::Validation,
            &["contains"],
        ),
        row(
            "maxContains",
            DraftRange::since(Draft::Draft201909),
            Vocabulary::Validation,
            &["contains"],
        ),
    ]
}

/// Positional annotation for a prefix-style keyword: the largest applied
/// index, or `true` when every element was covered.
fn positional_annotation(applied: usize, total: usize) -> Value {
    if applied >= total {
        json!(true)
    } else {
        json!(applied.saturating_sub(1))
    }
}

/// Number of leading elements covered by a positional annotation.
fn covered_prefix(annotation: Option<&Value>, total: usize) -> usize {
    match annotation {
        Some(Value::Bool(true)) => total,
        Some(Value::Number(n)) => n
            .as_u64()
            .map(|index| (index as usize + 1).min(total))
            .unwrap_or(0),
        _ => 0,
    }
}

/// Apply per-position schemas to the leading elements.
fn eval_tuple(
    ctx: &mut EvalContext<'_>,
    env: &KeywordEnv<'_>,
    keyword: &'static str,
    schemas: &[SchemaRef],
    elements: &[Value],
) -> Result<KeywordOutcome> {
    let mut children = Vec::new();
    let mut failing = Vec::new();
    let applied = schemas.len().min(elements.len());
    for (index, (sub, element)) in schemas.iter().zip(elements).enumerate() {
        let child = eval_schema(
            ctx,
            sub,
            element,
            env.path(keyword).push_index(index),
            env.instance_location.push_index(index),
        )?;
        if !child.valid {
            failing.push(index);
        }
        children.push(child);
    }
    let outcome = if failing.is_empty() {
        KeywordOutcome::annotate(keyword, positional_annotation(applied, elements.len()))
    } else {
        KeywordOutcome::fail(keyword, format!("items at {failing:?} are not valid"))
    };
    Ok(outcome.with_children(children))
}

/// Apply one schema to every element from `start` on.
fn eval_rest(
    ctx: &mut EvalContext<'_>,
    env: &KeywordEnv<'_>,
    keyword: &'static str,
    sub: &SchemaRef,
    elements: &[Value],
    start: usize,
) -> Result<KeywordOutcome> {
    if start >= elements.len() {
        return Ok(KeywordOutcome::pass(keyword));
    }
    let mut children = Vec::new();
    let mut failing = Vec::new();
    for (index, element) in elements.iter().enumerate().skip(start) {
        let child = eval_schema(
            ctx,
            sub,
            element,
            env.path(keyword),
            env.instance_location.push_index(index),
        )?;
        if !child.valid {
            failing.push(index);
        }
        children.push(child);
    }
    let outcome = if failing.is_empty() {
        KeywordOutcome::annotate(keyword, json!(true))
    } else {
        KeywordOutcome::fail(keyword, format!("items at {failing:?} are not valid"))
    };
    Ok(outcome.with_children(children))
}

pub fn eval_prefix_items(
    ctx: &mut EvalContext<'_>,
    env: &KeywordEnv<'_>,
    schemas: &[SchemaRef],
) -> Result<KeywordOutcome> {
    let Some(elements) = env.instance.as_array() else {
        return Ok(KeywordOutcome::inapplicable("prefixItems"));
    };
    eval_tuple(ctx, env, "prefixItems", schemas, elements)
}

pub fn eval_items(
    ctx: &mut EvalContext<'_>,
    env: &KeywordEnv<'_>,
    node: &EvaluationNode,
    items: &Items,
) -> Result<KeywordOutcome> {
    let Some(elements) = env.instance.as_array() else {
        return Ok(KeywordOutcome::inapplicable("items"));
    };
    match items {
        Items::Tuple(schemas) => eval_tuple(ctx, env, "items", schemas, elements),
        Items::Single(sub) => {
            let start = covered_prefix(node.annotations.get("prefixItems"), elements.len());
            eval_rest(ctx, env, "items", sub, elements, start)
        }
    }
}

pub fn eval_additional_items(
    ctx: &mut EvalContext<'_>,
    env: &KeywordEnv<'_>,
    node: &EvaluationNode,
    sub: &SchemaRef,
) -> Result<KeywordOutcome> {
    let Some(elements) = env.instance.as_array() else {
        return Ok(KeywordOutcome::inapplicable("additionalItems"));
    };
    // additionalItems only applies after a tuple-form items.
    if !matches!(env.schema.get("items"), Some(Keyword::Items(Items::Tuple(_)))) {
        return Ok(KeywordOutcome::inapplicable("additionalItems"));
    }
    let start = covered_prefix(node.annotations.get("items"), elements.len());
    eval_rest(ctx, env, "additionalItems", sub, elements, start)
}

/// The sibling `minContains`, defaulting to one.
fn min_contains(env: &KeywordEnv<'_>) -> u64 {
    match env.schema.get("minContains") {
        Some(Keyword::MinContains(limit)) => *limit,
        _ => 1,
    }
}

pub fn eval_contains(
    ctx: &mut EvalContext<'_>,
    env: &KeywordEnv<'_>,
    sub: &SchemaRef,
) -> Result<KeywordOutcome> {
    let Some(elements) = env.instance.as_array() else {
        return Ok(KeywordOutcome::inapplicable("contains"));
    };
    let mut children = Vec::new();
    let mut matched = Vec::new();
    for (index, element) in elements.iter().enumerate() {
        let child = eval_schema(
            ctx,
            sub,
            element,
            env.path("contains"),
            env.instance_location.push_index(index),
        )?;
        if child.valid {
            matched.push(index);
        }
        children.push(child);
    }
    let outcome = if matched.len() as u64 >= min_contains(env) {
        KeywordOutcome::annotate("contains", json!(matched))
    } else {
        KeywordOutcome::fail(
            "contains",
            format!("{} elements matched, expected at least {}", matched.len(), min_contains(env)),
        )
    };
    Ok(outcome.with_children(children))
}

/// Count of elements `contains` matched, read from its annotation. `None`
/// when `contains` is absent or did not pass.
fn contains_count(node: &EvaluationNode) -> Option<u64> {
    match node.annotations.get("contains") {
        Some(Value::Array(indices)) => Some(indices.len() as u64),
        _ => None,
    }
}

pub fn eval_min_contains(
    env: &KeywordEnv<'_>,
    node: &EvaluationNode,
    limit: u64,
) -> Result<KeywordOutcome> {
    if !env.instance.is_array() || !env.schema.has("contains") {
        return Ok(KeywordOutcome::inapplicable("minContains"));
    }
    match contains_count(node) {
        Some(count) if count < limit => Ok(KeywordOutcome::fail(
            "minContains",
            format!("{count} elements matched contains, expected at least {limit}"),
        )),
        // contains itself already enforced the floor (or failed).
        _ => Ok(KeywordOutcome::pass("minContains")),
    }
}

pub fn eval_max_contains(
    env: &KeywordEnv<'_>,
    node: &EvaluationNode,
    limit: u64,
) -> Result<KeywordOutcome> {
    if !env.instance.is_array() || !env.schema.has("contains") {
        return Ok(KeywordOutcome::inapplicable("maxContains"));
    }
    match contains_count(node) {
        Some(count) if count > limit => Ok(KeywordOutcome::fail(
            "maxContains",
            format!("{count} elements matched contains, expected at most {limit}"),
        )),
        _ => Ok(KeywordOutcome::pass("maxContains")),
    }
}
