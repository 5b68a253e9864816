//! `unevaluatedItems` and `unevaluatedProperties`.
//!
//! These run after every other applicator and read annotations from the
//! whole result subtree built so far: anything a valid descendant (at the
//! same instance location) claimed counts as evaluated, including claims
//! made through references and composition branches. Failed branches do not
//! claim anything.

use std::collections::HashSet;

use serde_json::{json, Value};

use crate::context::{EvalContext, EvaluationNode, KeywordOutcome};
use crate::dispatch::eval_schema;
use crate::draft::{Draft, DraftRange};
use crate::error::Result;
use crate::keyword::{KeywordClass, KeywordSpec};
use crate::schema::SchemaRef;
use crate::vocabulary::Vocabulary;

use super::KeywordEnv;

pub fn specs() -> Vec<KeywordSpec> {
    vec![
        KeywordSpec {
            name: "unevaluatedItems",
            class: KeywordClass::Assertion,
            drafts: DraftRange::since(Draft::Draft201909),
            vocabulary: Vocabulary::Unevaluated,
            depends_on: &[
                "prefixItems",
                "items",
                "additionalItems",
                "contains",
                "allOf",
                "anyOf",
                "oneOf",
                "not",
                "if",
                "then",
                "else",
            ],
        },
        KeywordSpec {
            name: "unevaluatedProperties",
            class: KeywordClass::Assertion,
            drafts: DraftRange::since(Draft::Draft201909),
            vocabulary: Vocabulary::Unevaluated,
            depends_on: &[
                "properties",
                "patternProperties",
                "additionalProperties",
                "dependentSchemas",
                "dependencies",
                "allOf",
                "anyOf",
                "oneOf",
                "not",
                "if",
                "then",
                "else",
            ],
        },
    ]
}

const ITEM_KEYWORDS: &[&str] = &[
    "prefixItems",
    "items",
    "additionalItems",
    "contains",
    "unevaluatedItems",
];

const PROPERTY_KEYWORDS: &[&str] = &[
    "properties",
    "patternProperties",
    "additionalProperties",
    "unevaluatedProperties",
];

/// Indices covered by item annotations in the subtree.
fn evaluated_indices(node: &EvaluationNode, env: &KeywordEnv<'_>, total: usize) -> HashSet<usize> {
    let mut annotations = Vec::new();
    node.collect_annotations(env.instance_location, ITEM_KEYWORDS, &mut annotations);
    let mut covered = HashSet::new();
    for annotation in annotations {
        match annotation {
            // items/additionalItems/unevaluatedItems, or a fully-covering
            // positional keyword.
            Value::Bool(true) => {
                covered.extend(0..total);
            }
            // A positional keyword's largest applied index.
            Value::Number(n) => {
                if let Some(index) = n.as_u64() {
                    covered.extend(0..((index as usize + 1).min(total)));
                }
            }
            // contains: the matching indices.
            Value::Array(indices) => {
                for index in indices {
                    if let Some(index) = index.as_u64() {
                        covered.insert(index as usize);
                    }
                }
            }
            _ => {}
        }
    }
    covered
}

/// Property names claimed by annotations in the subtree.
fn evaluated_properties(node: &EvaluationNode, env: &KeywordEnv<'_>) -> HashSet<String> {
    let mut annotations = Vec::new();
    node.collect_annotations(env.instance_location, PROPERTY_KEYWORDS, &mut annotations);
    let mut claimed = HashSet::new();
    for annotation in annotations {
        if let Value::Array(names) = annotation {
            for name in names {
                if let Some(name) = name.as_str() {
                    claimed.insert(name.to_string());
                }
            }
        }
    }
    claimed
}

pub fn eval_unevaluated_items(
    ctx: &mut EvalContext<'_>,
    env: &KeywordEnv<'_>,
    node: &EvaluationNode,
    sub: &SchemaRef,
) -> Result<KeywordOutcome> {
    let Some(elements) = env.instance.as_array() else {
        return Ok(KeywordOutcome::inapplicable("unevaluatedItems"));
    };
    let covered = evaluated_indices(node, env, elements.len());
    let mut children = Vec::new();
    let mut failing = Vec::new();
    let mut applied = false;
    for (index, element) in elements.iter().enumerate() {
        if covered.contains(&index) {
            continue;
        }
        applied = true;
        let child = eval_schema(
            ctx,
            sub,
            element,
            env.path("unevaluatedItems"),
            env.instance_location.push_index(index),
        )?;
        if !child.valid {
            failing.push(index);
        }
        children.push(child);
    }
    let outcome = if !failing.is_empty() {
        KeywordOutcome::fail(
            "unevaluatedItems",
            format!("unevaluated items at {failing:?} are not valid"),
        )
    } else if applied {
        KeywordOutcome::annotate("unevaluatedItems", json!(true))
    } else {
        KeywordOutcome::pass("unevaluatedItems")
    };
    Ok(outcome.with_children(children))
}

pub fn eval_unevaluated_properties(
    ctx: &mut EvalContext<'_>,
    env: &KeywordEnv<'_>,
    node: &EvaluationNode,
    sub: &SchemaRef,
) -> Result<KeywordOutcome> {
    let Some(object) = env.instance.as_object() else {
        return Ok(KeywordOutcome::inapplicable("unevaluatedProperties"));
    };
    let claimed = evaluated_properties(node, env);
    let mut children = Vec::new();
    let mut applied = Vec::new();
    let mut failing = Vec::new();
    for (name, value) in object {
        if claimed.contains(name) {
            continue;
        }
        let child = eval_schema(
            ctx,
            sub,
            value,
            env.path("unevaluatedProperties").push(name.clone()),
            env.instance_location.push(name.clone()),
        )?;
        if !child.valid {
            failing.push(name.as_str());
        }
        applied.push(name.as_str());
        children.push(child);
    }
    let outcome = if failing.is_empty() {
        KeywordOutcome::annotate("unevaluatedProperties", json!(applied))
    } else {
        KeywordOutcome::fail(
            "unevaluatedProperties",
            format!("unevaluated properties {failing:?} are not valid"),
        )
    };
    Ok(outcome.with_children(children))
}
