//! Object applicators.
//!
//! `properties` and `patternProperties` annotate the property names they
//! applied to; `additionalProperties` reads both annotations from the
//! current node to find what is left over.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde_json::{json, Value};

use crate::context::{EvalContext, EvaluationNode, KeywordOutcome};
use crate::dispatch::eval_schema;
use crate::draft::DraftRange;
use crate::error::Result;
use crate::keyword::{KeywordClass, KeywordSpec};
use crate::schema::{CompiledPattern, SchemaRef};
use crate::vocabulary::Vocabulary;

use super::KeywordEnv;

pub fn specs() -> Vec<KeywordSpec> {
    let applicator = |name, depends_on| KeywordSpec {
        name,
        class: KeywordClass::Assertion,
        drafts: DraftRange::all(),
        vocabulary: Vocabulary::Applicator,
        depends_on,
    };
    vec![
        applicator("properties", &[]),
        applicator("patternProperties", &[]),
        applicator(
            "additionalProperties",
            &["properties", "patternProperties"],
        ),
        applicator("propertyNames", &[]),
    ]
}

pub fn eval_properties(
    ctx: &mut EvalContext<'_>,
    env: &KeywordEnv<'_>,
    map: &IndexMap<String, SchemaRef>,
) -> Result<KeywordOutcome> {
    let Some(object) = env.instance.as_object() else {
        return Ok(KeywordOutcome::inapplicable("properties"));
    };
    let mut children = Vec::new();
    let mut applied = Vec::new();
    let mut failing = Vec::new();
    for (name, sub) in map {
        let Some(value) = object.get(name) else {
            continue;
        };
        let child = eval_schema(
            ctx,
            sub,
            value,
            env.path("properties").push(name.clone()),
            env.instance_location.push(name.clone()),
        )?;
        if !child.valid {
            failing.push(name.as_str());
        }
        applied.push(name.as_str());
        children.push(child);
    }
    let outcome = if failing.is_empty() {
        KeywordOutcome::annotate("properties", json!(applied))
    } else {
        KeywordOutcome::fail("properties", format!("properties {failing:?} are not valid"))
    };
    Ok(outcome.with_children(children))
}

pub fn eval_pattern_properties(
    ctx: &mut EvalContext<'_>,
    env: &KeywordEnv<'_>,
    pairs: &[(CompiledPattern, SchemaRef)],
) -> Result<KeywordOutcome> {
    let Some(object) = env.instance.as_object() else {
        return Ok(KeywordOutcome::inapplicable("patternProperties"));
    };
    let mut children = Vec::new();
    let mut applied = Vec::new();
    let mut failing = Vec::new();
    for (name, value) in object {
        for (pattern, sub) in pairs {
            let Some(matched) = pattern.is_match(name) else {
                return Ok(KeywordOutcome::fail(
                    "patternProperties",
                    format!("pattern {:?} is not a valid regular expression", pattern.source()),
                ));
            };
            if !matched {
                continue;
            }
            let child = eval_schema(
                ctx,
                sub,
                value,
                env.path("patternProperties").push(pattern.source().to_string()),
                env.instance_location.push(name.clone()),
            )?;
            if !child.valid {
                failing.push(name.as_str());
            }
            if !applied.contains(&name.as_str()) {
                applied.push(name.as_str());
            }
            children.push(child);
        }
    }
    let outcome = if failing.is_empty() {
        KeywordOutcome::annotate("patternProperties", json!(applied))
    } else {
        KeywordOutcome::fail(
            "patternProperties",
            format!("properties {failing:?} are not valid"),
        )
    };
    Ok(outcome.with_children(children))
}

/// Property names already claimed by annotations on the current node.
fn claimed_names(node: &EvaluationNode, keywords: &[&str]) -> HashSet<String> {
    let mut claimed = HashSet::new();
    for keyword in keywords {
        if let Some(Value::Array(names)) = node.annotations.get(*keyword) {
            for name in names {
                if let Some(name) = name.as_str() {
                    claimed.insert(name.to_string());
                }
            }
        }
    }
    claimed
}

pub fn eval_additional_properties(
    ctx: &mut EvalContext<'_>,
    env: &KeywordEnv<'_>,
    node: &EvaluationNode,
    sub: &SchemaRef,
) -> Result<KeywordOutcome> {
    let Some(object) = env.instance.as_object() else {
        return Ok(KeywordOutcome::inapplicable("additionalProperties"));
    };
    let claimed = claimed_names(node, &["properties", "patternProperties"]);
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
            env.path("additionalProperties").push(name.clone()),
            env.instance_location.push(name.clone()),
        )?;
        if !child.valid {
            failing.push(name.as_str());
        }
        applied.push(name.as_str());
        children.push(child);
    }
    let outcome = if failing.is_empty() {
        KeywordOutcome::annotate("additionalProperties", json!(applied))
    } else {
        KeywordOutcome::fail(
            "additionalProperties",
            format!("additional properties {failing:?} are not allowed"),
        )
    };
    Ok(outcome.with_children(children))
}

pub fn eval_property_names(
    ctx: &mut EvalContext<'_>,
    env: &KeywordEnv<'_>,
    sub: &SchemaRef,
) -> Result<KeywordOutcome> {
    let Some(object) = env.instance.as_object() else {
        return Ok(KeywordOutcome::inapplicable("propertyNames"));
    };
    let mut children = Vec::new();
    let mut failing = Vec::new();
    for name in object.keys() {
        // The property name itself is the instance here; it has no pointer
        // of its own, so the child keeps the object's location.
        let name_value = Value::String(name.clone());
        let child = eval_schema(
            ctx,
            sub,
            &name_value,
            env.path("propertyNames"),
            env.instance_location.clone(),
        )?;
        if !child.valid {
            failing.push(name.as_str());
        }
        children.push(child);
    }
    let outcome = if failing.is_empty() {
        KeywordOutcome::pass("propertyNames")
    } else {
        KeywordOutcome::fail(
            "propertyNames",
            format!("property names {failing:?} are not valid"),
        )
    };
    Ok(outcome.with_children(children))
}
