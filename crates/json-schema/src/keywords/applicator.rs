//! In-place applicators: the composition keywords, conditionals, and
//! dependency schemas.
//!
//! Composition branches evaluate concurrently. Each fan-out derives a child
//! of the enclosing cancellation flag and shares it among its branches, so
//! an ancestor fire reaches nested fan-outs while a local fire stays local.
//! A branch that observes cancellation abandons its subtree and is dropped
//! from the result, which keeps the overall verdict deterministic:
//! cancellation fires only once the keyword's outcome is already decided,
//! and only when the caller allows short-circuiting at all.

use std::sync::atomic::{AtomicUsize, Ordering};

use indexmap::IndexMap;
use rayon::prelude::*;

use crate::context::{EvalContext, EvaluationNode, KeywordOutcome};
use crate::dispatch::eval_schema;
use crate::draft::{Draft, DraftRange};
use crate::error::{Error, Result};
use crate::keyword::{KeywordClass, KeywordSpec};
use crate::schema::{Dependency, SchemaRef};
use crate::vocabulary::Vocabulary;

use super::KeywordEnv;

pub fn specs() -> Vec<KeywordSpec> {
    let applicator = |name, drafts, depends_on| KeywordSpec {
        name,
        class: KeywordClass::Assertion,
        drafts,
        vocabulary: Vocabulary::Applicator,
        depends_on,
    };
    vec![
        applicator("allOf", DraftRange::all(), &[]),
        applicator("anyOf", DraftRange::all(), &[]),
        applicator("oneOf", DraftRange::all(), &[]),
        applicator("not", DraftRange::all(), &[]),
        applicator("if", DraftRange::since(Draft::Draft7), &[]),
        applicator("then", DraftRange::since(Draft::Draft7), &["if"]),
        applicator("else", DraftRange::since(Draft::Draft7), &["if"]),
        applicator(
            "dependentSchemas",
            DraftRange::since(Draft::Draft201909),
            &[],
        ),
        applicator(
            "dependencies",
            DraftRange::new(Draft::Draft6, Draft::Draft7),
            &[],
        ),
    ]
}

/// When a fan-out may cancel its remaining branches.
#[derive(Clone, Copy)]
enum CancelOn {
    Failure,
    Success,
    SecondSuccess,
}

/// Evaluate composition branches concurrently. A cancelled branch yields
/// `None`; every completed branch keeps its result node in order.
fn fan_out(
    ctx: &EvalContext<'_>,
    env: &KeywordEnv<'_>,
    keyword: &'static str,
    branches: &[SchemaRef],
    cancel_on: CancelOn,
) -> Result<Vec<Option<EvaluationNode>>> {
    let cancel = ctx.cancel.child();
    let successes = AtomicUsize::new(0);
    let results: Vec<Result<EvaluationNode>> = branches
        .par_iter()
        .enumerate()
        .map(|(index, branch)| {
            let mut branch_ctx = ctx.parallel_branch(cancel.clone());
            let result = eval_schema(
                &mut branch_ctx,
                branch,
                env.instance,
                env.path(keyword).push_index(index),
                env.instance_location.clone(),
            );
            if env.short_circuit {
                if let Ok(node) = &result {
                    match cancel_on {
                        CancelOn::Failure if !node.valid => cancel.cancel(),
                        CancelOn::Success if node.valid => cancel.cancel(),
                        CancelOn::SecondSuccess if node.valid => {
                            if successes.fetch_add(1, Ordering::AcqRel) + 1 >= 2 {
                                cancel.cancel();
                            }
                        }
                        _ => {}
                    }
                }
            }
            result
        })
        .collect();

    // An ancestor fire means this whole subtree is abandoned; propagate
    // instead of fabricating an outcome from cancelled branches.
    ctx.checkpoint()?;

    let mut nodes = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(node) => nodes.push(Some(node)),
            Err(Error::Cancelled) => nodes.push(None),
            Err(error) => return Err(error),
        }
    }
    Ok(nodes)
}

fn completed(nodes: Vec<Option<EvaluationNode>>) -> Vec<EvaluationNode> {
    nodes.into_iter().flatten().collect()
}

pub fn eval_all_of(
    ctx: &mut EvalContext<'_>,
    env: &KeywordEnv<'_>,
    branches: &[SchemaRef],
) -> Result<KeywordOutcome> {
    let children = completed(fan_out(ctx, env, "allOf", branches, CancelOn::Failure)?);
    let failed = children.iter().filter(|child| !child.valid).count();
    let outcome = if failed == 0 {
        KeywordOutcome::pass("allOf")
    } else {
        KeywordOutcome::fail("allOf", format!("{failed} subschemas are not valid"))
    };
    Ok(outcome.with_children(children))
}

pub fn eval_any_of(
    ctx: &mut EvalContext<'_>,
    env: &KeywordEnv<'_>,
    branches: &[SchemaRef],
) -> Result<KeywordOutcome> {
    let children = completed(fan_out(ctx, env, "anyOf", branches, CancelOn::Success)?);
    let outcome = if children.iter().any(|child| child.valid) {
        KeywordOutcome::pass("anyOf")
    } else {
        KeywordOutcome::fail("anyOf", "no subschema matched")
    };
    Ok(outcome.with_children(children))
}

pub fn eval_one_of(
    ctx: &mut EvalContext<'_>,
    env: &KeywordEnv<'_>,
    branches: &[SchemaRef],
) -> Result<KeywordOutcome> {
    let children = completed(fan_out(ctx, env, "oneOf", branches, CancelOn::SecondSuccess)?);
    let matched = children.iter().filter(|child| child.valid).count();
    let outcome = if matched == 1 {
        KeywordOutcome::pass("oneOf")
    } else {
        KeywordOutcome::fail(
            "oneOf",
            format!("expected exactly one matching subschema, {matched} matched"),
        )
    };
    Ok(outcome.with_children(children))
}

pub fn eval_not(
    ctx: &mut EvalContext<'_>,
    env: &KeywordEnv<'_>,
    sub: &SchemaRef,
) -> Result<KeywordOutcome> {
    let child = eval_schema(
        ctx,
        sub,
        env.instance,
        env.path("not"),
        env.instance_location.clone(),
    )?;
    let outcome = if child.valid {
        KeywordOutcome::fail("not", "instance must not match the schema")
    } else {
        KeywordOutcome::pass("not")
    };
    Ok(outcome.with_children(vec![child]))
}

pub fn eval_if(
    ctx: &mut EvalContext<'_>,
    env: &KeywordEnv<'_>,
    sub: &SchemaRef,
) -> Result<KeywordOutcome> {
    // `if` never fails the instance; its verdict is read by then/else.
    let child = eval_schema(
        ctx,
        sub,
        env.instance,
        env.path("if"),
        env.instance_location.clone(),
    )?;
    Ok(KeywordOutcome::pass("if").with_children(vec![child]))
}

fn eval_conditional_arm(
    ctx: &mut EvalContext<'_>,
    env: &KeywordEnv<'_>,
    node: &EvaluationNode,
    keyword: &'static str,
    sub: &SchemaRef,
    when_condition: bool,
) -> Result<KeywordOutcome> {
    let applies = match node.child_of_keyword("if") {
        Some(condition) => condition.valid == when_condition,
        None => false,
    };
    if !applies {
        return Ok(KeywordOutcome::inapplicable(keyword));
    }
    let child = eval_schema(
        ctx,
        sub,
        env.instance,
        env.path(keyword),
        env.instance_location.clone(),
    )?;
    let outcome = if child.valid {
        KeywordOutcome::pass(keyword)
    } else {
        KeywordOutcome::fail(keyword, "subschema is not valid")
    };
    Ok(outcome.with_children(vec![child]))
}

pub fn eval_then(
    ctx: &mut EvalContext<'_>,
    env: &KeywordEnv<'_>,
    node: &EvaluationNode,
    sub: &SchemaRef,
) -> Result<KeywordOutcome> {
    eval_conditional_arm(ctx, env, node, "then", sub, true)
}

pub fn eval_else(
    ctx: &mut EvalContext<'_>,
    env: &KeywordEnv<'_>,
    node: &EvaluationNode,
    sub: &SchemaRef,
) -> Result<KeywordOutcome> {
    eval_conditional_arm(ctx, env, node, "else", sub, false)
}

pub fn eval_dependent_schemas(
    ctx: &mut EvalContext<'_>,
    env: &KeywordEnv<'_>,
    map: &IndexMap<String, SchemaRef>,
) -> Result<KeywordOutcome> {
    let Some(object) = env.instance.as_object() else {
        return Ok(KeywordOutcome::inapplicable("dependentSchemas"));
    };
    let mut children = Vec::new();
    let mut failing = Vec::new();
    for (key, sub) in map {
        if object.contains_key(key) {
            let child = eval_schema(
                ctx,
                sub,
                env.instance,
                env.path("dependentSchemas").push(key.clone()),
                env.instance_location.clone(),
            )?;
            if !child.valid {
                failing.push(key.as_str());
            }
            children.push(child);
        }
    }
    let outcome = if failing.is_empty() {
        KeywordOutcome::pass("dependentSchemas")
    } else {
        KeywordOutcome::fail(
            "dependentSchemas",
            format!("dependency schemas for {failing:?} are not valid"),
        )
    };
    Ok(outcome.with_children(children))
}

pub fn eval_dependencies(
    ctx: &mut EvalContext<'_>,
    env: &KeywordEnv<'_>,
    map: &IndexMap<String, Dependency>,
) -> Result<KeywordOutcome> {
    let Some(object) = env.instance.as_object() else {
        return Ok(KeywordOutcome::inapplicable("dependencies"));
    };
    let mut children = Vec::new();
    let mut failing: Vec<String> = Vec::new();
    for (key, dependency) in map {
        if !object.contains_key(key) {
            continue;
        }
        match dependency {
            Dependency::Required(names) => {
                for name in names {
                    if !object.contains_key(name) {
                        failing.push(format!("{key} requires {name}"));
                    }
                }
            }
            Dependency::Schema(sub) => {
                let child = eval_schema(
                    ctx,
                    sub,
                    env.instance,
                    env.path("dependencies").push(key.clone()),
                    env.instance_location.clone(),
                )?;
                if !child.valid {
                    failing.push(format!("dependency schema for {key} is not valid"));
                }
                children.push(child);
            }
        }
    }
    let outcome = if failing.is_empty() {
        KeywordOutcome::pass("dependencies")
    } else {
        KeywordOutcome::fail("dependencies", failing.join("; "))
    };
    Ok(outcome.with_children(children))
}
