//! Schema dispatch: evaluating one schema node against one instance value.
//!
//! Dispatch resolves the node's effective draft and vocabulary set (walking
//! a custom meta-schema chain through the registry when needed), filters the
//! node's keywords by draft and vocabulary, orders them by derived priority,
//! and folds each outcome into the result node. The dynamic scope frame is
//! pushed before the keywords run and popped afterwards, errors included.

use std::collections::HashSet;

use serde_json::Value;

use crate::context::{EvalContext, EvaluationNode, KeywordOutcome};
use crate::draft::Draft;
use crate::error::{Error, Result};
use crate::keyword::KeywordClass;
use crate::keywords::{self, KeywordEnv};
use crate::output::OutputFormat;
use crate::pointer::Pointer;
use crate::schema::{Keyword, Schema, SchemaObject, SchemaRef};
use crate::vocabulary::{ActiveVocabularies, Vocabulary};

/// Evaluate `instance` against `schema`, producing the result subtree.
pub fn eval_schema(
    ctx: &mut EvalContext<'_>,
    schema: &SchemaRef,
    instance: &Value,
    evaluation_path: Pointer,
    instance_location: Pointer,
) -> Result<EvaluationNode> {
    ctx.checkpoint()?;
    let obj = match &**schema {
        Schema::Bool(verdict) => {
            let location = format!(
                "{}#{}",
                ctx.scope.top().without_fragment(),
                evaluation_path
            );
            let mut node = EvaluationNode::new(evaluation_path, instance_location, location);
            if !verdict {
                node.apply(KeywordOutcome::fail("schema", "boolean schema is false"));
            }
            return Ok(node);
        }
        Schema::Object(obj) => obj,
    };

    let pushed = ctx.scope.push(&obj.base_uri);
    let result = eval_object(ctx, schema, obj, instance, evaluation_path, instance_location);
    if pushed {
        ctx.scope.pop();
    }
    result
}

fn eval_object(
    ctx: &mut EvalContext<'_>,
    schema: &SchemaRef,
    obj: &SchemaObject,
    instance: &Value,
    evaluation_path: Pointer,
    instance_location: Pointer,
) -> Result<EvaluationNode> {
    let (draft, active) = resolve_meta(ctx, obj)?;
    let options = ctx.shared.options;

    let short_circuit = matches!(options.output_format, OutputFormat::Flag)
        && !schema.needs_annotations();

    let mut node = EvaluationNode::new(
        evaluation_path.clone(),
        instance_location.clone(),
        obj.canonical_location(),
    );
    let env = KeywordEnv {
        schema: obj,
        instance,
        evaluation_path: &evaluation_path,
        instance_location: &instance_location,
        assert_format: active.allows(Vocabulary::FormatAssertion, draft)
            || options.require_format_assertion,
        only_known_formats: options.only_known_formats,
        short_circuit,
    };

    // Pre-2019-09: a $ref suppresses every sibling keyword.
    let exclusive_ref = draft.legacy_ref_semantics() && obj.has("$ref");

    let mut ordered: Vec<(&Keyword, u32, u32)> = Vec::with_capacity(obj.keywords.len());
    for keyword in &obj.keywords {
        let Some(info) = ctx.shared.keywords.get(keyword.name()) else {
            continue;
        };
        if info.spec.class == KeywordClass::Identity {
            continue;
        }
        if exclusive_ref && !matches!(keyword, Keyword::Ref(_)) {
            continue;
        }
        if !info.spec.drafts.contains(draft) {
            continue;
        }
        if !active.allows(info.spec.vocabulary, draft) {
            continue;
        }
        ordered.push((keyword, info.priority, info.order));
    }
    ordered.sort_by_key(|&(_, priority, order)| (priority, order));

    for (keyword, _, _) in ordered {
        let outcome = keywords::eval_keyword(ctx, &env, &node, keyword)?;
        node.apply(outcome);
        if short_circuit && !node.valid {
            break;
        }
    }

    if options.process_custom_keywords && node.valid {
        for (name, value) in &obj.other {
            node.annotations.insert(name.clone(), value.clone());
        }
    }

    Ok(node)
}

/// The effective draft and vocabulary set for a schema object.
///
/// A known `$schema` was resolved at parse time and activates every standard
/// vocabulary of its draft. A custom `$schema` is chased through the
/// registry until a meta-schema with a known draft is reached; the first
/// `$vocabulary` declaration found on the way wins.
fn resolve_meta(
    ctx: &EvalContext<'_>,
    obj: &SchemaObject,
) -> Result<(Draft, ActiveVocabularies)> {
    let Some(start) = &obj.meta_schema else {
        return Ok((obj.draft, ActiveVocabularies::everything()));
    };

    let mut visited = HashSet::new();
    let mut current = start.clone();
    let mut vocabularies = None;
    loop {
        if !visited.insert(current.to_string()) {
            return Err(Error::MetaSchemaResolution(start.to_string()));
        }
        let meta = ctx
            .shared
            .schemas
            .root_or_fetch(&current, obj.draft)
            .map_err(|_| Error::MetaSchemaResolution(current.to_string()))?;
        let Some(meta_obj) = meta.as_object() else {
            return Err(Error::MetaSchemaResolution(current.to_string()));
        };
        if vocabularies.is_none() {
            if let Some(Keyword::Vocabulary(declared)) = meta_obj.get("$vocabulary") {
                vocabularies = Some(ctx.shared.vocabularies.resolve(declared)?);
            }
        }
        match &meta_obj.meta_schema {
            Some(next) => current = next.clone(),
            None => {
                let active =
                    vocabularies.unwrap_or_else(ActiveVocabularies::everything);
                return Ok((meta_obj.draft, active));
            }
        }
    }
}
