//! Core vocabulary: the reference keywords and the identity rows.
//!
//! References resolve against the owning schema's base URI, then through the
//! registry: a pointer fragment navigates from the resource root, an anchor
//! fragment looks up the named anchor. Dynamic references additionally
//! consult the dynamic scope, outermost frame first.

use json_schema_uri::Uri;

use crate::context::{EvalContext, KeywordOutcome};
use crate::dispatch::eval_schema;
use crate::draft::{Draft, DraftRange};
use crate::error::{Error, Result};
use crate::keyword::{KeywordClass, KeywordSpec};
use crate::schema::SchemaRef;
use crate::vocabulary::Vocabulary;

use super::KeywordEnv;

pub fn specs() -> Vec<KeywordSpec> {
    let identity = |name, drafts| KeywordSpec {
        name,
        class: KeywordClass::Identity,
        drafts,
        vocabulary: Vocabulary::Core,
        depends_on: &[],
    };
    let reference = |name, drafts| KeywordSpec {
        name,
        class: KeywordClass::Reference,
        drafts,
        vocabulary: Vocabulary::Core,
        depends_on: &[],
    };
    vec![
        identity("$schema", DraftRange::all()),
        identity("$id", DraftRange::all()),
        identity("$anchor", DraftRange::since(Draft::Draft201909)),
        identity("$dynamicAnchor", DraftRange::since(Draft::Draft202012)),
        identity(
            "$recursiveAnchor",
            DraftRange::new(Draft::Draft201909, Draft::Draft201909),
        ),
        identity("$vocabulary", DraftRange::since(Draft::Draft201909)),
        identity("$defs", DraftRange::since(Draft::Draft201909)),
        identity("definitions", DraftRange::new(Draft::Draft6, Draft::Draft7)),
        identity("$comment", DraftRange::since(Draft::Draft7)),
        reference("$ref", DraftRange::all()),
        reference("$dynamicRef", DraftRange::since(Draft::Draft202012)),
        reference(
            "$recursiveRef",
            DraftRange::new(Draft::Draft201909, Draft::Draft201909),
        ),
    ]
}

/// Whether a fragment addresses by JSON Pointer (as opposed to anchor name).
fn is_pointer_fragment(fragment: &str) -> bool {
    fragment.is_empty() || fragment.starts_with('/')
}

/// Resolve a reference string to its target schema through the registry.
fn resolve_target(
    ctx: &EvalContext<'_>,
    env: &KeywordEnv<'_>,
    reference: &str,
) -> Result<(Uri, SchemaRef)> {
    let resolved = env.schema.base_uri.join(reference);
    let fragment = resolved.fragment.clone().unwrap_or_default();
    let root = ctx
        .shared
        .schemas
        .root_or_fetch(&resolved, env.schema.draft)?;
    let target = if is_pointer_fragment(&fragment) {
        root.resolve_pointer(&fragment)
    } else {
        ctx.shared.schemas.anchor(&resolved, &fragment)
    };
    match target {
        Some(target) => Ok((resolved, target)),
        None => Err(Error::ReferenceResolution {
            reference: resolved.to_string(),
        }),
    }
}

/// Evaluate the instance against a resolved reference target, with cycle
/// detection keyed on `(target URI, instance location)`.
fn apply_target(
    ctx: &mut EvalContext<'_>,
    env: &KeywordEnv<'_>,
    keyword: &'static str,
    target_uri: &Uri,
    target: &SchemaRef,
) -> Result<KeywordOutcome> {
    ctx.nav_enter(&target_uri.to_string(), env.instance_location)?;
    let result = eval_schema(
        ctx,
        target,
        env.instance,
        env.path(keyword),
        env.instance_location.clone(),
    );
    ctx.nav_exit();
    let child = result?;
    let mut outcome = if child.valid {
        KeywordOutcome::pass(keyword)
    } else {
        KeywordOutcome::fail(keyword, "referenced schema is not valid")
    };
    outcome.children.push(child);
    Ok(outcome)
}

pub fn eval_ref(
    ctx: &mut EvalContext<'_>,
    env: &KeywordEnv<'_>,
    reference: &str,
) -> Result<KeywordOutcome> {
    let (uri, target) = resolve_target(ctx, env, reference)?;
    apply_target(ctx, env, "$ref", &uri, &target)
}

pub fn eval_dynamic_ref(
    ctx: &mut EvalContext<'_>,
    env: &KeywordEnv<'_>,
    reference: &str,
) -> Result<KeywordOutcome> {
    let resolved = env.schema.base_uri.join(reference);
    let fragment = resolved.fragment.clone().unwrap_or_default();
    if is_pointer_fragment(&fragment) {
        // Pointer fragments never rebind dynamically.
        let (uri, target) = resolve_target(ctx, env, reference)?;
        return apply_target(ctx, env, "$dynamicRef", &uri, &target);
    }

    ctx.shared
        .schemas
        .root_or_fetch(&resolved, env.schema.draft)?;
    let target = match ctx.shared.schemas.dynamic_anchor(&resolved, &fragment) {
        // The initial target is not a dynamic anchor: plain reference.
        None => ctx
            .shared
            .schemas
            .anchor(&resolved, &fragment)
            .ok_or_else(|| Error::ReferenceResolution {
                reference: resolved.to_string(),
            })?,
        Some(initial) => {
            // Rebind to the outermost dynamic scope frame that declares the
            // same dynamic anchor.
            let frames: Vec<Uri> = ctx.scope.frames().to_vec();
            frames
                .iter()
                .find_map(|frame| ctx.shared.schemas.dynamic_anchor(frame, &fragment))
                .unwrap_or(initial)
        }
    };
    apply_target(ctx, env, "$dynamicRef", &resolved, &target)
}

pub fn eval_recursive_ref(
    ctx: &mut EvalContext<'_>,
    env: &KeywordEnv<'_>,
    reference: &str,
) -> Result<KeywordOutcome> {
    if reference != "#" {
        let (uri, target) = resolve_target(ctx, env, reference)?;
        return apply_target(ctx, env, "$recursiveRef", &uri, &target);
    }

    let base = env.schema.base_uri.without_fragment();
    let local_root = ctx.shared.schemas.root_or_fetch(&base, env.schema.draft)?;
    let (uri, target) = if ctx.shared.schemas.recursive_target(&base).is_some() {
        // The local root opts in: rebind to the outermost opted-in frame.
        let frames: Vec<Uri> = ctx.scope.frames().to_vec();
        frames
            .iter()
            .find_map(|frame| {
                ctx.shared
                    .schemas
                    .recursive_target(frame)
                    .map(|target| (frame.without_fragment(), target))
            })
            .unwrap_or((base, local_root))
    } else {
        (base, local_root)
    };
    apply_target(ctx, env, "$recursiveRef", &uri, &target)
}
