//! Keyword implementations, grouped by concern.
//!
//! Each module contributes its [`KeywordSpec`] rows via `specs()` and its
//! evaluation bodies; [`eval_keyword`] routes a parsed keyword instance to
//! the right body. Identity keywords (locations, anchors, comments) never
//! assert or annotate and short out here.

pub mod annotation;
pub mod applicator;
pub mod array;
pub mod content;
pub mod core;
pub mod format;
pub mod object;
pub mod unevaluated;
pub mod validation;

use serde_json::Value;

use crate::context::{EvalContext, EvaluationNode, KeywordOutcome};
use crate::error::Result;
use crate::keyword::KeywordSpec;
use crate::pointer::Pointer;
use crate::schema::{Keyword, SchemaObject};

/// Every standard keyword row, in registration order.
pub fn all_specs() -> Vec<KeywordSpec> {
    let mut specs = Vec::new();
    specs.extend(core::specs());
    specs.extend(applicator::specs());
    specs.extend(object::specs());
    specs.extend(array::specs());
    specs.extend(validation::specs());
    specs.extend(unevaluated::specs());
    specs.extend(format::specs());
    specs.extend(content::specs());
    specs.extend(annotation::specs());
    specs
}

/// Read-only surroundings of one keyword evaluation.
pub struct KeywordEnv<'e> {
    /// The schema object the keyword belongs to.
    pub schema: &'e SchemaObject,
    /// The instance value under evaluation.
    pub instance: &'e Value,
    pub evaluation_path: &'e Pointer,
    pub instance_location: &'e Pointer,
    /// Whether `format` asserts in this schema's vocabulary set.
    pub assert_format: bool,
    /// When asserting, whether unknown format names fail.
    pub only_known_formats: bool,
    /// Whether sibling branches may be cancelled once the result is decided.
    pub short_circuit: bool,
}

impl KeywordEnv<'_> {
    /// Evaluation path extended with this keyword's name.
    pub fn path(&self, keyword: &str) -> Pointer {
        self.evaluation_path.push(keyword)
    }
}

/// Evaluate one keyword instance. `node` carries the outcomes applied so
/// far, in priority order, so consumers can read their producers'
/// annotations.
pub fn eval_keyword(
    ctx: &mut EvalContext<'_>,
    env: &KeywordEnv<'_>,
    node: &EvaluationNode,
    keyword: &Keyword,
) -> Result<KeywordOutcome> {
    match keyword {
        // Identity keywords were consumed while building the model.
        Keyword::Id(_)
        | Keyword::SchemaDecl(_)
        | Keyword::Anchor(_)
        | Keyword::DynamicAnchor(_)
        | Keyword::RecursiveAnchor(_)
        | Keyword::Vocabulary(_)
        | Keyword::Defs(_)
        | Keyword::Definitions(_)
        | Keyword::Comment(_) => Ok(KeywordOutcome::inapplicable(keyword.name())),

        Keyword::Ref(reference) => core::eval_ref(ctx, env, reference),
        Keyword::DynamicRef(reference) => core::eval_dynamic_ref(ctx, env, reference),
        Keyword::RecursiveRef(reference) => core::eval_recursive_ref(ctx, env, reference),

        Keyword::AllOf(list) => applicator::eval_all_of(ctx, env, list),
        Keyword::AnyOf(list) => applicator::eval_any_of(ctx, env, list),
        Keyword::OneOf(list) => applicator::eval_one_of(ctx, env, list),
        Keyword::Not(sub) => applicator::eval_not(ctx, env, sub),
        Keyword::If(sub) => applicator::eval_if(ctx, env, sub),
        Keyword::Then(sub) => applicator::eval_then(ctx, env, node, sub),
        Keyword::Else(sub) => applicator::eval_else(ctx, env, node, sub),
        Keyword::DependentSchemas(map) => applicator::eval_dependent_schemas(ctx, env, map),
        Keyword::Dependencies(map) => applicator::eval_dependencies(ctx, env, map),

        Keyword::Properties(map) => object::eval_properties(ctx, env, map),
        Keyword::PatternProperties(pairs) => object::eval_pattern_properties(ctx, env, pairs),
        Keyword::AdditionalProperties(sub) => {
            object::eval_additional_properties(ctx, env, node, sub)
        }
        Keyword::PropertyNames(sub) => object::eval_property_names(ctx, env, sub),

        Keyword::PrefixItems(list) => array::eval_prefix_items(ctx, env, list),
        Keyword::Items(items) => array::eval_items(ctx, env, node, items),
        Keyword::AdditionalItems(sub) => array::eval_additional_items(ctx, env, node, sub),
        Keyword::Contains(sub) => array::eval_contains(ctx, env, sub),
        Keyword::MinContains(limit) => array::eval_min_contains(env, node, *limit),
        Keyword::MaxContains(limit) => array::eval_max_contains(env, node, *limit),

        Keyword::UnevaluatedItems(sub) => unevaluated::eval_unevaluated_items(ctx, env, node, sub),
        Keyword::UnevaluatedProperties(sub) => {
            unevaluated::eval_unevaluated_properties(ctx, env, node, sub)
        }

        Keyword::Type { types, .. } => validation::eval_type(env, types),
        Keyword::Enum(values) => validation::eval_enum(env, values),
        Keyword::Const(value) => validation::eval_const(env, value),
        Keyword::MultipleOf(n) => validation::eval_multiple_of(env, n),
        Keyword::Maximum(n) => validation::eval_maximum(env, n),
        Keyword::ExclusiveMaximum(n) => validation::eval_exclusive_maximum(env, n),
        Keyword::Minimum(n) => validation::eval_minimum(env, n),
        Keyword::ExclusiveMinimum(n) => validation::eval_exclusive_minimum(env, n),
        Keyword::MaxLength(limit) => validation::eval_max_length(env, *limit),
        Keyword::MinLength(limit) => validation::eval_min_length(env, *limit),
        Keyword::Pattern(pattern) => validation::eval_pattern(env, pattern),
        Keyword::MaxItems(limit) => validation::eval_max_items(env, *limit),
        Keyword::MinItems(limit) => validation::eval_min_items(env, *limit),
        Keyword::UniqueItems(unique) => validation::eval_unique_items(env, *unique),
        Keyword::MaxProperties(limit) => validation::eval_max_properties(env, *limit),
        Keyword::MinProperties(limit) => validation::eval_min_properties(env, *limit),
        Keyword::Required(names) => validation::eval_required(env, names),
        Keyword::DependentRequired(map) => validation::eval_dependent_required(env, map),

        Keyword::Format(name) => format::eval_format(env, name),

        Keyword::ContentEncoding(value) => content::eval_content_encoding(env, value),
        Keyword::ContentMediaType(value) => content::eval_content_media_type(env, value),
        Keyword::ContentSchema(sub) => content::eval_content_schema(env, sub),

        Keyword::Title(value) => annotation::annotate_str("title", value),
        Keyword::Description(value) => annotation::annotate_str("description", value),
        Keyword::Default(value) => annotation::annotate_value("default", value),
        Keyword::Deprecated(value) => annotation::annotate_bool("deprecated", *value),
        Keyword::ReadOnly(value) => annotation::annotate_bool("readOnly", *value),
        Keyword::WriteOnly(value) => annotation::annotate_bool("writeOnly", *value),
        Keyword::Examples(values) => annotation::annotate_list("examples", values),
    }
}
