//! Content keywords. Annotation-only: since 2019-09 the content vocabulary
//! never asserts, and this engine applies the same reading to draft 7.

use serde_json::json;

use crate::context::KeywordOutcome;
use crate::draft::{Draft, DraftRange};
use crate::error::Result;
use crate::keyword::{KeywordClass, KeywordSpec};
use crate::schema::{serialize, SchemaRef};
use crate::vocabulary::Vocabulary;

use super::KeywordEnv;

pub fn specs() -> Vec<KeywordSpec> {
    let content = |name, drafts| KeywordSpec {
        name,
        class: KeywordClass::Assertion,
        drafts,
        vocabulary: Vocabulary::Content,
        depends_on: &[],
    };
    vec![
        content("contentEncoding", DraftRange::since(Draft::Draft7)),
        content("contentMediaType", DraftRange::since(Draft::Draft7)),
        content("contentSchema", DraftRange::since(Draft::Draft201909)),
    ]
}

pub fn eval_content_encoding(env: &KeywordEnv<'_>, value: &str) -> Result<KeywordOutcome> {
    if env.instance.is_string() {
        Ok(KeywordOutcome::annotate("contentEncoding", json!(value)))
    } else {
        Ok(KeywordOutcome::inapplicable("contentEncoding"))
    }
}

pub fn eval_content_media_type(env: &KeywordEnv<'_>, value: &str) -> Result<KeywordOutcome> {
    if env.instance.is_string() {
        Ok(KeywordOutcome::annotate("contentMediaType", json!(value)))
    } else {
        Ok(KeywordOutcome::inapplicable("contentMediaType"))
    }
}

pub fn eval_content_schema(env: &KeywordEnv<'_>, sub: &SchemaRef) -> Result<KeywordOutcome> {
    // Annotates the subschema itself; it is not applied to the instance.
    if env.instance.is_string() && env.schema.has("contentMediaType") {
        Ok(KeywordOutcome::annotate(
            "contentSchema",
            serialize::to_value(sub),
        ))
    } else {
        Ok(KeywordOutcome::inapplicable("contentSchema"))
    }
}
