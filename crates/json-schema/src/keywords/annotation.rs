//! Meta-data keywords: pure annotations.

use serde_json::{json, Value};

use crate::context::KeywordOutcome;
use crate::draft::{Draft, DraftRange};
use crate::error::Result;
use crate::keyword::{KeywordClass, KeywordSpec};
use crate::vocabulary::Vocabulary;

pub fn specs() -> Vec<KeywordSpec> {
    let meta = |name, drafts| KeywordSpec {
        name,
        class: KeywordClass::Assertion,
        drafts,
        vocabulary: Vocabulary::MetaData,
        depends_on: &[],
    };
    vec![
        meta("title", DraftRange::all()),
        meta("description", DraftRange::all()),
        meta("default", DraftRange::all()),
        meta("deprecated", DraftRange::since(Draft::Draft201909)),
        meta("readOnly", DraftRange::since(Draft::Draft7)),
        meta("writeOnly", DraftRange::since(Draft::Draft7)),
        meta("examples", DraftRange::all()),
    ]
}

pub fn annotate_str(keyword: &'static str, value: &str) -> Result<KeywordOutcome> {
    Ok(KeywordOutcome::annotate(keyword, json!(value)))
}

pub fn annotate_bool(keyword: &'static str, value: bool) -> Result<KeywordOutcome> {
    Ok(KeywordOutcome::annotate(keyword, json!(value)))
}

pub fn annotate_value(keyword: &'static str, value: &Value) -> Result<KeywordOutcome> {
    Ok(KeywordOutcome::annotate(keyword, value.clone()))
}

pub fn annotate_list(keyword: &'static str, values: &[Value]) -> Result<KeywordOutcome> {
    Ok(KeywordOutcome::annotate(keyword, Value::Array(values.to_vec())))
}
