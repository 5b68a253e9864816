//! Embedded meta-schemas and schema-document validation.
//!
//! These are compact structural meta-schemas: one resource per draft,
//! constraining the value shape of every keyword that draft recognizes.
//! They are built once, parsed into a dedicated registry, and used when a
//! caller opts into validating schema documents before evaluation.

use once_cell::sync::Lazy;
use serde_json::{json, Map, Value};

use crate::context::{EvalContext, SharedState};
use crate::dispatch::eval_schema;
use crate::draft::Draft;
use crate::error::{Error, Result};
use crate::keyword::KeywordRegistry;
use crate::options::EvalOptions;
use crate::output::OutputFormat;
use crate::pointer::Pointer;
use crate::registry::SchemaRegistry;
use crate::schema::parse::{parse, ParseOptions};
use crate::schema::SchemaRef;
use crate::vocabulary::VocabularyRegistry;
use json_schema_uri::Uri;

const DRAFTS: [Draft; 5] = [
    Draft::Draft6,
    Draft::Draft7,
    Draft::Draft201909,
    Draft::Draft202012,
    Draft::Next,
];

/// The embedded meta-schema document for a draft.
pub fn meta_schema_document(draft: Draft) -> &'static Value {
    static DOCUMENTS: Lazy<Vec<(Draft, Value)>> =
        Lazy::new(|| DRAFTS.iter().map(|&draft| (draft, build(draft))).collect());
    DOCUMENTS
        .iter()
        .find(|(d, _)| *d == draft)
        .map(|(_, doc)| doc)
        .unwrap()
}

struct MetaStore {
    registry: SchemaRegistry,
    parsed: Vec<(Draft, SchemaRef)>,
}

fn store() -> &'static MetaStore {
    static STORE: Lazy<MetaStore> = Lazy::new(|| {
        let registry = SchemaRegistry::new();
        let mut parsed = Vec::new();
        for draft in DRAFTS {
            let schema = parse(
                meta_schema_document(draft),
                &ParseOptions {
                    base_uri: Uri::parse(draft.meta_schema_uri()),
                    draft,
                },
            )
            .unwrap_or_else(|e| panic!("embedded {draft} meta-schema is malformed: {e}"));
            registry.scan(&schema);
            parsed.push((draft, schema));
        }
        MetaStore { registry, parsed }
    });
    Lazy::force(&STORE)
}

/// The parsed meta-schema for a draft.
pub fn meta_schema(draft: Draft) -> &'static SchemaRef {
    store()
        .parsed
        .iter()
        .find(|(d, _)| *d == draft)
        .map(|(_, schema)| schema)
        .unwrap()
}

/// Validate a schema document against its draft's meta-schema.
pub fn validate_schema(document: &Value, draft: Draft) -> Result<()> {
    let store = store();
    let options = EvalOptions {
        evaluate_as: draft,
        output_format: OutputFormat::Basic,
        ..EvalOptions::default()
    };
    let vocabularies = VocabularyRegistry::new();
    let shared = SharedState {
        options: &options,
        schemas: &store.registry,
        keywords: KeywordRegistry::standard(),
        vocabularies: &vocabularies,
    };
    let meta = meta_schema(draft);
    let root_base = Uri::parse(draft.meta_schema_uri());
    let mut ctx = EvalContext::new(&shared, root_base);
    let result = eval_schema(&mut ctx, meta, document, Pointer::root(), Pointer::root())?;
    if result.valid {
        return Ok(());
    }
    let mut failures = Vec::new();
    collect_failures(&result, &mut failures);
    Err(Error::InvalidSchema(format!(
        "document does not conform to the {draft} meta-schema: {}",
        failures.join("; ")
    )))
}

fn collect_failures(node: &crate::context::EvaluationNode, out: &mut Vec<String>) {
    for (keyword, message) in &node.errors {
        // Composition rollups repeat what their children already say.
        if keyword != "allOf" && keyword != "anyOf" && keyword != "oneOf" {
            out.push(format!("{}: {message}", node.instance_location));
        }
    }
    for child in &node.children {
        if !child.valid {
            collect_failures(child, out);
        }
    }
}

fn schema_ref() -> Value {
    json!({"$ref": "#"})
}

fn schema_array() -> Value {
    json!({"type": "array", "items": {"$ref": "#"}})
}

fn schema_map() -> Value {
    json!({"type": "object", "additionalProperties": {"$ref": "#"}})
}

fn non_negative() -> Value {
    json!({"type": "integer", "minimum": 0})
}

fn string_array() -> Value {
    json!({"type": "array", "items": {"type": "string"}})
}

fn type_value() -> Value {
    json!({
        "anyOf": [
            {"type": "string"},
            {"type": "array", "items": {"type": "string"}, "minItems": 1}
        ]
    })
}

/// Build the compact meta-schema for one draft.
fn build(draft: Draft) -> Value {
    let mut properties = Map::new();
    let mut set = |name: &str, value: Value| {
        properties.insert(name.to_string(), value);
    };

    set("$id", json!({"type": "string"}));
    set("$schema", json!({"type": "string"}));
    set("$ref", json!({"type": "string"}));

    if draft >= Draft::Draft201909 {
        set("$anchor", json!({"type": "string"}));
        set("$defs", schema_map());
        set(
            "$vocabulary",
            json!({"type": "object", "additionalProperties": {"type": "boolean"}}),
        );
    }
    if draft == Draft::Draft201909 {
        set("$recursiveRef", json!({"type": "string"}));
        set("$recursiveAnchor", json!({"type": "boolean"}));
    }
    if draft >= Draft::Draft202012 {
        set("$dynamicRef", json!({"type": "string"}));
        set("$dynamicAnchor", json!({"type": "string"}));
        set("prefixItems", schema_array());
    }
    if draft >= Draft::Draft7 {
        set("$comment", json!({"type": "string"}));
        set("if", schema_ref());
        set("then", schema_ref());
        set("else", schema_ref());
        set("readOnly", json!({"type": "boolean"}));
        set("writeOnly", json!({"type": "boolean"}));
        set("contentEncoding", json!({"type": "string"}));
        set("contentMediaType", json!({"type": "string"}));
    }
    if draft <= Draft::Draft7 {
        set("definitions", schema_map());
        set(
            "dependencies",
            json!({
                "type": "object",
                "additionalProperties": {
                    "anyOf": [{"$ref": "#"}, {"type": "array", "items": {"type": "string"}}]
                }
            }),
        );
    }
    if draft >= Draft::Draft201909 {
        set("dependentSchemas", schema_map());
        set("dependentRequired", json!({
            "type": "object",
            "additionalProperties": {"type": "array", "items": {"type": "string"}}
        }));
        set("unevaluatedItems", schema_ref());
        set("unevaluatedProperties", schema_ref());
        set("maxContains", non_negative());
        set("minContains", non_negative());
        set("deprecated", json!({"type": "boolean"}));
        set("contentSchema", schema_ref());
    }

    set("allOf", schema_array());
    set("anyOf", schema_array());
    set("oneOf", schema_array());
    set("not", schema_ref());
    set("properties", schema_map());
    set("patternProperties", schema_map());
    set("additionalProperties", schema_ref());
    set("propertyNames", schema_ref());
    set("contains", schema_ref());

    if draft >= Draft::Draft202012 {
        set("items", schema_ref());
    } else {
        set(
            "items",
            json!({"anyOf": [{"$ref": "#"}, {"type": "array", "items": {"$ref": "#"}}]}),
        );
        set("additionalItems", schema_ref());
    }

    set("type", type_value());
    set("enum", json!({"type": "array"}));
    set("const", json!(true));
    set("multipleOf", json!({"type": "number", "exclusiveMinimum": 0}));
    set("maximum", json!({"type": "number"}));
    set("exclusiveMaximum", json!({"type": "number"}));
    set("minimum", json!({"type": "number"}));
    set("exclusiveMinimum", json!({"type": "number"}));
    set("maxLength", non_negative());
    set("minLength", non_negative());
    set("pattern", json!({"type": "string", "format": "regex"}));
    set("maxItems", non_negative());
    set("minItems", non_negative());
    set("uniqueItems", json!({"type": "boolean"}));
    set("maxProperties", non_negative());
    set("minProperties", non_negative());
    set("required", string_array());

    set("title", json!({"type": "string"}));
    set("description", json!({"type": "string"}));
    set("default", json!(true));
    set("examples", json!({"type": "array"}));
    set("format", json!({"type": "string"}));

    json!({
        "$id": draft.meta_schema_uri(),
        "$schema": draft.meta_schema_uri(),
        "type": ["object", "boolean"],
        "properties": Value::Object(properties)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_schemas_parse() {
        for draft in DRAFTS {
            assert!(meta_schema(draft).as_object().is_some(), "{draft}");
        }
    }

    #[test]
    fn test_valid_schema_accepted() {
        let document = json!({
            "type": "object",
            "properties": {"name": {"type": "string", "minLength": 1}},
            "required": ["name"]
        });
        assert!(validate_schema(&document, Draft::Draft202012).is_ok());
        assert!(validate_schema(&json!(true), Draft::Draft7).is_ok());
    }

    #[test]
    fn test_malformed_schema_rejected() {
        assert!(matches!(
            validate_schema(&json!({"minLength": -1}), Draft::Draft202012),
            Err(Error::InvalidSchema(_))
        ));
        assert!(matches!(
            validate_schema(&json!({"required": [1, 2]}), Draft::Draft7),
            Err(Error::InvalidSchema(_))
        ));
        assert!(matches!(
            validate_schema(&json!({"type": []}), Draft::Draft202012),
            Err(Error::InvalidSchema(_))
        ));
    }

    #[test]
    fn test_legacy_keywords_gated() {
        // prefixItems is unknown to draft 7 and passes untyped there.
        assert!(validate_schema(&json!({"prefixItems": 5}), Draft::Draft7).is_ok());
        assert!(
            validate_schema(&json!({"prefixItems": 5}), Draft::Draft202012).is_err()
        );
    }
}
