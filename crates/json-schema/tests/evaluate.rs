//! Integration tests for the evaluation engine: keyword behavior across
//! drafts, composition, annotation-driven keywords, and format handling.

use json_schema::{evaluate, EvalOptions, OutputFormat};
use proptest::prelude::*;
use serde_json::{json, Value};

fn check(schema: Value, instance: Value, expected: bool) {
    let evaluation = evaluate(&schema, &instance, EvalOptions::default())
        .unwrap_or_else(|e| panic!("evaluate failed for {schema}: {e}"));
    assert_eq!(
        evaluation.valid(),
        expected,
        "schema: {schema}, instance: {instance}"
    );
}

fn check_with(options: EvalOptions, schema: Value, instance: Value, expected: bool) {
    let evaluation = evaluate(&schema, &instance, options)
        .unwrap_or_else(|e| panic!("evaluate failed for {schema}: {e}"));
    assert_eq!(
        evaluation.valid(),
        expected,
        "schema: {schema}, instance: {instance}"
    );
}

// ------------------------------------------------------------ Plain schemas

#[test]
fn test_boolean_schemas() {
    check(json!(true), json!({"anything": [1, 2]}), true);
    check(json!(false), json!(null), false);
    check(json!({}), json!("whatever"), true);
}

#[test]
fn test_type() {
    check(json!({"type": "string"}), json!("x"), true);
    check(json!({"type": "string"}), json!(5), false);
    check(json!({"type": ["integer", "null"]}), json!(null), true);
    check(json!({"type": ["integer", "null"]}), json!(5.0), true);
    check(json!({"type": "integer"}), json!(5.5), false);
    check(json!({"type": "number"}), json!(5.5), true);
}

#[test]
fn test_enum_and_const_compare_numerically() {
    check(json!({"enum": [1, "a"]}), json!(1.0), true);
    check(json!({"enum": [1, "a"]}), json!(2), false);
    check(json!({"const": {"a": [1]}}), json!({"a": [1.0]}), true);
    check(json!({"const": 1}), json!("1"), false);
}

#[test]
fn test_numeric_bounds() {
    check(json!({"minimum": 2, "maximum": 4}), json!(3), true);
    check(json!({"minimum": 2}), json!(2), true);
    check(json!({"exclusiveMinimum": 2}), json!(2), false);
    check(json!({"exclusiveMaximum": 4}), json!(4), false);
    check(json!({"multipleOf": 0.5}), json!(2.5), true);
    check(json!({"multipleOf": 3}), json!(10), false);
    // Non-numbers are out of scope for numeric assertions.
    check(json!({"minimum": 100}), json!("tiny"), true);
}

#[test]
fn test_string_assertions() {
    check(json!({"minLength": 2, "maxLength": 3}), json!("ab"), true);
    check(json!({"minLength": 2}), json!("a"), false);
    // Length counts code points, not bytes.
    check(json!({"maxLength": 2}), json!("héé"), false);
    check(json!({"maxLength": 3}), json!("héé"), true);
    check(json!({"pattern": "^a+$"}), json!("aaa"), true);
    check(json!({"pattern": "^a+$"}), json!("b"), false);
}

#[test]
fn test_invalid_pattern_always_fails_strings() {
    check(json!({"pattern": "(unclosed"}), json!("anything"), false);
    // But stays inapplicable for non-strings.
    check(json!({"pattern": "(unclosed"}), json!(5), true);
}

#[test]
fn test_array_assertions() {
    check(json!({"minItems": 1, "maxItems": 2}), json!([1]), true);
    check(json!({"minItems": 2}), json!([1]), false);
    check(json!({"uniqueItems": true}), json!([1, 2]), true);
    check(json!({"uniqueItems": true}), json!([1, 1.0]), false);
    check(json!({"uniqueItems": false}), json!([1, 1]), true);
}

#[test]
fn test_object_assertions() {
    check(json!({"minProperties": 1}), json!({"a": 1}), true);
    check(json!({"maxProperties": 1}), json!({"a": 1, "b": 2}), false);
    check(json!({"required": ["a", "b"]}), json!({"a": 1, "b": 2}), true);
    check(json!({"required": ["a", "b"]}), json!({"a": 1}), false);
    check(
        json!({"dependentRequired": {"a": ["b"]}}),
        json!({"a": 1, "b": 2}),
        true,
    );
    check(json!({"dependentRequired": {"a": ["b"]}}), json!({"a": 1}), false);
    check(json!({"dependentRequired": {"a": ["b"]}}), json!({"c": 1}), true);
}

// -------------------------------------------------------------- Applicators

#[test]
fn test_properties_family() {
    let schema = json!({
        "properties": {"a": {"type": "integer"}},
        "patternProperties": {"^x-": {"type": "string"}},
        "additionalProperties": {"type": "boolean"}
    });
    check(schema.clone(), json!({"a": 1, "x-k": "v", "other": true}), true);
    check(schema.clone(), json!({"a": "nope"}), false);
    check(schema.clone(), json!({"x-k": 5}), false);
    check(schema, json!({"other": "not a bool"}), false);
}

#[test]
fn test_property_names() {
    check(json!({"propertyNames": {"maxLength": 3}}), json!({"abc": 1}), true);
    check(json!({"propertyNames": {"maxLength": 3}}), json!({"abcd": 1}), false);
}

#[test]
fn test_prefix_items_and_items() {
    let schema = json!({
        "prefixItems": [{"type": "integer"}],
        "items": {"type": "string"}
    });
    check(schema.clone(), json!([1, "a", "b"]), true);
    check(schema.clone(), json!([1]), true);
    check(schema.clone(), json!([1, 2]), false);
    check(schema, json!(["a"]), false);
}

#[test]
fn test_legacy_tuple_items() {
    let schema = json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "items": [{"type": "integer"}],
        "additionalItems": {"type": "string"}
    });
    check(schema.clone(), json!([1, "a"]), true);
    check(schema.clone(), json!([1, 2]), false);
    check(schema, json!(["a"]), false);
}

#[test]
fn test_contains_with_bounds() {
    check(json!({"contains": {"type": "integer"}}), json!(["a", 1]), true);
    check(json!({"contains": {"type": "integer"}}), json!(["a"]), false);
    check(
        json!({"contains": {"type": "integer"}, "minContains": 0}),
        json!(["a"]),
        true,
    );
    check(
        json!({"contains": {"type": "integer"}, "minContains": 2}),
        json!([1, "a"]),
        false,
    );
    check(
        json!({"contains": {"type": "integer"}, "maxContains": 1}),
        json!([1, 2]),
        false,
    );
    check(
        json!({"contains": {"type": "integer"}, "maxContains": 2}),
        json!([1, 2]),
        true,
    );
}

#[test]
fn test_all_any_one_of() {
    check(
        json!({"allOf": [{"type": "integer"}, {"minimum": 2}]}),
        json!(3),
        true,
    );
    check(
        json!({"allOf": [{"type": "integer"}, {"minimum": 2}]}),
        json!(1),
        false,
    );
    check(
        json!({"anyOf": [{"type": "string"}, {"minimum": 2}]}),
        json!(5),
        true,
    );
    check(
        json!({"anyOf": [{"type": "string"}, {"minimum": 2}]}),
        json!(1),
        false,
    );
    check(
        json!({"oneOf": [{"type": "integer"}, {"minimum": 2}]}),
        json!(1),
        true,
    );
    check(
        json!({"oneOf": [{"type": "integer"}, {"minimum": 2}]}),
        json!(3),
        false,
    );
    check(
        json!({"oneOf": [{"type": "integer"}, {"minimum": 2}]}),
        json!(2.5),
        true,
    );
}

#[test]
fn test_not() {
    check(json!({"not": {"type": "string"}}), json!(5), true);
    check(json!({"not": {"type": "string"}}), json!("s"), false);
}

#[test]
fn test_if_then_else() {
    let schema = json!({
        "if": {"required": ["kind"], "properties": {"kind": {"const": "a"}}},
        "then": {"required": ["a_val"]},
        "else": {"required": ["b_val"]}
    });
    check(schema.clone(), json!({"kind": "a", "a_val": 1}), true);
    check(schema.clone(), json!({"kind": "a"}), false);
    check(schema.clone(), json!({"kind": "b", "b_val": 1}), true);
    check(schema, json!({"kind": "b"}), false);
}

#[test]
fn test_then_without_if_is_inert() {
    check(json!({"then": {"required": ["x"]}}), json!({}), true);
    check(json!({"else": {"required": ["x"]}}), json!({}), true);
}

#[test]
fn test_dependent_schemas() {
    let schema = json!({
        "dependentSchemas": {"credit": {"required": ["billing"]}}
    });
    check(schema.clone(), json!({"credit": 1, "billing": "x"}), true);
    check(schema.clone(), json!({"credit": 1}), false);
    check(schema, json!({"cash": 1}), true);
}

#[test]
fn test_legacy_dependencies() {
    let schema = json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "dependencies": {
            "a": ["b"],
            "c": {"required": ["d"]}
        }
    });
    check(schema.clone(), json!({"a": 1, "b": 2}), true);
    check(schema.clone(), json!({"a": 1}), false);
    check(schema.clone(), json!({"c": 1, "d": 2}), true);
    check(schema, json!({"c": 1}), false);
}

// ------------------------------------------------------------- Unevaluated

#[test]
fn test_unevaluated_properties_sees_composition() {
    let schema = json!({
        "allOf": [{"properties": {"a": true}}],
        "properties": {"b": true},
        "unevaluatedProperties": false
    });
    check(schema.clone(), json!({"a": 1, "b": 2}), true);
    check(schema, json!({"a": 1, "c": 3}), false);
}

#[test]
fn test_unevaluated_ignores_failed_branches() {
    // The anyOf branch claiming "b" fails, so its claim does not count.
    let schema = json!({
        "anyOf": [
            {"properties": {"a": {"type": "integer"}}, "required": ["a"]},
            {"properties": {"b": true}, "required": ["b", "missing"]}
        ],
        "unevaluatedProperties": false
    });
    check(schema.clone(), json!({"a": 1}), true);
    check(schema, json!({"a": 1, "b": 2}), false);
}

#[test]
fn test_unevaluated_items() {
    let schema = json!({
        "prefixItems": [{"type": "integer"}],
        "unevaluatedItems": false
    });
    check(schema.clone(), json!([1]), true);
    check(schema, json!([1, 2]), false);

    let with_contains = json!({
        "contains": {"type": "integer"},
        "unevaluatedItems": {"type": "string"}
    });
    check(with_contains.clone(), json!([1, "a"]), true);
    check(with_contains, json!([1, true]), false);
}

#[test]
fn test_unevaluated_properties_applies_schema() {
    let schema = json!({
        "properties": {"a": true},
        "unevaluatedProperties": {"type": "string"}
    });
    check(schema.clone(), json!({"a": 1, "extra": "ok"}), true);
    check(schema, json!({"a": 1, "extra": 2}), false);
}

// ------------------------------------------------------------------ Format

#[test]
fn test_format_annotates_by_default() {
    check(json!({"format": "ipv4"}), json!("999.9.9.9"), true);
}

#[test]
fn test_format_asserts_when_required() {
    let options = EvalOptions {
        require_format_assertion: true,
        ..EvalOptions::default()
    };
    check_with(options.clone(), json!({"format": "ipv4"}), json!("10.0.0.1"), true);
    check_with(options.clone(), json!({"format": "ipv4"}), json!("999.9.9.9"), false);
    check_with(
        options.clone(),
        json!({"format": "date-time"}),
        json!("2024-06-01T12:30:00Z"),
        true,
    );
    check_with(options.clone(), json!({"format": "uuid"}), json!("not-a-uuid"), false);
    // Unknown format names pass unless known-only is set.
    check_with(options, json!({"format": "half-life"}), json!("x"), true);
}

#[test]
fn test_unknown_formats_rejected_when_known_only() {
    let options = EvalOptions {
        require_format_assertion: true,
        only_known_formats: true,
        ..EvalOptions::default()
    };
    check_with(options, json!({"format": "half-life"}), json!("x"), false);
}

// --------------------------------------------------------- Custom keywords

#[test]
fn test_custom_keywords_annotate_verbatim() {
    let options = EvalOptions {
        process_custom_keywords: true,
        ..EvalOptions::default()
    };
    let schema = json!({"type": "object", "x-note": {"team": "billing"}});
    let evaluation = evaluate(&schema, &json!({}), options).unwrap();
    assert!(evaluation.valid());
    assert_eq!(
        evaluation.root.annotations.get("x-note"),
        Some(&json!({"team": "billing"}))
    );
}

#[test]
fn test_custom_keywords_ignored_by_default() {
    let schema = json!({"type": "object", "x-note": {"team": "billing"}});
    let evaluation = evaluate(&schema, &json!({}), EvalOptions::default()).unwrap();
    assert!(evaluation.valid());
    assert!(evaluation.root.annotations.get("x-note").is_none());
}

// ------------------------------------------------------------ Meta-schema

#[test]
fn test_meta_schema_validation_option() {
    let options = EvalOptions {
        validate_against_meta_schema: true,
        ..EvalOptions::default()
    };
    assert!(evaluate(&json!({"minLength": 2}), &json!("ab"), options.clone()).is_ok());
    assert!(evaluate(&json!({"minLength": -2}), &json!("ab"), options).is_err());
}

// ------------------------------------------------------------ Determinism

proptest! {
    #[test]
    fn test_flag_agrees_with_verbose(n in any::<i64>(), s in ".{0,8}") {
        let schema = json!({
            "oneOf": [
                {"type": "integer", "minimum": 0},
                {"type": "string", "minLength": 2},
                {"type": "array", "items": {"type": "integer"}, "minItems": 1},
                {
                    "type": "object",
                    "properties": {"name": {"type": "string"}, "count": {"minimum": 10}},
                    "required": ["name"]
                }
            ]
        });
        let flag_options = EvalOptions {
            output_format: OutputFormat::Flag,
            ..EvalOptions::default()
        };
        for instance in [
            json!(n),
            json!(s),
            json!([n]),
            json!([s]),
            json!({"name": s, "count": n}),
        ] {
            let flag = evaluate(&schema, &instance, flag_options.clone()).unwrap();
            let verbose = evaluate(&schema, &instance, EvalOptions::default()).unwrap();
            prop_assert_eq!(flag.valid(), verbose.valid(), "instance: {}", instance);
        }
    }
}
