//! Output format shapes: unit fields, flattening, pruning, and the
//! detail-monotonicity of the four formats.

use json_schema::{evaluate, EvalOptions, OutputFormat};
use serde_json::{json, Value};

fn render(schema: &Value, instance: &Value, format: OutputFormat) -> Value {
    evaluate(schema, instance, EvalOptions::default())
        .unwrap()
        .to_format(format)
}

/// Number of result units in a rendered output value.
fn unit_count(value: &Value) -> usize {
    let details = value
        .get("details")
        .and_then(Value::as_array)
        .map(|children| children.iter().map(unit_count).sum())
        .unwrap_or(0);
    1 + details
}

#[test]
fn test_flag_shape() {
    let rendered = render(&json!({"type": "string"}), &json!("x"), OutputFormat::Flag);
    assert_eq!(rendered, json!({"valid": true}));
    let rendered = render(&json!({"type": "string"}), &json!(5), OutputFormat::Flag);
    assert_eq!(rendered, json!({"valid": false}));
}

#[test]
fn test_verbose_unit_fields() {
    let schema = json!({"properties": {"a": {"type": "integer"}}});
    let rendered = render(&schema, &json!({"a": 1}), OutputFormat::Verbose);

    assert_eq!(rendered["valid"], json!(true));
    assert_eq!(rendered["evaluationPath"], json!(""));
    assert_eq!(rendered["instanceLocation"], json!(""));
    assert_eq!(
        rendered["annotations"]["properties"],
        json!(["a"])
    );

    let child = &rendered["details"][0];
    assert_eq!(child["evaluationPath"], json!("/properties/a"));
    assert_eq!(child["instanceLocation"], json!("/a"));
    assert!(child["schemaLocation"]
        .as_str()
        .unwrap()
        .ends_with("#/properties/a"));
}

#[test]
fn test_verbose_errors() {
    let schema = json!({"properties": {"a": {"type": "integer"}}});
    let rendered = render(&schema, &json!({"a": "x"}), OutputFormat::Verbose);
    assert_eq!(rendered["valid"], json!(false));
    assert!(rendered["errors"]["properties"].is_string());
    assert_eq!(rendered["details"][0]["errors"]["type"], json!("expected integer"));
}

#[test]
fn test_basic_flattens() {
    let schema = json!({
        "allOf": [
            {"type": "object"},
            {"required": ["name"]}
        ]
    });
    let rendered = render(&schema, &json!({}), OutputFormat::Basic);
    assert_eq!(rendered["valid"], json!(false));
    let details = rendered["details"].as_array().unwrap();
    // Every unit is flat: no nested details.
    for unit in details {
        assert!(unit.get("details").is_none());
        assert!(unit.get("errors").is_some());
    }
    assert!(details
        .iter()
        .any(|unit| unit["evaluationPath"] == json!("/allOf/1")));
}

#[test]
fn test_basic_lists_annotations_when_valid() {
    let schema = json!({"title": "thing", "properties": {"a": {"title": "inner"}}});
    let rendered = render(&schema, &json!({"a": 1}), OutputFormat::Basic);
    assert_eq!(rendered["valid"], json!(true));
    let details = rendered["details"].as_array().unwrap();
    assert!(details
        .iter()
        .any(|unit| unit["annotations"]["title"] == json!("thing")));
    assert!(details
        .iter()
        .any(|unit| unit["annotations"]["title"] == json!("inner")));
}

#[test]
fn test_detailed_prunes_passing_noise() {
    let schema = json!({
        "allOf": [
            {"type": "object"},
            {"required": ["name"]}
        ]
    });
    let detailed = render(&schema, &json!({}), OutputFormat::Detailed);
    let verbose = render(&schema, &json!({}), OutputFormat::Verbose);
    assert!(unit_count(&detailed) < unit_count(&verbose));
    // The passing branch is dropped, and the failing branch, left as the
    // only kept child, is collapsed into the top-level unit.
    assert_eq!(detailed["evaluationPath"], json!("/allOf/1"));
    assert!(detailed["errors"]["required"].is_string());
}

#[test]
fn test_detailed_compresses_single_child_chains() {
    let schema = json!({"properties": {"a": {"type": "integer"}}});
    let rendered = render(&schema, &json!({"a": "x"}), OutputFormat::Detailed);
    // Root -> /properties/a is a single-child chain; the child becomes the
    // top-level unit.
    assert_eq!(rendered["valid"], json!(false));
    assert_eq!(rendered["evaluationPath"], json!("/properties/a"));
    assert_eq!(rendered["instanceLocation"], json!("/a"));
    assert!(rendered["errors"]["type"].is_string());
}

#[test]
fn test_detailed_drops_branch_disagreeing_with_parent() {
    let schema = json!({"anyOf": [{"type": "string"}, {"type": "number"}]});
    let rendered = render(&schema, &json!(5), OutputFormat::Detailed);
    // The failed /anyOf/0 branch disagrees with the valid outcome and is
    // dropped; nothing else carries anything, so only the verdict remains.
    assert_eq!(rendered, json!({"valid": true}));
}

#[test]
fn test_formats_are_monotonic() {
    let schema = json!({
        "title": "widget",
        "type": "object",
        "properties": {
            "name": {"type": "string", "minLength": 1},
            "tags": {"type": "array", "items": {"type": "string"}}
        },
        "required": ["name"]
    });
    for instance in [
        json!({"name": "x", "tags": ["a", "b"]}),
        json!({"name": "", "tags": [1]}),
        json!({}),
    ] {
        let flag = render(&schema, &instance, OutputFormat::Flag);
        let basic = render(&schema, &instance, OutputFormat::Basic);
        let detailed = render(&schema, &instance, OutputFormat::Detailed);
        let verbose = render(&schema, &instance, OutputFormat::Verbose);

        assert!(unit_count(&flag) <= unit_count(&basic));
        assert!(unit_count(&detailed) <= unit_count(&verbose));
        // All four agree on the verdict.
        let verdict = flag["valid"].as_bool().unwrap();
        assert_eq!(basic["valid"], json!(verdict));
        assert_eq!(detailed["valid"], json!(verdict));
        assert_eq!(verbose["valid"], json!(verdict));
    }
}

#[test]
fn test_failed_branch_annotations_dropped() {
    // The failing oneOf branch's title must not leak into basic output.
    let schema = json!({
        "oneOf": [
            {"title": "numberish", "type": "number"},
            {"title": "wordish", "type": "string"}
        ]
    });
    let rendered = render(&schema, &json!("word"), OutputFormat::Basic);
    assert_eq!(rendered["valid"], json!(true));
    let text = rendered.to_string();
    assert!(text.contains("wordish"));
    assert!(!text.contains("numberish"));
}

#[test]
fn test_failed_branch_nested_annotations_dropped() {
    // An annotation produced by a valid subschema deep inside a failing
    // oneOf branch must not surface either: the branch as a whole is
    // unchosen, so nothing inside it leaks.
    let schema = json!({
        "oneOf": [
            {"properties": {"a": {"title": "shadowed"}}, "required": ["zz"]},
            {"type": "object"}
        ]
    });
    let rendered = render(&schema, &json!({"a": 1}), OutputFormat::Basic);
    assert_eq!(rendered["valid"], json!(true));
    assert!(!rendered.to_string().contains("shadowed"));
}
