//! Output formats: rendering the evaluation result tree.
//!
//! The four formats carry strictly increasing detail: `flag` is the verdict
//! alone, `basic` flattens the tree into a list of units, `detailed` keeps
//! the hierarchy but prunes and compresses it, and `verbose` is the whole
//! tree.

use serde_json::{json, Map, Value};

use crate::context::EvaluationNode;

/// Shape of the rendered evaluation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    Flag,
    Basic,
    Detailed,
    #[default]
    Verbose,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Flag => "flag",
            Self::Basic => "basic",
            Self::Detailed => "detailed",
            Self::Verbose => "verbose",
        }
    }

    pub fn from_name(name: &str) -> Option<OutputFormat> {
        Some(match name {
            "flag" => Self::Flag,
            "basic" => Self::Basic,
            "detailed" => Self::Detailed,
            "verbose" => Self::Verbose,
            _ => return None,
        })
    }
}

/// Render a result tree in the requested format.
pub fn render(root: &EvaluationNode, format: OutputFormat) -> Value {
    match format {
        OutputFormat::Flag => json!({"valid": root.valid}),
        OutputFormat::Basic => to_basic(root),
        OutputFormat::Detailed => {
            to_detailed(root).unwrap_or_else(|| json!({"valid": root.valid}))
        }
        OutputFormat::Verbose => to_verbose(root),
    }
}

fn unit(node: &EvaluationNode) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("valid".to_string(), json!(node.valid));
    map.insert(
        "evaluationPath".to_string(),
        json!(node.evaluation_path.to_string()),
    );
    map.insert("schemaLocation".to_string(), json!(node.schema_location));
    map.insert(
        "instanceLocation".to_string(),
        json!(node.instance_location.to_string()),
    );
    if !node.annotations.is_empty() {
        map.insert(
            "annotations".to_string(),
            Value::Object(node.annotations.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
        );
    }
    if !node.errors.is_empty() {
        map.insert(
            "errors".to_string(),
            Value::Object(
                node.errors
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect(),
            ),
        );
    }
    map
}

fn to_verbose(node: &EvaluationNode) -> Value {
    let mut map = unit(node);
    if !node.children.is_empty() {
        map.insert(
            "details".to_string(),
            Value::Array(node.children.iter().map(to_verbose).collect()),
        );
    }
    Value::Object(map)
}

/// Flatten into a list of units that carry errors (when invalid) or
/// annotations (when valid).
fn to_basic(root: &EvaluationNode) -> Value {
    let mut units = Vec::new();
    collect_basic(root, root.valid, &mut units);
    let mut map = Map::new();
    map.insert("valid".to_string(), json!(root.valid));
    if !units.is_empty() {
        map.insert("details".to_string(), Value::Array(units));
    }
    Value::Object(map)
}

fn collect_basic(node: &EvaluationNode, overall_valid: bool, units: &mut Vec<Value>) {
    // Branches whose validity disagrees with the overall verdict are
    // unchosen: nothing inside them may surface, not even valid descendants.
    if node.valid != overall_valid {
        return;
    }
    let relevant = if overall_valid {
        !node.annotations.is_empty()
    } else {
        !node.errors.is_empty()
    };
    if relevant {
        units.push(Value::Object(unit(node)));
    }
    for child in &node.children {
        collect_basic(child, overall_valid, units);
    }
}

/// Keep the hierarchy, but transformed three ways: branches whose validity
/// disagrees with their parent's are dropped, nodes carrying nothing with no
/// kept descendants are pruned, and a node left with exactly one kept child
/// collapses into that child.
fn to_detailed(node: &EvaluationNode) -> Option<Value> {
    let mut children: Vec<Value> = node
        .children
        .iter()
        .filter(|child| child.valid == node.valid)
        .filter_map(to_detailed)
        .collect();
    if children.len() == 1 {
        return children.pop();
    }
    let carries = !node.annotations.is_empty() || !node.errors.is_empty();
    if !carries && children.is_empty() {
        return None;
    }
    let mut map = unit(node);
    if !children.is_empty() {
        map.insert("details".to_string(), Value::Array(children));
    }
    Some(Value::Object(map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pointer::Pointer;
    use indexmap::IndexMap;

    fn leaf(path: &str, valid: bool) -> EvaluationNode {
        let mut node = EvaluationNode::new(
            Pointer::parse(path),
            Pointer::root(),
            format!("https://example.com/s#{path}"),
        );
        node.valid = valid;
        if !valid {
            node.errors = IndexMap::from([("type".to_string(), "expected string".to_string())]);
        }
        node
    }

    fn tree() -> EvaluationNode {
        let mut root = leaf("", false);
        root.annotations
            .insert("title".to_string(), json!("root"));
        root.children = vec![leaf("/allOf/0", true), leaf("/allOf/1", false)];
        root
    }

    #[test]
    fn test_flag() {
        let rendered = render(&tree(), OutputFormat::Flag);
        assert_eq!(rendered, json!({"valid": false}));
    }

    #[test]
    fn test_basic_lists_error_units() {
        let rendered = render(&tree(), OutputFormat::Basic);
        assert_eq!(rendered["valid"], json!(false));
        let details = rendered["details"].as_array().unwrap();
        // Root and the failing branch; the passing branch is dropped.
        assert_eq!(details.len(), 2);
        assert_eq!(details[1]["evaluationPath"], json!("/allOf/1"));
        assert_eq!(details[1]["errors"]["type"], json!("expected string"));
    }

    #[test]
    fn test_detailed_drops_disagreeing_branches() {
        let mut root = leaf("", false);
        let mut matched = leaf("/anyOf/0", true);
        matched
            .annotations
            .insert("title".to_string(), json!("chosen elsewhere"));
        root.children = vec![matched, leaf("/anyOf/1", false), leaf("/anyOf/2", false)];

        let rendered = render(&root, OutputFormat::Detailed);
        let details = rendered["details"].as_array().unwrap();
        // The valid branch disagrees with its invalid parent and is gone.
        assert_eq!(details.len(), 2);
        assert!(details.iter().all(|unit| unit["valid"] == json!(false)));
        assert!(!rendered.to_string().contains("chosen elsewhere"));
    }

    #[test]
    fn test_detailed_compresses_single_child_chains() {
        let mut root = leaf("", false);
        let mut mid = leaf("/properties/a", false);
        mid.children = vec![leaf("/properties/a/type", false)];
        root.children = vec![mid];

        let rendered = render(&root, OutputFormat::Detailed);
        // Both single-child links collapse; the leaf becomes the root unit.
        assert_eq!(rendered["evaluationPath"], json!("/properties/a/type"));
        assert!(rendered.get("details").is_none());
    }

    #[test]
    fn test_detailed_prunes_empty_nodes() {
        let mut root = leaf("", false);
        let mut empty = leaf("/allOf/0", false);
        empty.errors.clear();
        root.children = vec![empty, leaf("/allOf/1", false), leaf("/allOf/2", false)];

        let rendered = render(&root, OutputFormat::Detailed);
        let details = rendered["details"].as_array().unwrap();
        assert_eq!(details.len(), 2);
        assert!(details
            .iter()
            .all(|unit| unit["evaluationPath"] != json!("/allOf/0")));
    }

    #[test]
    fn test_verbose_keeps_everything() {
        let rendered = render(&tree(), OutputFormat::Verbose);
        assert_eq!(rendered["details"].as_array().unwrap().len(), 2);
        assert_eq!(rendered["annotations"]["title"], json!("root"));
    }

    #[test]
    fn test_format_names() {
        for format in [
            OutputFormat::Flag,
            OutputFormat::Basic,
            OutputFormat::Detailed,
            OutputFormat::Verbose,
        ] {
            assert_eq!(OutputFormat::from_name(format.as_str()), Some(format));
        }
        assert_eq!(OutputFormat::from_name("nope"), None);
    }
}
