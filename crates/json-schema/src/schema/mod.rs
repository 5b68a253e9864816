//! The schema document model.
//!
//! A schema is either a boolean literal or an object holding a set of
//! uniquely-named keyword instances plus unrecognized ("other") members that
//! are preserved verbatim for round-tripping. Applicator keywords own nested
//! schemas; `$ref`-family keywords hold an unresolved reference string, so
//! the ownership graph is a strict tree even when evaluation recurses.

pub mod parse;
pub mod serialize;

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use json_schema_uri::Uri;
use regex::Regex;
use serde_json::Value;

use crate::draft::Draft;
use crate::error::{Error, Result};
use crate::pointer::{unescape_token, Pointer};

/// A shared handle to a schema node. Subschemas and registry entries hold
/// these; cloning is cheap.
pub type SchemaRef = Arc<Schema>;

/// A schema: boolean literal or keyword set.
#[derive(Debug, Clone)]
pub enum Schema {
    Bool(bool),
    Object(Box<SchemaObject>),
}

/// One keyword-set schema node, with the resolution state assigned while
/// building: the resolved base URI, the pointer from that base, and the
/// declared draft (inherited when `$schema` is absent).
#[derive(Debug, Clone)]
pub struct SchemaObject {
    /// Keywords in declaration order. Uniqueness by name is enforced at
    /// construction.
    pub keywords: Vec<Keyword>,
    /// Unrecognized members, preserved verbatim.
    pub other: IndexMap<String, Value>,
    /// Resolved base URI (from the enclosing `$id` context).
    pub base_uri: Uri,
    /// JSON Pointer from the base URI's resource root to this node.
    pub location: Pointer,
    /// Draft this node is evaluated under.
    pub draft: Draft,
    /// A custom `$schema` URI whose draft must be resolved through the
    /// registry at dispatch time.
    pub meta_schema: Option<Uri>,
    /// True when this node or any owned descendant carries `unevaluated*`
    /// (or a reference keyword, which is not analyzable statically). When
    /// false and the output format is flag, evaluation may short-circuit.
    pub needs_annotations: bool,
}

impl SchemaObject {
    /// Checks keyword-name uniqueness; duplicate names are a construction
    /// error.
    pub fn check_unique(keywords: &[Keyword]) -> Result<()> {
        let mut seen = HashSet::new();
        for keyword in keywords {
            if !seen.insert(keyword.name()) {
                return Err(Error::DuplicateKeyword(keyword.name().to_string()));
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Keyword> {
        self.keywords.iter().find(|k| k.name() == name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// The canonical location of this node: `base#pointer`.
    pub fn canonical_location(&self) -> String {
        format!("{}#{}", self.base_uri.without_fragment(), self.location)
    }
}

impl Schema {
    pub fn as_object(&self) -> Option<&SchemaObject> {
        match self {
            Schema::Object(obj) => Some(obj),
            Schema::Bool(_) => None,
        }
    }

    /// True when this node or any owned descendant needs full annotation
    /// retention.
    pub fn needs_annotations(&self) -> bool {
        match self {
            Schema::Bool(_) => false,
            Schema::Object(obj) => obj.needs_annotations,
        }
    }

    /// Resolve a JSON Pointer (given as a fragment string, e.g. `/$defs/x`)
    /// into this schema's body.
    pub fn resolve_pointer(self: &SchemaRef, fragment: &str) -> Option<SchemaRef> {
        if fragment.is_empty() {
            return Some(Arc::clone(self));
        }
        let tokens: Vec<String> = fragment
            .strip_prefix('/')?
            .split('/')
            .map(unescape_token)
            .collect();
        let mut current = Arc::clone(self);
        let mut i = 0;
        while i < tokens.len() {
            let obj = current.as_object()?;
            let step = obj.get(&tokens[i]).map(|keyword| {
                keyword.step(tokens.get(i + 1).map(String::as_str))
            });
            match step {
                Some(PointerStep::Here(sub)) => {
                    current = sub;
                    i += 1;
                }
                Some(PointerStep::Keyed(sub)) => {
                    current = sub;
                    i += 2;
                }
                Some(PointerStep::None) | None => return None,
            }
        }
        Some(current)
    }
}

/// Outcome of navigating one pointer token into a keyword.
pub enum PointerStep {
    /// The keyword's value is itself a schema; consumed one token.
    Here(SchemaRef),
    /// The keyword maps a further key/index to a schema; consumed two tokens.
    Keyed(SchemaRef),
    /// Not navigable.
    None,
}

/// `items` has two historical shapes: a single schema for every element, or
/// (before 2020-12) a tuple of per-position schemas.
#[derive(Debug, Clone)]
pub enum Items {
    Single(SchemaRef),
    Tuple(Vec<SchemaRef>),
}

/// A draft 6/7 `dependencies` entry.
#[derive(Debug, Clone)]
pub enum Dependency {
    Required(Vec<String>),
    Schema(SchemaRef),
}

/// A regex compiled at parse time. An unparsable source is recorded and the
/// owning keyword always fails at evaluation time instead of erroring.
#[derive(Debug, Clone)]
pub enum CompiledPattern {
    Valid { source: String, regex: Regex },
    Invalid { source: String },
}

impl CompiledPattern {
    pub fn new(source: &str) -> CompiledPattern {
        match Regex::new(source) {
            Ok(regex) => CompiledPattern::Valid {
                source: source.to_string(),
                regex,
            },
            Err(_) => CompiledPattern::Invalid {
                source: source.to_string(),
            },
        }
    }

    pub fn source(&self) -> &str {
        match self {
            CompiledPattern::Valid { source, .. } => source,
            CompiledPattern::Invalid { source } => source,
        }
    }

    /// `None` when the pattern failed to compile.
    pub fn is_match(&self, haystack: &str) -> Option<bool> {
        match self {
            CompiledPattern::Valid { regex, .. } => Some(regex.is_match(haystack)),
            CompiledPattern::Invalid { .. } => None,
        }
    }

    pub fn compile_error(&self) -> Error {
        Error::InvalidPattern {
            pattern: self.source().to_string(),
        }
    }
}

/// A primitive instance type named by the `type` keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceType {
    Null,
    Boolean,
    Object,
    Array,
    Number,
    Integer,
    String,
}

impl InstanceType {
    pub fn from_name(name: &str) -> Option<InstanceType> {
        Some(match name {
            "null" => Self::Null,
            "boolean" => Self::Boolean,
            "object" => Self::Object,
            "array" => Self::Array,
            "number" => Self::Number,
            "integer" => Self::Integer,
            "string" => Self::String,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::String => "string",
        }
    }

    /// Whether `value` is of this type. `integer` admits floats with a zero
    /// fractional part.
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::Null => value.is_null(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => match value.as_f64() {
                Some(n) => n.fract() == 0.0,
                None => false,
            },
        }
    }
}

/// One named constraint instance. Applicator variants own nested schemas.
#[derive(Debug, Clone)]
pub enum Keyword {
    // ── Core ────────────────────────────────────────────────────────────
    Id(String),
    SchemaDecl(String),
    Ref(String),
    DynamicRef(String),
    RecursiveRef(String),
    Anchor(String),
    DynamicAnchor(String),
    RecursiveAnchor(bool),
    Vocabulary(IndexMap<String, bool>),
    Defs(IndexMap<String, SchemaRef>),
    Definitions(IndexMap<String, SchemaRef>),
    Comment(String),

    // ── Applicators ─────────────────────────────────────────────────────
    AllOf(Vec<SchemaRef>),
    AnyOf(Vec<SchemaRef>),
    OneOf(Vec<SchemaRef>),
    Not(SchemaRef),
    If(SchemaRef),
    Then(SchemaRef),
    Else(SchemaRef),
    DependentSchemas(IndexMap<String, SchemaRef>),
    Dependencies(IndexMap<String, Dependency>),
    Properties(IndexMap<String, SchemaRef>),
    PatternProperties(Vec<(CompiledPattern, SchemaRef)>),
    AdditionalProperties(SchemaRef),
    PropertyNames(SchemaRef),
    Items(Items),
    AdditionalItems(SchemaRef),
    PrefixItems(Vec<SchemaRef>),
    Contains(SchemaRef),
    UnevaluatedItems(SchemaRef),
    UnevaluatedProperties(SchemaRef),

    // ── Validation ──────────────────────────────────────────────────────
    Type {
        types: Vec<InstanceType>,
        array_form: bool,
    },
    Enum(Vec<Value>),
    Const(Value),
    MultipleOf(serde_json::Number),
    Maximum(serde_json::Number),
    ExclusiveMaximum(serde_json::Number),
    Minimum(serde_json::Number),
    ExclusiveMinimum(serde_json::Number),
    MaxLength(u64),
    MinLength(u64),
    Pattern(CompiledPattern),
    MaxItems(u64),
    MinItems(u64),
    UniqueItems(bool),
    MaxContains(u64),
    MinContains(u64),
    MaxProperties(u64),
    MinProperties(u64),
    Required(Vec<String>),
    DependentRequired(IndexMap<String, Vec<String>>),

    // ── Annotations ─────────────────────────────────────────────────────
    Title(String),
    Description(String),
    Default(Value),
    Deprecated(bool),
    ReadOnly(bool),
    WriteOnly(bool),
    Examples(Vec<Value>),
    Format(String),
    ContentEncoding(String),
    ContentMediaType(String),
    ContentSchema(SchemaRef),
}

impl Keyword {
    /// The keyword's name as it appears in a schema document.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Id(_) => "$id",
            Self::SchemaDecl(_) => "$schema",
            Self::Ref(_) => "$ref",
            Self::DynamicRef(_) => "$dynamicRef",
            Self::RecursiveRef(_) => "$recursiveRef",
            Self::Anchor(_) => "$anchor",
            Self::DynamicAnchor(_) => "$dynamicAnchor",
            Self::RecursiveAnchor(_) => "$recursiveAnchor",
            Self::Vocabulary(_) => "$vocabulary",
            Self::Defs(_) => "$defs",
            Self::Definitions(_) => "definitions",
            Self::Comment(_) => "$comment",
            Self::AllOf(_) => "allOf",
            Self::AnyOf(_) => "anyOf",
            Self::OneOf(_) => "oneOf",
            Self::Not(_) => "not",
            Self::If(_) => "if",
            Self::Then(_) => "then",
            Self::Else(_) => "else",
            Self::DependentSchemas(_) => "dependentSchemas",
            Self::Dependencies(_) => "dependencies",
            Self::Properties(_) => "properties",
            Self::PatternProperties(_) => "patternProperties",
            Self::AdditionalProperties(_) => "additionalProperties",
            Self::PropertyNames(_) => "propertyNames",
            Self::Items(_) => "items",
            Self::AdditionalItems(_) => "additionalItems",
            Self::PrefixItems(_) => "prefixItems",
            Self::Contains(_) => "contains",
            Self::UnevaluatedItems(_) => "unevaluatedItems",
            Self::UnevaluatedProperties(_) => "unevaluatedProperties",
            Self::Type { .. } => "type",
            Self::Enum(_) => "enum",
            Self::Const(_) => "const",
            Self::MultipleOf(_) => "multipleOf",
            Self::Maximum(_) => "maximum",
            Self::ExclusiveMaximum(_) => "exclusiveMaximum",
            Self::Minimum(_) => "minimum",
            Self::ExclusiveMinimum(_) => "exclusiveMinimum",
            Self::MaxLength(_) => "maxLength",
            Self::MinLength(_) => "minLength",
            Self::Pattern(_) => "pattern",
            Self::MaxItems(_) => "maxItems",
            Self::MinItems(_) => "minItems",
            Self::UniqueItems(_) => "uniqueItems",
            Self::MaxContains(_) => "maxContains",
            Self::MinContains(_) => "minContains",
            Self::MaxProperties(_) => "maxProperties",
            Self::MinProperties(_) => "minProperties",
            Self::Required(_) => "required",
            Self::DependentRequired(_) => "dependentRequired",
            Self::Title(_) => "title",
            Self::Description(_) => "description",
            Self::Default(_) => "default",
            Self::Deprecated(_) => "deprecated",
            Self::ReadOnly(_) => "readOnly",
            Self::WriteOnly(_) => "writeOnly",
            Self::Examples(_) => "examples",
            Self::Format(_) => "format",
            Self::ContentEncoding(_) => "contentEncoding",
            Self::ContentMediaType(_) => "contentMediaType",
            Self::ContentSchema(_) => "contentSchema",
        }
    }

    /// All schemas owned by this keyword, for tree walks (registry scan,
    /// annotation-retention analysis).
    pub fn owned_subschemas(&self) -> Vec<&SchemaRef> {
        match self {
            Self::Defs(map) | Self::Definitions(map) => map.values().collect(),
            Self::AllOf(list) | Self::AnyOf(list) | Self::OneOf(list) | Self::PrefixItems(list) => {
                list.iter().collect()
            }
            Self::Not(sub)
            | Self::If(sub)
            | Self::Then(sub)
            | Self::Else(sub)
            | Self::AdditionalProperties(sub)
            | Self::PropertyNames(sub)
            | Self::AdditionalItems(sub)
            | Self::Contains(sub)
            | Self::UnevaluatedItems(sub)
            | Self::UnevaluatedProperties(sub)
            | Self::ContentSchema(sub) => vec![sub],
            Self::DependentSchemas(map) | Self::Properties(map) => map.values().collect(),
            Self::Dependencies(map) => map
                .values()
                .filter_map(|dep| match dep {
                    Dependency::Schema(sub) => Some(sub),
                    Dependency::Required(_) => None,
                })
                .collect(),
            Self::PatternProperties(pairs) => pairs.iter().map(|(_, sub)| sub).collect(),
            Self::Items(Items::Single(sub)) => vec![sub],
            Self::Items(Items::Tuple(list)) => list.iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Navigate one pointer token into this keyword's value.
    ///
    /// `next` is the following token, consumed for keywords whose value maps
    /// keys or indices to schemas.
    pub fn step(&self, next: Option<&str>) -> PointerStep {
        match self {
            Self::Not(sub)
            | Self::If(sub)
            | Self::Then(sub)
            | Self::Else(sub)
            | Self::AdditionalProperties(sub)
            | Self::PropertyNames(sub)
            | Self::AdditionalItems(sub)
            | Self::Contains(sub)
            | Self::UnevaluatedItems(sub)
            | Self::UnevaluatedProperties(sub)
            | Self::ContentSchema(sub)
            | Self::Items(Items::Single(sub)) => PointerStep::Here(Arc::clone(sub)),
            Self::Defs(map)
            | Self::Definitions(map)
            | Self::DependentSchemas(map)
            | Self::Properties(map) => match next.and_then(|key| map.get(key)) {
                Some(sub) => PointerStep::Keyed(Arc::clone(sub)),
                None => PointerStep::None,
            },
            Self::Dependencies(map) => match next.and_then(|key| map.get(key)) {
                Some(Dependency::Schema(sub)) => PointerStep::Keyed(Arc::clone(sub)),
                _ => PointerStep::None,
            },
            Self::PatternProperties(pairs) => {
                let found = next.and_then(|key| {
                    pairs
                        .iter()
                        .find(|(pattern, _)| pattern.source() == key)
                        .map(|(_, sub)| sub)
                });
                match found {
                    Some(sub) => PointerStep::Keyed(Arc::clone(sub)),
                    None => PointerStep::None,
                }
            }
            Self::AllOf(list)
            | Self::AnyOf(list)
            | Self::OneOf(list)
            | Self::PrefixItems(list)
            | Self::Items(Items::Tuple(list)) => {
                let found = next
                    .and_then(|token| token.parse::<usize>().ok())
                    .and_then(|index| list.get(index));
                match found {
                    Some(sub) => PointerStep::Keyed(Arc::clone(sub)),
                    None => PointerStep::None,
                }
            }
            _ => PointerStep::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_duplicate_keyword_rejected() {
        let keywords = vec![Keyword::MinLength(1), Keyword::MinLength(2)];
        assert!(matches!(
            SchemaObject::check_unique(&keywords),
            Err(Error::DuplicateKeyword(name)) if name == "minLength"
        ));
    }

    #[test]
    fn test_instance_type_matches() {
        assert!(InstanceType::Integer.matches(&json!(5)));
        assert!(InstanceType::Integer.matches(&json!(5.0)));
        assert!(!InstanceType::Integer.matches(&json!(5.5)));
        assert!(InstanceType::Number.matches(&json!(5.5)));
        assert!(!InstanceType::String.matches(&json!(5)));
        assert!(InstanceType::Null.matches(&json!(null)));
    }

    #[test]
    fn test_compiled_pattern() {
        let ok = CompiledPattern::new("^a+$");
        assert_eq!(ok.is_match("aaa"), Some(true));
        assert_eq!(ok.is_match("b"), Some(false));

        let bad = CompiledPattern::new("(unclosed");
        assert_eq!(bad.is_match("anything"), None);
        assert!(matches!(bad.compile_error(), Error::InvalidPattern { .. }));
    }
}
