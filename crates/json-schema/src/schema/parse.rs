//! Building the schema model from JSON documents.
//!
//! Base-URI and draft resolution happen while building: every object node
//! comes out carrying its resolved `base_uri`, its pointer from that base,
//! and its effective draft, so the registry scan and evaluation never
//! re-derive them.

use std::sync::Arc;

use json_schema_uri::Uri;
use serde_json::{Map, Value};

use crate::draft::Draft;
use crate::error::{Error, Result};
use crate::keyword::KeywordRegistry;
use crate::pointer::Pointer;

use super::{
    CompiledPattern, Dependency, InstanceType, Items, Keyword, Schema, SchemaObject, SchemaRef,
};

/// Inherited state for a parse.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Base URI the document is resolved against (overridden by `$id`).
    pub base_uri: Uri,
    /// Draft assumed when the document declares no `$schema`.
    pub draft: Draft,
}

/// Parse a schema document into the model.
pub fn parse(value: &Value, options: &ParseOptions) -> Result<SchemaRef> {
    let parser = Parser {
        keywords: KeywordRegistry::standard(),
    };
    Ok(Arc::new(parser.node(
        value,
        &options.base_uri,
        Pointer::root(),
        options.draft,
    )?))
}

struct Parser<'r> {
    keywords: &'r KeywordRegistry,
}

impl Parser<'_> {
    fn node(&self, value: &Value, base: &Uri, location: Pointer, draft: Draft) -> Result<Schema> {
        match value {
            Value::Bool(b) => Ok(Schema::Bool(*b)),
            Value::Object(map) => self.object(map, base, location, draft),
            other => Err(Error::InvalidSchema(format!(
                "a schema must be a boolean or an object, got {}",
                type_name(other)
            ))),
        }
    }

    fn subschema(
        &self,
        value: &Value,
        base: &Uri,
        location: Pointer,
        draft: Draft,
    ) -> Result<SchemaRef> {
        Ok(Arc::new(self.node(value, base, location, draft)?))
    }

    fn object(
        &self,
        map: &Map<String, Value>,
        inherited_base: &Uri,
        inherited_location: Pointer,
        inherited_draft: Draft,
    ) -> Result<Schema> {
        let mut draft = inherited_draft;
        let mut meta_schema = None;
        if let Some(value) = map.get("$schema") {
            let uri = expect_str("$schema", value)?;
            match Draft::from_meta_schema_uri(uri) {
                Some(known) => draft = known,
                None => meta_schema = Some(inherited_base.join(uri)),
            }
        }

        let mut base_uri = inherited_base.clone();
        let mut location = inherited_location;
        if let Some(value) = map.get("$id") {
            let id = expect_str("$id", value)?;
            // Draft 6/7 quirk: a sibling $ref makes $id inert, and a
            // fragment-only $id is an anchor rather than a new base.
            let inert = draft.legacy_ref_semantics() && map.contains_key("$ref");
            let id_uri = Uri::parse(id);
            let legacy_anchor = draft.legacy_ref_semantics() && id_uri.is_fragment_only();
            if !inert && !legacy_anchor {
                base_uri = inherited_base.resolve(&id_uri).without_fragment();
                location = Pointer::root();
            }
        }

        let mut keywords = Vec::new();
        let mut other = indexmap::IndexMap::new();
        for (name, value) in map {
            match self.keywords.get(name) {
                Some(info) if info.spec.drafts.contains(draft) => {
                    keywords.push(self.keyword(name, value, &base_uri, &location, draft)?);
                }
                _ => {
                    other.insert(name.clone(), value.clone());
                }
            }
        }

        SchemaObject::check_unique(&keywords)?;

        let needs_annotations = keywords.iter().any(|keyword| {
            matches!(
                keyword,
                Keyword::UnevaluatedItems(_)
                    | Keyword::UnevaluatedProperties(_)
                    | Keyword::Ref(_)
                    | Keyword::DynamicRef(_)
                    | Keyword::RecursiveRef(_)
            ) || keyword
                .owned_subschemas()
                .iter()
                .any(|sub| sub.needs_annotations())
        });

        Ok(Schema::Object(Box::new(SchemaObject {
            keywords,
            other,
            base_uri,
            location,
            draft,
            meta_schema,
            needs_annotations,
        })))
    }

    fn keyword(
        &self,
        name: &str,
        value: &Value,
        base: &Uri,
        location: &Pointer,
        draft: Draft,
    ) -> Result<Keyword> {
        let at = |token: &str| location.push(token);
        Ok(match name {
            // ── Core ──────────────────────────────────────────────────
            "$id" => Keyword::Id(expect_str(name, value)?.to_string()),
            "$schema" => Keyword::SchemaDecl(expect_str(name, value)?.to_string()),
            "$ref" => Keyword::Ref(expect_str(name, value)?.to_string()),
            "$dynamicRef" => Keyword::DynamicRef(expect_str(name, value)?.to_string()),
            "$recursiveRef" => Keyword::RecursiveRef(expect_str(name, value)?.to_string()),
            "$anchor" => Keyword::Anchor(expect_str(name, value)?.to_string()),
            "$dynamicAnchor" => Keyword::DynamicAnchor(expect_str(name, value)?.to_string()),
            "$recursiveAnchor" => Keyword::RecursiveAnchor(expect_bool(name, value)?),
            "$vocabulary" => {
                let map = expect_object(name, value)?;
                let mut declared = indexmap::IndexMap::new();
                for (uri, required) in map {
                    declared.insert(uri.clone(), expect_bool(name, required)?);
                }
                Keyword::Vocabulary(declared)
            }
            "$defs" => Keyword::Defs(self.schema_map(name, value, base, &at(name), draft)?),
            "definitions" => {
                Keyword::Definitions(self.schema_map(name, value, base, &at(name), draft)?)
            }
            "$comment" => Keyword::Comment(expect_str(name, value)?.to_string()),

            // ── Applicators ───────────────────────────────────────────
            "allOf" => Keyword::AllOf(self.schema_list(name, value, base, &at(name), draft)?),
            "anyOf" => Keyword::AnyOf(self.schema_list(name, value, base, &at(name), draft)?),
            "oneOf" => Keyword::OneOf(self.schema_list(name, value, base, &at(name), draft)?),
            "not" => Keyword::Not(self.subschema(value, base, at(name), draft)?),
            "if" => Keyword::If(self.subschema(value, base, at(name), draft)?),
            "then" => Keyword::Then(self.subschema(value, base, at(name), draft)?),
            "else" => Keyword::Else(self.subschema(value, base, at(name), draft)?),
            "dependentSchemas" => {
                Keyword::DependentSchemas(self.schema_map(name, value, base, &at(name), draft)?)
            }
            "dependencies" => {
                let map = expect_object(name, value)?;
                let mut dependencies = indexmap::IndexMap::new();
                for (key, entry) in map {
                    let dependency = match entry {
                        Value::Array(items) => {
                            let mut required = Vec::with_capacity(items.len());
                            for item in items {
                                required.push(expect_str(name, item)?.to_string());
                            }
                            Dependency::Required(required)
                        }
                        schema => Dependency::Schema(self.subschema(
                            schema,
                            base,
                            at(name).push(key.clone()),
                            draft,
                        )?),
                    };
                    dependencies.insert(key.clone(), dependency);
                }
                Keyword::Dependencies(dependencies)
            }
            "properties" => {
                Keyword::Properties(self.schema_map(name, value, base, &at(name), draft)?)
            }
            "patternProperties" => {
                let map = expect_object(name, value)?;
                let mut pairs = Vec::with_capacity(map.len());
                for (pattern, schema) in map {
                    pairs.push((
                        CompiledPattern::new(pattern),
                        self.subschema(schema, base, at(name).push(pattern.clone()), draft)?,
                    ));
                }
                Keyword::PatternProperties(pairs)
            }
            "additionalProperties" => {
                Keyword::AdditionalProperties(self.subschema(value, base, at(name), draft)?)
            }
            "propertyNames" => {
                Keyword::PropertyNames(self.subschema(value, base, at(name), draft)?)
            }
            "items" => match value {
                Value::Array(list) => {
                    let mut tuple = Vec::with_capacity(list.len());
                    for (index, item) in list.iter().enumerate() {
                        tuple.push(self.subschema(item, base, at(name).push_index(index), draft)?);
                    }
                    Keyword::Items(Items::Tuple(tuple))
                }
                single => Keyword::Items(Items::Single(self.subschema(
                    single,
                    base,
                    at(name),
                    draft,
                )?)),
            },
            "additionalItems" => {
                Keyword::AdditionalItems(self.subschema(value, base, at(name), draft)?)
            }
            "prefixItems" => {
                Keyword::PrefixItems(self.schema_list(name, value, base, &at(name), draft)?)
            }
            "contains" => Keyword::Contains(self.subschema(value, base, at(name), draft)?),
            "unevaluatedItems" => {
                Keyword::UnevaluatedItems(self.subschema(value, base, at(name), draft)?)
            }
            "unevaluatedProperties" => {
                Keyword::UnevaluatedProperties(self.subschema(value, base, at(name), draft)?)
            }

            // ── Validation ────────────────────────────────────────────
            "type" => match value {
                Value::String(single) => Keyword::Type {
                    types: vec![instance_type(single)?],
                    array_form: false,
                },
                Value::Array(names) => {
                    let mut types = Vec::with_capacity(names.len());
                    for entry in names {
                        types.push(instance_type(expect_str(name, entry)?)?);
                    }
                    Keyword::Type {
                        types,
                        array_form: true,
                    }
                }
                _ => {
                    return Err(Error::InvalidSchema(
                        "\"type\" must be a string or an array of strings".to_string(),
                    ))
                }
            },
            "enum" => Keyword::Enum(expect_array(name, value)?.to_vec()),
            "const" => Keyword::Const(value.clone()),
            "multipleOf" => Keyword::MultipleOf(expect_number(name, value)?),
            "maximum" => Keyword::Maximum(expect_number(name, value)?),
            "exclusiveMaximum" => Keyword::ExclusiveMaximum(expect_number(name, value)?),
            "minimum" => Keyword::Minimum(expect_number(name, value)?),
            "exclusiveMinimum" => Keyword::ExclusiveMinimum(expect_number(name, value)?),
            "maxLength" => Keyword::MaxLength(expect_limit(name, value)?),
            "minLength" => Keyword::MinLength(expect_limit(name, value)?),
            "pattern" => Keyword::Pattern(CompiledPattern::new(expect_str(name, value)?)),
            "maxItems" => Keyword::MaxItems(expect_limit(name, value)?),
            "minItems" => Keyword::MinItems(expect_limit(name, value)?),
            "uniqueItems" => Keyword::UniqueItems(expect_bool(name, value)?),
            "maxContains" => Keyword::MaxContains(expect_limit(name, value)?),
            "minContains" => Keyword::MinContains(expect_limit(name, value)?),
            "maxProperties" => Keyword::MaxProperties(expect_limit(name, value)?),
            "minProperties" => Keyword::MinProperties(expect_limit(name, value)?),
            "required" => {
                let list = expect_array(name, value)?;
                let mut required = Vec::with_capacity(list.len());
                for entry in list {
                    required.push(expect_str(name, entry)?.to_string());
                }
                Keyword::Required(required)
            }
            "dependentRequired" => {
                let map = expect_object(name, value)?;
                let mut dependent = indexmap::IndexMap::new();
                for (key, entry) in map {
                    let list = expect_array(name, entry)?;
                    let mut required = Vec::with_capacity(list.len());
                    for item in list {
                        required.push(expect_str(name, item)?.to_string());
                    }
                    dependent.insert(key.clone(), required);
                }
                Keyword::DependentRequired(dependent)
            }

            // ── Annotations ───────────────────────────────────────────
            "title" => Keyword::Title(expect_str(name, value)?.to_string()),
            "description" => Keyword::Description(expect_str(name, value)?.to_string()),
            "default" => Keyword::Default(value.clone()),
            "deprecated" => Keyword::Deprecated(expect_bool(name, value)?),
            "readOnly" => Keyword::ReadOnly(expect_bool(name, value)?),
            "writeOnly" => Keyword::WriteOnly(expect_bool(name, value)?),
            "examples" => Keyword::Examples(expect_array(name, value)?.to_vec()),
            "format" => Keyword::Format(expect_str(name, value)?.to_string()),
            "contentEncoding" => Keyword::ContentEncoding(expect_str(name, value)?.to_string()),
            "contentMediaType" => Keyword::ContentMediaType(expect_str(name, value)?.to_string()),
            "contentSchema" => Keyword::ContentSchema(self.subschema(value, base, at(name), draft)?),

            unknown => {
                return Err(Error::InvalidSchema(format!(
                    "keyword {unknown:?} is recognized but has no parser"
                )))
            }
        })
    }

    fn schema_list(
        &self,
        name: &str,
        value: &Value,
        base: &Uri,
        location: &Pointer,
        draft: Draft,
    ) -> Result<Vec<SchemaRef>> {
        let list = expect_array(name, value)?;
        let mut schemas = Vec::with_capacity(list.len());
        for (index, item) in list.iter().enumerate() {
            schemas.push(self.subschema(item, base, location.push_index(index), draft)?);
        }
        Ok(schemas)
    }

    fn schema_map(
        &self,
        name: &str,
        value: &Value,
        base: &Uri,
        location: &Pointer,
        draft: Draft,
    ) -> Result<indexmap::IndexMap<String, SchemaRef>> {
        let map = expect_object(name, value)?;
        let mut schemas = indexmap::IndexMap::with_capacity(map.len());
        for (key, entry) in map {
            schemas.insert(
                key.clone(),
                self.subschema(entry, base, location.push(key.clone()), draft)?,
            );
        }
        Ok(schemas)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn expect_str<'v>(keyword: &str, value: &'v Value) -> Result<&'v str> {
    value.as_str().ok_or_else(|| {
        Error::InvalidSchema(format!("{keyword:?} must be a string, got {}", type_name(value)))
    })
}

fn expect_bool(keyword: &str, value: &Value) -> Result<bool> {
    value.as_bool().ok_or_else(|| {
        Error::InvalidSchema(format!(
            "{keyword:?} must be a boolean, got {}",
            type_name(value)
        ))
    })
}

fn expect_number(keyword: &str, value: &Value) -> Result<serde_json::Number> {
    match value {
        Value::Number(n) => Ok(n.clone()),
        other => Err(Error::InvalidSchema(format!(
            "{keyword:?} must be a number, got {}",
            type_name(other)
        ))),
    }
}

fn expect_limit(keyword: &str, value: &Value) -> Result<u64> {
    value.as_u64().ok_or_else(|| {
        Error::InvalidSchema(format!("{keyword:?} must be a non-negative integer"))
    })
}

fn expect_array<'v>(keyword: &str, value: &'v Value) -> Result<&'v Vec<Value>> {
    match value {
        Value::Array(list) => Ok(list),
        other => Err(Error::InvalidSchema(format!(
            "{keyword:?} must be an array, got {}",
            type_name(other)
        ))),
    }
}

fn expect_object<'v>(keyword: &str, value: &'v Value) -> Result<&'v Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::InvalidSchema(format!(
            "{keyword:?} must be an object, got {}",
            type_name(other)
        ))),
    }
}

fn instance_type(name: &str) -> Result<InstanceType> {
    InstanceType::from_name(name)
        .ok_or_else(|| Error::InvalidSchema(format!("unknown instance type {name:?}")))
}
