//! Rendering the schema model back to JSON.
//!
//! Keywords are emitted in declaration order followed by the preserved
//! unrecognized members, so a parse/serialize round trip loses nothing.

use serde_json::{Map, Value};

use super::{CompiledPattern, Dependency, Items, Keyword, Schema, SchemaRef};

/// Render a schema to its JSON document form.
pub fn to_value(schema: &Schema) -> Value {
    match schema {
        Schema::Bool(b) => Value::Bool(*b),
        Schema::Object(obj) => {
            let mut map = Map::new();
            for keyword in &obj.keywords {
                map.insert(keyword.name().to_string(), keyword_value(keyword));
            }
            for (name, value) in &obj.other {
                map.insert(name.clone(), value.clone());
            }
            Value::Object(map)
        }
    }
}

fn sub(schema: &SchemaRef) -> Value {
    to_value(schema)
}

fn sub_list(list: &[SchemaRef]) -> Value {
    Value::Array(list.iter().map(sub).collect())
}

fn sub_map<'a, I>(entries: I) -> Value
where
    I: Iterator<Item = (&'a String, &'a SchemaRef)>,
{
    Value::Object(entries.map(|(k, v)| (k.clone(), sub(v))).collect())
}

fn keyword_value(keyword: &Keyword) -> Value {
    match keyword {
        Keyword::Id(s)
        | Keyword::SchemaDecl(s)
        | Keyword::Ref(s)
        | Keyword::DynamicRef(s)
        | Keyword::RecursiveRef(s)
        | Keyword::Anchor(s)
        | Keyword::DynamicAnchor(s)
        | Keyword::Comment(s)
        | Keyword::Title(s)
        | Keyword::Description(s)
        | Keyword::Format(s)
        | Keyword::ContentEncoding(s)
        | Keyword::ContentMediaType(s) => Value::String(s.clone()),

        Keyword::RecursiveAnchor(b)
        | Keyword::UniqueItems(b)
        | Keyword::Deprecated(b)
        | Keyword::ReadOnly(b)
        | Keyword::WriteOnly(b) => Value::Bool(*b),

        Keyword::Vocabulary(declared) => Value::Object(
            declared
                .iter()
                .map(|(uri, required)| (uri.clone(), Value::Bool(*required)))
                .collect(),
        ),

        Keyword::Defs(map)
        | Keyword::Definitions(map)
        | Keyword::DependentSchemas(map)
        | Keyword::Properties(map) => sub_map(map.iter()),

        Keyword::AllOf(list)
        | Keyword::AnyOf(list)
        | Keyword::OneOf(list)
        | Keyword::PrefixItems(list) => sub_list(list),

        Keyword::Not(s)
        | Keyword::If(s)
        | Keyword::Then(s)
        | Keyword::Else(s)
        | Keyword::AdditionalProperties(s)
        | Keyword::PropertyNames(s)
        | Keyword::AdditionalItems(s)
        | Keyword::Contains(s)
        | Keyword::UnevaluatedItems(s)
        | Keyword::UnevaluatedProperties(s)
        | Keyword::ContentSchema(s) => sub(s),

        Keyword::Dependencies(map) => Value::Object(
            map.iter()
                .map(|(key, dependency)| {
                    let value = match dependency {
                        Dependency::Required(names) => Value::Array(
                            names.iter().map(|n| Value::String(n.clone())).collect(),
                        ),
                        Dependency::Schema(schema) => sub(schema),
                    };
                    (key.clone(), value)
                })
                .collect(),
        ),

        Keyword::PatternProperties(pairs) => Value::Object(
            pairs
                .iter()
                .map(|(pattern, schema)| (pattern.source().to_string(), sub(schema)))
                .collect(),
        ),

        Keyword::Items(Items::Single(s)) => sub(s),
        Keyword::Items(Items::Tuple(list)) => sub_list(list),

        Keyword::Type { types, array_form } => {
            if *array_form {
                Value::Array(
                    types
                        .iter()
                        .map(|t| Value::String(t.as_str().to_string()))
                        .collect(),
                )
            } else {
                Value::String(types[0].as_str().to_string())
            }
        }
        Keyword::Enum(values) | Keyword::Examples(values) => Value::Array(values.clone()),
        Keyword::Const(value) | Keyword::Default(value) => value.clone(),

        Keyword::MultipleOf(n)
        | Keyword::Maximum(n)
        | Keyword::ExclusiveMaximum(n)
        | Keyword::Minimum(n)
        | Keyword::ExclusiveMinimum(n) => Value::Number(n.clone()),

        Keyword::MaxLength(n)
        | Keyword::MinLength(n)
        | Keyword::MaxItems(n)
        | Keyword::MinItems(n)
        | Keyword::MaxContains(n)
        | Keyword::MinContains(n)
        | Keyword::MaxProperties(n)
        | Keyword::MinProperties(n) => Value::Number((*n).into()),

        Keyword::Pattern(pattern) => pattern_value(pattern),

        Keyword::Required(names) => {
            Value::Array(names.iter().map(|n| Value::String(n.clone())).collect())
        }
        Keyword::DependentRequired(map) => Value::Object(
            map.iter()
                .map(|(key, names)| {
                    (
                        key.clone(),
                        Value::Array(names.iter().map(|n| Value::String(n.clone())).collect()),
                    )
                })
                .collect(),
        ),
    }
}

fn pattern_value(pattern: &CompiledPattern) -> Value {
    Value::String(pattern.source().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::Draft;
    use crate::schema::parse::{parse, ParseOptions};
    use json_schema_uri::Uri;
    use serde_json::json;

    fn roundtrip(value: Value) -> Value {
        let schema = parse(
            &value,
            &ParseOptions {
                base_uri: Uri::parse("https://example.com/root.json"),
                draft: Draft::Draft202012,
            },
        )
        .unwrap();
        to_value(&schema)
    }

    #[test]
    fn test_roundtrip_booleans() {
        assert_eq!(roundtrip(json!(true)), json!(true));
        assert_eq!(roundtrip(json!(false)), json!(false));
    }

    #[test]
    fn test_roundtrip_keywords() {
        let document = json!({
            "$id": "https://example.com/thing.json",
            "type": ["object", "null"],
            "properties": {"name": {"type": "string", "minLength": 1}},
            "patternProperties": {"^x-": true},
            "required": ["name"],
            "enum": [{"a": 1}, null],
            "dependentRequired": {"a": ["b"]},
            "if": {"const": 1},
            "then": {"multipleOf": 0.5}
        });
        assert_eq!(roundtrip(document.clone()), document);
    }

    #[test]
    fn test_roundtrip_preserves_unknown_members() {
        let document = json!({
            "type": "object",
            "x-internal": {"anything": [1, 2, 3]}
        });
        assert_eq!(roundtrip(document.clone()), document);
    }

    #[test]
    fn test_single_type_stays_scalar() {
        assert_eq!(roundtrip(json!({"type": "string"})), json!({"type": "string"}));
    }
}
