//! The schema registry: base-URI-keyed index of schema resources and their
//! anchors, populated by a one-time scan of each registered tree.
//!
//! The registry is shared by concurrently evaluating branches: lookups are
//! concurrent reads, registration is idempotent and monotonic (entries are
//! merged, never replaced or removed).

use std::collections::HashMap;

use dashmap::DashMap;
use json_schema_uri::Uri;
use serde_json::Value;

use crate::draft::Draft;
use crate::error::{Error, Result};
use crate::schema::parse::{parse, ParseOptions};
use crate::schema::{Keyword, SchemaRef};

/// Hook invoked when a lookup misses the registry; returns the document for
/// the requested URI, which is then registered as a side effect.
pub type FetchHook = dyn Fn(&str) -> Option<Value> + Send + Sync;

/// Per-base-URI record. Append-only: anchors are merged in, never removed.
pub struct RegistryEntry {
    pub root: SchemaRef,
    pub anchors: HashMap<String, SchemaRef>,
    pub legacy_anchors: HashMap<String, SchemaRef>,
    pub dynamic_anchors: HashMap<String, SchemaRef>,
    pub recursive_anchor: Option<SchemaRef>,
}

impl RegistryEntry {
    fn new(root: SchemaRef) -> Self {
        RegistryEntry {
            root,
            anchors: HashMap::new(),
            legacy_anchors: HashMap::new(),
            dynamic_anchors: HashMap::new(),
            recursive_anchor: None,
        }
    }
}

pub struct SchemaRegistry {
    entries: DashMap<String, RegistryEntry>,
    fetch: Option<Box<FetchHook>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        SchemaRegistry {
            entries: DashMap::new(),
            fetch: None,
        }
    }

    pub fn with_fetch(fetch: Box<FetchHook>) -> Self {
        SchemaRegistry {
            entries: DashMap::new(),
            fetch: Some(fetch),
        }
    }

    /// Index a schema tree: depth-first walk recording every resource root
    /// under its resolved base URI and every anchor under its kind.
    ///
    /// Idempotent: rescanning merges into existing entries; first writer
    /// wins for each key.
    pub fn scan(&self, root: &SchemaRef) {
        let mut queue: Vec<SchemaRef> = vec![SchemaRef::clone(root)];
        while let Some(node) = queue.pop() {
            if let Some(obj) = node.as_object() {
                let key = obj.base_uri.without_fragment().to_string();
                if obj.location.is_root() {
                    self.entries
                        .entry(key.clone())
                        .or_insert_with(|| RegistryEntry::new(SchemaRef::clone(&node)));
                }
                let mut entry = self
                    .entries
                    .entry(key)
                    .or_insert_with(|| RegistryEntry::new(SchemaRef::clone(&node)));
                for keyword in &obj.keywords {
                    match keyword {
                        Keyword::Anchor(name) => {
                            entry
                                .anchors
                                .entry(name.clone())
                                .or_insert_with(|| SchemaRef::clone(&node));
                        }
                        Keyword::DynamicAnchor(name) => {
                            // A dynamic anchor is also addressable statically.
                            entry
                                .dynamic_anchors
                                .entry(name.clone())
                                .or_insert_with(|| SchemaRef::clone(&node));
                            entry
                                .anchors
                                .entry(name.clone())
                                .or_insert_with(|| SchemaRef::clone(&node));
                        }
                        Keyword::RecursiveAnchor(true) => {
                            if entry.recursive_anchor.is_none() {
                                entry.recursive_anchor = Some(SchemaRef::clone(&node));
                            }
                        }
                        Keyword::Id(id)
                            if obj.draft.legacy_ref_semantics() && !obj.has("$ref") =>
                        {
                            // Pre-2019-09 anchors are fragment-only $id values.
                            let id_uri = Uri::parse(id);
                            if id_uri.is_fragment_only() {
                                if let Some(fragment) = &id_uri.fragment {
                                    if json_schema_uri::is_anchor_name(fragment) {
                                        entry
                                            .legacy_anchors
                                            .entry(fragment.clone())
                                            .or_insert_with(|| SchemaRef::clone(&node));
                                    }
                                }
                            }
                        }
                        _ => {}
                    }
                }
                drop(entry);
                for keyword in &obj.keywords {
                    for sub in keyword.owned_subschemas() {
                        queue.push(SchemaRef::clone(sub));
                    }
                }
            }
        }
    }

    /// The resource root registered for a base URI (fragment ignored).
    pub fn root(&self, base: &Uri) -> Option<SchemaRef> {
        let key = base.without_fragment().to_string();
        self.entries.get(&key).map(|entry| entry.root.clone())
    }

    /// The resource root, consulting the fetch hook on a miss.
    pub fn root_or_fetch(&self, base: &Uri, draft: Draft) -> Result<SchemaRef> {
        let key = base.without_fragment().to_string();
        if let Some(entry) = self.entries.get(&key) {
            return Ok(entry.root.clone());
        }
        if let Some(fetch) = &self.fetch {
            if let Some(document) = fetch(&key) {
                let schema = parse(
                    &document,
                    &ParseOptions {
                        base_uri: base.without_fragment(),
                        draft,
                    },
                )?;
                self.scan(&schema);
                // The fetched document may have declared its own $id; make
                // sure the requested URI resolves regardless.
                self.entries
                    .entry(key.clone())
                    .or_insert_with(|| RegistryEntry::new(SchemaRef::clone(&schema)));
                return Ok(schema);
            }
        }
        Err(Error::ReferenceResolution { reference: key })
    }

    /// A plain anchor, falling back to legacy (`#name` via `$id`) anchors.
    pub fn anchor(&self, base: &Uri, name: &str) -> Option<SchemaRef> {
        let key = base.without_fragment().to_string();
        let entry = self.entries.get(&key)?;
        entry
            .anchors
            .get(name)
            .or_else(|| entry.legacy_anchors.get(name))
            .cloned()
    }

    /// A dynamic anchor declared by the given base URI.
    pub fn dynamic_anchor(&self, base: &Uri, name: &str) -> Option<SchemaRef> {
        let key = base.without_fragment().to_string();
        self.entries
            .get(&key)
            .and_then(|entry| entry.dynamic_anchors.get(name).cloned())
    }

    /// The `$recursiveAnchor: true` target for a base URI, if any.
    pub fn recursive_target(&self, base: &Uri) -> Option<SchemaRef> {
        let key = base.without_fragment().to_string();
        self.entries
            .get(&key)
            .and_then(|entry| entry.recursive_anchor.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse_at(value: &Value, base: &str, draft: Draft) -> SchemaRef {
        parse(
            value,
            &ParseOptions {
                base_uri: Uri::parse(base),
                draft,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_scan_indexes_roots_and_anchors() {
        let registry = SchemaRegistry::new();
        let schema = parse_at(
            &json!({
                "$id": "https://example.com/root.json",
                "$defs": {
                    "a": {"$anchor": "here", "type": "string"},
                    "b": {"$id": "nested.json", "$dynamicAnchor": "dyn"}
                }
            }),
            "https://example.com/root.json",
            Draft::Draft202012,
        );
        registry.scan(&schema);

        let base = Uri::parse("https://example.com/root.json");
        assert!(registry.root(&base).is_some());
        assert!(registry.anchor(&base, "here").is_some());
        assert!(registry.anchor(&base, "missing").is_none());

        let nested = Uri::parse("https://example.com/nested.json");
        assert!(registry.root(&nested).is_some());
        assert!(registry.dynamic_anchor(&nested, "dyn").is_some());
        // Dynamic anchors are statically addressable too.
        assert!(registry.anchor(&nested, "dyn").is_some());
    }

    #[test]
    fn test_scan_legacy_anchor() {
        let registry = SchemaRegistry::new();
        let schema = parse_at(
            &json!({
                "$id": "https://example.com/legacy.json",
                "definitions": {"a": {"$id": "#frag", "type": "integer"}}
            }),
            "https://example.com/legacy.json",
            Draft::Draft7,
        );
        registry.scan(&schema);
        let base = Uri::parse("https://example.com/legacy.json");
        assert!(registry.anchor(&base, "frag").is_some());
    }

    #[test]
    fn test_scan_recursive_anchor() {
        let registry = SchemaRegistry::new();
        let schema = parse_at(
            &json!({
                "$id": "https://example.com/rec.json",
                "$recursiveAnchor": true
            }),
            "https://example.com/rec.json",
            Draft::Draft201909,
        );
        registry.scan(&schema);
        assert!(registry
            .recursive_target(&Uri::parse("https://example.com/rec.json"))
            .is_some());
    }

    #[test]
    fn test_rescan_is_idempotent() {
        let registry = SchemaRegistry::new();
        let schema = parse_at(
            &json!({"$id": "https://example.com/a.json", "$anchor": "x"}),
            "https://example.com/a.json",
            Draft::Draft202012,
        );
        registry.scan(&schema);
        let first = registry
            .root(&Uri::parse("https://example.com/a.json"))
            .unwrap();
        registry.scan(&schema);
        let second = registry
            .root(&Uri::parse("https://example.com/a.json"))
            .unwrap();
        assert!(SchemaRef::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_fetch_hook() {
        let registry = SchemaRegistry::with_fetch(Box::new(|uri| {
            (uri == "https://example.com/remote.json").then(|| json!({"type": "integer"}))
        }));
        let fetched = registry
            .root_or_fetch(&Uri::parse("https://example.com/remote.json"), Draft::Draft202012)
            .unwrap();
        assert!(fetched.as_object().is_some());
        // Now cached: a second lookup needs no fetch.
        assert!(registry
            .root(&Uri::parse("https://example.com/remote.json"))
            .is_some());

        assert!(matches!(
            registry.root_or_fetch(&Uri::parse("https://example.com/absent.json"), Draft::Draft202012),
            Err(Error::ReferenceResolution { .. })
        ));
    }
}
