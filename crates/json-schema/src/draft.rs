//! Specification drafts and per-keyword draft ranges.

use std::fmt;

/// A JSON Schema specification draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Draft {
    Draft6,
    Draft7,
    Draft201909,
    Draft202012,
    Next,
}

impl Draft {
    /// The canonical `$schema` URI for this draft.
    pub fn meta_schema_uri(self) -> &'static str {
        match self {
            Self::Draft6 => "http://json-schema.org/draft-06/schema",
            Self::Draft7 => "http://json-schema.org/draft-07/schema",
            Self::Draft201909 => "https://json-schema.org/draft/2019-09/schema",
            Self::Draft202012 => "https://json-schema.org/draft/2020-12/schema",
            Self::Next => "https://json-schema.org/draft/next/schema",
        }
    }

    /// Maps a `$schema` value to a known draft.
    ///
    /// A trailing empty fragment and an `http`/`https` scheme mismatch are
    /// both tolerated, since published schemas are inconsistent about them.
    pub fn from_meta_schema_uri(uri: &str) -> Option<Draft> {
        let trimmed = uri.strip_suffix('#').unwrap_or(uri);
        let normalized = trimmed
            .strip_prefix("https://")
            .or_else(|| trimmed.strip_prefix("http://"))?;
        match normalized {
            "json-schema.org/draft-06/schema" => Some(Self::Draft6),
            "json-schema.org/draft-07/schema" => Some(Self::Draft7),
            "json-schema.org/draft/2019-09/schema" => Some(Self::Draft201909),
            "json-schema.org/draft/2020-12/schema" => Some(Self::Draft202012),
            "json-schema.org/draft/next/schema" => Some(Self::Next),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft6 => "draft-06",
            Self::Draft7 => "draft-07",
            Self::Draft201909 => "2019-09",
            Self::Draft202012 => "2020-12",
            Self::Next => "next",
        }
    }

    /// Drafts before 2019-09 ignore sibling keywords next to `$ref` and
    /// ignore `$id` when a sibling `$ref` is present.
    pub fn legacy_ref_semantics(self) -> bool {
        matches!(self, Self::Draft6 | Self::Draft7)
    }
}

impl fmt::Display for Draft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An inclusive range of drafts a keyword is recognized in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DraftRange {
    pub since: Draft,
    pub until: Draft,
}

impl DraftRange {
    pub const fn new(since: Draft, until: Draft) -> Self {
        DraftRange { since, until }
    }

    /// All supported drafts.
    pub const fn all() -> Self {
        DraftRange::new(Draft::Draft6, Draft::Next)
    }

    /// From `since` through the latest draft.
    pub const fn since(since: Draft) -> Self {
        DraftRange::new(since, Draft::Next)
    }

    pub fn contains(self, draft: Draft) -> bool {
        self.since <= draft && draft <= self.until
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_schema_uri_roundtrip() {
        for draft in [
            Draft::Draft6,
            Draft::Draft7,
            Draft::Draft201909,
            Draft::Draft202012,
            Draft::Next,
        ] {
            assert_eq!(
                Draft::from_meta_schema_uri(draft.meta_schema_uri()),
                Some(draft)
            );
        }
    }

    #[test]
    fn test_meta_schema_uri_variants() {
        assert_eq!(
            Draft::from_meta_schema_uri("http://json-schema.org/draft-07/schema#"),
            Some(Draft::Draft7)
        );
        assert_eq!(
            Draft::from_meta_schema_uri("https://json-schema.org/draft/2020-12/schema"),
            Some(Draft::Draft202012)
        );
        assert_eq!(Draft::from_meta_schema_uri("https://example.com/meta"), None);
    }

    #[test]
    fn test_draft_range() {
        let range = DraftRange::since(Draft::Draft201909);
        assert!(!range.contains(Draft::Draft7));
        assert!(range.contains(Draft::Draft201909));
        assert!(range.contains(Draft::Next));

        let legacy = DraftRange::new(Draft::Draft6, Draft::Draft7);
        assert!(legacy.contains(Draft::Draft6));
        assert!(!legacy.contains(Draft::Draft202012));
    }
}
