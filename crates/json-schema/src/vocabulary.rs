//! Vocabularies and the vocabulary registry.
//!
//! Drafts 2019-09 and later group keywords into named vocabularies which a
//! meta-schema declares via `$vocabulary`. The active vocabulary set filters
//! the keywords applied during dispatch. Drafts 6 and 7 predate vocabularies
//! and always run with the full set.

use std::collections::{HashMap, HashSet};

use dashmap::DashMap;
use indexmap::IndexMap;

use crate::draft::Draft;
use crate::error::{Error, Result};

/// The standard keyword vocabularies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vocabulary {
    Core,
    Applicator,
    Validation,
    MetaData,
    FormatAnnotation,
    FormatAssertion,
    Content,
    Unevaluated,
}

impl Vocabulary {
    /// The vocabulary URI for a given draft, if the draft defines it.
    pub fn uri(self, draft: Draft) -> Option<&'static str> {
        match draft {
            Draft::Draft6 | Draft::Draft7 => None,
            Draft::Draft201909 => match self {
                Self::Core => Some("https://json-schema.org/draft/2019-09/vocab/core"),
                Self::Applicator => Some("https://json-schema.org/draft/2019-09/vocab/applicator"),
                Self::Validation => Some("https://json-schema.org/draft/2019-09/vocab/validation"),
                Self::MetaData => Some("https://json-schema.org/draft/2019-09/vocab/meta-data"),
                // 2019-09 has a single "format" vocabulary; later drafts split it.
                Self::FormatAnnotation => Some("https://json-schema.org/draft/2019-09/vocab/format"),
                Self::FormatAssertion => None,
                Self::Content => Some("https://json-schema.org/draft/2019-09/vocab/content"),
                // 2019-09 folds unevaluated* into the applicator vocabulary.
                Self::Unevaluated => None,
            },
            Draft::Draft202012 => match self {
                Self::Core => Some("https://json-schema.org/draft/2020-12/vocab/core"),
                Self::Applicator => Some("https://json-schema.org/draft/2020-12/vocab/applicator"),
                Self::Validation => Some("https://json-schema.org/draft/2020-12/vocab/validation"),
                Self::MetaData => Some("https://json-schema.org/draft/2020-12/vocab/meta-data"),
                Self::FormatAnnotation => {
                    Some("https://json-schema.org/draft/2020-12/vocab/format-annotation")
                }
                Self::FormatAssertion => {
                    Some("https://json-schema.org/draft/2020-12/vocab/format-assertion")
                }
                Self::Content => Some("https://json-schema.org/draft/2020-12/vocab/content"),
                Self::Unevaluated => Some("https://json-schema.org/draft/2020-12/vocab/unevaluated"),
            },
            Draft::Next => match self {
                Self::Core => Some("https://json-schema.org/draft/next/vocab/core"),
                Self::Applicator => Some("https://json-schema.org/draft/next/vocab/applicator"),
                Self::Validation => Some("https://json-schema.org/draft/next/vocab/validation"),
                Self::MetaData => Some("https://json-schema.org/draft/next/vocab/meta-data"),
                Self::FormatAnnotation => {
                    Some("https://json-schema.org/draft/next/vocab/format-annotation")
                }
                Self::FormatAssertion => {
                    Some("https://json-schema.org/draft/next/vocab/format-assertion")
                }
                Self::Content => Some("https://json-schema.org/draft/next/vocab/content"),
                Self::Unevaluated => Some("https://json-schema.org/draft/next/vocab/unevaluated"),
            },
        }
    }

    fn all() -> [Vocabulary; 8] {
        [
            Self::Core,
            Self::Applicator,
            Self::Validation,
            Self::MetaData,
            Self::FormatAnnotation,
            Self::FormatAssertion,
            Self::Content,
            Self::Unevaluated,
        ]
    }
}

/// The set of vocabularies active for one schema resource.
#[derive(Debug, Clone)]
pub struct ActiveVocabularies {
    set: Option<HashSet<Vocabulary>>,
}

impl ActiveVocabularies {
    /// All standard vocabularies active (drafts 6/7, or no `$vocabulary`).
    pub fn everything() -> Self {
        ActiveVocabularies { set: None }
    }

    pub fn from_set(set: HashSet<Vocabulary>) -> Self {
        ActiveVocabularies { set: Some(set) }
    }

    pub fn allows(&self, vocabulary: Vocabulary, draft: Draft) -> bool {
        match &self.set {
            None => vocabulary != Vocabulary::FormatAssertion,
            Some(set) => {
                if set.contains(&vocabulary) {
                    return true;
                }
                // 2019-09 has no unevaluated vocabulary; those keywords ride
                // along with the applicator vocabulary.
                draft == Draft::Draft201909
                    && vocabulary == Vocabulary::Unevaluated
                    && set.contains(&Vocabulary::Applicator)
            }
        }
    }
}

/// Registry of known vocabulary URIs.
///
/// Standard URIs for all drafts are pre-registered. Custom vocabularies may
/// be registered by URI so that meta-schemas requiring them do not fail with
/// [`Error::UnknownVocabulary`]; the engine itself evaluates no custom
/// keywords for them. Concurrent registration is safe and monotonic.
pub struct VocabularyRegistry {
    standard: HashMap<String, Vocabulary>,
    custom: DashMap<String, ()>,
}

impl VocabularyRegistry {
    pub fn new() -> Self {
        let mut standard = HashMap::new();
        for draft in [Draft::Draft201909, Draft::Draft202012, Draft::Next] {
            for vocabulary in Vocabulary::all() {
                if let Some(uri) = vocabulary.uri(draft) {
                    standard.insert(uri.to_string(), vocabulary);
                }
            }
        }
        VocabularyRegistry {
            standard,
            custom: DashMap::new(),
        }
    }

    /// Register a custom vocabulary URI.
    pub fn register(&self, uri: &str) {
        self.custom.insert(uri.to_string(), ());
    }

    pub fn is_known(&self, uri: &str) -> bool {
        self.standard.contains_key(uri) || self.custom.contains_key(uri)
    }

    /// Resolve a `$vocabulary` declaration into the active set.
    ///
    /// A required vocabulary that is neither standard nor registered is an
    /// [`Error::UnknownVocabulary`]; an unknown optional vocabulary is
    /// skipped.
    pub fn resolve(&self, declared: &IndexMap<String, bool>) -> Result<ActiveVocabularies> {
        let mut set = HashSet::new();
        for (uri, required) in declared {
            match self.standard.get(uri) {
                Some(vocabulary) => {
                    set.insert(*vocabulary);
                }
                None => {
                    if *required && !self.custom.contains_key(uri) {
                        return Err(Error::UnknownVocabulary(uri.clone()));
                    }
                }
            }
        }
        Ok(ActiveVocabularies::from_set(set))
    }
}

impl Default for VocabularyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::indexmap;

    #[test]
    fn test_standard_uris_known() {
        let registry = VocabularyRegistry::new();
        assert!(registry.is_known("https://json-schema.org/draft/2020-12/vocab/core"));
        assert!(registry.is_known("https://json-schema.org/draft/2019-09/vocab/format"));
        assert!(!registry.is_known("https://example.com/vocab/custom"));
    }

    #[test]
    fn test_resolve_unknown_required() {
        let registry = VocabularyRegistry::new();
        let declared = indexmap! {
            "https://json-schema.org/draft/2020-12/vocab/core".to_string() => true,
            "https://example.com/vocab/custom".to_string() => true,
        };
        assert!(matches!(
            registry.resolve(&declared),
            Err(Error::UnknownVocabulary(_))
        ));
    }

    #[test]
    fn test_resolve_unknown_optional() {
        let registry = VocabularyRegistry::new();
        let declared = indexmap! {
            "https://json-schema.org/draft/2020-12/vocab/core".to_string() => true,
            "https://example.com/vocab/custom".to_string() => false,
        };
        let active = registry.resolve(&declared).unwrap();
        assert!(active.allows(Vocabulary::Core, Draft::Draft202012));
        assert!(!active.allows(Vocabulary::Validation, Draft::Draft202012));
    }

    #[test]
    fn test_registered_custom_required() {
        let registry = VocabularyRegistry::new();
        registry.register("https://example.com/vocab/custom");
        let declared = indexmap! {
            "https://example.com/vocab/custom".to_string() => true,
        };
        assert!(registry.resolve(&declared).is_ok());
    }

    #[test]
    fn test_everything_excludes_format_assertion() {
        let active = ActiveVocabularies::everything();
        assert!(active.allows(Vocabulary::Validation, Draft::Draft202012));
        assert!(!active.allows(Vocabulary::FormatAssertion, Draft::Draft202012));
    }

    #[test]
    fn test_2019_unevaluated_rides_with_applicator() {
        let active = ActiveVocabularies::from_set(
            [Vocabulary::Core, Vocabulary::Applicator].into_iter().collect(),
        );
        assert!(active.allows(Vocabulary::Unevaluated, Draft::Draft201909));
        assert!(!active.allows(Vocabulary::Unevaluated, Draft::Draft202012));
    }
}
