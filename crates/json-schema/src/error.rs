use thiserror::Error;

/// Errors surfaced across the evaluation boundary.
///
/// A failed validation is *not* an error: it is a normal `valid: false`
/// result. Only malformed schemas and unresolvable structural references are
/// hard errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A `$ref`/`$dynamicRef`/`$recursiveRef` base or fragment could not be
    /// resolved, even after consulting the fetch hook.
    #[error("REF_UNRESOLVED: {reference}")]
    ReferenceResolution { reference: String },

    /// The same `(resolved reference, instance location)` pair was entered
    /// twice during one evaluation.
    #[error("REF_CYCLE: {reference} at instance location {instance_location:?}")]
    CyclicReference {
        reference: String,
        instance_location: String,
    },

    /// A meta-schema requires a vocabulary that is not registered.
    #[error("UNKNOWN_VOCABULARY: {0}")]
    UnknownVocabulary(String),

    /// A `pattern`/`patternProperties` regex failed to compile. Recorded at
    /// parse time; the owning keyword always fails at evaluation time and
    /// reports this as its error message.
    #[error("INVALID_PATTERN: {pattern}")]
    InvalidPattern { pattern: String },

    /// A custom `$schema` chain never bottomed out at a known draft.
    #[error("METASCHEMA_UNRESOLVED: {0}")]
    MetaSchemaResolution(String),

    /// Two keywords with the same name in one schema object.
    #[error("DUPLICATE_KEYWORD: {0}")]
    DuplicateKeyword(String),

    /// A structurally malformed schema (wrong keyword value shape, or a
    /// failed meta-schema validation).
    #[error("INVALID_SCHEMA: {0}")]
    InvalidSchema(String),

    /// Internal: a sibling branch fired the shared cancellation flag. Never
    /// escapes `evaluate`; cancelled branches are dropped before rendering.
    #[error("CANCELLED")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, Error>;
