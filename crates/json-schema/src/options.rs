//! Per-evaluation configuration.

use json_schema_uri::Uri;

use crate::draft::Draft;
use crate::output::OutputFormat;

/// Configuration for one evaluation. Immutable once the evaluation starts;
/// registries carry their own synchronization for concurrent registration.
#[derive(Debug, Clone)]
pub struct EvalOptions {
    /// Draft assumed when a schema declares no `$schema`.
    pub evaluate_as: Draft,
    /// Shape of the rendered result.
    pub output_format: OutputFormat,
    /// Validate the schema document against its draft's meta-schema before
    /// evaluating the instance.
    pub validate_against_meta_schema: bool,
    /// Make `format` assert even when the active vocabulary set treats it as
    /// an annotation.
    pub require_format_assertion: bool,
    /// When asserting, fail on format names the engine does not know.
    pub only_known_formats: bool,
    /// Surface unrecognized schema members as verbatim annotations.
    pub process_custom_keywords: bool,
    /// Base URI assigned to documents that declare no `$id`.
    pub default_base_uri: Uri,
}

impl Default for EvalOptions {
    fn default() -> Self {
        EvalOptions {
            evaluate_as: Draft::Draft202012,
            output_format: OutputFormat::Verbose,
            validate_against_meta_schema: false,
            require_format_assertion: false,
            only_known_formats: false,
            process_custom_keywords: false,
            default_base_uri: Uri::parse("https://json-schema.local/schema"),
        }
    }
}
