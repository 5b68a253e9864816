//! A multi-draft JSON Schema evaluation engine.
//!
//! Supports drafts 6, 7, 2019-09, 2020-12, and `next` in a single model:
//! schema documents are parsed once into a typed keyword tree with base URIs
//! and drafts resolved up front, registered in a concurrent registry, and
//! evaluated with priority-ordered, vocabulary-filtered keyword dispatch.
//! Results come out as a full annotation/error tree renderable in the
//! `flag`, `basic`, `detailed`, and `verbose` output formats.
//!
//! ```
//! use serde_json::json;
//! use json_schema::{evaluate, EvalOptions};
//!
//! let schema = json!({
//!     "type": "object",
//!     "properties": {"name": {"type": "string"}},
//!     "required": ["name"]
//! });
//! let evaluation = evaluate(&schema, &json!({"name": "x"}), EvalOptions::default()).unwrap();
//! assert!(evaluation.valid());
//!
//! let evaluation = evaluate(&schema, &json!({}), EvalOptions::default()).unwrap();
//! assert!(!evaluation.valid());
//! ```

pub mod compare;
pub mod context;
pub mod dispatch;
pub mod draft;
pub mod error;
pub mod keyword;
pub mod keywords;
pub mod metaschema;
pub mod options;
pub mod output;
pub mod pointer;
pub mod registry;
pub mod schema;
pub mod scope;
pub mod vocabulary;

use json_schema_uri::Uri;
use serde_json::Value;

use crate::context::{EvalContext, EvaluationNode, SharedState};
use crate::keyword::KeywordRegistry;
use crate::pointer::Pointer;
use crate::registry::FetchHook;
use crate::schema::parse::ParseOptions;
use crate::schema::SchemaRef;

pub use crate::draft::Draft;
pub use crate::error::{Error, Result};
pub use crate::options::EvalOptions;
pub use crate::output::OutputFormat;
pub use crate::registry::SchemaRegistry;
pub use crate::vocabulary::VocabularyRegistry;

/// The engine: schema and vocabulary registries plus evaluation options.
///
/// Registration is concurrent-safe; one `Evaluator` may serve many parallel
/// evaluations.
pub struct Evaluator {
    schemas: SchemaRegistry,
    vocabularies: VocabularyRegistry,
    options: EvalOptions,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::with_options(EvalOptions::default())
    }

    pub fn with_options(options: EvalOptions) -> Self {
        Evaluator {
            schemas: SchemaRegistry::new(),
            vocabularies: VocabularyRegistry::new(),
            options,
        }
    }

    /// Like [`Evaluator::with_options`], with a hook for fetching schema
    /// documents the registry does not hold when a reference needs them.
    pub fn with_fetch(options: EvalOptions, fetch: Box<FetchHook>) -> Self {
        Evaluator {
            schemas: SchemaRegistry::with_fetch(fetch),
            vocabularies: VocabularyRegistry::new(),
            options,
        }
    }

    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    pub fn vocabularies(&self) -> &VocabularyRegistry {
        &self.vocabularies
    }

    /// Parse and register a schema document. `uri` overrides the document's
    /// retrieval base; without it the configured default base applies (an
    /// embedded `$id` still wins).
    pub fn register(&self, uri: Option<&str>, document: &Value) -> Result<SchemaRef> {
        if self.options.validate_against_meta_schema {
            let draft = document
                .get("$schema")
                .and_then(Value::as_str)
                .and_then(Draft::from_meta_schema_uri)
                .unwrap_or(self.options.evaluate_as);
            metaschema::validate_schema(document, draft)?;
        }
        let base_uri = match uri {
            Some(uri) => Uri::parse(uri),
            None => self.options.default_base_uri.clone(),
        };
        let schema = schema::parse::parse(
            document,
            &ParseOptions {
                base_uri,
                draft: self.options.evaluate_as,
            },
        )?;
        self.schemas.scan(&schema);
        Ok(schema)
    }

    /// Evaluate an instance against a registered schema.
    pub fn evaluate(&self, schema: &SchemaRef, instance: &Value) -> Result<Evaluation> {
        let root_base = match schema.as_object() {
            Some(obj) => obj.base_uri.clone(),
            None => self.options.default_base_uri.clone(),
        };
        let shared = SharedState {
            options: &self.options,
            schemas: &self.schemas,
            keywords: KeywordRegistry::standard(),
            vocabularies: &self.vocabularies,
        };
        let mut ctx = EvalContext::new(&shared, root_base);
        let root = dispatch::eval_schema(
            &mut ctx,
            schema,
            instance,
            Pointer::root(),
            Pointer::root(),
        )?;
        Ok(Evaluation {
            root,
            format: self.options.output_format,
        })
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

/// The result of one evaluation: the full result tree plus the format it
/// renders in by default.
#[derive(Debug)]
pub struct Evaluation {
    pub root: EvaluationNode,
    format: OutputFormat,
}

impl Evaluation {
    pub fn valid(&self) -> bool {
        self.root.valid
    }

    /// Render in the evaluator's configured output format.
    pub fn to_value(&self) -> Value {
        output::render(&self.root, self.format)
    }

    /// Render in an explicit output format.
    pub fn to_format(&self, format: OutputFormat) -> Value {
        output::render(&self.root, format)
    }
}

/// One-shot convenience: register `schema` in a fresh evaluator and evaluate
/// `instance` against it.
pub fn evaluate(schema: &Value, instance: &Value, options: EvalOptions) -> Result<Evaluation> {
    let evaluator = Evaluator::with_options(options);
    let schema = evaluator.register(None, schema)?;
    evaluator.evaluate(&schema, instance)
}
