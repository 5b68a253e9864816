//! Evaluation state: the result tree, the per-branch context, keyword
//! outcomes, and the cancellation flag shared by composition branches.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use json_schema_uri::Uri;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::keyword::KeywordRegistry;
use crate::options::EvalOptions;
use crate::pointer::Pointer;
use crate::registry::SchemaRegistry;
use crate::scope::DynamicScope;
use crate::vocabulary::VocabularyRegistry;

/// A cancellation token shared by the branches of one composition keyword.
/// Once fired it stays fired; branches observe it at each subschema entry.
///
/// Flags form a chain: each nested fan-out derives a [`child`] of the flag
/// it runs under, so firing any ancestor is observed by every in-flight
/// branch below it, while firing a child stops only that fan-out.
///
/// [`child`]: CancelFlag::child
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<FlagInner>);

#[derive(Debug, Default)]
struct FlagInner {
    fired: AtomicBool,
    parent: Option<CancelFlag>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh flag scoped below this one.
    pub fn child(&self) -> CancelFlag {
        CancelFlag(Arc::new(FlagInner {
            fired: AtomicBool::new(false),
            parent: Some(self.clone()),
        }))
    }

    pub fn cancel(&self) {
        self.0.fired.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        if self.0.fired.load(Ordering::Acquire) {
            return true;
        }
        self.0.parent.as_ref().is_some_and(CancelFlag::is_cancelled)
    }
}

/// A keyword's annotation outcome. Distinguishes "this keyword does not
/// apply to this instance" from "applied but produced no annotation" from an
/// actual value.
#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    NotApplicable,
    Unset,
    Present(Value),
}

/// What one keyword evaluation produced.
#[derive(Debug)]
pub struct KeywordOutcome {
    pub keyword: &'static str,
    pub valid: bool,
    pub annotation: Annotation,
    pub error: Option<String>,
    /// Result nodes for subschemas this keyword applied.
    pub children: Vec<EvaluationNode>,
}

impl KeywordOutcome {
    pub fn pass(keyword: &'static str) -> Self {
        KeywordOutcome {
            keyword,
            valid: true,
            annotation: Annotation::Unset,
            error: None,
            children: Vec::new(),
        }
    }

    pub fn inapplicable(keyword: &'static str) -> Self {
        KeywordOutcome {
            annotation: Annotation::NotApplicable,
            ..Self::pass(keyword)
        }
    }

    pub fn annotate(keyword: &'static str, value: Value) -> Self {
        KeywordOutcome {
            annotation: Annotation::Present(value),
            ..Self::pass(keyword)
        }
    }

    pub fn fail(keyword: &'static str, message: impl Into<String>) -> Self {
        KeywordOutcome {
            keyword,
            valid: false,
            annotation: Annotation::Unset,
            error: Some(message.into()),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<EvaluationNode>) -> Self {
        self.children = children;
        self
    }
}

/// One node of the evaluation result tree.
///
/// Created on entry to a schema, mutated only while that frame is live, and
/// frozen once the frame pops. Children own their subtrees; there are no
/// back-references.
#[derive(Debug, Clone)]
pub struct EvaluationNode {
    pub valid: bool,
    pub evaluation_path: Pointer,
    pub instance_location: Pointer,
    pub schema_location: String,
    pub annotations: IndexMap<String, Value>,
    pub errors: IndexMap<String, String>,
    pub children: Vec<EvaluationNode>,
}

impl EvaluationNode {
    pub fn new(
        evaluation_path: Pointer,
        instance_location: Pointer,
        schema_location: String,
    ) -> Self {
        EvaluationNode {
            valid: true,
            evaluation_path,
            instance_location,
            schema_location,
            annotations: IndexMap::new(),
            errors: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Fold a keyword outcome into this node.
    pub fn apply(&mut self, outcome: KeywordOutcome) {
        self.children.extend(outcome.children);
        if outcome.valid {
            if let Annotation::Present(value) = outcome.annotation {
                self.annotations.insert(outcome.keyword.to_string(), value);
            }
        } else {
            self.valid = false;
            let message = outcome
                .error
                .unwrap_or_else(|| "subschema is not valid".to_string());
            self.errors.insert(outcome.keyword.to_string(), message);
        }
    }

    /// The most recent child produced by the named keyword, if any. Used by
    /// `then`/`else` to find the `if` outcome.
    pub fn child_of_keyword(&self, keyword: &str) -> Option<&EvaluationNode> {
        self.children
            .iter()
            .rev()
            .find(|child| child.evaluation_path.last() == Some(keyword))
    }

    /// Collect annotation values produced by the named keywords at the given
    /// instance location, across this node and its descendants.
    ///
    /// Only valid nodes contribute, and the walk does not descend through
    /// invalid nodes or into subtrees for other instance locations: an
    /// annotation under a failed branch is dropped, exactly as the
    /// `unevaluated*` keywords require.
    pub fn collect_annotations<'n>(
        &'n self,
        instance_location: &Pointer,
        keywords: &[&str],
        out: &mut Vec<&'n Value>,
    ) {
        if self.instance_location != *instance_location {
            return;
        }
        for (name, value) in &self.annotations {
            if keywords.contains(&name.as_str()) {
                out.push(value);
            }
        }
        for child in &self.children {
            if child.valid {
                child.collect_annotations(instance_location, keywords, out);
            }
        }
    }

    /// Number of nodes in this subtree (diagnostics and tests).
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(EvaluationNode::size).sum::<usize>()
    }
}

/// State shared read-only by every branch of one evaluation.
pub struct SharedState<'a> {
    pub options: &'a EvalOptions,
    pub schemas: &'a SchemaRegistry,
    pub keywords: &'a KeywordRegistry,
    pub vocabularies: &'a VocabularyRegistry,
}

/// The per-branch evaluation context. Cheap to clone at a composition fork:
/// the dynamic scope and navigation set are small vectors, everything heavy
/// is behind `shared`.
pub struct EvalContext<'a> {
    pub shared: &'a SharedState<'a>,
    pub scope: DynamicScope,
    /// `(resolved absolute reference, instance location)` pairs currently on
    /// the evaluation path. A repeat is a cyclic reference.
    nav: Vec<(String, String)>,
    pub cancel: CancelFlag,
}

impl<'a> EvalContext<'a> {
    pub fn new(shared: &'a SharedState<'a>, root_base: Uri) -> Self {
        EvalContext {
            shared,
            scope: DynamicScope::new(root_base),
            nav: Vec::new(),
            cancel: CancelFlag::new(),
        }
    }

    /// Clone the read state for an independent concurrent branch. The branch
    /// shares the given cancellation flag with its siblings; the flag must
    /// be a [`CancelFlag::child`] of this context's so ancestor fires still
    /// reach the branch.
    pub fn parallel_branch(&self, cancel: CancelFlag) -> EvalContext<'a> {
        EvalContext {
            shared: self.shared,
            scope: self.scope.clone(),
            nav: self.nav.clone(),
            cancel,
        }
    }

    /// Observe cancellation. Called at every subschema entry.
    pub fn checkpoint(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Enter a reference target; errors if the same `(reference, instance
    /// location)` pair is already on the path.
    pub fn nav_enter(&mut self, reference: &str, instance_location: &Pointer) -> Result<()> {
        let key = (reference.to_string(), instance_location.to_string());
        if self.nav.contains(&key) {
            return Err(Error::CyclicReference {
                reference: key.0,
                instance_location: key.1,
            });
        }
        self.nav.push(key);
        Ok(())
    }

    pub fn nav_exit(&mut self) {
        self.nav.pop();
    }
}
