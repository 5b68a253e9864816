//! The keyword contract and registry.
//!
//! Every keyword is described by a [`KeywordSpec`] row: its name, class, the
//! drafts that recognize it, the vocabulary it belongs to, and the keywords
//! whose annotations it consumes. The registry derives evaluation priorities
//! from those rows at build time with a topological pass over the annotation
//! dependencies, so producers always run before consumers. Ties keep
//! registration order.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::draft::DraftRange;
use crate::error::{Error, Result};
use crate::keywords;
use crate::vocabulary::Vocabulary;

/// Coarse ordering classes: identity keywords run first, then references,
/// then everything else in dependency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordClass {
    Identity,
    Reference,
    Assertion,
}

/// One registry row.
#[derive(Debug, Clone)]
pub struct KeywordSpec {
    pub name: &'static str,
    pub class: KeywordClass,
    pub drafts: DraftRange,
    pub vocabulary: Vocabulary,
    /// Names of keywords whose annotations this keyword reads. Feeds the
    /// priority derivation.
    pub depends_on: &'static [&'static str],
}

/// A registered keyword with its derived priority.
#[derive(Debug, Clone)]
pub struct KeywordInfo {
    pub spec: KeywordSpec,
    /// Lower runs earlier. Identity = 0, references = 1, assertions = 2 plus
    /// the length of their longest annotation-dependency chain.
    pub priority: u32,
    /// Registration order; breaks priority ties.
    pub order: u32,
}

/// Name-keyed keyword table.
pub struct KeywordRegistry {
    by_name: HashMap<&'static str, KeywordInfo>,
}

impl KeywordRegistry {
    /// The standard keyword set, built once.
    pub fn standard() -> &'static KeywordRegistry {
        static STANDARD: Lazy<KeywordRegistry> = Lazy::new(|| {
            KeywordRegistry::build(keywords::all_specs())
                .unwrap_or_else(|e| panic!("standard keyword table is inconsistent: {e}"))
        });
        &STANDARD
    }

    /// Build a registry, deriving priorities from `depends_on` chains.
    pub fn build(specs: Vec<KeywordSpec>) -> Result<KeywordRegistry> {
        let index: HashMap<&str, usize> = specs
            .iter()
            .enumerate()
            .map(|(i, spec)| (spec.name, i))
            .collect();
        if index.len() != specs.len() {
            return Err(Error::DuplicateKeyword(
                "duplicate keyword name in registry".to_string(),
            ));
        }

        let mut depth = vec![None::<u32>; specs.len()];
        let mut in_progress = vec![false; specs.len()];
        for i in 0..specs.len() {
            chain_depth(i, &specs, &index, &mut depth, &mut in_progress)?;
        }

        let mut by_name = HashMap::with_capacity(specs.len());
        for (order, spec) in specs.into_iter().enumerate() {
            let priority = match spec.class {
                KeywordClass::Identity => 0,
                KeywordClass::Reference => 1,
                KeywordClass::Assertion => 2 + depth[index[spec.name]].unwrap_or(0),
            };
            by_name.insert(
                spec.name,
                KeywordInfo {
                    spec,
                    priority,
                    order: order as u32,
                },
            );
        }
        Ok(KeywordRegistry { by_name })
    }

    pub fn get(&self, name: &str) -> Option<&KeywordInfo> {
        self.by_name.get(name)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// Longest dependency chain below keyword `i`, memoized.
fn chain_depth(
    i: usize,
    specs: &[KeywordSpec],
    index: &HashMap<&str, usize>,
    depth: &mut Vec<Option<u32>>,
    in_progress: &mut Vec<bool>,
) -> Result<u32> {
    if let Some(done) = depth[i] {
        return Ok(done);
    }
    if in_progress[i] {
        return Err(Error::InvalidSchema(format!(
            "keyword annotation dependency cycle at {:?}",
            specs[i].name
        )));
    }
    in_progress[i] = true;
    let mut max = 0;
    for dep in specs[i].depends_on {
        if let Some(&j) = index.get(dep) {
            // Reference-class dependencies already run earlier by class.
            if specs[j].class == KeywordClass::Assertion {
                max = max.max(1 + chain_depth(j, specs, index, depth, in_progress)?);
            }
        }
    }
    in_progress[i] = false;
    depth[i] = Some(max);
    Ok(max)
}
