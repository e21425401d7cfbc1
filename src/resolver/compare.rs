//! Cross-architecture comparison of one mnemonic.

use std::collections::BTreeSet;
use std::sync::Arc;

use super::{ResolveError, ResolveResult};
use crate::model::Instruction;
use crate::store::DataStore;

/// Whether an architecture has the compared mnemonic.
#[derive(Debug, Clone)]
pub enum Presence {
    /// Every variant, ordered by variant tag
    Present(Vec<Arc<Instruction>>),
    Absent,
}

impl Presence {
    pub fn is_present(&self) -> bool {
        matches!(self, Presence::Present(_))
    }

    pub fn variants(&self) -> &[Arc<Instruction>] {
        match self {
            Presence::Present(v) => v,
            Presence::Absent => &[],
        }
    }
}

#[derive(Debug, Clone)]
pub struct ComparisonEntry {
    pub architecture: String,
    pub presence: Presence,
}

/// Side-by-side result; one entry per requested architecture, sorted by name.
#[derive(Debug, Clone)]
pub struct Comparison {
    pub mnemonic: String,
    pub entries: Vec<ComparisonEntry>,
}

impl Comparison {
    pub fn get(&self, architecture: &str) -> Option<&Presence> {
        self.entries
            .iter()
            .find(|e| e.architecture == architecture)
            .map(|e| &e.presence)
    }

    pub fn present_count(&self) -> usize {
        self.entries.iter().filter(|e| e.presence.is_present()).count()
    }

    pub fn is_all_absent(&self) -> bool {
        self.present_count() == 0
    }
}

/// Builds [`Comparison`]s.
#[derive(Clone)]
pub struct ComparisonResolver {
    store: Arc<dyn DataStore>,
}

impl ComparisonResolver {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    /// Compare `mnemonic` across `architectures` (all known when `None` or
    /// empty). Any unknown name fails the whole request.
    pub fn compare(
        &self,
        mnemonic: &str,
        architectures: Option<&[String]>,
    ) -> ResolveResult<Comparison> {
        let mnemonic = mnemonic.trim();
        if mnemonic.is_empty() {
            return Err(ResolveError::InvalidQuery(
                "mnemonic must not be empty".to_string(),
            ));
        }

        let targets: BTreeSet<String> = match architectures {
            Some(names) if !names.is_empty() => {
                names.iter().map(|n| n.trim().to_string()).collect()
            }
            _ => self.store.architecture_names()?.into_iter().collect(),
        };

        let mut unknown = Vec::new();
        for name in &targets {
            if !self.store.has_architecture(name)? {
                unknown.push(name.clone());
            }
        }
        if !unknown.is_empty() {
            return Err(ResolveError::UnknownArchitecture(unknown));
        }

        let mut entries = Vec::with_capacity(targets.len());
        for architecture in targets {
            let variants = self.store.instruction_variants(&architecture, mnemonic)?;
            let presence = if variants.is_empty() {
                Presence::Absent
            } else {
                Presence::Present(variants)
            };
            entries.push(ComparisonEntry {
                architecture,
                presence,
            });
        }

        let comparison = Comparison {
            mnemonic: mnemonic.to_ascii_uppercase(),
            entries,
        };
        tracing::debug!(
            mnemonic = %comparison.mnemonic,
            architectures = comparison.entries.len(),
            present = comparison.present_count(),
            "Comparison resolved"
        );
        Ok(comparison)
    }
}
