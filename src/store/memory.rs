//! In-Memory Data Store
//!
//! Holds a validated [`Snapshot`] in sorted tables plus a derived
//! [`TextIndex`]. Instructions are sorted by (architecture, mnemonic,
//! variant) so every architecture owns one contiguous slice of the table.

use std::collections::{BTreeMap, HashMap};
use std::ops::Range;
use std::path::Path;
use std::sync::Arc;

use super::snapshot::Snapshot;
use super::text_index::{IndexedText, TextIndex};
use super::{DataStore, StoreResult};
use crate::model::{Architecture, Instruction};

/// Snapshot-backed store, immutable once built.
#[derive(Debug)]
pub struct MemoryStore {
    architectures: BTreeMap<String, Arc<Architecture>>,
    instructions: Vec<Arc<Instruction>>,
    /// Architecture name → slice of `instructions`
    by_arch: HashMap<String, Range<usize>>,
    /// (architecture, uppercase mnemonic) → slice of `instructions`
    by_mnemonic: HashMap<(String, String), Range<usize>>,
    index: TextIndex,
}

impl MemoryStore {
    /// Open, validate and index a snapshot file.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let store = Self::from_snapshot(Snapshot::load(path)?)?;
        tracing::info!(
            path = %path.display(),
            architectures = store.architectures.len(),
            instructions = store.instructions.len(),
            terms = store.index.term_count(),
            "Data store ready"
        );
        Ok(store)
    }

    /// Build from an in-memory snapshot.
    pub fn from_snapshot(snapshot: Snapshot) -> StoreResult<Self> {
        snapshot.validate()?;

        let architectures = snapshot
            .architectures
            .into_iter()
            .map(|a| (a.name.clone(), Arc::new(a)))
            .collect();

        let mut instructions = snapshot.instructions;
        instructions.sort_by(|a, b| {
            a.architecture
                .cmp(&b.architecture)
                .then_with(|| {
                    a.mnemonic
                        .to_ascii_uppercase()
                        .cmp(&b.mnemonic.to_ascii_uppercase())
                })
                .then_with(|| a.variant.cmp(&b.variant))
        });
        let instructions: Vec<Arc<Instruction>> =
            instructions.into_iter().map(Arc::new).collect();

        let mut by_arch: HashMap<String, Range<usize>> = HashMap::new();
        let mut by_mnemonic: HashMap<(String, String), Range<usize>> = HashMap::new();
        let mut index = TextIndex::new();

        for (doc, instr) in instructions.iter().enumerate() {
            by_arch
                .entry(instr.architecture.clone())
                .and_modify(|r| r.end = doc + 1)
                .or_insert(doc..doc + 1);
            by_mnemonic
                .entry((
                    instr.architecture.clone(),
                    instr.mnemonic.to_ascii_uppercase(),
                ))
                .and_modify(|r| r.end = doc + 1)
                .or_insert(doc..doc + 1);
            index.add(
                doc,
                IndexedText {
                    mnemonic: &instr.mnemonic,
                    category: &instr.category,
                    extension: &instr.extension,
                    description: &instr.description,
                },
            );
        }

        Ok(Self {
            architectures,
            instructions,
            by_arch,
            by_mnemonic,
            index,
        })
    }

    /// Total number of instruction records.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    fn slice(&self, range: Option<&Range<usize>>) -> Vec<Arc<Instruction>> {
        range
            .map(|r| self.instructions[r.clone()].to_vec())
            .unwrap_or_default()
    }
}

impl DataStore for MemoryStore {
    fn architecture_names(&self) -> StoreResult<Vec<String>> {
        Ok(self.architectures.keys().cloned().collect())
    }

    fn architecture(&self, name: &str) -> StoreResult<Option<Arc<Architecture>>> {
        Ok(self.architectures.get(name).cloned())
    }

    fn instructions(&self, arch: &str) -> StoreResult<Vec<Arc<Instruction>>> {
        Ok(self.slice(self.by_arch.get(arch)))
    }

    fn instruction_variants(
        &self,
        arch: &str,
        mnemonic: &str,
    ) -> StoreResult<Vec<Arc<Instruction>>> {
        let key = (arch.to_string(), mnemonic.to_ascii_uppercase());
        Ok(self.slice(self.by_mnemonic.get(&key)))
    }

    fn instruction_count(&self, arch: &str) -> StoreResult<usize> {
        Ok(self.by_arch.get(arch).map(|r| r.len()).unwrap_or(0))
    }

    fn text_search(
        &self,
        terms: &[String],
        arch: Option<&str>,
    ) -> StoreResult<Vec<Arc<Instruction>>> {
        let range = match arch {
            Some(name) => match self.by_arch.get(name) {
                Some(r) => r.clone(),
                None => return Ok(Vec::new()),
            },
            None => 0..self.instructions.len(),
        };
        Ok(self
            .index
            .matching_all(terms)
            .into_iter()
            .filter(|doc| range.contains(doc))
            .map(|doc| Arc::clone(&self.instructions[doc]))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Endianness;

    fn arch(name: &str) -> Architecture {
        Architecture {
            name: name.to_string(),
            description: String::new(),
            word_size: 64,
            endianness: Endianness::Little,
            machine_mode: String::new(),
            registers: vec![],
            addressing_modes: vec![],
        }
    }

    fn instr(arch: &str, mnemonic: &str, variant: Option<&str>, description: &str) -> Instruction {
        serde_json::from_value(serde_json::json!({
            "architecture": arch,
            "mnemonic": mnemonic,
            "variant": variant,
            "description": description,
        }))
        .unwrap()
    }

    fn store() -> MemoryStore {
        MemoryStore::from_snapshot(Snapshot {
            architectures: vec![arch("x86_64"), arch("aarch64"), arch("empty")],
            instructions: vec![
                instr("x86_64", "MOV", Some("r64_imm64"), "Move"),
                instr("aarch64", "ADD", None, "Add"),
                instr("x86_64", "ADD", None, "Add"),
                instr("x86_64", "MOV", Some("r64_r64"), "Move"),
            ],
        })
        .unwrap()
    }

    #[test]
    fn test_instructions_are_grouped_and_ordered() {
        let store = store();
        let mnemonics: Vec<_> = store
            .instructions("x86_64")
            .unwrap()
            .iter()
            .map(|i| (i.mnemonic.clone(), i.variant_tag().to_string()))
            .collect();
        assert_eq!(
            mnemonics,
            vec![
                ("ADD".to_string(), "base".to_string()),
                ("MOV".to_string(), "r64_imm64".to_string()),
                ("MOV".to_string(), "r64_r64".to_string()),
            ]
        );
        assert!(store.instructions("empty").unwrap().is_empty());
        assert_eq!(store.instruction_count("aarch64").unwrap(), 1);
    }

    #[test]
    fn test_variant_lookup_is_case_insensitive_on_mnemonic() {
        let store = store();
        assert_eq!(store.instruction_variants("x86_64", "mov").unwrap().len(), 2);
        assert!(store.instruction_variants("X86_64", "MOV").unwrap().is_empty());
    }

    #[test]
    fn test_every_instruction_is_discoverable_through_index() {
        let store = store();
        for instr in &store.instructions {
            let terms = vec![instr.mnemonic.to_ascii_lowercase()];
            let hits = store.text_search(&terms, Some(&instr.architecture)).unwrap();
            assert!(hits.iter().any(|h| Arc::ptr_eq(h, instr)));
        }
    }

    #[test]
    fn test_text_search_respects_architecture_filter() {
        let store = store();
        let terms = vec!["add".to_string()];
        assert_eq!(store.text_search(&terms, None).unwrap().len(), 2);
        assert_eq!(store.text_search(&terms, Some("aarch64")).unwrap().len(), 1);
        assert!(store.text_search(&terms, Some("nope")).unwrap().is_empty());
    }
}
