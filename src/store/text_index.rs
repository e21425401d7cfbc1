//! Inverted Text Index over Instruction Fields
//!
//! Tokenizes mnemonic, category, extension and description of every
//! instruction into lowercase terms and keeps them in a sorted map so that a
//! query term can be matched against every indexed term it prefixes.
//!
//! ```text
//! "MOVZX"  → movzx ──┐
//! "MOV"    → mov   ──┼── range scan on "mov" hits all three
//! "moves"  → moves ──┘   (description postings rank lower later)
//! ```
//!
//! The index is derived from the instruction table when the store is built
//! and never updated afterwards, so the two views cannot drift apart.

use regex_lite::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

/// Position of an instruction in the store's instruction table.
pub type DocId = usize;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9_]+").expect("static token pattern"));

/// Split text into lowercase search terms.
pub fn tokenize(text: &str) -> Vec<String> {
    TOKEN_RE
        .find_iter(text)
        .map(|m| m.as_str().to_ascii_lowercase())
        .collect()
}

/// Indexed instruction field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Mnemonic,
    Category,
    Extension,
    Description,
}

/// Text fields of one instruction, as handed to the index.
#[derive(Debug, Clone, Copy)]
pub struct IndexedText<'a> {
    pub mnemonic: &'a str,
    pub category: &'a str,
    pub extension: &'a str,
    pub description: &'a str,
}

/// Sorted term → (document, field) postings.
#[derive(Debug, Default)]
pub struct TextIndex {
    terms: BTreeMap<String, BTreeSet<(DocId, Field)>>,
    documents: usize,
}

impl TextIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index one document. Documents must be added in `DocId` order.
    pub fn add(&mut self, doc: DocId, text: IndexedText<'_>) {
        let fields = [
            (Field::Mnemonic, text.mnemonic),
            (Field::Category, text.category),
            (Field::Extension, text.extension),
            (Field::Description, text.description),
        ];
        for (field, value) in fields {
            for term in tokenize(value) {
                self.terms.entry(term).or_default().insert((doc, field));
            }
        }
        self.documents = self.documents.max(doc + 1);
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.documents
    }

    pub fn is_empty(&self) -> bool {
        self.documents == 0
    }

    /// Number of distinct terms.
    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// Documents having a term that starts with `prefix`.
    pub fn prefix_docs(&self, prefix: &str) -> BTreeSet<DocId> {
        self.terms
            .range(prefix.to_string()..)
            .take_while(|(term, _)| term.starts_with(prefix))
            .flat_map(|(_, postings)| postings.iter().map(|(doc, _)| *doc))
            .collect()
    }

    /// Documents matching every query term by prefix, in `DocId` order.
    ///
    /// An empty term list matches nothing.
    pub fn matching_all(&self, terms: &[String]) -> Vec<DocId> {
        let mut iter = terms.iter();
        let Some(first) = iter.next() else {
            return Vec::new();
        };
        let mut acc = self.prefix_docs(first);
        for term in iter {
            if acc.is_empty() {
                break;
            }
            let docs = self.prefix_docs(term);
            acc.retain(|d| docs.contains(d));
        }
        acc.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text<'a>(mnemonic: &'a str, description: &'a str) -> IndexedText<'a> {
        IndexedText {
            mnemonic,
            category: "DATAXFER",
            extension: "BASE",
            description,
        }
    }

    #[test]
    fn test_tokenize_lowercases_and_splits() {
        assert_eq!(tokenize("FMADD.S rd, rs1"), vec!["fmadd", "s", "rd", "rs1"]);
        assert!(tokenize("  --  ").is_empty());
    }

    #[test]
    fn test_prefix_matches_longer_terms() {
        let mut index = TextIndex::new();
        index.add(0, text("MOV", "Move"));
        index.add(1, text("MOVZX", "Move with zero-extend"));
        index.add(2, text("ADD", "Add"));

        let docs = index.prefix_docs("mov");
        assert_eq!(docs.into_iter().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_matching_all_requires_every_term() {
        let mut index = TextIndex::new();
        index.add(0, text("MOVZX", "Move with zero-extend"));
        index.add(1, text("MOVSX", "Move with sign-extend"));

        assert_eq!(index.matching_all(&["mov".into(), "zero".into()]), vec![0]);
        assert_eq!(index.matching_all(&["mov".into(), "extend".into()]), vec![0, 1]);
        assert!(index.matching_all(&[]).is_empty());
        assert!(index.matching_all(&["zzz".into()]).is_empty());
    }
}
