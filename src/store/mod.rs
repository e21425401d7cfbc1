//! Read-only ISA Data Store
//!
//! The resolvers never touch storage directly; they go through the
//! [`DataStore`] trait, which offers the three query shapes the service
//! needs: lookup by key, filtered scan, and text search.
//!
//! ```text
//! snapshot.json ──load/validate──▶ Snapshot ──build──▶ MemoryStore
//!                                                         │
//!                         Arc<dyn DataStore> ◀────────────┘
//!                                │
//!              lookup / search / compare resolvers
//! ```
//!
//! Stores are populated once, before serving starts, and are shared between
//! worker threads without locking.

pub mod memory;
pub mod snapshot;
pub mod text_index;

use std::sync::Arc;
use thiserror::Error;

use crate::model::{Architecture, Instruction};

pub use memory::MemoryStore;
pub use snapshot::{validate_snapshot_path, Snapshot};
pub use text_index::{tokenize, TextIndex};

/// Data store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read snapshot: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse snapshot: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid snapshot path '{path}': {reason}")]
    Path { path: String, reason: String },

    #[error("Snapshot integrity error: {0}")]
    Integrity(String),

    #[error("Data store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Read-only access to architectures and instructions.
///
/// Architecture names are matched case-sensitively. Mnemonics are matched
/// case-insensitively. Every method is a pure read.
pub trait DataStore: Send + Sync {
    /// All architecture names, sorted.
    fn architecture_names(&self) -> StoreResult<Vec<String>>;

    /// Architecture record by canonical name.
    fn architecture(&self, name: &str) -> StoreResult<Option<Arc<Architecture>>>;

    /// All instructions of an architecture ordered by (mnemonic, variant).
    /// Unknown architectures yield an empty list; callers check existence.
    fn instructions(&self, arch: &str) -> StoreResult<Vec<Arc<Instruction>>>;

    /// Every variant of `mnemonic` in `arch`, ordered by variant.
    fn instruction_variants(&self, arch: &str, mnemonic: &str)
        -> StoreResult<Vec<Arc<Instruction>>>;

    /// Number of instruction records for an architecture.
    fn instruction_count(&self, arch: &str) -> StoreResult<usize>;

    /// Instructions whose indexed text matches every term by prefix,
    /// optionally restricted to one architecture. Unranked.
    fn text_search(&self, terms: &[String], arch: Option<&str>)
        -> StoreResult<Vec<Arc<Instruction>>>;

    /// Whether an architecture exists.
    fn has_architecture(&self, name: &str) -> StoreResult<bool> {
        Ok(self.architecture(name)?.is_some())
    }
}
