//! Snapshot Files
//!
//! A snapshot is the complete store image written by the import process:
//!
//! ```json
//! {
//!   "architectures": [{ "name": "x86_64", "word_size": 64, ... }],
//!   "instructions":  [{ "architecture": "x86_64", "mnemonic": "MOV", ... }]
//! }
//! ```
//!
//! Opening a snapshot validates the path and the referential integrity of
//! its records before anything is served from it.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use super::{StoreError, StoreResult};
use crate::model::{Architecture, Instruction};

/// Complete store image.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub architectures: Vec<Architecture>,
    #[serde(default)]
    pub instructions: Vec<Instruction>,
}

impl Snapshot {
    /// Load and validate a snapshot file.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let path = validate_snapshot_path(path)?;
        let content = fs::read_to_string(&path)?;
        let snapshot = Self::from_json(&content)?;
        tracing::debug!(
            path = %path.display(),
            architectures = snapshot.architectures.len(),
            instructions = snapshot.instructions.len(),
            "Snapshot loaded"
        );
        Ok(snapshot)
    }

    /// Parse and validate snapshot JSON.
    pub fn from_json(json: &str) -> StoreResult<Self> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Write the snapshot as pretty JSON.
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Check referential integrity and identity uniqueness.
    pub fn validate(&self) -> StoreResult<()> {
        let mut names = HashSet::new();
        for arch in &self.architectures {
            if arch.name.trim().is_empty() {
                return Err(StoreError::Integrity(
                    "architecture with empty name".to_string(),
                ));
            }
            if !names.insert(arch.name.as_str()) {
                return Err(StoreError::Integrity(format!(
                    "duplicate architecture '{}'",
                    arch.name
                )));
            }
        }

        let mut identities = HashSet::new();
        for instr in &self.instructions {
            if !names.contains(instr.architecture.as_str()) {
                return Err(StoreError::Integrity(format!(
                    "instruction '{}' references unknown architecture '{}'",
                    instr.mnemonic, instr.architecture
                )));
            }
            if instr.mnemonic.trim().is_empty() {
                return Err(StoreError::Integrity(format!(
                    "instruction with empty mnemonic in '{}'",
                    instr.architecture
                )));
            }
            // Unnamed variants share the `base` tag, so key on the tag.
            let (arch, mnemonic, _) = instr.identity();
            let key = (arch, mnemonic.to_ascii_uppercase(), instr.variant_tag());
            if !identities.insert(key) {
                return Err(StoreError::Integrity(format!(
                    "duplicate instruction {}/{} variant '{}'",
                    instr.architecture,
                    instr.mnemonic,
                    instr.variant_tag()
                )));
            }
        }
        Ok(())
    }
}

/// Check that a snapshot path names an existing, readable regular file.
pub fn validate_snapshot_path(path: &Path) -> StoreResult<PathBuf> {
    let path_error = |reason: &str| StoreError::Path {
        path: path.display().to_string(),
        reason: reason.to_string(),
    };

    if path.as_os_str().is_empty() {
        return Err(path_error("path is empty"));
    }
    let metadata = fs::metadata(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => path_error("file does not exist"),
        std::io::ErrorKind::PermissionDenied => path_error("permission denied"),
        _ => StoreError::Io(e),
    })?;
    if !metadata.is_file() {
        return Err(path_error("not a regular file"));
    }
    fs::File::open(path).map_err(|_| path_error("file is not readable"))?;
    Ok(path.canonicalize()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "architectures": [
            {"name": "x86_64", "word_size": 64, "endianness": "little"}
        ],
        "instructions": [
            {"architecture": "x86_64", "mnemonic": "MOV", "variant": "r64_r64"},
            {"architecture": "x86_64", "mnemonic": "MOV", "variant": "r64_imm64"}
        ]
    }"#;

    #[test]
    fn test_parse_minimal_snapshot() {
        let snapshot = Snapshot::from_json(MINIMAL).unwrap();
        assert_eq!(snapshot.architectures.len(), 1);
        assert_eq!(snapshot.instructions.len(), 2);
    }

    #[test]
    fn test_unknown_architecture_reference_rejected() {
        let json = r#"{
            "architectures": [],
            "instructions": [{"architecture": "mips", "mnemonic": "ADDU"}]
        }"#;
        let err = Snapshot::from_json(json).unwrap_err();
        assert!(matches!(err, StoreError::Integrity(_)));
        assert!(err.to_string().contains("mips"));
    }

    #[test]
    fn test_duplicate_identity_rejected() {
        let json = r#"{
            "architectures": [{"name": "a", "word_size": 32, "endianness": "big"}],
            "instructions": [
                {"architecture": "a", "mnemonic": "NOP"},
                {"architecture": "a", "mnemonic": "nop"}
            ]
        }"#;
        assert!(matches!(
            Snapshot::from_json(json),
            Err(StoreError::Integrity(_))
        ));
    }

    #[test]
    fn test_explicit_base_variant_collides_with_unnamed() {
        let json = r#"{
            "architectures": [{"name": "a", "word_size": 32, "endianness": "big"}],
            "instructions": [
                {"architecture": "a", "mnemonic": "MOV"},
                {"architecture": "a", "mnemonic": "MOV", "variant": "base"}
            ]
        }"#;
        match Snapshot::from_json(json) {
            Err(StoreError::Integrity(msg)) => assert!(msg.contains("MOV")),
            other => panic!("expected integrity error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_path_validation() {
        let dir = std::env::temp_dir()
            .join(format!("isa_docs_snapshot_tests_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        assert!(matches!(
            validate_snapshot_path(&dir.join("missing.json")),
            Err(StoreError::Path { .. })
        ));
        assert!(matches!(
            validate_snapshot_path(&dir),
            Err(StoreError::Path { .. })
        ));

        let file = dir.join("ok.json");
        Snapshot::from_json(MINIMAL).unwrap().save(&file).unwrap();
        let loaded = Snapshot::load(&file).unwrap();
        assert_eq!(loaded.instructions.len(), 2);
    }
}
