//! ISA Record Types
//!
//! Plain data records shared by the store, the resolvers and the formatter.
//! Records are created by the import process and are read-only at query time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An instruction set architecture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Architecture {
    /// Canonical name (e.g. `x86_64`), matched case-sensitively
    pub name: String,
    /// Human description
    #[serde(default)]
    pub description: String,
    /// Native word size in bits
    pub word_size: u32,
    /// Byte order
    pub endianness: Endianness,
    /// Machine mode (e.g. "long mode", "AArch64 state")
    #[serde(default)]
    pub machine_mode: String,
    /// Register file, in import order
    #[serde(default)]
    pub registers: Vec<Register>,
    /// Addressing modes, in import order
    #[serde(default)]
    pub addressing_modes: Vec<AddressingMode>,
}

impl Architecture {
    /// Main general-purpose registers (class `gpr`, main flag set).
    pub fn main_gprs(&self) -> impl Iterator<Item = &Register> {
        self.registers
            .iter()
            .filter(|r| r.is_main_register && r.class == "gpr")
    }
}

/// Byte order of an architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endianness {
    Little,
    Big,
    Bi,
}

impl fmt::Display for Endianness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endianness::Little => write!(f, "little"),
            Endianness::Big => write!(f, "big"),
            Endianness::Bi => write!(f, "bi"),
        }
    }
}

/// A register belonging to one architecture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Register {
    pub name: String,
    /// Register class as imported (`gpr`, `simd`, `flags`, `gpr64`, ...)
    pub class: String,
    pub width_bits: u32,
    /// Hardware encoding number
    #[serde(default)]
    pub encoding_id: Option<u32>,
    #[serde(default = "default_true")]
    pub is_main_register: bool,
    /// Name of the containing register for sub-registers (EAX -> RAX)
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub calling_convention: Option<Preservation>,
    #[serde(default)]
    pub purpose: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Register {
    /// User-facing register type derived from the imported class.
    pub fn display_type(&self) -> &'static str {
        match self.class.as_str() {
            "gpr" | "gpr64" | "gpr32" | "integer" => "general-purpose",
            "flags" => "flags",
            "segment" => "segment",
            "control" => "control",
            "debug" => "debug",
            "mmx" => "multimedia",
            "x87" | "float" => "floating-point",
            "simd" | "vector" => "vector",
            "system" => "system",
            "csr" => "control-status",
            _ => "special-purpose",
        }
    }
}

/// Calling convention treatment of a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preservation {
    /// Callee-saved
    Preserved,
    /// Caller-saved
    Volatile,
}

impl fmt::Display for Preservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Preservation::Preserved => write!(f, "preserved"),
            Preservation::Volatile => write!(f, "volatile"),
        }
    }
}

/// An addressing mode belonging to one architecture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressingMode {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub example_syntax: String,
}

/// A machine instruction, identified by (architecture, mnemonic, variant).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub architecture: String,
    pub mnemonic: String,
    /// Distinguishes overloaded forms of one mnemonic
    #[serde(default)]
    pub variant: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub extension: String,
    #[serde(default)]
    pub isa_set: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub syntax: String,
    #[serde(default)]
    pub operands: Vec<Operand>,
    #[serde(default)]
    pub encoding: Option<Encoding>,
    #[serde(default)]
    pub flags_affected: Vec<String>,
    #[serde(default)]
    pub cpuid_features: Vec<String>,
    #[serde(default)]
    pub attributes: Vec<String>,
    /// Minimum privilege level
    #[serde(default)]
    pub cpl: Option<u8>,
    #[serde(default)]
    pub added_version: Option<String>,
    #[serde(default)]
    pub deprecated: bool,
}

/// Label used when an instruction has no explicit variant.
pub const BASE_VARIANT: &str = "base";

impl Instruction {
    /// Variant tag for display; unnamed variants are tagged `base`.
    pub fn variant_tag(&self) -> &str {
        self.variant.as_deref().unwrap_or(BASE_VARIANT)
    }

    /// Identity key used for uniqueness checks.
    pub fn identity(&self) -> (&str, &str, Option<&str>) {
        (
            self.architecture.as_str(),
            self.mnemonic.as_str(),
            self.variant.as_deref(),
        )
    }
}

/// Operand descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operand {
    pub name: String,
    pub kind: OperandKind,
    pub access: Access,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperandKind {
    Register,
    Memory,
    Immediate,
    Other,
}

impl fmt::Display for OperandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperandKind::Register => write!(f, "register"),
            OperandKind::Memory => write!(f, "memory"),
            OperandKind::Immediate => write!(f, "immediate"),
            OperandKind::Other => write!(f, "other"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Access {
    #[serde(rename = "r")]
    Read,
    #[serde(rename = "w")]
    Write,
    #[serde(rename = "rw")]
    ReadWrite,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Read => write!(f, "r"),
            Access::Write => write!(f, "w"),
            Access::ReadWrite => write!(f, "rw"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Explicit,
    Implicit,
    Suppressed,
}

/// Encoding descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Encoding {
    /// Vendor pattern or bit layout
    pub pattern: String,
    #[serde(default)]
    pub opcode: Option<String>,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub modrm: Option<bool>,
    #[serde(default)]
    pub sib: Option<bool>,
    #[serde(default)]
    pub displacement: Option<String>,
    #[serde(default)]
    pub immediate: Option<String>,
}
