//! isa-docs - Instruction Set Architecture Documentation Service
//!
//! Serves ISA reference data (architectures, registers, addressing modes and
//! machine instructions) to tool-calling agents as read-only resources and
//! search/compare tools. Responses are formatted text or JSON.
//!
//! # Features
//!
//! - **Resources**: `isa://architectures`, `isa://architecture/{name}`,
//!   `isa://instructions/{arch}`, `isa://instruction/{arch}/{name}`, plus
//!   instruction groups and register definitions per architecture
//! - **Ranked search**: prefix-tolerant, case-insensitive, AND semantics,
//!   bounded result size with an explicit truncation notice
//! - **Comparison**: one mnemonic across architectures with absence markers
//! - **Transports**: HTTP/1.1 with a worker pool, JSON-RPC 2.0 over stdio
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use isa_docs::{IsaService, MemoryStore, SearchLimits, Snapshot};
//!
//! let snapshot = Snapshot::from_json(r#"{
//!     "architectures": [{"name": "riscv64", "word_size": 64, "endianness": "little"}],
//!     "instructions": [{"architecture": "riscv64", "mnemonic": "ADD",
//!                       "description": "Add registers"}]
//! }"#).unwrap();
//! let store = MemoryStore::from_snapshot(snapshot).unwrap();
//! let service = IsaService::new(Arc::new(store), SearchLimits::default());
//!
//! let reply = service.read("isa://instructions/riscv64");
//! assert_eq!(reply.text, "- ADD");
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │  HTTP  │  stdio RPC  │  server::*
//! └──────────┬───────────┘
//!            ▼
//! ┌──────────────────────┐
//! │     IsaService       │  dispatch, isolation, formatting
//! └──────────┬───────────┘
//!            ▼
//! ┌──────────────────────┐
//! │ lookup│search│compare│  resolver::*
//! └──────────┬───────────┘
//!            ▼
//! ┌──────────────────────┐
//! │  dyn DataStore       │  MemoryStore over a JSON snapshot
//! └──────────────────────┘
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod model;
pub mod resolver;
pub mod server;
pub mod service;
pub mod store;

// Re-export commonly used types
pub use config::{ConfigError, ConfigResult, IsaDocsConfig};
pub use model::{
    Access, AddressingMode, Architecture, Encoding, Endianness, Instruction, Operand,
    OperandKind, Preservation, Register, Visibility,
};
pub use resolver::{
    Comparison, ComparisonResolver, ErrorKind, LookupResolver, MatchKind, Page, PageMeta,
    PageRequest, Presence, ResolveError, ResolveResult, SearchHit, SearchLimits, SearchOutcome,
    SearchResolver, SortDirection, SortKey,
};
pub use server::HttpServer;
pub use service::{IsaService, Reply, Request, Resource, ToolCall};
pub use store::{DataStore, MemoryStore, Snapshot, StoreError, StoreResult};
