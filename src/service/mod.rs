//! Request Dispatch
//!
//! [`IsaService`] is the boundary every transport talks to. A request is
//! either a resource read (`isa://...`) or a tool call; both resolve to a
//! [`Reply`] whose text is what the caller sees.
//!
//! ```text
//!   HTTP / stdio ──▶ Request ──▶ IsaService::handle ──catch_unwind──▶ dispatch
//!                                                                       │
//!              lookup / search / compare resolvers ◀────────────────────┘
//!                                │
//!                           format::* ──▶ Reply { text, error }
//! ```
//!
//! Failures never escape as faults: resolver errors become messages naming
//! the failure and the offending input, data-access details go to the log
//! only, and a panicking handler yields an internal-error reply while the
//! process keeps serving.

pub mod format;
pub mod uri;

use serde::Serialize;
use serde_json::{json, Value};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

use crate::config::IsaDocsConfig;
use crate::resolver::{
    ComparisonResolver, ErrorKind, LookupResolver, PageRequest, ResolveError, SearchLimits,
    SearchResolver, SortDirection, SortKey,
};
use crate::store::{DataStore, MemoryStore, StoreResult};

pub use uri::{Resource, ToolCall, SCHEME};

/// An inbound request.
#[derive(Debug, Clone)]
pub enum Request {
    /// Read a resource by URI
    Read { uri: String },
    /// Invoke a tool with a JSON argument object
    Call { name: String, arguments: Value },
}

impl Request {
    pub fn read(uri: impl Into<String>) -> Self {
        Request::Read { uri: uri.into() }
    }

    pub fn call(name: impl Into<String>, arguments: Value) -> Self {
        Request::Call {
            name: name.into(),
            arguments,
        }
    }

    fn label(&self) -> String {
        match self {
            Request::Read { uri } => uri.clone(),
            Request::Call { name, .. } => format!("tool {}", name),
        }
    }
}

/// Response to one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Formatted body (text, or JSON for structured resources and tools)
    pub text: String,
    /// Set when the body describes a failure
    pub error: Option<ErrorKind>,
    /// Body is JSON
    pub json: bool,
}

impl Reply {
    fn ok(text: String, json: bool) -> Self {
        Self {
            text,
            error: None,
            json,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn mime_type(&self) -> &'static str {
        if self.json {
            "application/json"
        } else {
            "text/plain"
        }
    }
}

/// Dispatch failures.
#[derive(Debug, Error)]
enum DispatchError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

impl DispatchError {
    fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::BadRequest(_) => ErrorKind::BadRequest,
            DispatchError::Resolve(e) => e.kind(),
        }
    }
}

/// Static description of a resource or template.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<&'static str>,
    #[serde(rename = "uriTemplate", skip_serializing_if = "Option::is_none")]
    pub uri_template: Option<&'static str>,
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "mimeType")]
    pub mime_type: &'static str,
}

/// Static description of a tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// The lookup service shared by all transports.
#[derive(Clone)]
pub struct IsaService {
    store: Arc<dyn DataStore>,
    lookup: LookupResolver,
    search: SearchResolver,
    compare: ComparisonResolver,
}

impl IsaService {
    pub fn new(store: Arc<dyn DataStore>, limits: SearchLimits) -> Self {
        Self {
            lookup: LookupResolver::new(store.clone()),
            search: SearchResolver::new(store.clone(), limits),
            compare: ComparisonResolver::new(store.clone()),
            store,
        }
    }

    /// Open the configured snapshot and build the service on top of it.
    pub fn from_config(config: &IsaDocsConfig) -> StoreResult<Self> {
        let store = MemoryStore::open(&config.store.path)?;
        Ok(Self::new(Arc::new(store), config.search_limits()))
    }

    pub fn store(&self) -> &Arc<dyn DataStore> {
        &self.store
    }

    pub fn lookup(&self) -> &LookupResolver {
        &self.lookup
    }

    pub fn search(&self) -> &SearchResolver {
        &self.search
    }

    pub fn compare(&self) -> &ComparisonResolver {
        &self.compare
    }

    /// Read one resource.
    pub fn read(&self, uri: &str) -> Reply {
        self.handle(&Request::read(uri))
    }

    /// Invoke one tool.
    pub fn call(&self, name: &str, arguments: Value) -> Reply {
        self.handle(&Request::call(name, arguments))
    }

    /// Handle a request in isolation. Never panics.
    pub fn handle(&self, request: &Request) -> Reply {
        let started = Instant::now();
        let label = request.label();
        let json = match request {
            Request::Read { uri } => Resource::parse(uri).map(|r| r.is_json()).unwrap_or(false),
            Request::Call { name, arguments } => ToolCall::parse(name, arguments)
                .map(|c| c.is_json())
                .unwrap_or(false),
        };

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(request)));
        let reply = match outcome {
            Ok(Ok(text)) => Reply::ok(text, json),
            Ok(Err(err)) => self.failure(&label, err, json),
            Err(payload) => {
                let detail = if let Some(s) = payload.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = payload.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "unknown panic payload".to_string()
                };
                tracing::error!(request = %label, panic = %detail, "Request handler panicked");
                let message = format!("Internal error while handling {}", label);
                Reply {
                    text: if json { format::json_error(&message) } else { message },
                    error: Some(ErrorKind::Internal),
                    json,
                }
            }
        };

        tracing::debug!(
            request = %label,
            error = ?reply.error,
            elapsed_us = started.elapsed().as_micros() as u64,
            "Request handled"
        );
        reply
    }

    fn failure(&self, label: &str, err: DispatchError, json: bool) -> Reply {
        let kind = err.kind();
        let message = match &err {
            DispatchError::Resolve(ResolveError::DataAccess(detail)) => {
                tracing::error!(request = %label, error = %detail, "Data access failure");
                format!("Error accessing ISA data while handling {}", label)
            }
            DispatchError::Resolve(e @ ResolveError::Timeout { .. }) => {
                tracing::warn!(request = %label, "{}", e);
                format!("{}. The request may be retried.", e)
            }
            other => {
                tracing::debug!(request = %label, kind = ?kind, "{}", other);
                other.to_string()
            }
        };
        Reply {
            text: if json { format::json_error(&message) } else { message },
            error: Some(kind),
            json,
        }
    }

    fn dispatch(&self, request: &Request) -> Result<String, DispatchError> {
        match request {
            Request::Read { uri } => {
                let resource = Resource::parse(uri).map_err(DispatchError::BadRequest)?;
                self.read_resource(&resource)
            }
            Request::Call { name, arguments } => {
                let call = ToolCall::parse(name, arguments).map_err(DispatchError::BadRequest)?;
                self.call_tool(&call)
            }
        }
    }

    fn read_resource(&self, resource: &Resource) -> Result<String, DispatchError> {
        let text = match resource {
            Resource::Architectures => format::architectures(&self.lookup.list_architectures()?),
            Resource::Architecture(name) => {
                let arch = self.lookup.architecture(name)?;
                let count = self.lookup.instruction_count(name)?;
                format::architecture_detail(&arch, count)
            }
            Resource::Instructions(arch) => {
                format::instruction_list(arch, &self.lookup.instructions(arch)?)
            }
            Resource::Instruction { arch, name } => {
                format::instruction_detail(&self.lookup.instruction(arch, name)?)
            }
            Resource::InstructionGroups(arch) => {
                format::instruction_groups(&self.lookup.instruction_groups(arch)?)
            }
            Resource::Registers(arch) => format::registers(&self.lookup.registers(arch)?),
        };
        Ok(text)
    }

    fn call_tool(&self, call: &ToolCall) -> Result<String, DispatchError> {
        let max_page_size = self.search.limits().max_page_size;
        let text = match call {
            ToolCall::Search(args) => {
                let outcome = self.search.search(&args.query, args.architecture.as_deref())?;
                format::search_outcome(&outcome)
            }
            ToolCall::Compare(args) => {
                let comparison = self
                    .compare
                    .compare(&args.mnemonic, args.architectures.as_deref())?;
                format::comparison(&comparison)
            }
            ToolCall::ListPage(args) => {
                let page = self.lookup.instructions_page(
                    &args.arch,
                    PageRequest::clamped(args.page, args.page_size, max_page_size),
                    SortKey::parse(&args.sort_by),
                    SortDirection::parse(&args.sort_direction),
                )?;
                format::instructions_page(&page)
            }
            ToolCall::SearchPage(args) => {
                let page = self.search.search_page(
                    &args.query,
                    args.architecture.as_deref(),
                    PageRequest::clamped(args.page, args.page_size, max_page_size),
                )?;
                format::search_page(&page)
            }
        };
        Ok(text)
    }

    /// Fixed resources.
    pub fn resources() -> Vec<ResourceInfo> {
        vec![ResourceInfo {
            uri: Some("isa://architectures"),
            uri_template: None,
            name: "architectures",
            description: "List all supported instruction set architectures",
            mime_type: "application/json",
        }]
    }

    /// Parameterized resources.
    pub fn resource_templates() -> Vec<ResourceInfo> {
        let template = |uri_template, name, description, mime_type| ResourceInfo {
            uri: None,
            uri_template: Some(uri_template),
            name,
            description,
            mime_type,
        };
        vec![
            template(
                "isa://architecture/{name}",
                "architecture",
                "Detailed information about one architecture",
                "text/plain",
            ),
            template(
                "isa://instructions/{arch}",
                "instructions",
                "Unique instruction mnemonics of an architecture",
                "text/plain",
            ),
            template(
                "isa://instruction/{arch}/{name}",
                "instruction",
                "Every variant of one instruction",
                "text/plain",
            ),
            template(
                "isa://architectures/{arch}/instruction-groups",
                "instruction-groups",
                "Instructions grouped by functional category",
                "application/json",
            ),
            template(
                "isa://architectures/{arch}/registers",
                "registers",
                "Register definitions with aliases and calling convention",
                "application/json",
            ),
        ]
    }

    /// Tool catalog with JSON Schema argument descriptions.
    pub fn tools() -> Vec<ToolInfo> {
        vec![
            ToolInfo {
                name: "search_instructions",
                description: "Search for instructions by mnemonic, description, category or extension",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "query": {"type": "string"},
                        "architecture": {"type": "string"}
                    },
                    "required": ["query"]
                }),
            },
            ToolInfo {
                name: "compare_instructions",
                description: "Compare one mnemonic across architectures, marking where it is absent",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "mnemonic": {"type": "string"},
                        "architectures": {"type": "array", "items": {"type": "string"}}
                    },
                    "required": ["mnemonic"]
                }),
            },
            ToolInfo {
                name: "list_instructions_paginated",
                description: "List instructions of an architecture with pagination",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "arch": {"type": "string"},
                        "page": {"type": "integer", "default": 1},
                        "page_size": {"type": "integer", "default": 50},
                        "sort_by": {
                            "type": "string",
                            "enum": ["mnemonic", "category", "extension", "isa_set", "description"],
                            "default": "mnemonic"
                        },
                        "sort_direction": {"type": "string", "enum": ["asc", "desc"], "default": "asc"}
                    },
                    "required": ["arch"]
                }),
            },
            ToolInfo {
                name: "search_instructions_paginated",
                description: "Search for instructions with pagination",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "query": {"type": "string"},
                        "architecture": {"type": "string"},
                        "page": {"type": "integer", "default": 1},
                        "page_size": {"type": "integer", "default": 50}
                    },
                    "required": ["query"]
                }),
            },
        ]
    }
}
