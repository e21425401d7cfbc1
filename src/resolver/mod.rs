//! Query Resolvers
//!
//! Three stateless resolvers sit between request dispatch and the data
//! store. Each call is an independent, idempotent read; resolvers return
//! structured records and leave presentation to `service::format`.
//!
//! | Resolver               | Answers                                         |
//! |------------------------|-------------------------------------------------|
//! | [`LookupResolver`]     | architecture / instruction point queries        |
//! | [`SearchResolver`]     | ranked free-text search, optional arch filter   |
//! | [`ComparisonResolver`] | one mnemonic side by side across architectures  |

pub mod compare;
pub mod lookup;
pub mod search;

use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::store::StoreError;

pub use compare::{Comparison, ComparisonEntry, ComparisonResolver, Presence};
pub use lookup::{LookupResolver, SortDirection, SortKey};
pub use search::{MatchKind, SearchHit, SearchLimits, SearchOutcome, SearchResolver};

/// Identifier that failed to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Missing {
    Architecture(String),
    Instruction { arch: String, mnemonic: String },
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Missing::Architecture(name) => write!(f, "Architecture '{}' not found", name),
            Missing::Instruction { arch, mnemonic } => write!(
                f,
                "Instruction '{}' not found for architecture '{}'",
                mnemonic, arch
            ),
        }
    }
}

/// Resolver errors.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("{0}")]
    NotFound(Missing),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Invalid architecture filter: '{0}' is not a known architecture")]
    InvalidFilter(String),

    #[error("Unknown architecture(s): {}", .0.join(", "))]
    UnknownArchitecture(Vec<String>),

    #[error("Search for '{query}' exceeded its {}ms budget", .budget.as_millis())]
    Timeout { query: String, budget: Duration },

    #[error("Data access failure: {0}")]
    DataAccess(#[from] StoreError),
}

impl ResolveError {
    /// Coarse classification used by transports.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResolveError::NotFound(_) => ErrorKind::NotFound,
            ResolveError::InvalidQuery(_) => ErrorKind::InvalidQuery,
            ResolveError::InvalidFilter(_) => ErrorKind::InvalidFilter,
            ResolveError::UnknownArchitecture(_) => ErrorKind::UnknownArchitecture,
            ResolveError::Timeout { .. } => ErrorKind::Timeout,
            ResolveError::DataAccess(_) => ErrorKind::DataAccessFailure,
        }
    }

    pub(crate) fn architecture_not_found(name: &str) -> Self {
        ResolveError::NotFound(Missing::Architecture(name.to_string()))
    }
}

/// Failure kinds visible across the service boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    InvalidQuery,
    InvalidFilter,
    UnknownArchitecture,
    Timeout,
    DataAccessFailure,
    /// Malformed request at the dispatch layer (bad URI, missing argument)
    BadRequest,
    /// A handler panicked
    Internal,
}

impl ErrorKind {
    /// Whether the caller may retry the same request unchanged.
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::Timeout)
    }
}

/// Result type for resolver operations.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Default page size for paginated listings.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Requested page, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub page_size: usize,
}

impl PageRequest {
    /// Clamp page to at least 1 and page size to `1..=max_page_size`.
    pub fn clamped(page: i64, page_size: i64, max_page_size: usize) -> Self {
        let max = max_page_size.max(1) as i64;
        Self {
            page: page.max(1) as usize,
            page_size: page_size.clamp(1, max) as usize,
        }
    }

    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Pagination metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PageMeta {
    pub fn new(request: PageRequest, total_items: usize) -> Self {
        Self {
            page: request.page,
            page_size: request.page_size,
            total_items,
            total_pages: total_items.div_ceil(request.page_size),
            has_next: request.page.saturating_mul(request.page_size) < total_items,
            has_prev: request.page > 1,
        }
    }
}

/// One page of results.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_clamping() {
        let req = PageRequest::clamped(0, 10_000, 500);
        assert_eq!(req.page, 1);
        assert_eq!(req.page_size, 500);
        let req = PageRequest::clamped(3, -4, 500);
        assert_eq!(req.page_size, 1);
        assert_eq!(req.offset(), 2);
    }

    #[test]
    fn test_page_meta() {
        let meta = PageMeta::new(PageRequest { page: 2, page_size: 10 }, 25);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_next);
        assert!(meta.has_prev);

        let meta = PageMeta::new(PageRequest { page: 3, page_size: 10 }, 25);
        assert!(!meta.has_next);

        let meta = PageMeta::new(PageRequest::default(), 0);
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next);
        assert!(!meta.has_prev);
    }

    #[test]
    fn test_error_messages_name_the_input() {
        let err = ResolveError::UnknownArchitecture(vec!["riscv32".into(), "mips".into()]);
        assert_eq!(err.to_string(), "Unknown architecture(s): riscv32, mips");
        assert_eq!(err.kind(), ErrorKind::UnknownArchitecture);

        let err = ResolveError::NotFound(Missing::Instruction {
            arch: "x86_64".into(),
            mnemonic: "FOO".into(),
        });
        assert_eq!(
            err.to_string(),
            "Instruction 'FOO' not found for architecture 'x86_64'"
        );
        assert!(!err.kind().is_retryable());
    }
}
