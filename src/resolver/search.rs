//! Ranked Free-Text Instruction Search
//!
//! The store's text index supplies the candidate set (every query term must
//! prefix some indexed term); this module ranks the candidates.
//!
//! Ranking tiers, strongest first:
//!
//! ```text
//! ExactMnemonic      query == mnemonic              "MOV"  → MOV
//! MnemonicPrefix     mnemonic starts with query     "MOV"  → MOVZX, MOVSX
//! MnemonicTerm       some term hits a mnemonic      "mov zero" → MOVZX
//! CategoryOrExtension                               "sse"  → ADDPS
//! Description        only description terms hit     "mov"  → PUSH ("...moves...")
//! ```
//!
//! Within a tier: higher term score, then shorter mnemonic, then
//! (architecture, mnemonic, variant). The order is total, so identical
//! requests produce identical output.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{Page, PageMeta, PageRequest, ResolveError, ResolveResult};
use crate::model::Instruction;
use crate::store::{tokenize, DataStore};

/// Default cap on results returned by one search.
pub const DEFAULT_MAX_RESULTS: usize = 50;
/// Default cap on page size for paginated search.
pub const DEFAULT_MAX_PAGE_SIZE: usize = 500;
/// Default per-query execution budget.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2000);

/// Candidates scored between deadline checks.
const DEADLINE_CHECK_INTERVAL: usize = 256;

/// Bounds applied to every search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    pub max_results: usize,
    pub max_page_size: usize,
    /// Zero disables the deadline.
    pub timeout: Duration,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// How a hit matched the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchKind {
    Description,
    CategoryOrExtension,
    MnemonicTerm,
    MnemonicPrefix,
    ExactMnemonic,
}

/// A ranked search result.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub instruction: Arc<Instruction>,
    pub kind: MatchKind,
    pub score: u32,
}

/// Ranked hits plus the information needed to tell whether more exist.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub query: String,
    pub architecture: Option<String>,
    pub hits: Vec<SearchHit>,
    /// Matches before truncation
    pub total_matches: usize,
    /// Rank of the first hit in the full result list
    pub offset: usize,
}

impl SearchOutcome {
    /// More matches exist beyond the returned window.
    pub fn truncated(&self) -> bool {
        self.offset + self.hits.len() < self.total_matches
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Free-text search over the instruction corpus.
#[derive(Clone)]
pub struct SearchResolver {
    store: Arc<dyn DataStore>,
    limits: SearchLimits,
}

impl SearchResolver {
    pub fn new(store: Arc<dyn DataStore>, limits: SearchLimits) -> Self {
        Self { store, limits }
    }

    pub fn limits(&self) -> SearchLimits {
        self.limits
    }

    /// Top `max_results` matches for `query`, optionally within one
    /// architecture.
    pub fn search(&self, query: &str, architecture: Option<&str>) -> ResolveResult<SearchOutcome> {
        self.search_window(query, architecture, 0, self.limits.max_results)
    }

    /// One page of the ranked result list.
    pub fn search_page(
        &self,
        query: &str,
        architecture: Option<&str>,
        request: PageRequest,
    ) -> ResolveResult<Page<SearchHit>> {
        let page_size = request.page_size.clamp(1, self.limits.max_page_size.max(1));
        let request = PageRequest {
            page: request.page.max(1),
            page_size,
        };
        let outcome = self.search_window(query, architecture, request.offset(), page_size)?;
        Ok(Page {
            meta: PageMeta::new(request, outcome.total_matches),
            items: outcome.hits,
        })
    }

    fn search_window(
        &self,
        query: &str,
        architecture: Option<&str>,
        offset: usize,
        limit: usize,
    ) -> ResolveResult<SearchOutcome> {
        let started = Instant::now();
        let normalized = normalize_query(query);
        if normalized.is_empty() {
            return Err(ResolveError::InvalidQuery(
                "search query must not be empty".to_string(),
            ));
        }
        let terms = tokenize(&normalized);
        if terms.is_empty() {
            return Err(ResolveError::InvalidQuery(format!(
                "'{}' contains no searchable terms",
                query.trim()
            )));
        }

        let architecture = architecture.map(str::trim).filter(|a| !a.is_empty());
        if let Some(arch) = architecture {
            if !self.store.has_architecture(arch)? {
                return Err(ResolveError::InvalidFilter(arch.to_string()));
            }
        }

        let deadline = Deadline::new(started, self.limits.timeout, &normalized);
        let candidates = self.store.text_search(&terms, architecture)?;
        deadline.check()?;

        let mnemonic_query = normalized.to_ascii_uppercase();
        let mut hits = Vec::with_capacity(candidates.len());
        for (i, instruction) in candidates.into_iter().enumerate() {
            if i % DEADLINE_CHECK_INTERVAL == DEADLINE_CHECK_INTERVAL - 1 {
                deadline.check()?;
            }
            let (kind, score) = rank(&instruction, &mnemonic_query, &terms);
            hits.push(SearchHit {
                instruction,
                kind,
                score,
            });
        }
        hits.sort_by(compare_hits);
        deadline.check()?;

        let total_matches = hits.len();
        let hits: Vec<SearchHit> = hits.into_iter().skip(offset).take(limit).collect();
        tracing::debug!(
            query = %normalized,
            architecture = architecture.unwrap_or("*"),
            total = total_matches,
            returned = hits.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "Search resolved"
        );

        Ok(SearchOutcome {
            query: normalized,
            architecture: architecture.map(str::to_string),
            hits,
            total_matches,
            offset,
        })
    }
}

/// Trim and collapse internal whitespace.
fn normalize_query(query: &str) -> String {
    query.split_whitespace().collect::<Vec<_>>().join(" ")
}

struct Deadline<'a> {
    at: Option<Instant>,
    budget: Duration,
    query: &'a str,
}

impl<'a> Deadline<'a> {
    fn new(started: Instant, budget: Duration, query: &'a str) -> Self {
        let at = (!budget.is_zero()).then(|| started + budget);
        Self { at, budget, query }
    }

    fn check(&self) -> ResolveResult<()> {
        match self.at {
            Some(at) if Instant::now() > at => Err(ResolveError::Timeout {
                query: self.query.to_string(),
                budget: self.budget,
            }),
            _ => Ok(()),
        }
    }
}

/// Per-term weights.
const EXACT_MNEMONIC_TERM: u32 = 30;
const MNEMONIC_TERM_PREFIX: u32 = 20;
const CATEGORY_TERM: u32 = 10;
const DESCRIPTION_TERM: u32 = 5;

fn rank(instr: &Instruction, mnemonic_query: &str, terms: &[String]) -> (MatchKind, u32) {
    let mnemonic_upper = instr.mnemonic.to_ascii_uppercase();
    let mnemonic_terms = tokenize(&instr.mnemonic);
    let tag_terms: Vec<String> = tokenize(&instr.category)
        .into_iter()
        .chain(tokenize(&instr.extension))
        .collect();
    let description_terms = tokenize(&instr.description);

    let mut score = 0;
    let mut mnemonic_hit = false;
    let mut tag_hit = false;
    for term in terms {
        if mnemonic_terms.iter().any(|t| t == term) {
            score += EXACT_MNEMONIC_TERM;
            mnemonic_hit = true;
        } else if hits_any(&mnemonic_terms, term) {
            score += MNEMONIC_TERM_PREFIX;
            mnemonic_hit = true;
        } else if hits_any(&tag_terms, term) {
            score += CATEGORY_TERM;
            tag_hit = true;
        } else if hits_any(&description_terms, term) {
            score += DESCRIPTION_TERM;
        }
    }

    let kind = if mnemonic_upper == mnemonic_query {
        MatchKind::ExactMnemonic
    } else if mnemonic_upper.starts_with(mnemonic_query) {
        MatchKind::MnemonicPrefix
    } else if mnemonic_hit {
        MatchKind::MnemonicTerm
    } else if tag_hit {
        MatchKind::CategoryOrExtension
    } else {
        MatchKind::Description
    };
    (kind, score)
}

fn hits_any(field: &[String], term: &str) -> bool {
    field.iter().any(|t| t.starts_with(term))
}

fn compare_hits(a: &SearchHit, b: &SearchHit) -> Ordering {
    b.kind
        .cmp(&a.kind)
        .then_with(|| b.score.cmp(&a.score))
        .then_with(|| a.instruction.mnemonic.len().cmp(&b.instruction.mnemonic.len()))
        .then_with(|| a.instruction.architecture.cmp(&b.instruction.architecture))
        .then_with(|| a.instruction.mnemonic.cmp(&b.instruction.mnemonic))
        .then_with(|| a.instruction.variant.cmp(&b.instruction.variant))
}
