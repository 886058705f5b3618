//! Candidate extraction and competitive scoring against the analysis oracle.
//!
//! Three pieces:
//! - [`Oracle`] — chat-completions client that always requests JSON replies
//! - [`extractor`] — company names out of search results, with layered
//!   fallback parsing
//! - [`scoring`] — batched concurrent scoring with count-preserving repair

pub mod extractor;
pub mod oracle;
pub mod scoring;

pub use extractor::{extract_candidates, parse_names};
pub use oracle::Oracle;
pub use scoring::{fetch_industry_overview, repair_batch, score_candidates};
