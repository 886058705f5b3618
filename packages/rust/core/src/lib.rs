//! Pipeline orchestration for PartnerScout.
//!
//! This crate ties together search, candidate extraction, scoring,
//! enrichment, and persistence into the end-to-end discovery run, and owns
//! the process-wide status record that run updates in place.

pub mod filter;
pub mod pipeline;
pub mod status;

pub use filter::{FilterOutcome, filter_candidates};
pub use pipeline::{Pipeline, StartReceipt};
pub use status::StatusTracker;
