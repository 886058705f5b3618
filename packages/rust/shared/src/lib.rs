//! Shared types, error model, and configuration for PartnerScout.
//!
//! This crate is the foundation depended on by all other PartnerScout crates.
//! It provides:
//! - [`PartnerScoutError`] — the unified error type
//! - Domain types ([`Candidate`], [`CompanyAnalysis`], [`EnrichedPartner`],
//!   [`SearchStatus`], [`IndustryReport`])
//! - The scoring [`Rubric`] and current-partner roster
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod roster;
pub mod rubric;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, ProvidersConfig, StoreConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from, resolve_key, validate_provider_keys,
};
pub use error::{PartnerScoutError, Result};
pub use roster::{CurrentPartner, default_roster, roster_prompt_text};
pub use rubric::{Rubric, RubricCategory, RubricTier};
pub use types::{
    Candidate, CategoryScore, CompanyAnalysis, EnrichedPartner, IndustryAnalysis, IndustryReport,
    MarketAnalysis, PartnerRecord, PartnershipPotential, SearchHistoryEntry, SearchHit,
    SearchPhase, SearchStatus,
};
