//! Application configuration for PartnerScout.
//!
//! User config lives at `~/.partnerscout/partnerscout.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PartnerScoutError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "partnerscout.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".partnerscout";

// ---------------------------------------------------------------------------
// Config structs (matching partnerscout.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Pipeline tunables.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// External provider endpoints and key env vars.
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Persistent store settings.
    #[serde(default)]
    pub store: StoreConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Candidates per oracle scoring request.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Upper bound on concurrent scoring batches.
    #[serde(default = "default_scoring_workers")]
    pub scoring_workers: usize,

    /// Upper bound on concurrent profile-enrichment calls.
    #[serde(default = "default_enrichment_workers")]
    pub enrichment_workers: usize,

    /// Delay before each profile call, to stay under provider rate limits.
    #[serde(default = "default_enrichment_delay_ms")]
    pub enrichment_delay_ms: u64,

    /// Hard cap on candidates scored per run.
    #[serde(default = "default_candidate_cap")]
    pub candidate_cap: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            scoring_workers: default_scoring_workers(),
            enrichment_workers: default_enrichment_workers(),
            enrichment_delay_ms: default_enrichment_delay_ms(),
            candidate_cap: default_candidate_cap(),
        }
    }
}

fn default_batch_size() -> usize {
    4
}
fn default_scoring_workers() -> usize {
    5
}
fn default_enrichment_workers() -> usize {
    4
}
fn default_enrichment_delay_ms() -> u64 {
    250
}
fn default_candidate_cap() -> usize {
    40
}

/// `[providers]` section.
///
/// Only env var *names* are stored, never key material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Text search provider base URL.
    #[serde(default = "default_search_base_url")]
    pub search_base_url: String,

    /// Env var holding the search provider key.
    #[serde(default = "default_search_key_env")]
    pub search_key_env: String,

    /// Analysis oracle base URL.
    #[serde(default = "default_oracle_base_url")]
    pub oracle_base_url: String,

    /// Env var holding the oracle key.
    #[serde(default = "default_oracle_key_env")]
    pub oracle_key_env: String,

    /// Oracle model identifier.
    #[serde(default = "default_oracle_model")]
    pub oracle_model: String,

    /// Cheaper oracle model used for the industry overview call.
    #[serde(default = "default_overview_model")]
    pub overview_model: String,

    /// Company profile provider base URL.
    #[serde(default = "default_profile_base_url")]
    pub profile_base_url: String,

    /// Env var holding the profile provider key.
    #[serde(default = "default_profile_key_env")]
    pub profile_key_env: String,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            search_base_url: default_search_base_url(),
            search_key_env: default_search_key_env(),
            oracle_base_url: default_oracle_base_url(),
            oracle_key_env: default_oracle_key_env(),
            oracle_model: default_oracle_model(),
            overview_model: default_overview_model(),
            profile_base_url: default_profile_base_url(),
            profile_key_env: default_profile_key_env(),
        }
    }
}

fn default_search_base_url() -> String {
    "https://api.exa.ai".into()
}
fn default_search_key_env() -> String {
    "EXA_API_KEY".into()
}
fn default_oracle_base_url() -> String {
    "https://api.openai.com".into()
}
fn default_oracle_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_oracle_model() -> String {
    "gpt-4o-mini".into()
}
fn default_overview_model() -> String {
    "gpt-3.5-turbo".into()
}
fn default_profile_base_url() -> String {
    "https://api.coresignal.com/cdapi/v1".into()
}
fn default_profile_key_env() -> String {
    "CORESIGNAL_API_KEY".into()
}

/// `[store]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// REST store base URL env var. Unset means REST strategies are skipped.
    #[serde(default = "default_store_url_env")]
    pub url_env: String,

    /// REST store service key env var.
    #[serde(default = "default_store_key_env")]
    pub key_env: String,

    /// Local database path. `~` expands to the user's home.
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url_env: default_store_url_env(),
            key_env: default_store_key_env(),
            db_path: default_db_path(),
        }
    }
}

fn default_store_url_env() -> String {
    "PARTNER_STORE_URL".into()
}
fn default_store_key_env() -> String {
    "PARTNER_STORE_KEY".into()
}
fn default_db_path() -> String {
    "~/.partnerscout/partnerscout.db".into()
}

impl StoreConfig {
    /// Resolve the configured REST store endpoint, if any.
    pub fn rest_endpoint(&self) -> Option<(String, String)> {
        let url = std::env::var(&self.url_env).ok().filter(|v| !v.is_empty())?;
        let key = std::env::var(&self.key_env).ok().filter(|v| !v.is_empty())?;
        Some((url, key))
    }

    /// Resolve `db_path`, expanding a leading `~`.
    pub fn resolved_db_path(&self) -> Result<PathBuf> {
        if let Some(rest) = self.db_path.strip_prefix("~/") {
            let home = dirs::home_dir()
                .ok_or_else(|| PartnerScoutError::config("could not determine home directory"))?;
            Ok(home.join(rest))
        } else {
            Ok(PathBuf::from(&self.db_path))
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.partnerscout/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| PartnerScoutError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.partnerscout/partnerscout.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| PartnerScoutError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        PartnerScoutError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| PartnerScoutError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| PartnerScoutError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| PartnerScoutError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the key behind a `*_key_env` indirection, failing with a pointer to
/// the missing env var.
pub fn resolve_key(var_name: &str) -> Result<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(PartnerScoutError::config(format!(
            "API key not found. Set the {var_name} environment variable."
        ))),
    }
}

/// Check that every required provider key env var is set and non-empty.
/// The store keys are optional (REST strategies are skipped without them).
pub fn validate_provider_keys(config: &AppConfig) -> Result<()> {
    for var_name in [
        &config.providers.search_key_env,
        &config.providers.oracle_key_env,
        &config.providers.profile_key_env,
    ] {
        resolve_key(var_name)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("batch_size"));
        assert!(toml_str.contains("EXA_API_KEY"));
        assert!(toml_str.contains("PARTNER_STORE_URL"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.batch_size, 4);
        assert_eq!(parsed.defaults.candidate_cap, 40);
        assert_eq!(parsed.providers.oracle_key_env, "OPENAI_API_KEY");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[defaults]
batch_size = 8

[providers]
oracle_model = "gpt-4o"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.batch_size, 8);
        assert_eq!(config.defaults.scoring_workers, 5);
        assert_eq!(config.providers.oracle_model, "gpt-4o");
        assert_eq!(config.providers.search_base_url, "https://api.exa.ai");
    }

    #[test]
    fn key_validation_reports_missing_var() {
        // Unique env var name to avoid interfering with other tests
        let result = resolve_key("PS_TEST_NONEXISTENT_KEY_12345");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("PS_TEST_NONEXISTENT_KEY_12345"));
    }

    #[test]
    fn rest_endpoint_absent_without_env() {
        let store = StoreConfig {
            url_env: "PS_TEST_NO_URL_98765".into(),
            key_env: "PS_TEST_NO_KEY_98765".into(),
            db_path: default_db_path(),
        };
        assert!(store.rest_endpoint().is_none());
    }
}
