//! libSQL storage layer for PartnerScout.
//!
//! The [`Storage`] struct wraps a local libSQL database holding scored
//! partner records, the previously-considered set, and the search history.
//! It is also the final strategy in the [`PartnerStore`] fallback chain.

mod considered;
mod migrations;
mod strategies;

use std::path::Path;

use chrono::Utc;
use libsql::{Connection, Database, params};
use uuid::Uuid;

use partnerscout_shared::{
    MarketAnalysis, PartnerRecord, PartnerScoutError, PartnershipPotential, Result,
    SearchHistoryEntry,
};

pub use considered::ConsideredSet;
pub use strategies::{PartnerStore, RestWriter, StoreClient};

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

impl Storage {
    /// Open or create a database at `path`.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PartnerScoutError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| PartnerScoutError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| PartnerScoutError::Storage(e.to_string()))?;

        let storage = Self { db, conn };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    PartnerScoutError::Storage(format!(
                        "migration v{} failed: {e}",
                        migration.version
                    ))
                })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    // -----------------------------------------------------------------------
    // Partner operations
    // -----------------------------------------------------------------------

    /// Upsert a full partner record (insert or update on conflict by `name`).
    pub async fn upsert_partner(&self, record: &PartnerRecord) -> Result<()> {
        let id = Uuid::now_v7().to_string();
        let now = Utc::now().to_rfc3339();
        let leadership = serde_json::to_string(&record.leadership).unwrap_or_else(|_| "[]".into());
        let products = serde_json::to_string(&record.products).unwrap_or_else(|_| "[]".into());
        let opportunities =
            serde_json::to_string(&record.opportunities).unwrap_or_else(|_| "[]".into());
        let market_analysis = record
            .market_analysis
            .as_ref()
            .and_then(|m| serde_json::to_string(m).ok());
        let partnership_potential = record
            .partnership_potential
            .as_ref()
            .and_then(|p| serde_json::to_string(p).ok());

        self.conn
            .execute(
                "INSERT INTO potential_partners
                   (id, name, score, industry, description, leadership, products, opportunities,
                    market_analysis, partnership_potential, hq_location, website, size_range, logo,
                    created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?15)
                 ON CONFLICT(name) DO UPDATE SET
                   score = excluded.score,
                   industry = excluded.industry,
                   description = excluded.description,
                   leadership = excluded.leadership,
                   products = excluded.products,
                   opportunities = excluded.opportunities,
                   market_analysis = excluded.market_analysis,
                   partnership_potential = excluded.partnership_potential,
                   hq_location = excluded.hq_location,
                   website = excluded.website,
                   size_range = excluded.size_range,
                   logo = excluded.logo,
                   updated_at = excluded.updated_at",
                params![
                    id.as_str(),
                    record.name.as_str(),
                    record.score,
                    record.industry.as_str(),
                    record.description.as_str(),
                    leadership.as_str(),
                    products.as_str(),
                    opportunities.as_str(),
                    market_analysis.as_deref(),
                    partnership_potential.as_deref(),
                    record.hq_location.as_str(),
                    record.website.as_str(),
                    record.size_range.as_str(),
                    record.logo.as_str(),
                    now.as_str(),
                ],
            )
            .await
            .map_err(|e| PartnerScoutError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Minimal-field upsert, used as the last resort in the fallback chain.
    pub async fn upsert_partner_minimal(
        &self,
        name: &str,
        score: f64,
        industry: &str,
        description: &str,
    ) -> Result<()> {
        let id = Uuid::now_v7().to_string();
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO potential_partners (id, name, score, industry, description, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
                 ON CONFLICT(name) DO UPDATE SET
                   score = excluded.score,
                   industry = excluded.industry,
                   description = excluded.description,
                   updated_at = excluded.updated_at",
                params![id.as_str(), name, score, industry, description, now.as_str()],
            )
            .await
            .map_err(|e| PartnerScoutError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Get a partner by name.
    pub async fn get_partner(&self, name: &str) -> Result<Option<PartnerRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT name, score, industry, description, leadership, products, opportunities,
                        market_analysis, partnership_potential, hq_location, website, size_range, logo
                 FROM potential_partners WHERE name = ?1",
                params![name],
            )
            .await
            .map_err(|e| PartnerScoutError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_partner(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(PartnerScoutError::Storage(e.to_string())),
        }
    }

    /// List all partners, highest score first.
    pub async fn list_partners(&self) -> Result<Vec<PartnerRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT name, score, industry, description, leadership, products, opportunities,
                        market_analysis, partnership_potential, hq_location, website, size_range, logo
                 FROM potential_partners ORDER BY score DESC, name",
                params![],
            )
            .await
            .map_err(|e| PartnerScoutError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            results.push(row_to_partner(&row)?);
        }
        Ok(results)
    }

    // -----------------------------------------------------------------------
    // Previously-considered set
    // -----------------------------------------------------------------------

    /// Mark company names as considered. Re-adding is a no-op.
    pub async fn add_considered(&self, names: &[String]) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        for name in names {
            self.conn
                .execute(
                    "INSERT INTO previously_considered (name_key, name, considered_at)
                     VALUES (?1, ?2, ?3)
                     ON CONFLICT(name_key) DO NOTHING",
                    params![name.to_lowercase().as_str(), name.as_str(), now.as_str()],
                )
                .await
                .map_err(|e| PartnerScoutError::Storage(e.to_string()))?;
        }
        Ok(())
    }

    /// All considered name keys (lowercased).
    pub async fn considered_keys(&self) -> Result<Vec<String>> {
        let mut rows = self
            .conn
            .query("SELECT name_key FROM previously_considered", params![])
            .await
            .map_err(|e| PartnerScoutError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            results.push(
                row.get::<String>(0)
                    .map_err(|e| PartnerScoutError::Storage(e.to_string()))?,
            );
        }
        Ok(results)
    }

    // -----------------------------------------------------------------------
    // Search history
    // -----------------------------------------------------------------------

    /// Append one history entry.
    pub async fn insert_history(&self, entry: &SearchHistoryEntry) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO search_history (id, timestamp, search_type, query, results_count)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    entry.id.as_str(),
                    entry.timestamp.to_rfc3339(),
                    entry.search_type.as_str(),
                    entry.query.as_str(),
                    i64::from(entry.results_count),
                ],
            )
            .await
            .map_err(|e| PartnerScoutError::Storage(e.to_string()))?;
        Ok(())
    }

    /// List history entries, newest first.
    pub async fn list_history(&self, limit: u32) -> Result<Vec<SearchHistoryEntry>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, timestamp, search_type, query, results_count
                 FROM search_history ORDER BY timestamp DESC LIMIT ?1",
                params![i64::from(limit)],
            )
            .await
            .map_err(|e| PartnerScoutError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            let timestamp: String = row
                .get(1)
                .map_err(|e| PartnerScoutError::Storage(e.to_string()))?;
            results.push(SearchHistoryEntry {
                id: row
                    .get::<String>(0)
                    .map_err(|e| PartnerScoutError::Storage(e.to_string()))?,
                timestamp: chrono::DateTime::parse_from_rfc3339(&timestamp)
                    .map(|dt| dt.with_timezone(&chrono::Utc))
                    .map_err(|e| PartnerScoutError::Storage(format!("invalid date: {e}")))?,
                search_type: row
                    .get::<String>(2)
                    .map_err(|e| PartnerScoutError::Storage(e.to_string()))?,
                query: row
                    .get::<String>(3)
                    .map_err(|e| PartnerScoutError::Storage(e.to_string()))?,
                results_count: row.get::<i64>(4).unwrap_or(0) as u32,
            });
        }
        Ok(results)
    }

    // -----------------------------------------------------------------------
    // Reset
    // -----------------------------------------------------------------------

    /// Delete all partners, considered names, and history.
    pub async fn clear_all(&self) -> Result<()> {
        for table in ["potential_partners", "previously_considered", "search_history"] {
            self.conn
                .execute(&format!("DELETE FROM {table}"), params![])
                .await
                .map_err(|e| PartnerScoutError::Storage(e.to_string()))?;
        }
        Ok(())
    }
}

/// Convert a database row to a [`PartnerRecord`].
fn row_to_partner(row: &libsql::Row) -> Result<PartnerRecord> {
    let get_str = |idx: i32| -> Result<String> {
        row.get::<String>(idx)
            .map_err(|e| PartnerScoutError::Storage(e.to_string()))
    };
    let get_list = |idx: i32| -> Vec<String> {
        row.get::<String>(idx)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    };

    Ok(PartnerRecord {
        name: get_str(0)?,
        score: row
            .get::<f64>(1)
            .map_err(|e| PartnerScoutError::Storage(e.to_string()))?,
        industry: get_str(2)?,
        description: get_str(3)?,
        leadership: get_list(4),
        products: get_list(5),
        opportunities: get_list(6),
        market_analysis: row
            .get::<String>(7)
            .ok()
            .and_then(|s| serde_json::from_str::<MarketAnalysis>(&s).ok()),
        partnership_potential: row
            .get::<String>(8)
            .ok()
            .and_then(|s| serde_json::from_str::<PartnershipPotential>(&s).ok()),
        hq_location: get_str(9).unwrap_or_default(),
        website: get_str(10).unwrap_or_default(),
        size_range: get_str(11).unwrap_or_default(),
        logo: get_str(12).unwrap_or_default(),
    })
}
