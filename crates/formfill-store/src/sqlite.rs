use crate::schema::init_schema;
use crate::store::ProfileStore;
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use formfill_core::{InterpretationResult, MappingEntry, StoredMapping, UserProfile};
use rusqlite::{OptionalExtension, Row, params};
use std::path::{Path, PathBuf};
use tokio_rusqlite::Connection;

/// Default database location: `~/.formfill/formfill.db`
pub fn default_path() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or(Error::NoHomeDir)?;
    Ok(home.join(".formfill").join("formfill.db"))
}

/// Stored '' means "no form id".
fn form_key(form_id: Option<&str>) -> String {
    form_id.unwrap_or_default().to_string()
}

fn form_id_from_key(key: String) -> Option<String> {
    if key.is_empty() { None } else { Some(key) }
}

fn mapping_from_row(row: &Row<'_>) -> rusqlite::Result<StoredMapping> {
    Ok(StoredMapping {
        domain: row.get(0)?,
        form_id: form_id_from_key(row.get(1)?),
        field_name: row.get(2)?,
        field_type: row.get(3)?,
        user_field: row.get(4)?,
        confidence: row.get(5)?,
    })
}

fn upsert_mapping(conn: &rusqlite::Connection, mapping: &StoredMapping, now: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO form_mappings
             (domain, form_id, field_name, field_type, user_field, confidence, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
         ON CONFLICT(domain, form_id, field_name) DO UPDATE SET
             field_type = excluded.field_type,
             user_field = excluded.user_field,
             confidence = excluded.confidence,
             updated_at = excluded.updated_at",
        params![
            mapping.domain,
            form_key(mapping.form_id.as_deref()),
            mapping.field_name,
            mapping.field_type,
            mapping.user_field,
            mapping.confidence,
            now,
        ],
    )?;
    Ok(())
}

/// SQLite-backed [`ProfileStore`]
///
/// All statements run on the single connection thread owned by
/// `tokio_rusqlite`, so writes are serialized.
pub struct SqliteStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open (or create) a database file, creating its parent directory
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let conn = Connection::open(path.clone()).await?;
        conn.call(|conn| Ok(init_schema(conn)?)).await?;

        tracing::info!("Opened database at {}", path.display());
        Ok(Self {
            conn,
            path: Some(path),
        })
    }

    pub async fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        conn.call(|conn| Ok(init_schema(conn)?)).await?;
        Ok(Self { conn, path: None })
    }

    /// Database file path, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

#[async_trait]
impl ProfileStore for SqliteStore {
    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        let id = user_id.to_string();
        let data: Option<String> = self
            .conn
            .call(move |conn| {
                let data = conn
                    .query_row("SELECT data FROM user_data WHERE id = ?1", [&id], |row| {
                        row.get(0)
                    })
                    .optional()?;
                Ok(data)
            })
            .await?;

        match data {
            Some(data) => {
                let value: serde_json::Value = serde_json::from_str(&data)?;
                Ok(Some(UserProfile::from_value(user_id, &value)?))
            }
            None => Ok(None),
        }
    }

    async fn save_profile(&self, profile: &UserProfile) -> Result<()> {
        let id = profile.user_id.clone();
        let data = serde_json::to_string(&profile.to_map())?;
        let now = Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO user_data (id, data, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?3)
                     ON CONFLICT(id) DO UPDATE SET
                         data = excluded.data,
                         updated_at = excluded.updated_at",
                    params![id, data, now],
                )?;
                Ok(())
            })
            .await?;

        tracing::debug!("Saved profile for user '{}'", profile.user_id);
        Ok(())
    }

    async fn get_mappings(&self, domain: &str, form_id: Option<&str>) -> Result<Vec<StoredMapping>> {
        let domain = domain.to_string();
        let form_id = form_id.map(str::to_string);

        let mappings = self
            .conn
            .call(move |conn| {
                let columns = "SELECT domain, form_id, field_name, field_type, user_field, confidence
                               FROM form_mappings";
                let rows = match form_id {
                    Some(form_id) => {
                        let mut stmt = conn.prepare(&format!(
                            "{} WHERE domain = ?1 AND form_id = ?2 ORDER BY id",
                            columns
                        ))?;
                        let rows = stmt
                            .query_map(params![domain, form_id], mapping_from_row)?
                            .collect::<rusqlite::Result<Vec<_>>>()?;
                        rows
                    }
                    None => {
                        let mut stmt =
                            conn.prepare(&format!("{} WHERE domain = ?1 ORDER BY id", columns))?;
                        let rows = stmt
                            .query_map([&domain], mapping_from_row)?
                            .collect::<rusqlite::Result<Vec<_>>>()?;
                        rows
                    }
                };
                Ok(rows)
            })
            .await?;

        Ok(mappings)
    }

    async fn save_mapping(&self, mapping: &StoredMapping) -> Result<()> {
        let mapping = mapping.clone();
        let now = Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| {
                upsert_mapping(conn, &mapping, &now)?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    async fn save_mappings(
        &self,
        domain: &str,
        form_id: Option<&str>,
        entries: Vec<MappingEntry>,
    ) -> Result<usize> {
        let total = entries.len();
        let mappings: Vec<StoredMapping> = entries
            .into_iter()
            .filter_map(|entry| entry.into_stored(domain, form_id))
            .collect();
        if mappings.len() < total {
            tracing::warn!(
                "Skipping {} incomplete mapping(s) for {}",
                total - mappings.len(),
                domain
            );
        }

        let count = mappings.len();
        let now = Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                for mapping in &mappings {
                    upsert_mapping(&tx, mapping, &now)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await?;

        tracing::debug!("Saved {} mapping(s) for {}", count, domain);
        Ok(count)
    }

    async fn save_interpretation(
        &self,
        domain: &str,
        form_id: Option<&str>,
        result: &InterpretationResult,
    ) -> Result<()> {
        let domain = domain.to_string();
        let form_id = form_key(form_id);
        let data = serde_json::to_string(result)?;
        let confidence = result.confidence;
        let now = Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO form_interpretations
                         (domain, form_id, interpretation, confidence, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                     ON CONFLICT(domain, form_id) DO UPDATE SET
                         interpretation = excluded.interpretation,
                         confidence = excluded.confidence,
                         updated_at = excluded.updated_at",
                    params![domain, form_id, data, confidence, now],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    async fn get_interpretation(
        &self,
        domain: &str,
        form_id: Option<&str>,
    ) -> Result<Option<InterpretationResult>> {
        let domain = domain.to_string();
        let form_id = form_id.map(str::to_string);

        let data: Option<String> = self
            .conn
            .call(move |conn| {
                let data = match form_id {
                    Some(form_id) => conn
                        .query_row(
                            "SELECT interpretation FROM form_interpretations
                             WHERE domain = ?1 AND form_id = ?2",
                            params![domain, form_id],
                            |row| row.get(0),
                        )
                        .optional()?,
                    None => conn
                        .query_row(
                            "SELECT interpretation FROM form_interpretations
                             WHERE domain = ?1 ORDER BY confidence DESC, id ASC LIMIT 1",
                            [&domain],
                            |row| row.get(0),
                        )
                        .optional()?,
                };
                Ok(data)
            })
            .await?;

        data.map(|d| serde_json::from_str(&d).map_err(Error::from))
            .transpose()
    }
}
