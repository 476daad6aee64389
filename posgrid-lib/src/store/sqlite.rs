//! SQLite-backed persistent store implementation.

use std::path::Path;

use async_sqlite::Client;
use async_sqlite::ClientBuilder;
use async_sqlite::JournalMode;
use async_sqlite::rusqlite;
use async_trait::async_trait;
use chrono::TimeZone;
use chrono::Utc;

use super::PreferenceBackend;
use super::PresetBackend;
use crate::error::StoreError;
use crate::identity::TableIdentity;
use crate::presets::NewPreset;
use crate::presets::Preset;
use crate::presets::PresetScope;
use crate::state::Preference;

/// Preferences and presets persisted in a SQLite database.
///
/// Payloads are stored as JSON text. Uses WAL journal mode for file databases.
///
/// # Example
///
/// ```ignore
/// use posgrid_lib::store::SqliteStore;
///
/// let store = SqliteStore::open("posgrid.db").await?;
/// ```
pub struct SqliteStore {
    client: Client,
}

/// A preset row before its JSON payload is decoded.
struct PresetRow {
    id: String,
    name: String,
    scope: String,
    state: String,
    owner: String,
    created_at: i64,
}

impl SqliteStore {
    /// Opens a database at the specified path, creating tables if needed.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let client = ClientBuilder::new()
            .path(path)
            .journal_mode(JournalMode::Wal)
            .open()
            .await?;

        Self::init_schema(&client).await?;

        Ok(Self { client })
    }

    /// Opens an in-memory database. Data is lost when the store is dropped.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let client = ClientBuilder::new().path(":memory:").open().await?;

        Self::init_schema(&client).await?;

        Ok(Self { client })
    }

    async fn init_schema(client: &Client) -> Result<(), StoreError> {
        client
            .conn(|conn| {
                conn.execute_batch(
                    "CREATE TABLE IF NOT EXISTS preferences (
                        table_id TEXT NOT NULL,
                        tenant_id TEXT NOT NULL,
                        user_id TEXT NOT NULL,
                        payload TEXT NOT NULL,
                        updated_at INTEGER NOT NULL,
                        PRIMARY KEY (table_id, tenant_id, user_id)
                    );
                    CREATE TABLE IF NOT EXISTS presets (
                        id TEXT PRIMARY KEY,
                        table_id TEXT NOT NULL,
                        tenant_id TEXT NOT NULL,
                        owner TEXT NOT NULL,
                        name TEXT NOT NULL,
                        scope TEXT NOT NULL,
                        state TEXT NOT NULL,
                        created_at INTEGER NOT NULL
                    );
                    CREATE INDEX IF NOT EXISTS idx_presets_table
                        ON presets(table_id, tenant_id);",
                )
            })
            .await?;
        Ok(())
    }

    /// Number of stored presets across all tables.
    pub async fn preset_count(&self) -> Result<usize, StoreError> {
        let count = self
            .client
            .conn(|conn| {
                conn.query_row("SELECT COUNT(*) FROM presets", [], |row| row.get::<_, i64>(0))
            })
            .await?;
        Ok(count as usize)
    }
}

fn parse_scope(scope: &str) -> Result<PresetScope, StoreError> {
    match scope {
        "USER" => Ok(PresetScope::User),
        "ROLE" => Ok(PresetScope::Role),
        other => Err(StoreError::backend(format!("unknown preset scope: {}", other))),
    }
}

impl PresetRow {
    fn decode(self) -> Result<Preset, StoreError> {
        let created_at = Utc
            .timestamp_millis_opt(self.created_at)
            .single()
            .ok_or_else(|| StoreError::backend(format!("invalid timestamp: {}", self.created_at)))?;

        Ok(Preset {
            id: self.id,
            name: self.name,
            scope: parse_scope(&self.scope)?,
            state: serde_json::from_str(&self.state)?,
            owner: self.owner,
            created_at,
        })
    }
}

#[async_trait]
impl PreferenceBackend for SqliteStore {
    async fn load(&self, identity: &TableIdentity) -> Result<Option<Preference>, StoreError> {
        let identity = identity.clone();

        let payload = self
            .client
            .conn(move |conn| {
                let result = conn.query_row(
                    "SELECT payload FROM preferences
                     WHERE table_id = ? AND tenant_id = ? AND user_id = ?",
                    rusqlite::params![identity.table_id, identity.tenant_id, identity.user_id],
                    |row| row.get::<_, String>(0),
                );
                match result {
                    Ok(payload) => Ok(Some(payload)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e),
                }
            })
            .await?;

        payload
            .map(|payload| serde_json::from_str(&payload))
            .transpose()
            .map_err(StoreError::from)
    }

    async fn upsert(
        &self,
        identity: &TableIdentity,
        preference: &Preference,
    ) -> Result<(), StoreError> {
        let identity = identity.clone();
        let payload = serde_json::to_string(preference)?;
        let updated_at = Utc::now().timestamp_millis();

        self.client
            .conn(move |conn| {
                conn.execute(
                    "INSERT OR REPLACE INTO preferences
                     (table_id, tenant_id, user_id, payload, updated_at)
                     VALUES (?, ?, ?, ?, ?)",
                    rusqlite::params![
                        identity.table_id,
                        identity.tenant_id,
                        identity.user_id,
                        payload,
                        updated_at
                    ],
                )
            })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl PresetBackend for SqliteStore {
    async fn list(&self, identity: &TableIdentity) -> Result<Vec<Preset>, StoreError> {
        let identity = identity.clone();

        let rows = self
            .client
            .conn(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, name, scope, state, owner, created_at FROM presets
                     WHERE table_id = ? AND tenant_id = ? AND (scope = 'ROLE' OR owner = ?)
                     ORDER BY created_at, rowid",
                )?;
                let rows = stmt
                    .query_map(
                        rusqlite::params![identity.table_id, identity.tenant_id, identity.user_id],
                        |row| {
                            Ok(PresetRow {
                                id: row.get(0)?,
                                name: row.get(1)?,
                                scope: row.get(2)?,
                                state: row.get(3)?,
                                owner: row.get(4)?,
                                created_at: row.get(5)?,
                            })
                        },
                    )?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;

        rows.into_iter().map(PresetRow::decode).collect()
    }

    async fn create(
        &self,
        identity: &TableIdentity,
        preset: NewPreset,
    ) -> Result<Preset, StoreError> {
        let preset = Preset::from_new(preset, identity.user_id.clone());
        let state = serde_json::to_string(&preset.state)?;
        let identity = identity.clone();
        let row = (
            preset.id.clone(),
            preset.name.clone(),
            preset.scope.as_str(),
            preset.owner.clone(),
            preset.created_at.timestamp_millis(),
        );

        self.client
            .conn(move |conn| {
                let (id, name, scope, owner, created_at) = row;
                conn.execute(
                    "INSERT INTO presets
                     (id, table_id, tenant_id, owner, name, scope, state, created_at)
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                    rusqlite::params![
                        id,
                        identity.table_id,
                        identity.tenant_id,
                        owner,
                        name,
                        scope,
                        state,
                        created_at
                    ],
                )
            })
            .await?;

        Ok(preset)
    }
}
