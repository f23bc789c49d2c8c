//! SQLite-backed credential store
//!
//! Rows are keyed by the credential digest. Scopes and the raw inspection
//! payload are stored as JSON text, timestamps as epoch milliseconds.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use graphgate_core::CredentialStore;
use graphgate_domain::{CredentialKind, CredentialRecord, GatewayError, Result};
use rusqlite::{params, OptionalExtension, Row};
use serde_json::{Map, Value};
use tokio::task;
use tracing::debug;

use super::manager::{map_sql_error, DbManager};
use crate::errors::InfraError;

/// SQLite implementation of [`CredentialStore`].
pub struct SqliteCredentialStore {
    db: Arc<DbManager>,
}

impl SqliteCredentialStore {
    /// Create a new repository instance
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn get(&self, hash: &str) -> Result<Option<CredentialRecord>> {
        let db = Arc::clone(&self.db);
        let hash = hash.to_string();

        task::spawn_blocking(move || -> Result<Option<CredentialRecord>> {
            let conn = db.get_connection()?;
            let row = conn
                .query_row(
                    "SELECT hash, kind, subject_id, scopes, app_id, issued_at, expires_at, raw_metadata
                     FROM credentials WHERE hash = ?1",
                    params![&hash],
                    RawCredentialRow::from_row,
                )
                .optional()
                .map_err(map_sql_error)?;

            row.map(RawCredentialRow::into_record).transpose()
        })
        .await
        .map_err(map_join_error)?
    }

    async fn upsert(&self, record: &CredentialRecord) -> Result<()> {
        let db = Arc::clone(&self.db);
        let record = record.clone();

        task::spawn_blocking(move || -> Result<()> {
            let scopes = serde_json::to_string(&record.scopes).map_err(map_json_error)?;
            let raw_metadata = serde_json::to_string(&record.raw_metadata).map_err(map_json_error)?;

            let conn = db.get_connection()?;
            conn.execute(
                "INSERT INTO credentials
                    (hash, kind, subject_id, scopes, app_id, issued_at, expires_at, raw_metadata)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(hash) DO UPDATE SET
                    kind = excluded.kind,
                    subject_id = excluded.subject_id,
                    scopes = excluded.scopes,
                    app_id = excluded.app_id,
                    issued_at = excluded.issued_at,
                    expires_at = excluded.expires_at,
                    raw_metadata = excluded.raw_metadata",
                params![
                    record.hash,
                    record.kind.to_string(),
                    record.subject_id,
                    scopes,
                    record.app_id,
                    record.issued_at.timestamp_millis(),
                    record.expires_at.map(|at| at.timestamp_millis()),
                    raw_metadata,
                ],
            )
            .map_err(map_sql_error)?;

            debug!(credential_hash = %record.hash, kind = %record.kind, "credential row upserted");
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }
}

/// Column values as read, decoded outside the rusqlite row callback so JSON
/// failures keep their own error.
struct RawCredentialRow {
    hash: String,
    kind: String,
    subject_id: String,
    scopes: String,
    app_id: String,
    issued_at: i64,
    expires_at: Option<i64>,
    raw_metadata: String,
}

impl RawCredentialRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            hash: row.get(0)?,
            kind: row.get(1)?,
            subject_id: row.get(2)?,
            scopes: row.get(3)?,
            app_id: row.get(4)?,
            issued_at: row.get(5)?,
            expires_at: row.get(6)?,
            raw_metadata: row.get(7)?,
        })
    }

    fn into_record(self) -> Result<CredentialRecord> {
        let scopes: BTreeSet<String> = serde_json::from_str(&self.scopes).map_err(map_json_error)?;
        let raw_metadata: Map<String, Value> =
            serde_json::from_str(&self.raw_metadata).map_err(map_json_error)?;
        let kind = self.kind.parse::<CredentialKind>().map_err(|_| {
            GatewayError::remote(format!("stored credential kind is unknown: {}", self.kind))
                .with_detail("source", crate::errors::conversions::CREDENTIAL_STORE_SOURCE)
        })?;

        Ok(CredentialRecord {
            hash: self.hash,
            kind,
            subject_id: self.subject_id,
            scopes,
            app_id: self.app_id,
            issued_at: from_millis(self.issued_at)?,
            expires_at: self.expires_at.map(from_millis).transpose()?,
            raw_metadata,
        })
    }
}

fn from_millis(millis: i64) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(millis).ok_or_else(|| {
        GatewayError::remote(format!("stored timestamp out of range: {millis}"))
            .with_detail("source", crate::errors::conversions::CREDENTIAL_STORE_SOURCE)
    })
}

fn map_json_error(err: serde_json::Error) -> GatewayError {
    GatewayError::from(InfraError::from(err))
}

fn map_join_error(err: task::JoinError) -> GatewayError {
    GatewayError::from(InfraError::from(err))
}
