//! SQLite alarm store implementation
//!
//! Definitions are stored as one row per alarm identity. The full definition
//! is kept as a JSON document column; tenant/region/name/state are typed
//! columns so scope listing and state filtering stay indexable without a
//! schema migration every time the definition grows a field.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Row, Sqlite};
use tracing::{debug, info, instrument};

use super::backend::{AlarmStore, HealthStatus};
use super::error::{StoreError, StoreResult};
use crate::{AlarmDefinition, AlarmRef, Scope};

/// SQLite alarm store
///
/// Embedded, single-file persistence. Suitable for a single hub process;
/// the store survives restarts while scheduler state does not, which is
/// exactly what the post-load restart sweep rebuilds from.
pub struct SqliteAlarmStore {
    pool: Pool<Sqlite>,
    db_path: String,
}

impl SqliteAlarmStore {
    /// Open (creating if missing) the database and run migrations.
    #[instrument(skip_all)]
    pub async fn new(db_path: impl AsRef<Path>) -> StoreResult<Self> {
        let db_path_str = db_path.as_ref().to_string_lossy().to_string();

        info!("initializing SQLite alarm store at: {}", db_path_str);

        let options = SqliteConnectOptions::new()
            .filename(&db_path_str)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;

        debug!("running database migrations");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::MigrationFailed(e.to_string()))?;

        Ok(Self {
            pool,
            db_path: db_path_str,
        })
    }

    fn row_to_definition(row: &sqlx::sqlite::SqliteRow) -> StoreResult<AlarmDefinition> {
        let document: String = row.get("document");
        let definition: AlarmDefinition = serde_json::from_str(&document).map_err(|e| {
            StoreError::SerializationError(format!("failed to deserialize alarm document: {}", e))
        })?;
        Ok(definition)
    }
}

#[async_trait]
impl AlarmStore for SqliteAlarmStore {
    #[instrument(skip(self), fields(scope = %scope))]
    async fn get(
        &self,
        scope: &Scope,
        alarm_ref: &AlarmRef,
    ) -> StoreResult<Option<AlarmDefinition>> {
        let row = sqlx::query(
            r#"
            SELECT document
            FROM alarms
            WHERE tenant = ? AND region = ? AND alarm_ref = ?
            "#,
        )
        .bind(&scope.tenant)
        .bind(&scope.region)
        .bind(alarm_ref.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        row.as_ref().map(Self::row_to_definition).transpose()
    }

    #[instrument(skip(self, definition), fields(scope = %scope, alarm = %definition.name))]
    async fn put(&self, scope: &Scope, definition: AlarmDefinition) -> StoreResult<()> {
        let document = serde_json::to_string(&definition).map_err(|e| {
            StoreError::SerializationError(format!("failed to serialize alarm document: {}", e))
        })?;

        sqlx::query(
            r#"
            INSERT INTO alarms (tenant, region, name, alarm_ref, state, updated_at, document)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (tenant, region, name) DO UPDATE SET
                alarm_ref = excluded.alarm_ref,
                state = excluded.state,
                updated_at = excluded.updated_at,
                document = excluded.document
            "#,
        )
        .bind(&scope.tenant)
        .bind(&scope.region)
        .bind(&definition.name)
        .bind(definition.alarm_ref().as_str())
        .bind(definition.state.as_str())
        .bind(definition.state_updated_at.timestamp_millis())
        .bind(document)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    #[instrument(skip(self), fields(scope = %scope))]
    async fn delete(&self, scope: &Scope, alarm_ref: &AlarmRef) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM alarms
            WHERE tenant = ? AND region = ? AND alarm_ref = ?
            "#,
        )
        .bind(&scope.tenant)
        .bind(&scope.region)
        .bind(alarm_ref.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(scope = %scope))]
    async fn list_all(&self, scope: &Scope) -> StoreResult<Vec<AlarmDefinition>> {
        let rows = sqlx::query(
            r#"
            SELECT document
            FROM alarms
            WHERE tenant = ? AND region = ?
            ORDER BY name ASC
            "#,
        )
        .bind(&scope.tenant)
        .bind(&scope.region)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        rows.iter().map(Self::row_to_definition).collect()
    }

    #[instrument(skip(self))]
    async fn scopes(&self) -> StoreResult<Vec<Scope>> {
        let rows = sqlx::query("SELECT DISTINCT tenant, region FROM alarms")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|row| Scope {
                tenant: row.get("tenant"),
                region: row.get("region"),
            })
            .collect())
    }

    async fn health_check(&self) -> StoreResult<HealthStatus> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM alarms")
            .fetch_one(&self.pool)
            .await;

        match row {
            Ok(row) => {
                let total: i64 = row.get("total");
                Ok(HealthStatus {
                    healthy: true,
                    message: "SQLite store operational".to_string(),
                    metadata: HashMap::from([
                        ("backend".to_string(), "sqlite".to_string()),
                        ("path".to_string(), self.db_path.clone()),
                        ("total_alarms".to_string(), total.to_string()),
                    ]),
                })
            }
            Err(e) => Ok(HealthStatus {
                healthy: false,
                message: format!("SQLite store unhealthy: {}", e),
                metadata: HashMap::from([("backend".to_string(), "sqlite".to_string())]),
            }),
        }
    }

    async fn close(&self) -> StoreResult<()> {
        debug!("closing SQLite alarm store");
        self.pool.close().await;
        Ok(())
    }
}
