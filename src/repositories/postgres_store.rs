//! Almacén de registros sobre PostgreSQL
//!
//! Las consultas se arman a partir de la lista de columnas de cada tabla:
//! los registros entran con `jsonb_populate_record` y salen con `to_jsonb`,
//! así no hace falta una consulta por entidad. Los cambios llegan por
//! `LISTEN record_changes`, alimentado por el trigger de la migración.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::postgres::{PgListener, PgPool};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::record_store::{
    into_record, ChangeEvent, Record, RecordStore, Table, CHANGE_CHANNEL_CAPACITY,
};
use crate::utils::errors::{AppError, AppResult};

/// Canal de NOTIFY usado por el trigger `notify_record_change`
pub const CHANGE_CHANNEL: &str = "record_changes";

pub struct PgRecordStore {
    pool: PgPool,
    changes: broadcast::Sender<ChangeEvent>,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { pool, changes }
    }

    /// Empieza a escuchar el canal de cambios y los reenvía a los suscriptores
    pub async fn start_listener(&self) -> AppResult<JoinHandle<()>> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(CHANGE_CHANNEL).await?;
        info!("✅ Escuchando cambios en el canal '{}'", CHANGE_CHANNEL);

        let changes = self.changes.clone();
        Ok(tokio::spawn(async move {
            loop {
                match listener.recv().await {
                    Ok(notification) => {
                        match serde_json::from_str::<ChangeEvent>(notification.payload()) {
                            Ok(event) => {
                                debug!("🔄 Cambio en {}: {:?}", event.table, event.kind);
                                // Sin suscriptores el envío falla y no importa
                                let _ = changes.send(event);
                            }
                            Err(e) => {
                                warn!("⚠️ Notificación de cambio inválida: {}", e);
                            }
                        }
                    }
                    Err(e) => {
                        warn!("⚠️ Error recibiendo notificaciones: {}", e);
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        }))
    }

    async fn fetch_records(&self, sql: &str) -> AppResult<Vec<Record>> {
        let rows: Vec<Value> = sqlx::query_scalar(sql).fetch_all(&self.pool).await?;
        rows.into_iter().map(into_record).collect()
    }
}

/// Columnas del registro en el orden del esquema
fn present_columns(table: Table, record: &Record) -> Vec<&'static str> {
    table
        .columns()
        .iter()
        .copied()
        .filter(|column| record.contains_key(*column))
        .collect()
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn list(&self, table: Table) -> AppResult<Vec<Record>> {
        let sql = format!(
            "SELECT to_jsonb(t) FROM {} t ORDER BY t.created_at DESC",
            table.name()
        );
        self.fetch_records(&sql).await
    }

    async fn find(&self, table: Table, id: Uuid) -> AppResult<Option<Record>> {
        let sql = format!("SELECT to_jsonb(t) FROM {} t WHERE t.id = $1", table.name());
        let row: Option<Value> = sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(into_record).transpose()
    }

    async fn find_by(&self, table: Table, column: &str, value: &Value) -> AppResult<Vec<Record>> {
        if !table.has_column(column) {
            return Err(AppError::BadRequest(format!(
                "La columna '{}' no existe en la tabla {}",
                column,
                table.name()
            )));
        }
        let sql = format!(
            "SELECT to_jsonb(t) FROM {} t WHERE (to_jsonb(t) -> $1) = $2 ORDER BY t.created_at DESC",
            table.name()
        );
        let rows: Vec<Value> = sqlx::query_scalar(&sql)
            .bind(column)
            .bind(value)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(into_record).collect()
    }

    async fn insert(&self, table: Table, mut record: Record) -> AppResult<Record> {
        record.remove("id");
        table.check_columns(&record)?;

        let columns = present_columns(table, &record);
        let sql = if columns.is_empty() {
            format!(
                "INSERT INTO {} AS t DEFAULT VALUES RETURNING to_jsonb(t)",
                table.name()
            )
        } else {
            let list = columns.join(", ");
            format!(
                "INSERT INTO {table} AS t ({list}) \
                 SELECT {list} FROM jsonb_populate_record(NULL::{table}, $1) \
                 RETURNING to_jsonb(t)",
                table = table.name(),
                list = list
            )
        };

        let row: Value = sqlx::query_scalar(&sql)
            .bind(Value::Object(record))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("❌ Error insertando en {}: {}", table, e);
                AppError::from(e)
            })?;
        into_record(row)
    }

    async fn update(&self, table: Table, id: Uuid, mut patch: Record) -> AppResult<Record> {
        patch.remove("id");
        table.check_columns(&patch)?;

        let columns = present_columns(table, &patch);
        if columns.is_empty() {
            return self
                .find(table, id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Registro {} no encontrado en {}", id, table)));
        }

        let list = columns.join(", ");
        let sql = format!(
            "UPDATE {table} AS t SET ({list}) = \
             (SELECT {list} FROM jsonb_populate_record(NULL::{table}, $2)) \
             WHERE t.id = $1 RETURNING to_jsonb(t)",
            table = table.name(),
            list = list
        );

        let row: Option<Value> = sqlx::query_scalar(&sql)
            .bind(id)
            .bind(Value::Object(patch))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("❌ Error actualizando {} en {}: {}", id, table, e);
                AppError::from(e)
            })?;

        match row {
            Some(row) => into_record(row),
            None => Err(AppError::NotFound(format!(
                "Registro {} no encontrado en {}",
                id, table
            ))),
        }
    }

    async fn delete(&self, table: Table, id: Uuid) -> AppResult<bool> {
        let sql = format!("DELETE FROM {} WHERE id = $1", table.name());
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn historic_total(&self) -> AppResult<Decimal> {
        let total: Option<Decimal> = sqlx::query_scalar("SELECT repairs_historic_total()")
            .fetch_one(&self.pool)
            .await?;
        Ok(total.unwrap_or(Decimal::ZERO))
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }
}
