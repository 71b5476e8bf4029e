//! Almacén de registros en memoria
//!
//! Se usa en tests y cuando no hay `DATABASE_URL`. Reproduce lo que hace el
//! esquema de PostgreSQL: valores por defecto, `NOT NULL`, `UNIQUE`, claves
//! foráneas con `ON DELETE SET NULL` y notificación de cada cambio.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::{broadcast, RwLock};
use tracing::warn;
use uuid::Uuid;

use super::record_store::{
    record_id, ChangeEvent, ChangeKind, Record, RecordStore, Table, CHANGE_CHANNEL_CAPACITY,
};
use crate::models::RepairOrder;
use crate::services::repair_order::compute_totals;
use crate::utils::errors::{AppError, AppResult, StoreFailure};

pub struct MemoryRecordStore {
    tables: RwLock<HashMap<Table, Vec<Record>>>,
    changes: broadcast::Sender<ChangeEvent>,
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

fn created_at(record: &Record) -> Option<DateTime<Utc>> {
    record
        .get("created_at")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc))
}

fn not_found(table: Table, id: Uuid) -> AppError {
    AppError::NotFound(format!("Registro {} no encontrado en {}", id, table))
}

/// Error equivalente a una violación de clave foránea de PostgreSQL
fn foreign_key_violation(table: Table, column: &str, target: Table, value: &str) -> AppError {
    AppError::Constraint(StoreFailure {
        message: format!(
            "insert or update on table \"{}\" violates foreign key constraint \"{}_{}_fkey\"",
            table, table, column
        ),
        status: Some(409),
        code: Some("23503".to_string()),
        details: Some(format!(
            "Key ({})=({}) is not present in table \"{}\".",
            column, value, target
        )),
        hint: None,
        action: None,
    })
}

/// Error equivalente a una violación de `NOT NULL`
fn not_null_violation(table: Table, column: &str) -> AppError {
    AppError::Constraint(StoreFailure {
        message: format!(
            "null value in column \"{}\" of relation \"{}\" violates not-null constraint",
            column, table
        ),
        status: Some(400),
        code: Some("23502".to_string()),
        details: None,
        hint: None,
        action: None,
    })
}

/// Error equivalente a una violación de `UNIQUE`
fn unique_violation(table: Table, column: &str, value: &Value) -> AppError {
    let shown = value.as_str().map(str::to_string).unwrap_or_else(|| value.to_string());
    AppError::Constraint(StoreFailure {
        message: format!(
            "duplicate key value violates unique constraint \"{}_{}_key\"",
            table, column
        ),
        status: Some(409),
        code: Some("23505".to_string()),
        details: Some(format!("Key ({})=({}) already exists.", column, shown)),
        hint: None,
        action: None,
    })
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            tables: RwLock::new(HashMap::new()),
            changes,
        }
    }

    fn notify(&self, table: Table, kind: ChangeKind, id: Option<Uuid>) {
        // Sin suscriptores el envío falla y no importa
        let _ = self.changes.send(ChangeEvent { table, kind, id });
    }

    /// `NOT NULL` y `UNIQUE` sobre la fila resultante. `id` es la fila que
    /// se actualiza, que no choca consigo misma.
    fn check_row(
        tables: &HashMap<Table, Vec<Record>>,
        table: Table,
        row: &Record,
        id: Option<Uuid>,
    ) -> AppResult<()> {
        for column in table.required_columns() {
            if row.get(*column).map_or(true, Value::is_null) {
                return Err(not_null_violation(table, column));
            }
        }
        let existing = tables.get(&table).map(Vec::as_slice).unwrap_or_default();
        for column in table.unique_columns() {
            let Some(value) = row.get(*column).filter(|v| !v.is_null()) else {
                continue;
            };
            let taken = existing
                .iter()
                .filter(|other| id.is_none() || record_id(other) != id)
                .any(|other| other.get(*column) == Some(value));
            if taken {
                return Err(unique_violation(table, column, value));
            }
        }
        Ok(())
    }

    /// Verifica las referencias del registro contra las tablas destino
    fn check_references(
        tables: &HashMap<Table, Vec<Record>>,
        table: Table,
        record: &Record,
    ) -> AppResult<()> {
        for (column, target) in table.references() {
            let Some(value) = record.get(*column) else {
                continue;
            };
            let reference = match value {
                Value::Null => continue,
                Value::String(s) => s,
                other => {
                    return Err(AppError::DataAccess(StoreFailure {
                        message: format!("invalid input syntax for type uuid: \"{}\"", other),
                        status: Some(400),
                        code: Some("22P02".to_string()),
                        ..Default::default()
                    }))
                }
            };
            let Ok(reference_id) = Uuid::parse_str(reference) else {
                return Err(AppError::DataAccess(StoreFailure {
                    message: format!("invalid input syntax for type uuid: \"{}\"", reference),
                    status: Some(400),
                    code: Some("22P02".to_string()),
                    ..Default::default()
                }));
            };
            let exists = tables
                .get(target)
                .map(|rows| rows.iter().any(|r| record_id(r) == Some(reference_id)))
                .unwrap_or(false);
            if !exists {
                return Err(foreign_key_violation(table, column, *target, reference));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn list(&self, table: Table) -> AppResult<Vec<Record>> {
        let tables = self.tables.read().await;
        let mut rows = tables.get(&table).cloned().unwrap_or_default();
        rows.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
        Ok(rows)
    }

    async fn find(&self, table: Table, id: Uuid) -> AppResult<Option<Record>> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(&table)
            .and_then(|rows| rows.iter().find(|r| record_id(r) == Some(id)))
            .cloned())
    }

    async fn find_by(&self, table: Table, column: &str, value: &Value) -> AppResult<Vec<Record>> {
        if !table.has_column(column) {
            return Err(AppError::BadRequest(format!(
                "La columna '{}' no existe en la tabla {}",
                column,
                table.name()
            )));
        }
        Ok(self
            .list(table)
            .await?
            .into_iter()
            .filter(|r| r.get(column) == Some(value))
            .collect())
    }

    async fn insert(&self, table: Table, mut record: Record) -> AppResult<Record> {
        record.remove("id");
        table.check_columns(&record)?;

        let mut tables = self.tables.write().await;
        Self::check_references(&tables, table, &record)?;

        let id = Uuid::new_v4();
        let mut stored = Record::new();
        for column in table.columns() {
            let value = match *column {
                "id" => Value::String(id.to_string()),
                "created_at" => match record.remove("created_at") {
                    Some(Value::Null) | None => Value::String(Utc::now().to_rfc3339()),
                    Some(value) => value,
                },
                other => record
                    .remove(other)
                    .unwrap_or_else(|| table.column_default(other)),
            };
            stored.insert(column.to_string(), value);
        }
        Self::check_row(&tables, table, &stored, None)?;

        tables.entry(table).or_default().insert(0, stored.clone());
        drop(tables);

        self.notify(table, ChangeKind::Insert, Some(id));
        Ok(stored)
    }

    async fn update(&self, table: Table, id: Uuid, mut patch: Record) -> AppResult<Record> {
        patch.remove("id");
        table.check_columns(&patch)?;

        let mut tables = self.tables.write().await;
        Self::check_references(&tables, table, &patch)?;

        let current = tables
            .get(&table)
            .and_then(|rows| rows.iter().find(|r| record_id(r) == Some(id)))
            .ok_or_else(|| not_found(table, id))?;
        if patch.is_empty() {
            return Ok(current.clone());
        }
        let mut updated = current.clone();
        for (column, value) in patch {
            updated.insert(column, value);
        }
        Self::check_row(&tables, table, &updated, Some(id))?;

        if let Some(row) = tables
            .get_mut(&table)
            .and_then(|rows| rows.iter_mut().find(|r| record_id(r) == Some(id)))
        {
            *row = updated.clone();
        }
        drop(tables);

        self.notify(table, ChangeKind::Update, Some(id));
        Ok(updated)
    }

    async fn delete(&self, table: Table, id: Uuid) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(&table) else {
            return Ok(false);
        };
        let before = rows.len();
        rows.retain(|r| record_id(r) != Some(id));
        if rows.len() == before {
            return Ok(false);
        }

        // ON DELETE SET NULL en las tablas que referencian a esta
        let id_text = Value::String(id.to_string());
        let mut orphaned = Vec::new();
        for referencing in Table::ALL {
            for (column, target) in referencing.references() {
                if *target != table {
                    continue;
                }
                if let Some(rows) = tables.get_mut(&referencing) {
                    for row in rows.iter_mut().filter(|r| r.get(*column) == Some(&id_text)) {
                        row.insert(column.to_string(), Value::Null);
                        orphaned.push((referencing, record_id(row)));
                    }
                }
            }
        }
        drop(tables);

        self.notify(table, ChangeKind::Delete, Some(id));
        for (referencing, row_id) in orphaned {
            self.notify(referencing, ChangeKind::Update, row_id);
        }
        Ok(true)
    }

    async fn historic_total(&self) -> AppResult<Decimal> {
        let repairs = self.list(Table::Repairs).await?;
        let mut total = Decimal::ZERO;
        for record in repairs {
            match serde_json::from_value::<RepairOrder>(Value::Object(record)) {
                Ok(order) => {
                    total = total
                        .checked_add(compute_totals(&order).total)
                        .unwrap_or(total);
                }
                Err(e) => warn!("⚠️ Reparación ilegible excluida del total histórico: {}", e),
            }
        }
        Ok(total)
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::record_store::into_record;
    use serde_json::json;

    fn record(value: Value) -> Record {
        into_record(value).unwrap()
    }

    #[tokio::test]
    async fn test_insert_assigns_id_timestamp_and_defaults() {
        let store = MemoryRecordStore::new();
        let stored = store
            .insert(Table::Repairs, record(json!({ "nro": "RSMS-000001" })))
            .await
            .unwrap();

        assert!(record_id(&stored).is_some());
        assert!(created_at(&stored).is_some());
        assert_eq!(stored["servicios"], json!([]));
        assert_eq!(stored["falla"], Value::Null);
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let store = MemoryRecordStore::new();
        store
            .insert(Table::Brands, record(json!({ "name": "Dell", "created_at": "2024-01-01T00:00:00Z" })))
            .await
            .unwrap();
        store
            .insert(Table::Brands, record(json!({ "name": "HP", "created_at": "2024-06-01T00:00:00Z" })))
            .await
            .unwrap();
        store
            .insert(Table::Brands, record(json!({ "name": "Lenovo", "created_at": "2023-06-01T00:00:00Z" })))
            .await
            .unwrap();

        let names: Vec<_> = store
            .list(Table::Brands)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["HP", "Dell", "Lenovo"]);
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_not_found() {
        let store = MemoryRecordStore::new();
        let err = store
            .update(Table::Clients, Uuid::new_v4(), record(json!({ "first_name": "Ana" })))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_foreign_key_violation_reports_details() {
        let store = MemoryRecordStore::new();
        let missing = Uuid::new_v4();
        let err = store
            .insert(Table::Repairs, record(json!({ "client_id": missing.to_string() })))
            .await
            .unwrap_err();
        match err {
            AppError::Constraint(failure) => {
                assert_eq!(failure.code.as_deref(), Some("23503"));
                assert!(failure.details.unwrap().contains(&missing.to_string()));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_deleting_brand_orphans_models() {
        let store = MemoryRecordStore::new();
        let brand = store
            .insert(Table::Brands, record(json!({ "name": "Dell" })))
            .await
            .unwrap();
        let brand_id = record_id(&brand).unwrap();
        let model = store
            .insert(
                Table::Models,
                record(json!({ "name": "Latitude 5420", "brand_id": brand_id.to_string() })),
            )
            .await
            .unwrap();

        assert!(store.delete(Table::Brands, brand_id).await.unwrap());

        let model = store
            .find(Table::Models, record_id(&model).unwrap())
            .await
            .unwrap()
            .expect("model must survive brand deletion");
        assert_eq!(model["brand_id"], Value::Null);
        assert_eq!(model["name"], "Latitude 5420");
    }

    #[tokio::test]
    async fn test_delete_missing_returns_false() {
        let store = MemoryRecordStore::new();
        assert!(!store.delete(Table::Users, Uuid::new_v4()).await.unwrap());
    }

    fn constraint_code(err: AppError) -> Option<String> {
        match err {
            AppError::Constraint(failure) => failure.code,
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_duplicate_user_email_is_rejected() {
        let store = MemoryRecordStore::new();
        store
            .insert(Table::Users, record(json!({ "email": "a@valpotec.cl", "role": "admin" })))
            .await
            .unwrap();

        let err = store
            .insert(Table::Users, record(json!({ "email": "a@valpotec.cl", "role": "worker" })))
            .await
            .unwrap_err();
        assert_eq!(constraint_code(err).as_deref(), Some("23505"));

        let rows = store
            .find_by(Table::Users, "email", &json!("a@valpotec.cl"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["role"], "admin");
    }

    #[tokio::test]
    async fn test_update_to_taken_email_is_rejected() {
        let store = MemoryRecordStore::new();
        let first = store
            .insert(Table::Users, record(json!({ "email": "a@valpotec.cl" })))
            .await
            .unwrap();
        let second = store
            .insert(Table::Users, record(json!({ "email": "b@valpotec.cl" })))
            .await
            .unwrap();

        let same = store
            .update(Table::Users, record_id(&first).unwrap(), record(json!({ "email": "a@valpotec.cl" })))
            .await;
        assert!(same.is_ok());

        let err = store
            .update(Table::Users, record_id(&second).unwrap(), record(json!({ "email": "a@valpotec.cl" })))
            .await
            .unwrap_err();
        assert_eq!(constraint_code(err).as_deref(), Some("23505"));
        let second = store.find(Table::Users, record_id(&second).unwrap()).await.unwrap().unwrap();
        assert_eq!(second["email"], "b@valpotec.cl");
    }

    #[tokio::test]
    async fn test_not_null_columns_are_enforced() {
        let store = MemoryRecordStore::new();
        let err = store
            .insert(Table::Users, record(json!({ "role": "admin" })))
            .await
            .unwrap_err();
        assert_eq!(constraint_code(err).as_deref(), Some("23502"));

        let err = store
            .insert(Table::Brands, record(json!({ "name": null })))
            .await
            .unwrap_err();
        assert_eq!(constraint_code(err).as_deref(), Some("23502"));

        let brand = store
            .insert(Table::Brands, record(json!({ "name": "Dell" })))
            .await
            .unwrap();
        let err = store
            .update(Table::Brands, record_id(&brand).unwrap(), record(json!({ "name": null })))
            .await
            .unwrap_err();
        assert_eq!(constraint_code(err).as_deref(), Some("23502"));
        assert!(store.list(Table::Users).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_changes_are_broadcast() {
        let store = MemoryRecordStore::new();
        let mut rx = store.subscribe();
        let stored = store
            .insert(Table::Clients, record(json!({ "first_name": "Ana" })))
            .await
            .unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.table, Table::Clients);
        assert_eq!(event.kind, ChangeKind::Insert);
        assert_eq!(event.id, record_id(&stored));
    }

    #[tokio::test]
    async fn test_historic_total_sums_repair_totals() {
        let store = MemoryRecordStore::new();
        store
            .insert(
                Table::Repairs,
                record(json!({
                    "servicios": [{ "id": "a", "description": "Servicio", "value": 1000 }],
                    "repuestos": [{ "id": "b", "name": "Repuesto", "price": 500 }]
                })),
            )
            .await
            .unwrap();
        store
            .insert(
                Table::Repairs,
                record(json!({ "servicios": [{ "id": "c", "description": "x", "value": "100" }] })),
            )
            .await
            .unwrap();

        // 1785.00 + 119.00
        assert_eq!(store.historic_total().await.unwrap(), Decimal::new(190400, 2));
    }
}
