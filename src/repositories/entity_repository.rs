//! Repositorio tipado sobre el almacén de registros

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use super::record_store::{into_record, Record, RecordStore, Table};
use crate::models::{Brand, Client, DeviceModel, DeviceType, RepairOrder, UserProfile};
use crate::utils::errors::{AppError, AppResult};

/// Entidad asociada a una tabla
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    const TABLE: Table;
}

impl Entity for Client {
    const TABLE: Table = Table::Clients;
}

impl Entity for RepairOrder {
    const TABLE: Table = Table::Repairs;
}

impl Entity for UserProfile {
    const TABLE: Table = Table::Users;
}

impl Entity for Brand {
    const TABLE: Table = Table::Brands;
}

impl Entity for DeviceModel {
    const TABLE: Table = Table::Models;
}

impl Entity for DeviceType {
    const TABLE: Table = Table::DeviceTypes;
}

pub struct EntityRepository<T> {
    store: Arc<dyn RecordStore>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for EntityRepository<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> EntityRepository<T> {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    fn decode(record: Record) -> AppResult<T> {
        serde_json::from_value(Value::Object(record)).map_err(|e| {
            AppError::Internal(format!("Registro inválido en {}: {}", T::TABLE, e))
        })
    }

    /// Todos los registros, más recientes primero.
    ///
    /// Los registros que no se pueden interpretar se omiten con una advertencia.
    pub async fn list(&self) -> AppResult<Vec<T>> {
        let records = self.store.list(T::TABLE).await?;
        Ok(records
            .into_iter()
            .filter_map(|record| match Self::decode(record) {
                Ok(entity) => Some(entity),
                Err(e) => {
                    warn!("⚠️ {}", e);
                    None
                }
            })
            .collect())
    }

    pub async fn find(&self, id: Uuid) -> AppResult<Option<T>> {
        self.store
            .find(T::TABLE, id)
            .await?
            .map(Self::decode)
            .transpose()
    }

    pub async fn find_by(&self, column: &str, value: Value) -> AppResult<Vec<T>> {
        self.store
            .find_by(T::TABLE, column, &value)
            .await?
            .into_iter()
            .map(Self::decode)
            .collect()
    }

    /// Inserta cualquier valor serializable como objeto JSON
    pub async fn insert<P: Serialize + Sync>(&self, payload: &P) -> AppResult<T> {
        let record = into_record(serde_json::to_value(payload)?)?;
        Self::decode(self.store.insert(T::TABLE, record).await?)
    }

    pub async fn update(&self, id: Uuid, patch: Record) -> AppResult<T> {
        Self::decode(self.store.update(T::TABLE, id, patch).await?)
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        self.store.delete(T::TABLE, id).await
    }
}
