use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::dto::client_dto::{CreateClientRequest, UpdateClientRequest};
use crate::models::Client;
use crate::repositories::record_store::Record;
use crate::repositories::{EntityRepository, RecordStore};
use crate::utils::errors::{not_found_error, AppResult};
use crate::utils::validation::clean_optional;

/// Servicio de clientes
#[derive(Clone)]
pub struct ClientService {
    clients: EntityRepository<Client>,
}

impl ClientService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            clients: EntityRepository::new(store),
        }
    }

    pub async fn list(&self) -> AppResult<Vec<Client>> {
        self.clients.list().await.map_err(|e| {
            error!("❌ Error cargando clientes: {}", e);
            e.during("Error cargando clientes")
        })
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Client> {
        self.clients
            .find(id)
            .await
            .map_err(|e| e.during("Error cargando cliente"))?
            .ok_or_else(|| not_found_error("Cliente", &id.to_string()))
    }

    pub async fn create(&self, request: CreateClientRequest) -> AppResult<Client> {
        let row = json!({
            "first_name": request.first_name.trim(),
            "middle_name": clean_optional(request.middle_name),
            "last_name": clean_optional(request.last_name),
            "document": clean_optional(request.document),
            "email": clean_optional(request.email),
            "contact": clean_optional(request.contact),
            "address": clean_optional(request.address),
        });

        let created = self.clients.insert(&row).await.map_err(|e| {
            error!("❌ Error guardando cliente: {}", e);
            e.during("Error guardando cliente")
        })?;
        info!("💾 Cliente creado: {}", created.display_name());
        Ok(created)
    }

    /// Actualiza los campos presentes; un texto vacío limpia el campo
    pub async fn update(&self, id: Uuid, request: UpdateClientRequest) -> AppResult<Client> {
        let fields = [
            ("first_name", request.first_name),
            ("middle_name", request.middle_name),
            ("last_name", request.last_name),
            ("document", request.document),
            ("email", request.email),
            ("contact", request.contact),
            ("address", request.address),
        ];
        let mut patch = Record::new();
        for (column, value) in fields {
            if let Some(value) = value {
                patch.insert(column.to_string(), json!(clean_optional(Some(value))));
            }
        }

        let updated = self.clients.update(id, patch).await.map_err(|e| {
            error!("❌ Error actualizando cliente {}: {}", id, e);
            e.during("Error guardando cliente")
        })?;
        info!("💾 Cliente actualizado: {}", id);
        Ok(updated)
    }

    /// Elimina el cliente; sus reparaciones quedan sin cliente asignado
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let deleted = self.clients.delete(id).await.map_err(|e| {
            error!("❌ Error eliminando cliente {}: {}", id, e);
            e.during("Error eliminando cliente")
        })?;
        if !deleted {
            return Err(not_found_error("Cliente", &id.to_string()));
        }
        info!("🗑️ Cliente eliminado: {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RepairOrder;
    use crate::repositories::record_store::into_record;
    use crate::repositories::{MemoryRecordStore, Table};
    use crate::utils::errors::AppError;

    fn create_request(value: serde_json::Value) -> CreateClientRequest {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_create_trims_and_drops_empty_fields() {
        let clients = ClientService::new(Arc::new(MemoryRecordStore::new()));
        let created = clients
            .create(create_request(json!({
                "first_name": " Ana ",
                "last_name": "Rojas",
                "document": "12.345.678-9",
                "email": "  "
            })))
            .await
            .unwrap();

        assert_eq!(created.first_name.as_deref(), Some("Ana"));
        assert_eq!(created.email, None);
        assert_eq!(created.display_name(), "Ana Rojas");
        assert_eq!(clients.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_only_touches_present_fields() {
        let clients = ClientService::new(Arc::new(MemoryRecordStore::new()));
        let created = clients
            .create(create_request(json!({ "first_name": "Ana", "contact": "+56 9 1111 2222" })))
            .await
            .unwrap();

        let updated = clients
            .update(
                created.id,
                UpdateClientRequest {
                    last_name: Some("Pérez".to_string()),
                    contact: Some(String::new()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.first_name.as_deref(), Some("Ana"));
        assert_eq!(updated.last_name.as_deref(), Some("Pérez"));
        assert_eq!(updated.contact, None);
    }

    #[tokio::test]
    async fn test_delete_orphans_repairs() {
        let store = Arc::new(MemoryRecordStore::new());
        let clients = ClientService::new(store.clone());
        let client = clients
            .create(create_request(json!({ "first_name": "Ana" })))
            .await
            .unwrap();
        let repair = store
            .insert(
                Table::Repairs,
                into_record(json!({ "nro": "RSMS-1", "client_id": client.id.to_string() })).unwrap(),
            )
            .await
            .unwrap();

        clients.delete(client.id).await.unwrap();
        let repairs: EntityRepository<RepairOrder> = EntityRepository::new(store);
        let repair = repairs
            .find(repair["id"].as_str().unwrap().parse().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(repair.client_id, None);
        assert!(matches!(clients.get(client.id).await, Err(AppError::NotFound(_))));
    }
}
