//! Servicio de reparaciones
//!
//! CRUD de órdenes sobre el almacén, más las operaciones de líneas sobre
//! una orden ya guardada.

use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::dto::repair_dto::{AddPartLineRequest, AddServiceLineRequest, RepairPayload};
use crate::models::{Client, RepairOrder};
use crate::repositories::record_store::{into_record, Record};
use crate::repositories::{EntityRepository, RecordStore};
use crate::services::repair_filter::RepairFilter;
use crate::services::repair_order::{
    add_part_line, add_service_line, new_draft, remove_part_line, remove_service_line,
    sanitize_for_persistence,
};
use crate::utils::errors::{not_found_error, validation_error, AppError, AppResult};

#[derive(Clone)]
pub struct RepairService {
    repairs: EntityRepository<RepairOrder>,
    clients: EntityRepository<Client>,
}

impl RepairService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            repairs: EntityRepository::new(store.clone()),
            clients: EntityRepository::new(store),
        }
    }

    /// Listado filtrado, más recientes primero
    pub async fn list(&self, filter: &RepairFilter) -> AppResult<Vec<RepairOrder>> {
        let repairs = self.repairs.list().await.map_err(|e| {
            error!("❌ Error cargando reparaciones: {}", e);
            e.during("Error cargando reparaciones")
        })?;
        Ok(filter.apply(repairs))
    }

    pub async fn get(&self, id: Uuid) -> AppResult<RepairOrder> {
        self.repairs
            .find(id)
            .await
            .map_err(|e| e.during("Error cargando reparación"))?
            .ok_or_else(|| not_found_error("Reparación", &id.to_string()))
    }

    /// Orden nueva sin guardar, con los valores por defecto
    pub fn draft(&self) -> RepairOrder {
        new_draft(Utc::now())
    }

    pub async fn create(&self, payload: RepairPayload) -> AppResult<RepairOrder> {
        let mut order = sanitize_for_persistence(payload);
        self.verify_client(&mut order).await;

        let created = self.repairs.insert(&order).await.map_err(|e| {
            error!("❌ Error guardando reparación: {}", e);
            e.during("Error guardando reparación")
        })?;
        info!("💾 Reparación creada: {:?}", created.nro);
        Ok(created)
    }

    pub async fn update(&self, id: Uuid, payload: RepairPayload) -> AppResult<RepairOrder> {
        let mut order = sanitize_for_persistence(payload);
        self.verify_client(&mut order).await;

        let patch = into_record(serde_json::to_value(&order)?)?;
        let updated = self.repairs.update(id, patch).await.map_err(|e| {
            error!("❌ Error actualizando reparación {}: {}", id, e);
            e.during("Error guardando reparación")
        })?;
        info!("💾 Reparación actualizada: {}", id);
        Ok(updated)
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let deleted = self.repairs.delete(id).await.map_err(|e| {
            error!("❌ Error eliminando reparación {}: {}", id, e);
            e.during("Error eliminando reparación")
        })?;
        if !deleted {
            return Err(not_found_error("Reparación", &id.to_string()));
        }
        info!("🗑️ Reparación eliminada: {}", id);
        Ok(())
    }

    pub async fn add_service(&self, id: Uuid, request: AddServiceLineRequest) -> AppResult<RepairOrder> {
        let mut order = self.get(id).await?;
        let description = request.description.unwrap_or_default();
        if add_service_line(&mut order, &description, &request.value).is_none() {
            return Err(validation_error("description", "La descripción del servicio es obligatoria"));
        }
        self.save_lines(id, &order).await
    }

    pub async fn add_part(&self, id: Uuid, request: AddPartLineRequest) -> AppResult<RepairOrder> {
        let mut order = self.get(id).await?;
        let name = request.name.unwrap_or_default();
        if add_part_line(&mut order, &name, &request.price).is_none() {
            return Err(validation_error("name", "El nombre del repuesto es obligatorio"));
        }
        self.save_lines(id, &order).await
    }

    /// Quita una línea de servicio; si no existe la orden queda igual
    pub async fn remove_service(&self, id: Uuid, line_id: &str) -> AppResult<RepairOrder> {
        let mut order = self.get(id).await?;
        if !remove_service_line(&mut order, line_id) {
            debug!("Línea de servicio {} no existe en {}", line_id, id);
            return Ok(order);
        }
        self.save_lines(id, &order).await
    }

    pub async fn remove_part(&self, id: Uuid, line_id: &str) -> AppResult<RepairOrder> {
        let mut order = self.get(id).await?;
        if !remove_part_line(&mut order, line_id) {
            debug!("Línea de repuesto {} no existe en {}", line_id, id);
            return Ok(order);
        }
        self.save_lines(id, &order).await
    }

    async fn save_lines(&self, id: Uuid, order: &RepairOrder) -> AppResult<RepairOrder> {
        let mut patch = Record::new();
        patch.insert("servicios".to_string(), serde_json::to_value(&order.services)?);
        patch.insert("repuestos".to_string(), serde_json::to_value(&order.parts)?);
        self.repairs.update(id, patch).await.map_err(|e| {
            error!("❌ Error guardando líneas de la reparación {}: {}", id, e);
            e.during("Error guardando reparación")
        })
    }

    /// Limpia `client_id` si el cliente no existe (o no se pudo verificar),
    /// para no chocar con la clave foránea.
    async fn verify_client(&self, order: &mut RepairOrder) {
        let Some(client_id) = order.client_id else {
            return;
        };
        match self.clients.find(client_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                debug!("Cliente {} no existe, se guarda la reparación sin cliente", client_id);
                order.client_id = None;
            }
            Err(e) => {
                debug!("Error verificando cliente {}: {}", client_id, e);
                order.client_id = None;
            }
        }
    }

    /// Órdenes que referencian a un cliente
    pub async fn by_client(&self, client_id: Uuid) -> AppResult<Vec<RepairOrder>> {
        self.repairs
            .find_by("client_id", json!(client_id.to_string()))
            .await
            .map_err(|e: AppError| e.during("Error cargando reparaciones"))
    }
}
