//! Vocabularios de marcas, modelos y tipos de equipo

use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::dto::catalog_dto::ModelResponse;
use crate::models::{Brand, DeviceModel, DeviceType};
use crate::repositories::{Entity, EntityRepository, RecordStore};
use crate::utils::errors::{not_found_error, validation_error, AppResult};
use crate::utils::validation::parse_optional_reference;

/// Une cada modelo con el nombre de su marca; sin marca queda `None`
pub fn join_brand_names(models: Vec<DeviceModel>, brands: &[Brand]) -> Vec<ModelResponse> {
    let names: HashMap<Uuid, &str> = brands.iter().map(|b| (b.id, b.name.as_str())).collect();
    models
        .into_iter()
        .map(|m| ModelResponse {
            brand_name: m
                .brand_id
                .and_then(|id| names.get(&id))
                .map(|name| name.to_string()),
            id: m.id,
            name: m.name,
            brand_id: m.brand_id,
            created_at: m.created_at,
        })
        .collect()
}

#[derive(Clone)]
pub struct CatalogService {
    brands: EntityRepository<Brand>,
    models: EntityRepository<DeviceModel>,
    device_types: EntityRepository<DeviceType>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            brands: EntityRepository::new(store.clone()),
            models: EntityRepository::new(store.clone()),
            device_types: EntityRepository::new(store),
        }
    }

    async fn list_all<T: Entity>(repo: &EntityRepository<T>, label: &str) -> AppResult<Vec<T>> {
        repo.list().await.map_err(|e| {
            error!("❌ Error cargando {}: {}", label, e);
            e.during(&format!("Error cargando {}", label))
        })
    }

    async fn delete_one<T: Entity>(repo: &EntityRepository<T>, id: Uuid, label: &str) -> AppResult<()> {
        let deleted = repo.delete(id).await.map_err(|e| {
            error!("❌ Error eliminando {} {}: {}", label, id, e);
            e.during(&format!("Error eliminando {}", label))
        })?;
        if !deleted {
            return Err(not_found_error(label, &id.to_string()));
        }
        info!("🗑️ {} eliminado: {}", label, id);
        Ok(())
    }

    fn clean_name(name: &str) -> AppResult<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(validation_error("name", "El nombre es obligatorio"));
        }
        Ok(name.to_string())
    }

    pub async fn list_brands(&self) -> AppResult<Vec<Brand>> {
        Self::list_all(&self.brands, "marcas").await
    }

    pub async fn create_brand(&self, name: &str) -> AppResult<Brand> {
        let name = Self::clean_name(name)?;
        let brand = self
            .brands
            .insert(&json!({ "name": name }))
            .await
            .map_err(|e| {
                error!("❌ Error guardando marca: {}", e);
                e.during("Error guardando marca")
            })?;
        info!("💾 Marca creada: {}", brand.name);
        Ok(brand)
    }

    /// Elimina la marca; sus modelos quedan sin marca
    pub async fn delete_brand(&self, id: Uuid) -> AppResult<()> {
        Self::delete_one(&self.brands, id, "marca").await
    }

    pub async fn list_models(&self) -> AppResult<Vec<ModelResponse>> {
        let models = Self::list_all(&self.models, "modelos").await?;
        let brands = Self::list_all(&self.brands, "marcas").await?;
        Ok(join_brand_names(models, &brands))
    }

    /// Un `brand_id` vacío o inválido crea el modelo sin marca
    pub async fn create_model(&self, name: &str, brand_id: Option<&str>) -> AppResult<DeviceModel> {
        let name = Self::clean_name(name)?;
        let brand_id = parse_optional_reference(brand_id);
        let model = self
            .models
            .insert(&json!({ "name": name, "brand_id": brand_id }))
            .await
            .map_err(|e| {
                error!("❌ Error guardando modelo: {}", e);
                e.during("Error guardando modelo")
            })?;
        info!("💾 Modelo creado: {}", model.name);
        Ok(model)
    }

    pub async fn delete_model(&self, id: Uuid) -> AppResult<()> {
        Self::delete_one(&self.models, id, "modelo").await
    }

    pub async fn list_device_types(&self) -> AppResult<Vec<DeviceType>> {
        Self::list_all(&self.device_types, "tipos de equipo").await
    }

    pub async fn create_device_type(&self, name: &str) -> AppResult<DeviceType> {
        let name = Self::clean_name(name)?;
        let device_type = self
            .device_types
            .insert(&json!({ "name": name }))
            .await
            .map_err(|e| {
                error!("❌ Error guardando tipo de equipo: {}", e);
                e.during("Error guardando tipo de equipo")
            })?;
        info!("💾 Tipo de equipo creado: {}", device_type.name);
        Ok(device_type)
    }

    pub async fn delete_device_type(&self, id: Uuid) -> AppResult<()> {
        Self::delete_one(&self.device_types, id, "tipo de equipo").await
    }
}
