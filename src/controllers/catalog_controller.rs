use uuid::Uuid;
use validator::Validate;

use crate::dto::catalog_dto::{CreateCatalogItemRequest, CreateModelRequest, ModelResponse};
use crate::dto::ApiResponse;
use crate::models::{Brand, DeviceModel, DeviceType};
use crate::services::CatalogService;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub struct CatalogController {
    catalog: CatalogService,
}

impl CatalogController {
    pub fn new(state: &AppState) -> Self {
        Self {
            catalog: state.catalog.clone(),
        }
    }

    pub async fn list_brands(&self) -> Result<Vec<Brand>, AppError> {
        self.catalog.list_brands().await
    }

    pub async fn create_brand(&self, request: CreateCatalogItemRequest) -> Result<ApiResponse<Brand>, AppError> {
        request.validate()?;
        let brand = self.catalog.create_brand(&request.name).await?;
        Ok(ApiResponse::success_with_message(brand, "Marca creada".to_string()))
    }

    pub async fn delete_brand(&self, id: Uuid) -> Result<ApiResponse<()>, AppError> {
        self.catalog.delete_brand(id).await?;
        Ok(ApiResponse::message("Marca eliminada".to_string()))
    }

    pub async fn list_models(&self) -> Result<Vec<ModelResponse>, AppError> {
        self.catalog.list_models().await
    }

    pub async fn create_model(&self, request: CreateModelRequest) -> Result<ApiResponse<DeviceModel>, AppError> {
        request.validate()?;
        let model = self
            .catalog
            .create_model(&request.name, request.brand_id.as_deref())
            .await?;
        Ok(ApiResponse::success_with_message(model, "Modelo creado".to_string()))
    }

    pub async fn delete_model(&self, id: Uuid) -> Result<ApiResponse<()>, AppError> {
        self.catalog.delete_model(id).await?;
        Ok(ApiResponse::message("Modelo eliminado".to_string()))
    }

    pub async fn list_device_types(&self) -> Result<Vec<DeviceType>, AppError> {
        self.catalog.list_device_types().await
    }

    pub async fn create_device_type(
        &self,
        request: CreateCatalogItemRequest,
    ) -> Result<ApiResponse<DeviceType>, AppError> {
        request.validate()?;
        let device_type = self.catalog.create_device_type(&request.name).await?;
        Ok(ApiResponse::success_with_message(
            device_type,
            "Tipo de equipo creado".to_string(),
        ))
    }

    pub async fn delete_device_type(&self, id: Uuid) -> Result<ApiResponse<()>, AppError> {
        self.catalog.delete_device_type(id).await?;
        Ok(ApiResponse::message("Tipo de equipo eliminado".to_string()))
    }
}
