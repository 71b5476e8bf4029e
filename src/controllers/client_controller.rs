use uuid::Uuid;
use validator::Validate;

use crate::controllers::repair_controller::with_totals;
use crate::dto::client_dto::{CreateClientRequest, UpdateClientRequest};
use crate::dto::repair_dto::RepairResponse;
use crate::dto::ApiResponse;
use crate::models::Client;
use crate::services::{ClientService, RepairService};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub struct ClientController {
    clients: ClientService,
    repairs: RepairService,
}

impl ClientController {
    pub fn new(state: &AppState) -> Self {
        Self {
            clients: state.clients.clone(),
            repairs: state.repairs.clone(),
        }
    }

    pub async fn list(&self) -> Result<Vec<Client>, AppError> {
        self.clients.list().await
    }

    pub async fn get(&self, id: Uuid) -> Result<Client, AppError> {
        self.clients.get(id).await
    }

    pub async fn create(&self, request: CreateClientRequest) -> Result<ApiResponse<Client>, AppError> {
        request.validate()?;
        let client = self.clients.create(request).await?;
        Ok(ApiResponse::success_with_message(
            client,
            "Cliente creado exitosamente".to_string(),
        ))
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateClientRequest,
    ) -> Result<ApiResponse<Client>, AppError> {
        request.validate()?;
        let client = self.clients.update(id, request).await?;
        Ok(ApiResponse::success_with_message(
            client,
            "Cliente actualizado exitosamente".to_string(),
        ))
    }

    pub async fn delete(&self, id: Uuid) -> Result<ApiResponse<()>, AppError> {
        self.clients.delete(id).await?;
        Ok(ApiResponse::message("Cliente eliminado exitosamente".to_string()))
    }

    /// Reparaciones asociadas al cliente
    pub async fn repairs(&self, id: Uuid) -> Result<Vec<RepairResponse>, AppError> {
        self.clients.get(id).await?;
        let repairs = self.repairs.by_client(id).await?;
        Ok(repairs.into_iter().map(with_totals).collect())
    }
}
