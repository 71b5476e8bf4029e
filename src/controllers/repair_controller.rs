use uuid::Uuid;

use crate::dto::repair_dto::{
    AddPartLineRequest, AddServiceLineRequest, RepairListQuery, RepairPayload, RepairResponse,
    TotalsRequest,
};
use crate::dto::ApiResponse;
use crate::models::repair::lines_from_raw;
use crate::models::{PartLineItem, RepairOrder, ServiceLineItem, Totals};
use crate::services::repair_order::{compute_totals, totals_of};
use crate::services::{DocumentRenderer, RepairFilter, RepairService};
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Orden con sus totales derivados
pub fn with_totals(order: RepairOrder) -> RepairResponse {
    RepairResponse {
        totals: compute_totals(&order),
        order,
    }
}

pub struct RepairController {
    repairs: RepairService,
    documents: DocumentRenderer,
}

impl RepairController {
    pub fn new(state: &AppState) -> Self {
        Self {
            repairs: state.repairs.clone(),
            documents: state.documents.clone(),
        }
    }

    pub async fn list(&self, query: RepairListQuery) -> Result<Vec<RepairResponse>, AppError> {
        let filter = RepairFilter::from_query(query)?;
        let repairs = self.repairs.list(&filter).await?;
        Ok(repairs.into_iter().map(with_totals).collect())
    }

    pub async fn get(&self, id: Uuid) -> Result<RepairResponse, AppError> {
        Ok(with_totals(self.repairs.get(id).await?))
    }

    pub fn draft(&self) -> RepairResponse {
        with_totals(self.repairs.draft())
    }

    /// Totales de líneas sin guardar, para el formulario de edición
    pub fn totals(&self, request: TotalsRequest) -> Totals {
        let services = lines_from_raw(request.servicios.as_ref(), ServiceLineItem::from_raw);
        let parts = lines_from_raw(request.repuestos.as_ref(), PartLineItem::from_raw);
        totals_of(&services, &parts)
    }

    pub async fn create(&self, payload: RepairPayload) -> Result<ApiResponse<RepairResponse>, AppError> {
        let order = self.repairs.create(payload).await?;
        Ok(ApiResponse::success_with_message(
            with_totals(order),
            "Reparación creada exitosamente".to_string(),
        ))
    }

    pub async fn update(
        &self,
        id: Uuid,
        payload: RepairPayload,
    ) -> Result<ApiResponse<RepairResponse>, AppError> {
        let order = self.repairs.update(id, payload).await?;
        Ok(ApiResponse::success_with_message(
            with_totals(order),
            "Reparación actualizada exitosamente".to_string(),
        ))
    }

    pub async fn delete(&self, id: Uuid) -> Result<ApiResponse<()>, AppError> {
        self.repairs.delete(id).await?;
        Ok(ApiResponse::message("Reparación eliminada exitosamente".to_string()))
    }

    /// HTML imprimible de la orden
    pub async fn document(&self, id: Uuid) -> Result<String, AppError> {
        let order = self.repairs.get(id).await?;
        self.documents.render(&order)
    }

    pub async fn add_service(
        &self,
        id: Uuid,
        request: AddServiceLineRequest,
    ) -> Result<ApiResponse<RepairResponse>, AppError> {
        let order = self.repairs.add_service(id, request).await?;
        Ok(ApiResponse::success(with_totals(order)))
    }

    pub async fn remove_service(&self, id: Uuid, line_id: &str) -> Result<ApiResponse<RepairResponse>, AppError> {
        let order = self.repairs.remove_service(id, line_id).await?;
        Ok(ApiResponse::success(with_totals(order)))
    }

    pub async fn add_part(
        &self,
        id: Uuid,
        request: AddPartLineRequest,
    ) -> Result<ApiResponse<RepairResponse>, AppError> {
        let order = self.repairs.add_part(id, request).await?;
        Ok(ApiResponse::success(with_totals(order)))
    }

    pub async fn remove_part(&self, id: Uuid, line_id: &str) -> Result<ApiResponse<RepairResponse>, AppError> {
        let order = self.repairs.remove_part(id, line_id).await?;
        Ok(ApiResponse::success(with_totals(order)))
    }
}
