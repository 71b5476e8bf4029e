//! Modelos del resumen del panel principal

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::repair::{PaymentStatus, RepairStatus};

/// Conteos derivados de la foto completa de clientes y reparaciones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DashboardCounts {
    pub total_clients: usize,
    pub total_repairs: usize,
    pub pending_payments: usize,
    pub paid_payments: usize,
    pub in_progress: usize,
    pub delivered: usize,
    pub in_review: usize,
    /// Terminado o Entregado
    pub finished: usize,
    pub cancelled: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentClient {
    pub id: Uuid,
    pub name: String,
    pub document: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentRepair {
    pub id: Option<Uuid>,
    pub nro: Option<String>,
    pub client_name: Option<String>,
    pub payment_status: Option<PaymentStatus>,
    pub repair_status: Option<RepairStatus>,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub total: Decimal,
    pub created_at: Option<DateTime<Utc>>,
}

/// Resumen completo que se entrega al panel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    #[serde(flatten)]
    pub counts: DashboardCounts,
    /// Suma histórica calculada por el almacén
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub historic_total: Decimal,
    pub recent_clients: Vec<RecentClient>,
    pub recent_repairs: Vec<RecentRepair>,
    pub refreshed_at: DateTime<Utc>,
}
