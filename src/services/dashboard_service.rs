//! Resumen del panel principal
//!
//! Los conteos siempre se recalculan desde la foto completa de clientes y
//! reparaciones; nunca se actualizan contadores de forma incremental.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::models::{
    Client, DashboardCounts, DashboardSummary, PaymentStatus, RecentClient, RecentRepair,
    RepairOrder, RepairStatus,
};
use crate::repositories::{
    ChangeHandler, ChangeNotice, ChangeSubscription, EntityRepository, RecordStore, Table,
};
use crate::services::repair_order::compute_totals;
use crate::utils::errors::AppResult;

/// Cantidad de elementos en los paneles de recientes
pub const RECENT_LIMIT: usize = 5;

/// Tablas que disparan un recálculo
pub const WATCHED_TABLES: [Table; 2] = [Table::Clients, Table::Repairs];

/// Conteos a partir de la foto actual. Función pura.
pub fn summarize(clients: &[Client], repairs: &[RepairOrder]) -> DashboardCounts {
    let mut counts = DashboardCounts {
        total_clients: clients.len(),
        total_repairs: repairs.len(),
        ..Default::default()
    };

    for repair in repairs {
        match repair.payment_status {
            Some(PaymentStatus::Pending) => counts.pending_payments += 1,
            Some(PaymentStatus::Paid) => counts.paid_payments += 1,
            _ => {}
        }
        match repair.repair_status {
            Some(RepairStatus::InProgress) => counts.in_progress += 1,
            Some(RepairStatus::Delivered) => counts.delivered += 1,
            Some(RepairStatus::InReview) => counts.in_review += 1,
            Some(RepairStatus::Cancelled) => counts.cancelled += 1,
            _ => {}
        }
        if repair.repair_status.as_ref().map_or(false, RepairStatus::is_finished) {
            counts.finished += 1;
        }
    }
    counts
}

/// Los primeros `RECENT_LIMIT` clientes; la lista ya viene más reciente primero
pub fn recent_clients(clients: &[Client]) -> Vec<RecentClient> {
    clients
        .iter()
        .take(RECENT_LIMIT)
        .map(|c| RecentClient {
            id: c.id,
            name: c.display_name(),
            document: c.document.clone(),
            created_at: c.created_at,
        })
        .collect()
}

pub fn recent_repairs(repairs: &[RepairOrder]) -> Vec<RecentRepair> {
    repairs
        .iter()
        .take(RECENT_LIMIT)
        .map(|r| RecentRepair {
            id: r.id,
            nro: r.nro.clone(),
            client_name: r.client_name.clone(),
            payment_status: r.payment_status.clone(),
            repair_status: r.repair_status.clone(),
            total: compute_totals(r).total,
            created_at: r.created_at,
        })
        .collect()
}

pub struct DashboardService {
    store: Arc<dyn RecordStore>,
    clients: EntityRepository<Client>,
    repairs: EntityRepository<RepairOrder>,
    snapshot: RwLock<Option<DashboardSummary>>,
}

impl DashboardService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            clients: EntityRepository::new(store.clone()),
            repairs: EntityRepository::new(store.clone()),
            store,
            snapshot: RwLock::new(None),
        }
    }

    /// Recalcula el resumen completo y lo guarda como foto actual
    pub async fn refresh(&self) -> AppResult<DashboardSummary> {
        let (clients, repairs, historic_total) = futures::try_join!(
            self.clients.list(),
            self.repairs.list(),
            self.store.historic_total(),
        )
        .map_err(|e| {
            error!("❌ Error cargando resumen: {}", e);
            e.during("Error cargando resumen")
        })?;

        let summary = DashboardSummary {
            counts: summarize(&clients, &repairs),
            historic_total,
            recent_clients: recent_clients(&clients),
            recent_repairs: recent_repairs(&repairs),
            refreshed_at: Utc::now(),
        };

        *self.snapshot.write().await = Some(summary.clone());
        Ok(summary)
    }

    /// Foto actual; si todavía no existe se calcula
    pub async fn current(&self) -> AppResult<DashboardSummary> {
        if let Some(summary) = self.snapshot.read().await.clone() {
            return Ok(summary);
        }
        self.refresh().await
    }

    /// Suscribe el servicio a los cambios de clientes y reparaciones
    pub fn watch(self: &Arc<Self>) -> ChangeSubscription {
        ChangeSubscription::start(self.store.as_ref(), &WATCHED_TABLES, self.clone())
    }
}

#[async_trait]
impl ChangeHandler for DashboardService {
    async fn handle(&self, notice: ChangeNotice) {
        match self.refresh().await {
            Ok(summary) => info!(
                "🔄 Resumen recalculado ({:?}): {} clientes, {} reparaciones",
                notice, summary.counts.total_clients, summary.counts.total_repairs
            ),
            // Se mantiene la foto anterior
            Err(e) => error!("❌ Error recalculando resumen: {}", e),
        }
    }
}
