//! Filtros del listado de reparaciones
//!
//! Rango de fechas (días completos, UTC), estados, medio de pago, tipo de
//! documento y búsqueda libre sin distinguir mayúsculas.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::dto::repair_dto::RepairListQuery;
use crate::models::{DocumentType, PaymentMethod, PaymentStatus, RepairOrder, RepairStatus};
use crate::services::repair_order::compute_totals;
use crate::utils::errors::{validation_error, AppResult};
use crate::utils::validation::{clean_optional, parse_date};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepairFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub payment_status: Option<PaymentStatus>,
    pub repair_status: Option<RepairStatus>,
    pub payment_method: Option<PaymentMethod>,
    pub document_type: Option<DocumentType>,
    /// Texto buscado, ya en minúsculas
    pub query: Option<String>,
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    let end = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
    date.and_time(end).and_utc()
}

/// Fecha como la muestra el listado
pub fn display_date(created_at: &DateTime<Utc>) -> String {
    created_at.format("%d-%m-%Y").to_string()
}

impl RepairFilter {
    pub fn from_query(query: RepairListQuery) -> AppResult<Self> {
        let from = match clean_optional(query.from) {
            Some(text) => Some(
                parse_date(&text)
                    .map_err(|_| validation_error("from", "Fecha inválida, use YYYY-MM-DD"))?,
            ),
            None => None,
        };
        let to = match clean_optional(query.to) {
            Some(text) => Some(
                parse_date(&text)
                    .map_err(|_| validation_error("to", "Fecha inválida, use YYYY-MM-DD"))?,
            ),
            None => None,
        };

        Ok(Self {
            from,
            to,
            payment_status: clean_optional(query.estado_pago).map(PaymentStatus::from),
            repair_status: clean_optional(query.estado_reparacion).map(RepairStatus::from),
            payment_method: clean_optional(query.tipo_pago).map(PaymentMethod::from),
            document_type: clean_optional(query.tipo_dcto).map(DocumentType::from),
            query: clean_optional(query.q).map(|q| q.to_lowercase()),
        })
    }

    pub fn matches(&self, order: &RepairOrder) -> bool {
        if let Some(from) = self.from {
            match order.created_at {
                Some(created) if created >= start_of_day(from) => {}
                _ => return false,
            }
        }
        if let Some(to) = self.to {
            match order.created_at {
                Some(created) if created <= end_of_day(to) => {}
                _ => return false,
            }
        }
        if self.payment_status.is_some() && order.payment_status != self.payment_status {
            return false;
        }
        if self.repair_status.is_some() && order.repair_status != self.repair_status {
            return false;
        }
        if self.payment_method.is_some() && order.payment_method != self.payment_method {
            return false;
        }
        if self.document_type.is_some() && order.document_type != self.document_type {
            return false;
        }

        match &self.query {
            Some(query) => search_candidates(order)
                .iter()
                .any(|candidate| candidate.to_lowercase().contains(query.as_str())),
            None => true,
        }
    }

    pub fn apply(&self, orders: Vec<RepairOrder>) -> Vec<RepairOrder> {
        orders.into_iter().filter(|o| self.matches(o)).collect()
    }
}

/// Campos en los que busca el texto libre
fn search_candidates(order: &RepairOrder) -> Vec<String> {
    let totals = compute_totals(order);
    let text_fields = [
        &order.nro,
        &order.client_name,
        &order.client_rut,
        &order.device_type,
        &order.brand,
        &order.model,
        &order.serial,
        &order.observation,
        &order.fault,
        &order.accessories,
    ];

    let mut candidates: Vec<String> = text_fields
        .into_iter()
        .filter_map(|field| field.clone())
        .collect();
    if let Some(status) = &order.payment_status {
        candidates.push(status.label().to_string());
    }
    if let Some(created) = &order.created_at {
        candidates.push(display_date(created));
    }
    candidates.push(totals.net.normalize().to_string());
    candidates.push(totals.vat.normalize().to_string());
    candidates.push(totals.total.normalize().to_string());
    candidates
}
