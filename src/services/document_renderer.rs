//! Documento imprimible de una orden de reparación
//!
//! HTML con membrete, datos de contacto, equipo, líneas y totales. Los
//! totales salen de `compute_totals`, los mismos que muestra el listado.

use askama::Template;
use chrono::Utc;

use crate::config::company::CompanyProfile;
use crate::models::RepairOrder;
use crate::services::repair_order::compute_totals;
use crate::utils::errors::AppResult;
use crate::utils::money::format_clp;

/// Línea de la tabla de servicios o repuestos
struct DocumentLine {
    detail: String,
    amount: String,
}

#[derive(Template)]
#[template(path = "repair_document.html")]
struct RepairDocumentTemplate<'a> {
    company: &'a CompanyProfile,
    nro: &'a str,
    document_type: &'a str,
    date: String,
    client: String,
    contact: String,
    payment_method: &'a str,
    fault: &'a str,
    device_type: &'a str,
    brand: &'a str,
    model: &'a str,
    serial: &'a str,
    observation: &'a str,
    services: Vec<DocumentLine>,
    parts: Vec<DocumentLine>,
    net: String,
    vat: String,
    total: String,
}

fn text(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

#[derive(Debug, Clone)]
pub struct DocumentRenderer {
    company: CompanyProfile,
}

impl DocumentRenderer {
    pub fn new(company: CompanyProfile) -> Self {
        Self { company }
    }

    /// Genera el HTML del documento. No tiene efectos secundarios.
    pub fn render(&self, order: &RepairOrder) -> AppResult<String> {
        let totals = compute_totals(order);
        let when = order
            .created_at
            .unwrap_or_else(Utc::now)
            .with_timezone(&self.company.utc_offset);

        let client = match order.client_rut.as_deref().filter(|rut| !rut.is_empty()) {
            Some(rut) => format!("{}  - Rut: {}", text(&order.client_name), rut),
            None => text(&order.client_name).to_string(),
        };
        let contact = [text(&order.email), text(&order.phone)]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" - ");
        let observation = match text(&order.observation) {
            "" => "-",
            observation => observation,
        };

        let template = RepairDocumentTemplate {
            company: &self.company,
            nro: text(&order.nro),
            document_type: order.document_type.as_ref().map_or("", |d| d.label()),
            date: when.format("%d-%m-%Y, %H:%M:%S").to_string(),
            client,
            contact,
            payment_method: order.payment_method.as_ref().map_or("", |m| m.label()),
            fault: text(&order.fault),
            device_type: text(&order.device_type),
            brand: text(&order.brand),
            model: text(&order.model),
            serial: text(&order.serial),
            observation,
            services: order
                .services
                .iter()
                .map(|s| DocumentLine {
                    detail: s.description.clone(),
                    amount: format_clp(s.value),
                })
                .collect(),
            parts: order
                .parts
                .iter()
                .map(|p| DocumentLine {
                    detail: p.name.clone(),
                    amount: format_clp(p.price),
                })
                .collect(),
            net: format_clp(totals.net),
            vat: format_clp(totals.vat),
            total: format_clp(totals.total),
        };

        Ok(template.render()?)
    }
}
