//! Lógica de dominio de las órdenes de reparación
//!
//! Líneas de servicios y repuestos, totales derivados y normalización del
//! payload antes de guardarlo. Nada de esto falla por montos mal escritos:
//! lo que no es número vale cero.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::warn;

use crate::dto::repair_dto::RepairPayload;
use crate::models::repair::{
    lines_from_raw, unique_line_id, DocumentType, LineItem, PartLineItem, PaymentMethod,
    PaymentStatus, RepairOrder, RepairStatus, ServiceLineItem, Totals,
};
use crate::models::Client;
use crate::utils::money::{coerce_amount, round_currency, VAT_RATE};
use crate::utils::validation::parse_optional_reference;

/// Prefijo del número de orden
pub const ORDER_NUMBER_PREFIX: &str = "RSMS-";

/// Número de orden: prefijo más los últimos 6 dígitos del timestamp en ms.
///
/// No se verifica unicidad contra las órdenes existentes.
pub fn order_number(now: DateTime<Utc>) -> String {
    let millis = now.timestamp_millis().to_string();
    let start = millis.len().saturating_sub(6);
    format!("{}{}", ORDER_NUMBER_PREFIX, &millis[start..])
}

/// Orden nueva con los valores por defecto del formulario
pub fn new_draft(now: DateTime<Utc>) -> RepairOrder {
    RepairOrder {
        nro: Some(order_number(now)),
        document_type: Some(DocumentType::ServiceOrder),
        payment_status: Some(PaymentStatus::Pending),
        repair_status: Some(RepairStatus::InProgress),
        payment_method: Some(PaymentMethod::Cash),
        device_type: Some("Notebook".to_string()),
        brand: Some("Dell".to_string()),
        created_at: Some(now),
        ..Default::default()
    }
}

/// Agrega una línea de servicio. Devuelve el id nuevo, o `None` si la
/// descripción está vacía (no se agrega nada).
pub fn add_service_line(order: &mut RepairOrder, description: &str, value: &Value) -> Option<String> {
    let description = description.trim();
    if description.is_empty() {
        return None;
    }
    let id = unique_line_id(&order.line_ids());
    order.services.push(ServiceLineItem {
        id: id.clone(),
        description: description.to_string(),
        value: coerce_amount(value),
    });
    Some(id)
}

/// Agrega una línea de repuesto; mismas reglas que los servicios
pub fn add_part_line(order: &mut RepairOrder, name: &str, price: &Value) -> Option<String> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let id = unique_line_id(&order.line_ids());
    order.parts.push(PartLineItem {
        id: id.clone(),
        name: name.to_string(),
        price: coerce_amount(price),
    });
    Some(id)
}

fn remove_line<T: LineItem>(lines: &mut Vec<T>, id: &str) -> bool {
    let before = lines.len();
    lines.retain(|line| line.line_id() != id);
    lines.len() != before
}

/// Quita la línea de servicio con ese id; `false` si no existía
pub fn remove_service_line(order: &mut RepairOrder, id: &str) -> bool {
    remove_line(&mut order.services, id)
}

pub fn remove_part_line(order: &mut RepairOrder, id: &str) -> bool {
    remove_line(&mut order.parts, id)
}

/// Totales de un conjunto de líneas.
///
/// `vat` se redondea por separado y después se suma: el total es
/// `net + round(net * 0.19, 2)`, no `round(net * 1.19, 2)`.
///
/// Si la suma no cabe en un `Decimal` los totales quedan en cero.
pub fn totals_of(services: &[ServiceLineItem], parts: &[PartLineItem]) -> Totals {
    let amounts = services
        .iter()
        .map(LineItem::amount)
        .chain(parts.iter().map(LineItem::amount));
    checked_totals(amounts).unwrap_or_else(|| {
        warn!("⚠️ Totales fuera de rango, se informan en cero");
        Totals::default()
    })
}

fn checked_totals(mut amounts: impl Iterator<Item = Decimal>) -> Option<Totals> {
    let net = amounts.try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(amount))?;
    let vat = round_currency(net.checked_mul(VAT_RATE)?);
    let total = round_currency(net.checked_add(vat)?);
    Some(Totals { net, vat, total })
}

pub fn compute_totals(order: &RepairOrder) -> Totals {
    totals_of(&order.services, &order.parts)
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

fn label<T: From<String>>(value: Option<String>) -> Option<T> {
    value.filter(|v| !v.trim().is_empty()).map(T::from)
}

/// Normaliza el payload del formulario a la forma canónica que se guarda.
///
/// - montos de líneas a número (con los nombres antiguos como respaldo)
/// - correo y teléfono recortados
/// - `client_id` vacío o mal formado equivale a "sin cliente"
/// - campos ausentes quedan en `None` y no se escriben
pub fn sanitize_for_persistence(payload: RepairPayload) -> RepairOrder {
    RepairOrder {
        id: None,
        nro: payload.nro,
        client_id: parse_optional_reference(payload.client_id.as_deref()),
        client_name: payload.client_name,
        client_rut: payload.client_rut,
        email: trimmed(payload.correo),
        phone: trimmed(payload.telefono),
        document_type: label(payload.tipo_dcto),
        payment_status: label(payload.estado_pago),
        repair_status: label(payload.estado_reparacion),
        payment_method: label(payload.tipo_pago),
        device_type: payload.tipo_equipo,
        brand: payload.marca,
        model: payload.modelo,
        serial: payload.serie,
        accessories: payload.accesorios,
        fault: payload.falla,
        observation: payload.observacion,
        services: lines_from_raw(payload.servicios.as_ref(), ServiceLineItem::from_raw),
        parts: lines_from_raw(payload.repuestos.as_ref(), PartLineItem::from_raw),
        created_at: payload.created_at,
    }
}

/// Vincula la orden a un cliente y precarga sus datos de contacto.
///
/// Con `None` la orden queda sin cliente y se limpian los datos cacheados.
pub fn assign_client(order: &mut RepairOrder, client: Option<&Client>) {
    match client {
        Some(client) => {
            order.client_id = Some(client.id);
            order.client_name = Some(client.display_name());
            order.client_rut = Some(client.document.clone().unwrap_or_default());
            order.email = Some(client.email.clone().unwrap_or_default());
            order.phone = Some(client.contact.clone().unwrap_or_default());
        }
        None => {
            order.client_id = None;
            order.client_name = Some(String::new());
            order.client_rut = Some(String::new());
            order.email = Some(String::new());
            order.phone = Some(String::new());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use std::str::FromStr;
    use uuid::Uuid;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn payload(value: Value) -> RepairPayload {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_totals_example() {
        let mut order = RepairOrder::default();
        add_service_line(&mut order, "Cambio de teclado", &json!(1000));
        add_part_line(&mut order, "Teclado", &json!(500));

        let totals = compute_totals(&order);
        assert_eq!(totals.net, dec("1500"));
        assert_eq!(totals.vat, dec("285.00"));
        assert_eq!(totals.total, dec("1785.00"));
    }

    #[test]
    fn test_totals_of_empty_order_are_zero() {
        let totals = compute_totals(&RepairOrder::default());
        assert_eq!(totals, Totals::default());
    }

    #[test]
    fn test_vat_is_rounded_before_summing() {
        let mut order = RepairOrder::default();
        add_service_line(&mut order, "Ajuste", &json!("0.0045"));
        let totals = compute_totals(&order);
        assert_eq!(totals.vat, Decimal::ZERO);
        assert_eq!(totals.total, Decimal::ZERO);
        // round(net * 1.19, 2) sería 0.01
        assert_ne!(totals.total, round_currency(totals.net * dec("1.19")));
    }

    #[test]
    fn test_huge_amounts_never_panic() {
        let mut order = RepairOrder::default();
        add_service_line(&mut order, "Servicio", &json!("79228162514264337593543950335"));
        add_part_line(&mut order, "Repuesto", &json!("1"));
        assert_eq!(order.services[0].value, Decimal::ZERO);

        let totals = compute_totals(&order);
        assert_eq!(totals.net, dec("1"));
        assert_eq!(totals.total, dec("1.19"));

        let order = sanitize_for_persistence(payload(json!({
            "servicios": [{ "id": "s1", "description": "x", "value": "70000000000000000000000000000" }]
        })));
        assert_eq!(compute_totals(&order), Totals::default());
    }

    #[test]
    fn test_totals_overflow_falls_back_to_zero() {
        let services = vec![
            ServiceLineItem { id: "a".into(), description: "a".into(), value: Decimal::MAX },
            ServiceLineItem { id: "b".into(), description: "b".into(), value: Decimal::MAX },
        ];
        assert_eq!(totals_of(&services, &[]), Totals::default());

        let single = vec![ServiceLineItem { id: "a".into(), description: "a".into(), value: Decimal::MAX }];
        assert_eq!(totals_of(&single, &[]), Totals::default());
    }

    #[test]
    fn test_add_service_line_with_empty_description_is_noop() {
        let mut order = RepairOrder::default();
        assert!(add_service_line(&mut order, "", &json!(100)).is_none());
        assert!(add_service_line(&mut order, "   ", &json!(100)).is_none());
        assert!(add_part_line(&mut order, "", &json!(100)).is_none());
        assert!(order.services.is_empty());
        assert!(order.parts.is_empty());
    }

    #[test]
    fn test_add_service_line_defaults_unparseable_value_to_zero() {
        let mut order = RepairOrder::default();
        add_service_line(&mut order, "Diagnóstico", &json!("gratis"));
        assert_eq!(order.services[0].value, Decimal::ZERO);
    }

    #[test]
    fn test_line_ids_are_unique() {
        let mut order = RepairOrder::default();
        for i in 0..50 {
            add_service_line(&mut order, &format!("Servicio {}", i), &json!(1));
            add_part_line(&mut order, &format!("Repuesto {}", i), &json!(1));
        }
        assert_eq!(order.line_ids().len(), 100);
    }

    #[test]
    fn test_remove_unknown_line_is_noop() {
        let mut order = RepairOrder::default();
        let id = add_service_line(&mut order, "Limpieza", &json!(200)).unwrap();
        let before = order.clone();

        assert!(!remove_service_line(&mut order, "nope"));
        assert_eq!(order, before);

        assert!(remove_service_line(&mut order, &id));
        assert!(order.services.is_empty());
        assert!(!remove_part_line(&mut order, &id));
    }

    #[test]
    fn test_sanitize_coerces_non_numeric_to_zero() {
        let order = sanitize_for_persistence(payload(json!({
            "servicios": [
                { "id": "s1", "description": "Mano de obra", "value": "abc" },
                { "id": "s2", "description": "Antiguo", "valor": "250" }
            ],
            "repuestos": [
                { "id": "p1", "nombre": "Batería", "precio": 30000 },
                { "id": "p2", "name": "Cable", "price": null }
            ]
        })));

        assert_eq!(order.services[0].value, Decimal::ZERO);
        assert_eq!(order.services[1].value, dec("250"));
        assert_eq!(order.parts[0].name, "Batería");
        assert_eq!(order.parts[0].price, dec("30000"));
        assert_eq!(order.parts[1].price, Decimal::ZERO);
    }

    #[test]
    fn test_sanitize_trims_contact_and_clears_empty_client() {
        let order = sanitize_for_persistence(payload(json!({
            "client_id": "",
            "correo": "  cliente@correo.cl ",
            "telefono": " +56 9 1234 5678 ",
            "estado_pago": "",
            "servicios": "no es lista"
        })));

        assert_eq!(order.client_id, None);
        assert_eq!(order.email.as_deref(), Some("cliente@correo.cl"));
        assert_eq!(order.phone.as_deref(), Some("+56 9 1234 5678"));
        assert_eq!(order.payment_status, None);
        assert!(order.services.is_empty());

        let value = serde_json::to_value(&order).unwrap();
        assert!(value["client_id"].is_null());
        assert!(value.get("falla").is_none());
        assert_eq!(value["servicios"], json!([]));
    }

    #[test]
    fn test_sanitize_keeps_valid_client_reference() {
        let id = Uuid::new_v4();
        let order = sanitize_for_persistence(payload(json!({ "client_id": id.to_string() })));
        assert_eq!(order.client_id, Some(id));
    }

    #[test]
    fn test_new_draft_defaults() {
        let now = Utc.timestamp_millis_opt(1_722_500_123_456).unwrap();
        let draft = new_draft(now);
        assert_eq!(draft.nro.as_deref(), Some("RSMS-123456"));
        assert_eq!(draft.document_type, Some(DocumentType::ServiceOrder));
        assert_eq!(draft.payment_status, Some(PaymentStatus::Pending));
        assert_eq!(draft.repair_status, Some(RepairStatus::InProgress));
        assert_eq!(draft.payment_method, Some(PaymentMethod::Cash));
        assert_eq!(draft.device_type.as_deref(), Some("Notebook"));
        assert_eq!(draft.brand.as_deref(), Some("Dell"));
        assert!(draft.services.is_empty());
    }

    #[test]
    fn test_assign_client_prefills_contact() {
        let client = Client {
            id: Uuid::new_v4(),
            first_name: Some("Ana".to_string()),
            middle_name: None,
            last_name: Some("Rojas".to_string()),
            document: Some("12.345.678-9".to_string()),
            email: Some("ana@correo.cl".to_string()),
            contact: None,
            address: None,
            created_at: Utc::now(),
        };
        let mut order = new_draft(Utc::now());
        assign_client(&mut order, Some(&client));
        assert_eq!(order.client_id, Some(client.id));
        assert_eq!(order.client_name.as_deref(), Some("Ana Rojas"));
        assert_eq!(order.client_rut.as_deref(), Some("12.345.678-9"));
        assert_eq!(order.email.as_deref(), Some("ana@correo.cl"));
        assert_eq!(order.phone.as_deref(), Some(""));

        assign_client(&mut order, None);
        assert_eq!(order.client_id, None);
        assert_eq!(order.client_name.as_deref(), Some(""));
    }
}
