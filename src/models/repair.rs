//! Modelo de RepairOrder
//!
//! Mapea la tabla `repairs`. Los nombres de columna del almacén están en
//! español (`correo`, `tipo_dcto`, `servicios`, ...); aquí se exponen con
//! nombres en inglés y `serde` hace la traducción.
//!
//! Las líneas de servicios y repuestos se leen de forma tolerante: montos
//! como texto, `null` o nombres de campo antiguos (`valor`, `precio`,
//! `nombre`) nunca producen un error.

use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use uuid::Uuid;

use crate::utils::money::line_amount;
use crate::utils::validation::parse_optional_reference;

labeled_enum! {
    /// Tipo de documento emitido
    DocumentType {
        ServiceOrder => "Orden de servicio",
        Quote => "Presupuesto",
        Receipt => "Comprobante",
    }
}

labeled_enum! {
    /// Estado de pago
    PaymentStatus {
        Paid => "Pagado",
        Pending => "Pendiente",
    }
}

labeled_enum! {
    /// Estado de la reparación
    RepairStatus {
        InProgress => "En proceso",
        Finished => "Terminado",
        Cancelled => "Cancelado",
        Delivered => "Entregado",
        /// Etiqueta antigua que todavía aparece en registros existentes
        InReview => "En revisión",
    }
}

labeled_enum! {
    /// Medio de pago
    PaymentMethod {
        Cash => "Efectivo",
        Card => "Tarjeta",
        OtherMethod => "Otro",
    }
}

impl RepairStatus {
    /// Terminado o entregado
    pub fn is_finished(&self) -> bool {
        matches!(self, RepairStatus::Finished | RepairStatus::Delivered)
    }
}

const LINE_ID_LENGTH: usize = 7;
const LINE_ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Genera un id de línea (7 caracteres base 36) que no esté en `taken`
pub fn unique_line_id(taken: &HashSet<String>) -> String {
    let mut rng = rand::thread_rng();
    loop {
        let id: String = (0..LINE_ID_LENGTH)
            .map(|_| LINE_ID_ALPHABET[rng.gen_range(0..LINE_ID_ALPHABET.len())] as char)
            .collect();
        if !taken.contains(&id) {
            return id;
        }
    }
}

/// Línea de servicio
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceLineItem {
    pub id: String,
    pub description: String,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub value: Decimal,
}

/// Línea de repuesto
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartLineItem {
    pub id: String,
    pub name: String,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub price: Decimal,
}

/// Texto de un campo suelto: números y booleanos se pasan a texto
fn raw_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl ServiceLineItem {
    /// Interpreta una línea tal como llega del formulario o del almacén.
    ///
    /// Devuelve `None` sólo si la entrada no es un objeto.
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let obj = raw.as_object()?;
        Some(Self {
            id: raw_text(obj.get("id")).unwrap_or_default(),
            description: raw_text(obj.get("description")).unwrap_or_default(),
            value: line_amount(obj.get("value"), obj.get("valor")),
        })
    }
}

impl PartLineItem {
    /// Interpreta una línea de repuesto; `nombre` reemplaza a un `name` vacío.
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let obj = raw.as_object()?;
        let name = raw_text(obj.get("name"))
            .filter(|n| !n.is_empty())
            .or_else(|| raw_text(obj.get("nombre")))
            .unwrap_or_default();
        Some(Self {
            id: raw_text(obj.get("id")).unwrap_or_default(),
            name,
            price: line_amount(obj.get("price"), obj.get("precio")),
        })
    }
}

/// Acceso común a las dos colecciones de líneas
pub trait LineItem {
    fn line_id(&self) -> &str;
    fn set_line_id(&mut self, id: String);
    fn amount(&self) -> Decimal;
}

impl LineItem for ServiceLineItem {
    fn line_id(&self) -> &str {
        &self.id
    }
    fn set_line_id(&mut self, id: String) {
        self.id = id;
    }
    fn amount(&self) -> Decimal {
        self.value
    }
}

impl LineItem for PartLineItem {
    fn line_id(&self) -> &str {
        &self.id
    }
    fn set_line_id(&mut self, id: String) {
        self.id = id;
    }
    fn amount(&self) -> Decimal {
        self.price
    }
}

/// Convierte un valor JSON en lista de líneas.
///
/// Lo que no es arreglo vale lista vacía; las entradas que no son objetos se
/// descartan y las líneas sin id reciben uno nuevo.
pub fn lines_from_raw<T, F>(raw: Option<&Value>, parse: F) -> Vec<T>
where
    T: LineItem,
    F: Fn(&Value) -> Option<T>,
{
    let mut items: Vec<T> = match raw {
        Some(Value::Array(entries)) => entries.iter().filter_map(|e| parse(e)).collect(),
        _ => Vec::new(),
    };

    let mut taken: HashSet<String> = items
        .iter()
        .map(|item| item.line_id().to_string())
        .filter(|id| !id.is_empty())
        .collect();
    for item in items.iter_mut().filter(|item| item.line_id().trim().is_empty()) {
        let id = unique_line_id(&taken);
        taken.insert(id.clone());
        item.set_line_id(id);
    }
    items
}

fn deserialize_services<'de, D>(deserializer: D) -> Result<Vec<ServiceLineItem>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(lines_from_raw(raw.as_ref(), ServiceLineItem::from_raw))
}

fn deserialize_parts<'de, D>(deserializer: D) -> Result<Vec<PartLineItem>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(lines_from_raw(raw.as_ref(), PartLineItem::from_raw))
}

fn deserialize_reference<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(parse_optional_reference(raw.as_ref().and_then(Value::as_str)))
}

impl<'de> Deserialize<'de> for ServiceLineItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        ServiceLineItem::from_raw(&raw).ok_or_else(|| D::Error::custom("línea de servicio inválida"))
    }
}

impl<'de> Deserialize<'de> for PartLineItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        PartLineItem::from_raw(&raw).ok_or_else(|| D::Error::custom("línea de repuesto inválida"))
    }
}

/// Valores derivados de las líneas. Nunca se guardan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Totals {
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub net: Decimal,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub vat: Decimal,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub total: Decimal,
}

/// Orden de reparación en su forma canónica
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RepairOrder {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nro: Option<String>,
    /// Siempre se escribe: `null` desvincula al cliente
    #[serde(default, deserialize_with = "deserialize_reference")]
    pub client_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_rut: Option<String>,
    #[serde(rename = "correo", default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "telefono", default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "tipo_dcto", default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<DocumentType>,
    #[serde(rename = "estado_pago", default, skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,
    #[serde(rename = "estado_reparacion", default, skip_serializing_if = "Option::is_none")]
    pub repair_status: Option<RepairStatus>,
    #[serde(rename = "tipo_pago", default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(rename = "tipo_equipo", default, skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    #[serde(rename = "marca", default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(rename = "modelo", default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(rename = "serie", default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    #[serde(rename = "accesorios", default, skip_serializing_if = "Option::is_none")]
    pub accessories: Option<String>,
    #[serde(rename = "falla", default, skip_serializing_if = "Option::is_none")]
    pub fault: Option<String>,
    #[serde(rename = "observacion", default, skip_serializing_if = "Option::is_none")]
    pub observation: Option<String>,
    #[serde(rename = "servicios", default, deserialize_with = "deserialize_services")]
    pub services: Vec<ServiceLineItem>,
    #[serde(rename = "repuestos", default, deserialize_with = "deserialize_parts")]
    pub parts: Vec<PartLineItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl RepairOrder {
    /// Ids de línea ya usados en la orden (servicios y repuestos)
    pub fn line_ids(&self) -> HashSet<String> {
        self.services
            .iter()
            .map(|s| s.id.clone())
            .chain(self.parts.iter().map(|p| p.id.clone()))
            .collect()
    }
}
