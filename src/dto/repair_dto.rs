use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::models::{RepairOrder, Totals};

/// Texto tolerante: números y booleanos se aceptan como texto,
/// arreglos y objetos se ignoran.
pub fn loose_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn loose_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = loose_text(deserializer)?;
    Ok(raw
        .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
        .map(|d| d.with_timezone(&Utc)))
}

// Payload de reparación tal como llega del formulario de edición
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepairPayload {
    #[serde(default, deserialize_with = "loose_text")]
    pub nro: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub client_id: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub client_name: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub client_rut: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub correo: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub telefono: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub tipo_dcto: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub estado_pago: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub estado_reparacion: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub tipo_pago: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub tipo_equipo: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub marca: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub modelo: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub serie: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub accesorios: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub falla: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub observacion: Option<String>,
    #[serde(default)]
    pub servicios: Option<Value>,
    #[serde(default)]
    pub repuestos: Option<Value>,
    #[serde(default, deserialize_with = "loose_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

// Request para previsualizar totales sin guardar
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TotalsRequest {
    #[serde(default)]
    pub servicios: Option<Value>,
    #[serde(default)]
    pub repuestos: Option<Value>,
}

// Request para agregar una línea de servicio
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddServiceLineRequest {
    #[serde(default, deserialize_with = "loose_text")]
    pub description: Option<String>,
    #[serde(default)]
    pub value: Value,
}

// Request para agregar una línea de repuesto
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddPartLineRequest {
    #[serde(default, deserialize_with = "loose_text")]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Value,
}

// Filtros del listado de reparaciones (query string)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepairListQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub estado_pago: Option<String>,
    pub estado_reparacion: Option<String>,
    pub tipo_pago: Option<String>,
    pub tipo_dcto: Option<String>,
    pub q: Option<String>,
}

// Response de reparación con sus totales derivados
#[derive(Debug, Clone, Serialize)]
pub struct RepairResponse {
    #[serde(flatten)]
    pub order: RepairOrder,
    #[serde(flatten)]
    pub totals: Totals,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_accepts_loose_values() {
        let payload: RepairPayload = serde_json::from_value(json!({
            "id": "ignored",
            "nro": 123456,
            "telefono": 987654321,
            "falla": null,
            "marca": ["no"],
            "created_at": "no es fecha",
            "servicios": [{ "description": "x", "value": "abc" }]
        }))
        .unwrap();

        assert_eq!(payload.nro.as_deref(), Some("123456"));
        assert_eq!(payload.telefono.as_deref(), Some("987654321"));
        assert!(payload.falla.is_none());
        assert!(payload.marca.is_none());
        assert!(payload.created_at.is_none());
        assert!(payload.servicios.is_some());
    }
}
