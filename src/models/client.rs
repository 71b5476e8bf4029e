//! Modelo de Client
//!
//! Mapea la tabla `clients`. Todos los campos de texto son opcionales en el
//! almacén; `first_name` sólo se exige al crear desde la API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: Uuid,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    /// Documento nacional (RUT)
    pub document: Option<String>,
    pub email: Option<String>,
    /// Teléfono de contacto
    pub contact: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Client {
    /// Nombre para mostrar: partes no vacías separadas por espacio
    pub fn display_name(&self) -> String {
        [&self.first_name, &self.middle_name, &self.last_name]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(first: Option<&str>, middle: Option<&str>, last: Option<&str>) -> Client {
        Client {
            id: Uuid::new_v4(),
            first_name: first.map(str::to_string),
            middle_name: middle.map(str::to_string),
            last_name: last.map(str::to_string),
            document: None,
            email: None,
            contact: None,
            address: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_display_name_skips_missing_parts() {
        assert_eq!(
            client(Some("Ana"), None, Some("Rojas")).display_name(),
            "Ana Rojas"
        );
        assert_eq!(
            client(Some("Ana"), Some(""), Some("Rojas")).display_name(),
            "Ana Rojas"
        );
        assert_eq!(
            client(Some("Ana"), Some("María"), Some("Rojas")).display_name(),
            "Ana María Rojas"
        );
        assert_eq!(client(None, None, None).display_name(), "");
    }

    #[test]
    fn test_deserialize_with_missing_fields() {
        let id = Uuid::new_v4();
        let value = serde_json::json!({
            "id": id.to_string(),
            "first_name": "Pedro",
            "created_at": "2024-08-01T10:00:00.000000+00:00"
        });
        let client: Client = serde_json::from_value(value).unwrap();
        assert_eq!(client.id, id);
        assert_eq!(client.display_name(), "Pedro");
        assert!(client.document.is_none());
    }
}
