//! Vocabularios de referencia para los formularios
//!
//! Marcas, modelos y tipos de equipo. Borrar una marca no borra sus
//! modelos: quedan con `brand_id = None`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brand {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceModel {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub brand_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceType {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
