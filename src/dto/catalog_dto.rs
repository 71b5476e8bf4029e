use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::utils::validation::validate_not_blank;

// Request para crear una marca o un tipo de equipo
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCatalogItemRequest {
    #[validate(custom = "validate_not_blank")]
    pub name: String,
}

// Request para crear un modelo
#[derive(Debug, Deserialize, Validate)]
pub struct CreateModelRequest {
    #[validate(custom = "validate_not_blank")]
    pub name: String,
    #[serde(default)]
    pub brand_id: Option<String>,
}

// Response de modelo con el nombre de su marca
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelResponse {
    pub id: Uuid,
    pub name: String,
    pub brand_id: Option<Uuid>,
    pub brand_name: Option<String>,
    pub created_at: DateTime<Utc>,
}
