use serde::Deserialize;
use validator::Validate;

use crate::utils::validation::validate_not_blank;

// Request para crear un cliente
#[derive(Debug, Deserialize, Validate)]
pub struct CreateClientRequest {
    #[validate(custom = "validate_not_blank")]
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub document: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub contact: Option<String>,
    pub address: Option<String>,
}

// Request para actualizar un cliente; los campos ausentes no cambian
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateClientRequest {
    #[validate(custom = "validate_not_blank")]
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub document: Option<String>,
    pub email: Option<String>,
    pub contact: Option<String>,
    pub address: Option<String>,
}
