pub mod api_response;
pub mod auth_dto;
pub mod catalog_dto;
pub mod client_dto;
pub mod repair_dto;
pub mod user_dto;

pub use api_response::ApiResponse;
