pub mod auth_controller;
pub mod catalog_controller;
pub mod client_controller;
pub mod repair_controller;
pub mod user_controller;
