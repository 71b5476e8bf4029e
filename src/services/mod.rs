//! Services module
//! 
//! Este módulo contiene la lógica de negocio y servicios de la aplicación.
//! Los servicios encapsulan operaciones que pueden involucrar múltiples
//! tablas o integraciones externas.

pub mod auth_service;
pub mod catalog_service;
pub mod client_service;
pub mod dashboard_service;
pub mod document_renderer;
pub mod export_service;
pub mod jwt_service;
pub mod repair_filter;
pub mod repair_order;
pub mod repair_service;
pub mod session_store;
pub mod user_service;

pub use auth_service::{AuthService, LoginOutcome};
pub use catalog_service::CatalogService;
pub use client_service::ClientService;
pub use dashboard_service::DashboardService;
pub use document_renderer::DocumentRenderer;
pub use export_service::{BackupFile, ExportService};
pub use repair_filter::RepairFilter;
pub use repair_service::RepairService;
pub use user_service::UserService;
