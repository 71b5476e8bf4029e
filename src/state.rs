//! Shared application state
//! 
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use chrono::Duration;
use std::sync::Arc;

use crate::clients::IdentityProvider;
use crate::config::environment::EnvironmentConfig;
use crate::repositories::RecordStore;
use crate::services::{
    AuthService, CatalogService, ClientService, DashboardService, DocumentRenderer,
    ExportService, RepairService, UserService,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<EnvironmentConfig>,
    pub store: Arc<dyn RecordStore>,
    pub auth: Arc<AuthService>,
    pub clients: ClientService,
    pub repairs: RepairService,
    pub users: UserService,
    pub catalog: CatalogService,
    pub dashboard: Arc<DashboardService>,
    pub documents: DocumentRenderer,
    pub export: ExportService,
}

impl AppState {
    pub fn new(
        config: EnvironmentConfig,
        store: Arc<dyn RecordStore>,
        provider: Arc<dyn IdentityProvider>,
    ) -> Self {
        let auth = AuthService::new(
            provider.clone(),
            store.clone(),
            &config.jwt_secret,
            Duration::hours(config.session_hours),
        );

        Self {
            auth: Arc::new(auth),
            clients: ClientService::new(store.clone()),
            repairs: RepairService::new(store.clone()),
            users: UserService::new(store.clone(), provider),
            catalog: CatalogService::new(store.clone()),
            dashboard: Arc::new(DashboardService::new(store.clone())),
            documents: DocumentRenderer::new(config.company.clone()),
            export: ExportService::new(store.clone()),
            config: Arc::new(config),
            store,
        }
    }
}
