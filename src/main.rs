use anyhow::Result;
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use valpotec_admin::build_router;
use valpotec_admin::clients::{IdentityProvider, SupabaseAuthClient, UnconfiguredIdentityProvider};
use valpotec_admin::config::database::DatabaseConfig;
use valpotec_admin::config::environment::EnvironmentConfig;
use valpotec_admin::repositories::{MemoryRecordStore, PgRecordStore, RecordStore};
use valpotec_admin::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("🔧 Valpotec - Panel de órdenes de reparación");
    info!("============================================");

    let config = EnvironmentConfig::from_env()?;

    // Almacén de registros
    let mut listener_handle = None;
    let store: Arc<dyn RecordStore> = match &config.database_url {
        Some(url) => {
            let pool = match DatabaseConfig::new(url.as_str()).create_pool().await {
                Ok(pool) => pool,
                Err(e) => {
                    error!("❌ Error conectando a la base de datos: {}", e);
                    return Err(anyhow::anyhow!("Error de base de datos: {}", e));
                }
            };
            DatabaseConfig::run_migrations(&pool).await?;
            info!("✅ PostgreSQL conectado");

            let store = PgRecordStore::new(pool);
            listener_handle = Some(
                store
                    .start_listener()
                    .await
                    .map_err(|e| anyhow::anyhow!("Error iniciando LISTEN: {}", e))?,
            );
            Arc::new(store)
        }
        None => {
            warn!("⚠️ DATABASE_URL no configurada: se usa el almacén en memoria, los datos no persisten");
            Arc::new(MemoryRecordStore::new())
        }
    };

    // Proveedor de identidad
    let provider: Arc<dyn IdentityProvider> = match config.identity_provider() {
        Some((url, anon_key)) => {
            info!("✅ Proveedor de identidad: {}", url);
            Arc::new(SupabaseAuthClient::new(url, anon_key)?)
        }
        None => {
            warn!("⚠️ SUPABASE_URL/SUPABASE_ANON_KEY no configurados: solo se acepta la contraseña local");
            Arc::new(UnconfiguredIdentityProvider)
        }
    };

    let addr: SocketAddr = config.server_url().parse()?;
    let state = AppState::new(config, store, provider);

    // Resumen del panel: primera carga y recálculo ante cada cambio
    if let Err(e) = state.dashboard.refresh().await {
        warn!("⚠️ No se pudo calcular el resumen inicial: {}", e);
    }
    let mut dashboard_subscription = state.dashboard.watch();

    let app = build_router(state);

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health");
    info!("   POST /api/auth/login | POST /api/auth/logout | GET /api/auth/session");
    info!("   /api/clients | /api/repairs | /api/users");
    info!("   /api/brands | /api/models | /api/device-types");
    info!("   GET  /api/dashboard | GET /api/settings/backup");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Error del servidor: {}", e);
    }

    dashboard_subscription.stop();
    if let Some(handle) = listener_handle {
        handle.abort();
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo escuchar Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo escuchar SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
