//! Servicio de autenticación del panel
//!
//! Solo los perfiles con rol `admin` pueden entrar. Primero se intenta con el
//! proveedor de identidad; si falla se prueba la contraseña local del perfil.

use chrono::Duration;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::clients::IdentityProvider;
use crate::models::{AuthMethod, Principal, Session, SessionFlag, UserProfile};
use crate::repositories::{EntityRepository, RecordStore};
use crate::services::jwt_service::JwtService;
use crate::services::session_store::SessionStore;
use crate::utils::errors::{AppError, AppResult};

const PROFILE_READ_ERROR: &str = "Error al leer perfil de usuario";
const NOT_ADMIN: &str = "Acceso denegado: no es un usuario admin";
const INVALID_CREDENTIALS: &str = "Credenciales inválidas";
const INVALID_SESSION: &str = "Sesión inválida o expirada";

/// Resultado de un inicio de sesión exitoso
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub session: Session,
    pub token: String,
    pub flag: SessionFlag,
}

pub struct AuthService {
    provider: Arc<dyn IdentityProvider>,
    users: EntityRepository<UserProfile>,
    sessions: SessionStore,
    jwt_service: JwtService,
}

impl AuthService {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        store: Arc<dyn RecordStore>,
        jwt_secret: &str,
        session_ttl: Duration,
    ) -> Self {
        Self {
            provider,
            users: EntityRepository::new(store),
            sessions: SessionStore::new(session_ttl),
            jwt_service: JwtService::new(jwt_secret),
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    async fn profile_by_email(&self, email: &str) -> AppResult<Option<UserProfile>> {
        let profiles = self
            .users
            .find_by("email", json!(email))
            .await
            .map_err(|e| {
                error!("❌ Error leyendo perfil de {}: {}", email, e);
                e.during(PROFILE_READ_ERROR)
            })?;
        Ok(profiles.into_iter().next())
    }

    /// Inicia sesión con email y contraseña
    pub async fn login(&self, email: &str, password: &str) -> AppResult<LoginOutcome> {
        let email = email.trim();

        match self.provider.sign_in(email, password).await {
            Ok(principal) => return self.login_with_provider(email, principal).await,
            Err(e) => warn!("⚠️ Proveedor rechazó el inicio de sesión de {}: {}", email, e),
        }

        // Respaldo con la contraseña local del perfil
        let profile = self.profile_by_email(email).await?;
        match profile {
            Some(profile) if profile.local_password_matches(password) && profile.is_admin() => {
                info!("✅ Sesión local abierta para {}", email);
                self.open_session(email, AuthMethod::LocalPassword, None).await
            }
            _ => Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string())),
        }
    }

    async fn login_with_provider(&self, email: &str, principal: Principal) -> AppResult<LoginOutcome> {
        let email = principal.email.clone().unwrap_or_else(|| email.to_string());

        let is_admin = self
            .profile_by_email(&email)
            .await?
            .map_or(false, |profile| profile.is_admin());
        if !is_admin {
            if let Some(token) = principal.access_token.as_deref() {
                if let Err(e) = self.provider.sign_out(token).await {
                    warn!("⚠️ No se pudo cerrar la sesión del proveedor: {}", e);
                }
            }
            return Err(AppError::Forbidden(NOT_ADMIN.to_string()));
        }

        info!("✅ Sesión abierta para {}", email);
        self.open_session(
            &email,
            AuthMethod::Provider {
                user_id: principal.user_id,
            },
            principal.access_token,
        )
        .await
    }

    async fn open_session(
        &self,
        email: &str,
        method: AuthMethod,
        provider_token: Option<String>,
    ) -> AppResult<LoginOutcome> {
        let session = self.sessions.create(email, method, provider_token).await;
        let token = match self.jwt_service.issue(&session) {
            Ok(token) => token,
            Err(e) => {
                self.sessions.clear(session.id).await;
                return Err(e);
            }
        };
        Ok(LoginOutcome {
            flag: session.flag(),
            session,
            token,
        })
    }

    /// Sesión vigente para un token; una sesión cerrada invalida su token
    pub async fn authenticate(&self, token: &str) -> AppResult<Session> {
        let session_id = self
            .jwt_service
            .session_id(token)
            .map_err(|_| AppError::Unauthorized(INVALID_SESSION.to_string()))?;
        self.sessions
            .read(session_id)
            .await
            .ok_or_else(|| AppError::Unauthorized(INVALID_SESSION.to_string()))
    }

    /// Cierra la sesión local y, si existe, la del proveedor
    pub async fn logout(&self, session_id: Uuid) {
        let Some(session) = self.sessions.clear(session_id).await else {
            debug!("Sesión {} ya estaba cerrada", session_id);
            return;
        };
        if let Some(token) = session.provider_token.as_deref() {
            if let Err(e) = self.provider.sign_out(token).await {
                warn!("⚠️ No se pudo cerrar la sesión del proveedor: {}", e);
            }
        }
        info!("🛑 Sesión cerrada para {}", session.email);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{IdentityError, UnconfiguredIdentityProvider};
    use crate::repositories::record_store::into_record;
    use crate::repositories::{MemoryRecordStore, Table};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Proveedor que acepta una única contraseña
    struct FakeProvider {
        password: &'static str,
        sign_outs: AtomicUsize,
    }

    impl FakeProvider {
        fn accepting(password: &'static str) -> Arc<Self> {
            Arc::new(Self {
                password,
                sign_outs: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl IdentityProvider for FakeProvider {
        async fn sign_in(&self, email: &str, password: &str) -> Result<Principal, IdentityError> {
            if password == self.password {
                Ok(Principal {
                    user_id: format!("uid-{}", email),
                    email: Some(email.to_string()),
                    access_token: Some("provider-token".to_string()),
                })
            } else {
                Err(IdentityError::Rejected("Invalid login credentials".to_string()))
            }
        }

        async fn sign_out(&self, _access_token: &str) -> Result<(), IdentityError> {
            self.sign_outs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn sign_up(&self, _email: &str, _password: &str) -> Result<Option<String>, IdentityError> {
            Ok(None)
        }

        async fn send_password_reset(&self, _email: &str) -> Result<(), IdentityError> {
            Ok(())
        }
    }

    async fn store_with_users() -> Arc<MemoryRecordStore> {
        let store = Arc::new(MemoryRecordStore::new());
        for user in [
            json!({ "email": "admin@valpotec.cl", "role": "admin", "local_password": "respaldo" }),
            json!({ "email": "tecnico@valpotec.cl", "role": "worker", "local_password": "respaldo" }),
            json!({ "email": "sinclave@valpotec.cl", "role": "admin", "local_password": "" }),
        ] {
            store
                .insert(Table::Users, into_record(user).unwrap())
                .await
                .unwrap();
        }
        store
    }

    fn service(provider: Arc<dyn IdentityProvider>, store: Arc<MemoryRecordStore>) -> AuthService {
        AuthService::new(provider, store, "test-secret", Duration::hours(1))
    }

    #[tokio::test]
    async fn test_provider_login_for_admin() {
        let auth = service(FakeProvider::accepting("clave"), store_with_users().await);
        let outcome = auth.login("admin@valpotec.cl", "clave").await.unwrap();

        assert_eq!(outcome.flag.user, "admin@valpotec.cl");
        assert_eq!(outcome.flag.uid.as_deref(), Some("uid-admin@valpotec.cl"));
        assert_eq!(outcome.flag.method, None);
        let session = auth.authenticate(&outcome.token).await.unwrap();
        assert_eq!(session.id, outcome.session.id);
    }

    #[tokio::test]
    async fn test_provider_login_for_worker_is_forbidden_and_signed_out() {
        let provider = FakeProvider::accepting("clave");
        let auth = service(provider.clone(), store_with_users().await);

        let err = auth.login("tecnico@valpotec.cl", "clave").await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(ref msg) if msg == NOT_ADMIN));
        assert_eq!(provider.sign_outs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_provider_login_without_profile_is_forbidden() {
        let auth = service(FakeProvider::accepting("clave"), store_with_users().await);
        let err = auth.login("nadie@valpotec.cl", "clave").await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_local_password_fallback() {
        let auth = service(Arc::new(UnconfiguredIdentityProvider), store_with_users().await);
        let outcome = auth.login("admin@valpotec.cl", "respaldo").await.unwrap();

        assert_eq!(outcome.session.method, AuthMethod::LocalPassword);
        assert_eq!(outcome.flag.method.as_deref(), Some("local-pass"));
        assert_eq!(outcome.flag.uid, None);
    }

    #[tokio::test]
    async fn test_invalid_credentials() {
        let auth = service(FakeProvider::accepting("clave"), store_with_users().await);

        for (email, password) in [
            ("admin@valpotec.cl", "mala"),
            ("tecnico@valpotec.cl", "respaldo"),
            ("sinclave@valpotec.cl", ""),
            ("nadie@valpotec.cl", "respaldo"),
        ] {
            let err = auth.login(email, password).await.unwrap_err();
            assert!(
                matches!(err, AppError::Unauthorized(ref msg) if msg == INVALID_CREDENTIALS),
                "{} should be rejected",
                email
            );
        }
    }

    #[tokio::test]
    async fn test_logout_invalidates_token() {
        let provider = FakeProvider::accepting("clave");
        let auth = service(provider.clone(), store_with_users().await);
        let outcome = auth.login("admin@valpotec.cl", "clave").await.unwrap();

        auth.logout(outcome.session.id).await;
        assert_eq!(provider.sign_outs.load(Ordering::SeqCst), 1);
        assert!(matches!(
            auth.authenticate(&outcome.token).await,
            Err(AppError::Unauthorized(_))
        ));

        // Cerrar dos veces no falla
        auth.logout(outcome.session.id).await;
    }

    #[tokio::test]
    async fn test_garbage_token_is_rejected() {
        let auth = service(FakeProvider::accepting("clave"), store_with_users().await);
        assert!(auth.authenticate("no-es-un-jwt").await.is_err());
    }
}
