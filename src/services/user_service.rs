//! Gestión de usuarios del panel

use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::clients::{IdentityError, IdentityProvider};
use crate::dto::user_dto::{CreateUserRequest, UpdateUserRequest};
use crate::models::{UserProfile, UserRole};
use crate::repositories::record_store::Record;
use crate::repositories::{EntityRepository, RecordStore};
use crate::utils::errors::{not_found_error, AppError, AppResult};
use crate::utils::validation::clean_optional;

fn provider_error(e: IdentityError) -> AppError {
    AppError::ExternalApi(e.to_string())
}

#[derive(Clone)]
pub struct UserService {
    users: EntityRepository<UserProfile>,
    provider: Arc<dyn IdentityProvider>,
}

impl UserService {
    pub fn new(store: Arc<dyn RecordStore>, provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            users: EntityRepository::new(store),
            provider,
        }
    }

    pub async fn list(&self) -> AppResult<Vec<UserProfile>> {
        self.users.list().await.map_err(|e| {
            error!("❌ Error cargando usuarios: {}", e);
            e.during("Error cargando usuarios")
        })
    }

    /// Crea el perfil; con `password` también crea la cuenta en el proveedor
    pub async fn create(&self, request: CreateUserRequest) -> AppResult<UserProfile> {
        let email = request.email.trim().to_string();

        let auth_uid = match request.password.as_deref().filter(|pw| !pw.is_empty()) {
            Some(password) => self
                .provider
                .sign_up(&email, password)
                .await
                .map_err(provider_error)?,
            None => None,
        };

        let role = request
            .role
            .map(UserRole::from)
            .unwrap_or_default();
        let mut row = json!({
            "auth_uid": auth_uid,
            "email": email,
            "first_name": clean_optional(request.first_name),
            "last_name": clean_optional(request.last_name),
            "role": role,
        });
        if let Some(local_password) = request.local_password.filter(|pw| !pw.is_empty()) {
            row["local_password"] = Value::String(local_password);
        }

        let created = self.users.insert(&row).await.map_err(|e| {
            error!("❌ Error creando usuario {}: {}", email, e);
            e.during("Error creando usuario")
        })?;
        info!("💾 Usuario creado: {} ({})", created.email, created.role);
        Ok(created)
    }

    pub async fn update(&self, id: Uuid, request: UpdateUserRequest) -> AppResult<UserProfile> {
        let mut patch = Record::new();
        if let Some(email) = request.email {
            patch.insert("email".to_string(), json!(email.trim()));
        }
        if let Some(first_name) = request.first_name {
            patch.insert("first_name".to_string(), json!(clean_optional(Some(first_name))));
        }
        if let Some(last_name) = request.last_name {
            patch.insert("last_name".to_string(), json!(clean_optional(Some(last_name))));
        }
        if let Some(role) = request.role {
            patch.insert("role".to_string(), json!(UserRole::from(role)));
        }
        if let Some(local_password) = request.local_password {
            let value = if local_password.is_empty() {
                Value::Null
            } else {
                Value::String(local_password)
            };
            patch.insert("local_password".to_string(), value);
        }

        let updated = self.users.update(id, patch).await.map_err(|e| {
            error!("❌ Error actualizando usuario {}: {}", id, e);
            e.during("Error actualizando usuario")
        })?;
        info!("💾 Usuario actualizado: {}", updated.email);
        Ok(updated)
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let deleted = self.users.delete(id).await.map_err(|e| {
            error!("❌ Error eliminando usuario {}: {}", id, e);
            e.during("Error eliminando usuario")
        })?;
        if !deleted {
            return Err(not_found_error("Usuario", &id.to_string()));
        }
        info!("🗑️ Usuario eliminado: {}", id);
        Ok(())
    }

    pub async fn send_password_reset(&self, email: &str) -> AppResult<()> {
        self.provider
            .send_password_reset(email.trim())
            .await
            .map_err(provider_error)?;
        info!("✅ Correo de restablecimiento enviado a {}", email.trim());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::UnconfiguredIdentityProvider;
    use crate::models::Principal;
    use crate::repositories::MemoryRecordStore;
    use async_trait::async_trait;

    struct SignUpProvider;

    #[async_trait]
    impl IdentityProvider for SignUpProvider {
        async fn sign_in(&self, _email: &str, _password: &str) -> Result<Principal, IdentityError> {
            Err(IdentityError::Rejected("no".to_string()))
        }

        async fn sign_out(&self, _access_token: &str) -> Result<(), IdentityError> {
            Ok(())
        }

        async fn sign_up(&self, _email: &str, _password: &str) -> Result<Option<String>, IdentityError> {
            Ok(Some("uid-nuevo".to_string()))
        }

        async fn send_password_reset(&self, _email: &str) -> Result<(), IdentityError> {
            Ok(())
        }
    }

    fn service(provider: Arc<dyn IdentityProvider>) -> UserService {
        UserService::new(Arc::new(MemoryRecordStore::new()), provider)
    }

    fn create_request(value: Value) -> CreateUserRequest {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_create_defaults_role_to_worker() {
        let users = service(Arc::new(UnconfiguredIdentityProvider));
        let created = users
            .create(create_request(json!({ "email": " tecnico@valpotec.cl ", "first_name": "Luis" })))
            .await
            .unwrap();

        assert_eq!(created.email, "tecnico@valpotec.cl");
        assert_eq!(created.role, UserRole::Worker);
        assert_eq!(created.auth_uid, None);
        assert_eq!(created.local_password, None);
    }

    #[tokio::test]
    async fn test_create_with_provider_password_sets_auth_uid() {
        let users = service(Arc::new(SignUpProvider));
        let created = users
            .create(create_request(json!({
                "email": "admin@valpotec.cl",
                "password": "clave-segura",
                "local_password": "respaldo",
                "role": "admin"
            })))
            .await
            .unwrap();

        assert_eq!(created.auth_uid.as_deref(), Some("uid-nuevo"));
        assert!(created.is_admin());
        assert!(created.local_password_matches("respaldo"));
    }

    #[tokio::test]
    async fn test_create_with_password_fails_without_provider() {
        let users = service(Arc::new(UnconfiguredIdentityProvider));
        let err = users
            .create(create_request(json!({ "email": "a@valpotec.cl", "password": "clave-segura" })))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ExternalApi(_)));
        assert!(users.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_with_taken_email_is_a_constraint_error() {
        let users = service(Arc::new(UnconfiguredIdentityProvider));
        users
            .create(create_request(json!({ "email": "admin@valpotec.cl", "role": "admin" })))
            .await
            .unwrap();

        let err = users
            .create(create_request(json!({ "email": "admin@valpotec.cl" })))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Constraint(_)));

        let listed = users.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].is_admin());
    }

    #[tokio::test]
    async fn test_update_with_empty_local_password_clears_it() {
        let users = service(Arc::new(UnconfiguredIdentityProvider));
        let created = users
            .create(create_request(json!({ "email": "a@valpotec.cl", "local_password": "x" })))
            .await
            .unwrap();

        let updated = users
            .update(
                created.id,
                UpdateUserRequest {
                    local_password: Some(String::new()),
                    role: Some("admin".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.local_password, None);
        assert!(updated.is_admin());
        assert_eq!(updated.email, "a@valpotec.cl");
    }

    #[tokio::test]
    async fn test_delete_unknown_user() {
        let users = service(Arc::new(UnconfiguredIdentityProvider));
        assert!(matches!(users.delete(Uuid::new_v4()).await, Err(AppError::NotFound(_))));
    }
}
