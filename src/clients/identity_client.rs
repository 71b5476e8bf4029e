//! Cliente del proveedor de identidad
//!
//! El proveedor es un servicio GoTrue (Supabase Auth) accedido por REST.
//! Si no está configurado se usa `UnconfiguredIdentityProvider`, que siempre
//! responde como proveedor no disponible.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::Principal;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum IdentityError {
    #[error("Credenciales rechazadas por el proveedor: {0}")]
    Rejected(String),

    #[error("Proveedor de identidad no disponible: {0}")]
    Unavailable(String),
}

/// Contrato del proveedor de identidad
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Principal, IdentityError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError>;

    /// Crea la cuenta y devuelve el id de usuario del proveedor
    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<String>, IdentityError>;

    async fn send_password_reset(&self, email: &str) -> Result<(), IdentityError>;
}

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RecoverRequest<'a> {
    email: &'a str,
}

#[derive(Debug, Deserialize)]
struct ProviderUser {
    id: String,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: ProviderUser,
}

/// Cliente HTTP para la API de autenticación de Supabase
pub struct SupabaseAuthClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseAuthClient {
    pub fn new(base_url: &str, anon_key: &str) -> Result<Self, IdentityError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn network_error(e: reqwest::Error) -> IdentityError {
        IdentityError::Unavailable(format!("Error de red: {}", e))
    }

    /// Mensaje de error de GoTrue; distintas versiones usan distintos campos
    async fn error_from(response: Response) -> IdentityError {
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        let message = ["error_description", "msg", "message", "error"]
            .iter()
            .find_map(|field| body.get(*field).and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| format!("Error HTTP: {}", status));

        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            IdentityError::Unavailable(message)
        } else {
            IdentityError::Rejected(message)
        }
    }
}

#[async_trait]
impl IdentityProvider for SupabaseAuthClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Principal, IdentityError> {
        let response = self
            .client
            .post(self.url("token?grant_type=password"))
            .header("apikey", &self.anon_key)
            .json(&Credentials { email, password })
            .send()
            .await
            .map_err(Self::network_error)?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::Unavailable(format!("Respuesta inválida: {}", e)))?;
        debug!("Inicio de sesión aceptado por el proveedor para {}", email);

        Ok(Principal {
            user_id: token.user.id,
            email: token.user.email,
            access_token: Some(token.access_token),
        })
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError> {
        let response = self
            .client
            .post(self.url("logout"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(Self::network_error)?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        Ok(())
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<String>, IdentityError> {
        let response = self
            .client
            .post(self.url("signup"))
            .header("apikey", &self.anon_key)
            .json(&Credentials { email, password })
            .send()
            .await
            .map_err(Self::network_error)?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        // Con confirmación por correo llega el usuario; si no, una sesión con `user`
        let body: Value = response
            .json()
            .await
            .map_err(|e| IdentityError::Unavailable(format!("Respuesta inválida: {}", e)))?;
        let user_id = body
            .get("user")
            .and_then(|user| user.get("id"))
            .or_else(|| body.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string);
        Ok(user_id)
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), IdentityError> {
        let response = self
            .client
            .post(self.url("recover"))
            .header("apikey", &self.anon_key)
            .json(&RecoverRequest { email })
            .send()
            .await
            .map_err(Self::network_error)?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        Ok(())
    }
}

/// Proveedor usado cuando no hay `SUPABASE_URL`/`SUPABASE_ANON_KEY`
pub struct UnconfiguredIdentityProvider;

const UNCONFIGURED: &str = "SUPABASE_URL o SUPABASE_ANON_KEY no configurados";

#[async_trait]
impl IdentityProvider for UnconfiguredIdentityProvider {
    async fn sign_in(&self, _email: &str, _password: &str) -> Result<Principal, IdentityError> {
        Err(IdentityError::Unavailable(UNCONFIGURED.to_string()))
    }

    async fn sign_out(&self, _access_token: &str) -> Result<(), IdentityError> {
        Ok(())
    }

    async fn sign_up(&self, _email: &str, _password: &str) -> Result<Option<String>, IdentityError> {
        warn!("⚠️ Alta en el proveedor omitida: {}", UNCONFIGURED);
        Err(IdentityError::Unavailable(UNCONFIGURED.to_string()))
    }

    async fn send_password_reset(&self, _email: &str) -> Result<(), IdentityError> {
        Err(IdentityError::Unavailable(UNCONFIGURED.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_sign_in_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .and(header("apikey", "anon"))
            .and(body_json(json!({ "email": "admin@valpotec.cl", "password": "secreto" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "jwt-token",
                "token_type": "bearer",
                "expires_in": 3600,
                "refresh_token": "refresh",
                "user": { "id": "uid-123", "email": "admin@valpotec.cl" }
            })))
            .mount(&server)
            .await;

        let client = SupabaseAuthClient::new(&server.uri(), "anon").unwrap();
        let principal = client.sign_in("admin@valpotec.cl", "secreto").await.unwrap();
        assert_eq!(principal.user_id, "uid-123");
        assert_eq!(principal.access_token.as_deref(), Some("jwt-token"));
    }

    #[tokio::test]
    async fn test_sign_in_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials"
            })))
            .mount(&server)
            .await;

        let client = SupabaseAuthClient::new(&server.uri(), "anon").unwrap();
        let err = client.sign_in("admin@valpotec.cl", "mala").await.unwrap_err();
        assert_eq!(err, IdentityError::Rejected("Invalid login credentials".to_string()));
    }

    #[tokio::test]
    async fn test_server_error_means_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/recover"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = SupabaseAuthClient::new(&server.uri(), "anon").unwrap();
        let err = client.send_password_reset("a@b.cl").await.unwrap_err();
        assert!(matches!(err, IdentityError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_sign_up_returns_user_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "new-uid",
                "email": "tecnico@valpotec.cl"
            })))
            .mount(&server)
            .await;

        let client = SupabaseAuthClient::new(&format!("{}/", server.uri()), "anon").unwrap();
        let uid = client.sign_up("tecnico@valpotec.cl", "clave123").await.unwrap();
        assert_eq!(uid.as_deref(), Some("new-uid"));
    }

    #[tokio::test]
    async fn test_sign_out_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .and(header("authorization", "Bearer jwt-token"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = SupabaseAuthClient::new(&server.uri(), "anon").unwrap();
        client.sign_out("jwt-token").await.unwrap();
    }

    #[tokio::test]
    async fn test_unconfigured_provider_is_unavailable() {
        let err = UnconfiguredIdentityProvider
            .sign_in("a@b.cl", "x")
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::Unavailable(_)));
    }
}
