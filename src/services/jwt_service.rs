use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::models::{Session, SessionClaims};
use crate::utils::errors::{AppError, AppResult};

/// Servicio JWT para los tokens de sesión
pub struct JwtService {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(secret: &str) -> Self {
        Self {
            algorithm: Algorithm::HS256,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Genera el token de una sesión; vence junto con la sesión
    pub fn issue(&self, session: &Session) -> AppResult<String> {
        let claims = SessionClaims {
            sub: session.id.to_string(),
            email: session.email.clone(),
            exp: session.expires_at.timestamp(),
            iat: Utc::now().timestamp(),
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Error generando token: {}", e)))
    }

    /// Valida y decodifica un token
    pub fn validate(&self, token: &str) -> AppResult<SessionClaims> {
        let validation = Validation::new(self.algorithm);

        decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::Unauthorized(format!("Token inválido: {}", e)))
    }

    /// Extrae el id de sesión del token
    pub fn session_id(&self, token: &str) -> AppResult<Uuid> {
        let claims = self.validate(token)?;
        Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthorized("Token inválido".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AuthMethod;
    use chrono::Duration;

    fn session(expires_in: Duration) -> Session {
        let now = Utc::now();
        Session {
            id: Uuid::new_v4(),
            email: "admin@valpotec.cl".to_string(),
            method: AuthMethod::LocalPassword,
            provider_token: None,
            created_at: now,
            expires_at: now + expires_in,
        }
    }

    #[test]
    fn test_issue_and_validate_token() {
        let jwt_service = JwtService::new("test-secret");
        let session = session(Duration::hours(1));

        let token = jwt_service.issue(&session).unwrap();
        assert!(!token.is_empty());

        let claims = jwt_service.validate(&token).unwrap();
        assert_eq!(claims.sub, session.id.to_string());
        assert_eq!(claims.email, "admin@valpotec.cl");
        assert_eq!(jwt_service.session_id(&token).unwrap(), session.id);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let jwt_service = JwtService::new("test-secret");
        let token = jwt_service.issue(&session(Duration::hours(-2))).unwrap();
        assert!(matches!(jwt_service.validate(&token), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let token = JwtService::new("otro").issue(&session(Duration::hours(1))).unwrap();
        assert!(JwtService::new("test-secret").validate(&token).is_err());
    }
}
