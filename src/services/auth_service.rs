use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::UserRole;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub role: String,
    pub exp: i64,
    pub iat: i64,
    pub token_type: String,
}

/// Токены выдаёт внешний сервис идентификации; здесь только проверка
/// и выпуск access-токенов для служебных нужд.
pub struct AuthService {
    config: Config,
}

impl AuthService {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn generate_access_token(&self, user_id: Uuid, role: &UserRole) -> AppResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.config.jwt_access_expiry);

        let claims = Claims {
            sub: user_id.to_string(),
            role: format!("{:?}", role).to_lowercase(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            token_type: "access".to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(AppError::from)
    }

    pub fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &Validation::default(),
        )?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_url: "postgres://localhost/test".to_string(),
            jwt_secret: "test-secret".to_string(),
            jwt_access_expiry: 900,
        }
    }

    #[test]
    fn test_token_round_trip() {
        let service = AuthService::new(test_config());
        let user_id = Uuid::new_v4();

        let token = service
            .generate_access_token(user_id, &UserRole::Admin)
            .unwrap();
        let claims = service.verify_token(&token).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.token_type, "access");
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let service = AuthService::new(test_config());
        let token = service
            .generate_access_token(Uuid::new_v4(), &UserRole::Collector)
            .unwrap();

        let mut other_config = test_config();
        other_config.jwt_secret = "other-secret".to_string();
        let other = AuthService::new(other_config);

        assert!(other.verify_token(&token).is_err());
    }
}
