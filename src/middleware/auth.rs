use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::Config;
use crate::models::UserRole;
use crate::services::AuthService;

#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: UserRole,
}

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
}

pub fn is_admin(role: &UserRole) -> bool {
    matches!(role, UserRole::Admin)
}

/// Админ видит платежи любого участка, сборщик — только назначенных ему
pub fn can_view_plot_payments(user: &AuthUser, assigned: &[Uuid]) -> bool {
    is_admin(&user.role) || assigned.contains(&user.user_id)
}

fn parse_role(role_str: &str) -> UserRole {
    match role_str {
        "admin" => UserRole::Admin,
        _ => UserRole::Collector,
    }
}

// Middleware для добавления AppState в extensions
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    request.extensions_mut().insert(state);
    next.run(request).await
}

// Экстрактор для авторизованного пользователя
#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let app_state = parts.extensions.get::<AppState>().cloned().ok_or_else(|| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Internal server error"})),
            )
                .into_response()
        })?;

        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"error": "Missing authorization header"})),
                )
                    .into_response()
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "Invalid authorization header format"})),
            )
                .into_response()
        })?;

        let auth_service = AuthService::new(app_state.config);
        let claims = auth_service.verify_token(token).map_err(|_| {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "Invalid or expired token"})),
            )
                .into_response()
        })?;

        if claims.token_type != "access" {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "Invalid token type"})),
            )
                .into_response());
        }

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "Invalid user ID in token"})),
            )
                .into_response()
        })?;

        let role = parse_role(&claims.role);

        Ok(AuthUser { user_id, role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth(role: UserRole) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            role,
        }
    }

    #[test]
    fn test_admin_views_any_plot() {
        assert!(can_view_plot_payments(&auth(UserRole::Admin), &[]));
    }

    #[test]
    fn test_assigned_collector_views_own_plot() {
        let user = auth(UserRole::Collector);
        assert!(can_view_plot_payments(
            &user,
            &[Uuid::new_v4(), user.user_id]
        ));
    }

    #[test]
    fn test_foreign_collector_is_denied() {
        let user = auth(UserRole::Collector);
        assert!(!can_view_plot_payments(&user, &[Uuid::new_v4()]));
    }
}
