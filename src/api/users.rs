use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{is_admin, AppState, AuthUser};
use crate::models::{CreateUserRequest, UpdateUserRequest, User, UserResponse, UserRole};
use crate::utils::validators::{sanitize_string, validate_phone};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
}

/// Список пользователей
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Список пользователей", body = Vec<UserResponse>),
        (status = 401, description = "Не авторизован"),
        (status = 403, description = "Нет прав")
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<Vec<UserResponse>>> {
    if !is_admin(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY full_name")
        .fetch_all(&state.pool)
        .await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Создать пользователя
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Пользователь создан", body = UserResponse),
        (status = 401, description = "Не авторизован"),
        (status = 403, description = "Нет прав"),
        (status = 409, description = "Телефон занят"),
        (status = 422, description = "Неверные данные")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    if !is_admin(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let full_name = sanitize_string(&payload.full_name);
    if full_name.is_empty() {
        return Err(AppError::Validation("Имя не может быть пустым".to_string()));
    }
    if !validate_phone(&payload.phone) {
        return Err(AppError::Validation(
            "Неверный формат телефона".to_string(),
        ));
    }

    let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE phone = $1")
        .bind(&payload.phone)
        .fetch_optional(&state.pool)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(
            "Пользователь с таким телефоном уже существует".to_string(),
        ));
    }

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (full_name, phone, email, role)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(&full_name)
    .bind(&payload.phone)
    .bind(&payload.email)
    .bind(payload.role.unwrap_or(UserRole::Collector))
    .fetch_one(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Получить пользователя по ID
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "ID пользователя")
    ),
    responses(
        (status = 200, description = "Пользователь", body = UserResponse),
        (status = 401, description = "Не авторизован"),
        (status = 404, description = "Пользователь не найден")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserResponse>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Пользователь не найден".to_string()))?;

    Ok(Json(UserResponse::from(user)))
}

/// Обновить пользователя
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "ID пользователя")
    ),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Пользователь обновлён", body = UserResponse),
        (status = 401, description = "Не авторизован"),
        (status = 403, description = "Нет прав"),
        (status = 404, description = "Пользователь не найден"),
        (status = 409, description = "Телефон занят")
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    if !is_admin(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let existing = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Пользователь не найден".to_string()))?;

    let full_name = match payload.full_name {
        Some(name) => {
            let name = sanitize_string(&name);
            if name.is_empty() {
                return Err(AppError::Validation("Имя не может быть пустым".to_string()));
            }
            name
        }
        None => existing.full_name,
    };

    let phone = match payload.phone {
        Some(phone) => {
            if !validate_phone(&phone) {
                return Err(AppError::Validation(
                    "Неверный формат телефона".to_string(),
                ));
            }
            if phone != existing.phone {
                let taken: Option<(Uuid,)> =
                    sqlx::query_as("SELECT id FROM users WHERE phone = $1")
                        .bind(&phone)
                        .fetch_optional(&state.pool)
                        .await?;
                if taken.is_some() {
                    return Err(AppError::Conflict(
                        "Пользователь с таким телефоном уже существует".to_string(),
                    ));
                }
            }
            phone
        }
        None => existing.phone,
    };

    // Some(None) — явный null в запросе, email очищается
    let email = match payload.email {
        Some(email) => email,
        None => existing.email,
    };
    let role = payload.role.unwrap_or(existing.role);
    let is_active = payload.is_active.unwrap_or(existing.is_active);

    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET full_name = $1, phone = $2, email = $3, role = $4, is_active = $5, updated_at = NOW()
        WHERE id = $6
        RETURNING *
        "#,
    )
    .bind(&full_name)
    .bind(&phone)
    .bind(&email)
    .bind(role)
    .bind(is_active)
    .bind(id)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(UserResponse::from(user)))
}

/// Удалить пользователя и снять его со всех участков
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "ID пользователя")
    ),
    responses(
        (status = 200, description = "Пользователь удалён"),
        (status = 401, description = "Не авторизован"),
        (status = 403, description = "Нет прав"),
        (status = 404, description = "Пользователь не найден")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    if !is_admin(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let mut tx = state.pool.begin().await?;

    let user: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
    if user.is_none() {
        return Err(AppError::NotFound("Пользователь не найден".to_string()));
    }

    // Ссылки на удалённого сборщика вычищаются из всех участков
    sqlx::query("UPDATE plots SET users = array_remove(users, $1), updated_at = NOW() WHERE $1 = ANY(users)")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(Json(json!({
        "success": true,
        "message": "Пользователь удалён"
    })))
}
