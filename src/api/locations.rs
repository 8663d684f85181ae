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
use crate::models::{CreateLocationRequest, Location, LocationResponse, UpdateLocationRequest};
use crate::utils::validators::sanitize_string;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_locations).post(create_location))
        .route(
            "/:id",
            get(get_location).put(update_location).delete(delete_location),
        )
}

async fn plot_count(state: &AppState, location_id: Uuid) -> AppResult<i64> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM plots WHERE location_id = $1")
        .bind(location_id)
        .fetch_one(&state.pool)
        .await?;
    Ok(count.0)
}

/// Список локаций
#[utoipa::path(
    get,
    path = "/api/v1/locations",
    tag = "locations",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Список локаций", body = Vec<LocationResponse>),
        (status = 401, description = "Не авторизован")
    )
)]
pub async fn list_locations(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> AppResult<Json<Vec<LocationResponse>>> {
    let locations = sqlx::query_as::<_, Location>("SELECT * FROM locations ORDER BY name")
        .fetch_all(&state.pool)
        .await?;

    let mut response = Vec::with_capacity(locations.len());
    for location in locations {
        let plots = plot_count(&state, location.id).await?;
        response.push(LocationResponse {
            id: location.id,
            name: location.name,
            description: location.description,
            plot_count: plots,
            created_at: location.created_at,
        });
    }

    Ok(Json(response))
}

/// Создать локацию
#[utoipa::path(
    post,
    path = "/api/v1/locations",
    tag = "locations",
    security(("bearer_auth" = [])),
    request_body = CreateLocationRequest,
    responses(
        (status = 201, description = "Локация создана", body = LocationResponse),
        (status = 401, description = "Не авторизован"),
        (status = 403, description = "Нет прав"),
        (status = 422, description = "Пустое название")
    )
)]
pub async fn create_location(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreateLocationRequest>,
) -> AppResult<(StatusCode, Json<LocationResponse>)> {
    if !is_admin(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let name = sanitize_string(&payload.name);
    if name.is_empty() {
        return Err(AppError::Validation(
            "Название локации не может быть пустым".to_string(),
        ));
    }

    let location = sqlx::query_as::<_, Location>(
        r#"
        INSERT INTO locations (name, description)
        VALUES ($1, $2)
        RETURNING *
        "#,
    )
    .bind(&name)
    .bind(&payload.description)
    .fetch_one(&state.pool)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(LocationResponse {
            id: location.id,
            name: location.name,
            description: location.description,
            plot_count: 0,
            created_at: location.created_at,
        }),
    ))
}

/// Получить локацию по ID
#[utoipa::path(
    get,
    path = "/api/v1/locations/{id}",
    tag = "locations",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "ID локации")
    ),
    responses(
        (status = 200, description = "Локация", body = LocationResponse),
        (status = 401, description = "Не авторизован"),
        (status = 404, description = "Локация не найдена")
    )
)]
pub async fn get_location(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<LocationResponse>> {
    let location = sqlx::query_as::<_, Location>("SELECT * FROM locations WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Локация не найдена".to_string()))?;

    let plots = plot_count(&state, location.id).await?;
    Ok(Json(LocationResponse {
        id: location.id,
        name: location.name,
        description: location.description,
        plot_count: plots,
        created_at: location.created_at,
    }))
}

/// Обновить локацию
#[utoipa::path(
    put,
    path = "/api/v1/locations/{id}",
    tag = "locations",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "ID локации")
    ),
    request_body = UpdateLocationRequest,
    responses(
        (status = 200, description = "Локация обновлена", body = LocationResponse),
        (status = 401, description = "Не авторизован"),
        (status = 403, description = "Нет прав"),
        (status = 404, description = "Локация не найдена")
    )
)]
pub async fn update_location(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLocationRequest>,
) -> AppResult<Json<LocationResponse>> {
    if !is_admin(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let existing = sqlx::query_as::<_, Location>("SELECT * FROM locations WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Локация не найдена".to_string()))?;

    let name = match payload.name {
        Some(name) => {
            let name = sanitize_string(&name);
            if name.is_empty() {
                return Err(AppError::Validation(
                    "Название локации не может быть пустым".to_string(),
                ));
            }
            name
        }
        None => existing.name,
    };
    // Some(None) — явный null в запросе, описание очищается
    let description = match payload.description {
        Some(description) => description,
        None => existing.description,
    };

    let location = sqlx::query_as::<_, Location>(
        r#"
        UPDATE locations
        SET name = $1, description = $2, updated_at = NOW()
        WHERE id = $3
        RETURNING *
        "#,
    )
    .bind(&name)
    .bind(&description)
    .bind(id)
    .fetch_one(&state.pool)
    .await?;

    let plots = plot_count(&state, location.id).await?;
    Ok(Json(LocationResponse {
        id: location.id,
        name: location.name,
        description: location.description,
        plot_count: plots,
        created_at: location.created_at,
    }))
}

/// Удалить локацию, отвязав её участки
#[utoipa::path(
    delete,
    path = "/api/v1/locations/{id}",
    tag = "locations",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "ID локации")
    ),
    responses(
        (status = 200, description = "Локация удалена"),
        (status = 401, description = "Не авторизован"),
        (status = 403, description = "Нет прав"),
        (status = 404, description = "Локация не найдена")
    )
)]
pub async fn delete_location(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    if !is_admin(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let mut tx = state.pool.begin().await?;

    let location: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM locations WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
    if location.is_none() {
        return Err(AppError::NotFound("Локация не найдена".to_string()));
    }

    // Участки переживают локацию, ссылка просто снимается
    sqlx::query("UPDATE plots SET location_id = NULL, updated_at = NOW() WHERE location_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM locations WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(Json(json!({
        "success": true,
        "message": "Локация удалена"
    })))
}
