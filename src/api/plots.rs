use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{is_admin, AppState, AuthUser};
use crate::models::{CreatePlotRequest, Plot, PlotResponse, PlotsQuery, UpdatePlotRequest};
use crate::utils::validators::{sanitize_string, validate_plot_number};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_plots).post(create_plot))
        .route("/:id", get(get_plot).put(update_plot).delete(delete_plot))
        .route(
            "/:id/users/:user_id",
            post(assign_user).delete(unassign_user),
        )
}

async fn location_name(state: &AppState, location_id: Option<Uuid>) -> AppResult<Option<String>> {
    let Some(id) = location_id else {
        return Ok(None);
    };

    let name: Option<(String,)> = sqlx::query_as("SELECT name FROM locations WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;

    Ok(name.map(|(n,)| n))
}

/// Список участков
#[utoipa::path(
    get,
    path = "/api/v1/plots",
    tag = "plots",
    security(("bearer_auth" = [])),
    params(PlotsQuery),
    responses(
        (status = 200, description = "Список участков", body = Vec<PlotResponse>),
        (status = 401, description = "Не авторизован")
    )
)]
pub async fn list_plots(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(query): Query<PlotsQuery>,
) -> AppResult<Json<Vec<PlotResponse>>> {
    let plots = sqlx::query_as::<_, Plot>(
        r#"
        SELECT * FROM plots
        WHERE ($1::uuid IS NULL OR location_id = $1)
        ORDER BY plot_number
        "#,
    )
    .bind(query.location_id)
    .fetch_all(&state.pool)
    .await?;

    let mut response = Vec::with_capacity(plots.len());
    for plot in plots {
        let name = location_name(&state, plot.location_id).await?;
        response.push(PlotResponse::from_plot(plot, name));
    }

    Ok(Json(response))
}

/// Создать участок
#[utoipa::path(
    post,
    path = "/api/v1/plots",
    tag = "plots",
    security(("bearer_auth" = [])),
    request_body = CreatePlotRequest,
    responses(
        (status = 201, description = "Участок создан", body = PlotResponse),
        (status = 401, description = "Не авторизован"),
        (status = 403, description = "Нет прав"),
        (status = 404, description = "Локация не найдена"),
        (status = 409, description = "Номер участка занят"),
        (status = 422, description = "Неверный номер участка")
    )
)]
pub async fn create_plot(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreatePlotRequest>,
) -> AppResult<(StatusCode, Json<PlotResponse>)> {
    if !is_admin(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let plot_number = sanitize_string(&payload.plot_number);
    if !validate_plot_number(&plot_number) {
        return Err(AppError::Validation(
            "Неверный номер участка".to_string(),
        ));
    }
    if payload.bags_required < 0 {
        return Err(AppError::Validation(
            "Количество мешков не может быть отрицательным".to_string(),
        ));
    }

    if let Some(location_id) = payload.location_id {
        let location: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM locations WHERE id = $1")
            .bind(location_id)
            .fetch_optional(&state.pool)
            .await?;
        if location.is_none() {
            return Err(AppError::NotFound("Локация не найдена".to_string()));
        }
    }

    let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM plots WHERE plot_number = $1")
        .bind(&plot_number)
        .fetch_optional(&state.pool)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(
            "Участок с таким номером уже существует".to_string(),
        ));
    }

    let plot = sqlx::query_as::<_, Plot>(
        r#"
        INSERT INTO plots (plot_number, bags_required, location_id)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(&plot_number)
    .bind(payload.bags_required)
    .bind(payload.location_id)
    .fetch_one(&state.pool)
    .await?;

    let name = location_name(&state, plot.location_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(PlotResponse::from_plot(plot, name)),
    ))
}

/// Получить участок по ID
#[utoipa::path(
    get,
    path = "/api/v1/plots/{id}",
    tag = "plots",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "ID участка")
    ),
    responses(
        (status = 200, description = "Участок", body = PlotResponse),
        (status = 401, description = "Не авторизован"),
        (status = 404, description = "Участок не найден")
    )
)]
pub async fn get_plot(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<PlotResponse>> {
    let plot = sqlx::query_as::<_, Plot>("SELECT * FROM plots WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Участок не найден".to_string()))?;

    let name = location_name(&state, plot.location_id).await?;
    Ok(Json(PlotResponse::from_plot(plot, name)))
}

/// Обновить участок
#[utoipa::path(
    put,
    path = "/api/v1/plots/{id}",
    tag = "plots",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "ID участка")
    ),
    request_body = UpdatePlotRequest,
    responses(
        (status = 200, description = "Участок обновлён", body = PlotResponse),
        (status = 401, description = "Не авторизован"),
        (status = 403, description = "Нет прав"),
        (status = 404, description = "Участок не найден"),
        (status = 409, description = "Номер участка занят")
    )
)]
pub async fn update_plot(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePlotRequest>,
) -> AppResult<Json<PlotResponse>> {
    if !is_admin(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let existing = sqlx::query_as::<_, Plot>("SELECT * FROM plots WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Участок не найден".to_string()))?;

    let plot_number = match payload.plot_number {
        Some(number) => {
            let number = sanitize_string(&number);
            if !validate_plot_number(&number) {
                return Err(AppError::Validation(
                    "Неверный номер участка".to_string(),
                ));
            }
            if number != existing.plot_number {
                let taken: Option<(Uuid,)> =
                    sqlx::query_as("SELECT id FROM plots WHERE plot_number = $1")
                        .bind(&number)
                        .fetch_optional(&state.pool)
                        .await?;
                if taken.is_some() {
                    return Err(AppError::Conflict(
                        "Участок с таким номером уже существует".to_string(),
                    ));
                }
            }
            number
        }
        None => existing.plot_number,
    };

    let bags_required = payload.bags_required.unwrap_or(existing.bags_required);
    if bags_required < 0 {
        return Err(AppError::Validation(
            "Количество мешков не может быть отрицательным".to_string(),
        ));
    }

    // Some(None) — явный null в запросе, участок отвязывается от локации
    let location_id = match payload.location_id {
        Some(Some(location_id)) => {
            let location: Option<(Uuid,)> =
                sqlx::query_as("SELECT id FROM locations WHERE id = $1")
                    .bind(location_id)
                    .fetch_optional(&state.pool)
                    .await?;
            if location.is_none() {
                return Err(AppError::NotFound("Локация не найдена".to_string()));
            }
            Some(location_id)
        }
        Some(None) => None,
        None => existing.location_id,
    };

    let plot = sqlx::query_as::<_, Plot>(
        r#"
        UPDATE plots
        SET plot_number = $1, bags_required = $2, location_id = $3, updated_at = NOW()
        WHERE id = $4
        RETURNING *
        "#,
    )
    .bind(&plot_number)
    .bind(bags_required)
    .bind(location_id)
    .bind(id)
    .fetch_one(&state.pool)
    .await?;

    let name = location_name(&state, plot.location_id).await?;
    Ok(Json(PlotResponse::from_plot(plot, name)))
}

/// Удалить участок вместе с его платежами
#[utoipa::path(
    delete,
    path = "/api/v1/plots/{id}",
    tag = "plots",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "ID участка")
    ),
    responses(
        (status = 200, description = "Участок удалён"),
        (status = 401, description = "Не авторизован"),
        (status = 403, description = "Нет прав"),
        (status = 404, description = "Участок не найден")
    )
)]
pub async fn delete_plot(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    if !is_admin(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let mut tx = state.pool.begin().await?;

    let plot: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM plots WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
    if plot.is_none() {
        return Err(AppError::NotFound("Участок не найден".to_string()));
    }

    // Платежи участка не живут без него
    sqlx::query("DELETE FROM payments WHERE plot_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM plots WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(Json(json!({
        "success": true,
        "message": "Участок удалён"
    })))
}

/// Назначить сборщика на участок
#[utoipa::path(
    post,
    path = "/api/v1/plots/{id}/users/{user_id}",
    tag = "plots",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "ID участка"),
        ("user_id" = Uuid, Path, description = "ID пользователя")
    ),
    responses(
        (status = 200, description = "Пользователь назначен"),
        (status = 401, description = "Не авторизован"),
        (status = 403, description = "Нет прав"),
        (status = 404, description = "Участок или пользователь не найден"),
        (status = 409, description = "Пользователь уже назначен")
    )
)]
pub async fn assign_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<Value>> {
    if !is_admin(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let plot = sqlx::query_as::<_, Plot>("SELECT * FROM plots WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Участок не найден".to_string()))?;

    let user: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&state.pool)
        .await?;
    if user.is_none() {
        return Err(AppError::NotFound("Пользователь не найден".to_string()));
    }

    if plot.users.contains(&user_id) {
        return Err(AppError::Conflict(
            "Пользователь уже назначен на участок".to_string(),
        ));
    }

    sqlx::query(
        "UPDATE plots SET users = array_append(users, $1), updated_at = NOW() WHERE id = $2",
    )
    .bind(user_id)
    .bind(id)
    .execute(&state.pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Пользователь назначен"
    })))
}

/// Снять сборщика с участка
#[utoipa::path(
    delete,
    path = "/api/v1/plots/{id}/users/{user_id}",
    tag = "plots",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "ID участка"),
        ("user_id" = Uuid, Path, description = "ID пользователя")
    ),
    responses(
        (status = 200, description = "Пользователь снят"),
        (status = 401, description = "Не авторизован"),
        (status = 403, description = "Нет прав"),
        (status = 404, description = "Участок не найден")
    )
)]
pub async fn unassign_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<Value>> {
    if !is_admin(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let plot: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM plots WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    if plot.is_none() {
        return Err(AppError::NotFound("Участок не найден".to_string()));
    }

    sqlx::query(
        "UPDATE plots SET users = array_remove(users, $1), updated_at = NOW() WHERE id = $2",
    )
    .bind(user_id)
    .bind(id)
    .execute(&state.pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Пользователь снят с участка"
    })))
}
