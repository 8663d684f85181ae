use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{can_view_plot_payments, is_admin, AppState, AuthUser};
use crate::models::{
    CreatePaymentRequest, MonthlySummary, PaymentResponse, PaymentSchedule, RolloverDraft,
    UpdatePaymentRequest,
};
use crate::utils::period::derive_period;
use crate::utils::validators::{validate_month_name, validate_year};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_payment))
        .route("/plot/:plot_id", get(list_plot_payments))
        .route("/:id", put(update_payment).delete(delete_payment))
        .route("/transfer/:plot_id", post(transfer_payments))
        .route("/summary/:month/:year", get(get_monthly_summary))
}

fn validate_amounts(expected: Decimal, paid: Decimal) -> AppResult<()> {
    if expected < Decimal::ZERO {
        return Err(AppError::Validation(
            "Ожидаемая сумма не может быть отрицательной".to_string(),
        ));
    }
    if paid < Decimal::ZERO {
        return Err(AppError::Validation(
            "Оплаченная сумма не может быть отрицательной".to_string(),
        ));
    }
    if paid > expected {
        return Err(AppError::Validation(
            "Оплаченная сумма не может превышать ожидаемую".to_string(),
        ));
    }
    Ok(())
}

/// Получить платежи участка
#[utoipa::path(
    get,
    path = "/api/v1/payments/plot/{plot_id}",
    tag = "payments",
    security(("bearer_auth" = [])),
    params(
        ("plot_id" = Uuid, Path, description = "ID участка")
    ),
    responses(
        (status = 200, description = "Платежи участка по возрастанию срока оплаты", body = Vec<PaymentResponse>),
        (status = 401, description = "Не авторизован"),
        (status = 403, description = "Участок не назначен сборщику")
    )
)]
pub async fn list_plot_payments(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(plot_id): Path<Uuid>,
) -> AppResult<Json<Vec<PaymentResponse>>> {
    let assigned: Option<(Vec<Uuid>,)> = sqlx::query_as("SELECT users FROM plots WHERE id = $1")
        .bind(plot_id)
        .fetch_optional(&state.pool)
        .await?;

    let assigned = assigned.map(|(users,)| users).unwrap_or_default();
    if !can_view_plot_payments(&auth_user, &assigned) {
        return Err(AppError::Forbidden);
    }

    let payments = sqlx::query_as::<_, PaymentSchedule>(
        r#"
        SELECT * FROM payments
        WHERE plot_id = $1
        ORDER BY due_date ASC
        "#,
    )
    .bind(plot_id)
    .fetch_all(&state.pool)
    .await?;

    let today = Utc::now().date_naive();
    let response = payments
        .into_iter()
        .map(|p| PaymentResponse::from_schedule(p, today))
        .collect();

    Ok(Json(response))
}

/// Создать платёж
#[utoipa::path(
    post,
    path = "/api/v1/payments",
    tag = "payments",
    security(("bearer_auth" = [])),
    request_body = CreatePaymentRequest,
    responses(
        (status = 201, description = "Платёж создан", body = PaymentResponse),
        (status = 401, description = "Не авторизован"),
        (status = 403, description = "Нет прав"),
        (status = 404, description = "Участок не найден"),
        (status = 422, description = "Неверные суммы")
    )
)]
pub async fn create_payment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreatePaymentRequest>,
) -> AppResult<(StatusCode, Json<PaymentResponse>)> {
    if !is_admin(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let paid_amount = payload.paid_amount.unwrap_or(Decimal::ZERO);
    validate_amounts(payload.expected_amount, paid_amount)?;

    let (month, year) = derive_period(payload.due_date);

    // Запись платежа и обратная ссылка участка пишутся одной транзакцией,
    // иначе сбой между ними оставит платёж-сироту
    let mut tx = state.pool.begin().await?;

    let plot: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM plots WHERE id = $1")
        .bind(payload.plot_id)
        .fetch_optional(&mut *tx)
        .await?;

    if plot.is_none() {
        return Err(AppError::NotFound("Участок не найден".to_string()));
    }

    let payment = sqlx::query_as::<_, PaymentSchedule>(
        r#"
        INSERT INTO payments (plot_id, expected_amount, paid_amount, due_date, is_paid, month, year, carried_over)
        VALUES ($1, $2, $3, $4, $5, $6, $7, false)
        RETURNING *
        "#,
    )
    .bind(payload.plot_id)
    .bind(payload.expected_amount)
    .bind(paid_amount)
    .bind(payload.due_date)
    .bind(payload.is_paid.unwrap_or(false))
    .bind(&month)
    .bind(&year)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE plots SET payment_schedules = array_append(payment_schedules, $1), updated_at = NOW() WHERE id = $2",
    )
    .bind(payment.id)
    .bind(payload.plot_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    let today = Utc::now().date_naive();
    Ok((
        StatusCode::CREATED,
        Json(PaymentResponse::from_schedule(payment, today)),
    ))
}

/// Обновить платёж
///
/// Передаются только изменяемые поля; явный ноль и false применяются.
/// is_paid берётся из запроса как есть и не выводится из сумм.
#[utoipa::path(
    put,
    path = "/api/v1/payments/{id}",
    tag = "payments",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "ID платежа")
    ),
    request_body = UpdatePaymentRequest,
    responses(
        (status = 200, description = "Платёж обновлён", body = PaymentResponse),
        (status = 401, description = "Не авторизован"),
        (status = 403, description = "Нет прав"),
        (status = 404, description = "Платёж не найден"),
        (status = 422, description = "Неверные суммы")
    )
)]
pub async fn update_payment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePaymentRequest>,
) -> AppResult<Json<PaymentResponse>> {
    if !is_admin(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let existing = sqlx::query_as::<_, PaymentSchedule>("SELECT * FROM payments WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Платёж не найден".to_string()))?;

    let merged = payload.merge_with(&existing);
    validate_amounts(merged.expected_amount, merged.paid_amount)?;

    // Метки месяца и года всегда следуют за due_date
    let (month, year) = derive_period(merged.due_date);

    let payment = sqlx::query_as::<_, PaymentSchedule>(
        r#"
        UPDATE payments
        SET expected_amount = $1,
            paid_amount = $2,
            due_date = $3,
            is_paid = $4,
            month = $5,
            year = $6,
            updated_at = NOW()
        WHERE id = $7
        RETURNING *
        "#,
    )
    .bind(merged.expected_amount)
    .bind(merged.paid_amount)
    .bind(merged.due_date)
    .bind(merged.is_paid)
    .bind(&month)
    .bind(&year)
    .bind(id)
    .fetch_one(&state.pool)
    .await?;

    let today = Utc::now().date_naive();
    Ok(Json(PaymentResponse::from_schedule(payment, today)))
}

/// Удалить платёж
#[utoipa::path(
    delete,
    path = "/api/v1/payments/{id}",
    tag = "payments",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "ID платежа")
    ),
    responses(
        (status = 200, description = "Платёж удалён"),
        (status = 401, description = "Не авторизован"),
        (status = 403, description = "Нет прав"),
        (status = 404, description = "Платёж не найден")
    )
)]
pub async fn delete_payment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    if !is_admin(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let mut tx = state.pool.begin().await?;

    let payment = sqlx::query_as::<_, PaymentSchedule>("SELECT * FROM payments WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Платёж не найден".to_string()))?;

    sqlx::query("DELETE FROM payments WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    // Точечное удаление id из списка участка, остальные платежи не трогаем
    sqlx::query(
        "UPDATE plots SET payment_schedules = array_remove(payment_schedules, $1), updated_at = NOW() WHERE id = $2",
    )
    .bind(id)
    .bind(payment.plot_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(Json(json!({
        "success": true,
        "message": "Платёж удалён"
    })))
}

/// Сводка за месяц
#[utoipa::path(
    get,
    path = "/api/v1/payments/summary/{month}/{year}",
    tag = "payments",
    security(("bearer_auth" = [])),
    params(
        ("month" = String, Path, description = "Полное название месяца, например March"),
        ("year" = String, Path, description = "Год из четырёх цифр")
    ),
    responses(
        (status = 200, description = "Агрегаты за месяц", body = MonthlySummary),
        (status = 400, description = "Неверный месяц или год"),
        (status = 401, description = "Не авторизован"),
        (status = 403, description = "Нет прав")
    )
)]
pub async fn get_monthly_summary(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((month, year)): Path<(String, String)>,
) -> AppResult<Json<MonthlySummary>> {
    if !is_admin(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    if !validate_month_name(&month) {
        return Err(AppError::BadRequest(
            "Неверное название месяца".to_string(),
        ));
    }
    if !validate_year(&year) {
        return Err(AppError::BadRequest("Неверный год".to_string()));
    }

    let schedules = sqlx::query_as::<_, PaymentSchedule>(
        "SELECT * FROM payments WHERE month = $1 AND year = $2",
    )
    .bind(&month)
    .bind(&year)
    .fetch_all(&state.pool)
    .await?;

    // Пустой месяц — это нулевая сводка, а не ошибка
    Ok(Json(MonthlySummary::from_schedules(&schedules)))
}

/// Перенести неоплаченные платежи участка на следующий месяц
///
/// Для каждого неоплаченного платежа создаётся новая запись с той же
/// ожидаемой суммой, нулевой оплатой и сроком на 1-е число следующего
/// календарного месяца. Исходные записи не изменяются, поэтому повторный
/// вызов создаст дубликаты переноса.
#[utoipa::path(
    post,
    path = "/api/v1/payments/transfer/{plot_id}",
    tag = "payments",
    security(("bearer_auth" = [])),
    params(
        ("plot_id" = Uuid, Path, description = "ID участка")
    ),
    responses(
        (status = 200, description = "Созданные переносы", body = Vec<PaymentResponse>),
        (status = 400, description = "Нет неоплаченных платежей"),
        (status = 401, description = "Не авторизован"),
        (status = 403, description = "Нет прав"),
        (status = 404, description = "Участок не найден")
    )
)]
pub async fn transfer_payments(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(plot_id): Path<Uuid>,
) -> AppResult<Json<Vec<PaymentResponse>>> {
    if !is_admin(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let mut tx = state.pool.begin().await?;

    let plot: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM plots WHERE id = $1")
        .bind(plot_id)
        .fetch_optional(&mut *tx)
        .await?;

    if plot.is_none() {
        return Err(AppError::NotFound("Участок не найден".to_string()));
    }

    let unpaid = sqlx::query_as::<_, PaymentSchedule>(
        r#"
        SELECT * FROM payments
        WHERE plot_id = $1 AND is_paid = false
        ORDER BY due_date ASC
        "#,
    )
    .bind(plot_id)
    .fetch_all(&mut *tx)
    .await?;

    if unpaid.is_empty() {
        return Err(AppError::BadRequest(
            "Нет неоплаченных платежей для переноса".to_string(),
        ));
    }

    let today = Utc::now().date_naive();
    let drafts = RolloverDraft::plan(&unpaid, today);

    let mut created = Vec::with_capacity(drafts.len());
    for draft in &drafts {
        let payment = sqlx::query_as::<_, PaymentSchedule>(
            r#"
            INSERT INTO payments (plot_id, expected_amount, paid_amount, due_date, is_paid, month, year, carried_over)
            VALUES ($1, $2, 0, $3, false, $4, $5, true)
            RETURNING *
            "#,
        )
        .bind(draft.plot_id)
        .bind(draft.expected_amount)
        .bind(draft.due_date)
        .bind(&draft.month)
        .bind(&draft.year)
        .fetch_one(&mut *tx)
        .await?;

        created.push(payment);
    }

    // Список участка пополняется одним батчем после всех вставок
    let new_ids: Vec<Uuid> = created.iter().map(|p| p.id).collect();
    sqlx::query(
        "UPDATE plots SET payment_schedules = payment_schedules || $1, updated_at = NOW() WHERE id = $2",
    )
    .bind(&new_ids)
    .bind(plot_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    let response = created
        .into_iter()
        .map(|p| PaymentResponse::from_schedule(p, today))
        .collect();

    Ok(Json(response))
}
