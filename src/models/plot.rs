use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Plot {
    pub id: Uuid,
    pub plot_number: String,
    pub bags_required: i32,
    pub location_id: Option<Uuid>,
    pub users: Vec<Uuid>,
    pub payment_schedules: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlotResponse {
    pub id: Uuid,
    pub plot_number: String,
    pub bags_required: i32,
    pub location_id: Option<Uuid>,
    pub location_name: Option<String>,
    pub users: Vec<Uuid>,
    pub payment_schedules: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PlotResponse {
    pub fn from_plot(plot: Plot, location_name: Option<String>) -> Self {
        Self {
            id: plot.id,
            plot_number: plot.plot_number,
            bags_required: plot.bags_required,
            location_id: plot.location_id,
            location_name,
            users: plot.users,
            payment_schedules: plot.payment_schedules,
            created_at: plot.created_at,
            updated_at: plot.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePlotRequest {
    pub plot_number: String,
    pub bags_required: i32,
    pub location_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePlotRequest {
    pub plot_number: Option<String>,
    pub bags_required: Option<i32>,
    /// null отвязывает участок от локации, отсутствие поля оставляет прежнюю
    #[serde(default, deserialize_with = "crate::utils::patch::double_option")]
    pub location_id: Option<Option<Uuid>>,
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct PlotsQuery {
    pub location_id: Option<Uuid>,
}
