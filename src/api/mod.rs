pub mod locations;
pub mod payments;
pub mod plots;
pub mod users;

use crate::middleware::AppState;
use axum::Router;

pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/locations", locations::routes())
        .nest("/plots", plots::routes())
        .nest("/users", users::routes())
        .nest("/payments", payments::routes())
}
