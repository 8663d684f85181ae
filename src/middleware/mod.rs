pub mod auth;

pub use auth::{auth_middleware, can_view_plot_payments, is_admin, AppState, AuthUser};
