use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tazalyk API",
        version = "1.0.0",
        description = "Backend API для Tazalyk - системы учёта вывоза мусора: участки, локации, сборщики и графики платежей",
        contact(
            name = "Tazalyk Team",
            email = "support@tazalyk.kz"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    tags(
        (name = "locations", description = "Локации, группирующие участки"),
        (name = "plots", description = "Участки сбора и назначение сборщиков"),
        (name = "users", description = "Пользователи: администраторы и сборщики"),
        (name = "payments", description = "Графики платежей: создание, оплата, сводки, перенос")
    ),
    paths(
        // Locations
        crate::api::locations::list_locations,
        crate::api::locations::create_location,
        crate::api::locations::get_location,
        crate::api::locations::update_location,
        crate::api::locations::delete_location,
        // Plots
        crate::api::plots::list_plots,
        crate::api::plots::create_plot,
        crate::api::plots::get_plot,
        crate::api::plots::update_plot,
        crate::api::plots::delete_plot,
        crate::api::plots::assign_user,
        crate::api::plots::unassign_user,
        // Users
        crate::api::users::list_users,
        crate::api::users::create_user,
        crate::api::users::get_user,
        crate::api::users::update_user,
        crate::api::users::delete_user,
        // Payments
        crate::api::payments::list_plot_payments,
        crate::api::payments::create_payment,
        crate::api::payments::update_payment,
        crate::api::payments::delete_payment,
        crate::api::payments::get_monthly_summary,
        crate::api::payments::transfer_payments,
    ),
    components(
        schemas(
            // Locations
            crate::models::LocationResponse,
            crate::models::CreateLocationRequest,
            crate::models::UpdateLocationRequest,
            // Plots
            crate::models::PlotResponse,
            crate::models::CreatePlotRequest,
            crate::models::UpdatePlotRequest,
            // Users
            crate::models::UserRole,
            crate::models::UserResponse,
            crate::models::CreateUserRequest,
            crate::models::UpdateUserRequest,
            // Payments
            crate::models::PaymentStatus,
            crate::models::PaymentResponse,
            crate::models::CreatePaymentRequest,
            crate::models::UpdatePaymentRequest,
            crate::models::MonthlySummary,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            );
        }
    }
}
