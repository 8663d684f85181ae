pub mod location;
pub mod payment;
pub mod plot;
pub mod user;

pub use location::{CreateLocationRequest, Location, LocationResponse, UpdateLocationRequest};
pub use payment::{
    CreatePaymentRequest, MonthlySummary, PaymentResponse, PaymentSchedule, PaymentStatus,
    RolloverDraft, UpdatePaymentRequest,
};
pub use plot::{CreatePlotRequest, Plot, PlotResponse, PlotsQuery, UpdatePlotRequest};
pub use user::{CreateUserRequest, UpdateUserRequest, User, UserResponse, UserRole};
