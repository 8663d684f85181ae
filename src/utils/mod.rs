pub mod patch;
pub mod period;
pub mod validators;
