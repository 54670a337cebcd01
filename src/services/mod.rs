pub mod errors;
pub mod export;
pub mod terminations;

pub use errors::{ServiceError, ServiceResult};
