pub mod config;
pub mod termination;
