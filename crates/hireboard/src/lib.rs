pub mod board;
pub mod config;
pub mod error;
pub mod request;
pub mod session;
pub mod telemetry;
