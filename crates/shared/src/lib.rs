pub mod auth;
pub mod config;
pub mod errors;
pub mod password;
pub mod telemetry;

pub use auth::*;
pub use config::*;
pub use errors::*;
pub use password::*;
pub use telemetry::*;
