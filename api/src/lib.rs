// portfolio-api library root: the contact endpoint as an axum Router plus its settings.
pub mod config;
pub mod error;
pub mod services;

pub use config::ApiSettings;
pub use error::ApiError;
pub use services::{router, ContactService};
