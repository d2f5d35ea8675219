pub mod config;
pub mod error;
pub mod events;
pub mod services;
pub mod site;
pub mod state;
pub mod widgets;

pub use config::{SiteConfig, Theme};
pub use error::SiteError;
pub use site::{ContactAttempt, Environment, Site};
