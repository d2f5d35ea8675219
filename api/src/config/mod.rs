// API configuration module
pub mod settings;

pub use settings::{ApiSettings, DiscordCredentials, ForwardTarget};
