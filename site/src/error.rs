use thiserror::Error;

#[derive(Error, Debug)]
pub enum SiteError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown theme: '{0}'")]
    UnknownTheme(String),

    #[error("Preference storage error: {source}")]
    Storage {
        #[from]
        source: std::io::Error,
    },

    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    #[error("Invalid endpoint URL: {source}")]
    InvalidEndpoint {
        #[from]
        source: url::ParseError,
    },

    #[error("HTTP client error: {source}")]
    Http {
        #[from]
        source: reqwest::Error,
    },

    #[error("Widget error: {0}")]
    Widget(String),

    // Wraps errors from anyhow-based widget glue when a typed error is needed.
    #[error(transparent)]
    AnyhowError(#[from] anyhow::Error),
}
