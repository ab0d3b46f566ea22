use thiserror::Error;

#[derive(Debug, Error)]
pub enum DonnaError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// A locate operation found no matching element.
    #[error("Element not found: {0}")]
    NotFound(String),

    /// Recognition or synthesis could not be initialised.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The platform refused a click / set-text on a node.
    #[error("Action rejected: {0}")]
    ActionRejected(String),

    #[error("App not installed: {0}")]
    AppNotInstalled(String),

    #[error("Channel closed: {0}")]
    ChannelClosed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialize error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

pub type DonnaResult<T> = Result<T, DonnaError>;
