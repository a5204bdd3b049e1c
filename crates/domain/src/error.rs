/// Shared error type used across all remote-deck crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// Missing or invalid target address; the connection attempt is aborted.
    #[error("config: {0}")]
    Config(String),

    /// Invalid action or feedback id/option. Nothing was sent.
    #[error("validation: {0}")]
    Validation(String),

    #[error("HTTP: {0}")]
    Http(String),

    /// The session actor has stopped.
    #[error("shutdown")]
    Shutdown,
}

pub type Result<T> = std::result::Result<T, Error>;
