use thiserror::Error;

#[derive(Error, Debug)]
pub enum AlertError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    // Feed errors
    #[error("Invalid feed URL: {0}")]
    InvalidUrl(String),

    #[error("Feed returned HTTP status {0}")]
    HttpStatus(u16),

    // Network errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    // Parsing errors
    #[error("Feed parsing failed: {0}")]
    FeedParse(String),

    #[error("Snapshot parsing failed: {0}")]
    SnapshotParse(#[from] serde_json::Error),

    // Storage errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Subscriber not found: {0}")]
    SubscriberNotFound(u64),

    // Authorization errors
    #[error("Not authorized: {0}")]
    Unauthorized(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // User input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Delivery errors from the discord-rest library
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

impl From<discord_rest::DiscordError> for AlertError {
    fn from(err: discord_rest::DiscordError) -> Self {
        AlertError::Delivery(err.to_string())
    }
}

pub type AlertResult<T> = Result<T, AlertError>;
