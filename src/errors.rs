use thiserror::Error;

/// Problems found while loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid price range: min {min} max {max}")]
    InvalidRange { min: f64, max: f64 },

    #[error("at least one keyword is required")]
    NoKeywords,

    #[error("at least one source is required")]
    NoSources,

    #[error("source {0} has no candidate urls")]
    NoCandidates(String),

    #[error("{field} must be at least {min}, got {value}")]
    LimitTooSmall {
        field: &'static str,
        min: usize,
        value: usize,
    },

    #[error("invalid selector {0:?}")]
    InvalidSelector(String),

    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("invalid url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
}

/// Fatal start-up failures; the only errors that end a run early
#[derive(Error, Debug)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("no WebDriver server reachable (tried {0})")]
    WebDriverUnavailable(String),
}

/// Failures from the persistence or notification sinks
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("io error writing {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to serialize run result: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("notification failed: {0}")]
    Notify(String),
}
