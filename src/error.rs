use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Missing credential: {0} environment variable not set")]
    MissingCredential(&'static str),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode {context} response: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Missing field `{field}` in {context} response")]
    MissingField { field: &'static str, context: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MetricsError {
    pub fn missing_field(field: &'static str, context: impl Into<String>) -> Self {
        Self::MissingField {
            field,
            context: context.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MetricsError>;
