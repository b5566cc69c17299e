use thiserror::Error;

#[derive(Error, Debug)]
pub enum DigestError {
    #[error("API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status} returned by {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Feed parsing error: {message}")]
    FeedParse { message: String },

    #[error("Not enough recent papers for '{query}': found {found}, need at least {required}")]
    InsufficientResults {
        query: String,
        found: usize,
        required: usize,
    },

    #[error("Text generation failed during {stage}: {message}")]
    Generation { stage: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Topic '{topic}' failed: {source}")]
    TopicFailed {
        topic: String,
        #[source]
        source: Box<DigestError>,
    },
}

pub type Result<T> = std::result::Result<T, DigestError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Generation,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DigestError {
    pub fn generation(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Generation {
            stage: stage.into(),
            message: message.into(),
        }
    }

    pub fn feed_parse(message: impl Into<String>) -> Self {
        Self::FeedParse {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Transport(_) | Self::HttpStatus { .. } => ErrorCategory::Network,
            Self::FeedParse { .. }
            | Self::InsufficientResults { .. }
            | Self::Serialization(_)
            | Self::ValidationError { .. } => ErrorCategory::Data,
            Self::Generation { .. } => ErrorCategory::Generation,
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. } => ErrorCategory::Configuration,
            Self::Io(_) => ErrorCategory::System,
            Self::TopicFailed { source, .. } => source.category(),
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 網路與生成錯誤通常可以重跑解決
            Self::Transport(_) | Self::HttpStatus { .. } | Self::Generation { .. } => {
                ErrorSeverity::Medium
            }
            Self::InsufficientResults { .. } => ErrorSeverity::Medium,
            Self::FeedParse { .. } | Self::Serialization(_) | Self::ValidationError { .. } => {
                ErrorSeverity::High
            }
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. } => ErrorSeverity::High,
            Self::Io(_) => ErrorSeverity::Critical,
            Self::TopicFailed { source, .. } => source.severity(),
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::Transport(_) => "Check network connectivity and the configured endpoints".to_string(),
            Self::HttpStatus { status, .. } if *status == 401 || *status == 403 => {
                "Check that the API key is valid and has access to the model".to_string()
            }
            Self::HttpStatus { status, .. } if *status == 429 => {
                "Rate limited by the remote service, wait and run again".to_string()
            }
            Self::HttpStatus { .. } => "The remote service rejected the request, try again later".to_string(),
            Self::FeedParse { .. } => "The feed response was not valid Atom XML; check the arXiv endpoint".to_string(),
            Self::InsufficientResults { .. } => {
                "Broaden the topic, increase --days-back, or use --on-shortfall accept".to_string()
            }
            Self::Generation { .. } => "Check the model name and LLM base URL".to_string(),
            Self::Io(_) => "Check file permissions and free disk space for the output path".to_string(),
            Self::Serialization(_) => "Unexpected response shape from a remote service".to_string(),
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. } => {
                "Review the command-line flags and the TOML configuration file".to_string()
            }
            Self::ValidationError { .. } => "Review the input values".to_string(),
            Self::TopicFailed { source, .. } => source.recovery_suggestion(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::Transport(_) | Self::HttpStatus { .. } => {
                format!("Could not reach a remote service: {}", self)
            }
            Self::InsufficientResults {
                query,
                found,
                required,
            } => format!(
                "Only {} recent paper(s) found for '{}' (at least {} required)",
                found, query, required
            ),
            Self::MissingConfigError { field } => {
                format!("Missing required setting: {}", field)
            }
            Self::TopicFailed { topic, source } => {
                format!("Topic '{}' failed: {}", topic, source.user_friendly_message())
            }
            _ => self.to_string(),
        }
    }
}
