use thiserror::Error;

#[derive(Error, Debug)]
pub enum MigrateError {
    #[error("Source authentication failed: {message}")]
    AuthError { message: String },

    #[error("Failed to fetch page {page} of '{model}': {message}")]
    FetchError {
        model: String,
        page: usize,
        message: String,
    },

    #[error("Media transfer failed for {url}: {message}")]
    TransferError { url: String, message: String },

    #[error("Related entity with old_id {old_id} not found in '{model}'")]
    NotFoundError { model: String, old_id: String },

    #[error("Failed to create entry in '{model}' (HTTP {status}): {body}")]
    CreateError {
        model: String,
        status: u16,
        body: String,
    },

    #[error("Malformed entry: {message}")]
    MalformedEntry { message: String },

    #[error("Component nesting deeper than {max_depth} levels at field '{field}'")]
    ComponentDepthExceeded { field: String, max_depth: usize },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV report error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ('{value}'): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Source,
    Destination,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl MigrateError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. }
            | Self::UrlError(_) => ErrorCategory::Configuration,
            Self::AuthError { .. } | Self::FetchError { .. } => ErrorCategory::Source,
            Self::TransferError { .. } | Self::NotFoundError { .. } | Self::CreateError { .. } => {
                ErrorCategory::Destination
            }
            Self::MalformedEntry { .. }
            | Self::ComponentDepthExceeded { .. }
            | Self::SerializationError(_) => ErrorCategory::Data,
            Self::ApiError(_) | Self::IoError(_) | Self::CsvError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::CreateError { .. } => ErrorSeverity::Low,
            Self::TransferError { .. } | Self::NotFoundError { .. } | Self::ApiError(_) => {
                ErrorSeverity::Medium
            }
            Self::MalformedEntry { .. }
            | Self::ComponentDepthExceeded { .. }
            | Self::FetchError { .. }
            | Self::SerializationError(_)
            | Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. }
            | Self::UrlError(_) => ErrorSeverity::High,
            Self::AuthError { .. } | Self::IoError(_) | Self::CsvError(_) => {
                ErrorSeverity::Critical
            }
        }
    }

    /// Errors that only concern the entry being migrated. Whether they stop
    /// the run is decided by the entry error policy.
    pub fn is_entry_scoped(&self) -> bool {
        matches!(
            self,
            Self::TransferError { .. }
                | Self::NotFoundError { .. }
                | Self::CreateError { .. }
                | Self::MalformedEntry { .. }
                | Self::ComponentDepthExceeded { .. }
                | Self::ApiError(_)
        )
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::AuthError { .. } => "Check SOURCE_EMAIL / SOURCE_PASSWORD and that the admin login endpoint is reachable",
            Self::FetchError { .. } => "Check SOURCE_MODEL and that the token may read that collection",
            Self::TransferError { .. } => "Check that the media URL is public and DEST_API_KEY may upload files",
            Self::NotFoundError { .. } => "Migrate the related model first so its old_id can be looked up",
            Self::CreateError { .. } => "Inspect the response body; the destination model may reject a field",
            Self::MalformedEntry { .. } => "The source returned an entry without an id; inspect the source data",
            Self::ComponentDepthExceeded { .. } => {
                "Deep JSON attributes count as nesting too; raise MAX_COMPONENT_DEPTH (or max_component_depth in the plan) if the payload is expected"
            }
            Self::ApiError(_) => "Check network connectivity and REQUEST_TIMEOUT_SECS",
            Self::IoError(_) => "Check disk space and permissions for temporary files and reports",
            Self::SerializationError(_) => "An API returned a body that is not valid JSON",
            Self::CsvError(_) => "Check that the report path is writable",
            Self::UrlError(_)
            | Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. } => "Fix the configuration value and run again",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Source => format!("Could not read from the source CMS: {}", self),
            ErrorCategory::Destination => format!("Destination CMS rejected a request: {}", self),
            ErrorCategory::Data => format!("Unexpected entry data: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, MigrateError>;
