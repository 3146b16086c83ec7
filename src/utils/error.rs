use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("HTTP {status} returned by {url}: {body}")]
    HttpStatusError {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Query failed: {message}")]
    QueryError { message: String },

    #[error("Column '{column}' not found in source row {row}")]
    MissingColumnError { column: String, row: usize },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Missing configuration value: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Database,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// Process exit code for a failed run; never 0.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::Medium => 2, // 可重跑
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ConfigValidationError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            EtlError::HttpError(_) | EtlError::HttpStatusError { .. } => ErrorCategory::Network,
            EtlError::DatabaseError(_) | EtlError::QueryError { .. } => ErrorCategory::Database,
            EtlError::MissingColumnError { .. }
            | EtlError::SerializationError(_)
            | EtlError::ProcessingError { .. } => ErrorCategory::Data,
            EtlError::IoError(_) => ErrorCategory::System,
        }
    }

    /// Transient network and server-side failures are `Medium`: a rerun may
    /// succeed. Bad input or configuration needs a change before rerunning.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EtlError::HttpError(e) if e.is_timeout() || e.is_connect() => ErrorSeverity::Medium,
            EtlError::HttpStatusError { status, .. } if *status >= 500 => ErrorSeverity::Medium,
            EtlError::DatabaseError(sqlx::Error::PoolTimedOut)
            | EtlError::DatabaseError(sqlx::Error::Io(_)) => ErrorSeverity::Medium,
            EtlError::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::DatabaseError(e) => format!("The database rejected the request: {}", e),
            EtlError::HttpError(e) => format!("Could not reach the HTTP endpoint: {}", e),
            EtlError::HttpStatusError { url, status, .. } => {
                format!("{} answered with status {}", url, status)
            }
            EtlError::QueryError { message } => format!("The query engine reported: {}", message),
            EtlError::MissingColumnError { column, .. } => {
                format!("The source query did not return column '{}'", column)
            }
            EtlError::ConfigValidationError { field, message } => {
                format!("Job configuration is invalid ({}): {}", field, message)
            }
            EtlError::MissingConfigError { field } => {
                format!("Job configuration is missing '{}'", field)
            }
            EtlError::InvalidConfigValueError { field, reason, .. } => {
                format!("Job configuration value '{}' is invalid: {}", field, reason)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => "Check the job file and the .env values it references",
            ErrorCategory::Network => "Check the endpoint URL and that the service is up, then rerun the job",
            ErrorCategory::Database => "Check credentials, the SQL text and the destination table layout",
            ErrorCategory::Data => "Check that the source query returns the columns named in the column mapping",
            ErrorCategory::System => "Check file paths and permissions",
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
