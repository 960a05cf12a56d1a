use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Header must include: name,email,age (found: {found})")]
    HeaderError { found: String },

    #[error("CSV stream error at row {row}: {message}")]
    StreamError { row: usize, message: String },

    #[error("Store fault: {0}")]
    StoreFault(#[from] sqlx::Error),

    #[error("Store fault: {message}")]
    StoreUnavailable { message: String },

    #[error("Unsupported file '{filename}': please upload a .csv file")]
    UnsupportedFile { filename: String },

    #[error("Object storage error: {message}")]
    ObjectStorage { message: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

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
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Storage,
    ObjectStorage,
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

impl ImportError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::HeaderError { .. }
            | Self::StreamError { .. }
            | Self::UnsupportedFile { .. }
            | Self::CsvError(_) => ErrorCategory::Input,
            Self::StoreFault(_) | Self::StoreUnavailable { .. } => ErrorCategory::Storage,
            Self::ObjectStorage { .. } => ErrorCategory::ObjectStorage,
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. } => ErrorCategory::Configuration,
            Self::IoError(_) | Self::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input => ErrorSeverity::High,
            ErrorCategory::ObjectStorage => ErrorSeverity::Medium,
            ErrorCategory::Storage => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// Whether the caller sent something unusable, as opposed to a fault on our side.
    pub fn is_client_error(&self) -> bool {
        self.category() == ErrorCategory::Input
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::HeaderError { .. } => "Header must include: name,email,age".to_string(),
            Self::UnsupportedFile { .. } => "Please upload a .csv file".to_string(),
            Self::StreamError { row, .. } => {
                format!("The CSV file could not be read past row {}", row)
            }
            Self::StoreFault(_) | Self::StoreUnavailable { .. } => {
                "The database rejected the import; nothing from this file was saved".to_string()
            }
            Self::ObjectStorage { .. } => "Object storage is not reachable".to_string(),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::HeaderError { .. } => "Make sure the first line is a header naming name, email and age",
            Self::StreamError { .. } | Self::CsvError(_) => "Save the file as UTF-8 encoded CSV and retry",
            Self::UnsupportedFile { .. } => "Rename or export the file with a .csv extension",
            Self::StoreFault(_) | Self::StoreUnavailable { .. } => {
                "Check the database path and disk space, then retry the whole file"
            }
            Self::ObjectStorage { .. } => "Check the storage endpoint, credentials and bucket name",
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. } => "Review the configuration file and environment variables",
            Self::IoError(_) | Self::SerializationError(_) => "Check file permissions and available disk space",
        }
    }
}

pub type Result<T> = std::result::Result<T, ImportError>;
