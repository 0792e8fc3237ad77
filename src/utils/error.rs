use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Format error: {message}")]
    FormatError { message: String },

    #[error("Schema error: required column `{column}` is missing")]
    SchemaError { column: String },

    #[error("Connection error: {message}")]
    ConnectionError { message: String },

    #[error("Write error on table `{table}`: {message}")]
    WriteError { table: String, message: String },

    #[error("Storage error for `{key}`: {message}")]
    StorageError { key: String, message: String },

    #[error("Parse error: `{value}` is not a valid number")]
    ParseError { value: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration value: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid configuration value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Storage,
    Database,
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

impl EtlError {
    pub fn format(message: impl Into<String>) -> Self {
        EtlError::FormatError {
            message: message.into(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        EtlError::ConnectionError {
            message: message.into(),
        }
    }

    pub fn write(table: impl Into<String>, message: impl Into<String>) -> Self {
        EtlError::WriteError {
            table: table.into(),
            message: message.into(),
        }
    }

    pub fn storage(key: impl Into<String>, message: impl Into<String>) -> Self {
        EtlError::StorageError {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::FormatError { .. }
            | EtlError::SchemaError { .. }
            | EtlError::ParseError { .. } => ErrorCategory::Input,
            EtlError::StorageError { .. } => ErrorCategory::Storage,
            EtlError::ConnectionError { .. } | EtlError::WriteError { .. } => {
                ErrorCategory::Database
            }
            EtlError::ConfigError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            EtlError::IoError(_) => ErrorCategory::System,
        }
    }

    /// 決定錯誤嚴重程度，CLI 依此選擇退出碼
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 來源資料或連線問題，重新觸發可能成功
            EtlError::ConnectionError { .. } | EtlError::StorageError { .. } => {
                ErrorSeverity::Medium
            }
            EtlError::FormatError { .. }
            | EtlError::SchemaError { .. }
            | EtlError::ParseError { .. }
            | EtlError::WriteError { .. } => ErrorSeverity::High,
            EtlError::ConfigError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::FormatError { .. } => {
                "Check that the trigger event names a bucket and key and that the object is a comma-delimited CSV with a header row"
            }
            EtlError::SchemaError { .. } => {
                "Make sure the CSV header contains STORE_LOCATION, PRODUCT_ID, MRP, CP, DISCOUNT and SP (case-sensitive)"
            }
            EtlError::ConnectionError { .. } => {
                "Verify the database endpoint, credentials and network reachability, then re-trigger the job"
            }
            EtlError::WriteError { .. } => {
                "Compare the target table schema with the cleaned columns, or reload with write mode 'overwrite'"
            }
            EtlError::StorageError { .. } => {
                "Confirm the object exists and the job role is allowed to read it"
            }
            EtlError::ParseError { .. } => "Strip every non-numeric character before parsing",
            EtlError::IoError(_) => "Check file permissions and free disk space",
            EtlError::ConfigError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. } => {
                "Review the configuration file or environment variables"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Input => format!("The source data could not be processed: {}", self),
            ErrorCategory::Storage => format!("The source file could not be read: {}", self),
            ErrorCategory::Database => format!("Loading into the database failed: {}", self),
            ErrorCategory::Configuration => format!("The job is misconfigured: {}", self),
            ErrorCategory::System => format!("A system error occurred: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taxonomy_categories() {
        assert_eq!(EtlError::format("bad").category(), ErrorCategory::Input);
        assert_eq!(
            EtlError::SchemaError {
                column: "PRODUCT_ID".to_string()
            }
            .category(),
            ErrorCategory::Input
        );
        assert_eq!(EtlError::connection("down").category(), ErrorCategory::Database);
        assert_eq!(
            EtlError::write("clean_transaction", "mismatch").category(),
            ErrorCategory::Database
        );
    }

    #[test]
    fn test_severity_ordering() {
        assert!(EtlError::connection("x").severity() < EtlError::format("x").severity());
        assert_eq!(
            EtlError::MissingConfigError {
                field: "WRITE_MODE".to_string()
            }
            .severity(),
            ErrorSeverity::Critical
        );
    }

    #[test]
    fn test_display_names_table() {
        let err = EtlError::write("clean_transaction", "no such column: SP");
        assert_eq!(
            err.to_string(),
            "Write error on table `clean_transaction`: no such column: SP"
        );
    }
}
