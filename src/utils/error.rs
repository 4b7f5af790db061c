use thiserror::Error;

#[derive(Error, Debug)]
pub enum VsacError {
    #[error("Invalid API key: no granting ticket could be obtained")]
    InvalidApiKey,

    #[error("Service ticket acquisition failed after retry")]
    TicketAcquisitionFailed,

    #[error("Value set retrieval failed with HTTP status {0}")]
    HttpFailure(reqwest::StatusCode),

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed value set XML: {reason}")]
    MalformedXml { reason: String },

    #[error("Invalid format type: {0}")]
    UnsupportedFormat(String),

    #[error("Multiple conversion targets selected with a single output file")]
    AmbiguousOutputTarget,

    #[error("Output directory {0} is either invalid or does not exist")]
    InvalidOutputDirectory(String),

    #[error("Invalid configuration value for {field}: {value} ({reason})")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Credential file unavailable: {path}")]
    CredentialUnavailable { path: String },

    #[error("Failed to write output file {path}: {source}")]
    OutputWriteFailure {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Resource encoding error: {message}")]
    EncodingError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Auth,
    Fetch,
    Parse,
    Config,
    Io,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl VsacError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidApiKey | Self::TicketAcquisitionFailed => ErrorCategory::Auth,
            Self::HttpFailure(_) | Self::Transport(_) => ErrorCategory::Fetch,
            Self::MalformedXml { .. } => ErrorCategory::Parse,
            Self::UnsupportedFormat(_)
            | Self::AmbiguousOutputTarget
            | Self::InvalidOutputDirectory(_)
            | Self::InvalidConfigValue { .. } => ErrorCategory::Config,
            Self::CredentialUnavailable { .. }
            | Self::OutputWriteFailure { .. }
            | Self::EncodingError { .. }
            | Self::IoError(_)
            | Self::SerializationError(_)
            | Self::CsvError(_) => ErrorCategory::Io,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Auth => ErrorSeverity::Critical,
            ErrorCategory::Fetch => ErrorSeverity::Medium,
            ErrorCategory::Parse => ErrorSeverity::High,
            ErrorCategory::Config => ErrorSeverity::High,
            ErrorCategory::Io => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::InvalidApiKey => {
                "Check the apiKey value in the credential file; run 'vsac-cli init' and paste your UMLS API key".to_string()
            }
            Self::TicketAcquisitionFailed => {
                "Run 'vsac-cli reset' to discard the cached granting ticket and try again".to_string()
            }
            Self::HttpFailure(status) => {
                format!("The retrieval endpoint answered {status}; verify the value set id and retry later")
            }
            Self::Transport(_) => "Check network connectivity to the NLM endpoints".to_string(),
            Self::MalformedXml { .. } => {
                "The service returned XML this tool could not parse; retry, and report the value set id if it persists".to_string()
            }
            Self::UnsupportedFormat(_) => {
                "Use one of: csv, xml, fhir+json, fhir+xml".to_string()
            }
            Self::AmbiguousOutputTarget => {
                "Drop --output or convert a single value set id per invocation".to_string()
            }
            Self::InvalidOutputDirectory(_) => {
                "Create the output directory first or point --output-dir at an existing one".to_string()
            }
            Self::InvalidConfigValue { field, .. } => {
                format!("Correct the '{field}' setting and rerun")
            }
            Self::CredentialUnavailable { .. } => {
                "Run 'vsac-cli init' to create the credential file, then add your API key".to_string()
            }
            Self::OutputWriteFailure { .. } => {
                "Check permissions and free space on the output location".to_string()
            }
            Self::EncodingError { .. }
            | Self::IoError(_)
            | Self::SerializationError(_)
            | Self::CsvError(_) => "Rerun with --verbose for details".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::InvalidApiKey => "The VSAC service rejected the API key".to_string(),
            Self::TicketAcquisitionFailed => {
                "Could not obtain a service ticket, even after refreshing the granting ticket".to_string()
            }
            Self::CredentialUnavailable { path } => {
                format!("No usable credential file at {path}")
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, VsacError>;
