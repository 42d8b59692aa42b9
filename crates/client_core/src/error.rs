use shared::{error::ServerRejection, protocol::CSV_EXTENSION};
use thiserror::Error;

pub const CSV_REQUIRED_MESSAGE: &str = "Please upload a CSV file";
pub const GENERIC_RETRY_MESSAGE: &str = "Error analyzing file. Please try again.";
pub const NO_RESPONSE_MESSAGE: &str =
    "No response from server. Please check if the backend is running.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadErrorCategory {
    Validation,
    ServerReported,
    NoResponse,
    ClientSetup,
}

impl UploadErrorCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::ServerReported => "server_reported",
            Self::NoResponse => "no_response",
            Self::ClientSetup => "client_setup",
        }
    }
}

/// Terminal outcome of a failed upload attempt.
///
/// The `Display` output is the raw diagnostic detail for logs; the banner
/// text shown to the user comes from [`UploadError::user_message`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("'{file_name}' does not end with {}", CSV_EXTENSION)]
    LocalValidation { file_name: String },
    #[error(transparent)]
    ServerRejected(#[from] ServerRejection),
    #[error("no response from analysis service: {0}")]
    NoResponse(String),
    #[error("failed to set up upload request: {0}")]
    RequestSetup(String),
}

impl UploadError {
    pub fn server_rejected(status: u16, detail: Option<String>) -> Self {
        Self::ServerRejected(ServerRejection { status, detail })
    }

    pub fn category(&self) -> UploadErrorCategory {
        match self {
            Self::LocalValidation { .. } => UploadErrorCategory::Validation,
            Self::ServerRejected(_) => UploadErrorCategory::ServerReported,
            Self::NoResponse(_) => UploadErrorCategory::NoResponse,
            Self::RequestSetup(_) => UploadErrorCategory::ClientSetup,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::LocalValidation { .. } => CSV_REQUIRED_MESSAGE.to_string(),
            Self::ServerRejected(rejection) => rejection
                .detail
                .clone()
                .unwrap_or_else(|| GENERIC_RETRY_MESSAGE.to_string()),
            Self::NoResponse(_) => NO_RESPONSE_MESSAGE.to_string(),
            Self::RequestSetup(_) => GENERIC_RETRY_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("metric '{name}' is not numeric (found {found})")]
    NonNumericMetric { name: String, found: &'static str },
    #[error("feature importance '{name}' is not numeric (found {found})")]
    NonNumericImportance { name: String, found: &'static str },
    #[error("plot '{name}' is not a base64 string (found {found})")]
    InvalidPlotPayload { name: String, found: &'static str },
}

impl RenderError {
    pub fn user_message(&self) -> String {
        format!("The analysis result could not be displayed: {self}")
    }
}
