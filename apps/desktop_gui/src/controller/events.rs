//! Backend -> UI events.

use client_core::{TransferProgress, UploadError};
use shared::{domain::AnalysisResult, protocol::HealthResponse};

pub enum UiEvent {
    Info(String),
    BackendUnavailable(String),
    UploadProgress(TransferProgress),
    AnalysisFinished(Result<AnalysisResult, UploadError>),
    HealthChecked(Result<HealthResponse, UploadError>),
}

pub fn describe_health(outcome: &Result<HealthResponse, UploadError>) -> String {
    match outcome {
        Ok(health) if health.is_healthy() => "Analysis service is healthy".to_string(),
        Ok(health) => format!("Analysis service reported status '{}'", health.status),
        Err(err) => err.user_message(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_descriptions() {
        let healthy = Ok(HealthResponse {
            status: "healthy".into(),
        });
        assert_eq!(describe_health(&healthy), "Analysis service is healthy");

        let degraded = Ok(HealthResponse {
            status: "degraded".into(),
        });
        assert_eq!(
            describe_health(&degraded),
            "Analysis service reported status 'degraded'"
        );

        let down = Err(UploadError::NoResponse("connection refused".into()));
        assert_eq!(
            describe_health(&down),
            "No response from server. Please check if the backend is running."
        );
    }
}
