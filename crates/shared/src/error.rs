use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error body sent by the analysis service alongside a non-2xx status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerErrorBody {
    #[serde(default)]
    pub detail: Option<String>,
}

impl ServerErrorBody {
    /// Best-effort parse of a raw error body. Non-JSON bodies, bodies without
    /// `detail`, and empty details all yield `None`.
    pub fn detail_from_bytes(raw: &[u8]) -> Option<String> {
        serde_json::from_slice::<Self>(raw)
            .ok()
            .and_then(|body| body.detail)
            .filter(|detail| !detail.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("analysis service returned {status}: {}", detail.as_deref().unwrap_or("<no detail>"))]
pub struct ServerRejection {
    pub status: u16,
    pub detail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_detail_when_present() {
        assert_eq!(
            ServerErrorBody::detail_from_bytes(br#"{"detail":"Empty file"}"#),
            Some("Empty file".to_string())
        );
    }

    #[test]
    fn ignores_missing_or_unparseable_detail() {
        assert_eq!(ServerErrorBody::detail_from_bytes(br#"{"error":"x"}"#), None);
        assert_eq!(ServerErrorBody::detail_from_bytes(b"<html>502</html>"), None);
        assert_eq!(ServerErrorBody::detail_from_bytes(br#"{"detail":""}"#), None);
    }

    #[test]
    fn whitespace_detail_is_kept_verbatim() {
        assert_eq!(
            ServerErrorBody::detail_from_bytes(br#"{"detail":"  "}"#),
            Some("  ".to_string())
        );
    }

    #[test]
    fn rejection_display_includes_status_and_detail() {
        let err = ServerRejection {
            status: 400,
            detail: Some("Invalid CSV file format".into()),
        };
        assert_eq!(
            err.to_string(),
            "analysis service returned 400: Invalid CSV file format"
        );
    }
}
