use serde::{Deserialize, Serialize};

pub const ANALYZE_PATH: &str = "/api/analyze";
pub const HEALTH_PATH: &str = "/api/health";

/// Multipart field carrying the raw CSV bytes.
pub const UPLOAD_FIELD_NAME: &str = "file";
pub const CSV_MIME_TYPE: &str = "text/csv";
pub const CSV_EXTENSION: &str = ".csv";

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8001";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}
