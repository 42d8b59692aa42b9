use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Ordered name -> value mapping exactly as the analysis service emitted it.
pub type PayloadMap = Map<String, Value>;

/// Model-quality report returned by `POST /api/analyze`.
///
/// Mapping values stay as raw JSON so rendering can reject non-numeric
/// entries instead of guessing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub problem_type: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub metrics: PayloadMap,
    #[serde(default)]
    pub feature_importances: PayloadMap,
    #[serde(default)]
    pub plots: PayloadMap,
}
