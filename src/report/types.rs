use crate::runner::state::{ScenarioStateReport, SuiteSummary};
use serde::{Deserialize, Serialize};

/// Finished session results for report generation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResults {
    pub session_id: String,
    pub target: String,
    pub scenarios: Vec<ScenarioStateReport>,
    pub summary: SuiteSummary,
    pub generated_at: String,
}
