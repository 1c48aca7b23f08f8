use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Step execution status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Running,
    Passed,
    Failed { error: String },
    Skipped { reason: String },
}

/// State for a single probe step execution
#[derive(Debug, Clone)]
pub struct StepState {
    pub index: usize,
    pub step_name: String,
    pub step_display: String,
    pub status: StepStatus,
    pub started_at: Option<Instant>,
    pub finished_at: Option<Instant>,
    pub duration_ms: Option<u64>,
    pub http_status: Option<u16>,
}

impl StepState {
    pub fn new(index: usize, name: &str, display: &str) -> Self {
        Self {
            index,
            step_name: name.to_string(),
            step_display: display.to_string(),
            status: StepStatus::Pending,
            started_at: None,
            finished_at: None,
            duration_ms: None,
            http_status: None,
        }
    }

    pub fn start(&mut self) {
        self.status = StepStatus::Running;
        self.started_at = Some(Instant::now());
    }

    pub fn pass(&mut self) {
        self.finish(StepStatus::Passed);
    }

    pub fn fail(&mut self, error: String) {
        self.finish(StepStatus::Failed { error });
    }

    pub fn skip(&mut self, reason: String) {
        self.status = StepStatus::Skipped { reason };
    }

    fn finish(&mut self, status: StepStatus) {
        self.status = status;
        self.finished_at = Some(Instant::now());
        if let Some(start) = self.started_at {
            self.duration_ms = Some(start.elapsed().as_millis() as u64);
        }
    }

    /// Serialize state for reporting (without Instant which isn't serializable)
    pub fn to_report(&self) -> StepStateReport {
        StepStateReport {
            index: self.index,
            step_name: self.step_name.clone(),
            step_display: self.step_display.clone(),
            status: self.status.clone(),
            duration_ms: self.duration_ms,
            http_status: self.http_status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepStateReport {
    pub index: usize,
    pub step_name: String,
    pub step_display: String,
    pub status: StepStatus,
    pub duration_ms: Option<u64>,
    pub http_status: Option<u16>,
}

/// State for one scenario execution
#[derive(Debug, Clone)]
pub struct ScenarioState {
    pub scenario_name: String,
    pub status: ScenarioStatus,
    pub steps: Vec<StepState>,
    pub started_at: Option<Instant>,
    pub finished_at: Option<Instant>,
    pub total_duration_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ScenarioStatus {
    Pending,
    Running,
    Passed,
    Failed,
    PartiallyPassed { passed: u32, failed: u32 },
    Skipped,
}

impl ScenarioState {
    pub fn new(name: &str, steps: Vec<StepState>) -> Self {
        Self {
            scenario_name: name.to_string(),
            status: ScenarioStatus::Pending,
            steps,
            started_at: None,
            finished_at: None,
            total_duration_ms: None,
        }
    }

    pub fn start(&mut self) {
        self.status = ScenarioStatus::Running;
        self.started_at = Some(Instant::now());
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Instant::now());
        if let Some(start) = self.started_at {
            self.total_duration_ms = Some(start.elapsed().as_millis() as u64);
        }

        let (passed, failed) = self
            .steps
            .iter()
            .fold((0, 0), |(p, f), step| match step.status {
                StepStatus::Passed => (p + 1, f),
                StepStatus::Failed { .. } => (p, f + 1),
                _ => (p, f),
            });

        self.status = if failed == 0 {
            ScenarioStatus::Passed
        } else if passed == 0 {
            ScenarioStatus::Failed
        } else {
            ScenarioStatus::PartiallyPassed { passed, failed }
        };
    }

    /// Mark the whole scenario as filtered out of this run.
    pub fn skip_all(&mut self, reason: &str) {
        for step in &mut self.steps {
            step.skip(reason.to_string());
        }
        self.status = ScenarioStatus::Skipped;
    }

    /// Serialize state for reporting
    pub fn to_report(&self) -> ScenarioStateReport {
        ScenarioStateReport {
            scenario_name: self.scenario_name.clone(),
            status: self.status.clone(),
            steps: self.steps.iter().map(|s| s.to_report()).collect(),
            total_duration_ms: self.total_duration_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioStateReport {
    pub scenario_name: String,
    pub status: ScenarioStatus,
    pub steps: Vec<StepStateReport>,
    pub total_duration_ms: Option<u64>,
}

/// Global session state for one suite run
#[derive(Debug, Clone)]
pub struct SessionState {
    pub session_id: String,
    pub target: String,
    pub scenarios: Vec<ScenarioState>,
    pub started_at: Option<Instant>,
    pub finished_at: Option<Instant>,
}

impl SessionState {
    pub fn new(session_id: &str, target: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            target: target.to_string(),
            scenarios: Vec::new(),
            started_at: None,
            finished_at: None,
        }
    }

    pub fn start(&mut self) {
        self.started_at = Some(Instant::now());
    }

    pub fn add_scenario(&mut self, scenario: ScenarioState) {
        self.scenarios.push(scenario);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Instant::now());
    }

    pub fn summary(&self) -> SuiteSummary {
        let mut total_steps = 0;
        let mut passed = 0;
        let mut failed = 0;
        let mut skipped = 0;

        for scenario in &self.scenarios {
            for step in &scenario.steps {
                total_steps += 1;
                match step.status {
                    StepStatus::Passed => passed += 1,
                    StepStatus::Failed { .. } => failed += 1,
                    StepStatus::Skipped { .. } => skipped += 1,
                    _ => {}
                }
            }
        }

        let total_duration_ms = self.started_at.map(|start| {
            self.finished_at
                .unwrap_or_else(Instant::now)
                .duration_since(start)
                .as_millis() as u64
        });

        SuiteSummary {
            session_id: self.session_id.clone(),
            total_scenarios: self.scenarios.len() as u32,
            total_steps,
            passed,
            failed,
            skipped,
            total_duration_ms,
        }
    }

}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteSummary {
    pub session_id: String,
    pub total_scenarios: u32,
    pub total_steps: u32,
    pub passed: u32,
    pub failed: u32,
    pub skipped: u32,
    pub total_duration_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_with(statuses: &[StepStatus]) -> ScenarioState {
        let steps = statuses
            .iter()
            .enumerate()
            .map(|(i, status)| {
                let mut step = StepState::new(i, &format!("step-{}", i), "GET /x");
                step.status = status.clone();
                step
            })
            .collect();
        ScenarioState::new("test", steps)
    }

    #[test]
    fn test_scenario_status_partial() {
        let mut scenario = scenario_with(&[
            StepStatus::Passed,
            StepStatus::Failed {
                error: "HTTP 500".to_string(),
            },
        ]);
        scenario.finish();
        assert_eq!(
            scenario.status,
            ScenarioStatus::PartiallyPassed {
                passed: 1,
                failed: 1
            }
        );
    }

    #[test]
    fn test_summary_counts() {
        let mut session = SessionState::new("s1", "http://localhost/api");
        session.add_scenario(scenario_with(&[
            StepStatus::Passed,
            StepStatus::Failed {
                error: "x".to_string(),
            },
        ]));
        session.add_scenario(scenario_with(&[StepStatus::Skipped {
            reason: "not selected".to_string(),
        }]));

        let summary = session.summary();
        assert_eq!(summary.total_scenarios, 2);
        assert_eq!(summary.total_steps, 3);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 1);
    }
}
