use anyhow::Result;
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use super::context::ScenarioContext;
use super::events::{ConsoleEventListener, EventEmitter, TestEvent};
use super::state::{ScenarioState, SessionState, StepState};
use crate::parser::types::{CheckSpec, HttpMethod, ScenarioSpec, StepSpec, SuiteSpec};
use crate::probe::checks;
use crate::probe::{ProbeClient, ProbeFailure, ProbeResult};
use crate::report::types::TestResults;

/// Runs a declarative suite against one target: scenarios in order, steps
/// in declared order, each later step gated on its predecessors. Probe
/// failures land in the session state; only harness faults become errors.
pub struct SuiteExecutor {
    client: ProbeClient,
    session: SessionState,
    emitter: EventEmitter,
}

impl SuiteExecutor {
    pub fn new(client: ProbeClient) -> Self {
        let (emitter, receiver) = EventEmitter::new();
        let session = SessionState::new(&Uuid::new_v4().to_string(), client.api_base());

        // Console listener prints events in the background
        tokio::spawn(ConsoleEventListener::listen(receiver));

        Self {
            client,
            session,
            emitter,
        }
    }

    pub async fn run_suite(&mut self, suite: &SuiteSpec, only: Option<&str>) -> Result<()> {
        self.emitter.emit(TestEvent::SessionStarted {
            session_id: self.session.session_id.clone(),
            target: self.client.api_base().to_string(),
        });
        self.session.start();

        for scenario in &suite.scenarios {
            let state = if only.is_some_and(|name| name != scenario.name) {
                let mut state = new_scenario_state(scenario);
                state.skip_all("not selected");
                self.emitter.emit(TestEvent::Log {
                    message: format!("Skipping scenario '{}' (not selected)", scenario.name),
                });
                state
            } else {
                self.run_scenario(scenario).await
            };
            self.session.add_scenario(state);
        }

        self.session.finish();
        self.emitter.emit(TestEvent::SessionFinished {
            summary: self.session.summary(),
        });

        // Let the listener drain before the caller prints anything else
        tokio::time::sleep(tokio::time::Duration::from_millis(300)).await;
        Ok(())
    }

    async fn run_scenario(&self, scenario: &ScenarioSpec) -> ScenarioState {
        let mut state = new_scenario_state(scenario);

        self.emitter.emit(TestEvent::ScenarioStarted {
            scenario_name: scenario.name.clone(),
            step_count: scenario.steps.len(),
        });
        state.start();

        let mut context = ScenarioContext::new();
        let mut chain_broken: Option<String> = None;

        for (index, step) in scenario.steps.iter().enumerate() {
            self.emitter.emit(TestEvent::StepStarted {
                scenario_name: scenario.name.clone(),
                index,
                display: step.display(),
            });
            state.steps[index].start();

            let verdict = match self.gate(step, &context, &chain_broken) {
                Some(failure) => Err(failure.to_string()),
                None => {
                    let result = self.execute_request(step, &context).await;
                    state.steps[index].http_status = result.status;
                    evaluate(step, &result, &mut context)
                }
            };

            match verdict {
                Ok(()) => {
                    state.steps[index].pass();
                    self.emitter.emit(TestEvent::StepPassed {
                        index,
                        duration_ms: state.steps[index].duration_ms.unwrap_or(0),
                    });
                }
                Err(error) => {
                    state.steps[index].fail(error.clone());
                    self.emitter.emit(TestEvent::StepFailed {
                        index,
                        error,
                        duration_ms: state.steps[index].duration_ms.unwrap_or(0),
                    });
                    chain_broken.get_or_insert_with(|| step.name.clone());
                }
            }
        }

        state.finish();
        self.emitter.emit(TestEvent::ScenarioFinished {
            scenario_name: scenario.name.clone(),
            status: state.status.clone(),
            duration_ms: state.total_duration_ms,
        });
        state
    }

    /// Chain gating: no HTTP call is made once a prior step failed or a
    /// required binding is absent.
    fn gate(
        &self,
        step: &StepSpec,
        context: &ScenarioContext,
        chain_broken: &Option<String>,
    ) -> Option<ProbeFailure> {
        if let Some(broken_step) = chain_broken {
            return Some(ProbeFailure::Prerequisite {
                reason: format!("step '{}' failed earlier in the chain", broken_step),
            });
        }
        if let Some(missing) = step.requires.iter().find(|name| !context.has(name)) {
            return Some(ProbeFailure::Prerequisite {
                reason: format!("binding '{}' was never produced", missing),
            });
        }
        None
    }

    async fn execute_request(&self, step: &StepSpec, context: &ScenarioContext) -> ProbeResult {
        let path = context.substitute(&step.request.path);
        match step.request.method {
            HttpMethod::Get => self.client.get(&path).await,
            HttpMethod::Post => {
                let body = step
                    .request
                    .body
                    .as_ref()
                    .map(|b| context.substitute_value(b))
                    .unwrap_or(Value::Null);
                self.client.post_json(&path, &body).await
            }
        }
    }

    pub fn results(&self) -> TestResults {
        let summary = self.session.summary();
        TestResults {
            session_id: self.session.session_id.clone(),
            target: self.session.target.clone(),
            scenarios: self.session.scenarios.iter().map(|s| s.to_report()).collect(),
            summary,
            generated_at: Utc::now().to_rfc3339(),
        }
    }
}

fn new_scenario_state(scenario: &ScenarioSpec) -> ScenarioState {
    let steps = scenario
        .steps
        .iter()
        .enumerate()
        .map(|(i, step)| StepState::new(i, &step.name, &step.display()))
        .collect();
    ScenarioState::new(&scenario.name, steps)
}

/// Classify a probe outcome against the step's checks and, on success,
/// write the step's saved bindings into Scenario State.
fn evaluate(
    step: &StepSpec,
    result: &ProbeResult,
    context: &mut ScenarioContext,
) -> Result<(), String> {
    if let Some(failure) = &result.failure {
        return Err(failure.to_string());
    }
    let body = result.body.as_ref().ok_or("empty response body")?;

    for check in &step.checks {
        let resolved = resolve_check(check, context);
        checks::apply(&resolved, body).map_err(|reason| {
            ProbeFailure::Contract { reason }.to_string()
        })?;
    }

    for (name, path) in &step.save {
        match ScenarioContext::extract(body, path) {
            Some(value) => context.bind(name, value),
            None => {
                return Err(ProbeFailure::Contract {
                    reason: format!("save path '{}' not found in response", path),
                }
                .to_string())
            }
        }
    }

    Ok(())
}

/// Resolve `${binding}` placeholders in a check's expected values so
/// echo assertions compare against what an earlier step produced.
fn resolve_check(check: &CheckSpec, context: &ScenarioContext) -> CheckSpec {
    match check {
        CheckSpec::Equals { field, value } => CheckSpec::Equals {
            field: field.clone(),
            value: context.substitute_value(value),
        },
        CheckSpec::Contains { field, needle } => CheckSpec::Contains {
            field: field.clone(),
            needle: context.substitute(needle),
        },
        CheckSpec::ListIncludes { field, value } => CheckSpec::ListIncludes {
            field: field.clone(),
            value: context.substitute_value(value),
        },
        other => other.clone(),
    }
}
