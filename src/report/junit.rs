use super::types::TestResults;
use crate::runner::state::{ScenarioStateReport, ScenarioStatus, StepStatus};
use anyhow::Result;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;
use std::path::Path;

/// Generate JUnit XML report string from TestResults. One testcase per
/// scenario; a failed scenario carries its step errors in the failure body.
pub fn generate_junit_xml(results: &TestResults) -> Result<String> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let total_tests = results.scenarios.len();
    let failures = results
        .scenarios
        .iter()
        .filter(|s| {
            matches!(
                s.status,
                ScenarioStatus::Failed | ScenarioStatus::PartiallyPassed { .. }
            )
        })
        .count();
    let skipped = results
        .scenarios
        .iter()
        .filter(|s| matches!(s.status, ScenarioStatus::Skipped))
        .count();
    let total_duration: u64 = results
        .scenarios
        .iter()
        .map(|s| s.total_duration_ms.unwrap_or(0))
        .sum();

    let mut suites_start = BytesStart::new("testsuites");
    suites_start.push_attribute(("name", "souq-tester-run"));
    suites_start.push_attribute(("tests", total_tests.to_string().as_str()));
    suites_start.push_attribute(("failures", failures.to_string().as_str()));
    suites_start.push_attribute(("skipped", skipped.to_string().as_str()));
    suites_start.push_attribute((
        "time",
        (total_duration as f64 / 1000.0).to_string().as_str(),
    ));
    writer.write_event(Event::Start(suites_start))?;

    let mut suite_start = BytesStart::new("testsuite");
    suite_start.push_attribute(("name", results.target.as_str()));
    suite_start.push_attribute(("tests", total_tests.to_string().as_str()));
    suite_start.push_attribute(("failures", failures.to_string().as_str()));
    suite_start.push_attribute(("skipped", skipped.to_string().as_str()));
    suite_start.push_attribute(("id", results.session_id.as_str()));
    suite_start.push_attribute((
        "time",
        (total_duration as f64 / 1000.0).to_string().as_str(),
    ));
    suite_start.push_attribute(("timestamp", results.generated_at.as_str()));
    writer.write_event(Event::Start(suite_start))?;

    for scenario in &results.scenarios {
        write_test_case(&mut writer, scenario)?;
    }

    writer.write_event(Event::End(BytesEnd::new("testsuite")))?;
    writer.write_event(Event::End(BytesEnd::new("testsuites")))?;

    let result = writer.into_inner().into_inner();
    let xml = String::from_utf8(result)?;
    Ok(xml)
}

fn write_test_case<W: std::io::Write>(
    writer: &mut Writer<W>,
    scenario: &ScenarioStateReport,
) -> Result<()> {
    let mut case_start = BytesStart::new("testcase");
    case_start.push_attribute(("name", scenario.scenario_name.as_str()));
    case_start.push_attribute(("classname", "contract"));
    case_start.push_attribute((
        "time",
        (scenario.total_duration_ms.unwrap_or(0) as f64 / 1000.0)
            .to_string()
            .as_str(),
    ));

    match scenario.status {
        ScenarioStatus::Passed => {
            writer.write_event(Event::Empty(case_start))?;
        }
        ScenarioStatus::Skipped => {
            writer.write_event(Event::Start(case_start))?;
            writer.write_event(Event::Empty(BytesStart::new("skipped")))?;
            writer.write_event(Event::End(BytesEnd::new("testcase")))?;
        }
        _ => {
            writer.write_event(Event::Start(case_start))?;

            let step_errors: Vec<String> = scenario
                .steps
                .iter()
                .filter_map(|step| match &step.status {
                    StepStatus::Failed { error } => {
                        Some(format!("{}: {}", step.step_name, error))
                    }
                    _ => None,
                })
                .collect();

            let mut failure_start = BytesStart::new("failure");
            failure_start.push_attribute((
                "message",
                step_errors
                    .first()
                    .map(String::as_str)
                    .unwrap_or("scenario failed"),
            ));
            writer.write_event(Event::Start(failure_start))?;
            writer.write_event(Event::Text(BytesText::new(&step_errors.join("\n"))))?;
            writer.write_event(Event::End(BytesEnd::new("failure")))?;

            writer.write_event(Event::End(BytesEnd::new("testcase")))?;
        }
    }

    Ok(())
}

/// Generate and save the JUnit report next to the other artifacts
pub fn write_report(results: &TestResults, output_dir: &Path) -> Result<()> {
    let xml = generate_junit_xml(results)?;
    let path = output_dir.join("junit.xml");
    std::fs::write(&path, xml)?;
    println!("JUnit report saved to: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::state::{StepStateReport, SuiteSummary};

    fn sample_results() -> TestResults {
        TestResults {
            session_id: "s-1".to_string(),
            target: "http://localhost/api".to_string(),
            scenarios: vec![
                ScenarioStateReport {
                    scenario_name: "products".to_string(),
                    status: ScenarioStatus::Passed,
                    steps: vec![],
                    total_duration_ms: Some(120),
                },
                ScenarioStateReport {
                    scenario_name: "user-wallet-flow".to_string(),
                    status: ScenarioStatus::Failed,
                    steps: vec![StepStateReport {
                        index: 0,
                        step_name: "create-user".to_string(),
                        step_display: "POST /users".to_string(),
                        status: StepStatus::Failed {
                            error: "HTTP 500: boom".to_string(),
                        },
                        duration_ms: Some(40),
                        http_status: Some(500),
                    }],
                    total_duration_ms: Some(40),
                },
            ],
            summary: SuiteSummary {
                session_id: "s-1".to_string(),
                total_scenarios: 2,
                total_steps: 1,
                passed: 0,
                failed: 1,
                skipped: 0,
                total_duration_ms: Some(160),
            },
            generated_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_junit_contains_failure_details() {
        let xml = generate_junit_xml(&sample_results()).unwrap();
        assert!(xml.contains(r#"tests="2""#));
        assert!(xml.contains(r#"failures="1""#));
        assert!(xml.contains(r#"name="user-wallet-flow""#));
        assert!(xml.contains("create-user: HTTP 500: boom"));
    }

    #[test]
    fn test_passed_case_is_self_closing() {
        let xml = generate_junit_xml(&sample_results()).unwrap();
        assert!(xml.contains(r#"<testcase name="products" classname="contract" time="0.12"/>"#));
    }
}
