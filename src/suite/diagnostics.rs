use std::time::{Duration, Instant};

use colored::Colorize;
use futures::StreamExt;
use serde::Serialize;

use crate::config::DiagnosticsConfig;
use crate::probe::{ProbeClient, ProbeFailure, ProbeResult};

/// Read-only endpoints used by every stability probe
const READ_ENDPOINTS: [&str; 2] = ["products", "categories"];

/// Server-side error signature the targeted reproduction probe hunts for
/// in 500 bodies.
pub const FAULT_NEEDLES: [&str; 2] = ["Cannot read properties of undefined", "collection"];

pub fn signature_matches(body: &str) -> bool {
    FAULT_NEEDLES.iter().all(|needle| body.contains(needle))
}

/// One failed request, kept for the report
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureDetail {
    pub request_id: usize,
    pub endpoint: String,
    pub error: String,
}

/// Aggregated verdict of one diagnostic batch
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    pub name: String,
    pub total: usize,
    pub failures: Vec<FailureDetail>,
}

impl BatchOutcome {
    fn collect(name: &str, results: &[ProbeResult]) -> Self {
        let failures = results
            .iter()
            .filter(|r| !r.success())
            .map(|r| FailureDetail {
                request_id: r.request_id,
                endpoint: r.endpoint.clone(),
                error: r.error_text(),
            })
            .collect();
        Self {
            name: name.to_string(),
            total: results.len(),
            failures,
        }
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn failure_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.failed() as f64 / self.total as f64
        }
    }

    /// Pass when the failure rate is within the acceptable threshold.
    /// The reference rule is zero failures (threshold 0.0).
    pub fn within(&self, acceptable_failure_rate: f64) -> bool {
        self.failure_rate() <= acceptable_failure_rate
    }
}

/// Best-effort reproduction of the known fault; never fails the run
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReproOutcome {
    Reproduced { attempt: usize, body: String },
    NotReproduced { attempts: usize },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsReport {
    pub concurrent: BatchOutcome,
    pub sequential: BatchOutcome,
    pub stability: BatchOutcome,
    pub acceptable_failure_rate: f64,
    pub reproduction: ReproOutcome,
}

impl DiagnosticsReport {
    /// Reproduction is excluded on purpose: not reproducing a known fault
    /// is not a failure of the diagnostic run.
    pub fn passed(&self) -> bool {
        self.concurrent.within(0.0)
            && self.sequential.within(0.0)
            && self.stability.within(self.acceptable_failure_rate)
    }
}

/// Run all stability diagnostics against the target. Probes pass on any
/// 200 regardless of body content; transport errors are converted into
/// probe results per request; nothing aborts a batch.
pub async fn run_diagnostics(
    client: &ProbeClient,
    config: &DiagnosticsConfig,
) -> DiagnosticsReport {
    println!("\n{}", "STABILITY DIAGNOSTICS".bold());
    println!("  Target: {}\n", client.api_base().cyan());

    let concurrent = concurrent_burst(client, config).await;
    let sequential = rapid_sequential(client, config).await;
    let stability = stability_window(client, config).await;
    let reproduction = reproduce_fault(client, config).await;

    DiagnosticsReport {
        concurrent,
        sequential,
        stability,
        acceptable_failure_rate: config.acceptable_failure_rate,
        reproduction,
    }
}

/// Parallel burst over a bounded worker pool. Liveness check only: nothing
/// beyond the status code is inspected, and no ordering is assumed across
/// the in-flight requests.
async fn concurrent_burst(client: &ProbeClient, config: &DiagnosticsConfig) -> BatchOutcome {
    print_header("Concurrent burst (race condition detection)");

    let requests = futures::stream::iter(
        READ_ENDPOINTS
            .iter()
            .cycle()
            .take(config.burst_requests)
            .map(|endpoint| client.get_status(endpoint)),
    );
    let results: Vec<ProbeResult> = requests
        .buffer_unordered(config.burst_workers)
        .collect()
        .await;

    let outcome = BatchOutcome::collect("concurrent", &results);
    print_outcome(&outcome);
    outcome
}

/// Same endpoints one at a time with a fixed delay, to tell concurrency
/// failures apart from plain overload.
async fn rapid_sequential(client: &ProbeClient, config: &DiagnosticsConfig) -> BatchOutcome {
    print_header("Rapid sequential requests");

    let mut results = Vec::with_capacity(config.sequential_requests);
    for endpoint in READ_ENDPOINTS
        .iter()
        .cycle()
        .take(config.sequential_requests)
    {
        results.push(client.get_status(endpoint).await);
        tokio::time::sleep(Duration::from_millis(config.sequential_delay_ms)).await;
    }

    let outcome = BatchOutcome::collect("sequential", &results);
    print_outcome(&outcome);
    outcome
}

/// Alternating probes at a fixed cadence for a fixed wall-clock window
async fn stability_window(client: &ProbeClient, config: &DiagnosticsConfig) -> BatchOutcome {
    print_header("Connection stability window");

    let window = Duration::from_secs(config.stability_duration_secs);
    let interval = Duration::from_secs(config.stability_interval_secs);
    let start = Instant::now();

    let mut results = Vec::new();
    let mut count = 0usize;
    while start.elapsed() < window {
        let endpoint = READ_ENDPOINTS[count % READ_ENDPOINTS.len()];
        let result = client.get_status(endpoint).await;
        println!(
            "    Request {}: {} -> {}",
            count,
            endpoint,
            if result.success() {
                "ok".green()
            } else {
                "failed".red()
            }
        );
        results.push(result);
        count += 1;
        tokio::time::sleep(interval).await;
    }

    let outcome = BatchOutcome::collect("stability", &results);
    println!(
        "    Window: {}s, success rate: {:.1}%",
        config.stability_duration_secs,
        (1.0 - outcome.failure_rate()) * 100.0
    );
    print_outcome(&outcome);
    outcome
}

/// Hammer one endpoint looking for the known error signature in 500
/// bodies. Absence within the attempt budget is "not reproduced".
async fn reproduce_fault(client: &ProbeClient, config: &DiagnosticsConfig) -> ReproOutcome {
    print_header("Targeted fault reproduction");

    for attempt in 1..=config.repro_attempts {
        let result = client.get_status("products").await;
        match &result.failure {
            Some(ProbeFailure::Status { code: 500, body }) if signature_matches(body) => {
                println!(
                    "    {} signature found on attempt {}",
                    "✗".red(),
                    attempt
                );
                return ReproOutcome::Reproduced {
                    attempt,
                    body: body.clone(),
                };
            }
            Some(failure) => {
                println!("    Attempt {}: {}", attempt, failure.to_string().dimmed());
            }
            None => {
                println!("    Attempt {}: {}", attempt, "ok".green());
            }
        }
        tokio::time::sleep(Duration::from_millis(config.repro_delay_ms)).await;
    }

    println!(
        "    Signature not reproduced in {} attempts",
        config.repro_attempts
    );
    ReproOutcome::NotReproduced {
        attempts: config.repro_attempts,
    }
}

fn print_header(title: &str) {
    println!("\n  {} {}", "→".blue(), title.white().bold());
}

fn print_outcome(outcome: &BatchOutcome) {
    println!(
        "    {} successful, {} failed (of {})",
        (outcome.total - outcome.failed()).to_string().green(),
        outcome.failed().to_string().red(),
        outcome.total
    );
    for failure in &outcome.failures {
        println!(
            "      request {} ({}): {}",
            failure.request_id, failure.endpoint, failure.error
        );
    }
}

/// Final verdict plus the remediation checklist when anything failed
pub fn print_report(report: &DiagnosticsReport) {
    println!("\n{}", "DIAGNOSTIC SUMMARY".bold());
    for outcome in [&report.concurrent, &report.sequential, &report.stability] {
        let acceptable = if outcome.name == "stability" {
            report.acceptable_failure_rate
        } else {
            0.0
        };
        let verdict = if outcome.within(acceptable) {
            "PASS".green().bold()
        } else {
            "FAIL".red().bold()
        };
        println!(
            "  {}: {} ({}/{} failed)",
            outcome.name,
            verdict,
            outcome.failed(),
            outcome.total
        );
    }
    match &report.reproduction {
        ReproOutcome::Reproduced { attempt, .. } => {
            println!("  reproduction: {} (attempt {})", "reproduced".red(), attempt)
        }
        ReproOutcome::NotReproduced { attempts } => println!(
            "  reproduction: {} ({} attempts)",
            "not reproduced".green(),
            attempts
        ),
    }

    if report.passed() {
        println!(
            "\n{} All diagnostic checks passed - backend connection appears stable",
            "✓".green().bold()
        );
    } else {
        println!("\n{} Issues detected:", "✗".red().bold());
        println!("  - backend connection instability under load");
        println!("  - potential race conditions in connection handling");
        println!("\n  Recommended fixes:");
        println!("  1. Add proper connection pooling");
        println!("  2. Implement connection retry logic");
        println!("  3. Add null checks for the database handle");
        println!("  4. Use a connection singleton");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn results(failed: usize, total: usize) -> Vec<ProbeResult> {
        (0..total)
            .map(|i| {
                if i < failed {
                    ProbeResult::failed(
                        "products",
                        i,
                        None,
                        ProbeFailure::Transport {
                            error: "timeout".to_string(),
                        },
                    )
                } else {
                    ProbeResult::ok("products", i, serde_json::json!([]))
                }
            })
            .collect()
    }

    #[test]
    fn test_zero_failures_passes() {
        let outcome = BatchOutcome::collect("concurrent", &results(0, 20));
        assert!(outcome.within(0.0));
        assert_eq!(outcome.failure_rate(), 0.0);
    }

    #[test]
    fn test_single_failure_breaks_reference_rule() {
        let outcome = BatchOutcome::collect("stability", &results(1, 20));
        assert!(!outcome.within(0.0));
        // but a configured threshold can accept it
        assert!(outcome.within(0.1));
    }

    #[test]
    fn test_failure_details_name_request_and_endpoint() {
        let outcome = BatchOutcome::collect("sequential", &results(2, 5));
        assert_eq!(outcome.failed(), 2);
        assert_eq!(outcome.failures[0].endpoint, "products");
        assert!(outcome.failures[0].error.contains("timeout"));
    }

    #[test]
    fn test_signature_requires_both_needles() {
        assert!(signature_matches(
            "TypeError: Cannot read properties of undefined (reading 'collection')"
        ));
        assert!(!signature_matches("Cannot read properties of undefined"));
        assert!(!signature_matches("collection is missing"));
    }

    #[test]
    fn test_reproduction_never_fails_the_run() {
        let report = DiagnosticsReport {
            concurrent: BatchOutcome::collect("concurrent", &results(0, 20)),
            sequential: BatchOutcome::collect("sequential", &results(0, 20)),
            stability: BatchOutcome::collect("stability", &results(0, 15)),
            acceptable_failure_rate: 0.0,
            reproduction: ReproOutcome::Reproduced {
                attempt: 3,
                body: "Cannot read properties of undefined (collection)".to_string(),
            },
        };
        assert!(report.passed());
    }
}
