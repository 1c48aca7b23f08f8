use super::state::{ScenarioStatus, SuiteSummary};
use tokio::sync::broadcast;

/// Suite execution events for real-time console updates
#[derive(Debug, Clone)]
pub enum TestEvent {
    SessionStarted {
        session_id: String,
        target: String,
    },
    SessionFinished {
        summary: SuiteSummary,
    },

    ScenarioStarted {
        scenario_name: String,
        step_count: usize,
    },
    ScenarioFinished {
        scenario_name: String,
        status: ScenarioStatus,
        duration_ms: Option<u64>,
    },

    StepStarted {
        scenario_name: String,
        index: usize,
        display: String,
    },
    StepPassed {
        index: usize,
        duration_ms: u64,
    },
    StepFailed {
        index: usize,
        error: String,
        duration_ms: u64,
    },

    Log {
        message: String,
    },
}

/// Event emitter for broadcasting suite events
pub struct EventEmitter {
    sender: broadcast::Sender<TestEvent>,
}

impl EventEmitter {
    pub fn new() -> (Self, broadcast::Receiver<TestEvent>) {
        let (sender, receiver) = broadcast::channel(100);
        (Self { sender }, receiver)
    }

    pub fn emit(&self, event: TestEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self { sender }
    }
}

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration as StdDuration;

/// Console event listener for printing real-time updates
pub struct ConsoleEventListener;

impl ConsoleEventListener {
    pub async fn listen(mut receiver: broadcast::Receiver<TestEvent>) {
        use colored::Colorize;
        use indicatif::ProgressDrawTarget;
        use std::io::IsTerminal;

        // Hidden draw target when piped to avoid terminal escape codes
        let multi = if std::io::stdout().is_terminal() {
            MultiProgress::new()
        } else {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        };

        let mut spinner: Option<ProgressBar> = None;
        let mut step_text = String::new();

        while let Ok(event) = receiver.recv().await {
            match event {
                TestEvent::SessionStarted { session_id, target } => {
                    multi
                        .println(format!(
                            "\n{} Contract session started: {}\n  Target: {}",
                            "▶".green().bold(),
                            session_id.cyan(),
                            target.cyan()
                        ))
                        .ok();
                }

                TestEvent::SessionFinished { summary } => {
                    if let Some(pb) = spinner.take() {
                        pb.finish();
                    }
                    tokio::time::sleep(StdDuration::from_millis(200)).await;

                    println!("\n{} Contract session finished", "■".blue().bold());
                    println!("  Total scenarios: {}", summary.total_scenarios);
                    println!("  Total steps: {}", summary.total_steps);
                    println!(
                        "  {} passed, {} failed, {} skipped",
                        summary.passed.to_string().green(),
                        summary.failed.to_string().red(),
                        summary.skipped.to_string().yellow()
                    );
                    if let Some(duration) = summary.total_duration_ms {
                        println!("  Duration: {}ms", duration);
                    }
                }

                TestEvent::ScenarioStarted {
                    scenario_name,
                    step_count,
                } => {
                    println!(
                        "\n  {} Scenario: {} ({} steps)",
                        "→".blue(),
                        scenario_name.white().bold(),
                        step_count
                    );
                }

                TestEvent::ScenarioFinished {
                    scenario_name,
                    status,
                    duration_ms,
                } => {
                    if let Some(pb) = spinner.take() {
                        pb.finish();
                    }

                    let status_str = match status {
                        ScenarioStatus::Passed => "PASSED".green().bold(),
                        ScenarioStatus::Failed => "FAILED".red().bold(),
                        ScenarioStatus::PartiallyPassed { passed, failed } => {
                            format!("PARTIAL ({}/{} passed)", passed, passed + failed)
                                .yellow()
                                .bold()
                        }
                        ScenarioStatus::Skipped => "SKIPPED".yellow().bold(),
                        _ => "UNKNOWN".white().bold(),
                    };
                    println!("  {} Scenario {} [{}]", "←".blue(), scenario_name, status_str);
                    if let Some(duration) = duration_ms {
                        println!("    Duration: {}ms", duration);
                    }
                }

                TestEvent::StepStarted { index, display, .. } => {
                    let pb = multi.add(ProgressBar::new_spinner());
                    let style = ProgressStyle::default_spinner()
                        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
                        .template("    {spinner} {msg}")
                        .unwrap();
                    pb.set_style(style);

                    let body = format!("[{}] {}... ", index, display.dimmed());
                    pb.set_message(body.clone());
                    pb.enable_steady_tick(StdDuration::from_millis(100));

                    spinner = Some(pb);
                    step_text = body;
                }

                TestEvent::StepPassed { duration_ms, .. } => {
                    let done_msg =
                        format!("    {} {}({}ms)", "✓".green(), step_text, duration_ms);
                    if let Some(pb) = spinner.take() {
                        pb.finish_and_clear();
                        tokio::time::sleep(StdDuration::from_millis(50)).await;
                    }
                    println!("{}", done_msg);
                }

                TestEvent::StepFailed {
                    error, duration_ms, ..
                } => {
                    let done_msg =
                        format!("    {} {}({}ms)", "✗".red(), step_text, duration_ms);
                    if let Some(pb) = spinner.take() {
                        pb.finish_and_clear();
                        tokio::time::sleep(StdDuration::from_millis(50)).await;
                    }
                    println!("{}", done_msg);
                    println!("      {}", error.red());
                }

                TestEvent::Log { message } => {
                    multi.println(format!("      {}", message)).ok();
                }
            }
        }
    }
}
