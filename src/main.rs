use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use souq_tester::config::{DiagnosticsConfig, TargetConfig};
use souq_tester::probe::ProbeClient;
use souq_tester::suite::{contract, diagnostics};
use souq_tester::{parser, report, runner};

#[derive(Parser)]
#[command(name = "souq-tester")]
#[command(version = "0.1.0")]
#[command(about = "Black-box contract tests and stability diagnostics for the Souq e-commerce API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the API contract suite (builtin e-commerce suite by default)
    Run {
        /// Path to a declarative YAML suite file
        #[arg(short, long)]
        suite: Option<PathBuf>,

        /// Target base URL (falls back to SOUQ_BASE_URL, then the builtin default)
        #[arg(short, long)]
        base_url: Option<String>,

        /// Run only the named scenario
        #[arg(long)]
        scenario: Option<String>,

        /// Per-request timeout in milliseconds
        #[arg(long, default_value = "10000")]
        timeout_ms: u64,

        /// Output directory for reports and artifacts
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Write JSON and JUnit reports
        #[arg(long, default_value = "false")]
        report: bool,
    },

    /// Run stability diagnostics (burst, sequential, window, fault reproduction)
    Diagnose {
        /// Target base URL (falls back to SOUQ_BASE_URL, then the builtin default)
        #[arg(short, long)]
        base_url: Option<String>,

        /// Per-request timeout in milliseconds
        #[arg(long, default_value = "10000")]
        timeout_ms: u64,

        /// Stability window failure rate still counted as a pass (0.0 - 1.0)
        #[arg(long, default_value = "0.0")]
        acceptable_failure_rate: f64,

        /// Stability window length in seconds
        #[arg(long, default_value = "30")]
        stability_duration: u64,

        /// Stability window cadence in seconds
        #[arg(long, default_value = "2")]
        stability_interval: u64,

        /// Requests in the parallel burst
        #[arg(long, default_value = "20")]
        burst_requests: usize,

        /// Worker pool size for the parallel burst
        #[arg(long, default_value = "10")]
        burst_workers: usize,
    },

    /// Generate report from saved session results
    Report {
        /// Path to session results JSON
        results: PathBuf,

        /// Output format (json, junit)
        #[arg(short, long, default_value = "json")]
        format: String,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            suite,
            base_url,
            scenario,
            timeout_ms,
            output,
            report,
        } => {
            let config = TargetConfig::resolve(base_url, timeout_ms);

            let suite_spec = match suite {
                Some(ref path) => parser::yaml::parse_suite_file(path)?,
                None => contract::builtin(),
            };

            println!(
                "{} Running suite: {}",
                "▶".green().bold(),
                suite_spec.name.cyan()
            );
            println!("  Target: {}", config.api_base().cyan());
            if let Some(ref name) = scenario {
                println!("  Scenario: {}", name.yellow());
            }
            if report {
                println!("  Reports: {}", "Enabled".green());
            }

            let results = runner::run_suite(&suite_spec, &config, scenario.as_deref()).await?;

            for scenario in &results.scenarios {
                for step in &scenario.steps {
                    if let runner::StepStatus::Failed { ref error } = step.status {
                        log::warn!(
                            "{} / {}: {}",
                            scenario.scenario_name,
                            step.step_name,
                            error
                        );
                    }
                }
            }

            if report {
                std::fs::create_dir_all(&output)?;

                let json_path = output.join("test-results.json");
                std::fs::write(&json_path, serde_json::to_string_pretty(&results)?)?;
                println!(
                    "\n{} JSON report saved to: {}",
                    "📄".to_string().blue(),
                    json_path.display().to_string().cyan()
                );

                report::junit::write_report(&results, &output)?;
            }

            if results.summary.failed > 0 {
                std::process::exit(1);
            }
        }

        Commands::Diagnose {
            base_url,
            timeout_ms,
            acceptable_failure_rate,
            stability_duration,
            stability_interval,
            burst_requests,
            burst_workers,
        } => {
            let config = TargetConfig::resolve(base_url, timeout_ms);
            let diag_config = DiagnosticsConfig {
                acceptable_failure_rate,
                stability_duration_secs: stability_duration,
                stability_interval_secs: stability_interval,
                burst_requests,
                burst_workers,
                ..DiagnosticsConfig::default()
            };

            let client = ProbeClient::new(&config)?;
            let diag_report = diagnostics::run_diagnostics(&client, &diag_config).await;
            diagnostics::print_report(&diag_report);

            if !diag_report.passed() {
                std::process::exit(1);
            }
        }

        Commands::Report {
            results,
            format,
            output,
        } => {
            println!(
                "{} Generating {} report from: {}",
                "📊".to_string().blue(),
                format.cyan(),
                results.display()
            );
            report::generate_report(&results, &format, output.as_deref()).await?;
        }
    }

    Ok(())
}
