pub mod context;
pub mod events;
pub mod executor;
pub mod state;

pub use events::*;
pub use executor::SuiteExecutor;
pub use state::*;

use anyhow::Result;

use crate::config::TargetConfig;
use crate::parser::types::SuiteSpec;
use crate::probe::ProbeClient;
use crate::report::types::TestResults;

/// Run one suite against the configured target and return the finished
/// results. Probe failures are inside the results; an `Err` here means the
/// harness itself could not run.
pub async fn run_suite(
    suite: &SuiteSpec,
    config: &TargetConfig,
    only: Option<&str>,
) -> Result<TestResults> {
    if let Some(name) = only {
        if !suite.scenarios.iter().any(|s| s.name == name) {
            anyhow::bail!("scenario '{}' not found in suite '{}'", name, suite.name);
        }
    }

    let client = ProbeClient::new(config)?;
    let mut executor = SuiteExecutor::new(client);
    executor.run_suite(suite, only).await?;
    Ok(executor.results())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_scenario_filter_is_an_error() {
        let suite = crate::suite::contract::builtin();
        let config = TargetConfig::default();

        let err = run_suite(&suite, &config, Some("no-such-scenario"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no-such-scenario"));
        assert!(err.to_string().contains(&suite.name));
    }
}
