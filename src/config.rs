use std::env;

/// Environment variable consulted when no `--base-url` flag is given.
pub const BASE_URL_ENV: &str = "SOUQ_BASE_URL";

/// Literal fallback when neither flag nor environment provide a target.
pub const DEFAULT_BASE_URL: &str = "https://souqonline.preview.emergentagent.com";

/// Target service configuration, resolved once and passed into the probe
/// client at construction. Never read from ambient state after that, so one
/// process can drive several targets.
#[derive(Debug, Clone)]
pub struct TargetConfig {
    /// Base URL without the `/api` prefix
    pub base_url: String,

    /// Per-request timeout (ms)
    pub timeout_ms: u64,
}

impl TargetConfig {
    /// Resolve the target: explicit flag, then `SOUQ_BASE_URL`, then the
    /// literal default.
    pub fn resolve(flag: Option<String>, timeout_ms: u64) -> Self {
        let base_url = flag
            .or_else(|| env::var(BASE_URL_ENV).ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_ms,
        }
    }

    /// Full API prefix, e.g. `https://host/api`
    pub fn api_base(&self) -> String {
        format!("{}/api", self.base_url)
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: 10_000,
        }
    }
}

/// Knobs for the stability diagnostics. Defaults mirror the reference
/// behavior of the diagnostic run.
#[derive(Debug, Clone)]
pub struct DiagnosticsConfig {
    /// Requests in the parallel burst
    pub burst_requests: usize,

    /// Bounded worker pool size for the burst
    pub burst_workers: usize,

    /// Requests in the rapid-sequential pass
    pub sequential_requests: usize,

    /// Inter-request delay for the rapid-sequential pass (ms)
    pub sequential_delay_ms: u64,

    /// Wall-clock length of the stability window (s)
    pub stability_duration_secs: u64,

    /// Cadence of the stability window (s)
    pub stability_interval_secs: u64,

    /// Failure rate still counted as a pass for the stability window.
    /// 0.0 keeps the zero-failure rule.
    pub acceptable_failure_rate: f64,

    /// Attempts when trying to reproduce the known server-side fault
    pub repro_attempts: usize,

    /// Delay between reproduction attempts (ms)
    pub repro_delay_ms: u64,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            burst_requests: 20,
            burst_workers: 10,
            sequential_requests: 20,
            sequential_delay_ms: 100,
            stability_duration_secs: 30,
            stability_interval_secs: 2,
            acceptable_failure_rate: 0.0,
            repro_attempts: 20,
            repro_delay_ms: 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_base_strips_trailing_slash() {
        let config = TargetConfig::resolve(Some("http://localhost:3000/".to_string()), 10_000);
        assert_eq!(config.api_base(), "http://localhost:3000/api");
    }

    #[test]
    fn test_flag_wins_over_default() {
        let config = TargetConfig::resolve(Some("http://staging.local".to_string()), 5_000);
        assert_eq!(config.base_url, "http://staging.local");
        assert_eq!(config.timeout_ms, 5_000);
    }
}
