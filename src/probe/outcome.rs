use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a probe did not pass. Failures are values carried in the result,
/// never propagated as errors, so a batch can never be short-circuited by
/// one bad request.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProbeFailure {
    /// DNS failure, connection refused, timeout. No HTTP status exists.
    #[error("transport error: {error}")]
    Transport { error: String },

    /// The service answered, but not with 200.
    #[error("HTTP {code}: {body}")]
    Status { code: u16, body: String },

    /// 200 with a body that is not JSON.
    #[error("invalid JSON body: {error}")]
    Json { error: String },

    /// Well-formed response failing a structural or value check.
    #[error("contract violation: {reason}")]
    Contract { reason: String },

    /// A chained step could not run because an earlier step's output is
    /// absent. No HTTP call was made.
    #[error("prerequisite not met: {reason}")]
    Prerequisite { reason: String },
}

/// One HTTP call and its classified outcome. Immutable once recorded.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeResult {
    /// Endpoint path the request targeted
    pub endpoint: String,

    /// Process-wide request sequence number
    pub request_id: usize,

    /// HTTP status, None on transport failure
    pub status: Option<u16>,

    /// Parsed JSON body, present only on a 200 with valid JSON
    #[serde(skip_serializing)]
    pub body: Option<serde_json::Value>,

    pub failure: Option<ProbeFailure>,
}

impl ProbeResult {
    pub fn ok(endpoint: &str, request_id: usize, body: serde_json::Value) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            request_id,
            status: Some(200),
            body: Some(body),
            failure: None,
        }
    }

    /// A success recorded from the status line alone; the body is neither
    /// captured nor decoded.
    pub fn alive(endpoint: &str, request_id: usize, status: u16) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            request_id,
            status: Some(status),
            body: None,
            failure: None,
        }
    }

    pub fn failed(
        endpoint: &str,
        request_id: usize,
        status: Option<u16>,
        failure: ProbeFailure,
    ) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            request_id,
            status,
            body: None,
            failure: Some(failure),
        }
    }

    pub fn success(&self) -> bool {
        self.failure.is_none()
    }

    /// Human-readable failure text, empty for successes
    pub fn error_text(&self) -> String {
        self.failure
            .as_ref()
            .map(|f| f.to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_failure_has_no_status() {
        let result = ProbeResult::failed(
            "products",
            0,
            None,
            ProbeFailure::Transport {
                error: "connection refused".to_string(),
            },
        );
        assert!(!result.success());
        assert_eq!(result.status, None);
        assert!(result.error_text().contains("connection refused"));
    }

    #[test]
    fn test_contract_failure_keeps_status() {
        let result = ProbeResult::failed(
            "users",
            3,
            Some(200),
            ProbeFailure::Contract {
                reason: "missing required fields: [uid]".to_string(),
            },
        );
        assert_eq!(result.status, Some(200));
        assert!(result.error_text().contains("missing required fields"));
    }
}
