use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::Result;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Method;

use super::outcome::{ProbeFailure, ProbeResult};
use crate::config::TargetConfig;

/// Thin wrapper over a shared reqwest client. Every call returns a
/// `ProbeResult`; transport errors are captured, never raised.
pub struct ProbeClient {
    http: reqwest::Client,
    api_base: String,
    seq: AtomicUsize,
}

impl ProbeClient {
    pub fn new(config: &TargetConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            api_base: config.api_base(),
            seq: AtomicUsize::new(0),
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub async fn get(&self, path: &str) -> ProbeResult {
        self.request(Method::GET, path, None, true).await
    }

    /// Liveness probe: classified by transport and status code only. A 200
    /// passes whatever the body holds; non-200 bodies are still kept raw
    /// for error-signature matching.
    pub async fn get_status(&self, path: &str) -> ProbeResult {
        self.request(Method::GET, path, None, false).await
    }

    pub async fn post_json(&self, path: &str, body: &serde_json::Value) -> ProbeResult {
        self.request(Method::POST, path, Some(body), true).await
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
        decode_body: bool,
    ) -> ProbeResult {
        let request_id = self.seq.fetch_add(1, Ordering::Relaxed);
        let url = format!("{}/{}", self.api_base, path.trim_start_matches('/'));
        debug!("[{}] {} {}", request_id, method, url);

        let mut req = self.http.request(method, &url);
        if let Some(json) = body {
            req = req.json(json);
        }

        let response = match req.send().await {
            Ok(r) => r,
            Err(e) => {
                return ProbeResult::failed(
                    path,
                    request_id,
                    None,
                    ProbeFailure::Transport {
                        error: e.to_string(),
                    },
                )
            }
        };

        let code = response.status().as_u16();
        let text = match response.text().await {
            Ok(t) => t,
            Err(e) => {
                return ProbeResult::failed(
                    path,
                    request_id,
                    Some(code),
                    ProbeFailure::Transport {
                        error: e.to_string(),
                    },
                )
            }
        };

        if code != 200 {
            return ProbeResult::failed(
                path,
                request_id,
                Some(code),
                ProbeFailure::Status { code, body: text },
            );
        }

        if !decode_body {
            return ProbeResult::alive(path, request_id, code);
        }

        match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(json) => ProbeResult::ok(path, request_id, json),
            Err(e) => ProbeResult::failed(
                path,
                request_id,
                Some(code),
                ProbeFailure::Json {
                    error: e.to_string(),
                },
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    /// Answers every request with 200 and a plain-text body.
    async fn plain_text_server() -> std::net::SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    let _ = socket.read(&mut buf).await;
                    let _ = socket
                        .write_all(
                            b"HTTP/1.1 200 OK\r\n\
                              content-type: text/plain\r\n\
                              content-length: 13\r\n\
                              connection: close\r\n\r\n\
                              backend alive",
                        )
                        .await;
                });
            }
        });
        addr
    }

    #[tokio::test]
    async fn test_status_probe_passes_non_json_200() {
        let addr = plain_text_server().await;
        let config = TargetConfig {
            base_url: format!("http://{}", addr),
            timeout_ms: 2_000,
        };
        let client = ProbeClient::new(&config).unwrap();

        // Liveness path: the status line is all that matters
        let alive = client.get_status("products").await;
        assert!(alive.success(), "{}", alive.error_text());
        assert_eq!(alive.status, Some(200));
        assert!(alive.body.is_none());

        // Contract path: the same response must fail JSON classification
        let contract = client.get("products").await;
        assert!(matches!(
            contract.failure,
            Some(ProbeFailure::Json { .. })
        ));
    }
}
