//! Shared HTTP plumbing for remote embedding providers.

use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{EmbeddingError, EmbeddingResult};

/// Build a client with JSON content type and the given extra headers.
pub(crate) fn build_client(mut headers: HeaderMap, timeout: Duration) -> EmbeddingResult<Client> {
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Client::builder()
        .timeout(timeout)
        .default_headers(headers)
        .build()
        .map_err(|e| EmbeddingError::Config(format!("failed to build HTTP client: {e}")))
}

const BASE_DELAY: Duration = Duration::from_millis(500);

/// Retry budget for one logical request.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RetryPolicy {
    /// Total attempts, including the first.
    max_attempts: usize,
    base_delay: Duration,
}

impl RetryPolicy {
    pub(crate) fn new(max_attempts: usize) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: BASE_DELAY,
        }
    }

    #[cfg(test)]
    fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    fn should_retry_status(status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }

    fn should_retry_error(err: &reqwest::Error) -> bool {
        err.is_timeout() || err.is_connect() || err.is_request() || err.is_body()
    }

    /// Delay before retry number `attempt`: `base * 2^min(attempt, 5)`.
    pub(crate) fn backoff(&self, attempt: usize) -> Duration {
        let capped = attempt.min(5) as u32;
        self.base_delay * (1 << capped)
    }

    /// POST `body` as JSON and decode the JSON response.
    ///
    /// 429 and 5xx responses and connection-level failures are retried with
    /// exponential backoff until the attempt budget runs out.
    pub(crate) async fn post_json<B, R>(
        &self,
        client: &Client,
        url: &str,
        body: &B,
    ) -> EmbeddingResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let mut attempt = 0usize;
        loop {
            match client.post(url).json(body).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        return resp
                            .json::<R>()
                            .await
                            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()));
                    }

                    let body = resp
                        .text()
                        .await
                        .unwrap_or_else(|_| "<body unavailable>".to_string());
                    if Self::should_retry_status(status) && attempt + 1 < self.max_attempts {
                        attempt += 1;
                        tracing::warn!(
                            target: "embedding",
                            "embedding request returned {status}, retry {attempt}"
                        );
                        tokio::time::sleep(self.backoff(attempt)).await;
                        continue;
                    }
                    return Err(EmbeddingError::Service {
                        status: status.as_u16(),
                        body,
                    });
                }
                Err(err) => {
                    if Self::should_retry_error(&err) && attempt + 1 < self.max_attempts {
                        attempt += 1;
                        tracing::warn!(
                            target: "embedding",
                            "embedding request failed ({err}), retry {attempt}"
                        );
                        tokio::time::sleep(self.backoff(attempt)).await;
                        continue;
                    }
                    return Err(EmbeddingError::Transport(err));
                }
            }
        }
    }
}
