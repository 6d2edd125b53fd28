//! Remote-write forwarder (C9, §4.9): POSTs the (possibly transformed)
//! batch to the upstream remote-write receiver with a tenant header and a
//! hard deadline.

use std::time::Duration;

use http::StatusCode;
use ingestgate_types::metrics::GatewayMetrics;
use url::Url;

use crate::error::ForwardError;

const FORWARD_DEADLINE: Duration = Duration::from_secs(5);

/// The outcome of a forward attempt, already mapped to the status the
/// client should see (§4.9, §7).
pub struct ForwardOutcome {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

pub struct Forwarder {
    client: reqwest::Client,
    forward_url: Url,
    metrics: GatewayMetrics,
}

impl Forwarder {
    pub fn new(forward_url: Url, metrics: GatewayMetrics) -> Self {
        Self {
            client: reqwest::Client::new(),
            forward_url,
            metrics,
        }
    }

    /// Forwards `body` upstream, preserving `content_type` and setting the
    /// tenant header from `subject`.
    pub async fn forward(
        &self,
        subject: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<ForwardOutcome, ForwardError> {
        let result = self
            .client
            .post(self.forward_url.clone())
            .header(http::header::CONTENT_TYPE, content_type)
            .header("THANOS-TENANT", subject)
            .timeout(FORWARD_DEADLINE)
            .body(body)
            .send()
            .await;

        match result {
            Ok(response) => {
                let status = response.status();
                let label = if status.is_success() { "success" } else { "error" };
                self.metrics
                    .forward_requests_total
                    .with_label_values(&[label])
                    .inc();
                let body = response.bytes().await.unwrap_or_default().to_vec();
                Ok(ForwardOutcome { status, body })
            }
            Err(err) => {
                self.metrics
                    .forward_requests_total
                    .with_label_values(&["error"])
                    .inc();
                Err(ForwardError::Transient(err))
            }
        }
    }
}
