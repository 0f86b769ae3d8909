// Leadflow Engine - HTTP webhook caller
//
// reqwest-backed WebhookCaller for the `webhook` action type. Network
// failures and non-2xx responses surface as action errors, never
// swallowed; the per-call timeout keeps a stuck endpoint from eating the
// whole execution budget on its own.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use leadflow_core::{LeadflowError, LeadflowResult};

use crate::services::WebhookCaller;

const DEFAULT_CALL_TIMEOUT_SECS: u64 = 30;

/// WebhookCaller backed by a shared reqwest client
pub struct HttpWebhookCaller {
    client: reqwest::Client,
}

impl HttpWebhookCaller {
    pub fn new() -> LeadflowResult<Self> {
        Self::with_timeout(Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> LeadflowResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LeadflowError::action(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl WebhookCaller for HttpWebhookCaller {
    async fn call(
        &self,
        url: &str,
        method: &str,
        headers: &HashMap<String, String>,
        body: &Value,
    ) -> LeadflowResult<()> {
        debug!(url = %url, method = %method, "Calling webhook");

        let mut request = match method.to_uppercase().as_str() {
            "GET" => self.client.get(url),
            "POST" => self.client.post(url),
            "PUT" => self.client.put(url),
            "PATCH" => self.client.patch(url),
            "DELETE" => self.client.delete(url),
            other => {
                return Err(LeadflowError::action_config(format!(
                    "unsupported webhook method: {}",
                    other
                )))
            }
        };

        for (key, value) in headers {
            request = request.header(key.as_str(), value.as_str());
        }

        if !matches!(method.to_uppercase().as_str(), "GET" | "DELETE") {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| LeadflowError::action(format!("webhook call to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LeadflowError::action(format!(
                "webhook call to {} returned {}",
                url, status
            )));
        }

        Ok(())
    }
}
