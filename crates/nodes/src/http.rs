//! `http_request` node and the outbound HTTP seam it calls through.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use crate::{ExecutableNode, ExecutionContext, NodeError, NodeOutcome};

/// Outbound HTTP used by `http_request` nodes.
///
/// Returns the response body on 2xx: parsed as JSON when it is JSON, the raw
/// text otherwise.
#[async_trait]
pub trait HttpCaller: Send + Sync {
    async fn call(&self, method: &Method, url: &str, body: &Value) -> Result<Value, NodeError>;
}

/// Client settings for [`ReqwestCaller`].
#[derive(Debug, Clone)]
pub struct HttpCallerConfig {
    /// Whole-request timeout. This is the only bound on how long an
    /// `http_request` node can run.
    pub timeout: Duration,
}

impl Default for HttpCallerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

/// [`HttpCaller`] backed by a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestCaller {
    client: reqwest::Client,
}

impl ReqwestCaller {
    pub fn new(config: &HttpCallerConfig) -> Result<Self, NodeError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| NodeError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpCaller for ReqwestCaller {
    async fn call(&self, method: &Method, url: &str, body: &Value) -> Result<Value, NodeError> {
        let response = self
            .client
            .request(method.clone(), url)
            .json(body)
            .send()
            .await
            .map_err(|e| NodeError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NodeError::Status(status.as_u16()));
        }

        let text = response
            .text()
            .await
            .map_err(|e| NodeError::Body(e.to_string()))?;

        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }
}

/// Sends the run payload as the request body and records the response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequestNode {
    pub method: Method,
    pub url: String,
}

impl HttpRequestNode {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
        }
    }
}

#[async_trait]
impl ExecutableNode for HttpRequestNode {
    async fn execute(&self, ctx: &ExecutionContext) -> Result<NodeOutcome, NodeError> {
        debug!(run_id = %ctx.run_id, method = %self.method, url = %self.url, "http request");
        let data = ctx.http.call(&self.method, &self.url, &ctx.payload).await?;
        Ok(NodeOutcome::with_data(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockHttpCaller;
    use serde_json::json;
    use std::sync::Arc;
    use uuid::Uuid;

    fn ctx(http: Arc<dyn HttpCaller>, payload: Value) -> ExecutionContext {
        ExecutionContext {
            flow_id: Uuid::new_v4(),
            run_id: Uuid::new_v4(),
            payload,
            http,
        }
    }

    #[tokio::test]
    async fn records_response_body_as_data() {
        let http = Arc::new(MockHttpCaller::responding(json!({ "id": 7 })));
        let node = HttpRequestNode::new(Method::POST, "http://svc.local/hook");

        let outcome = node
            .execute(&ctx(http.clone(), json!({ "name": "x" })))
            .await
            .unwrap();

        assert_eq!(outcome, NodeOutcome::with_data(json!({ "id": 7 })));
        let calls = http.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, Method::POST);
        assert_eq!(calls[0].url, "http://svc.local/hook");
        assert_eq!(calls[0].body, json!({ "name": "x" }));
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let http = Arc::new(MockHttpCaller::failing_status(404));
        let node = HttpRequestNode::new(Method::GET, "http://svc.local/missing");

        let err = node.execute(&ctx(http, json!({}))).await.unwrap_err();
        assert_eq!(err, NodeError::Status(404));
        assert_eq!(err.to_string(), "request failed with status code 404");
    }

    #[tokio::test]
    async fn reqwest_caller_rejects_unparseable_url_without_network() {
        let caller = ReqwestCaller::new(&HttpCallerConfig::default()).unwrap();
        let err = caller.call(&Method::GET, "bad-url", &json!({})).await.unwrap_err();
        assert!(matches!(err, NodeError::Transport(ref msg) if !msg.is_empty()));
    }
}
