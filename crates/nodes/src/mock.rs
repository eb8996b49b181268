//! `MockHttpCaller`: a test double for [`HttpCaller`].
//!
//! Lets engine and node tests exercise `http_request` nodes without a
//! network. Every call is recorded; the response is chosen per URL, falling
//! back to a default behaviour.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use crate::{NodeError, http::HttpCaller};

/// Behaviour injected into `MockHttpCaller` at construction time.
#[derive(Debug, Clone)]
pub enum MockBehaviour {
    /// Answer 2xx with this body.
    Respond(Value),
    /// Answer with a non-2xx status.
    FailStatus(u16),
    /// Fail before any response arrives.
    FailTransport(String),
}

/// One request seen by the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: Method,
    pub url: String,
    pub body: Value,
}

pub struct MockHttpCaller {
    fallback: MockBehaviour,
    routes: HashMap<String, MockBehaviour>,
    /// All calls seen by this caller (in call order).
    pub calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockHttpCaller {
    fn with_fallback(fallback: MockBehaviour) -> Self {
        Self {
            fallback,
            routes: HashMap::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every URL answers 2xx with `body`.
    pub fn responding(body: Value) -> Self {
        Self::with_fallback(MockBehaviour::Respond(body))
    }

    /// Every URL answers with `status`.
    pub fn failing_status(status: u16) -> Self {
        Self::with_fallback(MockBehaviour::FailStatus(status))
    }

    /// Every URL fails at the transport level.
    pub fn failing_transport(msg: impl Into<String>) -> Self {
        Self::with_fallback(MockBehaviour::FailTransport(msg.into()))
    }

    /// Override the behaviour for one URL.
    pub fn route(mut self, url: impl Into<String>, behaviour: MockBehaviour) -> Self {
        self.routes.insert(url.into(), behaviour);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of requests this caller has received.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpCaller for MockHttpCaller {
    async fn call(&self, method: &Method, url: &str, body: &Value) -> Result<Value, NodeError> {
        self.calls.lock().unwrap().push(RecordedCall {
            method: method.clone(),
            url: url.to_owned(),
            body: body.clone(),
        });

        match self.routes.get(url).unwrap_or(&self.fallback) {
            MockBehaviour::Respond(v) => Ok(v.clone()),
            MockBehaviour::FailStatus(code) => Err(NodeError::Status(*code)),
            MockBehaviour::FailTransport(msg) => Err(NodeError::Transport(msg.clone())),
        }
    }
}
