//! Scripted in-memory transport.
//!
//! Every request is recorded and answered by a caller-supplied handler, so
//! tests can assert on exactly which nodes were contacted and with what.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;

use crate::{NodeTransport, Result};

/// HTTP method of a recorded request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A request seen by [`MockTransport`].
#[derive(Clone, Debug)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
}

impl Request {
    /// Scheme and authority, e.g. `https://node1.test`.
    pub fn origin(&self) -> &str {
        let after_scheme = self.url.find("://").map_or(0, |i| i + 3);
        match self.url[after_scheme..].find('/') {
            Some(i) => &self.url[..after_scheme + i],
            None => &self.url,
        }
    }

    /// Path without the query string, e.g. `/v1/keygen`.
    pub fn path(&self) -> &str {
        let rest = &self.url[self.origin().len()..];
        rest.split('?').next().unwrap_or(rest)
    }

    /// Raw (still encoded) value of a query parameter.
    pub fn query(&self, key: &str) -> Option<&str> {
        let (_, query) = self.url.split_once('?')?;
        query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }
}

type Handler = dyn Fn(&Request) -> Result<Value> + Send + Sync;

/// In-memory [`NodeTransport`] driven by a handler closure.
#[derive(Clone)]
pub struct MockTransport {
    handler: Arc<Handler>,
    calls: Arc<Mutex<Vec<Request>>>,
}

impl MockTransport {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&Request) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(handler),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn log(&self) -> MutexGuard<'_, Vec<Request>> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Every request so far, in arrival order.
    pub fn calls(&self) -> Vec<Request> {
        self.log().clone()
    }

    pub fn call_count(&self) -> usize {
        self.log().len()
    }

    /// Requests whose path equals `path`.
    pub fn calls_to(&self, path: &str) -> Vec<Request> {
        self.log()
            .iter()
            .filter(|r| r.path() == path)
            .cloned()
            .collect()
    }

    pub fn reset(&self) {
        self.log().clear();
    }

    fn handle(&self, request: Request) -> Result<Value> {
        self.log().push(request.clone());
        (self.handler)(&request)
    }
}

#[async_trait]
impl NodeTransport for MockTransport {
    async fn get_json(&self, url: &str) -> Result<Value> {
        self.handle(Request {
            method: Method::Get,
            url: url.to_string(),
            body: None,
        })
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<Value> {
        self.handle(Request {
            method: Method::Post,
            url: url.to_string(),
            body: Some(body.clone()),
        })
    }
}
