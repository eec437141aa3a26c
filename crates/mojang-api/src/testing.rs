//! In-memory upstream for tests

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::NetworkError;
use crate::fetcher::{Upstream, UpstreamResponse};

enum Canned {
    Response(u16, Option<Value>),
    Failure,
}

/// Serves canned responses by exact URL and records every request.
/// Unknown URLs answer 404.
#[derive(Default)]
pub(crate) struct StubUpstream {
    responses: HashMap<String, Canned>,
    requests: Mutex<Vec<String>>,
}

impl StubUpstream {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_json(mut self, url: &str, body: Value) -> Self {
        self.responses
            .insert(url.to_string(), Canned::Response(200, Some(body)));
        self
    }

    pub(crate) fn with_status(mut self, url: &str, status: u16) -> Self {
        self.responses
            .insert(url.to_string(), Canned::Response(status, None));
        self
    }

    pub(crate) fn with_failure(mut self, url: &str) -> Self {
        self.responses.insert(url.to_string(), Canned::Failure);
        self
    }

    pub(crate) fn calls(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.as_str() == url)
            .count()
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

/// A transport-class failure, the kind a refused connection or timeout
/// produces. Built from an unroutable request so no socket is opened.
pub(crate) fn transport_error() -> NetworkError {
    let err = reqwest::Client::new()
        .get("http://")
        .build()
        .expect_err("empty host must not build");
    NetworkError::from(err)
}

#[async_trait]
impl Upstream for StubUpstream {
    async fn get_json(&self, url: &str) -> Result<UpstreamResponse, NetworkError> {
        self.requests.lock().unwrap().push(url.to_string());

        match self.responses.get(url) {
            Some(Canned::Response(status, body)) => Ok(UpstreamResponse {
                status: *status,
                body: body.clone(),
            }),
            Some(Canned::Failure) => Err(transport_error()),
            None => Ok(UpstreamResponse {
                status: 404,
                body: None,
            }),
        }
    }
}
