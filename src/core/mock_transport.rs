// src/core/mock_transport.rs
//! In-memory transport answering from scripted routes, for exercising the
//! client without a backend.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use super::transport::{ApiRequest, ApiResponse, HttpTransport, Method};
use crate::error::ApiError;
use crate::utils::lock;

type Route = (Method, String);
type Reply = Result<ApiResponse, ApiError>;

#[derive(Default)]
pub struct MockTransport {
    once: Mutex<HashMap<Route, VecDeque<Reply>>>,
    sticky: Mutex<HashMap<Route, Reply>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every request to `path` with `reply`, after queued one-shot replies.
    pub fn respond(&self, method: Method, path: &str, reply: Reply) -> &Self {
        lock(&self.sticky).insert((method, path.to_string()), reply);
        self
    }

    /// Queue a reply consumed by the next request to `path`.
    pub fn respond_once(&self, method: Method, path: &str, reply: Reply) -> &Self {
        lock(&self.once)
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
        self
    }

    pub fn respond_json(&self, method: Method, path: &str, status: u16, body: Value) -> &Self {
        self.respond(method, path, Ok(ApiResponse::json(status, &body)))
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        lock(&self.requests).clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<ApiRequest> {
        lock(&self.requests)
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }

    pub fn last_request(&self) -> Option<ApiRequest> {
        lock(&self.requests).last().cloned()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let route = (request.method, request.path.clone());
        lock(&self.requests).push(request);

        if let Some(reply) = lock(&self.once).get_mut(&route).and_then(VecDeque::pop_front) {
            return reply;
        }
        match lock(&self.sticky).get(&route) {
            Some(reply) => reply.clone(),
            None => Err(ApiError::Status {
                status: 404,
                body: format!("No route for {:?} {}", route.0, route.1),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_once_replies_take_precedence() {
        let mock = MockTransport::new();
        mock.respond_json(Method::Get, "/jobs", 200, json!({"n": "sticky"}))
            .respond_once(Method::Get, "/jobs", Ok(ApiResponse::new(500, "boom")));

        let first = mock.send(ApiRequest::get("/jobs")).await.unwrap();
        let second = mock.send(ApiRequest::get("/jobs")).await.unwrap();
        assert_eq!(first.status, 500);
        assert_eq!(second.status, 200);
        assert_eq!(mock.requests_to("/jobs").len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let mock = MockTransport::new();
        let err = mock.send(ApiRequest::get("/nowhere")).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }
}
