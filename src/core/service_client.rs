// src/core/service_client.rs
//! Typed HTTP client for the DevConnect REST API.
//!
//! Holds the process-wide bearer credential: every request goes out with it
//! when one is set. Only the session manager writes the credential.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Arc, RwLock};
use tracing::{debug, error};

use super::config_manager::ClientConfig;
use super::transport::{ApiRequest, ApiResponse, FormField, HttpTransport, RequestBody, ReqwestTransport};
use crate::error::ApiError;
use crate::utils::{read_lock, write_lock};

#[derive(Clone)]
pub struct ServiceClient {
    transport: Arc<dyn HttpTransport>,
    credential: Arc<RwLock<Option<String>>>,
}

impl ServiceClient {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            credential: Arc::new(RwLock::new(None)),
        }
    }

    /// Client backed by reqwest, pointed at `config.api_url`.
    pub fn from_config(config: &ClientConfig) -> anyhow::Result<Self> {
        let transport = ReqwestTransport::new(&config.api_url, config.timeout_seconds)?;
        Ok(Self::new(Arc::new(transport)))
    }

    pub fn credential(&self) -> Option<String> {
        read_lock(&self.credential).clone()
    }

    pub(crate) fn set_credential(&self, token: String) {
        *write_lock(&self.credential) = Some(token);
    }

    pub(crate) fn clear_credential(&self) {
        *write_lock(&self.credential) = None;
    }

    /// Send a request with the current credential attached; non-2xx becomes `ApiError::Status`.
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let request = request.with_bearer(self.credential());
        let path = request.path.clone();

        debug!("Calling DevConnect API: {:?} {}", request.method, path);

        let response = self.transport.send(request).await.map_err(|e| {
            error!("Request to {} failed: {}", path, e);
            e
        })?;

        if response.is_success() {
            Ok(response)
        } else {
            error!("API error response from {}: {} {}", path, response.status, response.body);
            Err(ApiError::Status {
                status: response.status,
                body: response.body,
            })
        }
    }

    /// Generic GET request
    pub async fn get<R>(&self, endpoint: &str) -> Result<R, ApiError>
    where
        R: DeserializeOwned,
    {
        self.get_with_query(endpoint, Vec::new()).await
    }

    pub async fn get_with_query<R>(
        &self,
        endpoint: &str,
        query: Vec<(String, String)>,
    ) -> Result<R, ApiError>
    where
        R: DeserializeOwned,
    {
        let response = self
            .execute(ApiRequest::get(endpoint).with_query(query))
            .await?;
        Self::decode(endpoint, &response)
    }

    /// Generic POST request with JSON
    pub async fn post_json<T, R>(&self, endpoint: &str, payload: &T) -> Result<R, ApiError>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        let response = self
            .execute(ApiRequest::post(endpoint, Self::json_body(payload)?))
            .await?;
        Self::decode(endpoint, &response)
    }

    /// POST with JSON where only the status matters.
    pub async fn post_json_discard<T>(&self, endpoint: &str, payload: &T) -> Result<(), ApiError>
    where
        T: Serialize,
    {
        self.execute(ApiRequest::post(endpoint, Self::json_body(payload)?))
            .await
            .map(|_| ())
    }

    /// POST without a body where only the status matters.
    pub async fn post_empty(&self, endpoint: &str) -> Result<(), ApiError> {
        self.execute(ApiRequest::post(endpoint, RequestBody::Empty))
            .await
            .map(|_| ())
    }

    pub async fn post_multipart(&self, endpoint: &str, fields: Vec<FormField>) -> Result<(), ApiError> {
        self.execute(ApiRequest::post(endpoint, RequestBody::Multipart(fields)))
            .await
            .map(|_| ())
    }

    fn json_body<T: Serialize>(payload: &T) -> Result<RequestBody, ApiError> {
        serde_json::to_value(payload)
            .map(RequestBody::Json)
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to serialize payload: {}", e)))
    }

    fn decode<R: DeserializeOwned>(endpoint: &str, response: &ApiResponse) -> Result<R, ApiError> {
        serde_json::from_str(&response.body).map_err(|e| {
            error!("Failed to parse response from {}: {}. Raw response: {}", endpoint, e, response.body);
            ApiError::Decode {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mock_transport::MockTransport;
    use crate::core::transport::Method;
    use serde_json::json;

    fn client() -> (Arc<MockTransport>, ServiceClient) {
        let mock = Arc::new(MockTransport::new());
        let client = ServiceClient::new(mock.clone());
        (mock, client)
    }

    #[tokio::test]
    async fn test_credential_is_attached_once_set() {
        let (mock, client) = client();
        mock.respond_json(Method::Get, "/programming-languages", 200, json!({"data": []}));

        let _: serde_json::Value = client.get("/programming-languages").await.unwrap();
        assert_eq!(mock.last_request().unwrap().bearer, None);

        client.set_credential("tok-1".into());
        let _: serde_json::Value = client.get("/programming-languages").await.unwrap();
        assert_eq!(mock.last_request().unwrap().bearer.as_deref(), Some("tok-1"));

        client.clear_credential();
        assert_eq!(client.credential(), None);
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let (mock, client) = client();
        mock.respond_json(Method::Get, "/users/me", 401, json!({"message": "expired"}));

        let err = client.get::<serde_json::Value>("/users/me").await.unwrap_err();
        assert_eq!(err.status(), Some(401));
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let (mock, client) = client();
        mock.respond(Method::Get, "/jobs/1", Ok(ApiResponse::new(200, "<html>")));

        let err = client.get::<serde_json::Value>("/jobs/1").await.unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_post_json_sends_payload() {
        let (mock, client) = client();
        mock.respond_json(Method::Post, "/jobs", 201, json!({"data": {"id": 5}}));

        client
            .post_json_discard("/jobs", &json!({"title": "Rust dev"}))
            .await
            .unwrap();

        let sent = mock.last_request().unwrap();
        assert_eq!(sent.body, RequestBody::Json(json!({"title": "Rust dev"})));
    }
}
