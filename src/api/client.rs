//! Auth-aware HTTP client
//!
//! Every request goes through [`ApiClient::build_request`], which resolves
//! the URL against the configured base, attaches the bearer token and
//! encodes the body. Every response goes through [`ApiClient::execute`],
//! which turns non-2xx statuses into [`ApiError`] and, on 401, expires the
//! session and sends the user to the login screen no matter which call
//! triggered it.

use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::multipart::Form;
use reqwest::{Method, Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use super::error::ApiError;
use super::navigation::{Navigator, LOGIN_PATH};
use crate::config::ApiConfig;
use crate::session::SessionHandle;

/// Request payload
#[derive(Debug, Default)]
pub enum RequestBody {
    /// No body
    #[default]
    Empty,
    /// JSON document; sent as `application/json` unless the caller says otherwise
    Json(Value),
    /// Multipart form; the transport chooses the content type and boundary
    Multipart(Form),
}

impl RequestBody {
    /// Serialize `body` into a JSON payload
    pub fn json<T: Serialize + ?Sized>(body: &T) -> Result<Self, ApiError> {
        Ok(RequestBody::Json(serde_json::to_value(body)?))
    }
}

/// HTTP client bound to one backend and one session
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionHandle>,
    navigator: Arc<dyn Navigator>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ApiClient {
    /// Create a client for the configured backend
    pub fn new(
        config: &ApiConfig,
        session: Arc<SessionHandle>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
            navigator,
        })
    }

    /// Backend base URL, without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Session this client authenticates as
    pub fn session(&self) -> &Arc<SessionHandle> {
        &self.session
    }

    /// Resolve `path` against the base URL. Absolute URLs pass through.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Build a request without sending it.
    ///
    /// For multipart bodies any caller-supplied `Content-Type` is dropped so
    /// the boundary the transport generates is the only one on the wire.
    pub async fn build_request(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
        mut headers: HeaderMap,
    ) -> Result<Request, ApiError> {
        if matches!(body, RequestBody::Multipart(_)) {
            headers.remove(CONTENT_TYPE);
        }

        let mut builder = self.http.request(method, self.url(path)).headers(headers);

        if let Some(token) = self.session.token().await {
            builder = builder.bearer_auth(token);
        }

        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(form) => builder.multipart(form),
        };

        Ok(builder.build()?)
    }

    /// Send a built request and inspect the response.
    pub async fn execute(&self, request: Request) -> Result<Response, ApiError> {
        let method = request.method().clone();
        let path = request.url().path().to_string();

        let response = self.http.execute(request).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.bytes().await.unwrap_or_default();
        let error = ApiError::from_response(status, &body);

        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(%method, path = %path, "Credential rejected, ending session");
            // Token first, then navigation: the login screen must not see a stale token.
            self.session.expire().await;
            self.navigator.replace(LOGIN_PATH);
        } else {
            tracing::debug!(%method, path = %path, status = status.as_u16(), "Request failed");
        }

        Err(error)
    }

    /// Build and send a request with no extra headers
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
    ) -> Result<Response, ApiError> {
        let request = self.build_request(method, path, body, HeaderMap::new()).await?;
        self.execute(request).await
    }

    /// Send a request and decode the JSON response. An empty body decodes
    /// as `null`.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
    ) -> Result<T, ApiError> {
        let response = self.send(method, path, body).await?;
        let bytes = response.bytes().await?;
        let bytes: &[u8] = if bytes.is_empty() { b"null" } else { &bytes };
        Ok(serde_json::from_slice(bytes)?)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send_json(Method::GET, path, RequestBody::Empty).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::POST, path, RequestBody::json(body)?)
            .await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::PUT, path, RequestBody::json(body)?)
            .await
    }

    /// `DELETE path`, ignoring the response body
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send(Method::DELETE, path, RequestBody::Empty).await?;
        Ok(())
    }

    /// `POST` a multipart form
    pub async fn upload<T: DeserializeOwned>(&self, path: &str, form: Form) -> Result<T, ApiError> {
        self.send_json(Method::POST, path, RequestBody::Multipart(form))
            .await
    }
}
