//! # HTTP Transport
//!
//! The seam between the client core and the campus REST API. Controllers
//! only see [`ApiTransport`]; [`HttpTransport`] is the reqwest-backed
//! production implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, header};
use serde_json::Value;
use shared::config::ClientConfig;
use shared::models::Session;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};
use url::Url;

use crate::error::{ApiError, ApiResult};

/// JSON transport used by every controller.
///
/// Implementations must honour `cancel` cooperatively: once it fires they
/// should stop waiting on the network and return [`ApiError::Cancelled`].
/// Correctness never depends on it; controllers discard stale results
/// regardless.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// `GET path?query`, returning the parsed JSON body (`Null` when empty).
    async fn get(
        &self,
        path: &str,
        query: &[(String, String)],
        cancel: &CancellationToken,
    ) -> ApiResult<Value>;

    /// `POST`/`PUT`/`PATCH`/`DELETE` with an optional JSON body, returning the
    /// parsed response body if there is one.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        cancel: &CancellationToken,
    ) -> ApiResult<Option<Value>>;
}

/// reqwest-backed [`ApiTransport`].
#[derive(Clone, Debug)]
pub struct HttpTransport {
    base_url: Url,
    client: Client,
    token: Option<String>,
}

impl HttpTransport {
    /// Build a transport for the configured API, authenticating as `session`.
    ///
    /// # Errors
    /// Returns [`ApiError::Transport`] if the base URL is invalid or the HTTP
    /// client cannot be constructed.
    pub fn new(config: &ClientConfig, session: &Session) -> ApiResult<Self> {
        let base_url = config
            .base_url()
            .map_err(|err| ApiError::transport(format!("invalid api_base_url: {err}")))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|err| ApiError::transport(err.to_string()))?;

        Ok(Self {
            base_url,
            client,
            token: session.token.clone(),
        })
    }

    fn api_url(&self, path: &str) -> ApiResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|err| ApiError::transport(format!("invalid path '{path}': {err}")))
    }

    fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(header::ACCEPT, "application/json");
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn execute(
        &self,
        request: RequestBuilder,
        cancel: &CancellationToken,
    ) -> ApiResult<Option<Value>> {
        let request = self.apply_auth(request);

        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ApiError::Cancelled),
            result = request.send() => result.map_err(from_reqwest)?,
        };

        let status = response.status();
        let bytes = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ApiError::Cancelled),
            result = response.bytes() => result.map_err(from_reqwest)?,
        };
        debug!(status = status.as_u16(), bytes = bytes.len(), "response received");

        let body = if bytes.iter().all(u8::is_ascii_whitespace) {
            None
        } else {
            match serde_json::from_slice::<Value>(&bytes) {
                Ok(value) => Some(value),
                Err(err) if status.is_success() => return Err(ApiError::decode(err.to_string())),
                Err(_) => None,
            }
        };

        if status.is_success() {
            Ok(body)
        } else {
            Err(ApiError::from_response(status.as_u16(), body.as_ref()))
        }
    }
}

#[async_trait]
impl ApiTransport for HttpTransport {
    #[instrument(name = "transport.get", skip(self, query, cancel))]
    async fn get(
        &self,
        path: &str,
        query: &[(String, String)],
        cancel: &CancellationToken,
    ) -> ApiResult<Value> {
        let url = self.api_url(path)?;
        let request = self.client.get(url).query(query);
        Ok(self.execute(request, cancel).await?.unwrap_or(Value::Null))
    }

    #[instrument(name = "transport.send", skip(self, body, cancel))]
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        cancel: &CancellationToken,
    ) -> ApiResult<Option<Value>> {
        let url = self.api_url(path)?;
        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        self.execute(request, cancel).await
    }
}

fn from_reqwest(err: reqwest::Error) -> ApiError {
    if err.is_decode() {
        ApiError::decode(err.to_string())
    } else {
        ApiError::transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{CurrentUser, Role};

    fn session() -> Session {
        Session::new(
            CurrentUser {
                id: 1,
                name: "Admin".into(),
                role: Role::Admin,
            },
            Some("secret".into()),
        )
    }

    #[test]
    fn joins_paths_under_the_api_prefix() {
        let transport = HttpTransport::new(&ClientConfig::with_defaults(), &session()).unwrap();

        assert_eq!(
            transport.api_url("/messages/received").unwrap().as_str(),
            "http://localhost:8000/api/messages/received"
        );
        assert_eq!(
            transport.api_url("students/7").unwrap().as_str(),
            "http://localhost:8000/api/students/7"
        );
    }

    #[test]
    fn rejects_invalid_base_url() {
        let config = ClientConfig {
            api_base_url: "not a url".into(),
            ..ClientConfig::with_defaults()
        };
        let err = HttpTransport::new(&config, &session()).unwrap_err();
        assert!(matches!(err, ApiError::Transport { .. }));
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits_before_sending() {
        let config = ClientConfig {
            api_base_url: "http://127.0.0.1:9/api".into(),
            ..ClientConfig::with_defaults()
        };
        let transport = HttpTransport::new(&config, &session()).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = transport.get("students", &[], &cancel).await.unwrap_err();
        assert_eq!(err, ApiError::Cancelled);

        let err = transport
            .send(Method::DELETE, "students/1", None, &cancel)
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::Cancelled);
    }
}
