//! HTTP transport
//!
//! Sends one request and classifies what came back. Classification order:
//!
//! ```text
//! aborted / timed out  → Timeout
//! connection failure   → Network
//! HTTP 401             → Unauthorized
//! other non-2xx        → Status (body kept for the API wrapper)
//! ```
//!
//! Nothing here retries. Session side effects of a 401 belong to the API
//! wrapper, which owns the session handle.

use async_trait::async_trait;
use futures::future::{AbortHandle, AbortRegistration, Abortable};
use reqwest::multipart::Form;
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::ErrorKind;

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    /// Multipart form fields, the backend's default encoding.
    Form(Vec<(String, String)>),
}

/// One outgoing request.
#[derive(Debug)]
pub struct RequestDescriptor {
    pub path: String,
    pub method: Method,
    pub body: RequestBody,
    pub bearer: Option<String>,
    pub abort: Option<AbortRegistration>,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method,
            body: RequestBody::Empty,
            bearer: None,
            abort: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn form<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.body = RequestBody::Form(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// Make the request cancellable; aborting it classifies as a timeout.
    pub fn abortable(mut self) -> (Self, AbortHandle) {
        let (handle, registration) = AbortHandle::new_pair();
        self.abort = Some(registration);
        (self, handle)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request to {path} timed out or was aborted")]
    Timeout { path: String },

    #[error("network error reaching {path}: {reason}")]
    Network { path: String, reason: String },

    #[error("request to {path} was rejected as unauthorized")]
    Unauthorized { path: String },

    #[error("HTTP {status} from {path}")]
    Status {
        path: String,
        status: u16,
        body: Value,
    },

    #[error("malformed response body from {path}: {reason}")]
    Malformed { path: String, reason: String },

    #[error("failed to build request: {0}")]
    Setup(String),
}

impl TransportError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransportError::Timeout { .. } => ErrorKind::Timeout,
            TransportError::Network { .. } => ErrorKind::Network,
            TransportError::Unauthorized { .. } => ErrorKind::Unauthorized,
            TransportError::Status { .. }
            | TransportError::Malformed { .. }
            | TransportError::Setup(_) => ErrorKind::Api,
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and return the parsed JSON body of a 2xx response.
    async fn send(&self, request: RequestDescriptor) -> Result<Value, TransportError>;
}

/// Production transport over `reqwest`.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
    config: ClientConfig,
}

impl ReqwestTransport {
    pub fn new(config: ClientConfig) -> Result<Self, TransportError> {
        // Timeouts are applied per request; auth paths use a shorter window.
        let client = Client::builder()
            .build()
            .map_err(|e| TransportError::Setup(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: RequestDescriptor) -> Result<Value, TransportError> {
        let RequestDescriptor {
            path,
            method,
            body,
            bearer,
            abort,
        } = request;

        let url = self
            .config
            .url_for(&path)
            .map_err(|e| TransportError::Setup(e.to_string()))?;
        let timeout = self.config.timeout_for(&path);

        let mut builder = self.client.request(method.clone(), url).timeout(timeout);
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }
        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Form(fields) => {
                let form = fields
                    .into_iter()
                    .fold(Form::new(), |form, (k, v)| form.text(k, v));
                builder.multipart(form)
            }
        };

        tracing::debug!(%method, path = %path, timeout_ms = timeout.as_millis() as u64, "sending request");

        let exchange = async move {
            let response = builder.send().await?;
            let status = response.status();
            let text = response.text().await?;
            Ok::<_, reqwest::Error>((status, text))
        };

        let result = match abort {
            Some(registration) => match Abortable::new(exchange, registration).await {
                Ok(result) => result,
                Err(_aborted) => {
                    tracing::error!(path = %path, "request aborted");
                    return Err(TransportError::Timeout { path });
                }
            },
            None => exchange.await,
        };

        let (status, text) = result.map_err(|e| classify(&path, e))?;
        interpret(path, status, &text)
    }
}

fn classify(path: &str, err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        tracing::error!(path, "request timed out");
        return TransportError::Timeout {
            path: path.to_string(),
        };
    }
    tracing::error!(path, error = %err, "network error");
    TransportError::Network {
        path: path.to_string(),
        reason: err.to_string(),
    }
}

/// Turn a completed exchange into a body or a classified failure.
pub(crate) fn interpret(path: String, status: StatusCode, text: &str) -> Result<Value, TransportError> {
    if status == StatusCode::UNAUTHORIZED {
        tracing::warn!(path = %path, "backend answered 401");
        return Err(TransportError::Unauthorized { path });
    }

    if !status.is_success() {
        // Error bodies are best effort; a non-JSON body is kept as text.
        let body = serde_json::from_str(text).unwrap_or_else(|_| {
            if text.trim().is_empty() {
                Value::Null
            } else {
                Value::String(text.to_string())
            }
        });
        tracing::warn!(path = %path, status = status.as_u16(), "backend returned an error status");
        return Err(TransportError::Status {
            path,
            status: status.as_u16(),
            body,
        });
    }

    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text).map_err(|e| TransportError::Malformed {
        path,
        reason: e.to_string(),
    })
}
