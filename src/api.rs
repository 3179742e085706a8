//! API request wrapper
//!
//! The single point where transport failures and backend-declared failures
//! are reconciled into one [`ApiOutcome`] shape. The backend wraps every
//! payload in an envelope:
//!
//! ```json
//! { "success": false, "message": "...", "data": null,
//!   "status": 400, "errorDetail": [{ "errorMessage": "Branch is inactive" }] }
//! ```

use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ClientError, ErrorKind, FALLBACK_MESSAGE, NETWORK_MESSAGE, TIMEOUT_MESSAGE};
use crate::session::AuthSession;
use crate::transport::{RequestDescriptor, Transport, TransportError};

/// Toast sink.
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
    fn warning(&self, message: &str);
}

/// Route sink.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

/// Notifier for headless hosts: every toast becomes a log line.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, message: &str) {
        tracing::info!(message, "notification");
    }

    fn error(&self, message: &str) {
        tracing::error!(message, "notification");
    }

    fn warning(&self, message: &str) {
        tracing::warn!(message, "notification");
    }
}

/// A request plus how its outcome should be surfaced.
#[derive(Debug)]
pub struct ApiRequest {
    pub descriptor: RequestDescriptor,
    /// Show success / transport-failure toasts. Backend-declared failures are
    /// always shown.
    pub notify: bool,
}

impl ApiRequest {
    pub fn new(descriptor: RequestDescriptor) -> Self {
        Self {
            descriptor,
            notify: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(RequestDescriptor::get(path))
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(RequestDescriptor::post(path))
    }

    pub fn method(method: Method, path: impl Into<String>) -> Self {
        Self::new(RequestDescriptor::new(method, path))
    }

    pub fn json(mut self, body: Value) -> Self {
        self.descriptor = self.descriptor.json(body);
        self
    }

    pub fn form<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.descriptor = self.descriptor.form(fields);
        self
    }

    /// Authenticate with this token instead of the session's bearer.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.descriptor = self.descriptor.bearer(token);
        self
    }

    pub fn quiet(mut self) -> Self {
        self.notify = false;
        self
    }
}

/// Uniform result of one API call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiOutcome<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub error: Option<ErrorKind>,
    pub status: Option<u16>,
    /// The failure was already shown to the user by the wrapper.
    pub notified: bool,
}

impl<T> ApiOutcome<T> {
    fn ok(data: T, message: Option<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message,
            error: None,
            status: None,
            notified: false,
        }
    }

    fn failed(kind: ErrorKind, message: impl Into<String>, status: Option<u16>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
            error: Some(kind),
            status,
            notified: false,
        }
    }

    fn shown(mut self, notified: bool) -> Self {
        self.notified = notified;
        self
    }

    pub fn is_unauthorized(&self) -> bool {
        self.error == Some(ErrorKind::Unauthorized)
    }

    pub fn into_result(self) -> Result<T, ClientError> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            _ => Err(ClientError::from_outcome(
                self.error.unwrap_or(ErrorKind::Api),
                self.status,
                self.message,
            )),
        }
    }
}

/// First `errorDetail[].errorMessage` of a backend body, if the body has one.
pub fn first_error_message(body: &Value) -> Option<String> {
    body.get("errorDetail")?
        .as_array()?
        .first()?
        .get("errorMessage")?
        .as_str()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

fn envelope_status(body: &Value) -> Option<u16> {
    body.get("status")
        .and_then(Value::as_u64)
        .and_then(|s| u16::try_from(s).ok())
}

pub struct ApiClient<T> {
    transport: T,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    login_route: String,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T, notifier: Arc<dyn Notifier>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            transport,
            notifier,
            navigator,
            login_route: "/login".to_string(),
        }
    }

    pub fn with_login_route(mut self, route: impl Into<String>) -> Self {
        self.login_route = route.into();
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    /// Send `request` authenticated with `session` and normalize the result.
    ///
    /// A 401 (HTTP or envelope) clears the session before returning.
    pub async fn request<R: DeserializeOwned>(
        &self,
        session: &mut AuthSession,
        request: ApiRequest,
    ) -> ApiOutcome<R> {
        let ApiRequest {
            mut descriptor,
            notify,
        } = request;
        if descriptor.bearer.is_none() {
            descriptor.bearer = session.bearer().map(str::to_string);
        }
        let path = descriptor.path.clone();

        match self.transport.send(descriptor).await {
            Ok(body) => self.normalize(session, &path, body, notify),
            Err(TransportError::Unauthorized { .. }) => self.expire_session(session, &path, None),
            Err(TransportError::Timeout { .. }) => {
                self.transport_failure(ErrorKind::Timeout, TIMEOUT_MESSAGE, notify)
            }
            Err(TransportError::Network { .. }) => {
                self.transport_failure(ErrorKind::Network, NETWORK_MESSAGE, notify)
            }
            Err(TransportError::Status { status, body, .. }) => {
                let message = first_error_message(&body).unwrap_or_else(|| FALLBACK_MESSAGE.to_string());
                if notify {
                    self.notifier.error(&message);
                }
                ApiOutcome::failed(ErrorKind::Api, message, Some(status)).shown(notify)
            }
            Err(err @ (TransportError::Malformed { .. } | TransportError::Setup(_))) => {
                tracing::error!(path = %path, error = %err, "request failed");
                if notify {
                    self.notifier.error(FALLBACK_MESSAGE);
                }
                ApiOutcome::failed(ErrorKind::Api, FALLBACK_MESSAGE, None).shown(notify)
            }
        }
    }

    fn normalize<R: DeserializeOwned>(
        &self,
        session: &mut AuthSession,
        path: &str,
        body: Value,
        notify: bool,
    ) -> ApiOutcome<R> {
        let success = body.get("success").and_then(Value::as_bool).unwrap_or(false);
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .map(str::to_string);

        if !success {
            let status = envelope_status(&body);
            let detail = first_error_message(&body);
            if status == Some(401) {
                return self.expire_session(session, path, detail);
            }
            let message = detail.unwrap_or_else(|| FALLBACK_MESSAGE.to_string());
            tracing::debug!(path, message = %message, "backend declared failure");
            self.notifier.error(&message);
            return ApiOutcome::failed(ErrorKind::Api, message, status).shown(true);
        }

        let data = body.get("data").cloned().unwrap_or(Value::Null);
        match serde_json::from_value::<R>(data) {
            Ok(data) => {
                if notify {
                    if let Some(message) = &message {
                        self.notifier.success(message);
                    }
                }
                ApiOutcome::ok(data, message)
            }
            Err(e) => {
                tracing::error!(path, error = %e, "response data did not match the expected shape");
                if notify {
                    self.notifier.error(FALLBACK_MESSAGE);
                }
                ApiOutcome::failed(ErrorKind::Api, FALLBACK_MESSAGE, None).shown(notify)
            }
        }
    }

    fn transport_failure<R>(&self, kind: ErrorKind, message: &str, notify: bool) -> ApiOutcome<R> {
        if notify {
            self.notifier.error(message);
        }
        ApiOutcome::failed(kind, message, None).shown(notify)
    }

    fn expire_session<R>(
        &self,
        session: &mut AuthSession,
        path: &str,
        detail: Option<String>,
    ) -> ApiOutcome<R> {
        tracing::warn!(path, "session rejected, clearing local session data");
        if let Err(e) = session.clear() {
            tracing::error!(error = %e, "failed to clear persisted session data");
        }
        if let Some(detail) = &detail {
            self.notifier.error(detail);
        }
        self.navigator.navigate(&self.login_route);
        ApiOutcome::failed(
            ErrorKind::Unauthorized,
            detail.unwrap_or_else(|| crate::error::SESSION_EXPIRED_MESSAGE.to_string()),
            Some(401),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_error_message_tolerates_malformed_bodies() {
        assert_eq!(
            first_error_message(&json!({ "errorDetail": [{ "errorMessage": "Bad branch" }] })),
            Some("Bad branch".to_string())
        );
        assert_eq!(first_error_message(&json!({ "errorDetail": [] })), None);
        assert_eq!(first_error_message(&json!({ "errorDetail": "oops" })), None);
        assert_eq!(first_error_message(&json!({ "errorDetail": [{}] })), None);
        assert_eq!(first_error_message(&json!("plain text")), None);
        assert_eq!(first_error_message(&Value::Null), None);
    }

    #[test]
    fn test_outcome_into_result() {
        let ok: ApiOutcome<u32> = ApiOutcome::ok(5, None);
        assert_eq!(ok.into_result().unwrap(), 5);

        let failed: ApiOutcome<u32> = ApiOutcome::failed(ErrorKind::Timeout, TIMEOUT_MESSAGE, None);
        let err = failed.into_result().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert_eq!(err.to_string(), TIMEOUT_MESSAGE);
    }

    #[test]
    fn test_envelope_status_ignores_non_numbers() {
        assert_eq!(envelope_status(&json!({ "status": 401 })), Some(401));
        assert_eq!(envelope_status(&json!({ "status": "401" })), None);
    }
}
