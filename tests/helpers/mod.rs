//! Shared fixtures for the integration tests: a scripted transport that
//! records every request, recording notifier / navigator sinks and token
//! builders.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{json, Value};

use logivite_client::storage::{ClientStorage, MemoryStorage, SESSION_TOKEN_KEY};
use logivite_client::{
    ApiClient, AuthSession, Navigator, Notifier, RequestBody, RequestDescriptor, Transport,
    TransportError,
};

// ============================================================================
// Scripted transport
// ============================================================================

/// Canned reply for one request.
#[derive(Debug, Clone)]
pub enum Reply {
    Body(Value),
    Unauthorized,
    Timeout,
    Network,
    Status(u16, Value),
}

impl Reply {
    fn into_result(self, path: &str) -> Result<Value, TransportError> {
        let path = path.to_string();
        match self {
            Reply::Body(body) => Ok(body),
            Reply::Unauthorized => Err(TransportError::Unauthorized { path }),
            Reply::Timeout => Err(TransportError::Timeout { path }),
            Reply::Network => Err(TransportError::Network {
                path,
                reason: "connection refused".into(),
            }),
            Reply::Status(status, body) => Err(TransportError::Status { path, status, body }),
        }
    }
}

/// What the transport saw.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: String,
    pub method: reqwest::Method,
    pub body: RequestBody,
    pub bearer: Option<String>,
}

impl Recorded {
    pub fn form_field(&self, name: &str) -> Option<&str> {
        match &self.body {
            RequestBody::Form(fields) => fields
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }
}

/// Replies are queued per path prefix; the last queued reply repeats.
/// Unscripted paths answer 404.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    requests: Mutex<Vec<Recorded>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, path: &str, reply: Reply) -> Self {
        self.push(path, reply);
        self
    }

    pub fn push(&self, path: &str, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(reply);
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.path.starts_with(path))
            .collect()
    }

    fn next_reply(&self, path: &str) -> Reply {
        let mut replies = self.replies.lock().unwrap();
        let key = replies
            .keys()
            .filter(|k| path.starts_with(k.as_str()))
            .max_by_key(|k| k.len())
            .cloned();
        let Some(queue) = key.and_then(|k| replies.get_mut(&k)) else {
            return Reply::Status(404, json!({}));
        };
        if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue.front().cloned().unwrap_or(Reply::Status(404, json!({})))
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: RequestDescriptor) -> Result<Value, TransportError> {
        self.requests.lock().unwrap().push(Recorded {
            path: request.path.clone(),
            method: request.method.clone(),
            body: request.body.clone(),
            bearer: request.bearer.clone(),
        });
        self.next_reply(&request.path).into_result(&request.path)
    }
}

// ============================================================================
// Envelopes
// ============================================================================

pub fn ok(data: Value) -> Reply {
    Reply::Body(json!({ "success": true, "message": "", "data": data, "status": 200 }))
}

pub fn ok_with_message(data: Value, message: &str) -> Reply {
    Reply::Body(json!({ "success": true, "message": message, "data": data, "status": 200 }))
}

pub fn declined(status: u16, message: &str) -> Reply {
    Reply::Body(json!({
        "success": false,
        "message": "",
        "data": null,
        "status": status,
        "errorDetail": [{ "errorMessage": message }]
    }))
}

// ============================================================================
// Sinks
// ============================================================================

#[derive(Default)]
pub struct RecordingNotifier {
    successes: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
    warnings: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn successes(&self) -> Vec<String> {
        self.successes.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str) {
        self.successes.lock().unwrap().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }

    fn warning(&self, message: &str) {
        self.warnings.lock().unwrap().push(message.to_string());
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn routes(&self) -> Vec<String> {
        self.routes.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.routes.lock().unwrap().last().cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: &str) {
        self.routes.lock().unwrap().push(route.to_string());
    }
}

// ============================================================================
// Sessions
// ============================================================================

/// Unsigned JWT carrying `claims`.
pub fn fake_jwt(claims: Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.sig")
}

pub fn user_token(user_id: &str) -> String {
    fake_jwt(json!({ "userId": user_id, "exp": 4_102_444_800_i64 }))
}

/// Storage holding a logged-in user's token.
pub fn logged_in_storage(user_id: &str) -> Arc<MemoryStorage> {
    let storage = MemoryStorage::shared();
    storage
        .set(SESSION_TOKEN_KEY, &user_token(user_id))
        .unwrap();
    storage
}

pub struct Harness {
    pub api: ApiClient<ScriptedTransport>,
    pub session: AuthSession,
    pub storage: Arc<MemoryStorage>,
    pub notifier: Arc<RecordingNotifier>,
    pub navigator: Arc<RecordingNavigator>,
}

impl Harness {
    pub fn new(transport: ScriptedTransport) -> Self {
        let storage = logged_in_storage("42");
        let notifier = Arc::new(RecordingNotifier::default());
        let navigator = Arc::new(RecordingNavigator::default());
        let session = AuthSession::load(storage.clone()).unwrap();
        let api = ApiClient::new(transport, notifier.clone(), navigator.clone());
        Self {
            api,
            session,
            storage,
            notifier,
            navigator,
        }
    }

    pub fn transport(&self) -> &ScriptedTransport {
        self.api.transport()
    }
}
