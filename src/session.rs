//! Auth session
//!
//! Holds the bearer tokens explicitly instead of reading cookies ambiently.
//! Every API call site receives the session it should authenticate with.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;

use crate::models::{lenient_opt_string, UserId};
use crate::storage::{
    SharedStorage, StorageError, SESSION_TOKEN_KEY, SUBSCRIPTION_TOKEN_KEY,
};

/// Claims the console reads out of the session token. The token is never
/// verified client side.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TokenClaims {
    #[serde(default, rename = "userId", alias = "UserId", deserialize_with = "lenient_opt_string")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
}

impl TokenClaims {
    /// Decode the payload segment of a JWT. Returns `None` for anything that
    /// is not a three-part token with a JSON payload.
    pub fn decode(token: &str) -> Option<Self> {
        let mut parts = token.split('.');
        let (_header, payload, _sig) = (parts.next()?, parts.next()?, parts.next()?);
        if parts.next().is_some() {
            return None;
        }
        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}

pub struct AuthSession {
    primary: Option<String>,
    subscription: Option<String>,
    storage: SharedStorage,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("primary", &self.primary.as_ref().map(|_| "<redacted>"))
            .field("subscription", &self.subscription.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl AuthSession {
    /// Restore tokens persisted by an earlier run.
    pub fn load(storage: SharedStorage) -> Result<Self, StorageError> {
        let primary = storage.get(SESSION_TOKEN_KEY)?.filter(|t| !t.is_empty());
        let subscription = storage.get(SUBSCRIPTION_TOKEN_KEY)?.filter(|t| !t.is_empty());
        Ok(Self {
            primary,
            subscription,
            storage,
        })
    }

    pub fn storage(&self) -> &SharedStorage {
        &self.storage
    }

    /// Token attached to outgoing requests: the subscription token wins over
    /// the primary session token.
    pub fn bearer(&self) -> Option<&str> {
        self.subscription.as_deref().or(self.primary.as_deref())
    }

    pub fn primary_token(&self) -> Option<&str> {
        self.primary.as_deref()
    }

    pub fn subscription_token(&self) -> Option<&str> {
        self.subscription.as_deref()
    }

    /// Replace the primary token in place (login, refresh).
    pub fn replace_primary(&mut self, token: impl Into<String>) -> Result<(), StorageError> {
        let token = token.into();
        self.storage.set(SESSION_TOKEN_KEY, &token)?;
        self.primary = Some(token);
        Ok(())
    }

    pub fn set_subscription(&mut self, token: Option<String>) -> Result<(), StorageError> {
        match &token {
            Some(t) => self.storage.set(SUBSCRIPTION_TOKEN_KEY, t)?,
            None => self.storage.remove(SUBSCRIPTION_TOKEN_KEY)?,
        }
        self.subscription = token;
        Ok(())
    }

    /// Forget both tokens and wipe every session-scoped storage entry.
    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.primary = None;
        self.subscription = None;
        self.storage.clear_session()
    }

    /// Drop the in-memory tokens without touching storage; used after the
    /// storage has already been wiped wholesale.
    pub(crate) fn forget(&mut self) {
        self.primary = None;
        self.subscription = None;
    }

    pub fn claims(&self) -> Option<TokenClaims> {
        self.primary.as_deref().and_then(TokenClaims::decode)
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.claims()?.user_id.map(UserId::from)
    }

    /// Session data may only be fetched once the token names a user.
    pub fn is_authenticated(&self) -> bool {
        self.user_id().is_some()
    }
}

#[cfg(test)]
pub(crate) fn fake_jwt(claims: serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.signature")
}
