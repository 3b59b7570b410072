//! Observable authentication session.
//!
//! The token lives in a `watch` channel so any view can subscribe and learn
//! about sign-in and sign-out. It is persisted to a token file so a restart
//! (or another console process sharing the file) picks it up.

use crate::envelope::{decode, into_data};
use crate::request::ApiRequest;
use crate::transport::Transport;
use marketdesk_core::ConsoleError;
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;

/// Bearer token. Debug output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    SignedOut,
    SignedIn(AccessToken),
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("token storage error: {0}")]
    Storage(#[from] std::io::Error),
    #[error(transparent)]
    Rejected(#[from] ConsoleError),
}

#[derive(Debug, Deserialize)]
struct LoginPayload {
    token: String,
}

#[derive(Clone)]
pub struct AuthSession {
    state: Arc<watch::Sender<AuthState>>,
    token_path: Option<PathBuf>,
}

impl AuthSession {
    /// Session with no backing file. Used by tests and one-shot tools.
    pub fn in_memory(token: Option<String>) -> Self {
        let initial = token
            .filter(|t| !t.trim().is_empty())
            .map(|t| AuthState::SignedIn(AccessToken::new(t)))
            .unwrap_or(AuthState::SignedOut);
        let (tx, _rx) = watch::channel(initial);
        Self {
            state: Arc::new(tx),
            token_path: None,
        }
    }

    /// Session restored from `token_path`. A missing file means signed out.
    pub fn restore(token_path: impl Into<PathBuf>) -> Result<Self, AuthError> {
        let token_path = token_path.into();
        let token = read_token(&token_path)?;
        let mut session = Self::in_memory(token);
        session.token_path = Some(token_path);
        Ok(session)
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(*self.state.borrow(), AuthState::SignedIn(_))
    }

    /// Current bearer token, read at request-build time.
    pub fn token(&self) -> Option<String> {
        match &*self.state.borrow() {
            AuthState::SignedIn(token) => Some(token.expose().to_string()),
            AuthState::SignedOut => None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn sign_in(&self, token: AccessToken) -> Result<(), AuthError> {
        if let Some(path) = &self.token_path {
            write_token(path, token.expose())?;
        }
        self.state.send_replace(AuthState::SignedIn(token));
        tracing::info!("signed in");
        Ok(())
    }

    pub fn sign_out(&self) -> Result<(), AuthError> {
        if let Some(path) = &self.token_path {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }
        self.state.send_replace(AuthState::SignedOut);
        tracing::info!("signed out");
        Ok(())
    }

    /// Re-read the token file and publish a change only when it differs
    /// from the current state. Returns whether subscribers were notified.
    pub fn reload_from_storage(&self) -> Result<bool, AuthError> {
        let Some(path) = &self.token_path else {
            return Ok(false);
        };
        let next = match read_token(path)? {
            Some(token) => AuthState::SignedIn(AccessToken::new(token)),
            None => AuthState::SignedOut,
        };
        let changed = self.state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next.clone();
                true
            }
        });
        if changed {
            tracing::info!(signed_in = self.is_signed_in(), "auth state changed in storage");
        }
        Ok(changed)
    }

    /// Exchange credentials for a token via `POST /auth/login`.
    pub async fn login<T>(&self, transport: &T, email: &str, password: &str) -> Result<(), AuthError>
    where
        T: Transport + ?Sized,
    {
        let email = email.trim();
        if email.is_empty() {
            return Err(ConsoleError::validation("email", "must not be empty").into());
        }
        if password.is_empty() {
            return Err(ConsoleError::validation("password", "must not be empty").into());
        }

        let request =
            ApiRequest::post("/auth/login", json!({ "email": email, "password": password }))
                .unauthenticated();
        let response = transport.send(&request).await?;
        let payload: LoginPayload = decode(into_data(response)?, "login response")?;
        if payload.token.trim().is_empty() {
            return Err(ConsoleError::decode("login response carried an empty token").into());
        }
        self.sign_in(AccessToken::new(payload.token))
    }
}

fn read_token(path: &Path) -> Result<Option<String>, std::io::Error> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let token = contents.trim();
            Ok((!token.is_empty()).then(|| token.to_string()))
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

fn write_token(path: &Path, token: &str) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_debug_is_redacted() {
        let token = AccessToken::new("secret-value");
        assert_eq!(format!("{:?}", token), "AccessToken(***)");
    }

    #[test]
    fn blank_in_memory_token_is_signed_out() {
        assert!(!AuthSession::in_memory(Some("  ".to_string())).is_signed_in());
    }

    #[test]
    fn subscribers_observe_sign_out() {
        let session = AuthSession::in_memory(Some("abc".to_string()));
        let mut rx = session.subscribe();
        assert!(matches!(*rx.borrow_and_update(), AuthState::SignedIn(_)));
        session.sign_out().expect("no file to remove");
        assert!(rx.has_changed().expect("sender alive"));
        assert_eq!(*rx.borrow(), AuthState::SignedOut);
    }
}
