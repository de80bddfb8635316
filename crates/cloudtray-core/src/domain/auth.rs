//! Authentication domain types
//!
//! Defines the session state machine driven by the auth controller, plus
//! the token and credential values handed to the command bridge.

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// Current authentication state of the tray session
///
/// Exactly one value at a time. `Checking` is a transient sub-state entered
/// from process start or an explicit recheck; it always resolves to one of
/// the other two.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    /// No valid session; the login affordance is shown
    #[default]
    Unauthenticated,
    /// A silent token check is in flight
    Checking,
    /// A token is available; upload affordances are reachable
    Authenticated,
}

impl AuthState {
    /// Returns true if upload, recents and settings are reachable
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated)
    }

    /// Returns true while a silent check is running
    pub fn is_checking(&self) -> bool {
        matches!(self, AuthState::Checking)
    }

    /// Returns true if moving from `self` to `next` is a legal edge
    ///
    /// Staying in the same state is always allowed, and any state may be
    /// reset to `Unauthenticated`. The only forbidden edge is
    /// `Authenticated -> Checking`.
    pub fn can_transition_to(&self, next: AuthState) -> bool {
        if *self == next || next == AuthState::Unauthenticated {
            return true;
        }
        match (self, next) {
            (AuthState::Unauthenticated, AuthState::Checking) => true,
            (AuthState::Unauthenticated, AuthState::Authenticated) => true,
            (AuthState::Checking, AuthState::Authenticated) => true,
            _ => false,
        }
    }

    /// Validates the transition and returns the new state
    pub fn transition(self, next: AuthState) -> Result<AuthState, DomainError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(DomainError::InvalidState {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl std::fmt::Display for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AuthState::Unauthenticated => "unauthenticated",
            AuthState::Checking => "checking",
            AuthState::Authenticated => "authenticated",
        };
        write!(f, "{}", s)
    }
}

/// OAuth token bundle returned by the provider
///
/// Owned by the command bridge's persistence boundary; the core only passes
/// it from the code exchange to `save_tokens`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBundle {
    /// Bearer token for API requests
    pub access_token: String,
    /// Token for obtaining new access tokens (requires offline access)
    pub refresh_token: String,
    /// Lifetime of the access token in seconds
    pub expires_in: i64,
    /// Token type, normally "Bearer"
    pub token_type: String,
}

/// OAuth client registration submitted to the bridge before token lookups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl ClientCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}
