//! Authentication use case
//!
//! Owns the session [`AuthState`] and drives the OAuth2 authorization-code
//! flow through a loopback redirect. Token storage, refresh and the code
//! exchange itself are delegated to the command bridge; the browser is
//! opened through the desktop shell port.

use std::sync::Arc;

use anyhow::{Context, Result};
use futures_util::FutureExt;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::{
    config::AuthConfig,
    domain::{AuthState, ViewTab},
    events::{BusEvent, EventBus, Topic},
    ports::{ICommandBridge, IDesktopShell},
};

use super::single_flight::SingleFlight;

/// How an interactive login attempt ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Tokens were exchanged and saved
    Authenticated,
    /// The redirect carried no authorization code (user denied or closed)
    Abandoned,
    /// No redirect arrived before the login timeout
    TimedOut,
    /// A bridge or shell call failed; the message is for logs only
    Failed(String),
}

struct Inner {
    bridge: Arc<dyn ICommandBridge>,
    shell: Arc<dyn IDesktopShell>,
    bus: Arc<EventBus>,
    config: AuthConfig,
    state: watch::Sender<AuthState>,
    check: SingleFlight<AuthState>,
}

/// Use case for the authentication lifecycle
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct AuthController {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for AuthController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthController")
            .field("state", &self.state())
            .field("check", &self.inner.check)
            .finish()
    }
}

impl AuthController {
    /// Creates a controller in the `Checking` state
    ///
    /// The host is expected to call [`check_auth`](Self::check_auth) at
    /// startup to resolve it.
    ///
    /// # Arguments
    ///
    /// * `bridge` - Backend command surface
    /// * `shell` - Browser access for the consent page
    /// * `bus` - Event bus carrying the OAuth redirect and window signals
    /// * `config` - OAuth client and endpoint settings
    pub fn new(
        bridge: Arc<dyn ICommandBridge>,
        shell: Arc<dyn IDesktopShell>,
        bus: Arc<EventBus>,
        config: AuthConfig,
    ) -> Self {
        let (state, _) = watch::channel(AuthState::Checking);
        Self {
            inner: Arc::new(Inner {
                bridge,
                shell,
                bus,
                config,
                state,
                check: SingleFlight::new(),
            }),
        }
    }

    /// Current state
    pub fn state(&self) -> AuthState {
        *self.inner.state.borrow()
    }

    /// Receiver that observes every state change
    pub fn watch(&self) -> watch::Receiver<AuthState> {
        self.inner.state.subscribe()
    }

    /// The tab actually shown when `requested` is selected in the current state
    pub fn resolve_tab(&self, requested: ViewTab) -> ViewTab {
        ViewTab::resolve(requested, self.state())
    }

    /// Determines whether a usable session exists
    ///
    /// Concurrent callers share one pending check. Failures are expected on
    /// first run and are only logged at debug level.
    ///
    /// Returns the state once the check settled. A login or logout that
    /// completes while the check is in flight wins over its result.
    pub async fn check_auth(&self) -> AuthState {
        if self.state().is_authenticated() {
            return AuthState::Authenticated;
        }
        let inner = Arc::clone(&self.inner);
        self.inner
            .check
            .run(move || async move { inner.run_check().await }.boxed())
            .await
    }

    /// Runs the interactive browser login
    ///
    /// This method:
    /// 1. Hides the window and starts the loopback listener
    /// 2. Subscribes to the redirect before opening the consent page
    /// 3. Waits for a single redirect or the login timeout
    /// 4. Exchanges the code, saves the tokens and shows the window again
    ///
    /// Failures never change the state.
    pub async fn login(&self) -> LoginOutcome {
        let inner = &self.inner;
        info!("Login started");
        inner.bus.publish(BusEvent::Close);

        let port = match inner
            .bridge
            .start_oauth_server()
            .await
            .context("Failed to start OAuth callback listener")
        {
            Ok(port) => port,
            Err(e) => return login_failed(e),
        };
        let redirect_uri = redirect_uri(&inner.config, port);

        let callback = inner.bus.once(Topic::OAuthCallback);

        let auth_url = match build_authorization_url(&inner.config, &redirect_uri) {
            Ok(url) => url,
            Err(e) => return login_failed(e),
        };
        if let Err(e) = inner
            .shell
            .open_url(auth_url.as_str())
            .await
            .context("Failed to open browser")
        {
            return login_failed(e);
        }
        info!(port, "Waiting for OAuth redirect");

        let Some(event) = callback.wait(inner.config.login_timeout()).await else {
            warn!(
                timeout_secs = inner.config.login_timeout_secs,
                "Login timed out waiting for redirect"
            );
            return LoginOutcome::TimedOut;
        };
        let BusEvent::OAuthCallback { url } = event else {
            return LoginOutcome::Abandoned;
        };
        let Some(code) = extract_authorization_code(&url) else {
            info!("Redirect carried no authorization code, login abandoned");
            return LoginOutcome::Abandoned;
        };

        match inner.complete_login(&code, &redirect_uri).await {
            Ok(()) => {
                info!("Login completed");
                LoginOutcome::Authenticated
            }
            Err(e) => login_failed(e),
        }
    }

    /// Deletes the stored token and returns to `Unauthenticated`
    ///
    /// A bridge failure is logged; the local state is reset regardless.
    pub async fn logout(&self) {
        if let Err(e) = self.inner.bridge.logout().await {
            error!(error = %format!("{e:#}"), "Logout failed");
        }
        self.inner.set_state(AuthState::Unauthenticated);
        info!("Logged out");
    }
}

impl Inner {
    async fn run_check(&self) -> AuthState {
        self.set_state(AuthState::Checking);

        let next = match self.fetch_tokens().await {
            Ok(()) => AuthState::Authenticated,
            Err(e) => {
                debug!(error = %format!("{e:#}"), "Auth check failed");
                AuthState::Unauthenticated
            }
        };
        self.settle_check(next);
        *self.state.borrow()
    }

    /// Applies a check result only while the state is still `Checking`
    fn settle_check(&self, next: AuthState) {
        self.state.send_if_modified(|current| {
            if !current.is_checking() {
                debug!(state = %current, result = %next, "Discarding stale auth check result");
                return false;
            }
            *current = next;
            true
        });
    }

    async fn fetch_tokens(&self) -> Result<()> {
        let credentials = self
            .config
            .credentials()
            .context("OAuth client credentials are not configured")?;
        self.bridge
            .set_credentials(&credentials)
            .await
            .context("Failed to register client credentials")?;
        self.bridge
            .get_tokens()
            .await
            .context("No usable token")?;
        Ok(())
    }

    async fn complete_login(&self, code: &str, redirect_uri: &str) -> Result<()> {
        let tokens = self
            .bridge
            .exchange_auth_code(code, redirect_uri)
            .await
            .context("Failed to exchange authorization code")?;
        self.bridge
            .save_tokens(&tokens)
            .await
            .context("Failed to save tokens")?;
        self.set_state(AuthState::Authenticated);
        self.bus.publish(BusEvent::Open);
        Ok(())
    }

    fn set_state(&self, next: AuthState) {
        self.state.send_if_modified(|current| match current.transition(next) {
            Ok(state) => {
                let changed = *current != state;
                *current = state;
                changed
            }
            Err(e) => {
                warn!(error = %e, "Ignoring auth state change");
                false
            }
        });
    }
}

fn login_failed(e: anyhow::Error) -> LoginOutcome {
    let message = format!("{e:#}");
    error!(error = %message, "Login failed");
    LoginOutcome::Failed(message)
}

fn redirect_uri(config: &AuthConfig, port: u16) -> String {
    format!("{}:{}", config.redirect_host.trim_end_matches('/'), port)
}

/// Builds the consent page URL for the authorization-code flow
///
/// # Errors
///
/// Returns an error if no client id is configured or the endpoint is not a URL.
pub fn build_authorization_url(config: &AuthConfig, redirect_uri: &str) -> Result<Url> {
    let client_id = config
        .client_id
        .as_deref()
        .context("OAuth client id is not configured")?;
    Url::parse_with_params(
        &config.authorize_url,
        &[
            ("client_id", client_id),
            ("redirect_uri", redirect_uri),
            ("response_type", "code"),
            ("scope", config.scope.as_str()),
            ("access_type", "offline"),
        ],
    )
    .with_context(|| format!("Invalid authorization endpoint: {}", config.authorize_url))
}

/// Returns the non-empty `code` query parameter of a redirect URL
pub fn extract_authorization_code(redirect: &str) -> Option<String> {
    let url = Url::parse(redirect).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "code")
        .map(|(_, value)| value.into_owned())
        .filter(|code| !code.is_empty())
}
