use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::cookie::Jar;
use reqwest::Client;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::LoginError;

// ── Login wire contract ────────────────────────────────────────────────────────

const LOGIN_PARAM_USERNAME: &str = "login_username";
const LOGIN_PARAM_PASSWORD: &str = "login_password";
const LOGIN_PARAM_LOGIN: &str = "login";
const LOGIN_PARAM_LOGIN_TYPE: &str = "login_type";
const LOGIN_VALUE_LOGIN: &str = "1";
const LOGIN_VALUE_LOGIN_TYPE: &str = "1";

/// Present in the login page body only when the login went through.
pub const LOGIN_SUCCESS_MARKER: &str = "var LOGGED = '1'";

pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(8 * 60 * 60);

// ── Credentials ────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &"<redacted>")
            .field("password", &"<redacted>")
            .finish()
    }
}

// ── Clock seam ─────────────────────────────────────────────────────────────────

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

// ── Auth state machine ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticated { since: Instant },
}

impl AuthState {
    /// A login older than `ttl` counts as gone.
    pub fn needs_login(&self, now: Instant, ttl: Duration) -> bool {
        match self {
            AuthState::Unauthenticated => true,
            AuthState::Authenticated { since } => now.saturating_duration_since(*since) >= ttl,
        }
    }
}

/// What `ensure_authenticated` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    /// Existing login still inside the validity window; no request made.
    Reused,
    /// Fresh login accepted by upstream.
    LoggedIn,
    /// Upstream answered, but without the success marker.
    Rejected,
}

impl AuthStatus {
    pub fn is_authenticated(self) -> bool {
        !matches!(self, AuthStatus::Rejected)
    }
}

// ── Session ────────────────────────────────────────────────────────────────────

struct SessionState {
    client: Client,
    auth: AuthState,
}

/// The single cookie-bearing upstream session shared by all requests.
///
/// The expiry check, the login request and the state update all happen
/// while holding one lock, so concurrent callers never trigger parallel
/// logins and never see a client whose jar is being replaced.
pub struct Session {
    credentials: Credentials,
    login_url: String,
    ttl: Duration,
    timeout: Duration,
    clock: Arc<dyn Clock>,
    state: Mutex<SessionState>,
}

impl Session {
    pub fn new(
        credentials: Credentials,
        login_url: impl Into<String>,
        ttl: Duration,
        timeout: Duration,
    ) -> Result<Self, LoginError> {
        Self::with_clock(credentials, login_url, ttl, timeout, Arc::new(SystemClock))
    }

    pub fn with_clock(
        credentials: Credentials,
        login_url: impl Into<String>,
        ttl: Duration,
        timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, LoginError> {
        let client = build_client(timeout)?;
        Ok(Self {
            credentials,
            login_url: login_url.into(),
            ttl,
            timeout,
            clock,
            state: Mutex::new(SessionState {
                client,
                auth: AuthState::Unauthenticated,
            }),
        })
    }

    /// Log in unless a login inside the validity window is already held.
    ///
    /// A rejected login is reported as `Ok(AuthStatus::Rejected)`, a login
    /// request that failed outright as `Err`. Either way the session is
    /// left unauthenticated and the next call tries again.
    pub async fn ensure_authenticated(&self) -> Result<AuthStatus, LoginError> {
        let mut state = self.state.lock().await;
        if !state.auth.needs_login(self.clock.now(), self.ttl) {
            return Ok(AuthStatus::Reused);
        }

        // Every login starts from an empty jar.
        let client = build_client(self.timeout)?;
        state.client = client.clone();
        state.auth = AuthState::Unauthenticated;

        debug!("logging in to upstream");
        match self.login(&client).await {
            Ok(true) => {
                state.auth = AuthState::Authenticated {
                    since: self.clock.now(),
                };
                info!("upstream login succeeded");
                Ok(AuthStatus::LoggedIn)
            }
            Ok(false) => {
                warn!("upstream login rejected: success marker not found");
                Ok(AuthStatus::Rejected)
            }
            Err(e) => {
                warn!("upstream login failed: {e}");
                Err(e)
            }
        }
    }

    async fn login(&self, client: &Client) -> Result<bool, LoginError> {
        let form = [
            (LOGIN_PARAM_USERNAME, self.credentials.username.as_str()),
            (LOGIN_PARAM_PASSWORD, self.credentials.password.as_str()),
            (LOGIN_PARAM_LOGIN, LOGIN_VALUE_LOGIN),
            (LOGIN_PARAM_LOGIN_TYPE, LOGIN_VALUE_LOGIN_TYPE),
        ];

        let body = client
            .post(&self.login_url)
            .form(&form)
            .send()
            .await
            .map_err(LoginError::Transport)?
            .text()
            .await
            .map_err(LoginError::Transport)?;

        Ok(body.contains(LOGIN_SUCCESS_MARKER))
    }

    /// The HTTP client carrying the current cookie jar.
    pub async fn client(&self) -> Client {
        self.state.lock().await.client.clone()
    }

    pub async fn auth_state(&self) -> AuthState {
        self.state.lock().await.auth
    }
}

fn build_client(timeout: Duration) -> Result<Client, LoginError> {
    Client::builder()
        .user_agent("Mozilla/5.0")
        .timeout(timeout)
        .cookie_provider(Arc::new(Jar::default()))
        .build()
        .map_err(LoginError::Client)
}
