use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use explog_model::{AuthToken, Credentials, User};
use tracing::{debug, info, warn};

use crate::api::LogsApi;
use crate::error::ApiError;

/// Authentication context shared between the HTTP client and the views.
///
/// Cloning is cheap; all clones observe the same state. Nothing is persisted.
#[derive(Clone, Default)]
pub struct Session {
    inner: Arc<RwLock<SessionInner>>,
}

#[derive(Default)]
struct SessionInner {
    token: Option<AuthToken>,
    user: Option<User>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session that starts with a known token (e.g. from the environment).
    pub fn with_token(token: AuthToken) -> Self {
        let session = Self::new();
        session.set_token(token);
        session
    }

    pub fn token(&self) -> Option<AuthToken> {
        self.read().token.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.read().user.clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.read().token.is_some()
    }

    pub fn set_token(&self, token: AuthToken) {
        self.write().token = Some(token);
    }

    pub fn set_user(&self, user: User) {
        self.write().user = Some(user);
    }

    /// Drop token and user.
    pub fn clear(&self) {
        let mut inner = self.write();
        inner.token = None;
        inner.user = None;
    }

    /// Clear the session if `err` means the token is no longer accepted.
    pub fn observe_error(&self, err: &ApiError) {
        if err.is_unauthorized() && self.is_logged_in() {
            warn!("server rejected the session: {}", err);
            self.clear();
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Log in and load the current user into `session`.
pub async fn login(
    api: &dyn LogsApi,
    session: &Session,
    credentials: &Credentials,
) -> Result<User, ApiError> {
    let token = api.login(credentials).await?;
    session.set_token(token);

    match api.current_user().await {
        Ok(user) => {
            info!("logged in as {}", user.username);
            session.set_user(user.clone());
            Ok(user)
        }
        Err(e) => {
            session.clear();
            Err(e)
        }
    }
}

/// Log out on the server; the local session is cleared even if the call fails.
pub async fn logout(api: &dyn LogsApi, session: &Session) -> Result<(), ApiError> {
    let res = api.logout().await;
    session.clear();
    debug!("session cleared");
    res
}

/// Check whether the session's token is still valid, refreshing the cached user.
///
/// Returns `Ok(false)` for a missing or rejected token; other failures propagate.
pub async fn check(api: &dyn LogsApi, session: &Session) -> Result<bool, ApiError> {
    if !session.is_logged_in() {
        return Ok(false);
    }
    match api.current_user().await {
        Ok(user) => {
            session.set_user(user);
            Ok(true)
        }
        Err(e) if e.is_unauthorized() => {
            session.clear();
            Ok(false)
        }
        Err(e) => Err(e),
    }
}
