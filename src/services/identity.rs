//! Who is signed in.
//!
//! [`IdentityContext`] holds the current user and the loading flag, and is
//! the only component that writes the session store. State changes are
//! published on a `watch` channel so guards can wait for identity to settle.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::clients::{ProfileTarget, RequestError, UsersApi};
use crate::domain::Route;
use crate::models::{Credentials, ProfileUpdate, Registration, User, ValidationError};
use crate::notify::Notifier;
use crate::services::access::{AccessError, Guard};
use crate::session::SessionStore;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("The users service accepted the sign-in but returned no session token")]
    MissingToken,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IdentityState {
    pub current_user: Option<User>,

    /// While set, `is_authenticated` may still change. Gated decisions must
    /// wait.
    pub is_loading: bool,
}

impl IdentityState {
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.current_user.is_some()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.current_user.as_ref().is_some_and(User::is_admin)
    }
}

impl Default for IdentityState {
    fn default() -> Self {
        Self {
            current_user: None,
            is_loading: true,
        }
    }
}

pub struct IdentityContext {
    users: Arc<dyn UsersApi>,
    session: Arc<dyn SessionStore>,
    notifier: Arc<dyn Notifier>,
    state: watch::Sender<IdentityState>,
    in_flight: AtomicUsize,
}

/// Keeps `is_loading` raised until the last overlapping operation finishes.
struct Loading<'a> {
    identity: &'a IdentityContext,
}

impl<'a> Loading<'a> {
    fn begin(identity: &'a IdentityContext) -> Self {
        identity.in_flight.fetch_add(1, Ordering::SeqCst);
        identity.state.send_if_modified(|state| {
            let changed = !state.is_loading;
            state.is_loading = true;
            changed
        });
        Self { identity }
    }
}

impl Drop for Loading<'_> {
    fn drop(&mut self) {
        if self.identity.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.identity.state.send_modify(|state| state.is_loading = false);
        }
    }
}

impl IdentityContext {
    pub fn new(
        users: Arc<dyn UsersApi>,
        session: Arc<dyn SessionStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (state, _) = watch::channel(IdentityState::default());
        Self {
            users,
            session,
            notifier,
            state,
            in_flight: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> IdentityState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<IdentityState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().current_user.clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    pub fn require_user(&self) -> Result<User, AccessError> {
        let state = self.state.borrow();
        Guard::Authenticated.check(&state)?;
        state
            .current_user
            .clone()
            .ok_or(AccessError::NotAuthenticated)
    }

    /// Anonymous callers get [`AccessError::NotAuthenticated`] here, unlike
    /// the admin gate, so services can say what is missing.
    pub fn require_admin(&self) -> Result<User, AccessError> {
        let user = self.require_user()?;
        if !user.is_admin() {
            return Err(AccessError::Forbidden);
        }
        Ok(user)
    }

    fn set_user(&self, user: Option<User>) {
        self.state.send_modify(|state| state.current_user = user);
    }

    /// Resolves a stored token to a user. A token the users service rejects
    /// is discarded without telling the user.
    pub async fn initialize(&self) {
        let _loading = Loading::begin(self);

        if !self.session.has_token() {
            debug!("No stored session");
            self.set_user(None);
            return;
        }

        match self.users.current_user().await {
            Ok(user) => {
                info!(user_id = %user.id, "Session restored");
                self.set_user(Some(user));
            }
            Err(e) => {
                warn!(error = %e, "Stored session could not be resolved, discarding it");
                self.session.clear();
                self.set_user(None);
            }
        }
    }

    /// Signs in and returns the view to show next.
    pub async fn login(&self, credentials: &Credentials) -> Result<Route, IdentityError> {
        credentials.validate()?;
        let _loading = Loading::begin(self);

        let session = self.users.login(credentials).await?;
        let Some(token) = session.token else {
            warn!(email = %credentials.email, "Login response carried no token");
            return Err(IdentityError::MissingToken);
        };

        self.session.save(&token);
        info!(user_id = %session.user.id, "Signed in");
        self.notifier
            .success(&format!("Welcome back, {}", session.user.name));
        self.set_user(Some(session.user));

        Ok(Route::Profile)
    }

    /// Creates an account. The new user still has to sign in.
    pub async fn register(&self, registration: &Registration) -> Result<Route, IdentityError> {
        registration.validate()?;
        let _loading = Loading::begin(self);

        self.users.register(registration).await?;
        info!(email = %registration.email.trim(), "Account registered");
        self.notifier
            .success("Account created. Sign in to continue.");

        Ok(Route::Login)
    }

    /// Forgets the session locally. Safe to call when nobody is signed in.
    pub fn logout(&self) -> Route {
        self.session.clear();
        self.set_user(None);
        info!("Signed out");
        self.notifier.info("You have been signed out");
        Route::Home
    }

    /// Updates the signed-in user's profile and replaces the held record
    /// with what the users service returns.
    pub async fn update_user(&self, update: &ProfileUpdate) -> Result<User, IdentityError> {
        let current = self.require_user()?;
        update.validate()?;
        let _loading = Loading::begin(self);

        let user = self
            .users
            .update_profile(ProfileTarget::User(current.id), update)
            .await?;

        info!(user_id = %user.id, "Profile updated");
        self.notifier.success("Profile updated");
        self.set_user(Some(user.clone()));

        Ok(user)
    }
}
