//! Guards deciding whether a protected view may be shown.
//!
//! Decisions are pure functions of the identity state at the moment they are
//! asked for. Nothing is cached.

use thiserror::Error;

use crate::domain::Route;
use crate::models::User;
use crate::services::identity::{IdentityContext, IdentityState};

/// An operation was refused because of who is (or is not) signed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("You need to sign in first")]
    NotAuthenticated,

    #[error("Administrator access required")]
    Forbidden,
}

impl AccessError {
    /// Where a refused visitor is sent instead.
    #[must_use]
    pub const fn redirect(self) -> Route {
        match self {
            Self::NotAuthenticated => Route::Login,
            Self::Forbidden => Route::Home,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// Any signed-in user.
    Authenticated,
    /// Signed in with the `admin` role.
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Render,
    Redirect(Route),
    /// Identity is still being resolved; show a neutral loading state and
    /// ask again later.
    Suspend,
}

impl Guard {
    #[must_use]
    pub fn evaluate(self, state: &IdentityState) -> GateDecision {
        if state.is_loading {
            return GateDecision::Suspend;
        }

        match self.check(state) {
            Ok(()) => GateDecision::Render,
            Err(denied) => GateDecision::Redirect(denied.redirect()),
        }
    }

    /// Same rule as [`Self::evaluate`] for a settled state, as a `Result`.
    ///
    /// The admin guard does not tell an anonymous visitor apart from a
    /// signed-in customer: both are sent home.
    pub fn check(self, state: &IdentityState) -> Result<(), AccessError> {
        let user = state.current_user.as_ref();

        match self {
            Self::Authenticated if user.is_some() => Ok(()),
            Self::Authenticated => Err(AccessError::NotAuthenticated),
            Self::Admin if user.is_some_and(User::is_admin) => Ok(()),
            Self::Admin => Err(AccessError::Forbidden),
        }
    }
}

/// Waits for identity to settle, then evaluates `guard`.
///
/// Never returns [`GateDecision::Suspend`]. Only call this once
/// [`IdentityContext::initialize`] has been started, or it waits forever.
pub async fn evaluate_when_settled(identity: &IdentityContext, guard: Guard) -> GateDecision {
    let mut updates = identity.subscribe();
    let state = match updates.wait_for(|state| !state.is_loading).await {
        Ok(state) => state.clone(),
        Err(_) => identity.snapshot(),
    };
    guard.evaluate(&state)
}
