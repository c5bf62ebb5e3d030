//! Gateway to the users service.

use async_trait::async_trait;
use reqwest::Method;

use super::wire::users::{LoginBody, LoginRecord, ProfileBody, RegisterBody, UserRecord};
use super::{RequestError, ServiceClient};
use crate::domain::UserId;
use crate::models::{Credentials, ProfileUpdate, Registration, User};

/// What `POST /login` hands back.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginSession {
    pub token: Option<String>,
    pub user: User,
}

/// Whose profile an update is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileTarget {
    /// The account the bearer token belongs to (`PUT /me`).
    Me,
    User(UserId),
}

impl ProfileTarget {
    fn path(self) -> String {
        match self {
            Self::Me => "/me".to_string(),
            Self::User(id) => format!("/{id}"),
        }
    }
}

#[async_trait]
pub trait UsersApi: Send + Sync {
    async fn register(&self, registration: &Registration) -> Result<(), RequestError>;

    async fn login(&self, credentials: &Credentials) -> Result<LoginSession, RequestError>;

    /// Resolves the stored token to a user. Used as the startup probe, so a
    /// failure is never presented to the user by the gateway.
    async fn current_user(&self) -> Result<User, RequestError>;

    async fn update_profile(
        &self,
        target: ProfileTarget,
        update: &ProfileUpdate,
    ) -> Result<User, RequestError>;
}

#[derive(Clone)]
pub struct UsersClient {
    core: ServiceClient,
}

impl UsersClient {
    #[must_use]
    pub const fn new(core: ServiceClient) -> Self {
        Self { core }
    }
}

#[async_trait]
impl UsersApi for UsersClient {
    async fn register(&self, registration: &Registration) -> Result<(), RequestError> {
        let request = self
            .core
            .request(Method::POST, "/register")
            .json(&RegisterBody::from(registration));
        self.core.execute(request).await
    }

    async fn login(&self, credentials: &Credentials) -> Result<LoginSession, RequestError> {
        let request = self
            .core
            .request(Method::POST, "/login")
            .json(&LoginBody::from(credentials));
        let record: LoginRecord = self.core.fetch(request).await?;

        Ok(LoginSession {
            token: record.token.filter(|t| !t.is_empty()),
            user: record.user.into(),
        })
    }

    async fn current_user(&self) -> Result<User, RequestError> {
        let request = self.core.request(Method::GET, "/profile");
        let record: UserRecord = self.core.fetch_silently(request).await?;
        Ok(record.into())
    }

    async fn update_profile(
        &self,
        target: ProfileTarget,
        update: &ProfileUpdate,
    ) -> Result<User, RequestError> {
        let request = self
            .core
            .request(Method::PUT, &target.path())
            .json(&ProfileBody::from(update));
        let record: UserRecord = self.core.fetch(request).await?;
        Ok(record.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_target_paths() {
        assert_eq!(ProfileTarget::Me.path(), "/me");
        assert_eq!(ProfileTarget::User(UserId::new(12)).path(), "/12");
    }
}
