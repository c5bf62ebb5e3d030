use crate::domain::{Role, UserId};
use crate::models::{ValidationError, looks_like_email};

/// An account as the client sees it. The users service is authoritative;
/// this copy only lives in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,

    pub name: String,

    pub email: String,

    /// `None` when the backend omitted the role. Treated as non-administrator.
    pub role: Option<Role>,

    pub phone: Option<String>,

    pub address: Option<String>,

    pub city: Option<String>,

    pub zip_code: Option<String>,
}

impl User {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role.as_ref().is_some_and(Role::is_admin)
    }
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,

    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !looks_like_email(&self.email) {
            return Err(ValidationError::new("email", "invalid email address"));
        }
        if self.password.is_empty() {
            return Err(ValidationError::new("password", "password is required"));
        }
        Ok(())
    }
}

/// Sign-up payload. Accounts created through the storefront are always
/// customers; the role is fixed when the request is translated.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub name: String,

    pub email: String,

    pub phone: String,

    pub password: String,

    pub address: Option<String>,

    pub city: Option<String>,

    pub zip_code: Option<String>,
}

impl Registration {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_name(&self.name)?;
        validate_email(&self.email)?;
        validate_phone(&self.phone)?;
        if self.password.chars().count() < 6 {
            return Err(ValidationError::new(
                "password",
                "password must be at least 6 characters",
            ));
        }
        Ok(())
    }
}

/// Partial profile change. Only the fields that are `Some` are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: Option<String>,

    pub email: Option<String>,

    pub phone: Option<String>,

    pub address: Option<String>,

    pub city: Option<String>,

    pub zip_code: Option<String>,
}

impl ProfileUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.address.is_none()
            && self.city.is_none()
            && self.zip_code.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::new("profile", "nothing to update"));
        }
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        if let Some(phone) = &self.phone {
            validate_phone(phone)?;
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().chars().count() < 2 {
        return Err(ValidationError::new("name", "name is required"));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), ValidationError> {
    if !looks_like_email(email) {
        return Err(ValidationError::new("email", "invalid email address"));
    }
    Ok(())
}

fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if phone.trim().chars().count() < 8 {
        return Err(ValidationError::new("phone", "invalid phone number"));
    }
    Ok(())
}
