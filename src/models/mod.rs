//! Client-side records and the typed request payloads sent to the backends.
//!
//! Every request type validates itself before it is dispatched, so malformed
//! input never leaves the process.

pub mod purchase;
pub mod user;
pub mod vehicle;

pub use purchase::{NewPurchase, Purchase, PurchaseUpdate};
pub use user::{Credentials, ProfileUpdate, Registration, User};
pub use vehicle::{Vehicle, VehicleInput};

use thiserror::Error;

/// A request payload failed boundary validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub(crate) fn looks_like_email(value: &str) -> bool {
    let Some((local, domain)) = value.trim().split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && domain.contains('.')
        && !value.contains(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_shape() {
        assert!(looks_like_email("ana@example.com"));
        assert!(!looks_like_email("ana@example"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("ana example@x.com"));
        assert!(!looks_like_email("ana@.com"));
    }
}
