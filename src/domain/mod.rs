//! Domain primitives for the storefront with strong typing.
//!
//! Identifiers follow the newtype pattern so a vehicle id can never be passed
//! where a purchase id is expected. The closed enumerations carry the exact
//! spellings the backend services use on the wire.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Accepts ids sent either as JSON numbers or as numeric strings.
///
/// The users service has been seen returning `"12"` where the purchases
/// service sends `12` for the same user.
fn deserialize_lenient_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(n) => Ok(n),
        RawId::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid id: {s:?}"))),
    }
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name(i64);

        impl $name {
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn value(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self::new(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<i64>().map(Self)
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                serializer.serialize_i64(self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                deserialize_lenient_id(deserializer).map(Self)
            }
        }
    };
}

entity_id!(
    /// Backend-assigned identifier of a user account.
    UserId
);

entity_id!(
    /// Identifier of a vehicle in the inventory.
    VehicleId
);

entity_id!(
    /// Identifier of a purchase record.
    PurchaseId
);

/// Role of a user account.
///
/// The set is open-ended on the backend; anything other than `customer` and
/// `admin` is preserved verbatim in [`Role::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    Customer,
    Admin,
    Other(String),
}

impl Role {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Customer => "customer",
            Self::Admin => "admin",
            Self::Other(role) => role,
        }
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        match value {
            "customer" => Self::Customer,
            "admin" => Self::Admin,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from(raw.as_str()))
    }
}

/// How a purchase is paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "Tarjeta de Crédito")]
    CreditCard,
    #[serde(rename = "Efectivo")]
    Cash,
    #[serde(rename = "Transferencia Bancaria")]
    BankTransfer,
    #[serde(rename = "Financiamiento")]
    Financing,
}

impl PaymentMethod {
    pub const ALL: [Self; 4] = [
        Self::CreditCard,
        Self::Cash,
        Self::BankTransfer,
        Self::Financing,
    ];

    /// The spelling the purchases service expects.
    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::CreditCard => "Tarjeta de Crédito",
            Self::Cash => "Efectivo",
            Self::BankTransfer => "Transferencia Bancaria",
            Self::Financing => "Financiamiento",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.wire_name())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    /// Accepts the wire spelling as well as short command-line names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "credit-card" | "card" | "tarjeta-de-crédito" | "tarjeta" => Ok(Self::CreditCard),
            "cash" | "efectivo" => Ok(Self::Cash),
            "bank-transfer" | "transfer" | "transferencia-bancaria" => Ok(Self::BankTransfer),
            "financing" | "financiamiento" => Ok(Self::Financing),
            _ => Err(format!(
                "unknown payment method '{s}' (expected one of: credit-card, cash, bank-transfer, financing)"
            )),
        }
    }
}

/// Lifecycle of a purchase: `pendiente` until an administrator completes or
/// cancels it. Both `completada` and `cancelada` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PurchaseStatus {
    #[default]
    #[serde(rename = "pendiente")]
    Pending,
    #[serde(rename = "completada")]
    Completed,
    #[serde(rename = "cancelada")]
    Cancelled,
}

impl PurchaseStatus {
    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::Pending => "pendiente",
            Self::Completed => "completada",
            Self::Cancelled => "cancelada",
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.wire_name())
    }
}

impl FromStr for PurchaseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" | "pendiente" => Ok(Self::Pending),
            "completed" | "completada" => Ok(Self::Completed),
            "cancelled" | "canceled" | "cancelada" => Ok(Self::Cancelled),
            _ => Err(format!(
                "unknown purchase status '{s}' (expected pending, completed or cancelled)"
            )),
        }
    }
}

/// Views the storefront can navigate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Login,
    Register,
    Profile,
    Vehicles,
    PurchaseHistory,
}

impl Route {
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Login => "/login",
            Self::Register => "/register",
            Self::Profile => "/profile",
            Self::Vehicles => "/vehicles",
            Self::PurchaseHistory => "/purchases/history",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.path())
    }
}
