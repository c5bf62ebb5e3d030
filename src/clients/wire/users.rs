use serde::{Deserialize, Serialize};

use crate::domain::{Role, UserId};
use crate::models::{Credentials, ProfileUpdate, Registration, User};

/// Accounts created from the storefront are never administrators.
const SIGN_UP_ROLE: &str = "customer";

/// A user as the users service returns it. English spellings are accepted
/// too, since older deployments answer with them.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    pub id: UserId,

    #[serde(alias = "name")]
    pub nombre: String,

    pub email: String,

    #[serde(default, alias = "role")]
    pub rol: Option<String>,

    #[serde(default, alias = "phone")]
    pub telefono: Option<String>,

    #[serde(default, alias = "address")]
    pub direccion: Option<String>,

    #[serde(default, alias = "city")]
    pub ciudad: Option<String>,

    #[serde(default, rename = "codigoPostal", alias = "zipCode")]
    pub codigo_postal: Option<String>,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            name: record.nombre,
            email: record.email,
            role: non_empty(record.rol).map(|r| Role::from(r.as_str())),
            phone: non_empty(record.telefono),
            address: non_empty(record.direccion),
            city: non_empty(record.ciudad),
            zip_code: non_empty(record.codigo_postal),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Answer to `POST /login`. The token may be missing on a misconfigured
/// backend; the caller decides what that means.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRecord {
    #[serde(default)]
    pub token: Option<String>,

    pub user: UserRecord,
}

#[derive(Debug, Serialize)]
pub struct LoginBody<'a> {
    pub email: &'a str,

    #[serde(rename = "contraseña")]
    pub contrasena: &'a str,
}

impl<'a> From<&'a Credentials> for LoginBody<'a> {
    fn from(credentials: &'a Credentials) -> Self {
        Self {
            email: credentials.email.trim(),
            contrasena: &credentials.password,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterBody<'a> {
    pub nombre: &'a str,

    pub email: &'a str,

    pub telefono: &'a str,

    #[serde(rename = "contraseña")]
    pub contrasena: &'a str,

    pub rol: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub direccion: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ciudad: Option<&'a str>,

    #[serde(rename = "codigoPostal", skip_serializing_if = "Option::is_none")]
    pub codigo_postal: Option<&'a str>,
}

impl<'a> From<&'a Registration> for RegisterBody<'a> {
    fn from(registration: &'a Registration) -> Self {
        Self {
            nombre: registration.name.trim(),
            email: registration.email.trim(),
            telefono: registration.phone.trim(),
            contrasena: &registration.password,
            rol: SIGN_UP_ROLE,
            direccion: registration.address.as_deref(),
            ciudad: registration.city.as_deref(),
            codigo_postal: registration.zip_code.as_deref(),
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct ProfileBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nombre: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub telefono: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub direccion: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ciudad: Option<&'a str>,

    #[serde(rename = "codigoPostal", skip_serializing_if = "Option::is_none")]
    pub codigo_postal: Option<&'a str>,
}

impl<'a> From<&'a ProfileUpdate> for ProfileBody<'a> {
    fn from(update: &'a ProfileUpdate) -> Self {
        Self {
            nombre: update.name.as_deref().map(str::trim),
            email: update.email.as_deref().map(str::trim),
            telefono: update.phone.as_deref().map(str::trim),
            direccion: update.address.as_deref(),
            ciudad: update.city.as_deref(),
            codigo_postal: update.zip_code.as_deref(),
        }
    }
}
