use serde::{Deserialize, Serialize};

use super::{lenient_f64, parse_timestamp, vehicles::VehicleRecord};
use crate::domain::{PaymentMethod, PurchaseId, PurchaseStatus, UserId, VehicleId};
use crate::models::{NewPurchase, Purchase, PurchaseUpdate};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRecord {
    pub id: PurchaseId,

    pub user_id: UserId,

    pub vehicle_id: VehicleId,

    #[serde(deserialize_with = "lenient_f64")]
    pub precio_total: f64,

    pub metodo_pago: PaymentMethod,

    #[serde(default)]
    pub estado: PurchaseStatus,

    #[serde(default)]
    pub fecha_compra: Option<String>,

    #[serde(default, alias = "vehiculo")]
    pub vehicle: Option<VehicleRecord>,
}

impl From<PurchaseRecord> for Purchase {
    fn from(record: PurchaseRecord) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id,
            vehicle_id: record.vehicle_id,
            total_price: record.precio_total,
            payment_method: record.metodo_pago,
            status: record.estado,
            purchased_at: record.fecha_compra.as_deref().and_then(parse_timestamp),
            vehicle: record.vehicle.map(Into::into),
        }
    }
}

/// Body of `POST /`. Status is left to the backend, which starts every
/// purchase as pending.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPurchaseBody {
    pub user_id: UserId,

    pub vehicle_id: VehicleId,

    pub precio_total: f64,

    pub metodo_pago: PaymentMethod,
}

impl From<&NewPurchase> for NewPurchaseBody {
    fn from(purchase: &NewPurchase) -> Self {
        Self {
            user_id: purchase.user_id(),
            vehicle_id: purchase.vehicle_id(),
            precio_total: purchase.total_price(),
            metodo_pago: purchase.payment_method(),
        }
    }
}

/// Body of `PUT /{id}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseUpdateBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metodo_pago: Option<PaymentMethod>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub estado: Option<PurchaseStatus>,
}

impl From<&PurchaseUpdate> for PurchaseUpdateBody {
    fn from(update: &PurchaseUpdate) -> Self {
        Self {
            metodo_pago: update.payment_method,
            estado: update.status,
        }
    }
}
