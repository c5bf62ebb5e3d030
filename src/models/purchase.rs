use chrono::{DateTime, Utc};

use crate::domain::{PaymentMethod, PurchaseId, PurchaseStatus, UserId, VehicleId};
use crate::models::{ValidationError, Vehicle};

#[derive(Debug, Clone, PartialEq)]
pub struct Purchase {
    pub id: PurchaseId,

    pub user_id: UserId,

    pub vehicle_id: VehicleId,

    /// Captured from the vehicle price when the purchase was placed.
    pub total_price: f64,

    pub payment_method: PaymentMethod,

    pub status: PurchaseStatus,

    pub purchased_at: Option<DateTime<Utc>>,

    /// Snapshot of the vehicle, when the backend embeds one.
    pub vehicle: Option<Vehicle>,
}

/// A purchase about to be placed.
///
/// The only constructor takes the vehicle itself, so the total price always
/// comes from the vehicle's current price and never from user input.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPurchase {
    user_id: UserId,
    vehicle_id: VehicleId,
    total_price: f64,
    payment_method: PaymentMethod,
}

impl NewPurchase {
    #[must_use]
    pub const fn for_vehicle(
        user_id: UserId,
        vehicle: &Vehicle,
        payment_method: PaymentMethod,
    ) -> Self {
        Self {
            user_id,
            vehicle_id: vehicle.id,
            total_price: vehicle.price,
            payment_method,
        }
    }

    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub const fn vehicle_id(&self) -> VehicleId {
        self.vehicle_id
    }

    #[must_use]
    pub const fn total_price(&self) -> f64 {
        self.total_price
    }

    #[must_use]
    pub const fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }
}

/// Administrator edit of a purchase. Only `Some` fields are sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurchaseUpdate {
    pub payment_method: Option<PaymentMethod>,

    pub status: Option<PurchaseStatus>,
}

impl PurchaseUpdate {
    #[must_use]
    pub const fn status(status: PurchaseStatus) -> Self {
        Self {
            payment_method: None,
            status: Some(status),
        }
    }

    #[must_use]
    pub const fn payment_method(method: PaymentMethod) -> Self {
        Self {
            payment_method: Some(method),
            status: None,
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.payment_method.is_none() && self.status.is_none()
    }

    /// An edit may only cancel. Purchases never move back to pending, and
    /// completing one goes through the sale so its vehicle is marked sold.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::new("purchase", "nothing to update"));
        }
        match self.status {
            Some(PurchaseStatus::Pending) => Err(ValidationError::new(
                "status",
                "a purchase cannot be moved back to pending",
            )),
            Some(PurchaseStatus::Completed) => Err(ValidationError::new(
                "status",
                "use `complete` to finish a sale",
            )),
            Some(PurchaseStatus::Cancelled) | None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_purchase_takes_vehicle_price() {
        let vehicle = Vehicle {
            id: VehicleId::new(3),
            brand: "Mazda".to_string(),
            model: "CX-5".to_string(),
            year: 2021,
            price: 25990.0,
            mileage: 30000.0,
            sold: false,
        };

        let purchase = NewPurchase::for_vehicle(UserId::new(9), &vehicle, PaymentMethod::Cash);
        assert!((purchase.total_price() - 25990.0).abs() < f64::EPSILON);
        assert_eq!(purchase.vehicle_id(), VehicleId::new(3));
        assert_eq!(purchase.user_id(), UserId::new(9));
    }

    #[test]
    fn test_update_validation() {
        assert!(PurchaseUpdate::default().validate().is_err());
        assert!(PurchaseUpdate::status(PurchaseStatus::Pending).validate().is_err());
        assert_eq!(
            PurchaseUpdate::status(PurchaseStatus::Completed)
                .validate()
                .unwrap_err()
                .field,
            "status"
        );
        assert!(PurchaseUpdate::status(PurchaseStatus::Cancelled).validate().is_ok());
        assert!(PurchaseUpdate::payment_method(PaymentMethod::Financing)
            .validate()
            .is_ok());
    }
}
