//! Placing, inspecting and administering purchases.
//!
//! Customers can only buy a vehicle this workflow has seen as available, and
//! the price always comes from that vehicle. Administrators edit, delete and
//! complete purchases; completion goes through the [`SaleCoordinator`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::clients::{PurchasesApi, RequestError, VehiclesApi};
use crate::domain::{PaymentMethod, PurchaseId, PurchaseStatus, UserId, VehicleId};
use crate::models::{NewPurchase, Purchase, PurchaseUpdate, ValidationError, Vehicle};
use crate::notify::Notifier;
use crate::services::access::AccessError;
use crate::services::identity::IdentityContext;
use crate::services::sale::{CompletedSale, SaleCoordinator, SaleError};

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Sale(#[from] SaleError),

    #[error("Select a vehicle first")]
    NoVehicleSelected,

    #[error("Vehicle {0} is not available for purchase")]
    VehicleUnavailable(VehicleId),

    #[error("Purchase {id} is already {status}")]
    AlreadyFinal {
        id: PurchaseId,
        status: PurchaseStatus,
    },
}

/// A purchase together with the vehicle it refers to, when that could be
/// resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseDetails {
    pub purchase: Purchase,
    pub vehicle: Option<Vehicle>,
}

pub struct PurchaseWorkflow {
    purchases: Arc<dyn PurchasesApi>,
    vehicles: Arc<dyn VehiclesApi>,
    identity: Arc<IdentityContext>,
    sales: SaleCoordinator,
    notifier: Arc<dyn Notifier>,
    available: Mutex<HashMap<VehicleId, Vehicle>>,
}

impl PurchaseWorkflow {
    pub fn new(
        purchases: Arc<dyn PurchasesApi>,
        vehicles: Arc<dyn VehiclesApi>,
        identity: Arc<IdentityContext>,
        sales: SaleCoordinator,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            purchases,
            vehicles,
            identity,
            sales,
            notifier,
            available: Mutex::new(HashMap::new()),
        }
    }

    /// Fetches the inventory and remembers the unsold vehicles as the ones
    /// that may be bought.
    pub async fn load_available_vehicles(&self) -> Result<Vec<Vehicle>, WorkflowError> {
        let mut vehicles = self.vehicles.list().await?;
        vehicles.retain(Vehicle::is_available);

        let mut available = self.available.lock().unwrap_or_else(PoisonError::into_inner);
        available.clear();
        available.extend(vehicles.iter().map(|v| (v.id, v.clone())));
        debug!(count = available.len(), "Available vehicles loaded");

        Ok(vehicles)
    }

    fn known_available(&self, id: VehicleId) -> Option<Vehicle> {
        self.available
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .filter(|v| v.is_available())
            .cloned()
    }

    fn forget_vehicle(&self, id: VehicleId) {
        self.available
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
    }

    /// Purchases owned by `user_id`. Customers may only list their own.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Purchase>, WorkflowError> {
        let user = self.identity.require_user()?;
        if user.id != user_id && !user.is_admin() {
            return Err(AccessError::Forbidden.into());
        }

        Ok(self.purchases.list_for_user(user_id).await?)
    }

    /// Purchase history of whoever is signed in.
    pub async fn list_mine(&self) -> Result<Vec<Purchase>, WorkflowError> {
        let user = self.identity.require_user()?;
        Ok(self.purchases.list_for_user(user.id).await?)
    }

    pub async fn get(&self, id: PurchaseId) -> Result<Purchase, WorkflowError> {
        let user = self.identity.require_user()?;
        let purchase = self.purchases.get(id).await?;
        if purchase.user_id != user.id && !user.is_admin() {
            return Err(AccessError::Forbidden.into());
        }
        Ok(purchase)
    }

    /// The purchase and its vehicle. Uses the snapshot embedded by the
    /// backend when there is one; otherwise asks the vehicles service.
    pub async fn details(&self, id: PurchaseId) -> Result<PurchaseDetails, WorkflowError> {
        let mut purchase = self.get(id).await?;

        let vehicle = match purchase.vehicle.take() {
            Some(vehicle) => Some(vehicle),
            None => match self.vehicles.get(purchase.vehicle_id).await {
                Ok(vehicle) => Some(vehicle),
                Err(e) => {
                    warn!(purchase_id = %id, vehicle_id = %purchase.vehicle_id, error = %e, "Vehicle of purchase could not be loaded");
                    None
                }
            },
        };

        Ok(PurchaseDetails { purchase, vehicle })
    }

    /// Places a purchase for the signed-in user.
    ///
    /// Only vehicles remembered by [`Self::load_available_vehicles`] are
    /// accepted, and nothing is sent when the vehicle is missing or unknown.
    pub async fn create(
        &self,
        vehicle_id: Option<VehicleId>,
        payment_method: PaymentMethod,
    ) -> Result<Purchase, WorkflowError> {
        let user = self.identity.require_user()?;
        let vehicle_id = vehicle_id.ok_or(WorkflowError::NoVehicleSelected)?;
        let vehicle = self
            .known_available(vehicle_id)
            .ok_or(WorkflowError::VehicleUnavailable(vehicle_id))?;

        let order = NewPurchase::for_vehicle(user.id, &vehicle, payment_method);
        let purchase = self.purchases.create(&order).await?;

        self.forget_vehicle(vehicle_id);
        info!(purchase_id = %purchase.id, vehicle_id = %vehicle_id, user_id = %user.id, "Purchase placed");
        self.notifier
            .success(&format!("Purchase of {} registered", vehicle.display_name()));

        Ok(purchase)
    }

    /// Changes payment method and/or status. Administrators only.
    ///
    /// A status change is refused once the purchase is completed or
    /// cancelled.
    pub async fn update(
        &self,
        id: PurchaseId,
        update: &PurchaseUpdate,
    ) -> Result<Purchase, WorkflowError> {
        self.identity.require_admin()?;
        update.validate()?;

        if update.status.is_some() {
            let current = self.purchases.get(id).await?;
            if current.status.is_terminal() {
                return Err(WorkflowError::AlreadyFinal {
                    id,
                    status: current.status,
                });
            }
        }

        let purchase = self.purchases.update(id, update).await?;
        info!(purchase_id = %id, status = %purchase.status, "Purchase updated");
        self.notifier.success(&format!("Purchase {id} updated"));
        Ok(purchase)
    }

    /// Cancels a pending purchase. Administrators only.
    pub async fn cancel(&self, id: PurchaseId) -> Result<Purchase, WorkflowError> {
        self.update(id, &PurchaseUpdate::status(PurchaseStatus::Cancelled))
            .await
    }

    /// Administrators only. Callers drop the purchase from any list they hold.
    pub async fn delete(&self, id: PurchaseId) -> Result<(), WorkflowError> {
        self.identity.require_admin()?;

        self.purchases.delete(id).await?;
        info!(purchase_id = %id, "Purchase deleted");
        self.notifier.success(&format!("Purchase {id} deleted"));
        Ok(())
    }

    /// Completes the purchase and marks its vehicle sold. Administrators
    /// only.
    ///
    /// A completed purchase whose vehicle is still unsold is finished rather
    /// than refused; a cancelled one is refused.
    pub async fn complete(&self, id: PurchaseId) -> Result<CompletedSale, WorkflowError> {
        self.identity.require_admin()?;

        let purchase = self.purchases.get(id).await?;
        if purchase.status == PurchaseStatus::Cancelled {
            return Err(WorkflowError::AlreadyFinal {
                id,
                status: purchase.status,
            });
        }

        let sale = self.sales.complete(&purchase).await?;
        self.forget_vehicle(sale.vehicle_id);
        self.notifier.success(&format!("Sale of purchase {id} registered"));
        Ok(sale)
    }
}
