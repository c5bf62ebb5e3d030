//! Completing a sale across two services.
//!
//! A sale is two calls that cannot share a transaction: the purchases service
//! marks the purchase completed, then the vehicles service marks the vehicle
//! sold. [`SaleCoordinator`] owns both steps, tracks how far it got, and
//! applies the configured [`SaleStrategy`] when the second step fails.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::clients::{PurchasesApi, RequestError, VehiclesApi};
use crate::domain::{PurchaseId, PurchaseStatus, VehicleId};
use crate::models::{Purchase, PurchaseUpdate};

/// What to do when the vehicle cannot be marked sold after the purchase was
/// completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaleStrategy {
    /// One attempt per step.
    None,
    /// Retry the vehicle step with exponential backoff.
    #[default]
    Retry,
    /// Return the purchase to pending.
    Compensate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SalePolicy {
    pub strategy: SaleStrategy,

    /// Attempts at the vehicle step under [`SaleStrategy::Retry`]. At least one
    /// attempt is always made.
    pub max_attempts: u32,

    pub base_delay: Duration,

    pub max_delay: Duration,
}

impl Default for SalePolicy {
    fn default() -> Self {
        Self {
            strategy: SaleStrategy::default(),
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl SalePolicy {
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        match self.strategy {
            SaleStrategy::Retry if self.max_attempts > 1 => self.max_attempts,
            _ => 1,
        }
    }

    /// Delay before attempt `failed + 1`, doubling from `base_delay`.
    #[must_use]
    pub fn backoff(&self, failed: u32) -> Duration {
        let factor = 2u32.saturating_pow(failed.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Both steps went through.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedSale {
    pub purchase: Purchase,

    pub vehicle_id: VehicleId,

    /// Calls it took to mark the vehicle sold. Zero when a resumed sale found
    /// the vehicle already sold.
    pub vehicle_attempts: u32,
}

#[derive(Debug, Error)]
pub enum SaleError {
    /// The purchase could not be completed. Nothing changed.
    #[error(transparent)]
    Request(#[from] RequestError),

    /// The purchase is completed but its vehicle is still listed as available.
    #[error(
        "Purchase {purchase_id} is completed but vehicle {vehicle_id} could not be marked as sold ({attempts} attempt(s)): {source}"
    )]
    PartiallyCompleted {
        purchase_id: PurchaseId,
        vehicle_id: VehicleId,
        attempts: u32,
        #[source]
        source: RequestError,
    },

    /// The vehicle could not be marked sold, so the purchase was put back to
    /// pending.
    #[error(
        "Vehicle {vehicle_id} could not be marked as sold, purchase {purchase_id} was returned to pending: {source}"
    )]
    RolledBack {
        purchase_id: PurchaseId,
        vehicle_id: VehicleId,
        #[source]
        source: RequestError,
    },
}

pub struct SaleCoordinator {
    purchases: Arc<dyn PurchasesApi>,
    vehicles: Arc<dyn VehiclesApi>,
    policy: SalePolicy,
}

impl SaleCoordinator {
    pub fn new(
        purchases: Arc<dyn PurchasesApi>,
        vehicles: Arc<dyn VehiclesApi>,
        policy: SalePolicy,
    ) -> Self {
        Self {
            purchases,
            vehicles,
            policy,
        }
    }

    #[must_use]
    pub const fn policy(&self) -> &SalePolicy {
        &self.policy
    }

    /// Completes `purchase` and marks its vehicle sold.
    ///
    /// A purchase that is already completed skips the first step, which lets
    /// an earlier partial sale be finished later.
    pub async fn complete(&self, purchase: &Purchase) -> Result<CompletedSale, SaleError> {
        let purchase_id = purchase.id;
        let vehicle_id = purchase.vehicle_id;

        let (completed, resumed) = if purchase.status == PurchaseStatus::Completed {
            info!(purchase_id = %purchase_id, "Purchase already completed, finishing the sale");
            (purchase.clone(), true)
        } else {
            let completed = self.purchases.register_sale(purchase_id).await?;
            info!(purchase_id = %purchase_id, "Purchase marked as completed");
            (completed, false)
        };

        if resumed && self.vehicle_already_sold(vehicle_id).await {
            info!(purchase_id = %purchase_id, vehicle_id = %vehicle_id, "Vehicle already sold, nothing left to do");
            return Ok(CompletedSale {
                purchase: completed,
                vehicle_id,
                vehicle_attempts: 0,
            });
        }

        let (attempts, failure) = self.mark_vehicle_sold(purchase_id, vehicle_id).await;
        let Some(source) = failure else {
            info!(purchase_id = %purchase_id, vehicle_id = %vehicle_id, "Sale completed");
            return Ok(CompletedSale {
                purchase: completed,
                vehicle_id,
                vehicle_attempts: attempts,
            });
        };

        if self.policy.strategy == SaleStrategy::Compensate && !resumed {
            return Err(self.roll_back(purchase_id, vehicle_id, attempts, source).await);
        }

        warn!(
            purchase_id = %purchase_id,
            vehicle_id = %vehicle_id,
            attempts,
            "Sale left partially completed"
        );
        Err(SaleError::PartiallyCompleted {
            purchase_id,
            vehicle_id,
            attempts,
            source,
        })
    }

    /// A failed lookup counts as not sold, so the vehicle step still runs.
    async fn vehicle_already_sold(&self, vehicle_id: VehicleId) -> bool {
        match self.vehicles.get(vehicle_id).await {
            Ok(vehicle) => vehicle.sold,
            Err(e) => {
                warn!(vehicle_id = %vehicle_id, error = %e, "Could not check whether vehicle is sold");
                false
            }
        }
    }

    /// Returns the attempts made and the last error if every attempt failed.
    async fn mark_vehicle_sold(
        &self,
        purchase_id: PurchaseId,
        vehicle_id: VehicleId,
    ) -> (u32, Option<RequestError>) {
        let allowed = self.policy.attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.vehicles.mark_as_sold(vehicle_id).await {
                Ok(()) => return (attempt, None),
                Err(e) if attempt < allowed => {
                    let delay = self.policy.backoff(attempt);
                    warn!(
                        purchase_id = %purchase_id,
                        vehicle_id = %vehicle_id,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "Marking vehicle as sold failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return (attempt, Some(e)),
            }
        }
    }

    async fn roll_back(
        &self,
        purchase_id: PurchaseId,
        vehicle_id: VehicleId,
        attempts: u32,
        source: RequestError,
    ) -> SaleError {
        let revert = PurchaseUpdate::status(PurchaseStatus::Pending);
        match self.purchases.update(purchase_id, &revert).await {
            Ok(_) => {
                warn!(purchase_id = %purchase_id, vehicle_id = %vehicle_id, "Sale rolled back");
                SaleError::RolledBack {
                    purchase_id,
                    vehicle_id,
                    source,
                }
            }
            Err(revert_err) => {
                error!(
                    purchase_id = %purchase_id,
                    vehicle_id = %vehicle_id,
                    error = %revert_err,
                    "Could not roll back sale"
                );
                SaleError::PartiallyCompleted {
                    purchase_id,
                    vehicle_id,
                    attempts,
                    source,
                }
            }
        }
    }
}
