//! Vehicle inventory: browsing for everyone, editing for administrators.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::clients::{RequestError, VehiclesApi};
use crate::domain::VehicleId;
use crate::models::{ValidationError, Vehicle, VehicleInput};
use crate::notify::Notifier;
use crate::services::access::AccessError;
use crate::services::identity::IdentityContext;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("Vehicle {0} is already sold")]
    AlreadySold(VehicleId),
}

pub struct VehicleCatalog {
    vehicles: Arc<dyn VehiclesApi>,
    identity: Arc<IdentityContext>,
    notifier: Arc<dyn Notifier>,
}

impl VehicleCatalog {
    pub fn new(
        vehicles: Arc<dyn VehiclesApi>,
        identity: Arc<IdentityContext>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            vehicles,
            identity,
            notifier,
        }
    }

    pub async fn list(&self) -> Result<Vec<Vehicle>, CatalogError> {
        Ok(self.vehicles.list().await?)
    }

    /// Vehicles that can still be bought.
    pub async fn list_available(&self) -> Result<Vec<Vehicle>, CatalogError> {
        let mut vehicles = self.vehicles.list().await?;
        vehicles.retain(Vehicle::is_available);
        Ok(vehicles)
    }

    pub async fn get(&self, id: VehicleId) -> Result<Vehicle, CatalogError> {
        Ok(self.vehicles.get(id).await?)
    }

    /// A blank query lists everything.
    pub async fn search(&self, query: &str) -> Result<Vec<Vehicle>, CatalogError> {
        let query = query.trim();
        if query.is_empty() {
            return self.list().await;
        }
        Ok(self.vehicles.search(query).await?)
    }

    pub async fn create(&self, input: &VehicleInput) -> Result<Vehicle, CatalogError> {
        self.identity.require_admin()?;
        input.validate()?;

        let vehicle = self.vehicles.create(input).await?;
        info!(vehicle_id = %vehicle.id, "Vehicle added");
        self.notifier
            .success(&format!("{} added to the inventory", vehicle.display_name()));
        Ok(vehicle)
    }

    pub async fn update(&self, id: VehicleId, input: &VehicleInput) -> Result<Vehicle, CatalogError> {
        self.identity.require_admin()?;
        input.validate()?;

        let vehicle = self.vehicles.update(id, input).await?;
        info!(vehicle_id = %id, "Vehicle updated");
        self.notifier.success(&format!("{} updated", vehicle.display_name()));
        Ok(vehicle)
    }

    pub async fn delete(&self, id: VehicleId) -> Result<(), CatalogError> {
        self.identity.require_admin()?;

        self.vehicles.delete(id).await?;
        info!(vehicle_id = %id, "Vehicle deleted");
        self.notifier.success("Vehicle removed from the inventory");
        Ok(())
    }

    /// Marks a vehicle sold outside of a purchase. Selling is one-way.
    pub async fn mark_sold(&self, id: VehicleId) -> Result<(), CatalogError> {
        self.identity.require_admin()?;

        let vehicle = self.vehicles.get(id).await?;
        if vehicle.sold {
            return Err(CatalogError::AlreadySold(id));
        }

        self.vehicles.mark_as_sold(id).await?;
        info!(vehicle_id = %id, "Vehicle marked as sold");
        self.notifier
            .success(&format!("{} marked as sold", vehicle.display_name()));
        Ok(())
    }
}
