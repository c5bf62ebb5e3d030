//! Gateway to the vehicles service.

use async_trait::async_trait;
use reqwest::Method;

use super::wire::vehicles::{VehicleBody, VehicleRecord};
use super::{RequestError, ServiceClient};
use crate::domain::VehicleId;
use crate::models::{Vehicle, VehicleInput};

#[async_trait]
pub trait VehiclesApi: Send + Sync {
    async fn list(&self) -> Result<Vec<Vehicle>, RequestError>;

    async fn get(&self, id: VehicleId) -> Result<Vehicle, RequestError>;

    /// Free-text search over brand and model.
    async fn search(&self, query: &str) -> Result<Vec<Vehicle>, RequestError>;

    async fn create(&self, input: &VehicleInput) -> Result<Vehicle, RequestError>;

    async fn update(&self, id: VehicleId, input: &VehicleInput) -> Result<Vehicle, RequestError>;

    async fn delete(&self, id: VehicleId) -> Result<(), RequestError>;

    async fn mark_as_sold(&self, id: VehicleId) -> Result<(), RequestError>;
}

#[derive(Clone)]
pub struct VehiclesClient {
    core: ServiceClient,
}

impl VehiclesClient {
    #[must_use]
    pub const fn new(core: ServiceClient) -> Self {
        Self { core }
    }
}

fn into_vehicles(records: Vec<VehicleRecord>) -> Vec<Vehicle> {
    records.into_iter().map(Vehicle::from).collect()
}

#[async_trait]
impl VehiclesApi for VehiclesClient {
    async fn list(&self) -> Result<Vec<Vehicle>, RequestError> {
        let request = self.core.request(Method::GET, "/");
        let records: Vec<VehicleRecord> = self.core.fetch(request).await?;
        Ok(into_vehicles(records))
    }

    async fn get(&self, id: VehicleId) -> Result<Vehicle, RequestError> {
        let request = self.core.request(Method::GET, &format!("/{id}"));
        let record: VehicleRecord = self.core.fetch(request).await?;
        Ok(record.into())
    }

    async fn search(&self, query: &str) -> Result<Vec<Vehicle>, RequestError> {
        let url = self.core.url_with_query("/buscar", &[("query", query.trim())])?;
        let request = self.core.request_url(Method::GET, url);
        let records: Vec<VehicleRecord> = self.core.fetch(request).await?;
        Ok(into_vehicles(records))
    }

    async fn create(&self, input: &VehicleInput) -> Result<Vehicle, RequestError> {
        let request = self
            .core
            .request(Method::POST, "/")
            .json(&VehicleBody::from(input));
        let record: VehicleRecord = self.core.fetch(request).await?;
        Ok(record.into())
    }

    async fn update(&self, id: VehicleId, input: &VehicleInput) -> Result<Vehicle, RequestError> {
        let request = self
            .core
            .request(Method::PUT, &format!("/{id}"))
            .json(&VehicleBody::from(input));
        let record: VehicleRecord = self.core.fetch(request).await?;
        Ok(record.into())
    }

    async fn delete(&self, id: VehicleId) -> Result<(), RequestError> {
        let request = self.core.request(Method::DELETE, &format!("/{id}"));
        self.core.execute(request).await
    }

    async fn mark_as_sold(&self, id: VehicleId) -> Result<(), RequestError> {
        let request = self.core.request(Method::POST, &format!("/venta/{id}"));
        self.core.execute(request).await
    }
}
