//! Gateway to the purchases service.

use async_trait::async_trait;
use reqwest::Method;

use super::wire::purchases::{NewPurchaseBody, PurchaseRecord, PurchaseUpdateBody};
use super::{RequestError, ServiceClient};
use crate::domain::{PurchaseId, UserId};
use crate::models::{NewPurchase, Purchase, PurchaseUpdate};

#[async_trait]
pub trait PurchasesApi: Send + Sync {
    async fn create(&self, purchase: &NewPurchase) -> Result<Purchase, RequestError>;

    /// Purchases owned by `user_id`, in the order the backend returns them.
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Purchase>, RequestError>;

    async fn get(&self, id: PurchaseId) -> Result<Purchase, RequestError>;

    async fn update(&self, id: PurchaseId, update: &PurchaseUpdate) -> Result<Purchase, RequestError>;

    async fn delete(&self, id: PurchaseId) -> Result<(), RequestError>;

    /// Marks the purchase completed on the backend.
    async fn register_sale(&self, id: PurchaseId) -> Result<Purchase, RequestError>;
}

#[derive(Clone)]
pub struct PurchasesClient {
    core: ServiceClient,
}

impl PurchasesClient {
    #[must_use]
    pub const fn new(core: ServiceClient) -> Self {
        Self { core }
    }
}

#[async_trait]
impl PurchasesApi for PurchasesClient {
    async fn create(&self, purchase: &NewPurchase) -> Result<Purchase, RequestError> {
        let request = self
            .core
            .request(Method::POST, "/")
            .json(&NewPurchaseBody::from(purchase));
        let record: PurchaseRecord = self.core.fetch(request).await?;
        Ok(record.into())
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Purchase>, RequestError> {
        let request = self.core.request(Method::GET, &format!("/user/{user_id}"));
        let records: Vec<PurchaseRecord> = self.core.fetch(request).await?;
        Ok(records.into_iter().map(Purchase::from).collect())
    }

    async fn get(&self, id: PurchaseId) -> Result<Purchase, RequestError> {
        let request = self.core.request(Method::GET, &format!("/{id}"));
        let record: PurchaseRecord = self.core.fetch(request).await?;
        Ok(record.into())
    }

    async fn update(&self, id: PurchaseId, update: &PurchaseUpdate) -> Result<Purchase, RequestError> {
        let request = self
            .core
            .request(Method::PUT, &format!("/{id}"))
            .json(&PurchaseUpdateBody::from(update));
        let record: PurchaseRecord = self.core.fetch(request).await?;
        Ok(record.into())
    }

    async fn delete(&self, id: PurchaseId) -> Result<(), RequestError> {
        let request = self.core.request(Method::DELETE, &format!("/{id}"));
        self.core.execute(request).await
    }

    async fn register_sale(&self, id: PurchaseId) -> Result<Purchase, RequestError> {
        let request = self.core.request(Method::POST, &format!("/venta/{id}"));
        let record: PurchaseRecord = self.core.fetch(request).await?;
        Ok(record.into())
    }
}
