pub mod access;
pub use access::{AccessError, GateDecision, Guard, evaluate_when_settled};

pub mod identity;
pub use identity::{IdentityContext, IdentityError, IdentityState};

pub mod catalog;
pub use catalog::{CatalogError, VehicleCatalog};

pub mod sale;
pub use sale::{CompletedSale, SaleCoordinator, SaleError, SalePolicy, SaleStrategy};

pub mod purchase_workflow;
pub use purchase_workflow::{PurchaseDetails, PurchaseWorkflow, WorkflowError};
