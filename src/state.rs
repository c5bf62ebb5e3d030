use std::sync::Arc;

use anyhow::Context;

use crate::clients::{
    ErrorReporting, PurchasesApi, PurchasesClient, ServiceClient, UsersApi, UsersClient,
    VehiclesApi, VehiclesClient, build_http_client,
};
use crate::config::Config;
use crate::constants::services;
use crate::notify::{ConsoleNotifier, Notifier};
use crate::services::{
    IdentityContext, PurchaseWorkflow, SaleCoordinator, SalePolicy, VehicleCatalog,
};
use crate::session::{FileSessionStore, SessionStore};

/// The three gateways, behind their traits so tests can swap in fakes.
#[derive(Clone)]
pub struct Gateways {
    pub users: Arc<dyn UsersApi>,
    pub vehicles: Arc<dyn VehiclesApi>,
    pub purchases: Arc<dyn PurchasesApi>,
}

impl Gateways {
    /// HTTP gateways for the configured services, sharing one connection
    /// pool and one session store.
    pub fn http(
        config: &Config,
        session: &Arc<dyn SessionStore>,
        notifier: &Arc<dyn Notifier>,
    ) -> anyhow::Result<Self> {
        let http = build_http_client(config.services.request_timeout())
            .context("Failed to build shared HTTP client")?;

        let core = |service: &'static str, base_url: &str| {
            let client = ServiceClient::new(http.clone(), service, base_url, Arc::clone(session));
            match config.notifications.error_reporting {
                ErrorReporting::Gateway => client.with_reporter(Arc::clone(notifier)),
                ErrorReporting::Caller => client,
            }
        };

        Ok(Self {
            users: Arc::new(UsersClient::new(core(
                services::USERS,
                &config.services.users_url,
            ))),
            vehicles: Arc::new(VehiclesClient::new(core(
                services::VEHICLES,
                &config.services.vehicles_url,
            ))),
            purchases: Arc::new(PurchasesClient::new(core(
                services::PURCHASES,
                &config.services.purchases_url,
            ))),
        })
    }
}

/// Composition root. Owns the session store and hands it to every component
/// that needs it.
#[derive(Clone)]
pub struct AppContext {
    pub session: Arc<dyn SessionStore>,
    pub notifier: Arc<dyn Notifier>,
    pub gateways: Gateways,
    pub identity: Arc<IdentityContext>,
    pub catalog: Arc<VehicleCatalog>,
    pub purchases: Arc<PurchaseWorkflow>,
}

impl AppContext {
    /// Wires the application for a terminal session from `config`.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let session: Arc<dyn SessionStore> = Arc::new(FileSessionStore::new(config.storage_path()));
        let notifier: Arc<dyn Notifier> = Arc::new(ConsoleNotifier);
        let gateways = Gateways::http(config, &session, &notifier)?;

        Ok(Self::from_parts(session, notifier, gateways, config.sale_policy()))
    }

    /// Wires the services over already-built parts.
    pub fn from_parts(
        session: Arc<dyn SessionStore>,
        notifier: Arc<dyn Notifier>,
        gateways: Gateways,
        sale_policy: SalePolicy,
    ) -> Self {
        let identity = Arc::new(IdentityContext::new(
            Arc::clone(&gateways.users),
            Arc::clone(&session),
            Arc::clone(&notifier),
        ));

        let catalog = Arc::new(VehicleCatalog::new(
            Arc::clone(&gateways.vehicles),
            Arc::clone(&identity),
            Arc::clone(&notifier),
        ));

        let sales = SaleCoordinator::new(
            Arc::clone(&gateways.purchases),
            Arc::clone(&gateways.vehicles),
            sale_policy,
        );

        let purchases = Arc::new(PurchaseWorkflow::new(
            Arc::clone(&gateways.purchases),
            Arc::clone(&gateways.vehicles),
            Arc::clone(&identity),
            sales,
            Arc::clone(&notifier),
        ));

        Self {
            session,
            notifier,
            gateways,
            identity,
            catalog,
            purchases,
        }
    }
}
