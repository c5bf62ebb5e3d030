#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use dealership::clients::{
    LoginSession, ProfileTarget, PurchasesApi, RequestError, UsersApi, VehiclesApi,
};
use dealership::domain::{PaymentMethod, PurchaseId, PurchaseStatus, Role, UserId, VehicleId};
use dealership::models::{
    Credentials, NewPurchase, ProfileUpdate, Purchase, PurchaseUpdate, Registration, User,
    Vehicle, VehicleInput,
};
use dealership::notify::MemoryNotifier;
use dealership::services::{SalePolicy, SaleStrategy};
use dealership::session::{MemorySessionStore, SessionStore};
use dealership::state::{AppContext, Gateways};

pub const CUSTOMER_EMAIL: &str = "ana@example.com";
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const PASSWORD: &str = "secret1";

#[derive(Default)]
struct Inner {
    accounts: HashMap<String, (String, User)>,
    sessions: HashMap<String, UserId>,
    vehicles: BTreeMap<VehicleId, Vehicle>,
    purchases: BTreeMap<PurchaseId, Purchase>,
    calls: HashMap<&'static str, usize>,
    failures: HashMap<&'static str, usize>,
    created: Vec<NewPurchase>,
    next_user: i64,
    next_vehicle: i64,
    next_purchase: i64,
}

/// In-memory stand-in for the three backend services.
///
/// Operations are named `"users.login"`, `"vehicles.mark_as_sold"`,
/// `"purchases.register_sale"` and so on, for counting and for injecting
/// failures.
pub struct FakeBackend {
    session: Arc<dyn SessionStore>,
    inner: Mutex<Inner>,
}

pub fn customer() -> User {
    User {
        id: UserId::new(2),
        name: "Ana Torres".to_string(),
        email: CUSTOMER_EMAIL.to_string(),
        role: Some(Role::Customer),
        phone: Some("5551234567".to_string()),
        address: None,
        city: Some("Quito".to_string()),
        zip_code: None,
    }
}

pub fn admin() -> User {
    User {
        id: UserId::new(1),
        name: "Admin".to_string(),
        email: ADMIN_EMAIL.to_string(),
        role: Some(Role::Admin),
        phone: None,
        address: None,
        city: None,
        zip_code: None,
    }
}

pub fn mazda() -> Vehicle {
    Vehicle {
        id: VehicleId::new(3),
        brand: "Mazda".to_string(),
        model: "CX-5".to_string(),
        year: 2021,
        price: 25990.0,
        mileage: 30000.0,
        sold: false,
    }
}

pub fn pending_purchase() -> Purchase {
    Purchase {
        id: PurchaseId::new(7),
        user_id: customer().id,
        vehicle_id: mazda().id,
        total_price: 25990.0,
        payment_method: PaymentMethod::Cash,
        status: PurchaseStatus::Pending,
        purchased_at: None,
        vehicle: None,
    }
}

fn status_error(service: &'static str, status: u16, message: &str) -> RequestError {
    RequestError::Status {
        service,
        status,
        message: message.to_string(),
    }
}

impl FakeBackend {
    /// A customer and an administrator account, vehicle #3 and pending
    /// purchase #7 for that vehicle.
    pub fn seeded(session: Arc<dyn SessionStore>) -> Arc<Self> {
        let mut inner = Inner {
            next_user: 10,
            next_vehicle: 10,
            next_purchase: 10,
            ..Inner::default()
        };

        for user in [customer(), admin()] {
            inner
                .accounts
                .insert(user.email.clone(), (PASSWORD.to_string(), user));
        }

        let vehicle = mazda();
        inner.vehicles.insert(vehicle.id, vehicle);

        let sold = Vehicle {
            id: VehicleId::new(4),
            brand: "Kia".to_string(),
            model: "Rio".to_string(),
            year: 2019,
            price: 9000.0,
            mileage: 80000.0,
            sold: true,
        };
        inner.vehicles.insert(sold.id, sold);

        let purchase = pending_purchase();
        inner.purchases.insert(purchase.id, purchase);

        Arc::new(Self {
            session,
            inner: Mutex::new(inner),
        })
    }

    /// The next `times` calls to `op` fail with a 500.
    pub fn fail(&self, op: &'static str, times: usize) {
        self.inner.lock().unwrap().failures.insert(op, times);
    }

    pub fn calls(&self, op: &'static str) -> usize {
        self.inner.lock().unwrap().calls.get(op).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.inner.lock().unwrap().calls.values().sum()
    }

    pub fn vehicle(&self, id: VehicleId) -> Option<Vehicle> {
        self.inner.lock().unwrap().vehicles.get(&id).cloned()
    }

    pub fn purchase(&self, id: PurchaseId) -> Option<Purchase> {
        self.inner.lock().unwrap().purchases.get(&id).cloned()
    }

    pub fn set_vehicle_price(&self, id: VehicleId, price: f64) {
        if let Some(v) = self.inner.lock().unwrap().vehicles.get_mut(&id) {
            v.price = price;
        }
    }

    pub fn created(&self) -> Vec<NewPurchase> {
        self.inner.lock().unwrap().created.clone()
    }

    /// Issues a token for `user` the way a successful login would.
    pub fn issue_token(&self, user: &User) -> String {
        let token = format!("token-{}", user.id);
        self.inner
            .lock()
            .unwrap()
            .sessions
            .insert(token.clone(), user.id);
        token
    }

    fn enter(&self, service: &'static str, op: &'static str) -> Result<(), RequestError> {
        let mut inner = self.inner.lock().unwrap();
        *inner.calls.entry(op).or_default() += 1;

        if let Some(remaining) = inner.failures.get_mut(op)
            && *remaining > 0
        {
            *remaining -= 1;
            return Err(status_error(service, 500, "Internal server error"));
        }
        Ok(())
    }

    fn bearer_user(&self) -> Result<User, RequestError> {
        let inner = self.inner.lock().unwrap();
        let token = self
            .session
            .read()
            .ok_or_else(|| status_error("users", 401, "No token provided"))?;
        let id = inner
            .sessions
            .get(&token)
            .ok_or_else(|| status_error("users", 401, "Invalid token"))?;

        inner
            .accounts
            .values()
            .map(|(_, user)| user)
            .find(|user| user.id == *id)
            .cloned()
            .ok_or_else(|| status_error("users", 404, "User not found"))
    }
}

/// Fast policy for tests: no waiting between retries.
pub fn instant_policy(strategy: SaleStrategy, max_attempts: u32) -> SalePolicy {
    SalePolicy {
        strategy,
        max_attempts,
        base_delay: Duration::ZERO,
        max_delay: Duration::ZERO,
    }
}

pub struct Harness {
    pub ctx: AppContext,
    pub backend: Arc<FakeBackend>,
    pub session: Arc<dyn SessionStore>,
    pub notifier: Arc<MemoryNotifier>,
}

pub fn harness_with(session: Arc<dyn SessionStore>, policy: SalePolicy) -> Harness {
    let backend = FakeBackend::seeded(Arc::clone(&session));
    let notifier = Arc::new(MemoryNotifier::new());

    let gateways = Gateways {
        users: backend.clone(),
        vehicles: backend.clone(),
        purchases: backend.clone(),
    };
    let ctx = AppContext::from_parts(Arc::clone(&session), notifier.clone(), gateways, policy);

    Harness {
        ctx,
        backend,
        session,
        notifier,
    }
}

pub fn harness() -> Harness {
    harness_with(
        Arc::new(MemorySessionStore::new()),
        instant_policy(SaleStrategy::Retry, 3),
    )
}

impl Harness {
    pub async fn sign_in(&self, email: &str) {
        self.ctx.identity.initialize().await;
        self.ctx
            .identity
            .login(&Credentials::new(email, PASSWORD))
            .await
            .unwrap();
    }
}

#[async_trait]
impl UsersApi for FakeBackend {
    async fn register(&self, registration: &Registration) -> Result<(), RequestError> {
        self.enter("users", "users.register")?;
        let mut inner = self.inner.lock().unwrap();
        if inner.accounts.contains_key(&registration.email) {
            return Err(status_error("users", 400, "El email ya está registrado"));
        }

        inner.next_user += 1;
        let user = User {
            id: UserId::new(inner.next_user),
            name: registration.name.clone(),
            email: registration.email.clone(),
            role: Some(Role::Customer),
            phone: Some(registration.phone.clone()),
            address: registration.address.clone(),
            city: registration.city.clone(),
            zip_code: registration.zip_code.clone(),
        };
        inner
            .accounts
            .insert(registration.email.clone(), (registration.password.clone(), user));
        Ok(())
    }

    async fn login(&self, credentials: &Credentials) -> Result<LoginSession, RequestError> {
        self.enter("users", "users.login")?;
        let user = {
            let inner = self.inner.lock().unwrap();
            match inner.accounts.get(&credentials.email) {
                Some((password, user)) if *password == credentials.password => user.clone(),
                _ => return Err(status_error("users", 401, "Credenciales inválidas")),
            }
        };

        let token = self.issue_token(&user);
        Ok(LoginSession {
            token: Some(token),
            user,
        })
    }

    async fn current_user(&self) -> Result<User, RequestError> {
        self.enter("users", "users.current_user")?;
        self.bearer_user()
    }

    async fn update_profile(
        &self,
        target: ProfileTarget,
        update: &ProfileUpdate,
    ) -> Result<User, RequestError> {
        self.enter("users", "users.update_profile")?;
        let caller = self.bearer_user()?;
        let id = match target {
            ProfileTarget::Me => caller.id,
            ProfileTarget::User(id) => id,
        };

        let mut inner = self.inner.lock().unwrap();
        let (_, user) = inner
            .accounts
            .values_mut()
            .find(|(_, user)| user.id == id)
            .ok_or_else(|| status_error("users", 404, "Usuario no encontrado"))?;

        if let Some(name) = &update.name {
            user.name.clone_from(name);
        }
        if let Some(email) = &update.email {
            user.email.clone_from(email);
        }
        if let Some(phone) = &update.phone {
            user.phone = Some(phone.clone());
        }
        if let Some(address) = &update.address {
            user.address = Some(address.clone());
        }
        if let Some(city) = &update.city {
            user.city = Some(city.clone());
        }
        if let Some(zip_code) = &update.zip_code {
            user.zip_code = Some(zip_code.clone());
        }
        Ok(user.clone())
    }
}

#[async_trait]
impl VehiclesApi for FakeBackend {
    async fn list(&self) -> Result<Vec<Vehicle>, RequestError> {
        self.enter("vehicles", "vehicles.list")?;
        Ok(self.inner.lock().unwrap().vehicles.values().cloned().collect())
    }

    async fn get(&self, id: VehicleId) -> Result<Vehicle, RequestError> {
        self.enter("vehicles", "vehicles.get")?;
        self.vehicle(id)
            .ok_or_else(|| status_error("vehicles", 404, "Vehículo no encontrado"))
    }

    async fn search(&self, query: &str) -> Result<Vec<Vehicle>, RequestError> {
        self.enter("vehicles", "vehicles.search")?;
        let needle = query.to_lowercase();
        Ok(self
            .inner
            .lock()
            .unwrap()
            .vehicles
            .values()
            .filter(|v| {
                v.brand.to_lowercase().contains(&needle) || v.model.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect())
    }

    async fn create(&self, input: &VehicleInput) -> Result<Vehicle, RequestError> {
        self.enter("vehicles", "vehicles.create")?;
        let mut inner = self.inner.lock().unwrap();
        inner.next_vehicle += 1;
        let vehicle = Vehicle {
            id: VehicleId::new(inner.next_vehicle),
            brand: input.brand.clone(),
            model: input.model.clone(),
            year: input.year,
            price: input.price,
            mileage: input.mileage,
            sold: false,
        };
        inner.vehicles.insert(vehicle.id, vehicle.clone());
        Ok(vehicle)
    }

    async fn update(&self, id: VehicleId, input: &VehicleInput) -> Result<Vehicle, RequestError> {
        self.enter("vehicles", "vehicles.update")?;
        let mut inner = self.inner.lock().unwrap();
        let vehicle = inner
            .vehicles
            .get_mut(&id)
            .ok_or_else(|| status_error("vehicles", 404, "Vehículo no encontrado"))?;
        vehicle.brand.clone_from(&input.brand);
        vehicle.model.clone_from(&input.model);
        vehicle.year = input.year;
        vehicle.price = input.price;
        vehicle.mileage = input.mileage;
        Ok(vehicle.clone())
    }

    async fn delete(&self, id: VehicleId) -> Result<(), RequestError> {
        self.enter("vehicles", "vehicles.delete")?;
        self.inner
            .lock()
            .unwrap()
            .vehicles
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| status_error("vehicles", 404, "Vehículo no encontrado"))
    }

    async fn mark_as_sold(&self, id: VehicleId) -> Result<(), RequestError> {
        self.enter("vehicles", "vehicles.mark_as_sold")?;
        let mut inner = self.inner.lock().unwrap();
        let vehicle = inner
            .vehicles
            .get_mut(&id)
            .ok_or_else(|| status_error("vehicles", 404, "Vehículo no encontrado"))?;
        vehicle.sold = true;
        Ok(())
    }
}

#[async_trait]
impl PurchasesApi for FakeBackend {
    async fn create(&self, purchase: &NewPurchase) -> Result<Purchase, RequestError> {
        self.enter("purchases", "purchases.create")?;
        let mut inner = self.inner.lock().unwrap();
        inner.created.push(purchase.clone());
        inner.next_purchase += 1;

        let record = Purchase {
            id: PurchaseId::new(inner.next_purchase),
            user_id: purchase.user_id(),
            vehicle_id: purchase.vehicle_id(),
            total_price: purchase.total_price(),
            payment_method: purchase.payment_method(),
            status: PurchaseStatus::Pending,
            purchased_at: None,
            vehicle: None,
        };
        inner.purchases.insert(record.id, record.clone());
        Ok(record)
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Purchase>, RequestError> {
        self.enter("purchases", "purchases.list_for_user")?;
        Ok(self
            .inner
            .lock()
            .unwrap()
            .purchases
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get(&self, id: PurchaseId) -> Result<Purchase, RequestError> {
        self.enter("purchases", "purchases.get")?;
        self.purchase(id)
            .ok_or_else(|| status_error("purchases", 404, "Compra no encontrada"))
    }

    async fn update(&self, id: PurchaseId, update: &PurchaseUpdate) -> Result<Purchase, RequestError> {
        self.enter("purchases", "purchases.update")?;
        let mut inner = self.inner.lock().unwrap();
        let purchase = inner
            .purchases
            .get_mut(&id)
            .ok_or_else(|| status_error("purchases", 404, "Compra no encontrada"))?;
        if let Some(method) = update.payment_method {
            purchase.payment_method = method;
        }
        if let Some(status) = update.status {
            purchase.status = status;
        }
        Ok(purchase.clone())
    }

    async fn delete(&self, id: PurchaseId) -> Result<(), RequestError> {
        self.enter("purchases", "purchases.delete")?;
        self.inner
            .lock()
            .unwrap()
            .purchases
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| status_error("purchases", 404, "Compra no encontrada"))
    }

    async fn register_sale(&self, id: PurchaseId) -> Result<Purchase, RequestError> {
        self.enter("purchases", "purchases.register_sale")?;
        let mut inner = self.inner.lock().unwrap();
        let purchase = inner
            .purchases
            .get_mut(&id)
            .ok_or_else(|| status_error("purchases", 404, "Compra no encontrada"))?;
        purchase.status = PurchaseStatus::Completed;
        Ok(purchase.clone())
    }
}
