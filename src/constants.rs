pub const APP_NAME: &str = "dealership";

pub const USER_AGENT: &str = "Dealership/0.1";

pub mod storage {

    /// Key under which the session token lives in durable storage.
    pub const TOKEN_KEY: &str = "auth_token";

    pub const FILE_NAME: &str = "storage.json";
}

pub mod messages {

    /// Shown when a failed response carries no readable message.
    pub const GENERIC_ERROR: &str = "Something went wrong. Please try again.";
}

pub mod services {

    pub const USERS: &str = "users";

    pub const VEHICLES: &str = "vehicles";

    pub const PURCHASES: &str = "purchases";
}
