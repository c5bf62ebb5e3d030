use chrono::{Datelike, Utc};

use crate::domain::VehicleId;
use crate::models::ValidationError;

#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    pub id: VehicleId,

    pub brand: String,

    pub model: String,

    pub year: i32,

    pub price: f64,

    pub mileage: f64,

    /// One-directional: once sold, a vehicle is never offered again.
    pub sold: bool,
}

impl Vehicle {
    #[must_use]
    pub const fn is_available(&self) -> bool {
        !self.sold
    }

    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {} ({})", self.brand, self.model, self.year)
    }
}

/// Payload for creating or replacing a vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleInput {
    pub brand: String,

    pub model: String,

    pub year: i32,

    pub price: f64,

    pub mileage: f64,
}

impl VehicleInput {
    pub const MIN_YEAR: i32 = 1900;

    /// Validates against next year's models being the newest allowed.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.validate_with_max_year(Utc::now().year() + 1)
    }

    pub fn validate_with_max_year(&self, max_year: i32) -> Result<(), ValidationError> {
        if self.brand.trim().is_empty() {
            return Err(ValidationError::new("brand", "brand is required"));
        }
        if self.model.trim().is_empty() {
            return Err(ValidationError::new("model", "model is required"));
        }
        if self.year < Self::MIN_YEAR {
            return Err(ValidationError::new(
                "year",
                format!("year must be {} or later", Self::MIN_YEAR),
            ));
        }
        if self.year > max_year {
            return Err(ValidationError::new(
                "year",
                format!("year must be {max_year} or earlier"),
            ));
        }
        if !self.price.is_finite() || self.price <= 0.0 {
            return Err(ValidationError::new("price", "price must be positive"));
        }
        if !self.mileage.is_finite() || self.mileage < 0.0 {
            return Err(ValidationError::new("mileage", "mileage cannot be negative"));
        }
        Ok(())
    }
}
