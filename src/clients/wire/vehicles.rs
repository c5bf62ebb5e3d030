use serde::{Deserialize, Serialize};

use super::{lenient_bool, lenient_f64, lenient_i32};
use crate::domain::VehicleId;
use crate::models::{Vehicle, VehicleInput};

#[derive(Debug, Clone, Deserialize)]
pub struct VehicleRecord {
    pub id: VehicleId,

    pub marca: String,

    pub modelo: String,

    #[serde(rename = "año", alias = "anio", deserialize_with = "lenient_i32")]
    pub ano: i32,

    #[serde(deserialize_with = "lenient_f64")]
    pub precio: f64,

    #[serde(default, deserialize_with = "lenient_f64_or_zero")]
    pub kilometraje: f64,

    #[serde(default, deserialize_with = "lenient_bool")]
    pub vendido: bool,
}

fn lenient_f64_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(0.0),
        Some(v) => lenient_f64(v).map_err(serde::de::Error::custom),
    }
}

impl From<VehicleRecord> for Vehicle {
    fn from(record: VehicleRecord) -> Self {
        Self {
            id: record.id,
            brand: record.marca,
            model: record.modelo,
            year: record.ano,
            price: record.precio,
            mileage: record.kilometraje,
            sold: record.vendido,
        }
    }
}

/// Body of `POST /` and `PUT /{id}`.
#[derive(Debug, Serialize)]
pub struct VehicleBody<'a> {
    pub marca: &'a str,

    pub modelo: &'a str,

    #[serde(rename = "año")]
    pub ano: i32,

    pub precio: f64,

    pub kilometraje: f64,
}

impl<'a> From<&'a VehicleInput> for VehicleBody<'a> {
    fn from(input: &'a VehicleInput) -> Self {
        Self {
            marca: input.brand.trim(),
            modelo: input.model.trim(),
            ano: input.year,
            precio: input.price,
            kilometraje: input.mileage,
        }
    }
}
