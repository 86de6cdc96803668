// src/models/fleet.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "vehicle_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleType {
    Tractor,
    Truck,
    Van,
    Car,
}

impl VehicleType {
    pub fn label(&self) -> &'static str {
        match self {
            VehicleType::Tractor => "Ciągnik siodłowy",
            VehicleType::Truck => "Samochód ciężarowy",
            VehicleType::Van => "Bus",
            VehicleType::Car => "Samochód osobowy",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "TRACTOR" | "CIĄGNIK SIODŁOWY" | "CIĄGNIK" => Some(VehicleType::Tractor),
            "TRUCK" | "SAMOCHÓD CIĘŻAROWY" | "CIĘŻAROWY" => Some(VehicleType::Truck),
            "VAN" | "BUS" => Some(VehicleType::Van),
            "CAR" | "SAMOCHÓD OSOBOWY" | "OSOBOWY" => Some(VehicleType::Car),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "vehicle_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleStatus {
    Available,
    InUse,
    Maintenance,
    OutOfService,
}

impl VehicleStatus {
    pub fn label(&self) -> &'static str {
        match self {
            VehicleStatus::Available => "Dostępny",
            VehicleStatus::InUse => "W trasie",
            VehicleStatus::Maintenance => "W serwisie",
            VehicleStatus::OutOfService => "Wyłączony z eksploatacji",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "trailer_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrailerType {
    Curtain,
    Refrigerated,
    Tank,
    Flatbed,
    Box,
    Other,
}

impl TrailerType {
    pub fn label(&self) -> &'static str {
        match self {
            TrailerType::Curtain => "Firanka",
            TrailerType::Refrigerated => "Chłodnia",
            TrailerType::Tank => "Cysterna",
            TrailerType::Flatbed => "Platforma",
            TrailerType::Box => "Kontener",
            TrailerType::Other => "Inna",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "CURTAIN" | "FIRANKA" => Some(TrailerType::Curtain),
            "REFRIGERATED" | "CHŁODNIA" => Some(TrailerType::Refrigerated),
            "TANK" | "CYSTERNA" => Some(TrailerType::Tank),
            "FLATBED" | "PLATFORMA" => Some(TrailerType::Flatbed),
            "BOX" | "KONTENER" => Some(TrailerType::Box),
            "OTHER" | "INNA" => Some(TrailerType::Other),
            _ => None,
        }
    }
}

// --- Veículos ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "WX12345")]
    pub registration_number: String,
    #[schema(example = "Volvo")]
    pub brand: String,
    #[schema(example = "FH 500")]
    pub model: String,
    #[schema(example = 2021)]
    pub production_year: Option<i32>,
    pub vin: Option<String>,
    pub vehicle_type: VehicleType,
    pub status: VehicleStatus,
    #[schema(example = 250000)]
    pub mileage_km: i32,
    pub insurance_expiry: Option<NaiveDate>,
    pub inspection_expiry: Option<NaiveDate>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VehicleInput {
    #[validate(length(min = 2, max = 20, message = "required"))]
    pub registration_number: String,
    #[validate(length(min = 1, max = 100, message = "required"))]
    pub brand: String,
    #[validate(length(min = 1, max = 100, message = "required"))]
    pub model: String,
    #[validate(range(min = 1950, max = 2100, message = "out_of_range"))]
    pub production_year: Option<i32>,
    #[validate(length(equal = 17, message = "invalid_field"))]
    pub vin: Option<String>,
    pub vehicle_type: VehicleType,
    pub status: Option<VehicleStatus>,
    #[validate(range(min = 0, message = "out_of_range"))]
    pub mileage_km: Option<i32>,
    pub insurance_expiry: Option<NaiveDate>,
    pub inspection_expiry: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct VehicleListQuery {
    /// Numer rejestracyjny, marka, model lub VIN
    pub search: Option<String>,
    pub status: Option<VehicleStatus>,
    pub vehicle_type: Option<VehicleType>,
    pub is_active: Option<bool>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

// --- Reboques ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Trailer {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "WX9876N")]
    pub registration_number: String,
    pub trailer_type: TrailerType,
    #[schema(example = "24000")]
    pub capacity_kg: Option<Decimal>,
    #[schema(example = "90")]
    pub volume_m3: Option<Decimal>,
    pub insurance_expiry: Option<NaiveDate>,
    pub inspection_expiry: Option<NaiveDate>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrailerInput {
    #[validate(length(min = 2, max = 20, message = "required"))]
    pub registration_number: String,
    pub trailer_type: TrailerType,
    pub capacity_kg: Option<Decimal>,
    pub volume_m3: Option<Decimal>,
    pub insurance_expiry: Option<NaiveDate>,
    pub inspection_expiry: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TrailerListQuery {
    pub search: Option<String>,
    pub trailer_type: Option<TrailerType>,
    pub is_active: Option<bool>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}
