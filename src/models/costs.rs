// src/models/costs.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "cost_category", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CostCategory {
    Fuel,
    Toll,
    Repair,
    Service,
    Insurance,
    Parking,
    Fine,
    Salary,
    Other,
}

impl CostCategory {
    pub fn label(&self) -> &'static str {
        match self {
            CostCategory::Fuel => "Paliwo",
            CostCategory::Toll => "Opłaty drogowe",
            CostCategory::Repair => "Naprawa",
            CostCategory::Service => "Serwis",
            CostCategory::Insurance => "Ubezpieczenie",
            CostCategory::Parking => "Parking",
            CostCategory::Fine => "Mandat",
            CostCategory::Salary => "Wynagrodzenie",
            CostCategory::Other => "Inne",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Cost {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub category: CostCategory,
    #[schema(example = "Tankowanie ORLEN Stryków")]
    pub description: Option<String>,
    #[schema(example = "1520.40")]
    pub amount: Decimal,
    #[schema(example = "PLN")]
    pub currency: String,
    pub cost_date: NaiveDate,
    pub vehicle_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
    pub order_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CostInput {
    pub category: CostCategory,
    #[validate(length(max = 500, message = "too_long"))]
    pub description: Option<String>,
    #[validate(custom(function = "validate_positive_amount"))]
    pub amount: Decimal,
    #[validate(custom(function = "crate::common::validation::validate_currency"))]
    pub currency: Option<String>,
    pub cost_date: NaiveDate,
    pub vehicle_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
    pub order_id: Option<Uuid>,
}

fn validate_positive_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if *amount > Decimal::ZERO {
        Ok(())
    } else {
        let mut err = ValidationError::new("amount");
        err.message = Some("out_of_range".into());
        Err(err)
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CostListQuery {
    pub category: Option<CostCategory>,
    pub vehicle_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
    pub order_id: Option<Uuid>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CostPage {
    pub items: Vec<Cost>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
    /// Suma kwot wszystkich pasujących kosztów (nie tylko bieżącej strony)
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CostCategorySummary {
    pub category: CostCategory,
    pub count: i64,
    pub total_amount: Decimal,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct DateRangeQuery {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(amount: Decimal) -> CostInput {
        CostInput {
            category: CostCategory::Fuel,
            description: None,
            amount,
            currency: None,
            cost_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            vehicle_id: None,
            driver_id: None,
            order_id: None,
        }
    }

    #[test]
    fn amount_must_be_positive() {
        assert!(input(Decimal::new(1, 2)).validate().is_ok());
        assert!(input(Decimal::ZERO).validate().is_err());
        assert!(input(Decimal::new(-5, 0)).validate().is_err());
    }
}
