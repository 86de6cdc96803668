// src/models/orders.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

// --- Status do pedido e tabela de transições ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "order_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Planned,
    Assigned,
    Confirmed,
    Loading,
    InTransit,
    Unloading,
    Delivered,
    Completed,
    Cancelled,
    Problem,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 10] = [
        OrderStatus::Planned,
        OrderStatus::Assigned,
        OrderStatus::Confirmed,
        OrderStatus::Loading,
        OrderStatus::InTransit,
        OrderStatus::Unloading,
        OrderStatus::Delivered,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
        OrderStatus::Problem,
    ];

    /// Status para os quais se pode ir a partir do atual.
    pub fn status_flow(&self) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match self {
            Planned => &[Assigned, Cancelled],
            Assigned => &[Confirmed, Planned, Cancelled],
            Confirmed => &[Loading, Cancelled, Problem],
            Loading => &[InTransit, Problem],
            InTransit => &[Unloading, Problem],
            Unloading => &[Delivered, Problem],
            Delivered => &[Completed, Problem],
            Problem => &[Loading, InTransit, Unloading, Delivered, Cancelled],
            Completed | Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        self.status_flow().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// A partir de ASSIGNED o pedido precisa de motorista e veículo.
    pub fn requires_assignment(&self) -> bool {
        !matches!(self, OrderStatus::Planned | OrderStatus::Cancelled)
    }

    /// Status que o motorista pode definir pelo app.
    pub fn driver_settable(&self) -> bool {
        matches!(
            self,
            OrderStatus::Loading
                | OrderStatus::InTransit
                | OrderStatus::Unloading
                | OrderStatus::Delivered
                | OrderStatus::Problem
        )
    }

    pub fn is_invoiceable(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Completed)
    }

    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Planned => "Zaplanowane",
            OrderStatus::Assigned => "Przydzielone",
            OrderStatus::Confirmed => "Potwierdzone",
            OrderStatus::Loading => "Załadunek",
            OrderStatus::InTransit => "W trasie",
            OrderStatus::Unloading => "Rozładunek",
            OrderStatus::Delivered => "Dostarczone",
            OrderStatus::Completed => "Zakończone",
            OrderStatus::Cancelled => "Anulowane",
            OrderStatus::Problem => "Problem",
        }
    }

    pub fn active_statuses() -> Vec<OrderStatus> {
        Self::ALL.into_iter().filter(OrderStatus::is_active).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "resource_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceKind {
    Driver,
    Vehicle,
    Trailer,
}

impl ResourceKind {
    pub fn entity_key(&self) -> &'static str {
        match self {
            ResourceKind::Driver => "driver",
            ResourceKind::Vehicle => "vehicle",
            ResourceKind::Trailer => "trailer",
        }
    }
}

// --- Pedido ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "ZL/0042/2024")]
    pub order_number: String,
    pub contractor_id: Uuid,
    pub status: OrderStatus,
    #[schema(example = "Magazyn Centralny, ul. Przemysłowa 1, Poznań")]
    pub loading_address: String,
    pub loading_date: DateTime<Utc>,
    #[schema(example = "DC Berlin-Süd, Großbeerenstraße 10, Berlin")]
    pub unloading_address: String,
    pub unloading_date: DateTime<Utc>,
    #[schema(example = "33 palety EUR, AGD")]
    pub cargo_description: String,
    #[schema(example = "18500")]
    pub cargo_weight_kg: Option<Decimal>,
    pub is_adr: bool,
    #[schema(example = "4200.00")]
    pub price_net: Decimal,
    #[schema(example = "PLN")]
    pub currency: String,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderListItem {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub order: Order,
    pub contractor_name: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_order_dates"))]
pub struct OrderInput {
    pub contractor_id: Uuid,
    #[validate(length(min = 1, max = 500, message = "required"))]
    pub loading_address: String,
    pub loading_date: DateTime<Utc>,
    #[validate(length(min = 1, max = 500, message = "required"))]
    pub unloading_address: String,
    pub unloading_date: DateTime<Utc>,
    #[validate(length(min = 1, max = 1000, message = "required"))]
    pub cargo_description: String,
    pub cargo_weight_kg: Option<Decimal>,
    #[serde(default)]
    pub is_adr: bool,
    pub price_net: Decimal,
    #[validate(custom(function = "crate::common::validation::validate_currency"))]
    pub currency: Option<String>,
    pub notes: Option<String>,
}

fn validate_order_dates(input: &OrderInput) -> Result<(), ValidationError> {
    if input.unloading_date < input.loading_date {
        let mut err = ValidationError::new("dates");
        err.message = Some("invalid_date_order".into());
        return Err(err);
    }
    if input.price_net < Decimal::ZERO {
        let mut err = ValidationError::new("price_net");
        err.message = Some("out_of_range".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
    pub contractor_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    /// Data załadunku od (włącznie)
    pub date_from: Option<chrono::NaiveDate>,
    /// Data załadunku do (włącznie)
    pub date_to: Option<chrono::NaiveDate>,
    /// Numer zlecenia, adresy lub opis ładunku
    pub search: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangeInput {
    pub status: OrderStatus,
    #[validate(length(max = 1000, message = "too_long"))]
    pub comment: Option<String>,
}

// --- Atribuições (motorista / veículo / reboque) ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderAssignment {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub order_id: Uuid,
    pub resource_kind: ResourceKind,
    pub resource_id: Uuid,
    /// Udział w przychodzie w procentach (puste = podział równy)
    #[schema(example = "50")]
    pub revenue_share: Option<Decimal>,
    pub assigned_at: DateTime<Utc>,
    pub unassigned_at: Option<DateTime<Utc>>,
    /// Imię i nazwisko kierowcy lub numer rejestracyjny
    pub resource_label: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentInput {
    pub resource_kind: ResourceKind,
    pub resource_id: Uuid,
    #[schema(example = "50")]
    pub revenue_share: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusHistoryEntry {
    pub id: Uuid,
    pub from_status: Option<OrderStatus>,
    pub to_status: OrderStatus,
    pub changed_by: Option<Uuid>,
    pub changed_by_name: Option<String>,
    pub comment: Option<String>,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevenueShareLine {
    pub assignment_id: Uuid,
    pub resource_kind: ResourceKind,
    pub resource_id: Uuid,
    pub resource_label: Option<String>,
    #[schema(example = "50.00")]
    pub share_percent: Decimal,
    #[schema(example = "2100.00")]
    pub amount: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub contractor_name: String,
    pub assignments: Vec<OrderAssignment>,
    pub revenue_allocation: Vec<RevenueShareLine>,
    pub history: Vec<StatusHistoryEntry>,
    /// Statusy dostępne z bieżącego (dla przycisków w UI)
    pub next_statuses: Vec<OrderStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashSet;

    #[test]
    fn terminal_statuses_have_no_exits() {
        for status in OrderStatus::ALL {
            assert_eq!(status.is_terminal(), status.status_flow().is_empty(), "{status:?}");
        }
    }

    #[test]
    fn every_status_is_reachable_from_planned() {
        let mut seen = HashSet::from([OrderStatus::Planned]);
        let mut queue = vec![OrderStatus::Planned];
        while let Some(current) = queue.pop() {
            for next in current.status_flow() {
                if seen.insert(*next) {
                    queue.push(*next);
                }
            }
        }
        assert_eq!(seen.len(), OrderStatus::ALL.len());
    }

    #[test]
    fn happy_path_follows_the_flow() {
        use OrderStatus::*;
        let path = [Planned, Assigned, Confirmed, Loading, InTransit, Unloading, Delivered, Completed];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{:?} -> {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn shortcuts_are_rejected() {
        assert!(!OrderStatus::Planned.can_transition_to(OrderStatus::Completed));
        assert!(!OrderStatus::Loading.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Completed.can_transition_to(OrderStatus::Planned));
        assert!(!OrderStatus::Planned.can_transition_to(OrderStatus::Planned));
    }

    #[test]
    fn problem_can_resume_or_cancel() {
        assert!(OrderStatus::Problem.can_transition_to(OrderStatus::InTransit));
        assert!(OrderStatus::Problem.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Problem.can_transition_to(OrderStatus::Completed));
    }

    #[test]
    fn driver_cannot_complete_or_cancel() {
        assert!(OrderStatus::InTransit.driver_settable());
        assert!(!OrderStatus::Completed.driver_settable());
        assert!(!OrderStatus::Cancelled.driver_settable());
        assert!(!OrderStatus::Assigned.driver_settable());
    }

    #[test]
    fn active_statuses_exclude_terminal_ones() {
        let active = OrderStatus::active_statuses();
        assert_eq!(active.len(), 8);
        assert!(!active.contains(&OrderStatus::Completed));
        assert!(!active.contains(&OrderStatus::Cancelled));
    }

    #[test]
    fn status_serializes_in_screaming_case() {
        assert_eq!(serde_json::to_string(&OrderStatus::InTransit).unwrap(), "\"IN_TRANSIT\"");
    }

    fn input() -> OrderInput {
        OrderInput {
            contractor_id: Uuid::new_v4(),
            loading_address: "Poznań".into(),
            loading_date: Utc.with_ymd_and_hms(2024, 5, 10, 8, 0, 0).unwrap(),
            unloading_address: "Berlin".into(),
            unloading_date: Utc.with_ymd_and_hms(2024, 5, 11, 8, 0, 0).unwrap(),
            cargo_description: "Palety".into(),
            cargo_weight_kg: None,
            is_adr: false,
            price_net: Decimal::new(420000, 2),
            currency: Some("EUR".into()),
            notes: None,
        }
    }

    #[test]
    fn unloading_before_loading_is_invalid() {
        assert!(input().validate().is_ok());

        let mut bad = input();
        bad.unloading_date = bad.loading_date - chrono::Duration::hours(1);
        assert!(bad.validate().is_err());
    }

    #[test]
    fn negative_price_is_invalid() {
        let mut bad = input();
        bad.price_net = Decimal::new(-1, 0);
        assert!(bad.validate().is_err());
    }
}
