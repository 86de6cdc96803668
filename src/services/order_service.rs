// src/services/order_service.rs

use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{PageRequest, Paginated},
    },
    db::{ContractorRepository, DriverRepository, FleetRepository, OrderRepository, SettingsRepository, TenantRepository},
    models::{
        fleet::VehicleStatus,
        orders::{
            AssignmentInput, Order, OrderAssignment, OrderDetail, OrderInput, OrderListItem, OrderListQuery,
            OrderStatus, ResourceKind, StatusChangeInput,
        },
    },
    services::{numbering, revenue},
};

/// Valida a transição contra a tabela de status e as atribuições ativas.
pub fn check_transition(
    from: OrderStatus,
    to: OrderStatus,
    active_assignments: &[OrderAssignment],
) -> Result<(), AppError> {
    if !from.can_transition_to(to) {
        return Err(AppError::InvalidStatusTransition { from: from.label(), to: to.label() });
    }
    if to.requires_assignment() && !has_driver_and_vehicle(active_assignments) {
        return Err(AppError::StateConflict("assignment_required"));
    }
    Ok(())
}

pub fn has_driver_and_vehicle(assignments: &[OrderAssignment]) -> bool {
    let active = |kind: ResourceKind| {
        assignments
            .iter()
            .any(|a| a.resource_kind == kind && a.unassigned_at.is_none())
    };
    active(ResourceKind::Driver) && active(ResourceKind::Vehicle)
}

fn vehicle_ids(assignments: &[OrderAssignment]) -> Vec<Uuid> {
    assignments
        .iter()
        .filter(|a| a.resource_kind == ResourceKind::Vehicle)
        .map(|a| a.resource_id)
        .collect()
}

#[derive(Clone)]
pub struct OrderService {
    order_repo: OrderRepository,
    contractor_repo: ContractorRepository,
    driver_repo: DriverRepository,
    fleet_repo: FleetRepository,
    settings_repo: SettingsRepository,
    tenant_repo: TenantRepository,
    pool: PgPool,
}

impl OrderService {
    pub fn new(
        order_repo: OrderRepository,
        contractor_repo: ContractorRepository,
        driver_repo: DriverRepository,
        fleet_repo: FleetRepository,
        settings_repo: SettingsRepository,
        tenant_repo: TenantRepository,
        pool: PgPool,
    ) -> Self {
        Self { order_repo, contractor_repo, driver_repo, fleet_repo, settings_repo, tenant_repo, pool }
    }

    pub async fn list(&self, tenant_id: Uuid, query: &OrderListQuery) -> Result<Paginated<OrderListItem>, AppError> {
        let page = PageRequest::new(query.page, query.per_page);
        let (items, total) = self.order_repo.list(tenant_id, query, page).await?;
        Ok(Paginated::new(items, total, page))
    }

    pub async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<Order, AppError> {
        self.order_repo
            .find_by_id(&self.pool, tenant_id, id)
            .await?
            .ok_or(AppError::ResourceNotFound("order"))
    }

    pub async fn detail(&self, tenant_id: Uuid, id: Uuid) -> Result<OrderDetail, AppError> {
        let order = self.get(tenant_id, id).await?;

        let contractor_name = self
            .contractor_repo
            .find_by_id(&self.pool, tenant_id, order.contractor_id)
            .await?
            .map(|c| c.name)
            .unwrap_or_default();
        let assignments = self.order_repo.list_assignments(&self.pool, tenant_id, id, false).await?;
        let history = self.order_repo.list_history(&self.pool, tenant_id, id).await?;
        let revenue_allocation = revenue::allocate(order.price_net, &assignments)?;
        let next_statuses = order.status.status_flow().to_vec();

        Ok(OrderDetail { order, contractor_name, assignments, revenue_allocation, history, next_statuses })
    }

    pub async fn create(&self, tenant_id: Uuid, user_id: Uuid, input: &OrderInput) -> Result<Order, AppError> {
        let mut tx = self.pool.begin().await?;

        let contractor = self
            .contractor_repo
            .find_by_id(&mut *tx, tenant_id, input.contractor_id)
            .await?
            .ok_or(AppError::ResourceNotFound("contractor"))?;
        if !contractor.is_active {
            return Err(AppError::StateConflict("resource_inactive"));
        }

        let settings = self.settings_repo.get_settings(&mut *tx, tenant_id).await?;
        let order_number = numbering::next_order_number(
            &self.tenant_repo,
            &mut *tx,
            tenant_id,
            &settings.order_prefix,
            Utc::now().date_naive(),
        )
        .await?;

        let order = self
            .order_repo
            .create(&mut *tx, tenant_id, &order_number, input, user_id)
            .await?;
        self.order_repo
            .insert_history(&mut *tx, tenant_id, order.id, None, OrderStatus::Planned, user_id, None)
            .await?;

        tx.commit().await?;

        tracing::info!("📦 Pedido {} criado", order.order_number);
        Ok(order)
    }

    pub async fn update(&self, tenant_id: Uuid, id: Uuid, input: &OrderInput) -> Result<Order, AppError> {
        let mut tx = self.pool.begin().await?;

        let current = self
            .order_repo
            .lock_by_id(&mut *tx, tenant_id, id)
            .await?
            .ok_or(AppError::ResourceNotFound("order"))?;
        if current.status.is_terminal() {
            return Err(AppError::StateConflict("order_locked"));
        }

        if current.contractor_id != input.contractor_id {
            let contractor = self
                .contractor_repo
                .find_by_id(&mut *tx, tenant_id, input.contractor_id)
                .await?
                .ok_or(AppError::ResourceNotFound("contractor"))?;
            if !contractor.is_active {
                return Err(AppError::StateConflict("resource_inactive"));
            }
        }

        let order = self.order_repo.update(&mut *tx, tenant_id, id, input).await?;
        tx.commit().await?;
        Ok(order)
    }

    pub async fn change_status(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        id: Uuid,
        input: &StatusChangeInput,
    ) -> Result<Order, AppError> {
        let mut tx = self.pool.begin().await?;
        let current = self
            .order_repo
            .lock_by_id(&mut *tx, tenant_id, id)
            .await?
            .ok_or(AppError::ResourceNotFound("order"))?;

        let order = self
            .apply_status_change(&mut tx, tenant_id, user_id, current, input)
            .await?;

        tx.commit().await?;
        Ok(order)
    }

    async fn apply_status_change(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant_id: Uuid,
        user_id: Uuid,
        current: Order,
        input: &StatusChangeInput,
    ) -> Result<Order, AppError> {
        let assignments = self
            .order_repo
            .list_assignments(&mut **tx, tenant_id, current.id, true)
            .await?;
        check_transition(current.status, input.status, &assignments)?;

        let order = self
            .order_repo
            .set_status(&mut **tx, tenant_id, current.id, input.status)
            .await?;
        let comment = input.comment.as_deref().map(str::trim).filter(|c| !c.is_empty());
        self.order_repo
            .insert_history(&mut **tx, tenant_id, order.id, Some(current.status), order.status, user_id, comment)
            .await?;

        if order.status.is_terminal() {
            let released = self
                .order_repo
                .release_idle_vehicles(&mut **tx, tenant_id, &vehicle_ids(&assignments))
                .await?;
            if released > 0 {
                tracing::debug!("Veículos liberados após encerrar {}: {}", order.order_number, released);
            }
        }

        tracing::info!(
            "🔁 Pedido {}: {} -> {}",
            order.order_number,
            current.status.label(),
            order.status.label()
        );
        Ok(order)
    }

    pub async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        let order = self
            .order_repo
            .lock_by_id(&mut *tx, tenant_id, id)
            .await?
            .ok_or(AppError::ResourceNotFound("order"))?;

        if !matches!(order.status, OrderStatus::Planned | OrderStatus::Cancelled) {
            return Err(AppError::StateConflict("order_not_deletable"));
        }

        let assignments = self.order_repo.list_assignments(&mut *tx, tenant_id, id, true).await?;
        self.order_repo.delete(&mut *tx, tenant_id, id).await?;
        self.order_repo
            .release_idle_vehicles(&mut *tx, tenant_id, &vehicle_ids(&assignments))
            .await?;

        tx.commit().await?;
        Ok(())
    }

    // --- Atribuições ---

    pub async fn add_assignment(
        &self,
        tenant_id: Uuid,
        order_id: Uuid,
        input: &AssignmentInput,
    ) -> Result<OrderAssignment, AppError> {
        let mut tx = self.pool.begin().await?;

        let order = self
            .order_repo
            .lock_by_id(&mut *tx, tenant_id, order_id)
            .await?
            .ok_or(AppError::ResourceNotFound("order"))?;
        if order.status.is_terminal() {
            return Err(AppError::StateConflict("order_locked"));
        }

        let is_active = match input.resource_kind {
            ResourceKind::Driver => self
                .driver_repo
                .find_by_id(&mut *tx, tenant_id, input.resource_id)
                .await?
                .map(|d| d.is_active),
            ResourceKind::Vehicle => self
                .fleet_repo
                .find_vehicle(&mut *tx, tenant_id, input.resource_id)
                .await?
                .map(|v| v.is_active),
            ResourceKind::Trailer => self
                .fleet_repo
                .find_trailer(&mut *tx, tenant_id, input.resource_id)
                .await?
                .map(|t| t.is_active),
        }
        .ok_or(AppError::ResourceNotFound(input.resource_kind.entity_key()))?;
        if !is_active {
            return Err(AppError::StateConflict("resource_inactive"));
        }

        let current = self.order_repo.list_assignments(&mut *tx, tenant_id, order_id, true).await?;
        let same_kind = current
            .iter()
            .filter(|a| a.resource_kind == input.resource_kind)
            .map(|a| &a.revenue_share);
        revenue::check_shares(same_kind.chain(std::iter::once(&input.revenue_share)))?;

        let assignment = self.order_repo.add_assignment(&mut *tx, tenant_id, order_id, input).await?;

        if input.resource_kind == ResourceKind::Vehicle {
            self.fleet_repo
                .set_vehicle_status(&mut *tx, tenant_id, &[input.resource_id], VehicleStatus::InUse)
                .await?;
        }

        tx.commit().await?;
        Ok(assignment)
    }

    pub async fn remove_assignment(&self, tenant_id: Uuid, order_id: Uuid, assignment_id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let order = self
            .order_repo
            .lock_by_id(&mut *tx, tenant_id, order_id)
            .await?
            .ok_or(AppError::ResourceNotFound("order"))?;

        let removed = self
            .order_repo
            .unassign(&mut *tx, tenant_id, order_id, assignment_id)
            .await?
            .ok_or(AppError::ResourceNotFound("assignment"))?;

        // Pedido em andamento não pode ficar sem motorista ou veículo
        if order.status.requires_assignment() && order.status.is_active() {
            let remaining = self.order_repo.list_assignments(&mut *tx, tenant_id, order_id, true).await?;
            if !has_driver_and_vehicle(&remaining) {
                return Err(AppError::StateConflict("assignment_required"));
            }
        }

        if removed.resource_kind == ResourceKind::Vehicle {
            self.order_repo
                .release_idle_vehicles(&mut *tx, tenant_id, &[removed.resource_id])
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    // --- Aplicativo do motorista ---

    pub async fn list_for_driver(&self, tenant_id: Uuid, driver_id: Uuid) -> Result<Vec<OrderListItem>, AppError> {
        self.order_repo.list_for_driver(tenant_id, driver_id).await
    }

    /// Detalhe visto pelo motorista; pedidos de outros motoristas são 404.
    pub async fn driver_detail(&self, tenant_id: Uuid, driver_id: Uuid, id: Uuid) -> Result<OrderDetail, AppError> {
        self.ensure_driver_assignment(tenant_id, driver_id, id).await?;
        self.detail(tenant_id, id).await
    }

    pub async fn ensure_driver_assignment(&self, tenant_id: Uuid, driver_id: Uuid, order_id: Uuid) -> Result<(), AppError> {
        if !self
            .order_repo
            .is_assigned_to_driver(&self.pool, tenant_id, order_id, driver_id)
            .await?
        {
            return Err(AppError::ResourceNotFound("order"));
        }
        Ok(())
    }

    pub async fn driver_change_status(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        driver_id: Uuid,
        id: Uuid,
        input: &StatusChangeInput,
    ) -> Result<Order, AppError> {
        if !input.status.driver_settable() {
            return Err(AppError::InvalidInput("status_not_allowed_for_driver"));
        }

        let mut tx = self.pool.begin().await?;
        if !self
            .order_repo
            .is_assigned_to_driver(&mut *tx, tenant_id, id, driver_id)
            .await?
        {
            return Err(AppError::ResourceNotFound("order"));
        }
        let current = self
            .order_repo
            .lock_by_id(&mut *tx, tenant_id, id)
            .await?
            .ok_or(AppError::ResourceNotFound("order"))?;

        let order = self
            .apply_status_change(&mut tx, tenant_id, user_id, current, input)
            .await?;

        tx.commit().await?;
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment(kind: ResourceKind) -> OrderAssignment {
        OrderAssignment {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            order_id: Uuid::nil(),
            resource_kind: kind,
            resource_id: Uuid::new_v4(),
            revenue_share: None,
            assigned_at: Utc::now(),
            unassigned_at: None,
            resource_label: None,
        }
    }

    #[test]
    fn transition_outside_the_table_is_a_conflict() {
        let err = check_transition(OrderStatus::Planned, OrderStatus::Delivered, &[]).unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidStatusTransition { from: "Zaplanowane", to: "Dostarczone" }
        ));
    }

    #[test]
    fn assigned_requires_driver_and_vehicle() {
        let only_driver = [assignment(ResourceKind::Driver)];
        assert!(matches!(
            check_transition(OrderStatus::Planned, OrderStatus::Assigned, &only_driver),
            Err(AppError::StateConflict("assignment_required"))
        ));

        let crew = [assignment(ResourceKind::Driver), assignment(ResourceKind::Vehicle)];
        assert!(check_transition(OrderStatus::Planned, OrderStatus::Assigned, &crew).is_ok());
    }

    #[test]
    fn cancelling_needs_no_assignment() {
        assert!(check_transition(OrderStatus::Planned, OrderStatus::Cancelled, &[]).is_ok());
        assert!(check_transition(OrderStatus::Assigned, OrderStatus::Planned, &[]).is_ok());
    }

    #[test]
    fn unassigned_rows_do_not_count() {
        let mut vehicle = assignment(ResourceKind::Vehicle);
        vehicle.unassigned_at = Some(Utc::now());
        assert!(!has_driver_and_vehicle(&[assignment(ResourceKind::Driver), vehicle]));
    }

    #[test]
    fn only_vehicle_ids_are_released() {
        let crew = [
            assignment(ResourceKind::Driver),
            assignment(ResourceKind::Vehicle),
            assignment(ResourceKind::Trailer),
        ];
        assert_eq!(vehicle_ids(&crew), vec![crew[1].resource_id]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn same_resource_cannot_be_assigned_twice(pool: PgPool) {
        use crate::db::fixtures;
        use axum::http::StatusCode;

        let (tenant_id, _) = fixtures::tenant_with_admin(&pool).await;
        let contractor_id = fixtures::contractor(&pool, tenant_id).await;
        let vehicle_id = fixtures::vehicle(&pool, tenant_id, "PO7788A").await;
        let order_id = fixtures::order(&pool, tenant_id, contractor_id, "PLANNED").await;

        let orders = OrderService::new(
            OrderRepository::new(pool.clone()),
            ContractorRepository::new(pool.clone()),
            DriverRepository::new(pool.clone()),
            FleetRepository::new(pool.clone()),
            SettingsRepository::new(pool.clone()),
            TenantRepository::new(pool.clone()),
            pool.clone(),
        );
        let input = AssignmentInput { resource_kind: ResourceKind::Vehicle, resource_id: vehicle_id, revenue_share: None };

        orders.add_assignment(tenant_id, order_id, &input).await.unwrap();
        let err = orders.add_assignment(tenant_id, order_id, &input).await.unwrap_err();
        assert!(matches!(err, AppError::StateConflict("already_assigned")));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }
}
