// src/db/order_repo.rs

use chrono::{NaiveDate, NaiveTime};
use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{error::{map_unique_violation, AppError}, pagination::PageRequest},
    db::Counted,
    models::orders::{
        AssignmentInput, Order, OrderAssignment, OrderInput, OrderListItem, OrderListQuery,
        OrderStatus, ResourceKind, StatusHistoryEntry,
    },
};

const ORDER_COLUMNS: &str = r#"
    o.id, o.tenant_id, o.order_number, o.contractor_id, o.status, o.loading_address,
    o.loading_date, o.unloading_address, o.unloading_date, o.cargo_description,
    o.cargo_weight_kg, o.is_adr, o.price_net, o.currency, o.notes, o.created_by,
    o.created_at, o.updated_at
"#;

// Espelha OrderStatus::is_active
const ACTIVE_ORDER: &str = "o.status NOT IN ('COMPLETED', 'CANCELLED')";

const ASSIGNMENT_COLUMNS: &str = r#"
    a.id, a.tenant_id, a.order_id, a.resource_kind, a.resource_id, a.revenue_share,
    a.assigned_at, a.unassigned_at,
    CASE a.resource_kind
        WHEN 'DRIVER' THEN (SELECT d.first_name || ' ' || d.last_name FROM drivers d WHERE d.id = a.resource_id)
        WHEN 'VEHICLE' THEN (SELECT v.registration_number FROM vehicles v WHERE v.id = a.resource_id)
        WHEN 'TRAILER' THEN (SELECT t.registration_number FROM trailers t WHERE t.id = a.resource_id)
    END AS resource_label
"#;

fn start_of_day(date: NaiveDate) -> chrono::DateTime<chrono::Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

#[derive(Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  LISTAGEM
    // =========================================================================

    fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &OrderListQuery) {
        if let Some(status) = filter.status {
            qb.push(" AND o.status = ").push_bind(status);
        }
        if let Some(contractor_id) = filter.contractor_id {
            qb.push(" AND o.contractor_id = ").push_bind(contractor_id);
        }
        if let Some(driver_id) = filter.driver_id {
            qb.push(
                " AND EXISTS (SELECT 1 FROM order_assignments a WHERE a.order_id = o.id \
                 AND a.unassigned_at IS NULL AND a.resource_kind = 'DRIVER' AND a.resource_id = ",
            )
            .push_bind(driver_id)
            .push(")");
        }
        if let Some(vehicle_id) = filter.vehicle_id {
            qb.push(
                " AND EXISTS (SELECT 1 FROM order_assignments a WHERE a.order_id = o.id \
                 AND a.unassigned_at IS NULL AND a.resource_kind = 'VEHICLE' AND a.resource_id = ",
            )
            .push_bind(vehicle_id)
            .push(")");
        }
        Self::push_date_range(qb, filter.date_from, filter.date_to);
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{search}%");
            qb.push(" AND (o.order_number ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR o.loading_address ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR o.unloading_address ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR o.cargo_description ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR c.name ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
    }

    // Intervalo inclusivo sobre a data de carregamento
    fn push_date_range(qb: &mut QueryBuilder<'_, Postgres>, from: Option<NaiveDate>, to: Option<NaiveDate>) {
        if let Some(from) = from {
            qb.push(" AND o.loading_date >= ").push_bind(start_of_day(from));
        }
        if let Some(to) = to.and_then(|d| d.succ_opt()) {
            qb.push(" AND o.loading_date < ").push_bind(start_of_day(to));
        }
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        filter: &OrderListQuery,
        page: PageRequest,
    ) -> Result<(Vec<OrderListItem>, i64), AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            r#"
            SELECT {ORDER_COLUMNS}, c.name AS contractor_name, COUNT(*) OVER() AS total_count
            FROM orders o
            JOIN contractors c ON c.id = o.contractor_id
            WHERE o.tenant_id = "#
        ));
        qb.push_bind(tenant_id);
        Self::push_filters(&mut qb, filter);

        qb.push(" ORDER BY o.loading_date DESC, o.order_number DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = qb.build_query_as::<Counted<OrderListItem>>().fetch_all(&self.pool).await?;
        Counted::split_or_recount(rows, page, &self.pool, || {
            let mut count = QueryBuilder::<Postgres>::new(
                "SELECT COUNT(*) FROM orders o JOIN contractors c ON c.id = o.contractor_id WHERE o.tenant_id = ",
            );
            count.push_bind(tenant_id);
            Self::push_filters(&mut count, filter);
            count
        })
        .await
    }

    pub async fn list_for_export(
        &self,
        tenant_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<OrderListItem>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            r#"
            SELECT {ORDER_COLUMNS}, c.name AS contractor_name
            FROM orders o
            JOIN contractors c ON c.id = o.contractor_id
            WHERE o.tenant_id = "#
        ));
        qb.push_bind(tenant_id);
        Self::push_date_range(&mut qb, from, to);
        qb.push(" ORDER BY o.loading_date, o.order_number");

        let rows = qb.build_query_as::<OrderListItem>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    /// Pedidos ativos nos quais o motorista está atribuído (app móvel).
    pub async fn list_for_driver(&self, tenant_id: Uuid, driver_id: Uuid) -> Result<Vec<OrderListItem>, AppError> {
        let rows = sqlx::query_as::<_, OrderListItem>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}, c.name AS contractor_name
            FROM orders o
            JOIN contractors c ON c.id = o.contractor_id
            WHERE o.tenant_id = $1
              AND {ACTIVE_ORDER}
              AND EXISTS (
                  SELECT 1 FROM order_assignments a
                  WHERE a.order_id = o.id AND a.unassigned_at IS NULL
                    AND a.resource_kind = 'DRIVER' AND a.resource_id = $2
              )
            ORDER BY o.loading_date
            "#
        ))
        .bind(tenant_id)
        .bind(driver_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // =========================================================================
    //  PEDIDO
    // =========================================================================

    pub async fn find_by_id<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<Option<Order>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders o WHERE o.tenant_id = $1 AND o.id = $2"
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(order)
    }

    /// Mesma busca, mas trava a linha até o fim da transação.
    pub async fn lock_by_id<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<Option<Order>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders o WHERE o.tenant_id = $1 AND o.id = $2 FOR UPDATE"
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(order)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        order_number: &str,
        input: &OrderInput,
        created_by: Uuid,
    ) -> Result<Order, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Order>(&format!(
            r#"
            WITH o AS (
                INSERT INTO orders (
                    tenant_id, order_number, contractor_id, status, loading_address, loading_date,
                    unloading_address, unloading_date, cargo_description, cargo_weight_kg, is_adr,
                    price_net, currency, notes, created_by
                )
                VALUES ($1, $2, $3, 'PLANNED', $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
                RETURNING *
            )
            SELECT {ORDER_COLUMNS} FROM o
            "#
        ))
        .bind(tenant_id)
        .bind(order_number)
        .bind(input.contractor_id)
        .bind(input.loading_address.trim())
        .bind(input.loading_date)
        .bind(input.unloading_address.trim())
        .bind(input.unloading_date)
        .bind(input.cargo_description.trim())
        .bind(input.cargo_weight_kg)
        .bind(input.is_adr)
        .bind(input.price_net)
        .bind(input.currency.as_deref().unwrap_or("PLN").to_uppercase())
        .bind(&input.notes)
        .bind(created_by)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            map_unique_violation(e, |constraint| match constraint {
                "orders_tenant_number_key" => Some(AppError::UniqueConstraintViolation("order_number")),
                _ => None,
            })
        })
    }

    pub async fn update<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid, input: &OrderInput) -> Result<Order, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, Order>(&format!(
            r#"
            WITH o AS (
                UPDATE orders SET
                    contractor_id = $3, loading_address = $4, loading_date = $5,
                    unloading_address = $6, unloading_date = $7, cargo_description = $8,
                    cargo_weight_kg = $9, is_adr = $10, price_net = $11, currency = $12,
                    notes = $13, updated_at = NOW()
                WHERE tenant_id = $1 AND id = $2
                RETURNING *
            )
            SELECT {ORDER_COLUMNS} FROM o
            "#
        ))
        .bind(tenant_id)
        .bind(id)
        .bind(input.contractor_id)
        .bind(input.loading_address.trim())
        .bind(input.loading_date)
        .bind(input.unloading_address.trim())
        .bind(input.unloading_date)
        .bind(input.cargo_description.trim())
        .bind(input.cargo_weight_kg)
        .bind(input.is_adr)
        .bind(input.price_net)
        .bind(input.currency.as_deref().unwrap_or("PLN").to_uppercase())
        .bind(&input.notes)
        .fetch_one(executor)
        .await?;
        Ok(order)
    }

    pub async fn set_status<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid, status: OrderStatus) -> Result<Order, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, Order>(&format!(
            r#"
            WITH o AS (
                UPDATE orders SET status = $3, updated_at = NOW()
                WHERE tenant_id = $1 AND id = $2
                RETURNING *
            )
            SELECT {ORDER_COLUMNS} FROM o
            "#
        ))
        .bind(tenant_id)
        .bind(id)
        .bind(status)
        .fetch_one(executor)
        .await?;
        Ok(order)
    }

    pub async fn delete<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM orders WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    //  HISTÓRICO DE STATUS
    // =========================================================================

    #[allow(clippy::too_many_arguments)]
    pub async fn insert_history<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        order_id: Uuid,
        from_status: Option<OrderStatus>,
        to_status: OrderStatus,
        changed_by: Uuid,
        comment: Option<&str>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO order_status_history (tenant_id, order_id, from_status, to_status, changed_by, comment)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(tenant_id)
        .bind(order_id)
        .bind(from_status)
        .bind(to_status)
        .bind(changed_by)
        .bind(comment)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn list_history<'e, E>(&self, executor: E, tenant_id: Uuid, order_id: Uuid) -> Result<Vec<StatusHistoryEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, StatusHistoryEntry>(
            r#"
            SELECT h.id, h.from_status, h.to_status, h.changed_by,
                   u.first_name || ' ' || u.last_name AS changed_by_name,
                   h.comment, h.changed_at
            FROM order_status_history h
            LEFT JOIN users u ON u.id = h.changed_by
            WHERE h.tenant_id = $1 AND h.order_id = $2
            ORDER BY h.changed_at, h.id
            "#,
        )
        .bind(tenant_id)
        .bind(order_id)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    // =========================================================================
    //  ATRIBUIÇÕES
    // =========================================================================

    pub async fn list_assignments<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        order_id: Uuid,
        active_only: bool,
    ) -> Result<Vec<OrderAssignment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, OrderAssignment>(&format!(
            r#"
            SELECT {ASSIGNMENT_COLUMNS}
            FROM order_assignments a
            WHERE a.tenant_id = $1 AND a.order_id = $2
              AND ($3 = FALSE OR a.unassigned_at IS NULL)
            ORDER BY a.resource_kind, a.assigned_at, a.id
            "#
        ))
        .bind(tenant_id)
        .bind(order_id)
        .bind(active_only)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    pub async fn add_assignment<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        order_id: Uuid,
        input: &AssignmentInput,
    ) -> Result<OrderAssignment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, OrderAssignment>(&format!(
            r#"
            WITH a AS (
                INSERT INTO order_assignments (tenant_id, order_id, resource_kind, resource_id, revenue_share)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
            )
            SELECT {ASSIGNMENT_COLUMNS} FROM a
            "#
        ))
        .bind(tenant_id)
        .bind(order_id)
        .bind(input.resource_kind)
        .bind(input.resource_id)
        .bind(input.revenue_share)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            map_unique_violation(e, |constraint| match constraint {
                "idx_order_assignments_active" => Some(AppError::StateConflict("already_assigned")),
                _ => None,
            })
        })
    }

    pub async fn unassign<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        order_id: Uuid,
        assignment_id: Uuid,
    ) -> Result<Option<OrderAssignment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, OrderAssignment>(&format!(
            r#"
            WITH a AS (
                UPDATE order_assignments SET unassigned_at = NOW()
                WHERE tenant_id = $1 AND order_id = $2 AND id = $3 AND unassigned_at IS NULL
                RETURNING *
            )
            SELECT {ASSIGNMENT_COLUMNS} FROM a
            "#
        ))
        .bind(tenant_id)
        .bind(order_id)
        .bind(assignment_id)
        .fetch_optional(executor)
        .await?;
        Ok(row)
    }

    /// O recurso está atribuído (ativamente) a algum pedido ainda não encerrado?
    pub async fn resource_has_active_orders<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        kind: ResourceKind,
        resource_id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar(&format!(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM order_assignments a
                JOIN orders o ON o.id = a.order_id
                WHERE a.tenant_id = $1 AND a.resource_kind = $2 AND a.resource_id = $3
                  AND a.unassigned_at IS NULL AND {ACTIVE_ORDER}
            )
            "#
        ))
        .bind(tenant_id)
        .bind(kind)
        .bind(resource_id)
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }

    pub async fn contractor_has_active_orders<'e, E>(&self, executor: E, tenant_id: Uuid, contractor_id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar(&format!(
            "SELECT EXISTS (SELECT 1 FROM orders o WHERE o.tenant_id = $1 AND o.contractor_id = $2 AND {ACTIVE_ORDER})"
        ))
        .bind(tenant_id)
        .bind(contractor_id)
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }

    pub async fn is_assigned_to_driver<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        order_id: Uuid,
        driver_id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM order_assignments
                WHERE tenant_id = $1 AND order_id = $2 AND resource_kind = 'DRIVER'
                  AND resource_id = $3 AND unassigned_at IS NULL
            )
            "#,
        )
        .bind(tenant_id)
        .bind(order_id)
        .bind(driver_id)
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }

    /// Devolve para AVAILABLE os veículos em uso que não estão em nenhum pedido ativo.
    pub async fn release_idle_vehicles<'e, E>(&self, executor: E, tenant_id: Uuid, vehicle_ids: &[Uuid]) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if vehicle_ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(&format!(
            r#"
            UPDATE vehicles v SET status = 'AVAILABLE', updated_at = NOW()
            WHERE v.tenant_id = $1
              AND v.id = ANY($2)
              AND v.status = 'IN_USE'
              AND NOT EXISTS (
                  SELECT 1 FROM order_assignments a
                  JOIN orders o ON o.id = a.order_id
                  WHERE a.resource_kind = 'VEHICLE' AND a.resource_id = v.id
                    AND a.unassigned_at IS NULL AND {ACTIVE_ORDER}
              )
            "#
        ))
        .bind(tenant_id)
        .bind(vehicle_ids)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_filter_matches_terminal_statuses() {
        let terminal: Vec<OrderStatus> =
            OrderStatus::ALL.into_iter().filter(OrderStatus::is_terminal).collect();
        assert_eq!(terminal, vec![OrderStatus::Completed, OrderStatus::Cancelled]);
        assert!(ACTIVE_ORDER.contains("'COMPLETED'") && ACTIVE_ORDER.contains("'CANCELLED'"));
    }

    #[test]
    fn date_range_is_inclusive_of_the_last_day() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 31).unwrap();
        assert_eq!(start_of_day(day.succ_opt().unwrap()).to_rfc3339(), "2024-06-01T00:00:00+00:00");
    }
}
