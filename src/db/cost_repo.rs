// src/db/cost_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{error::AppError, money::round2, pagination::PageRequest},
    models::costs::{Cost, CostCategorySummary, CostInput, CostListQuery},
};

const COST_COLUMNS: &str = r#"
    id, tenant_id, category, description, amount, currency, cost_date, vehicle_id,
    driver_id, order_id, created_by, created_at, updated_at
"#;

#[derive(sqlx::FromRow)]
struct CostRow {
    #[sqlx(flatten)]
    cost: Cost,
    total_count: i64,
    total_amount: Decimal,
}

#[derive(Clone)]
pub struct CostRepository {
    pool: PgPool,
}

impl CostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn push_date_range(qb: &mut QueryBuilder<'_, Postgres>, from: Option<NaiveDate>, to: Option<NaiveDate>) {
        if let Some(from) = from {
            qb.push(" AND cost_date >= ").push_bind(from);
        }
        if let Some(to) = to {
            qb.push(" AND cost_date <= ").push_bind(to);
        }
    }

    /// Página de custos + total de linhas + soma dos valores de todo o filtro.
    pub async fn list(
        &self,
        tenant_id: Uuid,
        filter: &CostListQuery,
        page: PageRequest,
    ) -> Result<(Vec<Cost>, i64, Decimal), AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {COST_COLUMNS}, COUNT(*) OVER() AS total_count, \
             COALESCE(SUM(amount) OVER(), 0) AS total_amount FROM costs WHERE "
        ));
        Self::push_filters(&mut qb, tenant_id, filter);

        qb.push(" ORDER BY cost_date DESC, created_at DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = qb.build_query_as::<CostRow>().fetch_all(&self.pool).await?;
        let (total, sum) = match rows.first() {
            Some(first) => (first.total_count, first.total_amount),
            // Página vazia (ou além do fim): totais direto do filtro
            None => {
                let mut count = QueryBuilder::<Postgres>::new(
                    "SELECT COUNT(*), COALESCE(SUM(amount), 0) FROM costs WHERE ",
                );
                Self::push_filters(&mut count, tenant_id, filter);
                count.build_query_as::<(i64, Decimal)>().fetch_one(&self.pool).await?
            }
        };
        Ok((rows.into_iter().map(|r| r.cost).collect(), total, sum))
    }

    fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, tenant_id: Uuid, filter: &CostListQuery) {
        qb.push("tenant_id = ").push_bind(tenant_id);

        if let Some(category) = filter.category {
            qb.push(" AND category = ").push_bind(category);
        }
        if let Some(vehicle_id) = filter.vehicle_id {
            qb.push(" AND vehicle_id = ").push_bind(vehicle_id);
        }
        if let Some(driver_id) = filter.driver_id {
            qb.push(" AND driver_id = ").push_bind(driver_id);
        }
        if let Some(order_id) = filter.order_id {
            qb.push(" AND order_id = ").push_bind(order_id);
        }
        Self::push_date_range(qb, filter.date_from, filter.date_to);
    }

    pub async fn list_for_export(
        &self,
        tenant_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<Cost>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {COST_COLUMNS} FROM costs WHERE tenant_id = "));
        qb.push_bind(tenant_id);
        Self::push_date_range(&mut qb, from, to);
        qb.push(" ORDER BY cost_date, created_at");

        let rows = qb.build_query_as::<Cost>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    pub async fn summary_by_category(
        &self,
        tenant_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<CostCategorySummary>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT category, COUNT(*) AS count, COALESCE(SUM(amount), 0) AS total_amount \
             FROM costs WHERE tenant_id = ",
        );
        qb.push_bind(tenant_id);
        Self::push_date_range(&mut qb, from, to);
        qb.push(" GROUP BY category ORDER BY total_amount DESC");

        let rows = qb.build_query_as::<CostCategorySummary>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<Option<Cost>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let cost = sqlx::query_as::<_, Cost>(&format!(
            "SELECT {COST_COLUMNS} FROM costs WHERE tenant_id = $1 AND id = $2"
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(cost)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        input: &CostInput,
        created_by: Uuid,
    ) -> Result<Cost, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let cost = sqlx::query_as::<_, Cost>(&format!(
            r#"
            INSERT INTO costs (
                tenant_id, category, description, amount, currency, cost_date,
                vehicle_id, driver_id, order_id, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {COST_COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .bind(input.category)
        .bind(&input.description)
        .bind(round2(input.amount))
        .bind(input.currency.as_deref().unwrap_or("PLN").to_uppercase())
        .bind(input.cost_date)
        .bind(input.vehicle_id)
        .bind(input.driver_id)
        .bind(input.order_id)
        .bind(created_by)
        .fetch_one(executor)
        .await?;
        Ok(cost)
    }

    pub async fn update<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid, input: &CostInput) -> Result<Option<Cost>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let cost = sqlx::query_as::<_, Cost>(&format!(
            r#"
            UPDATE costs SET
                category = $3, description = $4, amount = $5, currency = $6, cost_date = $7,
                vehicle_id = $8, driver_id = $9, order_id = $10, updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING {COST_COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .bind(id)
        .bind(input.category)
        .bind(&input.description)
        .bind(round2(input.amount))
        .bind(input.currency.as_deref().unwrap_or("PLN").to_uppercase())
        .bind(input.cost_date)
        .bind(input.vehicle_id)
        .bind(input.driver_id)
        .bind(input.order_id)
        .fetch_optional(executor)
        .await?;
        Ok(cost)
    }

    pub async fn delete<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM costs WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
