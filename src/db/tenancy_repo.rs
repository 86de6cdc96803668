// src/db/tenancy_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::tenancy::Tenant};

#[derive(Clone)]
pub struct TenantRepository {
    pool: PgPool,
}

impl TenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_tenant<'e, E>(&self, executor: E, name: &str) -> Result<Tenant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            INSERT INTO tenants (name)
            VALUES ($1)
            RETURNING id, name, created_at, updated_at
            "#,
        )
        .bind(name)
        .fetch_one(executor)
        .await?;

        Ok(tenant)
    }

    /// Incrementa atomicamente o contador (tenant, tipo, período) e devolve o novo valor.
    /// O UPSERT bloqueia a linha até o fim da transação, então dois pedidos
    /// concorrentes nunca recebem o mesmo número.
    pub async fn next_counter_value<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        kind: &str,
        period: &str,
    ) -> Result<i32, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let value: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO document_counters (tenant_id, kind, period, last_value)
            VALUES ($1, $2, $3, 1)
            ON CONFLICT (tenant_id, kind, period)
            DO UPDATE SET last_value = document_counters.last_value + 1
            RETURNING last_value
            "#,
        )
        .bind(tenant_id)
        .bind(kind)
        .bind(period)
        .fetch_one(executor)
        .await?;

        Ok(value)
    }
}
