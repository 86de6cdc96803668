// src/db/driver_repo.rs

use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{error::{map_unique_violation, AppError}, pagination::PageRequest},
    db::Counted,
    models::drivers::{Driver, DriverInput, DriverListQuery},
};

const DRIVER_COLUMNS: &str = r#"
    id, tenant_id, first_name, last_name, email, phone, license_number, license_expiry,
    adr_certified, adr_expiry, medical_exam_expiry, employed_since, notes, is_active,
    created_at, updated_at
"#;

fn map_driver_conflict(e: sqlx::Error) -> AppError {
    map_unique_violation(e, |constraint| match constraint {
        "drivers_tenant_license_key" => Some(AppError::UniqueConstraintViolation("driver_license")),
        _ => None,
    })
}

#[derive(Clone)]
pub struct DriverRepository {
    pool: PgPool,
}

impl DriverRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        filter: &DriverListQuery,
        page: PageRequest,
    ) -> Result<(Vec<Driver>, i64), AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {DRIVER_COLUMNS}, COUNT(*) OVER() AS total_count FROM drivers WHERE "
        ));
        Self::push_filters(&mut qb, tenant_id, filter);

        qb.push(" ORDER BY last_name, first_name LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = qb.build_query_as::<Counted<Driver>>().fetch_all(&self.pool).await?;
        Counted::split_or_recount(rows, page, &self.pool, || {
            let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM drivers WHERE ");
            Self::push_filters(&mut count, tenant_id, filter);
            count
        })
        .await
    }

    fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, tenant_id: Uuid, filter: &DriverListQuery) {
        qb.push("tenant_id = ").push_bind(tenant_id);

        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{search}%");
            qb.push(" AND (first_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR last_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR (first_name || ' ' || last_name) ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR email ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR license_number ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(active) = filter.is_active {
            qb.push(" AND is_active = ").push_bind(active);
        }
        if let Some(adr) = filter.adr_certified {
            qb.push(" AND adr_certified = ").push_bind(adr);
        }
    }

    /// Todos os motoristas (exportação), ativos primeiro.
    pub async fn list_all(&self, tenant_id: Uuid) -> Result<Vec<Driver>, AppError> {
        let drivers = sqlx::query_as::<_, Driver>(&format!(
            "SELECT {DRIVER_COLUMNS} FROM drivers WHERE tenant_id = $1 ORDER BY is_active DESC, last_name, first_name"
        ))
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(drivers)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<Option<Driver>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let driver = sqlx::query_as::<_, Driver>(&format!(
            "SELECT {DRIVER_COLUMNS} FROM drivers WHERE tenant_id = $1 AND id = $2"
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(driver)
    }

    pub async fn create<'e, E>(&self, executor: E, tenant_id: Uuid, input: &DriverInput) -> Result<Driver, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Driver>(&format!(
            r#"
            INSERT INTO drivers (
                tenant_id, first_name, last_name, email, phone, license_number, license_expiry,
                adr_certified, adr_expiry, medical_exam_expiry, employed_since, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {DRIVER_COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .bind(input.first_name.trim())
        .bind(input.last_name.trim())
        .bind(&input.email)
        .bind(&input.phone)
        .bind(input.license_number.trim())
        .bind(input.license_expiry)
        .bind(input.adr_certified)
        .bind(input.adr_expiry)
        .bind(input.medical_exam_expiry)
        .bind(input.employed_since)
        .bind(&input.notes)
        .fetch_one(executor)
        .await
        .map_err(map_driver_conflict)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        input: &DriverInput,
    ) -> Result<Option<Driver>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Driver>(&format!(
            r#"
            UPDATE drivers SET
                first_name = $3, last_name = $4, email = $5, phone = $6,
                license_number = $7, license_expiry = $8, adr_certified = $9, adr_expiry = $10,
                medical_exam_expiry = $11, employed_since = $12, notes = $13, updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING {DRIVER_COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .bind(id)
        .bind(input.first_name.trim())
        .bind(input.last_name.trim())
        .bind(&input.email)
        .bind(&input.phone)
        .bind(input.license_number.trim())
        .bind(input.license_expiry)
        .bind(input.adr_certified)
        .bind(input.adr_expiry)
        .bind(input.medical_exam_expiry)
        .bind(input.employed_since)
        .bind(&input.notes)
        .fetch_optional(executor)
        .await
        .map_err(map_driver_conflict)
    }

    pub async fn set_active<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid, is_active: bool) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE drivers SET is_active = $3, updated_at = NOW() WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(id)
        .bind(is_active)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
