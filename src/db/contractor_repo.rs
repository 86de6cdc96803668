// src/db/contractor_repo.rs

use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{
        error::{map_unique_violation, AppError},
        pagination::PageRequest,
        validation::normalize_nip,
    },
    db::Counted,
    models::contractors::{Contractor, ContractorInput, ContractorListQuery},
    models::settings::DEFAULT_PAYMENT_TERM_DAYS,
};

const CONTRACTOR_COLUMNS: &str = r#"
    id, tenant_id, name, kind, nip, address, city, postal_code, country, email, phone,
    payment_term_days, notes, is_active, created_at, updated_at
"#;

fn map_contractor_conflict(e: sqlx::Error) -> AppError {
    map_unique_violation(e, |constraint| match constraint {
        "contractors_tenant_nip_key" => Some(AppError::UniqueConstraintViolation("contractor_nip")),
        _ => None,
    })
}

fn country_code(input: &ContractorInput) -> String {
    input
        .country
        .as_deref()
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| "PL".to_string())
}

#[derive(Clone)]
pub struct ContractorRepository {
    pool: PgPool,
}

impl ContractorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        filter: &ContractorListQuery,
        page: PageRequest,
    ) -> Result<(Vec<Contractor>, i64), AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {CONTRACTOR_COLUMNS}, COUNT(*) OVER() AS total_count FROM contractors WHERE "
        ));
        Self::push_filters(&mut qb, tenant_id, filter);

        qb.push(" ORDER BY name LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = qb.build_query_as::<Counted<Contractor>>().fetch_all(&self.pool).await?;
        Counted::split_or_recount(rows, page, &self.pool, || {
            let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM contractors WHERE ");
            Self::push_filters(&mut count, tenant_id, filter);
            count
        })
        .await
    }

    fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, tenant_id: Uuid, filter: &ContractorListQuery) {
        qb.push("tenant_id = ").push_bind(tenant_id);

        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{search}%");
            qb.push(" AND (name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR nip ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR city ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(kind) = filter.kind {
            qb.push(" AND kind = ").push_bind(kind);
        }
        if let Some(active) = filter.is_active {
            qb.push(" AND is_active = ").push_bind(active);
        }
    }

    pub async fn list_all(&self, tenant_id: Uuid) -> Result<Vec<Contractor>, AppError> {
        let contractors = sqlx::query_as::<_, Contractor>(&format!(
            "SELECT {CONTRACTOR_COLUMNS} FROM contractors WHERE tenant_id = $1 ORDER BY is_active DESC, name"
        ))
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(contractors)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<Option<Contractor>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let contractor = sqlx::query_as::<_, Contractor>(&format!(
            "SELECT {CONTRACTOR_COLUMNS} FROM contractors WHERE tenant_id = $1 AND id = $2"
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(contractor)
    }

    pub async fn create<'e, E>(&self, executor: E, tenant_id: Uuid, input: &ContractorInput) -> Result<Contractor, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Contractor>(&format!(
            r#"
            INSERT INTO contractors (
                tenant_id, name, kind, nip, address, city, postal_code, country, email, phone,
                payment_term_days, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {CONTRACTOR_COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .bind(input.name.trim())
        .bind(input.kind)
        .bind(input.nip.as_deref().map(normalize_nip).filter(|n| !n.is_empty()))
        .bind(&input.address)
        .bind(&input.city)
        .bind(&input.postal_code)
        .bind(country_code(input))
        .bind(&input.email)
        .bind(&input.phone)
        .bind(input.payment_term_days.unwrap_or(DEFAULT_PAYMENT_TERM_DAYS))
        .bind(&input.notes)
        .fetch_one(executor)
        .await
        .map_err(map_contractor_conflict)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        input: &ContractorInput,
    ) -> Result<Option<Contractor>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Contractor>(&format!(
            r#"
            UPDATE contractors SET
                name = $3, kind = $4, nip = $5, address = $6, city = $7, postal_code = $8,
                country = $9, email = $10, phone = $11,
                payment_term_days = COALESCE($12, payment_term_days), notes = $13, updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING {CONTRACTOR_COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .bind(id)
        .bind(input.name.trim())
        .bind(input.kind)
        .bind(input.nip.as_deref().map(normalize_nip).filter(|n| !n.is_empty()))
        .bind(&input.address)
        .bind(&input.city)
        .bind(&input.postal_code)
        .bind(country_code(input))
        .bind(&input.email)
        .bind(&input.phone)
        .bind(input.payment_term_days)
        .bind(&input.notes)
        .fetch_optional(executor)
        .await
        .map_err(map_contractor_conflict)
    }

    pub async fn set_active<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid, is_active: bool) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE contractors SET is_active = $3, updated_at = NOW() WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(id)
        .bind(is_active)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
