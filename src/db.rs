// src/db.rs

pub mod contractor_repo;
pub mod cost_repo;
pub mod dashboard_repo;
pub mod document_repo;
pub mod driver_repo;
pub mod fleet_repo;
pub mod invoice_repo;
pub mod note_repo;
pub mod order_repo;
pub mod settings_repo;
pub mod tenancy_repo;
pub mod user_repo;

pub use contractor_repo::ContractorRepository;
pub use cost_repo::CostRepository;
pub use dashboard_repo::DashboardRepository;
pub use document_repo::DocumentRepository;
pub use driver_repo::DriverRepository;
pub use fleet_repo::FleetRepository;
pub use invoice_repo::InvoiceRepository;
pub use note_repo::NoteRepository;
pub use order_repo::OrderRepository;
pub use settings_repo::SettingsRepository;
pub use tenancy_repo::TenantRepository;
pub use user_repo::UserRepository;

use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::common::{error::AppError, pagination::PageRequest};

/// Linha de listagem acompanhada do total da consulta (`COUNT(*) OVER()`).
#[derive(sqlx::FromRow)]
pub struct Counted<T> {
    #[sqlx(flatten)]
    pub row: T,
    pub total_count: i64,
}

impl<T> Counted<T> {
    fn split(rows: Vec<Counted<T>>) -> (Vec<T>, i64) {
        let total = rows.first().map(|r| r.total_count).unwrap_or(0);
        (rows.into_iter().map(|r| r.row).collect(), total)
    }

    /// Como `split`, mas uma página além do fim não traz linhas nem o total;
    /// aí o total vem de `recount` (mesmos filtros, sem LIMIT).
    pub async fn split_or_recount<'q>(
        rows: Vec<Counted<T>>,
        page: PageRequest,
        pool: &PgPool,
        recount: impl FnOnce() -> QueryBuilder<'q, Postgres>,
    ) -> Result<(Vec<T>, i64), AppError> {
        let (items, total) = Self::split(rows);
        if !needs_recount(items.is_empty(), page) {
            return Ok((items, total));
        }
        let mut count = recount();
        let total = count.build_query_scalar::<i64>().fetch_one(pool).await?;
        Ok((items, total))
    }
}

fn needs_recount(page_is_empty: bool, page: PageRequest) -> bool {
    page_is_empty && page.offset() > 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_empty_pages_past_the_first_are_recounted() {
        assert!(!needs_recount(true, PageRequest::new(Some(1), Some(20))));
        assert!(!needs_recount(false, PageRequest::new(Some(2), Some(20))));
        assert!(needs_recount(true, PageRequest::new(Some(3), Some(20))));
    }
}

/// Dados mínimos para os testes com banco (`#[sqlx::test]`).
#[cfg(test)]
pub(crate) mod fixtures {
    use sqlx::PgPool;
    use uuid::Uuid;

    /// Empresa nova com um administrador: (tenant_id, user_id).
    pub async fn tenant_with_admin(pool: &PgPool) -> (Uuid, Uuid) {
        let tenant_id: Uuid = sqlx::query_scalar("INSERT INTO tenants (name) VALUES ('Trans-Pol') RETURNING id")
            .fetch_one(pool)
            .await
            .unwrap();
        let user_id: Uuid = sqlx::query_scalar(
            "INSERT INTO users (tenant_id, email, password_hash, first_name, last_name, role) \
             VALUES ($1, $2, 'x', 'Jan', 'Kowalski', 'ADMIN') RETURNING id",
        )
        .bind(tenant_id)
        .bind(format!("admin-{tenant_id}@firma.pl"))
        .fetch_one(pool)
        .await
        .unwrap();
        (tenant_id, user_id)
    }

    pub async fn contractor(pool: &PgPool, tenant_id: Uuid) -> Uuid {
        sqlx::query_scalar(
            "INSERT INTO contractors (tenant_id, name, kind) VALUES ($1, 'Nord Logistyka', 'CLIENT') RETURNING id",
        )
        .bind(tenant_id)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    pub async fn vehicle(pool: &PgPool, tenant_id: Uuid, registration: &str) -> Uuid {
        sqlx::query_scalar(
            "INSERT INTO vehicles (tenant_id, registration_number, brand, model, vehicle_type) \
             VALUES ($1, $2, 'Volvo', 'FH 500', 'TRACTOR') RETURNING id",
        )
        .bind(tenant_id)
        .bind(registration)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    /// Pedido gravado direto no status pedido, sem passar pelo fluxo.
    pub async fn order(pool: &PgPool, tenant_id: Uuid, contractor_id: Uuid, status: &str) -> Uuid {
        sqlx::query_scalar(
            "INSERT INTO orders (tenant_id, order_number, contractor_id, status, loading_address, loading_date, \
             unloading_address, unloading_date, cargo_description, price_net) \
             VALUES ($1, $2, $3, $4::order_status, 'Łódź', NOW(), 'Berlin', NOW() + INTERVAL '1 day', 'Palety', 4200) \
             RETURNING id",
        )
        .bind(tenant_id)
        .bind(format!("ZL/{}/2024", Uuid::new_v4().simple()))
        .bind(contractor_id)
        .bind(status)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    pub async fn assign(pool: &PgPool, tenant_id: Uuid, order_id: Uuid, kind: &str, resource_id: Uuid) {
        sqlx::query(
            "INSERT INTO order_assignments (tenant_id, order_id, resource_kind, resource_id) \
             VALUES ($1, $2, $3::resource_kind, $4)",
        )
        .bind(tenant_id)
        .bind(order_id)
        .bind(kind)
        .bind(resource_id)
        .execute(pool)
        .await
        .unwrap();
    }
}
