// src/services/driver_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{PageRequest, Paginated},
    },
    db::{DriverRepository, OrderRepository},
    models::{
        drivers::{Driver, DriverInput, DriverListQuery},
        orders::ResourceKind,
    },
};

#[derive(Clone)]
pub struct DriverService {
    driver_repo: DriverRepository,
    order_repo: OrderRepository,
    pool: PgPool,
}

impl DriverService {
    pub fn new(driver_repo: DriverRepository, order_repo: OrderRepository, pool: PgPool) -> Self {
        Self { driver_repo, order_repo, pool }
    }

    pub async fn list(&self, tenant_id: Uuid, query: &DriverListQuery) -> Result<Paginated<Driver>, AppError> {
        let page = PageRequest::new(query.page, query.per_page);
        let (items, total) = self.driver_repo.list(tenant_id, query, page).await?;
        Ok(Paginated::new(items, total, page))
    }

    pub async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<Driver, AppError> {
        self.driver_repo
            .find_by_id(&self.pool, tenant_id, id)
            .await?
            .ok_or(AppError::ResourceNotFound("driver"))
    }

    pub async fn create(&self, tenant_id: Uuid, input: &DriverInput) -> Result<Driver, AppError> {
        let driver = self.driver_repo.create(&self.pool, tenant_id, input).await?;
        tracing::info!("🚚 Motorista {} cadastrado", driver.id);
        Ok(driver)
    }

    pub async fn update(&self, tenant_id: Uuid, id: Uuid, input: &DriverInput) -> Result<Driver, AppError> {
        self.driver_repo
            .update(&self.pool, tenant_id, id, input)
            .await?
            .ok_or(AppError::ResourceNotFound("driver"))
    }

    /// Desativa o motorista. Bloqueado enquanto estiver em pedido ativo.
    pub async fn deactivate(&self, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        if self
            .order_repo
            .resource_has_active_orders(&mut *tx, tenant_id, ResourceKind::Driver, id)
            .await?
        {
            return Err(AppError::HasActiveOrders("driver"));
        }
        if !self.driver_repo.set_active(&mut *tx, tenant_id, id, false).await? {
            return Err(AppError::ResourceNotFound("driver"));
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn reactivate(&self, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        if !self.driver_repo.set_active(&self.pool, tenant_id, id, true).await? {
            return Err(AppError::ResourceNotFound("driver"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::fixtures;
    use axum::http::StatusCode;

    fn service(pool: &PgPool) -> DriverService {
        DriverService::new(DriverRepository::new(pool.clone()), OrderRepository::new(pool.clone()), pool.clone())
    }

    fn driver(first_name: &str, license_number: &str) -> DriverInput {
        DriverInput {
            first_name: first_name.into(),
            last_name: "Kowalski".into(),
            email: None,
            phone: None,
            license_number: license_number.into(),
            license_expiry: None,
            adr_certified: false,
            adr_expiry: None,
            medical_exam_expiry: None,
            employed_since: None,
            notes: None,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn duplicate_license_number_is_a_conflict(pool: PgPool) {
        let (tenant_id, _) = fixtures::tenant_with_admin(&pool).await;
        let (other_tenant, _) = fixtures::tenant_with_admin(&pool).await;
        let drivers = service(&pool);

        drivers.create(tenant_id, &driver("Jan", "00123/19/1465")).await.unwrap();
        let err = drivers.create(tenant_id, &driver("Adam", "00123/19/1465")).await.unwrap_err();
        assert!(matches!(err, AppError::UniqueConstraintViolation("driver_license")));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);

        // Unicidade vale por empresa
        drivers.create(other_tenant, &driver("Jan", "00123/19/1465")).await.unwrap();
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn page_past_the_end_keeps_the_total(pool: PgPool) {
        let (tenant_id, _) = fixtures::tenant_with_admin(&pool).await;
        let drivers = service(&pool);
        for i in 0..5 {
            drivers.create(tenant_id, &driver("Jan", &format!("0000{i}/24/0001"))).await.unwrap();
        }

        let last = DriverListQuery { page: Some(3), per_page: Some(2), ..Default::default() };
        let page = drivers.list(tenant_id, &last).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total, 5);

        let beyond = DriverListQuery { page: Some(9), per_page: Some(2), ..Default::default() };
        let page = drivers.list(tenant_id, &beyond).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages, 3);
    }
}
