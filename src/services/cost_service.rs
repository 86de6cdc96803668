// src/services/cost_service.rs

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{PageRequest, Paginated},
    },
    db::{CostRepository, DriverRepository, FleetRepository, OrderRepository},
    models::costs::{Cost, CostCategorySummary, CostInput, CostListQuery, CostPage},
};

#[derive(Clone)]
pub struct CostService {
    cost_repo: CostRepository,
    driver_repo: DriverRepository,
    fleet_repo: FleetRepository,
    order_repo: OrderRepository,
    pool: PgPool,
}

impl CostService {
    pub fn new(
        cost_repo: CostRepository,
        driver_repo: DriverRepository,
        fleet_repo: FleetRepository,
        order_repo: OrderRepository,
        pool: PgPool,
    ) -> Self {
        Self { cost_repo, driver_repo, fleet_repo, order_repo, pool }
    }

    pub async fn list(&self, tenant_id: Uuid, query: &CostListQuery) -> Result<CostPage, AppError> {
        check_range(query.date_from, query.date_to)?;
        let page = PageRequest::new(query.page, query.per_page);
        let (items, total, total_amount) = self.cost_repo.list(tenant_id, query, page).await?;

        let paginated = Paginated::new(items, total, page);
        Ok(CostPage {
            items: paginated.items,
            total: paginated.total,
            page: paginated.page,
            per_page: paginated.per_page,
            total_pages: paginated.total_pages,
            total_amount,
        })
    }

    pub async fn summary(
        &self,
        tenant_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<CostCategorySummary>, AppError> {
        check_range(from, to)?;
        self.cost_repo.summary_by_category(tenant_id, from, to).await
    }

    pub async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<Cost, AppError> {
        self.cost_repo
            .find_by_id(&self.pool, tenant_id, id)
            .await?
            .ok_or(AppError::ResourceNotFound("cost"))
    }

    pub async fn create(&self, tenant_id: Uuid, user_id: Uuid, input: &CostInput) -> Result<Cost, AppError> {
        self.check_links(tenant_id, input).await?;
        self.cost_repo.create(&self.pool, tenant_id, input, user_id).await
    }

    /// Custo lançado pelo app: o motorista é sempre o próprio usuário.
    pub async fn create_for_driver(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        driver_id: Uuid,
        input: &CostInput,
    ) -> Result<Cost, AppError> {
        if let Some(order_id) = input.order_id {
            if !self
                .order_repo
                .is_assigned_to_driver(&self.pool, tenant_id, order_id, driver_id)
                .await?
            {
                return Err(AppError::ResourceNotFound("order"));
            }
        }

        let input = CostInput { driver_id: Some(driver_id), ..input.clone() };
        self.create(tenant_id, user_id, &input).await
    }

    pub async fn update(&self, tenant_id: Uuid, id: Uuid, input: &CostInput) -> Result<Cost, AppError> {
        self.check_links(tenant_id, input).await?;
        self.cost_repo
            .update(&self.pool, tenant_id, id, input)
            .await?
            .ok_or(AppError::ResourceNotFound("cost"))
    }

    pub async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        if !self.cost_repo.delete(&self.pool, tenant_id, id).await? {
            return Err(AppError::ResourceNotFound("cost"));
        }
        Ok(())
    }

    // Cada vínculo opcional precisa existir na mesma empresa
    async fn check_links(&self, tenant_id: Uuid, input: &CostInput) -> Result<(), AppError> {
        if let Some(id) = input.vehicle_id {
            self.fleet_repo
                .find_vehicle(&self.pool, tenant_id, id)
                .await?
                .ok_or(AppError::ResourceNotFound("vehicle"))?;
        }
        if let Some(id) = input.driver_id {
            self.driver_repo
                .find_by_id(&self.pool, tenant_id, id)
                .await?
                .ok_or(AppError::ResourceNotFound("driver"))?;
        }
        if let Some(id) = input.order_id {
            self.order_repo
                .find_by_id(&self.pool, tenant_id, id)
                .await?
                .ok_or(AppError::ResourceNotFound("order"))?;
        }
        Ok(())
    }
}

pub fn check_range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<(), AppError> {
    match (from, to) {
        (Some(from), Some(to)) if from > to => Err(AppError::InvalidInput("invalid_date_range")),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reversed_range_is_rejected() {
        let early = NaiveDate::from_ymd_opt(2024, 1, 1);
        let late = NaiveDate::from_ymd_opt(2024, 1, 31);
        assert!(check_range(early, late).is_ok());
        assert!(check_range(early, early).is_ok());
        assert!(check_range(None, late).is_ok());
        assert!(matches!(check_range(late, early), Err(AppError::InvalidInput("invalid_date_range"))));
    }
}
