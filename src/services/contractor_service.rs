// src/services/contractor_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{PageRequest, Paginated},
    },
    db::{ContractorRepository, OrderRepository},
    models::contractors::{Contractor, ContractorInput, ContractorListQuery},
};

#[derive(Clone)]
pub struct ContractorService {
    contractor_repo: ContractorRepository,
    order_repo: OrderRepository,
    pool: PgPool,
}

impl ContractorService {
    pub fn new(contractor_repo: ContractorRepository, order_repo: OrderRepository, pool: PgPool) -> Self {
        Self { contractor_repo, order_repo, pool }
    }

    pub async fn list(&self, tenant_id: Uuid, query: &ContractorListQuery) -> Result<Paginated<Contractor>, AppError> {
        let page = PageRequest::new(query.page, query.per_page);
        let (items, total) = self.contractor_repo.list(tenant_id, query, page).await?;
        Ok(Paginated::new(items, total, page))
    }

    pub async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<Contractor, AppError> {
        self.contractor_repo
            .find_by_id(&self.pool, tenant_id, id)
            .await?
            .ok_or(AppError::ResourceNotFound("contractor"))
    }

    pub async fn create(&self, tenant_id: Uuid, input: &ContractorInput) -> Result<Contractor, AppError> {
        let contractor = self.contractor_repo.create(&self.pool, tenant_id, input).await?;
        tracing::info!("🤝 Contratante {} cadastrado", contractor.id);
        Ok(contractor)
    }

    pub async fn update(&self, tenant_id: Uuid, id: Uuid, input: &ContractorInput) -> Result<Contractor, AppError> {
        self.contractor_repo
            .update(&self.pool, tenant_id, id, input)
            .await?
            .ok_or(AppError::ResourceNotFound("contractor"))
    }

    pub async fn deactivate(&self, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        if self.order_repo.contractor_has_active_orders(&mut *tx, tenant_id, id).await? {
            return Err(AppError::HasActiveOrders("contractor"));
        }
        if !self.contractor_repo.set_active(&mut *tx, tenant_id, id, false).await? {
            return Err(AppError::ResourceNotFound("contractor"));
        }

        tx.commit().await?;
        Ok(())
    }
}
