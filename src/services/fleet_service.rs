// src/services/fleet_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{PageRequest, Paginated},
    },
    db::{FleetRepository, OrderRepository},
    models::{
        fleet::{Trailer, TrailerInput, TrailerListQuery, Vehicle, VehicleInput, VehicleListQuery, VehicleStatus},
        orders::ResourceKind,
    },
};

#[derive(Clone)]
pub struct FleetService {
    fleet_repo: FleetRepository,
    order_repo: OrderRepository,
    pool: PgPool,
}

impl FleetService {
    pub fn new(fleet_repo: FleetRepository, order_repo: OrderRepository, pool: PgPool) -> Self {
        Self { fleet_repo, order_repo, pool }
    }

    // --- Veículos ---

    pub async fn list_vehicles(&self, tenant_id: Uuid, query: &VehicleListQuery) -> Result<Paginated<Vehicle>, AppError> {
        let page = PageRequest::new(query.page, query.per_page);
        let (items, total) = self.fleet_repo.list_vehicles(tenant_id, query, page).await?;
        Ok(Paginated::new(items, total, page))
    }

    pub async fn get_vehicle(&self, tenant_id: Uuid, id: Uuid) -> Result<Vehicle, AppError> {
        self.fleet_repo
            .find_vehicle(&self.pool, tenant_id, id)
            .await?
            .ok_or(AppError::ResourceNotFound("vehicle"))
    }

    pub async fn create_vehicle(&self, tenant_id: Uuid, input: &VehicleInput) -> Result<Vehicle, AppError> {
        let vehicle = self.fleet_repo.create_vehicle(&self.pool, tenant_id, input).await?;
        tracing::info!("🚛 Veículo {} cadastrado", vehicle.registration_number);
        Ok(vehicle)
    }

    pub async fn update_vehicle(&self, tenant_id: Uuid, id: Uuid, input: &VehicleInput) -> Result<Vehicle, AppError> {
        let mut tx = self.pool.begin().await?;

        // Veículo em rota não pode ser mandado para oficina pelo formulário
        if let Some(status) = input.status {
            if status != VehicleStatus::InUse
                && self
                    .order_repo
                    .resource_has_active_orders(&mut *tx, tenant_id, ResourceKind::Vehicle, id)
                    .await?
            {
                return Err(AppError::HasActiveOrders("vehicle"));
            }
        }

        let vehicle = self
            .fleet_repo
            .update_vehicle(&mut *tx, tenant_id, id, input)
            .await?
            .ok_or(AppError::ResourceNotFound("vehicle"))?;

        tx.commit().await?;
        Ok(vehicle)
    }

    pub async fn deactivate_vehicle(&self, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        if self
            .order_repo
            .resource_has_active_orders(&mut *tx, tenant_id, ResourceKind::Vehicle, id)
            .await?
        {
            return Err(AppError::HasActiveOrders("vehicle"));
        }
        if !self.fleet_repo.set_vehicle_active(&mut *tx, tenant_id, id, false).await? {
            return Err(AppError::ResourceNotFound("vehicle"));
        }

        tx.commit().await?;
        Ok(())
    }

    // --- Reboques ---

    pub async fn list_trailers(&self, tenant_id: Uuid, query: &TrailerListQuery) -> Result<Paginated<Trailer>, AppError> {
        let page = PageRequest::new(query.page, query.per_page);
        let (items, total) = self.fleet_repo.list_trailers(tenant_id, query, page).await?;
        Ok(Paginated::new(items, total, page))
    }

    pub async fn get_trailer(&self, tenant_id: Uuid, id: Uuid) -> Result<Trailer, AppError> {
        self.fleet_repo
            .find_trailer(&self.pool, tenant_id, id)
            .await?
            .ok_or(AppError::ResourceNotFound("trailer"))
    }

    pub async fn create_trailer(&self, tenant_id: Uuid, input: &TrailerInput) -> Result<Trailer, AppError> {
        self.fleet_repo.create_trailer(&self.pool, tenant_id, input).await
    }

    pub async fn update_trailer(&self, tenant_id: Uuid, id: Uuid, input: &TrailerInput) -> Result<Trailer, AppError> {
        self.fleet_repo
            .update_trailer(&self.pool, tenant_id, id, input)
            .await?
            .ok_or(AppError::ResourceNotFound("trailer"))
    }

    pub async fn deactivate_trailer(&self, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        if self
            .order_repo
            .resource_has_active_orders(&mut *tx, tenant_id, ResourceKind::Trailer, id)
            .await?
        {
            return Err(AppError::HasActiveOrders("trailer"));
        }
        if !self.fleet_repo.set_trailer_active(&mut *tx, tenant_id, id, false).await? {
            return Err(AppError::ResourceNotFound("trailer"));
        }

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::fixtures;
    use axum::http::StatusCode;

    fn service(pool: &PgPool) -> FleetService {
        FleetService::new(FleetRepository::new(pool.clone()), OrderRepository::new(pool.clone()), pool.clone())
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn vehicle_on_an_active_order_cannot_be_deactivated(pool: PgPool) {
        let (tenant_id, _) = fixtures::tenant_with_admin(&pool).await;
        let contractor_id = fixtures::contractor(&pool, tenant_id).await;
        let busy = fixtures::vehicle(&pool, tenant_id, "WX12345").await;
        let idle = fixtures::vehicle(&pool, tenant_id, "WX54321").await;
        let order_id = fixtures::order(&pool, tenant_id, contractor_id, "IN_TRANSIT").await;
        fixtures::assign(&pool, tenant_id, order_id, "VEHICLE", busy).await;

        let fleet = service(&pool);
        let err = fleet.deactivate_vehicle(tenant_id, busy).await.unwrap_err();
        assert!(matches!(err, AppError::HasActiveOrders("vehicle")));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert!(fleet.get_vehicle(tenant_id, busy).await.unwrap().is_active);

        fleet.deactivate_vehicle(tenant_id, idle).await.unwrap();
        assert!(!fleet.get_vehicle(tenant_id, idle).await.unwrap().is_active);

        // Pedido encerrado libera o veículo
        sqlx::query("UPDATE orders SET status = 'COMPLETED' WHERE id = $1")
            .bind(order_id)
            .execute(&pool)
            .await
            .unwrap();
        fleet.deactivate_vehicle(tenant_id, busy).await.unwrap();
    }
}
