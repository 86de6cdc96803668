// src/db/fleet_repo.rs

use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{
        error::{map_unique_violation, AppError},
        pagination::PageRequest,
        validation::normalize_registration,
    },
    db::Counted,
    models::fleet::{
        Trailer, TrailerInput, TrailerListQuery, Vehicle, VehicleInput, VehicleListQuery, VehicleStatus,
    },
};

const VEHICLE_COLUMNS: &str = r#"
    id, tenant_id, registration_number, brand, model, production_year, vin, vehicle_type,
    status, mileage_km, insurance_expiry, inspection_expiry, notes, is_active, created_at, updated_at
"#;

const TRAILER_COLUMNS: &str = r#"
    id, tenant_id, registration_number, trailer_type, capacity_kg, volume_m3,
    insurance_expiry, inspection_expiry, notes, is_active, created_at, updated_at
"#;

fn map_vehicle_conflict(e: sqlx::Error) -> AppError {
    map_unique_violation(e, |constraint| match constraint {
        "vehicles_tenant_registration_key" => {
            Some(AppError::UniqueConstraintViolation("vehicle_registration"))
        }
        _ => None,
    })
}

fn map_trailer_conflict(e: sqlx::Error) -> AppError {
    map_unique_violation(e, |constraint| match constraint {
        "trailers_tenant_registration_key" => {
            Some(AppError::UniqueConstraintViolation("trailer_registration"))
        }
        _ => None,
    })
}

#[derive(Clone)]
pub struct FleetRepository {
    pool: PgPool,
}

impl FleetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  POJAZDY
    // =========================================================================

    pub async fn list_vehicles(
        &self,
        tenant_id: Uuid,
        filter: &VehicleListQuery,
        page: PageRequest,
    ) -> Result<(Vec<Vehicle>, i64), AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {VEHICLE_COLUMNS}, COUNT(*) OVER() AS total_count FROM vehicles WHERE "
        ));
        Self::push_vehicle_filters(&mut qb, tenant_id, filter);

        qb.push(" ORDER BY registration_number LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = qb.build_query_as::<Counted<Vehicle>>().fetch_all(&self.pool).await?;
        Counted::split_or_recount(rows, page, &self.pool, || {
            let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM vehicles WHERE ");
            Self::push_vehicle_filters(&mut count, tenant_id, filter);
            count
        })
        .await
    }

    fn push_vehicle_filters(qb: &mut QueryBuilder<'_, Postgres>, tenant_id: Uuid, filter: &VehicleListQuery) {
        qb.push("tenant_id = ").push_bind(tenant_id);

        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{search}%");
            qb.push(" AND (registration_number ILIKE ")
                .push_bind(format!("%{}%", normalize_registration(search)))
                .push(" OR brand ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR model ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR vin ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status);
        }
        if let Some(vehicle_type) = filter.vehicle_type {
            qb.push(" AND vehicle_type = ").push_bind(vehicle_type);
        }
        if let Some(active) = filter.is_active {
            qb.push(" AND is_active = ").push_bind(active);
        }
    }

    pub async fn list_all_vehicles(&self, tenant_id: Uuid) -> Result<Vec<Vehicle>, AppError> {
        let vehicles = sqlx::query_as::<_, Vehicle>(&format!(
            "SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE tenant_id = $1 ORDER BY is_active DESC, registration_number"
        ))
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(vehicles)
    }

    pub async fn find_vehicle<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<Option<Vehicle>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let vehicle = sqlx::query_as::<_, Vehicle>(&format!(
            "SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE tenant_id = $1 AND id = $2"
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(vehicle)
    }

    pub async fn create_vehicle<'e, E>(&self, executor: E, tenant_id: Uuid, input: &VehicleInput) -> Result<Vehicle, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Vehicle>(&format!(
            r#"
            INSERT INTO vehicles (
                tenant_id, registration_number, brand, model, production_year, vin, vehicle_type,
                status, mileage_km, insurance_expiry, inspection_expiry, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {VEHICLE_COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .bind(normalize_registration(&input.registration_number))
        .bind(input.brand.trim())
        .bind(input.model.trim())
        .bind(input.production_year)
        .bind(input.vin.as_deref().map(str::to_uppercase))
        .bind(input.vehicle_type)
        .bind(input.status.unwrap_or(VehicleStatus::Available))
        .bind(input.mileage_km.unwrap_or(0))
        .bind(input.insurance_expiry)
        .bind(input.inspection_expiry)
        .bind(&input.notes)
        .fetch_one(executor)
        .await
        .map_err(map_vehicle_conflict)
    }

    pub async fn update_vehicle<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        input: &VehicleInput,
    ) -> Result<Option<Vehicle>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Vehicle>(&format!(
            r#"
            UPDATE vehicles SET
                registration_number = $3, brand = $4, model = $5, production_year = $6, vin = $7,
                vehicle_type = $8, status = COALESCE($9, status), mileage_km = COALESCE($10, mileage_km),
                insurance_expiry = $11, inspection_expiry = $12, notes = $13, updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING {VEHICLE_COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .bind(id)
        .bind(normalize_registration(&input.registration_number))
        .bind(input.brand.trim())
        .bind(input.model.trim())
        .bind(input.production_year)
        .bind(input.vin.as_deref().map(str::to_uppercase))
        .bind(input.vehicle_type)
        .bind(input.status)
        .bind(input.mileage_km)
        .bind(input.insurance_expiry)
        .bind(input.inspection_expiry)
        .bind(&input.notes)
        .fetch_optional(executor)
        .await
        .map_err(map_vehicle_conflict)
    }

    pub async fn set_vehicle_active<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid, is_active: bool) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE vehicles SET is_active = $3, updated_at = NOW() WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(id)
        .bind(is_active)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_vehicle_status<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        ids: &[Uuid],
        status: VehicleStatus,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            "UPDATE vehicles SET status = $3, updated_at = NOW() WHERE tenant_id = $1 AND id = ANY($2)",
        )
        .bind(tenant_id)
        .bind(ids)
        .bind(status)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    // =========================================================================
    //  NACZEPY
    // =========================================================================

    pub async fn list_trailers(
        &self,
        tenant_id: Uuid,
        filter: &TrailerListQuery,
        page: PageRequest,
    ) -> Result<(Vec<Trailer>, i64), AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {TRAILER_COLUMNS}, COUNT(*) OVER() AS total_count FROM trailers WHERE "
        ));
        Self::push_trailer_filters(&mut qb, tenant_id, filter);

        qb.push(" ORDER BY registration_number LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = qb.build_query_as::<Counted<Trailer>>().fetch_all(&self.pool).await?;
        Counted::split_or_recount(rows, page, &self.pool, || {
            let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM trailers WHERE ");
            Self::push_trailer_filters(&mut count, tenant_id, filter);
            count
        })
        .await
    }

    fn push_trailer_filters(qb: &mut QueryBuilder<'_, Postgres>, tenant_id: Uuid, filter: &TrailerListQuery) {
        qb.push("tenant_id = ").push_bind(tenant_id);

        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            qb.push(" AND (registration_number ILIKE ")
                .push_bind(format!("%{}%", normalize_registration(search)))
                .push(" OR notes ILIKE ")
                .push_bind(format!("%{search}%"))
                .push(")");
        }
        if let Some(trailer_type) = filter.trailer_type {
            qb.push(" AND trailer_type = ").push_bind(trailer_type);
        }
        if let Some(active) = filter.is_active {
            qb.push(" AND is_active = ").push_bind(active);
        }
    }

    pub async fn list_all_trailers(&self, tenant_id: Uuid) -> Result<Vec<Trailer>, AppError> {
        let trailers = sqlx::query_as::<_, Trailer>(&format!(
            "SELECT {TRAILER_COLUMNS} FROM trailers WHERE tenant_id = $1 ORDER BY is_active DESC, registration_number"
        ))
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(trailers)
    }

    pub async fn find_trailer<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<Option<Trailer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let trailer = sqlx::query_as::<_, Trailer>(&format!(
            "SELECT {TRAILER_COLUMNS} FROM trailers WHERE tenant_id = $1 AND id = $2"
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(trailer)
    }

    pub async fn create_trailer<'e, E>(&self, executor: E, tenant_id: Uuid, input: &TrailerInput) -> Result<Trailer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Trailer>(&format!(
            r#"
            INSERT INTO trailers (
                tenant_id, registration_number, trailer_type, capacity_kg, volume_m3,
                insurance_expiry, inspection_expiry, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {TRAILER_COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .bind(normalize_registration(&input.registration_number))
        .bind(input.trailer_type)
        .bind(input.capacity_kg)
        .bind(input.volume_m3)
        .bind(input.insurance_expiry)
        .bind(input.inspection_expiry)
        .bind(&input.notes)
        .fetch_one(executor)
        .await
        .map_err(map_trailer_conflict)
    }

    pub async fn update_trailer<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        input: &TrailerInput,
    ) -> Result<Option<Trailer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Trailer>(&format!(
            r#"
            UPDATE trailers SET
                registration_number = $3, trailer_type = $4, capacity_kg = $5, volume_m3 = $6,
                insurance_expiry = $7, inspection_expiry = $8, notes = $9, updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING {TRAILER_COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .bind(id)
        .bind(normalize_registration(&input.registration_number))
        .bind(input.trailer_type)
        .bind(input.capacity_kg)
        .bind(input.volume_m3)
        .bind(input.insurance_expiry)
        .bind(input.inspection_expiry)
        .bind(&input.notes)
        .fetch_optional(executor)
        .await
        .map_err(map_trailer_conflict)
    }

    pub async fn set_trailer_active<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid, is_active: bool) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE trailers SET is_active = $3, updated_at = NOW() WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(id)
        .bind(is_active)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
