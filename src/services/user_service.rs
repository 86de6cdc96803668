// src/services/user_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{PageRequest, Paginated},
    },
    db::{user_repo::NewUser, DriverRepository, UserRepository},
    models::{
        auth::{User, UserRole},
        users::{CreateUserPayload, UpdateUserPayload, UserListQuery},
    },
    services::auth::hash_password,
};

#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    driver_repo: DriverRepository,
    pool: PgPool,
}

impl UserService {
    pub fn new(user_repo: UserRepository, driver_repo: DriverRepository, pool: PgPool) -> Self {
        Self { user_repo, driver_repo, pool }
    }

    pub async fn list(&self, tenant_id: Uuid, query: &UserListQuery) -> Result<Paginated<User>, AppError> {
        let page = PageRequest::new(query.page, query.per_page);
        let (items, total) = self.user_repo.list(tenant_id, query, page).await?;
        Ok(Paginated::new(items, total, page))
    }

    pub async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<User, AppError> {
        self.user_repo
            .find_in_tenant(&self.pool, tenant_id, id)
            .await?
            .ok_or(AppError::ResourceNotFound("user"))
    }

    pub async fn create(&self, tenant_id: Uuid, payload: &CreateUserPayload) -> Result<User, AppError> {
        let driver_id = self.resolve_driver_link(tenant_id, payload.role, payload.driver_id).await?;
        let hashed = hash_password(&payload.password).await?;

        let user = self
            .user_repo
            .create_user(
                &self.pool,
                NewUser {
                    tenant_id,
                    email: payload.email.trim(),
                    password_hash: &hashed,
                    first_name: payload.first_name.trim(),
                    last_name: payload.last_name.trim(),
                    role: payload.role,
                    driver_id,
                },
            )
            .await?;

        tracing::info!("👤 Usuário {} criado com papel {:?}", user.id, user.role);
        Ok(user)
    }

    pub async fn update(
        &self,
        tenant_id: Uuid,
        current_user_id: Uuid,
        id: Uuid,
        payload: &UpdateUserPayload,
    ) -> Result<User, AppError> {
        let existing = self.get(tenant_id, id).await?;
        let is_active = payload.is_active.unwrap_or(existing.is_active);

        if id == current_user_id {
            if !is_active {
                return Err(AppError::StateConflict("self_deactivation"));
            }
            // O administrador não pode rebaixar a si mesmo
            if existing.role == UserRole::Admin && payload.role != UserRole::Admin {
                return Err(AppError::StateConflict("self_role_change"));
            }
        }

        let driver_id = self.resolve_driver_link(tenant_id, payload.role, payload.driver_id).await?;

        self.user_repo
            .update_user(
                &self.pool,
                tenant_id,
                id,
                payload.first_name.trim(),
                payload.last_name.trim(),
                payload.role,
                driver_id,
                is_active,
            )
            .await?
            .ok_or(AppError::ResourceNotFound("user"))
    }

    pub async fn deactivate(&self, tenant_id: Uuid, current_user_id: Uuid, id: Uuid) -> Result<(), AppError> {
        if id == current_user_id {
            return Err(AppError::StateConflict("self_deactivation"));
        }
        if !self.user_repo.set_active(&self.pool, tenant_id, id, false).await? {
            return Err(AppError::ResourceNotFound("user"));
        }
        Ok(())
    }

    /// Conta de motorista precisa apontar para um motorista da mesma empresa;
    /// os demais papéis não carregam vínculo.
    async fn resolve_driver_link(
        &self,
        tenant_id: Uuid,
        role: UserRole,
        driver_id: Option<Uuid>,
    ) -> Result<Option<Uuid>, AppError> {
        if role != UserRole::Driver {
            return Ok(None);
        }
        let driver_id = driver_id.ok_or(AppError::InvalidInput("driver_link_required"))?;
        self.driver_repo
            .find_by_id(&self.pool, tenant_id, driver_id)
            .await?
            .ok_or(AppError::InvalidInput("driver_link_required"))?;
        Ok(Some(driver_id))
    }
}
