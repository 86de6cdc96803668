// src/middleware/rbac.rs

use std::marker::PhantomData;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::{unauthorized, AuthenticatedUser},
        i18n::Locale,
    },
    models::auth::UserRole,
};

/// 1. O Trait que define uma regra de acesso (conjunto de papéis permitidos)
pub trait RoleGuard: Send + Sync + 'static {
    fn allowed() -> &'static [UserRole];

    fn permits(role: UserRole) -> bool {
        Self::allowed().contains(&role)
    }
}

/// 2. O Extractor (Guardião)
pub struct RequireRole<G>(pub PhantomData<G>);

impl<G, S> FromRequestParts<S> for RequireRole<G>
where
    G: RoleGuard,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(AuthenticatedUser(user)) = parts.extensions.get::<AuthenticatedUser>() else {
            return Err(unauthorized(parts, state));
        };

        if !G::permits(user.role) {
            tracing::debug!("⛔ Usuário {} ({:?}) barrado pela regra de acesso", user.id, user.role);
            let app_state = AppState::from_ref(state);
            return Err(AppError::Forbidden.to_api_error(&Locale::from_headers(&parts.headers), &app_state.i18n_store));
        }

        Ok(RequireRole(PhantomData))
    }
}

// ---
// REGRAS DE ACESSO (TIPOS)
// ---

pub struct AdminOnly;
impl RoleGuard for AdminOnly {
    fn allowed() -> &'static [UserRole] { &[UserRole::Admin] }
}

/// Expedição: frota, contratantes, pedidos e import.
pub struct Dispatch;
impl RoleGuard for Dispatch {
    fn allowed() -> &'static [UserRole] { &[UserRole::Admin, UserRole::Manager] }
}

/// Contabilidade: escrita de faturas.
pub struct Accounting;
impl RoleGuard for Accounting {
    fn allowed() -> &'static [UserRole] { &[UserRole::Admin, UserRole::Accountant] }
}

/// Escritório: leituras, custos, documentos, notas, export e dashboard.
pub struct Office;
impl RoleGuard for Office {
    fn allowed() -> &'static [UserRole] { &[UserRole::Admin, UserRole::Manager, UserRole::Accountant] }
}

pub struct DriverOnly;
impl RoleGuard for DriverOnly {
    fn allowed() -> &'static [UserRole] { &[UserRole::Driver] }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drivers_stay_out_of_the_office() {
        assert!(!Office::permits(UserRole::Driver));
        assert!(!Dispatch::permits(UserRole::Driver));
        assert!(DriverOnly::permits(UserRole::Driver));
        assert!(!DriverOnly::permits(UserRole::Admin));
    }

    #[test]
    fn accountants_write_invoices_but_not_orders() {
        assert!(Accounting::permits(UserRole::Accountant));
        assert!(!Dispatch::permits(UserRole::Accountant));
        assert!(Office::permits(UserRole::Accountant));
    }

    #[test]
    fn only_admins_manage_users() {
        assert!(AdminOnly::permits(UserRole::Admin));
        assert!(!AdminOnly::permits(UserRole::Manager));
        assert!(Dispatch::permits(UserRole::Manager));
    }
}
