// src/services/settings_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, validation::normalize_nip},
    db::SettingsRepository,
    models::settings::{TenantSettings, UpdateSettingsRequest},
};

fn normalize(mut input: UpdateSettingsRequest) -> UpdateSettingsRequest {
    input.nip = input.nip.as_deref().map(normalize_nip).filter(|n| !n.is_empty());
    input.order_prefix = input.order_prefix.map(|p| p.trim().to_uppercase());
    input.invoice_prefix = input.invoice_prefix.map(|p| p.trim().to_uppercase());
    input.bank_account = input.bank_account.map(|a| a.trim().to_string());
    input
}

#[derive(Clone)]
pub struct SettingsService {
    repo: SettingsRepository,
    pool: PgPool,
}

impl SettingsService {
    pub fn new(repo: SettingsRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    pub async fn get(&self, tenant_id: Uuid) -> Result<TenantSettings, AppError> {
        self.repo.get(tenant_id).await
    }

    pub async fn update(&self, tenant_id: Uuid, input: UpdateSettingsRequest) -> Result<TenantSettings, AppError> {
        let input = normalize(input);
        let settings = self.repo.update_settings(&self.pool, tenant_id, &input).await?;
        tracing::info!("⚙️ Perfil da empresa {} atualizado", tenant_id);
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nip_and_prefixes_are_normalized() {
        let input = normalize(UpdateSettingsRequest {
            company_name: None,
            nip: Some("526-000-12-46".into()),
            address: None,
            phone: None,
            email: None,
            bank_name: None,
            bank_account: None,
            order_prefix: Some(" zl ".into()),
            invoice_prefix: Some("fv".into()),
            default_payment_term_days: None,
        });
        assert_eq!(input.nip.as_deref(), Some("5260001246"));
        assert_eq!(input.order_prefix.as_deref(), Some("ZL"));
        assert_eq!(input.invoice_prefix.as_deref(), Some("FV"));
    }
}
