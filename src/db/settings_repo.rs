// src/db/settings_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::settings::{TenantSettings, UpdateSettingsRequest},
};

const SETTINGS_COLUMNS: &str = r#"
    tenant_id, company_name, nip, address, phone, email, bank_name, bank_account,
    order_prefix, invoice_prefix, default_payment_term_days, updated_at
"#;

#[derive(Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Sem linha salva = valores padrão (prefixos ZL/FV, prazo de 14 dias)
    pub async fn get_settings<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<TenantSettings, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let settings = sqlx::query_as::<_, TenantSettings>(&format!(
            "SELECT {SETTINGS_COLUMNS} FROM tenant_settings WHERE tenant_id = $1"
        ))
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;

        Ok(settings.unwrap_or_else(|| TenantSettings::defaults(tenant_id)))
    }

    pub async fn get(&self, tenant_id: Uuid) -> Result<TenantSettings, AppError> {
        self.get_settings(&self.pool, tenant_id).await
    }

    /// Linha inicial criada no registro da empresa.
    pub async fn create_initial<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        company_name: &str,
        nip: Option<&str>,
        email: &str,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO tenant_settings (tenant_id, company_name, nip, email)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (tenant_id) DO NOTHING
            "#,
        )
        .bind(tenant_id)
        .bind(company_name)
        .bind(nip)
        .bind(email)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn update_settings<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        input: &UpdateSettingsRequest,
    ) -> Result<TenantSettings, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // UPSERT (Insert or Update). Campos ausentes mantêm o valor atual.
        let settings = sqlx::query_as::<_, TenantSettings>(&format!(
            r#"
            INSERT INTO tenant_settings (
                tenant_id, company_name, nip, address, phone, email, bank_name, bank_account,
                order_prefix, invoice_prefix, default_payment_term_days
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8,
                    COALESCE($9, 'ZL'), COALESCE($10, 'FV'), COALESCE($11, 14))
            ON CONFLICT (tenant_id)
            DO UPDATE SET
                company_name = COALESCE(EXCLUDED.company_name, tenant_settings.company_name),
                nip = COALESCE(EXCLUDED.nip, tenant_settings.nip),
                address = COALESCE(EXCLUDED.address, tenant_settings.address),
                phone = COALESCE(EXCLUDED.phone, tenant_settings.phone),
                email = COALESCE(EXCLUDED.email, tenant_settings.email),
                bank_name = COALESCE(EXCLUDED.bank_name, tenant_settings.bank_name),
                bank_account = COALESCE(EXCLUDED.bank_account, tenant_settings.bank_account),
                order_prefix = COALESCE($9, tenant_settings.order_prefix),
                invoice_prefix = COALESCE($10, tenant_settings.invoice_prefix),
                default_payment_term_days = COALESCE($11, tenant_settings.default_payment_term_days),
                updated_at = NOW()
            RETURNING {SETTINGS_COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .bind(&input.company_name)
        .bind(&input.nip)
        .bind(&input.address)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.bank_name)
        .bind(&input.bank_account)
        .bind(&input.order_prefix)
        .bind(&input.invoice_prefix)
        .bind(input.default_payment_term_days)
        .fetch_one(executor)
        .await?;

        Ok(settings)
    }
}
