// src/config.rs

use std::{env, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{anyhow, Context};
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{
        ContractorRepository, CostRepository, DashboardRepository, DocumentRepository,
        DriverRepository, FleetRepository, InvoiceRepository, NoteRepository, OrderRepository,
        SettingsRepository, TenantRepository, UserRepository,
    },
    services::{
        auth::AuthService, contractor_service::ContractorService, cost_service::CostService,
        dashboard_service::DashboardService, document_service::DocumentService,
        driver_service::DriverService, export_service::ExportService,
        fleet_service::FleetService, import_service::ImportService,
        invoice_service::InvoiceService, note_service::NoteService,
        order_service::OrderService, settings_service::SettingsService,
        user_service::UserService,
    },
};

/// Configuração lida do ambiente (.env) no startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub upload_dir: PathBuf,
    pub fonts_dir: PathBuf,
    pub token_ttl_hours: i64,
    pub max_upload_mb: usize,
    pub db_max_connections: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Monta a configuração a partir de qualquer fonte de chave/valor.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow!("{key} deve ser definida"))
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            upload_dir: lookup("UPLOAD_DIR").unwrap_or_else(|| "./uploads".to_string()).into(),
            fonts_dir: lookup("FONTS_DIR").unwrap_or_else(|| "./fonts".to_string()).into(),
            token_ttl_hours: parse_or(&lookup, "TOKEN_TTL_HOURS", 168)?,
            max_upload_mb: parse_or(&lookup, "MAX_UPLOAD_MB", 20)?,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 5)?,
        })
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().with_context(|| format!("{key} inválida: {raw}")),
        None => Ok(default),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<Config>,
    pub i18n_store: Arc<I18nStore>,

    pub auth_service: AuthService,
    pub user_service: UserService,
    pub driver_service: DriverService,
    pub fleet_service: FleetService,
    pub contractor_service: ContractorService,
    pub order_service: OrderService,
    pub invoice_service: InvoiceService,
    pub cost_service: CostService,
    pub document_service: DocumentService,
    pub note_service: NoteService,
    pub dashboard_service: DashboardService,
    pub settings_service: SettingsService,
    pub export_service: ExportService,
    pub import_service: ImportService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await?;

        tracing::info!("✅ Połączenie z bazą danych nawiązane!");

        Self::with_pool(config, db_pool)
    }

    // --- Monta o gráfico de dependências ---
    pub fn with_pool(config: Config, db_pool: PgPool) -> anyhow::Result<Self> {
        let config = Arc::new(config);
        let i18n_store = Arc::new(I18nStore::new()?);

        let tenant_repo = TenantRepository::new(db_pool.clone());
        let user_repo = UserRepository::new(db_pool.clone());
        let settings_repo = SettingsRepository::new(db_pool.clone());
        let driver_repo = DriverRepository::new(db_pool.clone());
        let fleet_repo = FleetRepository::new(db_pool.clone());
        let contractor_repo = ContractorRepository::new(db_pool.clone());
        let order_repo = OrderRepository::new(db_pool.clone());
        let invoice_repo = InvoiceRepository::new(db_pool.clone());
        let cost_repo = CostRepository::new(db_pool.clone());
        let document_repo = DocumentRepository::new(db_pool.clone());
        let note_repo = NoteRepository::new(db_pool.clone());
        let dashboard_repo = DashboardRepository::new(db_pool.clone());

        let auth_service = AuthService::new(
            user_repo.clone(),
            tenant_repo.clone(),
            settings_repo.clone(),
            config.jwt_secret.clone(),
            config.token_ttl_hours,
            db_pool.clone(),
        );
        let user_service = UserService::new(user_repo.clone(), driver_repo.clone(), db_pool.clone());
        let driver_service = DriverService::new(driver_repo.clone(), order_repo.clone(), db_pool.clone());
        let fleet_service = FleetService::new(fleet_repo.clone(), order_repo.clone(), db_pool.clone());
        let contractor_service =
            ContractorService::new(contractor_repo.clone(), order_repo.clone(), db_pool.clone());
        let order_service = OrderService::new(
            order_repo.clone(),
            contractor_repo.clone(),
            driver_repo.clone(),
            fleet_repo.clone(),
            settings_repo.clone(),
            tenant_repo.clone(),
            db_pool.clone(),
        );
        let invoice_service = InvoiceService::new(
            invoice_repo.clone(),
            order_repo.clone(),
            contractor_repo.clone(),
            settings_repo.clone(),
            tenant_repo.clone(),
            db_pool.clone(),
        );
        let cost_service = CostService::new(
            cost_repo.clone(),
            driver_repo.clone(),
            fleet_repo.clone(),
            order_repo.clone(),
            db_pool.clone(),
        );
        let document_service = DocumentService::new(
            document_repo,
            order_repo.clone(),
            invoice_repo.clone(),
            contractor_repo.clone(),
            driver_repo.clone(),
            fleet_repo.clone(),
            settings_repo.clone(),
            config.clone(),
            db_pool.clone(),
        );
        let note_service = NoteService::new(note_repo, db_pool.clone());
        let dashboard_service = DashboardService::new(dashboard_repo);
        let settings_service = SettingsService::new(settings_repo, db_pool.clone());
        let export_service = ExportService::new(
            order_repo,
            cost_repo,
            invoice_repo,
            driver_repo.clone(),
            fleet_repo.clone(),
            contractor_repo.clone(),
        );
        let import_service = ImportService::new(driver_repo, fleet_repo, contractor_repo, db_pool.clone());

        Ok(Self {
            db_pool,
            config,
            i18n_store,
            auth_service,
            user_service,
            driver_service,
            fleet_service,
            contractor_service,
            order_service,
            invoice_service,
            cost_service,
            document_service,
            note_service,
            dashboard_service,
            settings_service,
            export_service,
            import_service,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_applied() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/tms"),
            ("JWT_SECRET", "sekret"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.upload_dir, PathBuf::from("./uploads"));
        assert_eq!(config.token_ttl_hours, 168);
        assert_eq!(config.max_upload_bytes(), 20 * 1024 * 1024);
        assert_eq!(config.db_max_connections, 5);
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/tms")]))
            .unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn malformed_number_is_an_error() {
        let result = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/tms"),
            ("JWT_SECRET", "sekret"),
            ("MAX_UPLOAD_MB", "dużo"),
        ]));
        assert!(result.is_err());
    }
}
