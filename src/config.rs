// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::{anyhow, Context};
use chrono::FixedOffset;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::{
        clock::{parse_utc_offset, Clock, LocalClock},
        i18n::I18nStore,
    },
    db::{
        CustomerRepository, DeliveryRepository, DriverRepository, PaymentRepository, ReportRepository,
        UserRepository, WoodTypeRepository,
    },
    models::registry::WoodPriceRule,
    services::{
        auth::AuthService, delivery_service::DeliveryService, document_service::DocumentService,
        payment_service::PaymentService, registry_service::RegistryService, report_service::ReportService,
    },
};

/// Configuração lida do ambiente (.env incluso).
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub utc_offset: FixedOffset,
    pub fonts_dir: String,
    pub font_family: String,
    pub company_name: String,
    pub wood_price_rule: WoodPriceRule,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database_url = get("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = get("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let db_max_connections = match get("DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| anyhow!("DB_MAX_CONNECTIONS inválido: {}", raw))?,
            None => 5,
        };

        let utc_offset = match get("APP_UTC_OFFSET") {
            Some(raw) => parse_utc_offset(&raw).ok_or_else(|| anyhow!("APP_UTC_OFFSET inválido: {}", raw))?,
            None => FixedOffset::west_opt(3 * 3600).context("offset padrão")?,
        };

        let wood_price_rule = match get("WOOD_PRICE_RULE") {
            Some(raw) => WoodPriceRule::parse(&raw).ok_or_else(|| anyhow!("WOOD_PRICE_RULE inválido: {}", raw))?,
            None => WoodPriceRule::default(),
        };

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            db_max_connections,
            utc_offset,
            fonts_dir: get("FONTS_DIR").unwrap_or_else(|| "./fonts".to_string()),
            font_family: get("FONT_FAMILY").unwrap_or_else(|| "Roboto".to_string()),
            company_name: get("COMPANY_NAME").unwrap_or_else(|| "MADEIREIRA".to_string()),
            wood_price_rule,
            admin_email: get("ADMIN_EMAIL"),
            admin_password: get("ADMIN_PASSWORD"),
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub settings: Arc<Settings>,
    pub i18n_store: I18nStore,
    pub auth_service: AuthService,
    pub registry_service: RegistryService,
    pub delivery_service: DeliveryService,
    pub payment_service: PaymentService,
    pub report_service: ReportService,
    pub document_service: DocumentService,
}

impl AppState {
    pub async fn new(settings: Settings) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(settings.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&settings.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let clock: Arc<dyn Clock> = Arc::new(LocalClock::new(settings.utc_offset));
        Ok(Self::with_pool(db_pool, settings, clock))
    }

    /// Monta o gráfico de dependências sobre um pool já criado.
    pub fn with_pool(db_pool: PgPool, settings: Settings, clock: Arc<dyn Clock>) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let customer_repo = CustomerRepository::new(db_pool.clone());
        let wood_repo = WoodTypeRepository::new(db_pool.clone());
        let driver_repo = DriverRepository::new(db_pool.clone());
        let delivery_repo = DeliveryRepository::new(db_pool.clone());
        let payment_repo = PaymentRepository::new(db_pool.clone());
        let report_repo = ReportRepository::new(db_pool.clone());

        let auth_service = AuthService::new(user_repo, settings.jwt_secret.clone());
        let registry_service = RegistryService::new(
            customer_repo.clone(),
            wood_repo.clone(),
            driver_repo.clone(),
            settings.wood_price_rule,
        );
        let delivery_service =
            DeliveryService::new(delivery_repo, customer_repo.clone(), wood_repo, driver_repo, clock.clone());
        let payment_service = PaymentService::new(payment_repo, customer_repo.clone(), clock.clone());
        let report_service = ReportService::new(report_repo, customer_repo, clock);
        let document_service = DocumentService::new(
            settings.fonts_dir.clone(),
            settings.font_family.clone(),
            settings.company_name.clone(),
        );

        Self {
            db_pool,
            settings: Arc::new(settings),
            i18n_store: I18nStore::new(),
            auth_service,
            registry_service,
            delivery_service,
            payment_service,
            report_service,
            document_service,
        }
    }
}

#[cfg(test)]
impl AppState {
    /// Estado completo sobre o banco de um `#[sqlx::test]`, com "hoje" em 10/03/2025.
    pub(crate) fn for_tests(db_pool: PgPool) -> Self {
        use crate::common::clock::FixedClock;

        let settings = Settings::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://localhost/madeireira_test".into()),
            "JWT_SECRET" => Some("segredo-de-teste".into()),
            _ => None,
        })
        .unwrap();
        let today = chrono::NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        Self::with_pool(db_pool, settings, Arc::new(FixedClock(today)))
    }

    /// Operador gravado direto (sem bcrypt), para preencher `created_by`.
    pub(crate) async fn test_operator(&self) -> uuid::Uuid {
        UserRepository::new(self.db_pool.clone())
            .create_user(&self.db_pool, "operador@madeireira.com", "sem-hash", None, true)
            .await
            .unwrap()
            .id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply() {
        let settings =
            Settings::from_lookup(lookup(&[("DATABASE_URL", "postgres://x"), ("JWT_SECRET", "s")])).unwrap();
        assert_eq!(settings.bind_addr, "0.0.0.0:3000");
        assert_eq!(settings.db_max_connections, 5);
        assert_eq!(settings.utc_offset.local_minus_utc(), -3 * 3600);
        assert_eq!(settings.wood_price_rule, WoodPriceRule::FreightBelowNormal);
        assert_eq!(settings.fonts_dir, "./fonts");
        assert!(settings.admin_email.is_none());
    }

    #[test]
    fn required_variables_are_enforced() {
        assert!(Settings::from_lookup(lookup(&[("JWT_SECRET", "s")])).is_err());
        assert!(Settings::from_lookup(lookup(&[("DATABASE_URL", "postgres://x"), ("JWT_SECRET", "  ")])).is_err());
    }

    #[test]
    fn overrides_are_parsed() {
        let settings = Settings::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "s"),
            ("DB_MAX_CONNECTIONS", "12"),
            ("APP_UTC_OFFSET", "+01:00"),
            ("WOOD_PRICE_RULE", "unchecked"),
            ("ADMIN_EMAIL", "admin@madeireira.com"),
        ]))
        .unwrap();
        assert_eq!(settings.db_max_connections, 12);
        assert_eq!(settings.utc_offset.local_minus_utc(), 3600);
        assert_eq!(settings.wood_price_rule, WoodPriceRule::Unchecked);
        assert_eq!(settings.admin_email.as_deref(), Some("admin@madeireira.com"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let base = [("DATABASE_URL", "postgres://x"), ("JWT_SECRET", "s")];
        for (key, value) in [("DB_MAX_CONNECTIONS", "0"), ("APP_UTC_OFFSET", "3h"), ("WOOD_PRICE_RULE", "x")] {
            let mut pairs = base.to_vec();
            pairs.push((key, value));
            assert!(Settings::from_lookup(lookup(&pairs)).is_err(), "{key}={value}");
        }
    }
}
