// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{
        DesignRepository, DocumentStore, FurnitureRepository, MemoryDocumentStore, PgDocumentStore,
        ProjectRepository, TemplateRepository, UserRepository,
    },
    services::{
        auth::AuthService,
        design_service::DesignService,
        furniture_service::FurnitureService,
        layout_assistant::{CatalogLayoutAssistant, LayoutAssistant},
        project_service::ProjectService,
        template_service::TemplateService,
    },
};

// Configuração lida do ambiente (com `.env` opcional)
#[derive(Debug, Clone)]
pub struct Config {
    pub app_env: String,
    pub bind_addr: String,
    // Sem DATABASE_URL, usamos o armazenamento em memória
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_expires_in_days: i64,
    pub bcrypt_cost: u32,
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("{} inválida ({}): {}", name, raw, e)),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            app_env: env::var("APP_ENV").unwrap_or_else(|_| "production".to_string()),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            database_max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 5)?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?,
            jwt_expires_in_days: parse_var("JWT_EXPIRES_IN_DAYS", 7)?,
            bcrypt_cost: parse_var("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
        })
    }

    pub fn is_development(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("development")
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db_pool: Option<PgPool>,
    pub store: Arc<dyn DocumentStore>,
    pub auth_service: AuthService,
    pub project_service: ProjectService,
    pub design_service: DesignService,
    pub template_service: TemplateService,
    pub furniture_service: FurnitureService,
    pub layout_assistant: Arc<dyn LayoutAssistant>,
}

impl AppState {
    // Conecta ao Postgres quando configurado; senão, memória
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let Some(database_url) = config.database_url.clone() else {
            tracing::warn!("DATABASE_URL ausente: usando armazenamento em memória (dados não persistem)");
            return Ok(Self::with_store(config, MemoryDocumentStore::new_shared(), None));
        };

        let db_pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let store: Arc<dyn DocumentStore> = Arc::new(PgDocumentStore::new(db_pool.clone()));
        Ok(Self::with_store(config, store, Some(db_pool)))
    }

    /// Monta o gráfico de dependências sobre um armazenamento já pronto.
    pub fn with_store(config: Config, store: Arc<dyn DocumentStore>, db_pool: Option<PgPool>) -> Self {
        let user_repo = UserRepository::new(store.clone());
        let project_repo = ProjectRepository::new(store.clone());
        let design_repo = DesignRepository::new(store.clone());
        let template_repo = TemplateRepository::new(store.clone());
        let furniture_repo = FurnitureRepository::new(store.clone());

        let auth_service = AuthService::new(
            user_repo.clone(),
            config.jwt_secret.clone(),
            config.jwt_expires_in_days,
        )
        .with_bcrypt_cost(config.bcrypt_cost);
        let project_service = ProjectService::new(project_repo.clone(), design_repo.clone(), user_repo);
        let design_service = DesignService::new(design_repo, project_repo);
        let template_service = TemplateService::new(template_repo, design_service.clone());
        let furniture_service = FurnitureService::new(furniture_repo.clone());
        let layout_assistant: Arc<dyn LayoutAssistant> = Arc::new(CatalogLayoutAssistant::new(furniture_repo));

        Self {
            config: Arc::new(config),
            db_pool,
            store,
            auth_service,
            project_service,
            design_service,
            template_service,
            furniture_service,
            layout_assistant,
        }
    }
}
