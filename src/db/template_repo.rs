// src/db/template_repo.rs

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{Page, PageRequest},
    },
    db::store::{Collection, DocumentStore, Query},
    models::template::Template,
};

#[derive(Clone)]
pub struct TemplateRepository {
    templates: Collection<Template>,
}

impl TemplateRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            templates: Collection::new(store),
        }
    }

    pub fn collection(&self) -> &Collection<Template> {
        &self.templates
    }

    pub async fn create(&self, template: &mut Template) -> Result<(), AppError> {
        template.recompute_metadata();
        self.templates.insert(template).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Template>, AppError> {
        self.templates.find_by_id(id).await
    }

    pub async fn save(&self, template: &mut Template) -> Result<(), AppError> {
        template.recompute_metadata();
        template.updated_at = Utc::now();
        if !self.templates.replace(template).await? {
            return Err(AppError::NotFound("Template".into()));
        }
        Ok(())
    }

    pub async fn find(&self, query: &Query) -> Result<Vec<Template>, AppError> {
        self.templates.find(query).await
    }

    pub async fn find_page(&self, query: Query, page: PageRequest) -> Result<Page<Template>, AppError> {
        self.templates.find_page(query, page).await
    }

    // Contador atômico: chamadas repetidas contam repetido
    pub async fn increment_usage(&self, id: Uuid) -> Result<bool, AppError> {
        self.templates.increment(id, "usageCount", 1).await
    }
}
