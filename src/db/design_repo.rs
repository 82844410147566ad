// src/db/design_repo.rs

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{Page, PageRequest},
    },
    db::store::{Collection, DocumentStore, Filter, Query, Sort},
    models::design::Design,
};

#[derive(Clone)]
pub struct DesignRepository {
    designs: Collection<Design>,
}

impl DesignRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            designs: Collection::new(store),
        }
    }

    pub fn project_filter(project_id: Uuid) -> Filter {
        Filter::eq("project", json!(project_id))
    }

    // Os metadados derivados são recalculados em toda gravação (hook "pre-save")
    pub async fn create(&self, design: &mut Design) -> Result<(), AppError> {
        design.recompute_metadata();
        self.designs.insert(design).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Design>, AppError> {
        self.designs.find_by_id(id).await
    }

    pub async fn save(&self, design: &mut Design) -> Result<(), AppError> {
        design.recompute_metadata();
        design.version += 1;
        design.updated_at = Utc::now();
        if !self.designs.replace(design).await? {
            return Err(AppError::NotFound("Design".into()));
        }
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        self.designs.delete(id).await
    }

    pub async fn delete_by_project(&self, project_id: Uuid) -> Result<u64, AppError> {
        self.designs.delete_many(&Self::project_filter(project_id)).await
    }

    pub async fn find_by_project(&self, project_id: Uuid) -> Result<Vec<Design>, AppError> {
        let query = Query::new(Self::project_filter(project_id)).sort(Sort::asc("createdAt"));
        self.designs.find(&query).await
    }

    pub async fn count_by_project(&self, project_id: Uuid) -> Result<u64, AppError> {
        self.designs.count(&Self::project_filter(project_id)).await
    }

    pub async fn find_page(&self, query: Query, page: PageRequest) -> Result<Page<Design>, AppError> {
        self.designs.find_page(query, page).await
    }
}
