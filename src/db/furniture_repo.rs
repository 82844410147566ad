// src/db/furniture_repo.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{Page, PageRequest},
    },
    db::store::{Collection, DocumentStore, Query},
    models::furniture::Furniture,
};

#[derive(Clone)]
pub struct FurnitureRepository {
    furniture: Collection<Furniture>,
}

impl FurnitureRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            furniture: Collection::new(store),
        }
    }

    pub fn collection(&self) -> &Collection<Furniture> {
        &self.furniture
    }

    pub async fn create(&self, item: &Furniture) -> Result<(), AppError> {
        self.furniture.insert(item).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Furniture>, AppError> {
        self.furniture.find_by_id(id).await
    }

    pub async fn save(&self, item: &mut Furniture) -> Result<(), AppError> {
        item.updated_at = chrono::Utc::now();
        if !self.furniture.replace(item).await? {
            return Err(AppError::NotFound("Móvel".into()));
        }
        Ok(())
    }

    pub async fn find(&self, query: &Query) -> Result<Vec<Furniture>, AppError> {
        self.furniture.find(query).await
    }

    pub async fn find_page(&self, query: Query, page: PageRequest) -> Result<Page<Furniture>, AppError> {
        self.furniture.find_page(query, page).await
    }

    pub async fn increment_popularity(&self, id: Uuid) -> Result<bool, AppError> {
        self.furniture.increment(id, "popularity", 1).await
    }
}
