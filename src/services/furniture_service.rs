// src/services/furniture_service.rs

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{Page, PageRequest},
    },
    db::{store::Filter, FurnitureRepository, Query, Sort},
    models::furniture::{Furniture, FurnitureDetail, RatingAggregate},
    services::catalog::{self, CatalogPage, FurnitureFacets, FurnitureQuery},
};

const SIMILAR_ITEMS: u64 = 4;

#[derive(Clone)]
pub struct FurnitureService {
    furniture: FurnitureRepository,
}

impl FurnitureService {
    pub fn new(furniture: FurnitureRepository) -> Self {
        Self { furniture }
    }

    /// Só itens ativos existem para a API.
    async fn load_active(&self, id: Uuid) -> Result<Furniture, AppError> {
        self.furniture
            .find_by_id(id)
            .await?
            .filter(|item| item.is_active)
            .ok_or_else(|| AppError::NotFound("Móvel".into()))
    }

    pub async fn list_page(&self, query: &FurnitureQuery) -> Result<Page<Furniture>, AppError> {
        self.furniture.find_page(query.to_query()?, query.page_request()).await
    }

    pub async fn list(
        &self,
        query: &FurnitureQuery,
    ) -> Result<CatalogPage<Furniture, FurnitureFacets>, AppError> {
        let page = self.list_page(query).await?;
        let facets = catalog::furniture_facets(self.furniture.collection()).await?;
        Ok(CatalogPage { page, facets })
    }

    pub async fn featured(&self, limit: u64) -> Result<Vec<Furniture>, AppError> {
        let q = Query::new(catalog::active().and(Filter::eq("isFeatured", json!(true))))
            .sort(Sort::desc("popularity"))
            .limit(limit);
        self.furniture.find(&q).await
    }

    pub async fn trending(&self, limit: u64) -> Result<Vec<Furniture>, AppError> {
        let q = Query::new(catalog::active())
            .sort(Sort::desc("popularity"))
            .sort(Sort::desc("rating.average"))
            .limit(limit);
        self.furniture.find(&q).await
    }

    pub async fn search(&self, term: &str, page: PageRequest) -> Result<Page<Furniture>, AppError> {
        let query = FurnitureQuery {
            search: Some(term.to_string()),
            ..Default::default()
        };
        self.furniture.find_page(query.to_query()?, page).await
    }

    /// Detalhe do item: conta popularidade e traz até 4 itens da mesma categoria.
    pub async fn get(&self, id: Uuid) -> Result<FurnitureDetail, AppError> {
        let mut item = self.load_active(id).await?;
        if self.furniture.increment_popularity(id).await? {
            item.popularity += 1;
        }

        let similar_filter = catalog::active()
            .and(Filter::eq("category", json!(item.category)))
            .and(Filter::Not(Box::new(Filter::eq("id", json!(item.id)))));
        let similar = self
            .furniture
            .find(
                &Query::new(similar_filter)
                    .sort(Sort::desc("popularity"))
                    .limit(SIMILAR_ITEMS),
            )
            .await?;

        Ok(FurnitureDetail {
            current_price: item.price.current(Utc::now()),
            furniture: item,
            similar,
        })
    }

    pub async fn rate(&self, id: Uuid, rating: u8) -> Result<RatingAggregate, AppError> {
        let mut item = self.load_active(id).await?;
        item.rating.add(rating);
        self.furniture.save(&mut item).await?;
        Ok(item.rating)
    }
}
