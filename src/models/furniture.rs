// src/models/furniture.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::db::store::Document;

// --- Agregado de avaliações (média corrente + contagem) ---

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingAggregate {
    pub average: f64,
    pub count: u64,
}

impl RatingAggregate {
    /// Média corrente: (média * n + nova) / (n + 1)
    pub fn add(&mut self, rating: u8) {
        let total = self.average * self.count as f64 + f64::from(rating);
        self.count += 1;
        self.average = total / self.count as f64;
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RatePayload {
    #[validate(range(min = 1, max = 5, message = "A nota deve estar entre 1 e 5."))]
    pub rating: u8,
}

// --- Preço (varejo + janela de promoção) ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pricing {
    pub retail: Decimal,
    pub sale: Option<Decimal>,
    pub sale_start: Option<DateTime<Utc>>,
    pub sale_end: Option<DateTime<Utc>>,
    pub currency: String,
}

impl Pricing {
    pub fn new(retail: Decimal) -> Self {
        Self {
            retail,
            sale: None,
            sale_start: None,
            sale_end: None,
            currency: "USD".to_string(),
        }
    }

    /// Preço de promoção dentro da janela; fora dela, o de varejo.
    pub fn current(&self, now: DateTime<Utc>) -> Decimal {
        match self.sale {
            Some(sale)
                if self.sale_start.is_none_or(|start| now >= start)
                    && self.sale_end.is_none_or(|end| now <= end) =>
            {
                sale
            }
            _ => self.retail,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
pub struct Dimensions {
    pub width: f64,
    pub depth: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ColorOption {
    pub name: String,
    // Hex em minúsculas, ex: "#1a2b3c"
    pub hex: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub in_stock: bool,
    pub lead_time_days: Option<u32>,
}

impl Default for Availability {
    fn default() -> Self {
        Self { in_stock: true, lead_time_days: None }
    }
}

// --- O item do catálogo ---
// Não tem dono: qualquer um lê quando `is_active`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Furniture {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub subcategory: Option<String>,
    pub brand: Option<String>,
    pub style: Option<String>,

    pub price: Pricing,
    pub dimensions: Dimensions,
    pub materials: Vec<String>,
    pub colors: Vec<ColorOption>,
    pub tags: Vec<String>,
    pub availability: Availability,

    pub is_featured: bool,
    pub is_active: bool,
    pub rating: RatingAggregate,
    pub popularity: u64,

    pub model_url: Option<String>,
    pub thumbnail: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for Furniture {
    const COLLECTION: &'static str = "furniture";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Furniture {
    pub fn new(name: &str, category: &str, retail: Decimal, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            category: category.to_string(),
            subcategory: None,
            brand: None,
            style: None,
            price: Pricing::new(retail),
            dimensions: Dimensions::default(),
            materials: Vec::new(),
            colors: Vec::new(),
            tags: Vec::new(),
            availability: Availability::default(),
            is_featured: false,
            is_active: true,
            rating: RatingAggregate::default(),
            popularity: 0,
            model_url: None,
            thumbnail: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Detalhe de um item + itens parecidos (mesma categoria).
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FurnitureDetail {
    pub furniture: Furniture,
    pub current_price: Decimal,
    pub similar: Vec<Furniture>,
}
