// src/services/catalog.rs

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::{IntoParams, ToSchema};

use crate::{
    common::{
        error::AppError,
        pagination::{Page, PageRequest, SortOrder},
    },
    db::{
        store::{Collection, Filter, Query, Sort, TextSearch},
        Document,
    },
    models::{
        auth::SubscriptionPlan,
        furniture::Furniture,
        template::{Difficulty, Template, TemplateCategory, TemplateStyle},
    },
    services::subscription,
};

// ---
// 1. Allow-lists (parâmetro público -> caminho no documento)
// ---

const FURNITURE_SORTS: &[(&str, &str)] = &[
    ("popularity", "popularity"),
    ("price", "price.retail"),
    ("rating", "rating.average"),
    ("name", "name"),
    ("createdAt", "createdAt"),
];

const TEMPLATE_SORTS: &[(&str, &str)] = &[
    ("popularity", "usageCount"),
    ("rating", "rating.average"),
    ("name", "name"),
    ("createdAt", "createdAt"),
];

const FURNITURE_TEXT_FIELDS: &[&str] = &["name", "description", "brand", "tags", "category"];
const TEMPLATE_TEXT_FIELDS: &[&str] = &["name", "description", "tags"];

/// Resolve `sortBy`/`sortOrder` contra a allow-list.
/// Sem `sortBy`, vale a primeira entrada da lista; sem `sortOrder`, desc.
pub fn resolve_sort(
    sort_by: Option<&str>,
    order: Option<SortOrder>,
    allowed: &[(&str, &str)],
) -> Result<Sort, AppError> {
    let key = sort_by.or_else(|| allowed.first().map(|(name, _)| *name)).unwrap_or_default();
    let (_, field) = allowed
        .iter()
        .find(|(name, _)| *name == key)
        .ok_or_else(|| {
            let names: Vec<&str> = allowed.iter().map(|(name, _)| *name).collect();
            AppError::invalid_field("sortBy", format!("Use um de: {}.", names.join(", ")))
        })?;
    Ok(Sort {
        field: field.to_string(),
        direction: order.unwrap_or_default().into(),
    })
}

fn text_search(term: Option<&str>, fields: &[&str]) -> Option<TextSearch> {
    let term = term.map(str::trim).filter(|t| !t.is_empty())?;
    Some(TextSearch {
        term: term.to_string(),
        fields: fields.iter().map(|f| f.to_string()).collect(),
    })
}

// Listas separadas por vírgula na query string (?tags=a,b)
fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|r| {
        r.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

// ---
// Listagens curtas (destaques, tendências) e busca simples
// ---

pub const DEFAULT_LISTING_SIZE: u64 = 10;
pub const MAX_LISTING_SIZE: u64 = 50;

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListingQuery {
    pub limit: Option<i64>,
}

impl ListingQuery {
    pub fn limit(&self) -> u64 {
        self.limit
            .map(|l| l.clamp(1, MAX_LISTING_SIZE as i64) as u64)
            .unwrap_or(DEFAULT_LISTING_SIZE)
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Termo de busca (obrigatório)
    pub q: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl SearchQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }

    pub fn term(&self) -> Result<&str, AppError> {
        self.q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| AppError::invalid_field("q", "Informe um termo de busca."))
    }
}

pub fn active() -> Filter {
    Filter::eq("isActive", json!(true))
}

// ---
// 2. Resultado paginado + facets
// ---

#[derive(Debug, Serialize)]
pub struct CatalogPage<T: Serialize, F: Serialize> {
    #[serde(flatten)]
    pub page: Page<T>,
    pub facets: F,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FurnitureFacets {
    pub categories: Vec<String>,
    pub subcategories: Vec<String>,
    pub brands: Vec<String>,
    pub styles: Vec<String>,
    pub materials: Vec<String>,
    pub colors: Vec<String>,
    pub tags: Vec<String>,
    pub price_range: Option<NumericRange>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TemplateFacets {
    pub categories: Vec<String>,
    pub styles: Vec<String>,
    pub difficulties: Vec<String>,
    pub subscriptions: Vec<String>,
    pub area_range: Option<NumericRange>,
}

async fn distinct_strings<D: Document>(
    collection: &Collection<D>,
    field: &str,
) -> Result<Vec<String>, AppError> {
    Ok(collection
        .distinct(&active(), field)
        .await?
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(s),
            _ => None,
        })
        .collect())
}

// Campo dentro de um array de objetos (ex: "colors" -> "hex")
async fn distinct_nested<D: Document>(
    collection: &Collection<D>,
    array_field: &str,
    key: &str,
) -> Result<Vec<String>, AppError> {
    let mut values: Vec<String> = Vec::new();
    for item in collection.distinct(&active(), array_field).await? {
        if let Some(Value::String(s)) = item.get(key) {
            if !values.contains(s) {
                values.push(s.clone());
            }
        }
    }
    values.sort();
    Ok(values)
}

async fn range_of<D: Document>(
    collection: &Collection<D>,
    field: &str,
) -> Result<Option<NumericRange>, AppError> {
    Ok(collection
        .numeric_range(&active(), field)
        .await?
        .map(|(min, max)| NumericRange { min, max }))
}

/// Facets sobre todo o catálogo ativo, independentes da página/filtro atual.
pub async fn furniture_facets(collection: &Collection<Furniture>) -> Result<FurnitureFacets, AppError> {
    Ok(FurnitureFacets {
        categories: distinct_strings(collection, "category").await?,
        subcategories: distinct_strings(collection, "subcategory").await?,
        brands: distinct_strings(collection, "brand").await?,
        styles: distinct_strings(collection, "style").await?,
        materials: distinct_strings(collection, "materials").await?,
        colors: distinct_nested(collection, "colors", "hex").await?,
        tags: distinct_strings(collection, "tags").await?,
        price_range: range_of(collection, "price.retail").await?,
    })
}

pub async fn template_facets(collection: &Collection<Template>) -> Result<TemplateFacets, AppError> {
    Ok(TemplateFacets {
        categories: distinct_strings(collection, "category").await?,
        styles: distinct_strings(collection, "style").await?,
        difficulties: distinct_strings(collection, "difficulty").await?,
        subscriptions: distinct_strings(collection, "requirements.subscription").await?,
        area_range: range_of(collection, "dimensions.area").await?,
    })
}

// ---
// 3. Query de móveis
// ---

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct FurnitureQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub brand: Option<String>,
    pub style: Option<String>,
    pub in_stock: Option<bool>,
    pub featured: Option<bool>,
    /// Lista separada por vírgulas
    pub tags: Option<String>,
    pub materials: Option<String>,
    /// Hex separados por vírgulas (ex: `#ffffff,#000000`)
    pub colors: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
}

impl FurnitureQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }

    pub fn filter(&self) -> Result<Filter, AppError> {
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err(AppError::invalid_field(
                    "minPrice",
                    "O preço mínimo não pode ser maior que o máximo.",
                ));
            }
        }

        let mut filter = active();
        if let Some(category) = &self.category {
            filter = filter.and(Filter::eq("category", json!(category)));
        }
        if let Some(subcategory) = &self.subcategory {
            filter = filter.and(Filter::ilike("subcategory", subcategory));
        }
        if self.min_price.is_some() || self.max_price.is_some() {
            filter = filter.and(Filter::range("price.retail", self.min_price, self.max_price));
        }
        if let Some(brand) = &self.brand {
            filter = filter.and(Filter::ilike("brand", brand));
        }
        if let Some(style) = &self.style {
            filter = filter.and(Filter::eq("style", json!(style)));
        }
        if let Some(in_stock) = self.in_stock {
            filter = filter.and(Filter::eq("availability.inStock", json!(in_stock)));
        }
        if let Some(featured) = self.featured {
            filter = filter.and(Filter::eq("isFeatured", json!(featured)));
        }

        let tags = split_list(self.tags.as_deref());
        if !tags.is_empty() {
            filter = filter.and(Filter::contains_any("tags", tags.into_iter().map(Value::String)));
        }
        let materials = split_list(self.materials.as_deref());
        if !materials.is_empty() {
            filter = filter.and(Filter::contains_any(
                "materials",
                materials.into_iter().map(Value::String),
            ));
        }
        let colors = split_list(self.colors.as_deref());
        if !colors.is_empty() {
            filter = filter.and(Filter::contains_any(
                "colors",
                colors.into_iter().map(|hex| json!({ "hex": hex.to_lowercase() })),
            ));
        }
        Ok(filter)
    }

    pub fn to_query(&self) -> Result<Query, AppError> {
        let sort = resolve_sort(self.sort_by.as_deref(), self.sort_order, FURNITURE_SORTS)?;
        Ok(Query::new(self.filter()?)
            .text(text_search(self.search.as_deref(), FURNITURE_TEXT_FIELDS))
            .sort(sort))
    }
}

// ---
// 4. Query de templates (sempre cruzada com os planos visíveis)
// ---

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TemplateQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub category: Option<TemplateCategory>,
    pub style: Option<TemplateStyle>,
    pub difficulty: Option<Difficulty>,
    pub subscription: Option<SubscriptionPlan>,
    pub min_area: Option<f64>,
    pub max_area: Option<f64>,
    pub featured: Option<bool>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
}

impl TemplateQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }

    pub fn filter(&self, plan: SubscriptionPlan) -> Filter {
        let tiers = subscription::visible_tiers(plan)
            .into_iter()
            .map(|tier| json!(tier))
            .collect();

        let mut filter = active().and(Filter::In("requirements.subscription".into(), tiers));
        if let Some(category) = self.category {
            filter = filter.and(Filter::eq("category", json!(category)));
        }
        if let Some(style) = self.style {
            filter = filter.and(Filter::eq("style", json!(style)));
        }
        if let Some(difficulty) = self.difficulty {
            filter = filter.and(Filter::eq("difficulty", json!(difficulty)));
        }
        if let Some(tier) = self.subscription {
            filter = filter.and(Filter::eq("requirements.subscription", json!(tier)));
        }
        if self.min_area.is_some() || self.max_area.is_some() {
            filter = filter.and(Filter::range("dimensions.area", self.min_area, self.max_area));
        }
        if let Some(featured) = self.featured {
            filter = filter.and(Filter::eq("isFeatured", json!(featured)));
        }
        filter
    }

    pub fn to_query(&self, plan: SubscriptionPlan) -> Result<Query, AppError> {
        let sort = resolve_sort(self.sort_by.as_deref(), self.sort_order, TEMPLATE_SORTS)?;
        Ok(Query::new(self.filter(plan))
            .text(text_search(self.search.as_deref(), TEMPLATE_TEXT_FIELDS))
            .sort(sort))
    }
}
