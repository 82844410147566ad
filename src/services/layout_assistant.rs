// src/services/layout_assistant.rs

use std::collections::HashSet;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{FurnitureRepository, Query, Sort},
    models::{
        design::{Design, PlacedFurniture},
        geometry::{polygon_area, vertex_centroid, Point2D, Vector3},
    },
    services::catalog,
};

/// Uma sugestão de posicionamento vinda do assistente.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSuggestion {
    pub furniture_id: Uuid,
    pub name: String,
    pub category: String,
    pub price: Decimal,
    pub position: Vector3,
    pub rotation: Vector3,
    pub reason: String,
}

impl LayoutSuggestion {
    pub fn into_placed(self) -> PlacedFurniture {
        PlacedFurniture {
            id: Uuid::new_v4().simple().to_string(),
            furniture_id: Some(self.furniture_id),
            name: self.name,
            category: Some(self.category),
            price: self.price,
            position: self.position,
            rotation: self.rotation,
            scale: Vector3::one(),
            color: None,
            material: None,
            layer: None,
            custom_properties: Default::default(),
        }
    }
}

/// Colaborador gerativo. Só o contrato importa; a heurística é livre.
#[async_trait]
pub trait LayoutAssistant: Send + Sync + 'static {
    async fn suggest(&self, design: &Design, max: usize) -> Result<Vec<LayoutSuggestion>, AppError>;
}

/// Implementação determinística sobre o catálogo: itens ativos mais populares
/// que ainda não estão no design, enfileirados a partir do centro do maior cômodo.
#[derive(Clone)]
pub struct CatalogLayoutAssistant {
    furniture: FurnitureRepository,
}

const SPACING: f64 = 1.0;

impl CatalogLayoutAssistant {
    pub fn new(furniture: FurnitureRepository) -> Self {
        Self { furniture }
    }

    fn anchor(design: &Design) -> Point2D {
        design
            .elements
            .rooms
            .iter()
            .max_by(|a, b| polygon_area(&a.points).total_cmp(&polygon_area(&b.points)))
            .and_then(|room| vertex_centroid(&room.points))
            .unwrap_or_default()
    }
}

#[async_trait]
impl LayoutAssistant for CatalogLayoutAssistant {
    async fn suggest(&self, design: &Design, max: usize) -> Result<Vec<LayoutSuggestion>, AppError> {
        let placed: HashSet<Uuid> = design.furniture.iter().filter_map(|f| f.furniture_id).collect();
        let anchor = Self::anchor(design);

        // Busca um pouco além do limite para compensar os já posicionados
        let candidates = self
            .furniture
            .find(
                &Query::new(catalog::active())
                    .sort(Sort::desc("popularity"))
                    .limit((max + placed.len()) as u64),
            )
            .await?;

        Ok(candidates
            .into_iter()
            .filter(|item| !placed.contains(&item.id))
            .take(max)
            .enumerate()
            .map(|(i, item)| {
                let offset = (i as f64 - (max as f64 - 1.0) / 2.0) * SPACING;
                LayoutSuggestion {
                    furniture_id: item.id,
                    price: item.price.retail,
                    position: Vector3::new(anchor.x + offset, 0.0, anchor.y),
                    rotation: Vector3::default(),
                    reason: format!("Popular na categoria '{}'", item.category),
                    name: item.name,
                    category: item.category,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::MemoryDocumentStore,
        models::{design::Room, furniture::Furniture},
    };
    use chrono::Utc;

    #[tokio::test]
    async fn suggests_missing_items_around_the_largest_room() {
        let repo = FurnitureRepository::new(MemoryDocumentStore::new_shared());
        let mut ids = Vec::new();
        for (name, popularity) in [("Sofá", 30), ("Mesa", 20), ("Luminária", 10)] {
            let mut item = Furniture::new(name, "sala", Decimal::new(100, 0), Utc::now());
            item.popularity = popularity;
            repo.create(&item).await.unwrap();
            ids.push(item.id);
        }

        let mut design = Design::new(Uuid::new_v4(), Uuid::new_v4(), "Sala".into(), Utc::now());
        design.elements.rooms = vec![
            Room {
                id: "pequeno".into(),
                name: None,
                points: vec![Point2D::new(0.0, 0.0), Point2D::new(1.0, 0.0), Point2D::new(1.0, 1.0)],
                floor_material: None,
            },
            Room {
                id: "grande".into(),
                name: None,
                points: vec![
                    Point2D::new(10.0, 10.0),
                    Point2D::new(14.0, 10.0),
                    Point2D::new(14.0, 13.0),
                    Point2D::new(10.0, 13.0),
                ],
                floor_material: None,
            },
        ];
        let mut existing = LayoutSuggestion {
            furniture_id: ids[0],
            name: "Sofá".into(),
            category: "sala".into(),
            price: Decimal::new(100, 0),
            position: Vector3::default(),
            rotation: Vector3::default(),
            reason: String::new(),
        }
        .into_placed();
        existing.layer = Some("default".into());
        design.furniture.push(existing);

        let assistant = CatalogLayoutAssistant::new(repo);
        let suggestions = assistant.suggest(&design, 2).await.unwrap();

        let names: Vec<&str> = suggestions.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Mesa", "Luminária"]);
        assert_eq!(suggestions[0].position, Vector3::new(11.5, 0.0, 11.5));
        assert_eq!(suggestions[1].position, Vector3::new(12.5, 0.0, 11.5));
    }
}
