// src/models/template.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::db::store::Document;
use crate::models::auth::SubscriptionPlan;
use crate::models::design::{Design, PlacedFurniture, Room, Wall, WindowElement};
use crate::models::furniture::RatingAggregate;
use crate::models::geometry::Vector3;

// --- ENUMS de classificação ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TemplateCategory {
    LivingRoom,
    Bedroom,
    Kitchen,
    Bathroom,
    DiningRoom,
    Office,
    Outdoor,
    Studio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TemplateStyle {
    Modern,
    Contemporary,
    Minimalist,
    Scandinavian,
    Industrial,
    Traditional,
    Bohemian,
    Rustic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

// --- SUB-DOCUMENTOS ---

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRequirements {
    // Plano mínimo para ver/usar o template
    pub subscription: SubscriptionPlan,
    pub min_area: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
pub struct TemplateDimensions {
    pub width: f64,
    pub length: f64,
    pub area: f64,
}

/// Móvel embutido no template, referenciando um item do catálogo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TemplateFurniture {
    pub furniture: Uuid,
    pub name: String,
    pub category: Option<String>,
    pub price: Decimal,
    pub position: Vector3,
    pub rotation: Vector3,
    pub scale: Vector3,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TemplateMetadata {
    pub furniture_count: u32,
    pub wall_count: u32,
    pub window_count: u32,
    pub estimated_cost: Decimal,
}

// --- O TEMPLATE ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: TemplateCategory,
    pub style: TemplateStyle,
    pub difficulty: Difficulty,
    pub requirements: TemplateRequirements,
    pub dimensions: TemplateDimensions,

    pub walls: Vec<Wall>,
    pub windows: Vec<WindowElement>,
    pub rooms: Vec<Room>,
    pub furniture: Vec<TemplateFurniture>,
    pub metadata: TemplateMetadata,

    pub rating: RatingAggregate,
    pub usage_count: u64,
    pub is_featured: bool,
    pub is_active: bool,
    pub tags: Vec<String>,
    pub thumbnail: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for Template {
    const COLLECTION: &'static str = "templates";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Template {
    pub fn new(
        name: &str,
        category: TemplateCategory,
        style: TemplateStyle,
        difficulty: Difficulty,
        subscription: SubscriptionPlan,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            category,
            style,
            difficulty,
            requirements: TemplateRequirements { subscription, min_area: None },
            dimensions: TemplateDimensions::default(),
            walls: Vec::new(),
            windows: Vec::new(),
            rooms: Vec::new(),
            furniture: Vec::new(),
            metadata: TemplateMetadata::default(),
            rating: RatingAggregate::default(),
            usage_count: 0,
            is_featured: false,
            is_active: true,
            tags: Vec::new(),
            thumbnail: None,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Contagens derivadas das coleções embutidas; rodar antes de gravar.
    pub fn recompute_metadata(&mut self) {
        self.metadata = TemplateMetadata {
            furniture_count: self.furniture.len() as u32,
            wall_count: self.walls.len() as u32,
            window_count: self.windows.len() as u32,
            estimated_cost: self.furniture.iter().map(|f| f.price).sum(),
        };
    }

    /// Materializa um novo Design com cópia (snapshot) da estrutura.
    /// O design não guarda referência ao template.
    pub fn to_design(
        &self,
        project: Uuid,
        created_by: Uuid,
        name: Option<String>,
        now: DateTime<Utc>,
    ) -> Design {
        let mut design = Design::new(project, created_by, name.unwrap_or_else(|| self.name.clone()), now);
        design.description = self.description.clone();
        design.elements.walls = self.walls.clone();
        design.elements.windows = self.windows.clone();
        design.elements.rooms = self.rooms.clone();
        design.furniture = self
            .furniture
            .iter()
            .map(|f| PlacedFurniture {
                id: Uuid::new_v4().simple().to_string(),
                furniture_id: Some(f.furniture),
                name: f.name.clone(),
                category: f.category.clone(),
                price: f.price,
                position: f.position,
                rotation: f.rotation,
                scale: f.scale,
                color: None,
                material: None,
                layer: None,
                custom_properties: Default::default(),
            })
            .collect();
        design.tags = self.tags.clone();
        design.recompute_metadata();
        design
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UseTemplatePayload {
    pub project_id: Uuid,

    #[validate(length(min = 1, max = 100, message = "O nome deve ter entre 1 e 100 caracteres."))]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::geometry::Point2D;

    fn template() -> Template {
        let mut t = Template::new(
            "Sala Nórdica",
            TemplateCategory::LivingRoom,
            TemplateStyle::Scandinavian,
            Difficulty::Beginner,
            SubscriptionPlan::Pro,
            Utc::now(),
        );
        t.walls = vec![Wall {
            id: "w1".into(),
            points: vec![Point2D::new(0.0, 0.0), Point2D::new(4.0, 0.0)],
            thickness: 0.15,
            height: 2.8,
            material: None,
        }];
        t.rooms = vec![Room {
            id: "r1".into(),
            name: Some("Sala".into()),
            points: vec![
                Point2D::new(0.0, 0.0),
                Point2D::new(4.0, 0.0),
                Point2D::new(4.0, 3.0),
                Point2D::new(0.0, 3.0),
            ],
            floor_material: None,
        }];
        t.furniture = vec![TemplateFurniture {
            furniture: Uuid::new_v4(),
            name: "Sofá".into(),
            category: Some("sofa".into()),
            price: Decimal::new(1500, 0),
            position: Vector3::new(2.0, 0.0, 1.0),
            rotation: Vector3::default(),
            scale: Vector3::one(),
        }];
        t
    }

    #[test]
    fn metadata_counts_embedded_collections() {
        let mut t = template();
        t.recompute_metadata();
        assert_eq!(t.metadata.furniture_count, 1);
        assert_eq!(t.metadata.wall_count, 1);
        assert_eq!(t.metadata.window_count, 0);
        assert_eq!(t.metadata.estimated_cost, Decimal::new(1500, 0));
    }

    #[test]
    fn instantiation_is_a_snapshot() {
        let t = template();
        let project = Uuid::new_v4();
        let user = Uuid::new_v4();
        let design = t.to_design(project, user, None, Utc::now());

        assert_eq!(design.project, project);
        assert_eq!(design.name, "Sala Nórdica");
        assert_eq!(design.elements.walls, t.walls);
        assert_eq!(design.furniture.len(), 1);
        assert_eq!(design.furniture[0].furniture_id, Some(t.furniture[0].furniture));
        assert_eq!(design.metadata.total_area, 12.0);
        assert_eq!(design.metadata.total_cost, Decimal::new(1500, 0));
    }
}
