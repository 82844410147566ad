// src/models/design.rs

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::pagination::{PageRequest, SortOrder};
use crate::db::store::Document;
use crate::models::geometry::{polygon_area, Point2D, PropertyValue, Vector3};
use crate::models::project::{WorkflowStatus, INITIAL_VERSION};

// ---
// 1. Elementos estruturais (planta baixa)
// ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Wall {
    #[validate(length(min = 1, message = "O id da parede é obrigatório."))]
    pub id: String,
    #[validate(length(min = 2, message = "Uma parede precisa de pelo menos 2 pontos."))]
    pub points: Vec<Point2D>,
    #[serde(default = "default_wall_thickness")]
    pub thickness: f64,
    #[serde(default = "default_wall_height")]
    pub height: f64,
    pub material: Option<String>,
}

fn default_wall_thickness() -> f64 {
    0.15
}

fn default_wall_height() -> f64 {
    2.8
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    #[validate(length(min = 1, message = "O id do cômodo é obrigatório."))]
    pub id: String,
    pub name: Option<String>,
    pub points: Vec<Point2D>,
    pub floor_material: Option<String>,
}

/// Janela ancorada numa parede pelo id + posição paramétrica `t` em [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WindowElement {
    #[validate(length(min = 1, message = "O id da janela é obrigatório."))]
    pub id: String,
    #[validate(length(min = 1, message = "A janela precisa de uma parede."))]
    pub wall_id: String,
    #[validate(range(min = 0.0, max = 1.0, message = "O parâmetro t deve estar entre 0 e 1."))]
    pub t: f64,
    #[validate(range(exclusive_min = 0.0, message = "A largura deve ser positiva."))]
    pub width: f64,
    #[validate(range(exclusive_min = 0.0, message = "A altura deve ser positiva."))]
    pub height: f64,
    #[serde(default)]
    pub sill_height: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct DesignElements {
    #[validate(nested)]
    pub walls: Vec<Wall>,
    #[validate(nested)]
    pub rooms: Vec<Room>,
    #[validate(nested)]
    pub windows: Vec<WindowElement>,
}

// ---
// 2. Móveis posicionados (cópia de valores do catálogo, sem referência viva)
// ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlacedFurniture {
    pub id: String,
    // Item do catálogo de onde os valores foram copiados
    pub furniture_id: Option<Uuid>,
    pub name: String,
    pub category: Option<String>,
    pub price: Decimal,
    pub position: Vector3,
    pub rotation: Vector3,
    pub scale: Vector3,
    pub color: Option<String>,
    pub material: Option<String>,
    pub layer: Option<String>,
    #[schema(value_type = Object)]
    pub custom_properties: BTreeMap<String, PropertyValue>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaceFurniturePayload {
    // Opcional: gerado quando ausente
    #[validate(length(min = 1, max = 64, message = "O id do item é inválido."))]
    pub id: Option<String>,
    pub furniture_id: Option<Uuid>,
    #[validate(length(min = 1, max = 120, message = "O nome do item é obrigatório."))]
    pub name: String,
    pub category: Option<String>,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub position: Vector3,
    #[serde(default)]
    pub rotation: Vector3,
    #[serde(default = "Vector3::one")]
    pub scale: Vector3,
    pub color: Option<String>,
    pub material: Option<String>,
    pub layer: Option<String>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub custom_properties: BTreeMap<String, PropertyValue>,
}

impl PlaceFurniturePayload {
    pub fn into_placed(self) -> PlacedFurniture {
        PlacedFurniture {
            id: self.id.unwrap_or_else(|| Uuid::new_v4().simple().to_string()),
            furniture_id: self.furniture_id,
            name: self.name,
            category: self.category,
            price: self.price,
            position: self.position,
            rotation: self.rotation,
            scale: self.scale,
            color: self.color,
            material: self.material,
            layer: self.layer,
            custom_properties: self.custom_properties,
        }
    }
}

/// Patch parcial de um móvel: campos ausentes ficam intocados.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FurniturePatch {
    #[validate(length(min = 1, max = 120, message = "O nome do item é obrigatório."))]
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<Decimal>,
    pub position: Option<Vector3>,
    pub rotation: Option<Vector3>,
    pub scale: Option<Vector3>,
    pub color: Option<String>,
    pub material: Option<String>,
    pub layer: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub custom_properties: Option<BTreeMap<String, PropertyValue>>,
}

impl FurniturePatch {
    pub fn apply_to(self, item: &mut PlacedFurniture) {
        if let Some(name) = self.name {
            item.name = name;
        }
        if let Some(category) = self.category {
            item.category = Some(category);
        }
        if let Some(price) = self.price {
            item.price = price;
        }
        if let Some(position) = self.position {
            item.position = position;
        }
        if let Some(rotation) = self.rotation {
            item.rotation = rotation;
        }
        if let Some(scale) = self.scale {
            item.scale = scale;
        }
        if let Some(color) = self.color {
            item.color = Some(color);
        }
        if let Some(material) = self.material {
            item.material = Some(material);
        }
        if let Some(layer) = self.layer {
            item.layer = Some(layer);
        }
        if let Some(custom_properties) = self.custom_properties {
            item.custom_properties = custom_properties;
        }
    }
}

// ---
// 3. Cena: camadas, câmera e ambiente
// ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub id: String,
    pub name: String,
    pub visible: bool,
    pub locked: bool,
}

impl Layer {
    fn default_layers() -> Vec<Layer> {
        vec![Layer {
            id: "default".to_string(),
            name: "Default".to_string(),
            visible: true,
            locked: false,
        }]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CameraMode {
    #[default]
    Perspective,
    Orthographic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CameraSettings {
    pub mode: CameraMode,
    pub position: Vector3,
    pub target: Vector3,
    pub fov: f64,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            mode: CameraMode::Perspective,
            position: Vector3::new(10.0, 10.0, 10.0),
            target: Vector3::default(),
            fov: 75.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct EnvironmentSettings {
    pub background_color: String,
    pub ambient_intensity: f64,
    pub sun_intensity: f64,
    pub time_of_day: f64,
    pub show_grid: bool,
}

impl Default for EnvironmentSettings {
    fn default() -> Self {
        Self {
            background_color: "#f0f0f0".to_string(),
            ambient_intensity: 0.5,
            sun_intensity: 1.0,
            time_of_day: 12.0,
            show_grid: true,
        }
    }
}

// ---
// 4. Metadados derivados (recalculados a cada gravação)
// ---

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DesignMetadata {
    pub total_area: f64,
    pub total_cost: Decimal,
    pub furniture_count: u32,
}

impl DesignMetadata {
    /// Custo = soma dos preços; área = soma das áreas (shoelace) dos cômodos.
    pub fn compute(elements: &DesignElements, furniture: &[PlacedFurniture]) -> Self {
        Self {
            total_area: elements.rooms.iter().map(|r| polygon_area(&r.points)).sum(),
            total_cost: furniture.iter().map(|f| f.price).sum(),
            furniture_count: furniture.len() as u32,
        }
    }
}

// ---
// 5. O Design
// ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Design {
    pub id: Uuid,
    // Projeto dono; imutável depois da criação
    pub project: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: WorkflowStatus,
    pub created_by: Uuid,
    pub is_public: bool,

    pub elements: DesignElements,
    pub furniture: Vec<PlacedFurniture>,
    pub layers: Vec<Layer>,
    pub camera: CameraSettings,
    pub environment: EnvironmentSettings,
    pub metadata: DesignMetadata,

    pub tags: Vec<String>,
    pub thumbnail: Option<String>,
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for Design {
    const COLLECTION: &'static str = "designs";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Design {
    pub fn new(project: Uuid, created_by: Uuid, name: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            project,
            name,
            description: None,
            status: WorkflowStatus::Draft,
            created_by,
            is_public: false,
            elements: DesignElements::default(),
            furniture: Vec::new(),
            layers: Layer::default_layers(),
            camera: CameraSettings::default(),
            environment: EnvironmentSettings::default(),
            metadata: DesignMetadata::default(),
            tags: Vec::new(),
            thumbnail: None,
            version: INITIAL_VERSION,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn from_payload(created_by: Uuid, payload: CreateDesignPayload, now: DateTime<Utc>) -> Self {
        let mut design = Design::new(payload.project_id, created_by, payload.name, now);
        design.description = payload.description;
        design.is_public = payload.is_public.unwrap_or(false);
        design.tags = payload.tags.unwrap_or_default();
        if let Some(elements) = payload.elements {
            design.elements = elements;
        }
        if let Some(furniture) = payload.furniture {
            design.furniture = furniture.into_iter().map(PlaceFurniturePayload::into_placed).collect();
        }
        if let Some(layers) = payload.layers {
            design.layers = layers;
        }
        if let Some(camera) = payload.camera {
            design.camera = camera;
        }
        if let Some(environment) = payload.environment {
            design.environment = environment;
        }
        design.recompute_metadata();
        design
    }

    /// Deve ser chamado antes de qualquer gravação estrutural.
    pub fn recompute_metadata(&mut self) {
        self.metadata = DesignMetadata::compute(&self.elements, &self.furniture);
    }

    /// Cópia profunda do estado estrutural para um novo design em `project`.
    /// Identidade, status e versão recomeçam.
    pub fn structural_copy(
        &self,
        project: Uuid,
        created_by: Uuid,
        name: String,
        now: DateTime<Utc>,
    ) -> Design {
        let mut copy = Design::new(project, created_by, name, now);
        copy.description = self.description.clone();
        copy.elements = self.elements.clone();
        copy.furniture = self.furniture.clone();
        copy.layers = self.layers.clone();
        copy.camera = self.camera.clone();
        copy.environment = self.environment.clone();
        copy.tags = self.tags.clone();
        copy.thumbnail = self.thumbnail.clone();
        copy.recompute_metadata();
        copy
    }

    /// Primeiro id de item repetido, se houver. Itens são endereçados pelo id.
    pub fn duplicate_furniture_id(&self) -> Option<&str> {
        let mut seen = HashSet::new();
        self.furniture
            .iter()
            .find(|f| !seen.insert(f.id.as_str()))
            .map(|f| f.id.as_str())
    }

    pub fn furniture_item_mut(&mut self, item_id: &str) -> Option<&mut PlacedFurniture> {
        self.furniture.iter_mut().find(|f| f.id == item_id)
    }

    /// Remove o item se existir; `false` quando não havia nada para remover.
    pub fn remove_furniture_item(&mut self, item_id: &str) -> bool {
        let before = self.furniture.len();
        self.furniture.retain(|f| f.id != item_id);
        self.furniture.len() != before
    }

    pub fn apply(&mut self, patch: UpdateDesignPayload) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(is_public) = patch.is_public {
            self.is_public = is_public;
        }
        if let Some(elements) = patch.elements {
            self.elements = elements;
        }
        if let Some(furniture) = patch.furniture {
            self.furniture = furniture;
        }
        if let Some(layers) = patch.layers {
            self.layers = layers;
        }
        if let Some(camera) = patch.camera {
            self.camera = camera;
        }
        if let Some(environment) = patch.environment {
            self.environment = environment;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        if let Some(thumbnail) = patch.thumbnail {
            self.thumbnail = Some(thumbnail);
        }
        self.recompute_metadata();
    }
}

// ---
// 6. Payloads
// ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDesignPayload {
    pub project_id: Uuid,

    #[validate(length(min = 1, max = 100, message = "O nome deve ter entre 1 e 100 caracteres."))]
    pub name: String,

    #[validate(length(max = 500, message = "A descrição deve ter no máximo 500 caracteres."))]
    pub description: Option<String>,

    pub is_public: Option<bool>,
    pub tags: Option<Vec<String>>,

    #[validate(nested)]
    pub elements: Option<DesignElements>,
    #[validate(nested)]
    pub furniture: Option<Vec<PlaceFurniturePayload>>,
    pub layers: Option<Vec<Layer>>,
    pub camera: Option<CameraSettings>,
    pub environment: Option<EnvironmentSettings>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDesignPayload {
    #[validate(length(min = 1, max = 100, message = "O nome deve ter entre 1 e 100 caracteres."))]
    pub name: Option<String>,

    #[validate(length(max = 500, message = "A descrição deve ter no máximo 500 caracteres."))]
    pub description: Option<String>,

    pub status: Option<WorkflowStatus>,
    pub is_public: Option<bool>,

    #[validate(nested)]
    pub elements: Option<DesignElements>,
    pub furniture: Option<Vec<PlacedFurniture>>,
    pub layers: Option<Vec<Layer>>,
    pub camera: Option<CameraSettings>,
    pub environment: Option<EnvironmentSettings>,
    pub tags: Option<Vec<String>>,

    #[validate(url(message = "A thumbnail deve ser uma URL válida."))]
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateDesignPayload {
    #[validate(length(min = 1, max = 100, message = "O nome deve ter entre 1 e 100 caracteres."))]
    pub name: Option<String>,
    // Projeto de destino; o mesmo do original quando ausente
    pub project_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct DesignListQuery {
    /// Restringe a um projeto; sem ele, lista todos os projetos acessíveis
    pub project_id: Option<Uuid>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<WorkflowStatus>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
}

impl DesignListQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}
