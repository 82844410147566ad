// src/models/project.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::pagination::{PageRequest, SortOrder};
use crate::db::store::Document;

// --- ENUMS ---

/// Papéis de colaboração, em ordem total: viewer < editor < admin.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum CollaboratorRole {
    Viewer,
    Editor,
    Admin,
}

impl CollaboratorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollaboratorRole::Viewer => "viewer",
            CollaboratorRole::Editor => "editor",
            CollaboratorRole::Admin => "admin",
        }
    }
}

// Ciclo de vida comum a projetos e designs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    #[default]
    Draft,
    InProgress,
    Completed,
    Archived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementUnit {
    #[default]
    Metric,
    Imperial,
}

// --- SUB-DOCUMENTOS ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Collaborator {
    pub user: Uuid,
    pub role: CollaboratorRole,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectSettings {
    pub units: MeasurementUnit,
    #[validate(range(min = 0.01, max = 10.0, message = "O grid deve estar entre 0.01 e 10."))]
    pub grid_size: f64,
    pub snap_to_grid: bool,
    #[validate(range(min = 0.5, max = 20.0, message = "A altura padrão de parede é inválida."))]
    pub default_wall_height: f64,
    #[validate(range(min = 0.01, max = 2.0, message = "A espessura padrão de parede é inválida."))]
    pub default_wall_thickness: f64,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            units: MeasurementUnit::Metric,
            grid_size: 0.5,
            snap_to_grid: true,
            default_wall_height: 2.8,
            default_wall_thickness: 0.15,
        }
    }
}

// --- PROJETO (A raiz do agregado) ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,

    // Só o dono pode apagar o projeto
    pub owner: Uuid,
    // No máximo uma entrada por usuário; o dono nunca aparece aqui
    pub collaborators: Vec<Collaborator>,

    pub is_public: bool,
    pub status: WorkflowStatus,
    pub tags: Vec<String>,
    pub settings: ProjectSettings,
    pub thumbnail: Option<String>,

    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for Project {
    const COLLECTION: &'static str = "projects";

    fn id(&self) -> Uuid {
        self.id
    }
}

pub const INITIAL_VERSION: u32 = 1;

impl Project {
    pub fn new(owner: Uuid, payload: CreateProjectPayload, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: payload.name,
            description: payload.description,
            owner,
            collaborators: Vec::new(),
            is_public: payload.is_public.unwrap_or(false),
            status: WorkflowStatus::Draft,
            tags: payload.tags.unwrap_or_default(),
            settings: payload.settings.unwrap_or_default(),
            thumbnail: None,
            version: INITIAL_VERSION,
            created_at: now,
            updated_at: now,
        }
    }

    /// Upsert idempotente: se o usuário já colabora, o papel é sobrescrito no
    /// lugar; senão entra no fim da lista. Retorna `true` se foi inserido.
    pub fn upsert_collaborator(
        &mut self,
        user: Uuid,
        role: CollaboratorRole,
        now: DateTime<Utc>,
    ) -> bool {
        match self.collaborators.iter_mut().find(|c| c.user == user) {
            Some(existing) => {
                existing.role = role;
                false
            }
            None => {
                self.collaborators.push(Collaborator { user, role, added_at: now });
                true
            }
        }
    }

    /// Remove o colaborador, se existir. Sem efeito caso contrário.
    pub fn remove_collaborator(&mut self, user: Uuid) -> bool {
        let before = self.collaborators.len();
        self.collaborators.retain(|c| c.user != user);
        self.collaborators.len() != before
    }

    /// Troca o papel de um colaborador existente. `false` se ele não colabora.
    pub fn set_collaborator_role(&mut self, user: Uuid, role: CollaboratorRole) -> bool {
        match self.collaborators.iter_mut().find(|c| c.user == user) {
            Some(existing) => {
                existing.role = role;
                true
            }
            None => false,
        }
    }

    /// Cópia para um novo dono: sem colaboradores, em rascunho, versão inicial.
    pub fn duplicate_for(&self, owner: Uuid, name: Option<String>, now: DateTime<Utc>) -> Project {
        Project {
            id: Uuid::new_v4(),
            name: name.unwrap_or_else(|| format!("{} (Copy)", self.name)),
            description: self.description.clone(),
            owner,
            collaborators: Vec::new(),
            is_public: false,
            status: WorkflowStatus::Draft,
            tags: self.tags.clone(),
            settings: self.settings.clone(),
            thumbnail: self.thumbnail.clone(),
            version: INITIAL_VERSION,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, patch: UpdateProjectPayload) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(is_public) = patch.is_public {
            self.is_public = is_public;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        if let Some(settings) = patch.settings {
            self.settings = settings;
        }
        if let Some(thumbnail) = patch.thumbnail {
            self.thumbnail = Some(thumbnail);
        }
    }
}

// --- PAYLOADS ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectPayload {
    #[validate(length(min = 1, max = 100, message = "O nome deve ter entre 1 e 100 caracteres."))]
    #[schema(example = "Apartamento Vila Madalena")]
    pub name: String,

    #[validate(length(max = 500, message = "A descrição deve ter no máximo 500 caracteres."))]
    pub description: Option<String>,

    #[validate(length(max = 20, message = "No máximo 20 tags."))]
    pub tags: Option<Vec<String>>,

    #[validate(nested)]
    pub settings: Option<ProjectSettings>,

    pub is_public: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectPayload {
    #[validate(length(min = 1, max = 100, message = "O nome deve ter entre 1 e 100 caracteres."))]
    pub name: Option<String>,

    #[validate(length(max = 500, message = "A descrição deve ter no máximo 500 caracteres."))]
    pub description: Option<String>,

    pub is_public: Option<bool>,
    pub status: Option<WorkflowStatus>,

    #[validate(length(max = 20, message = "No máximo 20 tags."))]
    pub tags: Option<Vec<String>>,

    #[validate(nested)]
    pub settings: Option<ProjectSettings>,

    #[validate(url(message = "A thumbnail deve ser uma URL válida."))]
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddCollaboratorPayload {
    pub user_id: Option<Uuid>,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,

    pub role: CollaboratorRole,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCollaboratorRolePayload {
    pub role: CollaboratorRole,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateProjectPayload {
    #[validate(length(min = 1, max = 100, message = "O nome deve ter entre 1 e 100 caracteres."))]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProjectListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<WorkflowStatus>,
    /// Busca por nome (substring, sem diferenciar maiúsculas)
    pub search: Option<String>,
    pub tag: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
}

impl ProjectListQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> Project {
        Project::new(
            Uuid::new_v4(),
            CreateProjectPayload {
                name: "Casa de Praia".into(),
                description: Some("Reforma".into()),
                tags: Some(vec!["praia".into()]),
                settings: None,
                is_public: None,
            },
            Utc::now(),
        )
    }

    #[test]
    fn roles_are_totally_ordered() {
        assert!(CollaboratorRole::Viewer < CollaboratorRole::Editor);
        assert!(CollaboratorRole::Editor < CollaboratorRole::Admin);
    }

    #[test]
    fn upsert_overwrites_role_in_place() {
        let mut p = project();
        let user = Uuid::new_v4();
        assert!(p.upsert_collaborator(user, CollaboratorRole::Viewer, Utc::now()));
        assert!(!p.upsert_collaborator(user, CollaboratorRole::Admin, Utc::now()));
        assert_eq!(p.collaborators.len(), 1);
        assert_eq!(p.collaborators[0].role, CollaboratorRole::Admin);
    }

    #[test]
    fn remove_then_add_leaves_a_single_entry() {
        let mut p = project();
        let user = Uuid::new_v4();
        p.upsert_collaborator(user, CollaboratorRole::Editor, Utc::now());
        assert!(p.remove_collaborator(user));
        assert!(!p.remove_collaborator(user));
        p.upsert_collaborator(user, CollaboratorRole::Viewer, Utc::now());
        assert_eq!(p.collaborators.len(), 1);
        assert_eq!(p.collaborators[0].role, CollaboratorRole::Viewer);
    }

    #[test]
    fn set_role_requires_membership() {
        let mut p = project();
        assert!(!p.set_collaborator_role(Uuid::new_v4(), CollaboratorRole::Editor));
    }

    #[test]
    fn duplicate_resets_ownership_and_state() {
        let mut p = project();
        p.upsert_collaborator(Uuid::new_v4(), CollaboratorRole::Editor, Utc::now());
        p.status = WorkflowStatus::Completed;
        p.version = 7;

        let new_owner = Uuid::new_v4();
        let copy = p.duplicate_for(new_owner, None, Utc::now());
        assert_ne!(copy.id, p.id);
        assert_eq!(copy.name, "Casa de Praia (Copy)");
        assert_eq!(copy.owner, new_owner);
        assert!(copy.collaborators.is_empty());
        assert_eq!(copy.status, WorkflowStatus::Draft);
        assert_eq!(copy.version, INITIAL_VERSION);
        assert_eq!(copy.tags, p.tags);
        assert_eq!(copy.settings, p.settings);

        let named = p.duplicate_for(new_owner, Some("Outro".into()), Utc::now());
        assert_eq!(named.name, "Outro");
    }
}
