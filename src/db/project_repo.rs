// src/db/project_repo.rs

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{Page, PageRequest},
    },
    db::store::{Collection, DocumentStore, Filter, Query},
    models::project::Project,
};

#[derive(Clone)]
pub struct ProjectRepository {
    projects: Collection<Project>,
}

impl ProjectRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            projects: Collection::new(store),
        }
    }

    /// Projetos em que o usuário é dono ou colaborador (qualquer papel).
    pub fn accessible_filter(user_id: Uuid) -> Filter {
        Filter::Or(vec![
            Filter::eq("owner", json!(user_id)),
            Filter::contains("collaborators", json!([{ "user": user_id }])),
        ])
    }

    /// Primeira gravação: a versão não é incrementada.
    pub async fn create(&self, project: &Project) -> Result<(), AppError> {
        self.projects.insert(project).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Project>, AppError> {
        self.projects.find_by_id(id).await
    }

    /// Gravações seguintes: incrementa `version` e atualiza `updatedAt`.
    pub async fn save(&self, project: &mut Project) -> Result<(), AppError> {
        project.version += 1;
        project.updated_at = Utc::now();
        if !self.projects.replace(project).await? {
            return Err(AppError::NotFound("Projeto".into()));
        }
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        self.projects.delete(id).await
    }

    pub async fn find_page(&self, query: Query, page: PageRequest) -> Result<Page<Project>, AppError> {
        self.projects.find_page(query, page).await
    }

    pub async fn find_ids(&self, filter: Filter) -> Result<Vec<Uuid>, AppError> {
        Ok(self
            .projects
            .find(&Query::new(filter))
            .await?
            .into_iter()
            .map(|p| p.id)
            .collect())
    }
}
