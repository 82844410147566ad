// src/services/design_service.rs

use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::Page},
    db::{store::Filter, DesignRepository, ProjectRepository, Query},
    models::{
        auth::User,
        design::{
            CreateDesignPayload, Design, DesignListQuery, DuplicateDesignPayload, FurniturePatch,
            PlaceFurniturePayload, PlacedFurniture, UpdateDesignPayload,
        },
        project::{CollaboratorRole, Project},
    },
    services::{
        access_policy::{authorize, AccessDecision, DesignAccess, Operation},
        catalog::resolve_sort,
    },
};

const DESIGN_SORTS: &[(&str, &str)] = &[
    ("updatedAt", "updatedAt"),
    ("createdAt", "createdAt"),
    ("name", "name"),
    ("totalCost", "metadata.totalCost"),
    ("totalArea", "metadata.totalArea"),
];

#[derive(Clone)]
pub struct DesignService {
    designs: DesignRepository,
    projects: ProjectRepository,
}

impl DesignService {
    pub fn new(designs: DesignRepository, projects: ProjectRepository) -> Self {
        Self { designs, projects }
    }

    async fn load_project(&self, id: Uuid) -> Result<Project, AppError> {
        self.projects
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Projeto".into()))
    }

    fn check_project(project: &Project, user: Option<&User>, op: Operation) -> Result<CollaboratorRole, AppError> {
        let decision = authorize(project, user, op);
        if !decision.is_allowed() {
            tracing::warn!(project_id = %project.id, ?op, ?decision, "Acesso ao projeto negado");
        }
        decision.into_result("Projeto")
    }

    fn ensure_unique_furniture(design: &Design) -> Result<(), AppError> {
        match design.duplicate_furniture_id() {
            Some(id) => Err(AppError::Conflict(format!("o item '{}' já existe no design", id))),
            None => Ok(()),
        }
    }

    /// Carrega o design + projeto dono e aplica a política sobre o par.
    pub async fn authorized(
        &self,
        id: Uuid,
        user: Option<&User>,
        op: Operation,
    ) -> Result<(Design, Project), AppError> {
        let design = self
            .designs
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Design".into()))?;
        // Design órfão (cascata interrompida no meio) é tratado como inexistente
        let project = self
            .projects
            .find_by_id(design.project)
            .await?
            .ok_or_else(|| AppError::NotFound("Design".into()))?;

        let view = DesignAccess {
            project: &project,
            design: &design,
        };
        match authorize(&view, user, op) {
            AccessDecision::Allowed { .. } => Ok((design, project)),
            AccessDecision::Denied(reason) => {
                tracing::warn!(
                    design_id = %id,
                    user_id = ?user.map(|u| u.id),
                    ?op,
                    ?reason,
                    "Acesso ao design negado"
                );
                Err(reason.into_error("Design"))
            }
        }
    }

    fn list_query(base: Filter, query: &DesignListQuery) -> Result<Query, AppError> {
        let mut filter = base;
        if let Some(status) = query.status {
            filter = filter.and(Filter::eq("status", json!(status)));
        }
        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            filter = filter.and(Filter::ilike("name", search));
        }
        let sort = resolve_sort(query.sort_by.as_deref(), query.sort_order, DESIGN_SORTS)?;
        Ok(Query::new(filter).sort(sort))
    }

    /// Designs de um projeto (se `projectId`) ou de todos os projetos acessíveis.
    pub async fn list(&self, user: &User, query: &DesignListQuery) -> Result<Page<Design>, AppError> {
        let base = match query.project_id {
            Some(project_id) => {
                let project = self.load_project(project_id).await?;
                Self::check_project(&project, Some(user), Operation::Read)?;
                DesignRepository::project_filter(project_id)
            }
            None => {
                let ids: Vec<Value> = self
                    .projects
                    .find_ids(ProjectRepository::accessible_filter(user.id))
                    .await?
                    .into_iter()
                    .map(|id| json!(id))
                    .collect();
                Filter::In("project".into(), ids)
            }
        };
        let q = Self::list_query(base, query)?;
        self.designs.find_page(q, query.page_request()).await
    }

    /// Mesma regra da leitura anônima: o design ou o projeto dele é público.
    pub async fn list_public(&self, query: &DesignListQuery) -> Result<Page<Design>, AppError> {
        let public_projects: Vec<Value> = self
            .projects
            .find_ids(Filter::eq("isPublic", json!(true)))
            .await?
            .into_iter()
            .map(|id| json!(id))
            .collect();
        let mut base = Filter::Or(vec![
            Filter::eq("isPublic", json!(true)),
            Filter::In("project".into(), public_projects),
        ]);
        if let Some(project_id) = query.project_id {
            base = base.and(DesignRepository::project_filter(project_id));
        }
        let q = Self::list_query(base, query)?;
        self.designs.find_page(q, query.page_request()).await
    }

    pub async fn get(&self, id: Uuid, user: Option<&User>) -> Result<Design, AppError> {
        Ok(self.authorized(id, user, Operation::Read).await?.0)
    }

    pub async fn create(&self, user: &User, payload: CreateDesignPayload) -> Result<Design, AppError> {
        let project = self.load_project(payload.project_id).await?;
        Self::check_project(&project, Some(user), Operation::CreateDesign)?;

        let mut design = Design::from_payload(user.id, payload, Utc::now());
        Self::ensure_unique_furniture(&design)?;
        self.designs.create(&mut design).await?;
        tracing::info!(design_id = %design.id, project_id = %project.id, "Design criado");
        Ok(design)
    }

    /// Grava um design já montado (template, assistente) num projeto que o usuário pode alimentar.
    pub async fn create_in_project(&self, user: &User, mut design: Design) -> Result<Design, AppError> {
        let project = self.load_project(design.project).await?;
        Self::check_project(&project, Some(user), Operation::CreateDesign)?;
        Self::ensure_unique_furniture(&design)?;
        self.designs.create(&mut design).await?;
        Ok(design)
    }

    pub async fn update(&self, id: Uuid, user: &User, payload: UpdateDesignPayload) -> Result<Design, AppError> {
        let (mut design, _) = self.authorized(id, Some(user), Operation::Update).await?;
        design.apply(payload);
        Self::ensure_unique_furniture(&design)?;
        self.designs.save(&mut design).await?;
        Ok(design)
    }

    pub async fn delete(&self, id: Uuid, user: &User) -> Result<(), AppError> {
        self.authorized(id, Some(user), Operation::RemoveDesign).await?;
        self.designs.delete(id).await?;
        tracing::info!(design_id = %id, "Design removido");
        Ok(())
    }

    pub async fn add_furniture(
        &self,
        id: Uuid,
        user: &User,
        payload: PlaceFurniturePayload,
    ) -> Result<(Design, PlacedFurniture), AppError> {
        let (mut design, _) = self.authorized(id, Some(user), Operation::Update).await?;
        let item = payload.into_placed();
        design.furniture.push(item.clone());
        Self::ensure_unique_furniture(&design)?;
        self.designs.save(&mut design).await?;
        Ok((design, item))
    }

    /// Adiciona vários itens numa única gravação (usado pelo auto-furnish).
    pub async fn add_furniture_batch(
        &self,
        id: Uuid,
        user: &User,
        items: Vec<PlacedFurniture>,
    ) -> Result<Design, AppError> {
        let (mut design, _) = self.authorized(id, Some(user), Operation::Update).await?;
        design.furniture.extend(items);
        Self::ensure_unique_furniture(&design)?;
        self.designs.save(&mut design).await?;
        Ok(design)
    }

    pub async fn update_furniture(
        &self,
        id: Uuid,
        user: &User,
        item_id: &str,
        patch: FurniturePatch,
    ) -> Result<Design, AppError> {
        let (mut design, _) = self.authorized(id, Some(user), Operation::Update).await?;
        let item = design
            .furniture_item_mut(item_id)
            .ok_or_else(|| AppError::NotFound("Item de mobília".into()))?;
        patch.apply_to(item);
        self.designs.save(&mut design).await?;
        Ok(design)
    }

    /// Remoção tolerante: id inexistente não é erro.
    pub async fn remove_furniture(&self, id: Uuid, user: &User, item_id: &str) -> Result<Design, AppError> {
        let (mut design, _) = self.authorized(id, Some(user), Operation::Update).await?;
        if design.remove_furniture_item(item_id) {
            self.designs.save(&mut design).await?;
        }
        Ok(design)
    }

    /// Cópia estrutural, no mesmo projeto ou em outro onde o usuário possa criar designs.
    pub async fn duplicate(
        &self,
        id: Uuid,
        user: &User,
        payload: DuplicateDesignPayload,
    ) -> Result<Design, AppError> {
        let (source, project) = self.authorized(id, Some(user), Operation::Duplicate).await?;

        let target = match payload.project_id {
            Some(target_id) if target_id != project.id => self.load_project(target_id).await?,
            _ => project,
        };
        Self::check_project(&target, Some(user), Operation::CreateDesign)?;

        let name = payload.name.unwrap_or_else(|| format!("{} (Copy)", source.name));
        let mut copy = source.structural_copy(target.id, user.id, name, Utc::now());
        self.designs.create(&mut copy).await?;
        Ok(copy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{MemoryDocumentStore, UserRepository},
        models::{
            geometry::Vector3,
            project::{CreateProjectPayload, WorkflowStatus, INITIAL_VERSION},
        },
    };
    use rust_decimal::Decimal;
    use std::collections::BTreeMap;

    struct Fixture {
        service: DesignService,
        projects: ProjectRepository,
        users: UserRepository,
    }

    fn fixture() -> Fixture {
        let store = MemoryDocumentStore::new_shared();
        let projects = ProjectRepository::new(store.clone());
        let service = DesignService::new(DesignRepository::new(store.clone()), projects.clone());
        Fixture {
            service,
            projects,
            users: UserRepository::new(store),
        }
    }

    async fn project_with(f: &Fixture, owner: &User, members: &[(&User, CollaboratorRole)]) -> Project {
        let mut project = Project::new(
            owner.id,
            CreateProjectPayload {
                name: "Apê".into(),
                description: None,
                tags: None,
                settings: None,
                is_public: None,
            },
            Utc::now(),
        );
        for (member, role) in members {
            project.upsert_collaborator(member.id, *role, Utc::now());
        }
        f.projects.create(&project).await.unwrap();
        project
    }

    fn create_payload(project_id: Uuid) -> CreateDesignPayload {
        CreateDesignPayload {
            project_id,
            name: "Sala".into(),
            description: None,
            is_public: None,
            tags: None,
            elements: None,
            furniture: None,
            layers: None,
            camera: None,
            environment: None,
        }
    }

    fn chair(id: Option<&str>, price: i64) -> PlaceFurniturePayload {
        PlaceFurniturePayload {
            id: id.map(str::to_string),
            furniture_id: None,
            name: "Cadeira".into(),
            category: Some("chair".into()),
            price: Decimal::new(price, 0),
            position: Vector3::default(),
            rotation: Vector3::default(),
            scale: Vector3::one(),
            color: None,
            material: None,
            layer: None,
            custom_properties: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn furniture_mutations_keep_metadata_in_sync() {
        let f = fixture();
        let owner = f.users.create_user("Dono", "dono@example.com", "h").await.unwrap();
        let project = project_with(&f, &owner, &[]).await;
        let design = f.service.create(&owner, create_payload(project.id)).await.unwrap();

        let (design, item) = f
            .service
            .add_furniture(design.id, &owner, chair(None, 300))
            .await
            .unwrap();
        assert!(!item.id.is_empty());
        assert_eq!(design.metadata.furniture_count, 1);
        assert_eq!(design.metadata.total_cost, Decimal::new(300, 0));
        assert_eq!(design.version, INITIAL_VERSION + 1);

        let patch = FurniturePatch {
            price: Some(Decimal::new(250, 0)),
            ..Default::default()
        };
        let design = f
            .service
            .update_furniture(design.id, &owner, &item.id, patch)
            .await
            .unwrap();
        assert_eq!(design.metadata.total_cost, Decimal::new(250, 0));

        let err = f
            .service
            .update_furniture(design.id, &owner, "nao-existe", FurniturePatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let design = f.service.remove_furniture(design.id, &owner, &item.id).await.unwrap();
        assert_eq!(design.metadata.furniture_count, 0);
        let again = f.service.remove_furniture(design.id, &owner, &item.id).await.unwrap();
        assert_eq!(again.version, design.version);
    }

    #[tokio::test]
    async fn furniture_ids_stay_unique_on_every_write_path() {
        let f = fixture();
        let owner = f.users.create_user("Dono", "dono@example.com", "h").await.unwrap();
        let project = project_with(&f, &owner, &[]).await;

        let mut payload = create_payload(project.id);
        payload.furniture = Some(vec![chair(Some("x"), 10), chair(Some("x"), 20)]);
        assert!(matches!(
            f.service.create(&owner, payload).await,
            Err(AppError::Conflict(_))
        ));
        let query = DesignListQuery {
            project_id: Some(project.id),
            ..Default::default()
        };
        assert_eq!(f.service.list(&owner, &query).await.unwrap().pagination.total_items, 0);

        let design = f.service.create(&owner, create_payload(project.id)).await.unwrap();
        let twins = vec![chair(Some("y"), 10).into_placed(), chair(Some("y"), 20).into_placed()];

        let update = UpdateDesignPayload {
            furniture: Some(twins.clone()),
            ..Default::default()
        };
        assert!(matches!(
            f.service.update(design.id, &owner, update).await,
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            f.service.add_furniture_batch(design.id, &owner, twins).await,
            Err(AppError::Conflict(_))
        ));

        let (_, item) = f
            .service
            .add_furniture(design.id, &owner, chair(Some("z"), 10))
            .await
            .unwrap();
        assert!(matches!(
            f.service.add_furniture(design.id, &owner, chair(Some(item.id.as_str()), 30)).await,
            Err(AppError::Conflict(_))
        ));

        let stored = f.service.get(design.id, Some(&owner)).await.unwrap();
        assert_eq!(stored.furniture.len(), 1);
        assert_eq!(stored.version, INITIAL_VERSION + 1);
    }

    #[tokio::test]
    async fn designs_of_public_projects_are_listed_as_public() {
        let f = fixture();
        let owner = f.users.create_user("Dono", "dono@example.com", "h").await.unwrap();
        let private = project_with(&f, &owner, &[]).await;
        let mut showcase = project_with(&f, &owner, &[]).await;
        showcase.is_public = true;
        f.projects.save(&mut showcase).await.unwrap();

        let hidden = f.service.create(&owner, create_payload(private.id)).await.unwrap();
        let inherited = f.service.create(&owner, create_payload(showcase.id)).await.unwrap();
        let mut own = create_payload(private.id);
        own.is_public = Some(true);
        let own = f.service.create(&owner, own).await.unwrap();

        let page = f.service.list_public(&DesignListQuery::default()).await.unwrap();
        let ids: Vec<Uuid> = page.items.iter().map(|d| d.id).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&inherited.id));
        assert!(ids.contains(&own.id));
        assert!(!ids.contains(&hidden.id));

        // A leitura anônima segue a mesma regra
        assert!(f.service.get(inherited.id, None).await.is_ok());
        assert!(f.service.get(hidden.id, None).await.is_err());
    }

    #[tokio::test]
    async fn viewers_read_but_do_not_edit() {
        let f = fixture();
        let owner = f.users.create_user("Dono", "dono@example.com", "h").await.unwrap();
        let viewer = f.users.create_user("Leitor", "leitor@example.com", "h").await.unwrap();
        let project = project_with(&f, &owner, &[(&viewer, CollaboratorRole::Viewer)]).await;
        let design = f.service.create(&owner, create_payload(project.id)).await.unwrap();

        assert!(f.service.get(design.id, Some(&viewer)).await.is_ok());
        assert!(matches!(
            f.service.add_furniture(design.id, &viewer, chair(None, 10)).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            f.service.delete(design.id, &viewer).await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn editors_delete_designs() {
        let f = fixture();
        let owner = f.users.create_user("Dono", "dono@example.com", "h").await.unwrap();
        let editor = f.users.create_user("Editor", "editor@example.com", "h").await.unwrap();
        let project = project_with(&f, &owner, &[(&editor, CollaboratorRole::Editor)]).await;
        let design = f.service.create(&owner, create_payload(project.id)).await.unwrap();

        f.service.delete(design.id, &editor).await.unwrap();
        assert!(matches!(
            f.service.get(design.id, Some(&owner)).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn strangers_cannot_see_private_designs() {
        let f = fixture();
        let owner = f.users.create_user("Dono", "dono@example.com", "h").await.unwrap();
        let stranger = f.users.create_user("Outro", "outro@example.com", "h").await.unwrap();
        let project = project_with(&f, &owner, &[]).await;
        let design = f.service.create(&owner, create_payload(project.id)).await.unwrap();

        assert!(matches!(
            f.service.get(design.id, Some(&stranger)).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            f.service.create(&stranger, create_payload(project.id)).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn duplicate_into_another_project_requires_access_there() {
        let f = fixture();
        let owner = f.users.create_user("Dono", "dono@example.com", "h").await.unwrap();
        let other = f.users.create_user("Outro", "outro@example.com", "h").await.unwrap();
        let project = project_with(&f, &owner, &[]).await;
        let foreign = project_with(&f, &other, &[]).await;
        let mine = project_with(&f, &owner, &[]).await;

        let mut design = f.service.create(&owner, create_payload(project.id)).await.unwrap();
        design = f
            .service
            .update(
                design.id,
                &owner,
                UpdateDesignPayload {
                    status: Some(WorkflowStatus::Completed),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let copy = f
            .service
            .duplicate(
                design.id,
                &owner,
                DuplicateDesignPayload {
                    name: None,
                    project_id: Some(mine.id),
                },
            )
            .await
            .unwrap();
        assert_eq!(copy.project, mine.id);
        assert_eq!(copy.name, "Sala (Copy)");
        assert_eq!(copy.status, WorkflowStatus::Draft);
        assert_eq!(copy.version, INITIAL_VERSION);
        assert_eq!(copy.furniture, design.furniture);

        let err = f
            .service
            .duplicate(
                design.id,
                &owner,
                DuplicateDesignPayload {
                    name: None,
                    project_id: Some(foreign.id),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn listing_without_project_covers_accessible_projects() {
        let f = fixture();
        let owner = f.users.create_user("Dono", "dono@example.com", "h").await.unwrap();
        let editor = f.users.create_user("Editor", "editor@example.com", "h").await.unwrap();
        let shared = project_with(&f, &owner, &[(&editor, CollaboratorRole::Editor)]).await;
        let private = project_with(&f, &owner, &[]).await;
        f.service.create(&owner, create_payload(shared.id)).await.unwrap();
        f.service.create(&owner, create_payload(private.id)).await.unwrap();

        let page = f.service.list(&editor, &DesignListQuery::default()).await.unwrap();
        assert_eq!(page.pagination.total_items, 1);
        assert_eq!(page.items[0].project, shared.id);

        let err = f
            .service
            .list(
                &editor,
                &DesignListQuery {
                    project_id: Some(private.id),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
