// src/services/project_service.rs

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::Page},
    db::{store::Filter, DesignRepository, ProjectRepository, Query, UserRepository},
    models::{
        auth::User,
        design::Design,
        project::{
            AddCollaboratorPayload, CollaboratorRole, CreateProjectPayload, DuplicateProjectPayload,
            Project, ProjectListQuery, UpdateProjectPayload,
        },
    },
    services::{
        access_policy::{authorize, AccessDecision, Operation},
        catalog::resolve_sort,
    },
};

const PROJECT_SORTS: &[(&str, &str)] = &[
    ("updatedAt", "updatedAt"),
    ("createdAt", "createdAt"),
    ("name", "name"),
];

/// Projetos, colaboradores e a cascata projeto -> designs.
#[derive(Clone)]
pub struct ProjectService {
    projects: ProjectRepository,
    designs: DesignRepository,
    users: UserRepository,
}

impl ProjectService {
    pub fn new(projects: ProjectRepository, designs: DesignRepository, users: UserRepository) -> Self {
        Self { projects, designs, users }
    }

    async fn load(&self, id: Uuid) -> Result<Project, AppError> {
        self.projects
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Projeto".into()))
    }

    /// Carrega o projeto e aplica a política. Devolve também o papel efetivo.
    pub async fn authorized(
        &self,
        id: Uuid,
        user: Option<&User>,
        op: Operation,
    ) -> Result<(Project, CollaboratorRole), AppError> {
        let project = self.load(id).await?;
        match authorize(&project, user, op) {
            AccessDecision::Allowed { effective_role } => Ok((project, effective_role)),
            AccessDecision::Denied(reason) => {
                tracing::warn!(
                    project_id = %id,
                    user_id = ?user.map(|u| u.id),
                    ?op,
                    ?reason,
                    "Acesso ao projeto negado"
                );
                Err(reason.into_error("Projeto"))
            }
        }
    }

    fn list_query(base: Filter, query: &ProjectListQuery) -> Result<Query, AppError> {
        let mut filter = base;
        if let Some(status) = query.status {
            filter = filter.and(Filter::eq("status", json!(status)));
        }
        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            filter = filter.and(Filter::ilike("name", search));
        }
        if let Some(tag) = &query.tag {
            filter = filter.and(Filter::contains("tags", json!([tag])));
        }
        let sort = resolve_sort(query.sort_by.as_deref(), query.sort_order, PROJECT_SORTS)?;
        Ok(Query::new(filter).sort(sort))
    }

    /// Projetos em que o usuário é dono ou colaborador.
    pub async fn list_mine(&self, user: &User, query: &ProjectListQuery) -> Result<Page<Project>, AppError> {
        let q = Self::list_query(ProjectRepository::accessible_filter(user.id), query)?;
        self.projects.find_page(q, query.page_request()).await
    }

    pub async fn list_public(&self, query: &ProjectListQuery) -> Result<Page<Project>, AppError> {
        let q = Self::list_query(Filter::eq("isPublic", json!(true)), query)?;
        self.projects.find_page(q, query.page_request()).await
    }

    pub async fn get(&self, id: Uuid, user: Option<&User>) -> Result<Project, AppError> {
        Ok(self.authorized(id, user, Operation::Read).await?.0)
    }

    pub async fn create(&self, user: &User, payload: CreateProjectPayload) -> Result<Project, AppError> {
        let project = Project::new(user.id, payload, Utc::now());
        self.projects.create(&project).await?;
        tracing::info!(project_id = %project.id, owner = %user.id, "Projeto criado");
        Ok(project)
    }

    pub async fn update(
        &self,
        id: Uuid,
        user: &User,
        payload: UpdateProjectPayload,
    ) -> Result<Project, AppError> {
        let (mut project, _) = self.authorized(id, Some(user), Operation::Update).await?;
        project.apply(payload);
        self.projects.save(&mut project).await?;
        Ok(project)
    }

    /// Só o dono apaga. Os designs saem primeiro (sem transação entre documentos).
    /// Retorna quantos designs foram removidos em cascata.
    pub async fn delete(&self, id: Uuid, user: &User) -> Result<u64, AppError> {
        self.authorized(id, Some(user), Operation::Delete).await?;

        let cascaded = self.designs.delete_by_project(id).await?;
        self.projects.delete(id).await?;

        tracing::info!(project_id = %id, designs = cascaded, "Projeto removido");
        Ok(cascaded)
    }

    pub async fn add_collaborator(
        &self,
        id: Uuid,
        user: &User,
        payload: AddCollaboratorPayload,
    ) -> Result<Project, AppError> {
        let (mut project, _) = self
            .authorized(id, Some(user), Operation::ManageCollaborators)
            .await?;

        let target = match (payload.user_id, payload.email.as_deref()) {
            (Some(user_id), _) => self.users.find_by_id(user_id).await?,
            (None, Some(email)) => self.users.find_by_email(email).await?,
            (None, None) => {
                return Err(AppError::invalid_field("userId", "Informe userId ou email."));
            }
        }
        .filter(|u| u.is_active)
        .ok_or_else(|| AppError::NotFound("Usuário".into()))?;

        if target.id == project.owner {
            return Err(AppError::invalid_field(
                "userId",
                "O dono do projeto não pode ser adicionado como colaborador.",
            ));
        }

        project.upsert_collaborator(target.id, payload.role, Utc::now());
        self.projects.save(&mut project).await?;
        Ok(project)
    }

    pub async fn update_collaborator_role(
        &self,
        id: Uuid,
        user: &User,
        target: Uuid,
        role: CollaboratorRole,
    ) -> Result<Project, AppError> {
        let (mut project, _) = self
            .authorized(id, Some(user), Operation::ManageCollaborators)
            .await?;

        if !project.set_collaborator_role(target, role) {
            return Err(AppError::NotFound("Colaborador".into()));
        }
        self.projects.save(&mut project).await?;
        Ok(project)
    }

    /// Sem efeito (e sem nova versão) quando o alvo não colabora.
    pub async fn remove_collaborator(
        &self,
        id: Uuid,
        user: &User,
        target: Uuid,
    ) -> Result<Project, AppError> {
        let (mut project, _) = self
            .authorized(id, Some(user), Operation::RemoveCollaborator(target))
            .await?;

        if project.remove_collaborator(target) {
            self.projects.save(&mut project).await?;
        }
        Ok(project)
    }

    /// Novo projeto do usuário + cópia estrutural de cada design do original.
    pub async fn duplicate(
        &self,
        id: Uuid,
        user: &User,
        payload: DuplicateProjectPayload,
    ) -> Result<(Project, Vec<Design>), AppError> {
        let (source, _) = self.authorized(id, Some(user), Operation::Duplicate).await?;
        let now = Utc::now();

        let project = source.duplicate_for(user.id, payload.name, now);
        self.projects.create(&project).await?;

        let mut copies = Vec::new();
        for design in self.designs.find_by_project(source.id).await? {
            let mut copy = design.structural_copy(project.id, user.id, design.name.clone(), now);
            self.designs.create(&mut copy).await?;
            copies.push(copy);
        }

        tracing::info!(
            source = %source.id,
            project_id = %project.id,
            designs = copies.len(),
            "Projeto duplicado"
        );
        Ok((project, copies))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::MemoryDocumentStore,
        models::{
            design::{CreateDesignPayload, Room},
            geometry::Point2D,
            project::{WorkflowStatus, INITIAL_VERSION},
        },
    };

    struct Fixture {
        service: ProjectService,
        designs: DesignRepository,
        users: UserRepository,
    }

    fn fixture() -> Fixture {
        let store = MemoryDocumentStore::new_shared();
        let users = UserRepository::new(store.clone());
        let designs = DesignRepository::new(store.clone());
        let service = ProjectService::new(ProjectRepository::new(store), designs.clone(), users.clone());
        Fixture { service, designs, users }
    }

    async fn user(f: &Fixture, email: &str) -> User {
        f.users.create_user("Teste", email, "hash").await.unwrap()
    }

    fn payload(name: &str) -> CreateProjectPayload {
        CreateProjectPayload {
            name: name.into(),
            description: None,
            tags: None,
            settings: None,
            is_public: None,
        }
    }

    fn add(user_id: Uuid, role: CollaboratorRole) -> AddCollaboratorPayload {
        AddCollaboratorPayload {
            user_id: Some(user_id),
            email: None,
            role,
        }
    }

    #[tokio::test]
    async fn saves_bump_version_but_creation_does_not() {
        let f = fixture();
        let owner = user(&f, "dono@example.com").await;
        let project = f.service.create(&owner, payload("Casa")).await.unwrap();
        assert_eq!(project.version, INITIAL_VERSION);

        let updated = f
            .service
            .update(
                project.id,
                &owner,
                UpdateProjectPayload {
                    name: Some("Casa Nova".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.version, INITIAL_VERSION + 1);
        assert!(updated.updated_at >= project.updated_at);
    }

    #[tokio::test]
    async fn admin_collaborator_cannot_delete() {
        let f = fixture();
        let owner = user(&f, "dono@example.com").await;
        let admin = user(&f, "admin@example.com").await;
        let project = f.service.create(&owner, payload("Casa")).await.unwrap();
        f.service
            .add_collaborator(project.id, &owner, add(admin.id, CollaboratorRole::Admin))
            .await
            .unwrap();

        let err = f.service.delete(project.id, &admin).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert!(f.service.delete(project.id, &owner).await.is_ok());
        assert!(matches!(
            f.service.get(project.id, Some(&owner)).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn collaborators_are_upserted_by_user() {
        let f = fixture();
        let owner = user(&f, "dono@example.com").await;
        let member = user(&f, "membro@example.com").await;
        let project = f.service.create(&owner, payload("Casa")).await.unwrap();

        f.service
            .add_collaborator(project.id, &owner, add(member.id, CollaboratorRole::Viewer))
            .await
            .unwrap();
        f.service
            .remove_collaborator(project.id, &owner, member.id)
            .await
            .unwrap();
        let by_email = AddCollaboratorPayload {
            user_id: None,
            email: Some("MEMBRO@example.com".into()),
            role: CollaboratorRole::Editor,
        };
        let project = f.service.add_collaborator(project.id, &owner, by_email).await.unwrap();

        assert_eq!(project.collaborators.len(), 1);
        assert_eq!(project.collaborators[0].role, CollaboratorRole::Editor);
    }

    #[tokio::test]
    async fn owner_cannot_become_collaborator() {
        let f = fixture();
        let owner = user(&f, "dono@example.com").await;
        let project = f.service.create(&owner, payload("Casa")).await.unwrap();
        let err = f
            .service
            .add_collaborator(project.id, &owner, add(owner.id, CollaboratorRole::Editor))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidField { .. }));
    }

    #[tokio::test]
    async fn updating_role_of_a_stranger_is_not_found() {
        let f = fixture();
        let owner = user(&f, "dono@example.com").await;
        let project = f.service.create(&owner, payload("Casa")).await.unwrap();
        let err = f
            .service
            .update_collaborator_role(project.id, &owner, Uuid::new_v4(), CollaboratorRole::Admin)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn removing_a_missing_collaborator_keeps_the_version() {
        let f = fixture();
        let owner = user(&f, "dono@example.com").await;
        let project = f.service.create(&owner, payload("Casa")).await.unwrap();
        let same = f
            .service
            .remove_collaborator(project.id, &owner, Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(same.version, project.version);
    }

    #[tokio::test]
    async fn duplicate_copies_every_design_as_draft() {
        let f = fixture();
        let owner = user(&f, "dono@example.com").await;
        let viewer = user(&f, "leitor@example.com").await;
        let project = f.service.create(&owner, payload("Casa")).await.unwrap();
        f.service
            .add_collaborator(project.id, &owner, add(viewer.id, CollaboratorRole::Viewer))
            .await
            .unwrap();

        let mut originals = Vec::new();
        for name in ["Sala", "Quarto"] {
            let mut design = Design::from_payload(
                owner.id,
                CreateDesignPayload {
                    project_id: project.id,
                    name: name.into(),
                    description: None,
                    is_public: None,
                    tags: None,
                    elements: None,
                    furniture: None,
                    layers: None,
                    camera: None,
                    environment: None,
                },
                Utc::now(),
            );
            design.elements.rooms = vec![Room {
                id: "r1".into(),
                name: None,
                points: vec![
                    Point2D::new(0.0, 0.0),
                    Point2D::new(4.0, 0.0),
                    Point2D::new(4.0, 3.0),
                    Point2D::new(0.0, 3.0),
                ],
                floor_material: None,
            }];
            f.designs.create(&mut design).await.unwrap();
            design.status = WorkflowStatus::Completed;
            f.designs.save(&mut design).await.unwrap();
            originals.push(design);
        }

        let (copy, designs) = f
            .service
            .duplicate(project.id, &viewer, DuplicateProjectPayload::default())
            .await
            .unwrap();

        assert_eq!(copy.owner, viewer.id);
        assert_eq!(copy.name, "Casa (Copy)");
        assert!(copy.collaborators.is_empty());
        assert_eq!(designs.len(), 2);
        assert_eq!(f.designs.count_by_project(copy.id).await.unwrap(), 2);

        for d in &designs {
            let original = originals.iter().find(|o| o.name == d.name).unwrap();
            assert_ne!(d.id, original.id);
            assert_eq!(d.project, copy.id);
            assert_eq!(d.status, WorkflowStatus::Draft);
            assert_eq!(d.version, INITIAL_VERSION);
            assert_eq!(d.elements, original.elements);
            assert_eq!(d.metadata.total_area, 12.0);
        }
    }

    #[tokio::test]
    async fn delete_cascades_to_designs() {
        let f = fixture();
        let owner = user(&f, "dono@example.com").await;
        let project = f.service.create(&owner, payload("Casa")).await.unwrap();
        let mut design = Design::new(project.id, owner.id, "Sala".into(), Utc::now());
        f.designs.create(&mut design).await.unwrap();

        assert_eq!(f.service.delete(project.id, &owner).await.unwrap(), 1);
        assert!(f.designs.find_by_id(design.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn listing_mine_includes_collaborations_only() {
        let f = fixture();
        let owner = user(&f, "dono@example.com").await;
        let member = user(&f, "membro@example.com").await;
        let shared = f.service.create(&owner, payload("Compartilhado")).await.unwrap();
        f.service.create(&owner, payload("Privado")).await.unwrap();
        f.service
            .add_collaborator(shared.id, &owner, add(member.id, CollaboratorRole::Viewer))
            .await
            .unwrap();

        let page = f
            .service
            .list_mine(&member, &ProjectListQuery::default())
            .await
            .unwrap();
        assert_eq!(page.pagination.total_items, 1);
        assert_eq!(page.items[0].id, shared.id);

        let all = f.service.list_mine(&owner, &ProjectListQuery::default()).await.unwrap();
        assert_eq!(all.pagination.total_items, 2);
    }
}
