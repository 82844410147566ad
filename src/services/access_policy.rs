// src/services/access_policy.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        auth::{SubscriptionPlan, User},
        design::Design,
        project::{Collaborator, CollaboratorRole, Project},
        template::Template,
    },
    services::subscription,
};

// ---
// 1. Operações e decisões
// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Duplicate,
    CreateDesign,
    Update,
    RemoveDesign,
    ManageCollaborators,
    /// Remoção de um colaborador específico (o alvo importa: ninguém remove a si mesmo).
    RemoveCollaborator(Uuid),
    Delete,
}

impl Operation {
    /// Papel mínimo exigido de um colaborador.
    pub fn required_role(&self) -> CollaboratorRole {
        match self {
            Operation::Read | Operation::Duplicate | Operation::CreateDesign => CollaboratorRole::Viewer,
            Operation::Update | Operation::RemoveDesign => CollaboratorRole::Editor,
            Operation::ManageCollaborators | Operation::RemoveCollaborator(_) => CollaboratorRole::Admin,
            // Nunca satisfeito por papel: tratado como exceção abaixo
            Operation::Delete => CollaboratorRole::Admin,
        }
    }

    // Operações que um recurso público libera para qualquer um
    fn is_read_like(&self) -> bool {
        matches!(self, Operation::Read | Operation::Duplicate)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    Unauthenticated,
    /// Recurso privado sem vínculo: indistinguível de inexistente.
    NotFound,
    NotCollaborator,
    OwnerOnly,
    CannotRemoveSelf,
    InsufficientRole {
        required: CollaboratorRole,
        actual: CollaboratorRole,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed { effective_role: CollaboratorRole },
    Denied(DenyReason),
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allowed { .. })
    }

    /// `resource` nomeia o recurso nas mensagens de 404.
    pub fn into_result(self, resource: &str) -> Result<CollaboratorRole, AppError> {
        match self {
            AccessDecision::Allowed { effective_role } => Ok(effective_role),
            AccessDecision::Denied(reason) => Err(reason.into_error(resource)),
        }
    }
}

impl DenyReason {
    pub fn into_error(self, resource: &str) -> AppError {
        match self {
            DenyReason::Unauthenticated => AppError::Unauthenticated,
            DenyReason::NotFound => AppError::NotFound(resource.to_string()),
            DenyReason::NotCollaborator => {
                AppError::Forbidden("você não colabora neste projeto".to_string())
            }
            DenyReason::OwnerOnly => {
                AppError::Forbidden("apenas o dono pode realizar esta ação".to_string())
            }
            DenyReason::CannotRemoveSelf => AppError::CannotRemoveSelf,
            DenyReason::InsufficientRole { required, .. } => AppError::Forbidden(format!(
                "é necessário o papel '{}' ou superior",
                required.as_str()
            )),
        }
    }
}

// ---
// 2. Recursos controlados
// ---

/// O que a política precisa saber de um recurso: dono, colaboradores e visibilidade.
pub trait AccessControlled {
    fn owner_id(&self) -> Uuid;
    fn collaborators(&self) -> &[Collaborator];
    fn is_public(&self) -> bool;
}

impl AccessControlled for Project {
    fn owner_id(&self) -> Uuid {
        self.owner
    }

    fn collaborators(&self) -> &[Collaborator] {
        &self.collaborators
    }

    fn is_public(&self) -> bool {
        self.is_public
    }
}

/// Um design herda dono e colaboradores do seu projeto.
/// É público se ele mesmo ou o projeto forem públicos.
pub struct DesignAccess<'a> {
    pub project: &'a Project,
    pub design: &'a Design,
}

impl AccessControlled for DesignAccess<'_> {
    fn owner_id(&self) -> Uuid {
        self.project.owner
    }

    fn collaborators(&self) -> &[Collaborator] {
        &self.project.collaborators
    }

    fn is_public(&self) -> bool {
        self.design.is_public || self.project.is_public
    }
}

// ---
// 3. A decisão
// ---

/// Decide se `user` pode executar `op` sobre `resource`. Não tem efeitos colaterais.
pub fn authorize<R: AccessControlled + ?Sized>(
    resource: &R,
    user: Option<&User>,
    op: Operation,
) -> AccessDecision {
    use AccessDecision::*;

    if let (Operation::RemoveCollaborator(target), Some(user)) = (op, user) {
        if target == user.id {
            return Denied(DenyReason::CannotRemoveSelf);
        }
    }

    let public_read = resource.is_public() && op.is_read_like();

    let Some(user) = user else {
        return if public_read {
            Allowed { effective_role: CollaboratorRole::Viewer }
        } else if resource.is_public() {
            Denied(DenyReason::Unauthenticated)
        } else {
            Denied(DenyReason::NotFound)
        };
    };

    if resource.owner_id() == user.id {
        return Allowed { effective_role: CollaboratorRole::Admin };
    }

    let Some(entry) = resource.collaborators().iter().find(|c| c.user == user.id) else {
        return if public_read {
            Allowed { effective_role: CollaboratorRole::Viewer }
        } else if resource.is_public() {
            Denied(DenyReason::NotCollaborator)
        } else {
            Denied(DenyReason::NotFound)
        };
    };

    if op == Operation::Delete {
        return Denied(DenyReason::OwnerOnly);
    }

    let required = op.required_role();
    if entry.role >= required {
        Allowed { effective_role: entry.role }
    } else {
        Denied(DenyReason::InsufficientRole {
            required,
            actual: entry.role,
        })
    }
}

/// Templates: inativos não existem para a API; os demais exigem o plano mínimo.
/// Sem identidade, vale o plano gratuito.
pub fn authorize_template(template: &Template, user: Option<&User>) -> Result<(), AppError> {
    if !template.is_active {
        return Err(AppError::NotFound("Template".into()));
    }
    let plan = user.map(|u| u.subscription_plan).unwrap_or(SubscriptionPlan::Free);
    subscription::require_plan(plan, template.requirements.subscription)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::project::CreateProjectPayload;
    use chrono::Utc;

    fn user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            name: "Ana".into(),
            email: format!("{}@example.com", Uuid::new_v4()),
            password_hash: String::new(),
            subscription_plan: SubscriptionPlan::Free,
            is_active: true,
            avatar: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn project_of(owner: &User, is_public: bool) -> Project {
        Project::new(
            owner.id,
            CreateProjectPayload {
                name: "Loft".into(),
                description: None,
                tags: None,
                settings: None,
                is_public: Some(is_public),
            },
            Utc::now(),
        )
    }

    const ROLES: [CollaboratorRole; 3] = [
        CollaboratorRole::Viewer,
        CollaboratorRole::Editor,
        CollaboratorRole::Admin,
    ];

    const OPERATIONS: [Operation; 6] = [
        Operation::Read,
        Operation::Duplicate,
        Operation::CreateDesign,
        Operation::Update,
        Operation::RemoveDesign,
        Operation::ManageCollaborators,
    ];

    #[test]
    fn owner_is_admin_for_everything() {
        let owner = user();
        let project = project_of(&owner, false);
        for op in OPERATIONS.into_iter().chain([Operation::Delete]) {
            assert_eq!(
                authorize(&project, Some(&owner), op),
                AccessDecision::Allowed { effective_role: CollaboratorRole::Admin }
            );
        }
    }

    #[test]
    fn only_the_owner_deletes() {
        let owner = user();
        let admin = user();
        let mut project = project_of(&owner, true);
        project.upsert_collaborator(admin.id, CollaboratorRole::Admin, Utc::now());

        assert!(authorize(&project, Some(&owner), Operation::Delete).is_allowed());
        assert_eq!(
            authorize(&project, Some(&admin), Operation::Delete),
            AccessDecision::Denied(DenyReason::OwnerOnly)
        );
    }

    #[test]
    fn higher_roles_satisfy_lower_requirements() {
        let owner = user();
        let member = user();
        let mut project = project_of(&owner, false);

        for op in OPERATIONS {
            for role in ROLES {
                project.upsert_collaborator(member.id, role, Utc::now());
                let decision = authorize(&project, Some(&member), op);
                assert_eq!(
                    decision.is_allowed(),
                    role >= op.required_role(),
                    "{:?} com papel {:?}",
                    op,
                    role
                );
                if decision.is_allowed() {
                    assert_eq!(decision, AccessDecision::Allowed { effective_role: role });
                }
            }
        }
    }

    #[test]
    fn private_resources_are_hidden_from_strangers() {
        let owner = user();
        let stranger = user();
        let project = project_of(&owner, false);

        assert_eq!(
            authorize(&project, Some(&stranger), Operation::Read),
            AccessDecision::Denied(DenyReason::NotFound)
        );
        assert_eq!(
            authorize(&project, None, Operation::Read),
            AccessDecision::Denied(DenyReason::NotFound)
        );
    }

    #[test]
    fn public_resources_are_readable_but_not_writable() {
        let owner = user();
        let stranger = user();
        let project = project_of(&owner, true);

        assert_eq!(
            authorize(&project, None, Operation::Read),
            AccessDecision::Allowed { effective_role: CollaboratorRole::Viewer }
        );
        assert!(authorize(&project, Some(&stranger), Operation::Duplicate).is_allowed());
        assert_eq!(
            authorize(&project, Some(&stranger), Operation::Update),
            AccessDecision::Denied(DenyReason::NotCollaborator)
        );
        assert_eq!(
            authorize(&project, None, Operation::Update),
            AccessDecision::Denied(DenyReason::Unauthenticated)
        );
    }

    #[test]
    fn nobody_removes_themselves() {
        let owner = user();
        let admin = user();
        let mut project = project_of(&owner, false);
        project.upsert_collaborator(admin.id, CollaboratorRole::Admin, Utc::now());

        assert_eq!(
            authorize(&project, Some(&admin), Operation::RemoveCollaborator(admin.id)),
            AccessDecision::Denied(DenyReason::CannotRemoveSelf)
        );
        assert_eq!(
            authorize(&project, Some(&owner), Operation::RemoveCollaborator(owner.id)),
            AccessDecision::Denied(DenyReason::CannotRemoveSelf)
        );
        assert!(authorize(&project, Some(&admin), Operation::RemoveCollaborator(owner.id)).is_allowed());
    }

    #[test]
    fn designs_follow_their_project() {
        let owner = user();
        let editor = user();
        let mut project = project_of(&owner, false);
        project.upsert_collaborator(editor.id, CollaboratorRole::Editor, Utc::now());
        let mut design = Design::new(project.id, owner.id, "Quarto".into(), Utc::now());

        let view = DesignAccess { project: &project, design: &design };
        assert!(authorize(&view, Some(&editor), Operation::Update).is_allowed());
        assert_eq!(authorize(&view, None, Operation::Read), AccessDecision::Denied(DenyReason::NotFound));

        design.is_public = true;
        let view = DesignAccess { project: &project, design: &design };
        assert!(authorize(&view, None, Operation::Read).is_allowed());
    }

    #[test]
    fn deny_reasons_map_to_http_errors() {
        assert!(matches!(
            DenyReason::NotFound.into_error("Projeto"),
            AppError::NotFound(r) if r == "Projeto"
        ));
        assert!(matches!(DenyReason::OwnerOnly.into_error("Projeto"), AppError::Forbidden(_)));
        assert!(matches!(
            DenyReason::CannotRemoveSelf.into_error("Projeto"),
            AppError::CannotRemoveSelf
        ));
    }

    #[test]
    fn templates_are_gated_by_plan() {
        use crate::models::template::{Difficulty, TemplateCategory, TemplateStyle};

        let mut template = Template::new(
            "Cozinha Gourmet",
            TemplateCategory::Kitchen,
            TemplateStyle::Industrial,
            Difficulty::Advanced,
            SubscriptionPlan::Pro,
            Utc::now(),
        );
        let mut pro = user();
        pro.subscription_plan = SubscriptionPlan::Pro;

        assert!(matches!(
            authorize_template(&template, None),
            Err(AppError::PlanRequired { .. })
        ));
        assert!(authorize_template(&template, Some(&pro)).is_ok());

        template.is_active = false;
        assert!(matches!(
            authorize_template(&template, Some(&pro)),
            Err(AppError::NotFound(_))
        ));
    }
}
