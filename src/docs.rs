// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,

        // --- Projects ---
        handlers::projects::list_my_projects,
        handlers::projects::list_public_projects,
        handlers::projects::get_project,
        handlers::projects::create_project,
        handlers::projects::update_project,
        handlers::projects::delete_project,
        handlers::projects::add_collaborator,
        handlers::projects::update_collaborator_role,
        handlers::projects::remove_collaborator,
        handlers::projects::duplicate_project,

        // --- Designs ---
        handlers::designs::list_designs,
        handlers::designs::list_public_designs,
        handlers::designs::get_design,
        handlers::designs::create_design,
        handlers::designs::update_design,
        handlers::designs::delete_design,
        handlers::designs::add_furniture,
        handlers::designs::update_furniture,
        handlers::designs::remove_furniture,
        handlers::designs::duplicate_design,

        // --- Templates ---
        handlers::templates::list_templates,
        handlers::templates::featured_templates,
        handlers::templates::search_templates,
        handlers::templates::templates_by_category,
        handlers::templates::templates_by_style,
        handlers::templates::get_template,
        handlers::templates::use_template,
        handlers::templates::rate_template,

        // --- Furniture ---
        handlers::furniture::list_furniture,
        handlers::furniture::featured_furniture,
        handlers::furniture::trending_furniture,
        handlers::furniture::search_furniture,
        handlers::furniture::furniture_by_category,
        handlers::furniture::get_furniture,
        handlers::furniture::rate_furniture,

        // --- AI ---
        handlers::ai::layout_suggestions,
        handlers::ai::auto_furnish,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::SubscriptionPlan,
            models::auth::UserProfile,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- Geometry ---
            models::geometry::Point2D,
            models::geometry::Vector3,

            // --- Projects ---
            models::project::CollaboratorRole,
            models::project::WorkflowStatus,
            models::project::MeasurementUnit,
            models::project::Collaborator,
            models::project::ProjectSettings,
            models::project::Project,
            models::project::CreateProjectPayload,
            models::project::UpdateProjectPayload,
            models::project::AddCollaboratorPayload,
            models::project::UpdateCollaboratorRolePayload,
            models::project::DuplicateProjectPayload,
            handlers::projects::DuplicatedProject,

            // --- Designs ---
            models::design::Wall,
            models::design::Room,
            models::design::WindowElement,
            models::design::DesignElements,
            models::design::PlacedFurniture,
            models::design::Layer,
            models::design::CameraMode,
            models::design::CameraSettings,
            models::design::EnvironmentSettings,
            models::design::DesignMetadata,
            models::design::Design,
            models::design::PlaceFurniturePayload,
            models::design::FurniturePatch,
            models::design::CreateDesignPayload,
            models::design::UpdateDesignPayload,
            models::design::DuplicateDesignPayload,

            // --- Templates ---
            models::template::TemplateCategory,
            models::template::TemplateStyle,
            models::template::Difficulty,
            models::template::TemplateRequirements,
            models::template::TemplateDimensions,
            models::template::TemplateFurniture,
            models::template::TemplateMetadata,
            models::template::Template,
            models::template::UseTemplatePayload,
            services::catalog::TemplateFacets,

            // --- Furniture ---
            models::furniture::RatingAggregate,
            models::furniture::RatePayload,
            models::furniture::Pricing,
            models::furniture::Dimensions,
            models::furniture::ColorOption,
            models::furniture::Availability,
            models::furniture::Furniture,
            models::furniture::FurnitureDetail,
            services::catalog::FurnitureFacets,
            services::catalog::NumericRange,

            // --- Paginação ---
            crate::common::pagination::PaginationMeta,
            crate::common::pagination::SortOrder,

            // --- AI ---
            services::layout_assistant::LayoutSuggestion,
            handlers::ai::LayoutRequestPayload,
            handlers::ai::AutoFurnishResult,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Dados do Usuário e Perfil"),
        (name = "Projects", description = "Projetos, Colaboradores e Duplicação"),
        (name = "Designs", description = "Plantas 3D e Móveis Posicionados"),
        (name = "Templates", description = "Biblioteca de Templates (por plano)"),
        (name = "Furniture", description = "Catálogo de Móveis"),
        (name = "AI", description = "Assistente de Layout (planos pagos)")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
