// src/lib.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use crate::{config::AppState, docs::ApiDoc, middleware::auth::auth_guard};

/// Monta o router completo da API sobre um estado já inicializado.
pub fn build_router(app_state: AppState) -> Router {
    // Rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    // Rotas de usuário (protegidas pelo middleware)
    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Projetos e designs misturam leitura anônima e rotas autenticadas:
    // a identidade vem dos extractors de cada handler.
    let project_routes = Router::new()
        .route(
            "/api/projects",
            get(handlers::projects::list_my_projects).post(handlers::projects::create_project),
        )
        .route("/api/projects/public", get(handlers::projects::list_public_projects))
        .route(
            "/api/projects/{id}",
            get(handlers::projects::get_project)
                .put(handlers::projects::update_project)
                .delete(handlers::projects::delete_project),
        )
        .route(
            "/api/projects/{id}/collaborators",
            post(handlers::projects::add_collaborator),
        )
        .route(
            "/api/projects/{id}/collaborators/{user_id}",
            put(handlers::projects::update_collaborator_role)
                .delete(handlers::projects::remove_collaborator),
        )
        .route("/api/projects/{id}/duplicate", post(handlers::projects::duplicate_project));

    let design_routes = Router::new()
        .route(
            "/api/designs",
            get(handlers::designs::list_designs).post(handlers::designs::create_design),
        )
        .route("/api/designs/public", get(handlers::designs::list_public_designs))
        .route(
            "/api/designs/{id}",
            get(handlers::designs::get_design)
                .put(handlers::designs::update_design)
                .delete(handlers::designs::delete_design),
        )
        .route("/api/designs/{id}/furniture", post(handlers::designs::add_furniture))
        .route(
            "/api/designs/{id}/furniture/{item_id}",
            put(handlers::designs::update_furniture).delete(handlers::designs::remove_furniture),
        )
        .route("/api/designs/{id}/duplicate", post(handlers::designs::duplicate_design));

    let template_routes = Router::new()
        .route("/api/templates", get(handlers::templates::list_templates))
        .route("/api/templates/featured", get(handlers::templates::featured_templates))
        .route("/api/templates/search", get(handlers::templates::search_templates))
        .route(
            "/api/templates/category/{category}",
            get(handlers::templates::templates_by_category),
        )
        .route("/api/templates/style/{style}", get(handlers::templates::templates_by_style))
        .route("/api/templates/{id}", get(handlers::templates::get_template))
        .route("/api/templates/{id}/use", post(handlers::templates::use_template))
        .route("/api/templates/{id}/rate", post(handlers::templates::rate_template));

    let furniture_routes = Router::new()
        .route("/api/furniture", get(handlers::furniture::list_furniture))
        .route("/api/furniture/featured", get(handlers::furniture::featured_furniture))
        .route("/api/furniture/trending", get(handlers::furniture::trending_furniture))
        .route("/api/furniture/search", get(handlers::furniture::search_furniture))
        .route(
            "/api/furniture/category/{category}",
            get(handlers::furniture::furniture_by_category),
        )
        .route("/api/furniture/{id}", get(handlers::furniture::get_furniture))
        .route("/api/furniture/{id}/rate", post(handlers::furniture::rate_furniture));

    // Guardas de plano ficam nos próprios handlers (RequirePlan<...>)
    let ai_routes = Router::new()
        .route("/layout-suggestions", post(handlers::ai::layout_suggestions))
        .route("/auto-furnish", post(handlers::ai::auto_furnish))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/ai", ai_routes)
        .merge(project_routes)
        .merge(design_routes)
        .merge(template_routes)
        .merge(furniture_routes)
        .with_state(app_state)
}
