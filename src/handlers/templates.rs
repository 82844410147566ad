// src/handlers/templates.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{error::AppError, response::ApiResponse},
    config::AppState,
    middleware::auth::{AuthenticatedUser, MaybeUser},
    models::{
        design::Design,
        furniture::{RatePayload, RatingAggregate},
        template::{Template, TemplateCategory, TemplateStyle, UseTemplatePayload},
    },
    services::catalog::{ListingQuery, SearchQuery, TemplateQuery},
};

// Todas as listagens enxergam só os planos até o do usuário (anônimo = free)

#[utoipa::path(
    get,
    path = "/api/templates",
    tag = "Templates",
    params(TemplateQuery),
    responses(
        (status = 200, description = "Templates visíveis ao plano, paginados, com facets")
    ),
    security((), ("api_jwt" = []))
)]
pub async fn list_templates(
    State(app_state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Query(query): Query<TemplateQuery>,
) -> Result<impl IntoResponse, AppError> {
    let result = app_state.template_service.list(user.as_ref(), &query).await?;
    Ok(Json(ApiResponse::ok(result)))
}

#[utoipa::path(
    get,
    path = "/api/templates/featured",
    tag = "Templates",
    params(ListingQuery),
    responses(
        (status = 200, description = "Templates em destaque", body = [Template])
    ),
    security((), ("api_jwt" = []))
)]
pub async fn featured_templates(
    State(app_state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Query(query): Query<ListingQuery>,
) -> Result<impl IntoResponse, AppError> {
    let templates = app_state
        .template_service
        .featured(user.as_ref(), query.limit())
        .await?;
    Ok(Json(ApiResponse::ok(templates)))
}

#[utoipa::path(
    get,
    path = "/api/templates/search",
    tag = "Templates",
    params(SearchQuery),
    responses(
        (status = 200, description = "Resultados por relevância"),
        (status = 400, description = "Termo de busca ausente")
    ),
    security((), ("api_jwt" = []))
)]
pub async fn search_templates(
    State(app_state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = app_state
        .template_service
        .search(user.as_ref(), query.term()?, query.page_request())
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}

#[utoipa::path(
    get,
    path = "/api/templates/category/{category}",
    tag = "Templates",
    params(
        ("category" = TemplateCategory, Path, description = "Categoria"),
        TemplateQuery
    ),
    responses(
        (status = 200, description = "Templates da categoria, paginados")
    ),
    security((), ("api_jwt" = []))
)]
pub async fn templates_by_category(
    State(app_state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(category): Path<TemplateCategory>,
    Query(mut query): Query<TemplateQuery>,
) -> Result<impl IntoResponse, AppError> {
    query.category = Some(category);
    let page = app_state.template_service.list_page(user.as_ref(), &query).await?;
    Ok(Json(ApiResponse::ok(page)))
}

#[utoipa::path(
    get,
    path = "/api/templates/style/{style}",
    tag = "Templates",
    params(
        ("style" = TemplateStyle, Path, description = "Estilo"),
        TemplateQuery
    ),
    responses(
        (status = 200, description = "Templates do estilo, paginados")
    ),
    security((), ("api_jwt" = []))
)]
pub async fn templates_by_style(
    State(app_state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(style): Path<TemplateStyle>,
    Query(mut query): Query<TemplateQuery>,
) -> Result<impl IntoResponse, AppError> {
    query.style = Some(style);
    let page = app_state.template_service.list_page(user.as_ref(), &query).await?;
    Ok(Json(ApiResponse::ok(page)))
}

#[utoipa::path(
    get,
    path = "/api/templates/{id}",
    tag = "Templates",
    params(("id" = Uuid, Path, description = "ID do Template")),
    responses(
        (status = 200, description = "Template (conta como uso)", body = Template),
        (status = 403, description = "Plano insuficiente (requiredPlan/currentPlan)"),
        (status = 404, description = "Template não encontrado")
    ),
    security((), ("api_jwt" = []))
)]
pub async fn get_template(
    State(app_state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let template = app_state.template_service.get(id, user.as_ref()).await?;
    Ok(Json(ApiResponse::ok(template)))
}

#[utoipa::path(
    post,
    path = "/api/templates/{id}/use",
    tag = "Templates",
    request_body = UseTemplatePayload,
    params(("id" = Uuid, Path, description = "ID do Template")),
    responses(
        (status = 201, description = "Design criado a partir do template", body = Design),
        (status = 403, description = "Plano insuficiente")
    ),
    security(("api_jwt" = []))
)]
pub async fn use_template(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UseTemplatePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let design = app_state.template_service.use_template(id, &user, payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Design criado a partir do template.", design)),
    ))
}

#[utoipa::path(
    post,
    path = "/api/templates/{id}/rate",
    tag = "Templates",
    request_body = RatePayload,
    params(("id" = Uuid, Path, description = "ID do Template")),
    responses(
        (status = 200, description = "Nova média de avaliações", body = RatingAggregate)
    ),
    security(("api_jwt" = []))
)]
pub async fn rate_template(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RatePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let rating = app_state.template_service.rate(id, &user, payload.rating).await?;
    Ok(Json(ApiResponse::with_message("Avaliação registrada.", rating)))
}
