// src/handlers/furniture.rs

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{error::AppError, response::ApiResponse},
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::furniture::{Furniture, FurnitureDetail, RatePayload, RatingAggregate},
    services::catalog::{FurnitureQuery, ListingQuery, SearchQuery},
};

#[utoipa::path(
    get,
    path = "/api/furniture",
    tag = "Furniture",
    params(FurnitureQuery),
    responses(
        (status = 200, description = "Catálogo ativo, filtrado e paginado, com facets"),
        (status = 400, description = "Filtro ou ordenação inválidos")
    )
)]
pub async fn list_furniture(
    State(app_state): State<AppState>,
    Query(query): Query<FurnitureQuery>,
) -> Result<impl IntoResponse, AppError> {
    let result = app_state.furniture_service.list(&query).await?;
    Ok(Json(ApiResponse::ok(result)))
}

#[utoipa::path(
    get,
    path = "/api/furniture/featured",
    tag = "Furniture",
    params(ListingQuery),
    responses(
        (status = 200, description = "Itens em destaque", body = [Furniture])
    )
)]
pub async fn featured_furniture(
    State(app_state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> Result<impl IntoResponse, AppError> {
    let items = app_state.furniture_service.featured(query.limit()).await?;
    Ok(Json(ApiResponse::ok(items)))
}

#[utoipa::path(
    get,
    path = "/api/furniture/trending",
    tag = "Furniture",
    params(ListingQuery),
    responses(
        (status = 200, description = "Itens mais populares", body = [Furniture])
    )
)]
pub async fn trending_furniture(
    State(app_state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> Result<impl IntoResponse, AppError> {
    let items = app_state.furniture_service.trending(query.limit()).await?;
    Ok(Json(ApiResponse::ok(items)))
}

#[utoipa::path(
    get,
    path = "/api/furniture/search",
    tag = "Furniture",
    params(SearchQuery),
    responses(
        (status = 200, description = "Resultados por relevância"),
        (status = 400, description = "Termo de busca ausente")
    )
)]
pub async fn search_furniture(
    State(app_state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = app_state
        .furniture_service
        .search(query.term()?, query.page_request())
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}

#[utoipa::path(
    get,
    path = "/api/furniture/category/{category}",
    tag = "Furniture",
    params(
        ("category" = String, Path, description = "Categoria"),
        FurnitureQuery
    ),
    responses(
        (status = 200, description = "Itens da categoria, paginados")
    )
)]
pub async fn furniture_by_category(
    State(app_state): State<AppState>,
    Path(category): Path<String>,
    Query(mut query): Query<FurnitureQuery>,
) -> Result<impl IntoResponse, AppError> {
    query.category = Some(category);
    let page = app_state.furniture_service.list_page(&query).await?;
    Ok(Json(ApiResponse::ok(page)))
}

#[utoipa::path(
    get,
    path = "/api/furniture/{id}",
    tag = "Furniture",
    params(("id" = Uuid, Path, description = "ID do Móvel")),
    responses(
        (status = 200, description = "Item + preço vigente + itens parecidos", body = FurnitureDetail),
        (status = 404, description = "Item não encontrado ou inativo")
    )
)]
pub async fn get_furniture(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let detail = app_state.furniture_service.get(id).await?;
    Ok(Json(ApiResponse::ok(detail)))
}

#[utoipa::path(
    post,
    path = "/api/furniture/{id}/rate",
    tag = "Furniture",
    request_body = RatePayload,
    params(("id" = Uuid, Path, description = "ID do Móvel")),
    responses(
        (status = 200, description = "Nova média de avaliações", body = RatingAggregate)
    ),
    security(("api_jwt" = []))
)]
pub async fn rate_furniture(
    State(app_state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RatePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let rating = app_state.furniture_service.rate(id, payload.rating).await?;
    Ok(Json(ApiResponse::with_message("Avaliação registrada.", rating)))
}
