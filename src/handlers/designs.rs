// src/handlers/designs.rs

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
    models::design::{
        CreateDesignPayload, Design, DesignListQuery, DuplicateDesignPayload, FurniturePatch,
        PlaceFurniturePayload, UpdateDesignPayload,
    },
};

// GET /api/designs
#[utoipa::path(
    get,
    path = "/api/designs",
    tag = "Designs",
    params(DesignListQuery),
    responses(
        (status = 200, description = "Designs dos projetos acessíveis (ou de um projeto)"),
        (status = 404, description = "Projeto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_designs(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(query): Query<DesignListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = app_state.design_service.list(&user, &query).await?;
    Ok(Json(ApiResponse::ok(page)))
}

#[utoipa::path(
    get,
    path = "/api/designs/public",
    tag = "Designs",
    params(DesignListQuery),
    responses(
        (status = 200, description = "Designs públicos, paginados")
    )
)]
pub async fn list_public_designs(
    State(app_state): State<AppState>,
    Query(query): Query<DesignListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = app_state.design_service.list_public(&query).await?;
    Ok(Json(ApiResponse::ok(page)))
}

#[utoipa::path(
    get,
    path = "/api/designs/{id}",
    tag = "Designs",
    params(("id" = Uuid, Path, description = "ID do Design")),
    responses(
        (status = 200, description = "Design", body = Design),
        (status = 404, description = "Design não encontrado (ou privado)")
    ),
    security((), ("api_jwt" = []))
)]
pub async fn get_design(
    State(app_state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let design = app_state.design_service.get(id, user.as_ref()).await?;
    Ok(Json(ApiResponse::ok(design)))
}

#[utoipa::path(
    post,
    path = "/api/designs",
    tag = "Designs",
    request_body = CreateDesignPayload,
    responses(
        (status = 201, description = "Design criado", body = Design),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Projeto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_design(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateDesignPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let design = app_state.design_service.create(&user, payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Design criado com sucesso.", design)),
    ))
}

#[utoipa::path(
    put,
    path = "/api/designs/{id}",
    tag = "Designs",
    request_body = UpdateDesignPayload,
    params(("id" = Uuid, Path, description = "ID do Design")),
    responses(
        (status = 200, description = "Design atualizado", body = Design),
        (status = 403, description = "Exige papel editor")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_design(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDesignPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let design = app_state.design_service.update(id, &user, payload).await?;
    Ok(Json(ApiResponse::with_message("Design atualizado com sucesso.", design)))
}

#[utoipa::path(
    delete,
    path = "/api/designs/{id}",
    tag = "Designs",
    params(("id" = Uuid, Path, description = "ID do Design")),
    responses(
        (status = 200, description = "Design removido"),
        (status = 403, description = "Exige papel editor")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_design(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.design_service.delete(id, &user).await?;
    Ok(Json(ApiResponse::message("Design removido com sucesso.")))
}

// =============================================================================
//  MÓVEIS POSICIONADOS
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/designs/{id}/furniture",
    tag = "Designs",
    request_body = PlaceFurniturePayload,
    params(("id" = Uuid, Path, description = "ID do Design")),
    responses(
        (status = 201, description = "Item adicionado; metadados recalculados", body = Design),
        (status = 409, description = "Já existe um item com esse id")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_furniture(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<PlaceFurniturePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let (design, _) = app_state.design_service.add_furniture(id, &user, payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Item adicionado ao design.", design)),
    ))
}

#[utoipa::path(
    put,
    path = "/api/designs/{id}/furniture/{item_id}",
    tag = "Designs",
    request_body = FurniturePatch,
    params(
        ("id" = Uuid, Path, description = "ID do Design"),
        ("item_id" = String, Path, description = "ID do item no design")
    ),
    responses(
        (status = 200, description = "Item atualizado", body = Design),
        (status = 404, description = "Item não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_furniture(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path((id, item_id)): Path<(Uuid, String)>,
    Json(patch): Json<FurniturePatch>,
) -> Result<impl IntoResponse, AppError> {
    patch.validate()?;

    let design = app_state
        .design_service
        .update_furniture(id, &user, &item_id, patch)
        .await?;
    Ok(Json(ApiResponse::with_message("Item atualizado.", design)))
}

#[utoipa::path(
    delete,
    path = "/api/designs/{id}/furniture/{item_id}",
    tag = "Designs",
    params(
        ("id" = Uuid, Path, description = "ID do Design"),
        ("item_id" = String, Path, description = "ID do item no design")
    ),
    responses(
        (status = 200, description = "Item removido (sem efeito se não existia)", body = Design)
    ),
    security(("api_jwt" = []))
)]
pub async fn remove_furniture(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path((id, item_id)): Path<(Uuid, String)>,
) -> Result<impl IntoResponse, AppError> {
    let design = app_state
        .design_service
        .remove_furniture(id, &user, &item_id)
        .await?;
    Ok(Json(ApiResponse::with_message("Item removido.", design)))
}

#[utoipa::path(
    post,
    path = "/api/designs/{id}/duplicate",
    tag = "Designs",
    request_body = DuplicateDesignPayload,
    params(("id" = Uuid, Path, description = "ID do Design de origem")),
    responses(
        (status = 201, description = "Cópia criada", body = Design)
    ),
    security(("api_jwt" = []))
)]
pub async fn duplicate_design(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<DuplicateDesignPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let design = app_state.design_service.duplicate(id, &user, payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Design duplicado com sucesso.", design)),
    ))
}
