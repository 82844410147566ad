// src/handlers/projects.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{error::AppError, response::ApiResponse},
    config::AppState,
    middleware::auth::{AuthenticatedUser, MaybeUser},
    models::{
        design::Design,
        project::{
            AddCollaboratorPayload, CreateProjectPayload, DuplicateProjectPayload, Project,
            ProjectListQuery, UpdateCollaboratorRolePayload, UpdateProjectPayload,
        },
    },
};

#[derive(Debug, Serialize, ToSchema)]
pub struct DuplicatedProject {
    pub project: Project,
    pub designs: Vec<Design>,
}

// =============================================================================
//  1. LISTAGENS
// =============================================================================

// GET /api/projects
#[utoipa::path(
    get,
    path = "/api/projects",
    tag = "Projects",
    params(ProjectListQuery),
    responses(
        (status = 200, description = "Projetos do usuário (dono ou colaborador), paginados")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_my_projects(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(query): Query<ProjectListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = app_state.project_service.list_mine(&user, &query).await?;
    Ok(Json(ApiResponse::ok(page)))
}

// GET /api/projects/public
#[utoipa::path(
    get,
    path = "/api/projects/public",
    tag = "Projects",
    params(ProjectListQuery),
    responses(
        (status = 200, description = "Projetos públicos, paginados")
    )
)]
pub async fn list_public_projects(
    State(app_state): State<AppState>,
    Query(query): Query<ProjectListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = app_state.project_service.list_public(&query).await?;
    Ok(Json(ApiResponse::ok(page)))
}

// =============================================================================
//  2. CRUD
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    tag = "Projects",
    params(("id" = Uuid, Path, description = "ID do Projeto")),
    responses(
        (status = 200, description = "Projeto", body = Project),
        (status = 404, description = "Projeto não encontrado (ou privado)")
    ),
    security((), ("api_jwt" = []))
)]
pub async fn get_project(
    State(app_state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let project = app_state.project_service.get(id, user.as_ref()).await?;
    Ok(Json(ApiResponse::ok(project)))
}

#[utoipa::path(
    post,
    path = "/api/projects",
    tag = "Projects",
    request_body = CreateProjectPayload,
    responses(
        (status = 201, description = "Projeto criado", body = Project),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_project(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateProjectPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let project = app_state.project_service.create(&user, payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Projeto criado com sucesso.", project)),
    ))
}

#[utoipa::path(
    put,
    path = "/api/projects/{id}",
    tag = "Projects",
    request_body = UpdateProjectPayload,
    params(("id" = Uuid, Path, description = "ID do Projeto")),
    responses(
        (status = 200, description = "Projeto atualizado (versão incrementada)", body = Project),
        (status = 403, description = "Papel insuficiente (editor ou superior)")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_project(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProjectPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let project = app_state.project_service.update(id, &user, payload).await?;
    Ok(Json(ApiResponse::with_message("Projeto atualizado com sucesso.", project)))
}

#[utoipa::path(
    delete,
    path = "/api/projects/{id}",
    tag = "Projects",
    params(("id" = Uuid, Path, description = "ID do Projeto")),
    responses(
        (status = 200, description = "Projeto e seus designs removidos"),
        (status = 403, description = "Apenas o dono pode remover")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_project(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let deleted_designs = app_state.project_service.delete(id, &user).await?;
    Ok(Json(ApiResponse::with_message(
        "Projeto removido com sucesso.",
        json!({ "deletedDesigns": deleted_designs }),
    )))
}

// =============================================================================
//  3. COLABORADORES
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/projects/{id}/collaborators",
    tag = "Projects",
    request_body = AddCollaboratorPayload,
    params(("id" = Uuid, Path, description = "ID do Projeto")),
    responses(
        (status = 200, description = "Colaborador adicionado (ou papel sobrescrito)", body = Project),
        (status = 403, description = "Exige papel admin"),
        (status = 404, description = "Projeto ou usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_collaborator(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddCollaboratorPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let project = app_state
        .project_service
        .add_collaborator(id, &user, payload)
        .await?;
    Ok(Json(ApiResponse::with_message("Colaborador adicionado.", project)))
}

#[utoipa::path(
    put,
    path = "/api/projects/{id}/collaborators/{user_id}",
    tag = "Projects",
    request_body = UpdateCollaboratorRolePayload,
    params(
        ("id" = Uuid, Path, description = "ID do Projeto"),
        ("user_id" = Uuid, Path, description = "ID do Colaborador")
    ),
    responses(
        (status = 200, description = "Papel atualizado", body = Project),
        (status = 404, description = "Usuário não colabora no projeto")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_collaborator_role(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateCollaboratorRolePayload>,
) -> Result<impl IntoResponse, AppError> {
    let project = app_state
        .project_service
        .update_collaborator_role(id, &user, user_id, payload.role)
        .await?;
    Ok(Json(ApiResponse::with_message("Papel do colaborador atualizado.", project)))
}

#[utoipa::path(
    delete,
    path = "/api/projects/{id}/collaborators/{user_id}",
    tag = "Projects",
    params(
        ("id" = Uuid, Path, description = "ID do Projeto"),
        ("user_id" = Uuid, Path, description = "ID do Colaborador")
    ),
    responses(
        (status = 200, description = "Colaborador removido (sem efeito se não existia)", body = Project),
        (status = 400, description = "Não é possível remover a si mesmo")
    ),
    security(("api_jwt" = []))
)]
pub async fn remove_collaborator(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let project = app_state
        .project_service
        .remove_collaborator(id, &user, user_id)
        .await?;
    Ok(Json(ApiResponse::with_message("Colaborador removido.", project)))
}

// =============================================================================
//  4. DUPLICAÇÃO
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/projects/{id}/duplicate",
    tag = "Projects",
    request_body = DuplicateProjectPayload,
    params(("id" = Uuid, Path, description = "ID do Projeto de origem")),
    responses(
        (status = 201, description = "Cópia criada com todos os designs", body = DuplicatedProject)
    ),
    security(("api_jwt" = []))
)]
pub async fn duplicate_project(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<DuplicateProjectPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let (project, designs) = app_state.project_service.duplicate(id, &user, payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Projeto duplicado com sucesso.",
            DuplicatedProject { project, designs },
        )),
    ))
}
