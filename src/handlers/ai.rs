// src/handlers/ai.rs

use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{error::AppError, response::ApiResponse},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        plan::{PlanEnterprise, PlanPro, RequirePlan},
    },
    models::design::Design,
    services::layout_assistant::LayoutSuggestion,
};

const DEFAULT_SUGGESTIONS: usize = 5;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LayoutRequestPayload {
    pub design_id: Uuid,

    #[validate(range(min = 1, max = 10, message = "Entre 1 e 10 sugestões."))]
    pub max_suggestions: Option<usize>,
}

impl LayoutRequestPayload {
    fn max(&self) -> usize {
        self.max_suggestions.unwrap_or(DEFAULT_SUGGESTIONS)
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AutoFurnishResult {
    pub design: Design,
    pub added: Vec<LayoutSuggestion>,
}

// POST /api/ai/layout-suggestions (pro+)
#[utoipa::path(
    post,
    path = "/api/ai/layout-suggestions",
    tag = "AI",
    request_body = LayoutRequestPayload,
    responses(
        (status = 200, description = "Sugestões de posicionamento", body = [LayoutSuggestion]),
        (status = 403, description = "Plano insuficiente"),
        (status = 404, description = "Design não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn layout_suggestions(
    State(app_state): State<AppState>,
    _guard: RequirePlan<PlanPro>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<LayoutRequestPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let design = app_state.design_service.get(payload.design_id, Some(&user)).await?;
    let suggestions = app_state.layout_assistant.suggest(&design, payload.max()).await?;

    Ok(Json(ApiResponse::ok(suggestions)))
}

// POST /api/ai/auto-furnish (enterprise)
#[utoipa::path(
    post,
    path = "/api/ai/auto-furnish",
    tag = "AI",
    request_body = LayoutRequestPayload,
    responses(
        (status = 200, description = "Design com os itens sugeridos já posicionados", body = AutoFurnishResult),
        (status = 403, description = "Plano insuficiente ou papel sem edição"),
        (status = 404, description = "Design não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn auto_furnish(
    State(app_state): State<AppState>,
    _guard: RequirePlan<PlanEnterprise>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<LayoutRequestPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let design = app_state.design_service.get(payload.design_id, Some(&user)).await?;
    let added = app_state.layout_assistant.suggest(&design, payload.max()).await?;

    let items = added.iter().cloned().map(LayoutSuggestion::into_placed).collect();
    let design = app_state
        .design_service
        .add_furniture_batch(design.id, &user, items)
        .await?;

    tracing::info!(design_id = %design.id, added = added.len(), "Design mobiliado automaticamente");
    Ok(Json(ApiResponse::ok(AutoFurnishResult { design, added })))
}
