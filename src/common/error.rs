// src/common/error.rs

use std::sync::OnceLock;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::models::auth::SubscriptionPlan;

// Definido uma única vez no boot (APP_ENV=development expõe detalhes dos erros 500)
static EXPOSE_INTERNAL_ERRORS: OnceLock<bool> = OnceLock::new();

pub fn set_expose_internal_errors(expose: bool) {
    let _ = EXPOSE_INTERNAL_ERRORS.set(expose);
}

fn expose_internal_errors() -> bool {
    EXPOSE_INTERNAL_ERRORS.get().copied().unwrap_or(false)
}

// Nosso tipo de erro, agora com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // Erro de validação de um único campo, montado à mão nos services
    #[error("Campo inválido '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Não autenticado")]
    Unauthenticated,

    #[error("Acesso negado: {0}")]
    Forbidden(String),

    #[error("Plano de assinatura insuficiente")]
    PlanRequired {
        required: SubscriptionPlan,
        current: SubscriptionPlan,
    },

    #[error("{0} não encontrado")]
    NotFound(String),

    #[error("Não é possível remover a si mesmo como colaborador")]
    CannotRemoveSelf,

    #[error("Conflito: {0}")]
    Conflict(String),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro de serialização: {0}")]
    SerializationError(#[from] serde_json::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        AppError::InvalidField {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::InvalidField { .. } => StatusCode::BAD_REQUEST,
            AppError::CannotRemoveSelf => StatusCode::BAD_REQUEST,
            AppError::EmailAlreadyExists | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) | AppError::PlanRequired { .. } => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match &self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details: Vec<Value> = Vec::new();
                for (field, field_errors) in errors.field_errors() {
                    for error in field_errors {
                        let message = error
                            .message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| error.code.to_string());
                        details.push(json!({ "field": field, "message": message }));
                    }
                }
                json!({
                    "success": false,
                    "message": "Um ou mais campos são inválidos.",
                    "errors": details,
                })
            }
            AppError::InvalidField { field, message } => json!({
                "success": false,
                "message": "Um ou mais campos são inválidos.",
                "errors": [{ "field": field, "message": message }],
            }),
            AppError::PlanRequired { required, current } => json!({
                "success": false,
                "message": format!("Este recurso exige o plano '{}'.", required),
                "requiredPlan": required,
                "currentPlan": current,
            }),
            AppError::EmailAlreadyExists => json!({ "success": false, "message": "Este e-mail já está em uso." }),
            AppError::InvalidCredentials => json!({ "success": false, "message": "E-mail ou senha inválidos." }),
            AppError::Unauthenticated => json!({
                "success": false,
                "message": "Token de autenticação inválido ou ausente.",
            }),
            AppError::Forbidden(_)
            | AppError::NotFound(_)
            | AppError::CannotRemoveSelf
            | AppError::Conflict(_) => json!({ "success": false, "message": self.to_string() }),

            // Todos os outros erros viram 500. O `tracing` registra a mensagem detalhada.
            e => {
                tracing::error!("Erro Interno do Servidor: {:?}", e);
                let message = if expose_internal_errors() {
                    e.to_string()
                } else {
                    "Ocorreu um erro inesperado.".to_string()
                };
                json!({ "success": false, "message": message })
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_taxonomy() {
        assert_eq!(AppError::Unauthenticated.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::NotFound("Projeto".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::CannotRemoveSelf.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::PlanRequired {
                required: SubscriptionPlan::Pro,
                current: SubscriptionPlan::Free
            }
            .status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::InternalServerError(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
