// src/db/user_repo.rs

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::store::{Collection, DocumentStore, Filter, Query},
    models::auth::{SubscriptionPlan, User},
};

// O repositório de usuários, responsável por todas as interações com a coleção 'users'
#[derive(Clone)]
pub struct UserRepository {
    users: Collection<User>,
}

impl UserRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            users: Collection::new(store),
        }
    }

    // Busca um usuário pelo seu e-mail (sempre normalizado em minúsculas)
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let query = Query::new(Filter::eq("email", json!(email.to_lowercase()))).limit(1);
        Ok(self.users.find(&query).await?.into_iter().next())
    }

    // Busca um usuário pelo seu ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        self.users.find_by_id(id).await
    }

    // Cria um novo usuário no plano gratuito
    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, AppError> {
        // Checagem + inserção sem transação: o índice único do e-mail não existe
        // no armazenamento de documentos, então a corrida é aceita.
        if self.find_by_email(email).await?.is_some() {
            return Err(AppError::EmailAlreadyExists);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            email: email.to_lowercase(),
            password_hash: password_hash.to_string(),
            subscription_plan: SubscriptionPlan::Free,
            is_active: true,
            avatar: None,
            created_at: now,
            updated_at: now,
        };
        self.users.insert(&user).await?;
        Ok(user)
    }

    pub async fn save(&self, user: &mut User) -> Result<(), AppError> {
        user.updated_at = Utc::now();
        if !self.users.replace(user).await? {
            return Err(AppError::NotFound("Usuário".into()));
        }
        Ok(())
    }
}
