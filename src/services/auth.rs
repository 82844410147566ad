// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{AuthResponse, Claims, RegisterUserPayload, User, UserProfile},
};

// Resolve credenciais (bearer JWT) em usuários e emite novos tokens
#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
    token_ttl: Duration,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: String, token_ttl_days: i64) -> Self {
        Self {
            user_repo,
            jwt_secret,
            token_ttl: Duration::days(token_ttl_days),
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }

    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    pub async fn register_user(&self, payload: RegisterUserPayload) -> Result<AuthResponse, AppError> {
        // Hashing fora do runtime async: bcrypt é CPU-bound
        let password = payload.password;
        let cost = self.bcrypt_cost;
        let hashed_password = tokio::task::spawn_blocking(move || hash(&password, cost))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        let user = self
            .user_repo
            .create_user(&payload.name, &payload.email, &hashed_password)
            .await?;

        tracing::info!(user_id = %user.id, "Novo usuário registrado");
        self.auth_response(&user)
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid =
            tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid || !user.is_active {
            return Err(AppError::InvalidCredentials);
        }

        self.auth_response(&user)
    }

    /// Modo obrigatório: qualquer falha de resolução vira `Unauthenticated`.
    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        self.resolve(Some(token)).await?.ok_or(AppError::Unauthenticated)
    }

    /// Modo opcional: token ausente, malformado, expirado ou de usuário
    /// inativo/inexistente resulta em `None`. Só falhas do armazenamento
    /// sobem como erro.
    pub async fn resolve(&self, token: Option<&str>) -> Result<Option<User>, AppError> {
        let Some(token) = token else {
            return Ok(None);
        };

        let claims = match decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        ) {
            Ok(data) => data.claims,
            Err(e) => {
                tracing::debug!("Token rejeitado: {}", e);
                return Ok(None);
            }
        };

        Ok(self
            .user_repo
            .find_by_id(claims.sub)
            .await?
            .filter(|user| user.is_active))
    }

    fn auth_response(&self, user: &User) -> Result<AuthResponse, AppError> {
        Ok(AuthResponse {
            token: self.create_token(user.id)?,
            user: UserProfile::from(user),
        })
    }

    pub fn create_token(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + self.token_ttl;

        let claims = Claims {
            sub: user_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}
