// tests/common/mod.rs

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use roomforge::{
    build_router,
    config::{AppState, Config},
    db::{FurnitureRepository, MemoryDocumentStore, TemplateRepository, UserRepository},
    models::auth::SubscriptionPlan,
};

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

pub fn test_config() -> Config {
    Config {
        app_env: "test".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        database_url: None,
        database_max_connections: 1,
        jwt_secret: "segredo-de-teste".to_string(),
        jwt_expires_in_days: 1,
        bcrypt_cost: 4,
    }
}

impl TestApp {
    pub fn new() -> Self {
        let state = AppState::with_store(test_config(), MemoryDocumentStore::new_shared(), None);
        Self {
            router: build_router(state.clone()),
            state,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// Registra um usuário e devolve (token, id).
    pub async fn register(&self, name: &str, email: &str) -> (String, Uuid) {
        let (status, body) = self
            .post(
                "/api/auth/register",
                None,
                json!({ "name": name, "email": email, "password": "senha-forte" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");

        let token = body["data"]["token"].as_str().unwrap().to_string();
        let id = body["data"]["user"]["id"].as_str().unwrap().parse().unwrap();
        (token, id)
    }

    pub async fn set_plan(&self, user_id: Uuid, plan: SubscriptionPlan) {
        let users = UserRepository::new(self.state.store.clone());
        let mut user = users.find_by_id(user_id).await.unwrap().unwrap();
        user.subscription_plan = plan;
        users.save(&mut user).await.unwrap();
    }

    pub fn templates(&self) -> TemplateRepository {
        TemplateRepository::new(self.state.store.clone())
    }

    pub fn furniture(&self) -> FurnitureRepository {
        FurnitureRepository::new(self.state.store.clone())
    }

    /// Cria um projeto e devolve o id.
    pub async fn create_project(&self, token: &str, name: &str) -> Uuid {
        let (status, body) = self
            .post("/api/projects", Some(token), json!({ "name": name }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["id"].as_str().unwrap().parse().unwrap()
    }

    pub async fn create_design(&self, token: &str, project_id: Uuid, name: &str) -> Uuid {
        let (status, body) = self
            .post(
                "/api/designs",
                Some(token),
                json!({ "projectId": project_id, "name": name }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["id"].as_str().unwrap().parse().unwrap()
    }
}
