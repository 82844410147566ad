// src/middleware/plan.rs

use std::marker::PhantomData;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::auth::SubscriptionPlan,
    services::subscription,
};

/// 1. O trait que define um plano mínimo
pub trait PlanDef: Send + Sync + 'static {
    fn plan() -> SubscriptionPlan;
}

/// 2. O extractor (guardião): exige identidade e plano >= `T::plan()`
pub struct RequirePlan<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequirePlan<T>
where
    T: PlanDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(user) = AuthenticatedUser::from_request_parts(parts, state).await?;

        let required = T::plan();
        if let Err(e) = subscription::require_plan(user.subscription_plan, required) {
            tracing::warn!(
                user_id = %user.id,
                current = %user.subscription_plan,
                required = %required,
                "Recurso exige plano superior"
            );
            return Err(e);
        }

        Ok(RequirePlan(PhantomData))
    }
}

// ---
// DEFINIÇÃO DOS PLANOS (TIPOS)
// ---

pub struct PlanPro;
impl PlanDef for PlanPro {
    fn plan() -> SubscriptionPlan { SubscriptionPlan::Pro }
}

pub struct PlanEnterprise;
impl PlanDef for PlanEnterprise {
    fn plan() -> SubscriptionPlan { SubscriptionPlan::Enterprise }
}
