// src/services/subscription.rs

use crate::{common::error::AppError, models::auth::SubscriptionPlan};

/// Posição do plano na hierarquia: free=1, pro=2, enterprise=3.
pub fn tier_rank(plan: SubscriptionPlan) -> u8 {
    match plan {
        SubscriptionPlan::Free => 1,
        SubscriptionPlan::Pro => 2,
        SubscriptionPlan::Enterprise => 3,
    }
}

pub fn can_access(user_plan: SubscriptionPlan, required: SubscriptionPlan) -> bool {
    tier_rank(user_plan) >= tier_rank(required)
}

/// Todos os planos cujo conteúdo o plano do usuário enxerga.
pub fn visible_tiers(user_plan: SubscriptionPlan) -> Vec<SubscriptionPlan> {
    SubscriptionPlan::ALL
        .into_iter()
        .filter(|tier| can_access(user_plan, *tier))
        .collect()
}

/// Versão "falível" de `can_access`, já com o contexto required/current do 403.
pub fn require_plan(user_plan: SubscriptionPlan, required: SubscriptionPlan) -> Result<(), AppError> {
    if can_access(user_plan, required) {
        Ok(())
    } else {
        Err(AppError::PlanRequired {
            required,
            current: user_plan,
        })
    }
}
