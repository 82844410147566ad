pub mod auth;
pub mod plan;
