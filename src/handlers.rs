pub mod ai;
pub mod auth;
pub mod designs;
pub mod furniture;
pub mod projects;
pub mod templates;
