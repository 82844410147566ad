pub mod access_policy;
pub mod auth;
pub mod catalog;
pub mod design_service;
pub mod furniture_service;
pub mod layout_assistant;
pub mod project_service;
pub mod subscription;
pub mod template_service;
