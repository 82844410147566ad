pub mod auth;
pub mod design;
pub mod furniture;
pub mod geometry;
pub mod project;
pub mod template;
