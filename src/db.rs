pub mod store;
pub use store::{Collection, Document, DocumentStore, Filter, Query, Sort, SortDirection, TextSearch};
pub mod memory_store;
pub use memory_store::MemoryDocumentStore;
pub mod pg_store;
pub use pg_store::PgDocumentStore;

pub mod user_repo;
pub use user_repo::UserRepository;
pub mod project_repo;
pub use project_repo::ProjectRepository;
pub mod design_repo;
pub use design_repo::DesignRepository;
pub mod template_repo;
pub use template_repo::TemplateRepository;
pub mod furniture_repo;
pub use furniture_repo::FurnitureRepository;
