pub mod generation_store;
pub mod manager;
pub mod models;
pub mod quota_store;
pub mod repository;

pub use generation_store::PgGenerationRepository;
pub use manager::{DatabaseError, DatabaseManager};
pub use quota_store::PgQuotaStore;
pub use repository::{GenerationRepository, MemoryGenerationRepository, RepositoryError};
