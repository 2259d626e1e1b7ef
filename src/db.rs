pub mod memory_store;
pub mod store;
pub mod user_repo;

pub use memory_store::MemoryCredentialStore;
pub use store::CredentialStore;
pub use user_repo::PgCredentialStore;
