pub mod catalog;
pub mod client;
pub mod connection;
pub mod executor;
pub mod types;

pub use catalog::{CatalogAccess, SqlServerCatalog};
pub use types::{DependencyRow, EngineEdition, ServerInfo};
