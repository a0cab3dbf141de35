//! PostgreSQL adapters.

mod archive;

pub use archive::PostgresArchive;
