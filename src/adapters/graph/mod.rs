//! Product graph adapters.

mod neo4j;

pub use neo4j::{Neo4jConfig, Neo4jProductRepository};
