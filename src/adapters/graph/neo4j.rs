//! Neo4j product repository over the HTTP transactional Cypher API.
//!
//! Three parameterized query shapes, never free-form Cypher from user input:
//! product-by-name, compatibility-filtered attribute search, and
//! compatibility-only search. Attribute matching is a case-insensitive
//! substring over name + description + embedding text; compatibility is an
//! `EXISTS` check per anchor over `COMPATIBLE_WITH` edges.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

use crate::domain::catalog::{normalize_product_name, ComponentKind, Product};
use crate::domain::configurator::{CompatibilityPredicate, ParameterBag};
use crate::ports::{AttributeFilter, ProductRepository, RepositoryError, RESULT_CAP};

/// Connection settings for the transactional API.
#[derive(Debug, Clone)]
pub struct Neo4jConfig {
    pub uri: String,
    pub username: String,
    password: Secret<String>,
    pub database: String,
    pub timeout: Duration,
}

impl Neo4jConfig {
    pub fn new(
        uri: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            uri: uri.into(),
            username: username.into(),
            password: Secret::new(password.into()),
            database: "neo4j".to_string(),
            timeout: Duration::from_secs(3),
        }
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

/// Graph-backed implementation of the product repository port.
pub struct Neo4jProductRepository {
    config: Neo4jConfig,
    client: Client,
}

impl Neo4jProductRepository {
    pub fn new(config: Neo4jConfig) -> Result<Self, RepositoryError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RepositoryError::Unavailable(e.to_string()))?;
        Ok(Self { config, client })
    }

    fn commit_url(&self) -> String {
        format!("{}/db/{}/tx/commit", self.config.uri, self.config.database)
    }

    /// Appends one `EXISTS` clause per anchor and collects its parameter.
    fn push_anchor_clauses(
        predicate: &CompatibilityPredicate,
        cypher: &mut String,
        params: &mut Map<String, Value>,
    ) {
        for (index, anchor) in predicate.anchors.iter().enumerate() {
            let param = format!("anchor_{index}");
            cypher.push_str(&format!(
                " AND EXISTS {{ MATCH (p)-[:COMPATIBLE_WITH]-(:Product {{gin: ${param}}}) }}"
            ));
            params.insert(param, Value::String(anchor.gin.clone()));
        }
    }

    /// Appends attribute filters: OR within one attribute's values, AND
    /// across attributes, case-insensitive over name, description, and
    /// embedding text.
    fn push_attribute_clauses(
        filters: &[AttributeFilter],
        cypher: &mut String,
        params: &mut Map<String, Value>,
    ) {
        for (filter_index, filter) in filters.iter().enumerate() {
            let mut alternatives = Vec::new();
            for (value_index, value) in filter.values.iter().enumerate() {
                let param = format!("term_{filter_index}_{value_index}");
                alternatives.push(format!(
                    "toLower(p.name) CONTAINS ${param} \
                     OR toLower(coalesce(p.description, '')) CONTAINS ${param} \
                     OR toLower(coalesce(p.embedding_text, '')) CONTAINS ${param}"
                ));
                params.insert(param, Value::String(value.to_lowercase()));
            }
            cypher.push_str(&format!(" AND ({})", alternatives.join(" OR ")));
        }
    }

    async fn run_query(
        &self,
        cypher: String,
        params: Map<String, Value>,
        kind: ComponentKind,
    ) -> Result<Vec<Product>, RepositoryError> {
        debug!(%cypher, "graph query");

        let body = json!({
            "statements": [{
                "statement": cypher,
                "parameters": Value::Object(params),
            }]
        });

        let response = self
            .client
            .post(self.commit_url())
            .basic_auth(&self.config.username, Some(self.config.password()))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RepositoryError::Timeout {
                        timeout_ms: self.config.timeout.as_millis() as u64,
                    }
                } else {
                    RepositoryError::Unavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RepositoryError::Unavailable(format!("status {status}")));
        }

        let parsed: TransactionResponse = response
            .json()
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        if let Some(error) = parsed.errors.first() {
            return Err(RepositoryError::QueryFailed(format!(
                "{}: {}",
                error.code, error.message
            )));
        }

        let rows = parsed
            .results
            .into_iter()
            .next()
            .map(|result| result.data)
            .unwrap_or_default();

        Ok(rows
            .into_iter()
            .filter_map(|row| Self::row_to_product(row.row, kind))
            .collect())
    }

    /// Row layout: [gin, name, category, description, properties].
    fn row_to_product(row: Vec<Value>, requested: ComponentKind) -> Option<Product> {
        let gin = row.first()?.as_str()?.to_string();
        let name = row.get(1)?.as_str()?.to_string();
        let kind = row
            .get(2)
            .and_then(Value::as_str)
            .and_then(ComponentKind::from_category)
            .unwrap_or(requested);
        let description = row.get(3).and_then(Value::as_str).map(str::to_string);

        let mut attributes = BTreeMap::new();
        if let Some(Value::Object(properties)) = row.get(4) {
            for (key, value) in properties {
                // Identity and text columns are already first-class fields.
                if matches!(
                    key.as_str(),
                    "gin" | "name" | "category" | "description" | "embedding_text" | "is_available"
                ) {
                    continue;
                }
                attributes.insert(key.clone(), value.clone());
            }
        }

        Some(Product {
            gin,
            name,
            description,
            kind,
            attributes,
            available: true,
        })
    }
}

#[async_trait]
impl ProductRepository for Neo4jProductRepository {
    async fn lookup_by_name(
        &self,
        kind: ComponentKind,
        raw_name: &str,
    ) -> Result<Vec<Product>, RepositoryError> {
        let token = normalize_product_name(raw_name);
        if token.is_empty() {
            return Ok(Vec::new());
        }

        let cypher = format!(
            "MATCH (p:Product) \
             WHERE p.category = $category AND p.is_available = true \
             AND (toLower(replace(p.name, ' ', '')) CONTAINS $token \
                  OR $token CONTAINS toLower(replace(p.name, ' ', ''))) \
             RETURN p.gin, p.name, p.category, p.description, p {{ .* }} \
             ORDER BY p.name LIMIT {RESULT_CAP}"
        );

        let mut params = Map::new();
        params.insert("category".into(), Value::String(kind.category().to_string()));
        params.insert("token".into(), Value::String(token));

        self.run_query(cypher, params, kind).await
    }

    async fn search(
        &self,
        kind: ComponentKind,
        bag: &ParameterBag,
        predicate: &CompatibilityPredicate,
    ) -> Result<Vec<Product>, RepositoryError> {
        let mut cypher = String::from(
            "MATCH (p:Product) WHERE p.category = $category AND p.is_available = true",
        );
        let mut params = Map::new();
        params.insert("category".into(), Value::String(kind.category().to_string()));

        Self::push_anchor_clauses(predicate, &mut cypher, &mut params);
        Self::push_attribute_clauses(&AttributeFilter::from_bag(bag), &mut cypher, &mut params);

        cypher.push_str(&format!(
            " RETURN p.gin, p.name, p.category, p.description, p {{ .* }} \
             ORDER BY p.name LIMIT {RESULT_CAP}"
        ));

        self.run_query(cypher, params, kind).await
    }

    async fn find_all_compatible(
        &self,
        kind: ComponentKind,
        predicate: &CompatibilityPredicate,
    ) -> Result<Vec<Product>, RepositoryError> {
        let mut cypher = String::from(
            "MATCH (p:Product) WHERE p.category = $category AND p.is_available = true",
        );
        let mut params = Map::new();
        params.insert("category".into(), Value::String(kind.category().to_string()));

        Self::push_anchor_clauses(predicate, &mut cypher, &mut params);

        cypher.push_str(&format!(
            " RETURN p.gin, p.name, p.category, p.description, p {{ .* }} \
             ORDER BY p.name LIMIT {RESULT_CAP}"
        ));

        self.run_query(cypher, params, kind).await
    }
}

#[derive(Debug, Deserialize)]
struct TransactionResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    #[serde(default)]
    errors: Vec<TransactionError>,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    #[serde(default)]
    data: Vec<Row>,
}

#[derive(Debug, Deserialize)]
struct Row {
    #[serde(default)]
    row: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct TransactionError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::configurator::Anchor;

    #[test]
    fn anchor_clauses_are_parameterized() {
        let predicate = CompatibilityPredicate {
            anchors: vec![
                Anchor { kind: ComponentKind::PowerSource, gin: "ps-1".into() },
                Anchor { kind: ComponentKind::Feeder, gin: "f-1".into() },
            ],
        };

        let mut cypher = String::new();
        let mut params = Map::new();
        Neo4jProductRepository::push_anchor_clauses(&predicate, &mut cypher, &mut params);

        assert_eq!(cypher.matches("COMPATIBLE_WITH").count(), 2);
        assert_eq!(params.get("anchor_0").unwrap(), "ps-1");
        assert_eq!(params.get("anchor_1").unwrap(), "f-1");
    }

    #[test]
    fn attribute_clauses_or_within_and_across() {
        let filters = vec![
            AttributeFilter { attribute: "cable_length".into(), values: vec![" 5m".into(), " 5.0m".into()] },
            AttributeFilter { attribute: "cooling_type".into(), values: vec!["water".into()] },
        ];

        let mut cypher = String::new();
        let mut params = Map::new();
        Neo4jProductRepository::push_attribute_clauses(&filters, &mut cypher, &mut params);

        // two AND groups, the first with two OR'ed terms
        assert_eq!(cypher.matches(" AND (").count(), 2);
        assert_eq!(params.get("term_0_0").unwrap(), " 5m");
        assert_eq!(params.get("term_0_1").unwrap(), " 5.0m");
        assert_eq!(params.get("term_1_0").unwrap(), "water");
    }

    #[test]
    fn search_terms_are_lowercased() {
        let filters = vec![AttributeFilter {
            attribute: "process".into(),
            values: vec!["MIG (GMAW)".into()],
        }];

        let mut cypher = String::new();
        let mut params = Map::new();
        Neo4jProductRepository::push_attribute_clauses(&filters, &mut cypher, &mut params);

        assert_eq!(params.get("term_0_0").unwrap(), "mig (gmaw)");
    }

    #[test]
    fn rows_parse_into_products() {
        let row = vec![
            json!("0446200880"),
            json!("Aristo 500ix"),
            json!("PowerSource"),
            json!("500 A MIG power source"),
            json!({"gin": "0446200880", "name": "Aristo 500ix", "current": "500 A", "is_available": true}),
        ];

        let product =
            Neo4jProductRepository::row_to_product(row, ComponentKind::PowerSource).unwrap();
        assert_eq!(product.gin, "0446200880");
        assert_eq!(product.kind, ComponentKind::PowerSource);
        assert_eq!(product.attribute_str("current"), Some("500 A"));
        // identity columns are not duplicated into attributes
        assert!(!product.attributes.contains_key("gin"));
    }

    #[test]
    fn malformed_rows_are_skipped() {
        assert!(Neo4jProductRepository::row_to_product(vec![], ComponentKind::Torch).is_none());
        assert!(
            Neo4jProductRepository::row_to_product(vec![json!(42)], ComponentKind::Torch).is_none()
        );
    }
}
