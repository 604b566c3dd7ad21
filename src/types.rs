//! Typed responses of the PQL metadata endpoints.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::value::Value;

/// SQL the server would run for a PQL query (`/{namespace}/{version}/plan`).
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(from = "RawPlan")]
pub struct QueryPlan {
    /// Compiled SQL statement.
    pub sql: String,
    /// Bound statement parameters, in order.
    pub parameters: Vec<Value>,
}

#[derive(Deserialize)]
struct RawPlan {
    query: String,
    #[serde(default)]
    parameters: Vec<serde_json::Value>,
}

impl From<RawPlan> for QueryPlan {
    fn from(raw: RawPlan) -> Self {
        Self {
            sql: raw.query,
            parameters: raw.parameters.into_iter().map(Value::from).collect(),
        }
    }
}

/// Everything the server exposes, as returned by `/describe-all`:
/// namespace → API version → entity → entity description.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct ServiceSchema {
    namespaces: BTreeMap<String, BTreeMap<String, BTreeMap<String, serde_json::Value>>>,
}

impl ServiceSchema {
    /// Namespace names, sorted.
    pub fn namespaces(&self) -> Vec<&str> {
        self.namespaces.keys().map(String::as_str).collect()
    }

    /// API versions available in `namespace`, sorted. Empty if unknown.
    pub fn versions(&self, namespace: &str) -> Vec<&str> {
        self.namespaces
            .get(namespace)
            .map(|versions| versions.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Entities queryable in `namespace` at `version`, sorted. Empty if unknown.
    pub fn entities(&self, namespace: &str, version: &str) -> Vec<&str> {
        self.namespaces
            .get(namespace)
            .and_then(|versions| versions.get(version))
            .map(|entities| entities.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Description of one entity, if the server lists it.
    pub fn entity(&self, namespace: &str, version: &str, entity: &str) -> Option<Value> {
        self.namespaces
            .get(namespace)?
            .get(version)?
            .get(entity)
            .cloned()
            .map(Value::from)
    }

    /// True if the server knows `namespace`.
    pub fn has_namespace(&self, namespace: &str) -> bool {
        self.namespaces.contains_key(namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plan_deserialize() {
        let plan: QueryPlan = serde_json::from_value(json!({
            "query": "SELECT people.name FROM people WHERE people.name ~ ?",
            "parameters": ["foo", 3]
        }))
        .unwrap();

        assert!(plan.sql.starts_with("SELECT"));
        assert_eq!(
            plan.parameters,
            vec![Value::String("foo".to_string()), Value::Long(3)]
        );
    }

    #[test]
    fn test_plan_without_parameters() {
        let plan: QueryPlan = serde_json::from_str(r#"{"query": "SELECT 1"}"#).unwrap();
        assert!(plan.parameters.is_empty());
    }

    #[test]
    fn test_schema_lookups() {
        let schema: ServiceSchema = serde_json::from_value(json!({
            "test_2": {"v1": {"cars": {"make": "string"}, "people": {}, "pets": {}}},
            "test_1": {"v1": {"people": {"name": "string"}, "pets": {}}}
        }))
        .unwrap();

        assert_eq!(schema.namespaces(), vec!["test_1", "test_2"]);
        assert_eq!(schema.versions("test_1"), vec!["v1"]);
        assert_eq!(schema.entities("test_2", "v1"), vec!["cars", "people", "pets"]);
        assert!(schema.entities("test_3", "v1").is_empty());
        assert!(schema.has_namespace("test_2"));
        assert_eq!(
            schema.entity("test_1", "v1", "people").and_then(|e| e.get("name").cloned()),
            Some(Value::String("string".to_string()))
        );
        assert!(schema.entity("test_1", "v2", "people").is_none());
    }
}
