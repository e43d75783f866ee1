//! Just enough of the schema to match abstract types and sanity check the cache options.

use serde::Deserialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("introspection result has no `__schema`")]
    MissingSchema,
    #[error("invalid introspection result: {0}")]
    Invalid(#[from] serde_json::Error)
}

#[derive(Deserialize)]
struct NamedRef {
    name: String
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IntrospectionType {
    kind: String,
    name: String,
    #[serde(default)]
    fields: Option<Vec<NamedRef>>,
    #[serde(default)]
    possible_types: Option<Vec<NamedRef>>
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IntrospectionSchema {
    query_type: Option<NamedRef>,
    mutation_type: Option<NamedRef>,
    subscription_type: Option<NamedRef>,
    types: Vec<IntrospectionType>
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaMetadata {
    pub query_type: String,
    pub mutation_type: Option<String>,
    pub subscription_type: Option<String>,
    object_types: HashSet<String>,
    possible_types: HashMap<String, HashSet<String>>,
    mutation_fields: HashSet<String>
}

impl SchemaMetadata {
    /// Read a standard introspection query result. Both the bare `{ "__schema": ... }` form and
    /// the full response `{ "data": { "__schema": ... } }` are accepted.
    pub fn from_introspection(introspection: &Value) -> Result<Self, SchemaError> {
        let schema = introspection
            .get("__schema")
            .or_else(|| introspection.get("data").and_then(|data| data.get("__schema")))
            .ok_or(SchemaError::MissingSchema)?;
        let schema = IntrospectionSchema::deserialize(schema)?;

        let query_type = schema
            .query_type
            .map(|t| t.name)
            .unwrap_or_else(|| "Query".to_string());
        let mutation_type = schema.mutation_type.map(|t| t.name);
        let subscription_type = schema.subscription_type.map(|t| t.name);

        let mut object_types = HashSet::new();
        let mut possible_types = HashMap::new();
        let mut mutation_fields = HashSet::new();

        for ty in schema.types {
            match ty.kind.as_str() {
                "OBJECT" => {
                    if Some(&ty.name) == mutation_type.as_ref() {
                        mutation_fields.extend(ty.fields.into_iter().flatten().map(|f| f.name));
                    }
                    object_types.insert(ty.name);
                }
                "INTERFACE" | "UNION" => {
                    let possible = ty
                        .possible_types
                        .into_iter()
                        .flatten()
                        .map(|t| t.name)
                        .collect();
                    possible_types.insert(ty.name, possible);
                }
                _ => {}
            }
        }

        Ok(Self {
            query_type,
            mutation_type,
            subscription_type,
            object_types,
            possible_types,
            mutation_fields
        })
    }

    pub fn mutation_type(&self) -> &str {
        self.mutation_type.as_deref().unwrap_or("Mutation")
    }

    pub fn has_type(&self, name: &str) -> bool {
        self.object_types.contains(name) || self.possible_types.contains_key(name)
    }

    pub fn has_mutation_field(&self, name: &str) -> bool {
        self.mutation_fields.contains(name)
    }

    /// Whether an object of type `typename` matches a fragment on `condition`.
    /// `None` if the schema knows neither type.
    pub fn is_possible_type(&self, condition: &str, typename: &str) -> Option<bool> {
        if let Some(possible) = self.possible_types.get(condition) {
            Some(possible.contains(typename))
        } else if self.object_types.contains(condition) {
            Some(condition == typename)
        } else {
            None
        }
    }
}
