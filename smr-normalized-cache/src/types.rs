use crate::{cache::Cache, schema::SchemaMetadata};
use fnv::FnvBuildHasher;
use serde_json::{Map, Value};
use std::{collections::HashMap, fmt, sync::Arc};

pub(crate) type FnvMap<K, V> = HashMap<K, V, FnvBuildHasher>;

/// Computes the id part of an entity's key from its fields. `None` embeds the object in its
/// parent instead of storing it as an entity.
pub type KeyResolver = Arc<dyn Fn(&Map<String, Value>) -> Option<String> + Send + Sync>;

/// Runs after a mutation field succeeds. Receives the whole `data` of the response, the
/// field's arguments and the cache.
pub type Updater = Arc<dyn Fn(&Value, &Map<String, Value>, &mut dyn Cache) + Send + Sync>;

/// Options to pass to the normalized cache.
#[derive(Default, Clone)]
pub struct NormalizedCacheOptions {
    /// Key resolvers by typename. Types without one are keyed by `id` or `_id`.
    pub keys: FnvMap<String, KeyResolver>,
    /// Update hooks by mutation field name.
    pub updates: FnvMap<String, Updater>,
    /// Used to match fragments on interfaces and unions, and to check `keys` and `updates`.
    pub schema: Option<SchemaMetadata>
}

impl NormalizedCacheOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key<F>(mut self, typename: &str, resolver: F) -> Self
    where
        F: Fn(&Map<String, Value>) -> Option<String> + Send + Sync + 'static
    {
        self.keys.insert(typename.to_string(), Arc::new(resolver));
        self
    }

    /// Key `typename` by the value of `field` rather than `id`.
    pub fn key_field(self, typename: &str, field: &'static str) -> Self {
        self.with_key(typename, move |entity| {
            entity.get(field).and_then(|value| match value {
                Value::String(id) => Some(id.clone()),
                Value::Number(id) => Some(id.to_string()),
                _ => None
            })
        })
    }

    /// Never normalize `typename`. Its objects are stored inside whatever references them, so
    /// they are cached per query rather than per entity.
    pub fn embed(self, typename: &str) -> Self {
        self.with_key(typename, |_| None)
    }

    pub fn with_update<F>(mut self, field: &str, updater: F) -> Self
    where
        F: Fn(&Value, &Map<String, Value>, &mut dyn Cache) + Send + Sync + 'static
    {
        self.updates.insert(field.to_string(), Arc::new(updater));
        self
    }

    pub fn with_schema(mut self, schema: SchemaMetadata) -> Self {
        self.schema = Some(schema);
        self
    }
}

impl fmt::Debug for NormalizedCacheOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.keys.keys().collect();
        keys.sort();
        let mut updates: Vec<_> = self.updates.keys().collect();
        updates.sort();
        f.debug_struct("NormalizedCacheOptions")
            .field("keys", &keys)
            .field("updates", &updates)
            .field("schema", &self.schema.is_some())
            .finish()
    }
}
