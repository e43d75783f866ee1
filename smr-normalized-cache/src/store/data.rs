use crate::types::FnvMap;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::HashSet;

/// Where a field holding objects points to.
#[derive(Debug, Hash, PartialEq, Eq, Clone)]
pub enum Link {
    Null,
    Entity(String),
    List(Vec<Link>)
}

impl Link {
    pub(crate) fn to_value(&self) -> Value {
        match self {
            Link::Null => Value::Null,
            Link::Entity(key) => Value::String(key.clone()),
            Link::List(links) => Value::Array(links.iter().map(Link::to_value).collect())
        }
    }
}

type Fields<V> = FnvMap<String, FnvMap<String, V>>;

/// Which queries read which entities, indexed both ways.
#[derive(Default)]
struct Dependencies {
    dependents: FnvMap<String, HashSet<u64>>,
    by_query: FnvMap<u64, HashSet<String>>
}

impl Dependencies {
    fn remove_query(&mut self, query_key: u64) {
        let entities = match self.by_query.remove(&query_key) {
            Some(entities) => entities,
            None => return
        };
        for entity_key in entities {
            if let Some(queries) = self.dependents.get_mut(&entity_key) {
                queries.remove(&query_key);
                if queries.is_empty() {
                    self.dependents.remove(&entity_key);
                }
            }
        }
    }
}

/// Records hold scalar fields, links hold fields that point to other entities.
#[derive(Default)]
pub(crate) struct InMemoryData {
    records: RwLock<Fields<Value>>,
    links: RwLock<Fields<Link>>,
    dependencies: Mutex<Dependencies>
}

impl InMemoryData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read_record(&self, entity_key: &str, field_key: &str) -> Option<Value> {
        self.records
            .read()
            .get(entity_key)
            .and_then(|entity| entity.get(field_key).cloned())
    }

    pub fn read_link(&self, entity_key: &str, field_key: &str) -> Option<Link> {
        self.links
            .read()
            .get(entity_key)
            .and_then(|entity| entity.get(field_key).cloned())
    }

    pub fn has_field(&self, entity_key: &str, field_key: &str) -> bool {
        let in_records = self
            .records
            .read()
            .get(entity_key)
            .map_or(false, |entity| entity.contains_key(field_key));
        in_records
            || self
                .links
                .read()
                .get(entity_key)
                .map_or(false, |entity| entity.contains_key(field_key))
    }

    /// Returns `true` if the stored value changed.
    pub fn write_record(&self, entity_key: &str, field_key: &str, value: Value) -> bool {
        write_field(&self.records, entity_key, field_key, value)
    }

    /// Returns `true` if the stored link changed.
    pub fn write_link(&self, entity_key: &str, field_key: &str, link: Link) -> bool {
        write_field(&self.links, entity_key, field_key, link)
    }

    /// Drop every field of the entity. Returns `true` if there was anything to drop.
    pub fn remove_entity(&self, entity_key: &str) -> bool {
        let had_records = self.records.write().remove(entity_key).is_some();
        let had_links = self.links.write().remove(entity_key).is_some();
        had_records || had_links
    }

    pub fn remove_field(&self, entity_key: &str, field_key: &str) -> bool {
        let had_record = remove_field(&self.records, entity_key, field_key);
        let had_link = remove_field(&self.links, entity_key, field_key);
        had_record || had_link
    }

    /// Replace the entities `query_key` depends on.
    pub fn set_dependencies(&self, query_key: u64, entity_keys: &HashSet<String>) {
        let mut dependencies = self.dependencies.lock();
        dependencies.remove_query(query_key);
        if entity_keys.is_empty() {
            return;
        }
        for entity_key in entity_keys {
            dependencies
                .dependents
                .entry(entity_key.clone())
                .or_insert_with(HashSet::new)
                .insert(query_key);
        }
        dependencies.by_query.insert(query_key, entity_keys.clone());
    }

    pub fn clear_dependencies(&self, query_key: u64) {
        self.dependencies.lock().remove_query(query_key);
    }

    pub fn get_dependents(&self, entity_key: &str) -> Vec<u64> {
        self.dependencies
            .lock()
            .dependents
            .get(entity_key)
            .map(|queries| queries.iter().cloned().collect())
            .unwrap_or_default()
    }
}

fn write_field<V: PartialEq>(
    fields: &RwLock<Fields<V>>,
    entity_key: &str,
    field_key: &str,
    value: V
) -> bool {
    let mut fields = fields.write();
    let entity = fields.entry(entity_key.to_string()).or_default();
    if entity.get(field_key) == Some(&value) {
        false
    } else {
        entity.insert(field_key.to_string(), value);
        true
    }
}

fn remove_field<V>(fields: &RwLock<Fields<V>>, entity_key: &str, field_key: &str) -> bool {
    let mut fields = fields.write();
    fields
        .get_mut(entity_key)
        .map_or(false, |entity| entity.remove(field_key).is_some())
}
