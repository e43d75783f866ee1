mod data;

use crate::{
    cache::{Cache, Entity},
    schema::SchemaMetadata,
    selection::{field_key, plan_operation, DocumentCache, FieldNode, SelectionNode},
    types::{FnvMap, KeyResolver, NormalizedCacheOptions}
};
use data::InMemoryData;
use serde::Serialize;
use serde_json::{Map, Value};
use smr_graphql::exchange::Client;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, warn};

pub use data::Link;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to parse query: {0}")]
    Parse(String),
    #[error("operation `{0}` not found in query")]
    OperationNotFound(String),
    #[error("fragment `{0}` not found in query")]
    FragmentNotFound(String),
    #[error("fragment `{0}` spreads itself")]
    FragmentCycle(String),
    #[error("failed to serialize operation data: {0}")]
    Serialize(#[from] serde_json::Error)
}

const TYPENAME: &str = "__typename";

/// Entities touched while writing a result.
#[derive(Default, Debug)]
pub(crate) struct WriteResult {
    /// Every entity the result references.
    pub dependencies: HashSet<String>,
    /// Entities with at least one field whose value changed.
    pub changed: HashSet<String>
}

/// The normalized store behind the cache exchange.
pub struct Store {
    data: InMemoryData,
    keys: FnvMap<String, KeyResolver>,
    schema: Option<SchemaMetadata>,
    documents: DocumentCache
}

fn id_to_string(id: &Value) -> Option<String> {
    match id {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None
    }
}

/// Merge a field selected twice (e.g. once directly and once through a fragment).
fn merge_value(existing: &mut Value, new: Value) {
    match (existing, new) {
        (Value::Object(existing), Value::Object(new)) => {
            for (key, value) in new {
                match existing.get_mut(&key) {
                    Some(current) => merge_value(current, value),
                    None => {
                        existing.insert(key, value);
                    }
                }
            }
        }
        (Value::Array(existing), Value::Array(new)) => {
            for (current, value) in existing.iter_mut().zip(new) {
                merge_value(current, value);
            }
        }
        (existing, new) => *existing = new
    }
}

impl Store {
    pub fn new(options: &NormalizedCacheOptions) -> Self {
        Self {
            data: InMemoryData::new(),
            keys: options.keys.clone(),
            schema: options.schema.clone(),
            documents: DocumentCache::default()
        }
    }

    pub fn query_root(&self) -> &str {
        self.schema
            .as_ref()
            .map(|schema| schema.query_type.as_str())
            .unwrap_or("Query")
    }

    pub fn mutation_root(&self) -> &str {
        self.schema
            .as_ref()
            .map(|schema| schema.mutation_type())
            .unwrap_or("Mutation")
    }

    fn is_root(&self, typename: &str) -> bool {
        typename == self.query_root()
            || typename == self.mutation_root()
            || self
                .schema
                .as_ref()
                .and_then(|schema| schema.subscription_type.as_deref())
                .map_or(typename == "Subscription", |root| root == typename)
    }

    /// The key `entity` is stored under. `None` means it gets embedded in its parent.
    pub fn key_of_entity(&self, typename: &str, entity: &Map<String, Value>) -> Option<String> {
        if self.is_root(typename) {
            return Some(typename.to_string());
        }

        let id = match self.keys.get(typename) {
            Some(resolver) => resolver(entity),
            None => entity
                .get("id")
                .or_else(|| entity.get("_id"))
                .and_then(id_to_string)
        };
        id.map(|id| format!("{}:{}", typename, id))
    }

    fn entity_key(&self, entity: &Entity<'_>) -> Option<String> {
        match *entity {
            Entity::Key(key) => Some(key.to_string()),
            Entity::Ref { typename, id } => {
                let mut data = Map::new();
                data.insert(TYPENAME.to_string(), Value::String(typename.to_string()));
                data.insert("id".to_string(), Value::String(id.to_string()));
                self.key_of_entity(typename, &data)
            }
        }
    }

    /// The stored value of a field. Links come back as entity keys.
    pub fn resolve(
        &self,
        entity: &Entity<'_>,
        field: &str,
        args: Option<&Map<String, Value>>
    ) -> Option<Value> {
        let entity_key = self.entity_key(entity)?;
        let field_key = field_key(field, args.unwrap_or(&Map::new()));
        self.data
            .read_record(&entity_key, &field_key)
            .or_else(|| {
                self.data
                    .read_link(&entity_key, &field_key)
                    .map(|link| link.to_value())
            })
    }

    pub(crate) fn plan<V: Serialize>(
        &self,
        query: &'static str,
        operation_name: &str,
        variables: &V
    ) -> Result<Vec<SelectionNode>, StoreError> {
        let document = self.documents.get(query)?;
        let variables = serde_json::to_value(variables)?;
        plan_operation(&document, operation_name, &variables)
    }

    /// Record what `query_key` read. The query root is left out since changes to it never
    /// rerun anything.
    pub(crate) fn set_dependencies(&self, query_key: u64, dependencies: &HashSet<String>) {
        let mut dependencies = dependencies.clone();
        dependencies.remove(self.query_root());
        self.data.set_dependencies(query_key, &dependencies);
    }

    pub(crate) fn clear_dependencies(&self, query_key: u64) {
        self.data.clear_dependencies(query_key);
    }

    /// The queries that read `entity_key` last time they ran.
    pub fn dependents(&self, entity_key: &str) -> Vec<u64> {
        self.data.get_dependents(entity_key)
    }

    /// Ask the client to rerun every query that depends on a changed entity, except the one
    /// that caused the change.
    pub(crate) fn rerun_queries<C: Client>(
        &self,
        changed: &HashSet<String>,
        origin_key: u64,
        client: &C
    ) {
        let mut queries = HashSet::new();
        for entity_key in changed {
            if entity_key == self.query_root() {
                continue;
            }
            queries.extend(self.data.get_dependents(entity_key));
        }
        queries.remove(&origin_key);

        for query_key in queries {
            debug!(query_key, "rerunning dependent query");
            client.rerun_query(query_key);
        }
    }

    fn collect_fields<'s>(
        &self,
        selection: &'s [SelectionNode],
        typename: Option<&str>,
        has_field: &dyn Fn(&FieldNode) -> bool,
        fields: &mut Vec<&'s FieldNode>
    ) {
        for node in selection {
            match node {
                SelectionNode::Field(field) => fields.push(field),
                SelectionNode::Fragment {
                    type_condition,
                    selection
                } => {
                    if self.fragment_matches(type_condition.as_deref(), typename, selection, has_field) {
                        self.collect_fields(selection, typename, has_field, fields);
                    }
                }
            }
        }
    }

    fn fragment_matches(
        &self,
        type_condition: Option<&str>,
        typename: Option<&str>,
        selection: &[SelectionNode],
        has_field: &dyn Fn(&FieldNode) -> bool
    ) -> bool {
        let type_condition = match type_condition {
            Some(type_condition) => type_condition,
            None => return true
        };
        if let Some(typename) = typename {
            if typename == type_condition {
                return true;
            }
            let possible = self
                .schema
                .as_ref()
                .and_then(|schema| schema.is_possible_type(type_condition, typename));
            if let Some(possible) = possible {
                return possible;
            }
        }

        // Without schema information, match if every field the fragment selects is there.
        selection.iter().all(|node| match node {
            SelectionNode::Field(field) => field.name == TYPENAME || has_field(field),
            SelectionNode::Fragment { .. } => true
        })
    }

    /// Read `selection` starting at the root entity. `None` if anything is missing.
    pub(crate) fn read(
        &self,
        root: &str,
        selection: &[SelectionNode],
        dependencies: &mut HashSet<String>
    ) -> Option<Map<String, Value>> {
        self.read_entity(root, selection, dependencies)
    }

    fn read_entity(
        &self,
        entity_key: &str,
        selection: &[SelectionNode],
        dependencies: &mut HashSet<String>
    ) -> Option<Map<String, Value>> {
        dependencies.insert(entity_key.to_string());

        let typename = match self.data.read_record(entity_key, TYPENAME) {
            Some(Value::String(typename)) => Some(typename),
            _ if self.is_root(entity_key) => Some(entity_key.to_string()),
            _ => None
        };

        let mut fields = Vec::new();
        let has_field = |field: &FieldNode| self.data.has_field(entity_key, &field.field_key);
        self.collect_fields(selection, typename.as_deref(), &has_field, &mut fields);

        let mut result = Map::new();
        for field in fields {
            let value = match &field.selection {
                None => match self.data.read_record(entity_key, &field.field_key) {
                    Some(value) => value,
                    None if field.name == TYPENAME => Value::String(typename.clone()?),
                    None => return None
                },
                Some(selection) => {
                    let link = self.data.read_link(entity_key, &field.field_key)?;
                    self.read_link(&link, selection, dependencies)?
                }
            };
            match result.get_mut(&field.response_key) {
                Some(existing) => merge_value(existing, value),
                None => {
                    result.insert(field.response_key.clone(), value);
                }
            }
        }
        Some(result)
    }

    fn read_link(
        &self,
        link: &Link,
        selection: &[SelectionNode],
        dependencies: &mut HashSet<String>
    ) -> Option<Value> {
        match link {
            Link::Null => Some(Value::Null),
            Link::Entity(key) => self
                .read_entity(key, selection, dependencies)
                .map(Value::Object),
            Link::List(links) => {
                let mut items = Vec::with_capacity(links.len());
                for link in links {
                    items.push(self.read_link(link, selection, dependencies)?);
                }
                Some(Value::Array(items))
            }
        }
    }

    /// Write a result under `root`. The root's own fields are only stored if `store_root` is
    /// set, which it isn't for mutations.
    pub(crate) fn write(
        &self,
        root: &str,
        data: &Value,
        selection: &[SelectionNode],
        store_root: bool
    ) -> WriteResult {
        let mut result = WriteResult::default();
        if let Value::Object(data) = data {
            self.write_entity(&mut result, root, Some(root), data, selection, store_root);
        }
        result
    }

    fn write_entity(
        &self,
        result: &mut WriteResult,
        entity_key: &str,
        typename: Option<&str>,
        object: &Map<String, Value>,
        selection: &[SelectionNode],
        store_fields: bool
    ) {
        if store_fields {
            result.dependencies.insert(entity_key.to_string());
        }

        let mut fields = Vec::new();
        let has_field = |field: &FieldNode| object.contains_key(&field.response_key);
        self.collect_fields(selection, typename, &has_field, &mut fields);

        for field in fields {
            let value = match object.get(&field.response_key) {
                Some(value) => value,
                None => continue
            };
            let changed = match &field.selection {
                None => {
                    store_fields && self.data.write_record(entity_key, &field.field_key, value.clone())
                }
                Some(selection) => {
                    let path = format!("{}.{}", entity_key, field.field_key);
                    let link = self.write_link(result, &path, value, selection);
                    store_fields && self.data.write_link(entity_key, &field.field_key, link)
                }
            };
            if changed {
                result.changed.insert(entity_key.to_string());
            }
        }
    }

    fn write_link(
        &self,
        result: &mut WriteResult,
        path: &str,
        value: &Value,
        selection: &[SelectionNode]
    ) -> Link {
        match value {
            Value::Null => Link::Null,
            Value::Array(items) => {
                let mut links = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    let path = format!("{}.{}", path, index);
                    links.push(self.write_link(result, &path, item, selection));
                }
                Link::List(links)
            }
            Value::Object(object) => {
                let typename = object.get(TYPENAME).and_then(Value::as_str);
                let key = typename.and_then(|typename| self.key_of_entity(typename, object));
                let key = match key {
                    Some(key) => key,
                    None => {
                        let embedded = typename.map_or(false, |typename| self.keys.contains_key(typename));
                        if !embedded {
                            warn!(
                                path,
                                typename = typename.unwrap_or("<unknown>"),
                                "entity has no key, embedding it in its parent"
                            );
                        }
                        path.to_string()
                    }
                };
                self.write_entity(result, &key, typename, object, selection, true);
                Link::Entity(key)
            }
            _ => {
                warn!(path, "expected an object or list, found a scalar");
                Link::Null
            }
        }
    }
}

/// The [`Cache`](./trait.Cache.html) handed to update hooks. Remembers what it changed so the
/// affected queries can be rerun afterwards.
pub(crate) struct StoreCache<'a> {
    pub store: &'a Store,
    pub changed: &'a mut HashSet<String>
}

impl<'a> Cache for StoreCache<'a> {
    fn key_of_entity(&self, typename: &str, data: &Map<String, Value>) -> Option<String> {
        self.store.key_of_entity(typename, data)
    }

    fn invalidate(&mut self, entity: &Entity<'_>) {
        match self.store.entity_key(entity) {
            Some(key) => {
                let removed = self.store.data.remove_entity(&key);
                debug!(entity = key.as_str(), removed, "invalidated entity");
                self.changed.insert(key);
            }
            None => warn!(?entity, "cannot invalidate an entity without a key")
        }
    }

    fn invalidate_field(&mut self, entity: &Entity<'_>, field: &str, args: Option<&Map<String, Value>>) {
        match self.store.entity_key(entity) {
            Some(key) => {
                let field_key = field_key(field, args.unwrap_or(&Map::new()));
                self.store.data.remove_field(&key, &field_key);
                debug!(entity = key.as_str(), field = field_key.as_str(), "invalidated field");
                self.changed.insert(key);
            }
            None => warn!(?entity, field, "cannot invalidate a field of an entity without a key")
        }
    }

    fn resolve(&self, entity: &Entity<'_>, field: &str, args: Option<&Map<String, Value>>) -> Option<Value> {
        self.store.resolve(entity, field, args)
    }
}
