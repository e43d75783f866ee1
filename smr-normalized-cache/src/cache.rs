use serde_json::{Map, Value};

/// Something stored in the cache, either by its full key or by typename and id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity<'a> {
    Key(&'a str),
    Ref { typename: &'a str, id: &'a str }
}

impl<'a> Entity<'a> {
    pub fn new(typename: &'a str, id: &'a str) -> Self {
        Entity::Ref { typename, id }
    }
}

/// The view of the store handed to mutation update hooks.
pub trait Cache {
    /// The key `data` would be stored under, or `None` if objects of this type are embedded.
    fn key_of_entity(&self, typename: &str, data: &Map<String, Value>) -> Option<String>;

    /// Remove everything stored for the entity. Queries that read it will miss the cache
    /// and are rerun.
    fn invalidate(&mut self, entity: &Entity<'_>);

    fn invalidate_field(&mut self, entity: &Entity<'_>, field: &str, args: Option<&Map<String, Value>>);

    /// The stored value of a field. Links come back as entity keys.
    fn resolve(&self, entity: &Entity<'_>, field: &str, args: Option<&Map<String, Value>>) -> Option<Value>;
}
