//! How the site's data is cached: which types are never normalized and which mutations evict
//! what.

use serde_json::{Map, Value};
use smr_normalized_cache::{Cache, Entity, NormalizedCacheOptions, SchemaMetadata};
use tracing::warn;

/// Types cached as part of the query that returned them instead of as entities.
pub const NORMALIZATION_EXEMPTIONS: [&str; 6] = [
    "GetMods",
    "LatestVersions",
    "UserMod",
    "GetGuides",
    "OAuthOptions",
    "UserRoles"
];

/// Evict `typename` with the id found in the mutation's `id_argument` once `mutation` succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidationRule {
    pub mutation: &'static str,
    pub typename: &'static str,
    pub id_argument: &'static str
}

const fn rule(
    mutation: &'static str,
    typename: &'static str,
    id_argument: &'static str
) -> InvalidationRule {
    InvalidationRule {
        mutation,
        typename,
        id_argument
    }
}

/// The mutations that evict an entity from the cache once they succeed.
pub const INVALIDATION_RULES: [InvalidationRule; 9] = [
    rule("deleteGuide", "Guide", "guideId"),
    rule("deleteMod", "Mod", "modId"),
    rule("approveMod", "Mod", "modId"),
    rule("denyMod", "Mod", "modId"),
    rule("approveVersion", "Version", "versionId"),
    rule("denyVersion", "Version", "versionId"),
    rule("deleteSMLVersion", "SMLVersion", "smlVersionId"),
    rule("deleteVersion", "Version", "versionId"),
    rule("updateVersion", "Version", "versionId")
];

impl InvalidationRule {
    /// Invalidate the entity named by `args`. Returns `false` if the id argument is missing or
    /// not a string, in which case nothing is touched.
    pub fn apply(&self, args: &Map<String, Value>, cache: &mut dyn Cache) -> bool {
        match args.get(self.id_argument).and_then(Value::as_str) {
            Some(id) => {
                cache.invalidate(&Entity::new(self.typename, id));
                true
            }
            None => {
                warn!(
                    mutation = self.mutation,
                    argument = self.id_argument,
                    "mutation has no string id argument, nothing invalidated"
                );
                false
            }
        }
    }
}

/// The normalized cache configuration of the site.
pub fn cache_options(schema: Option<SchemaMetadata>) -> NormalizedCacheOptions {
    let mut options = NormalizedCacheOptions::new();
    for typename in NORMALIZATION_EXEMPTIONS.iter() {
        options = options.embed(typename);
    }
    for rule in INVALIDATION_RULES.iter().copied() {
        options = options.with_update(rule.mutation, move |_data, args, cache| {
            rule.apply(args, cache);
        });
    }
    if let Some(schema) = schema {
        options = options.with_schema(schema);
    }
    options
}
