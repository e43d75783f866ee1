//! A normalized cache exchange for `smr-graphql`.
//!
//! Results are split into entities identified by `Typename:id` and stored once, no matter how
//! many queries reference them. Queries whose every selected field is in the store are answered
//! without touching the network, and watched queries are rerun when an entity they read changes.
//!
//! Types that have no stable identity can be embedded into their parent instead, and mutations
//! can be given update hooks that edit or invalidate the store once they succeed.
//!
//! ```
//! use smr_graphql::{Client, default_exchanges::MultipartFetchExchange};
//! use smr_normalized_cache::{Entity, NormalizedCacheExchange, NormalizedCacheOptions};
//!
//! let options = NormalizedCacheOptions::new()
//!     .embed("GetMods")
//!     .with_update("deleteMod", |_data, args, cache| {
//!         if let Some(id) = args.get("modId").and_then(|id| id.as_str()) {
//!             cache.invalidate(&Entity::new("Mod", id));
//!         }
//!     });
//!
//! let client = Client::builder("https://api.ficsit.app/v2/query")
//!     .with_exchange(MultipartFetchExchange)
//!     .with_exchange(NormalizedCacheExchange::with_options(options))
//!     .build();
//! ```

#[macro_use]
extern crate async_trait;

mod cache;
mod cache_exchange;
mod schema;
mod selection;
mod store;
mod types;

pub use cache::{Cache, Entity};
pub use cache_exchange::{NormalizedCacheExchange, NormalizedCacheImpl};
pub use schema::{SchemaError, SchemaMetadata};
pub use store::{Link, Store, StoreError};
pub use types::{KeyResolver, NormalizedCacheOptions, Updater};
