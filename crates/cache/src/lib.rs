pub mod key;
pub mod result_cache;

pub use key::{cache_key, canonical_json};
pub use result_cache::ResultCache;
