//! Rendered diagram cache for UX.
//!
//! Converted images are kept in a plain directory tree. There is no index or
//! manifest: every lookup recomputes the entry identifier from the source
//! path and asks the filesystem whether the entry is still usable.
//!
//! - [`CacheKey`]: stable identifier derived from a source path relative to
//!   the documentation root
//! - [`CacheStore`]: path layout, directory creation and staged writes
//! - [`is_fresh`]: modification-time staleness check
//!
//! # Layout
//!
//! ```text
//! {root}/
//! +-- 9cb7ad6b543c393481e5a1d66a0a9e896bfa5b7f/   # CacheKey of "SimpleClass.uxf"
//! |   +-- SimpleClass.svg
//! +-- fe79ff2a65a5fa836fd77b04fe0c6d738599d795/   # CacheKey of "diagrams/SimpleClass.uxf"
//!     +-- SimpleClass.png
//! ```
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//! use ux_cache::{CacheKey, CacheStore};
//!
//! let store = CacheStore::new("/tmp/doctrees/umlet");
//! let key = CacheKey::derive(Path::new("SimpleClass.uxf"));
//! let path = store.resolve_path(&key, "SimpleClass.svg");
//! assert!(path.ends_with("9cb7ad6b543c393481e5a1d66a0a9e896bfa5b7f/SimpleClass.svg"));
//! ```

mod key;
mod staleness;
mod store;

pub use key::CacheKey;
pub use staleness::is_fresh;
pub use store::{CacheStore, StagedOutput};
