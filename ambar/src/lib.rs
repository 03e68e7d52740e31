//! # Ambar — a minimal service-locator & IoC container for Rust
//!
//! One registry, string-keyed and type-keyed registrations, blueprint-driven
//! construction, and child scopes. Misses resolve to `Ok(None)`; only
//! construction faults.
//!
//! ```rust
//! use ambar::prelude::*;
//! use std::sync::Arc;
//!
//! #[derive(Clone)]
//! struct Config { url: String }
//!
//! struct Database { config: Config }
//!
//! let container = Container::new();
//! container.register_instance(None, Config { url: "postgres://localhost".into() });
//! container.add_blueprint(
//!     Blueprint::of::<Database>()
//!         .constructor(|(config,): (Dep<Config>,)| {
//!             Ok(Database { config: config.required()? })
//!         })
//!         .build(),
//! );
//! container.register_singleton_as::<Arc<Database>, Database, _>(None, Arc::new);
//!
//! let db = container.get_instance::<Arc<Database>>(None).unwrap().unwrap();
//! assert_eq!(db.config.url, "postgres://localhost");
//! ```

pub use ambar_container::*;
pub use ambar_support::*;
