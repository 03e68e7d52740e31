//! # ambar-container
//!
//! A small service-locator and inversion-of-control container.
//!
//! Services are registered under a [`ServiceKey`] — a service type, an
//! optional string key, or both — each mapping to an ordered list of
//! producers. Resolution asks for one instance ([`Container::get_instance`]),
//! everything ([`Container::get_all_instances`]), a factory
//! ([`Container::get_factory`]), a collection ([`Container::get_collection`]),
//! or whatever hides behind a bare string key ([`Container::get_by_key`]).
//! A resolution miss is `Ok(None)`, never an error; only construction
//! faults.
//!
//! Because Rust has no runtime reflection, types that the container should
//! construct itself declare a [`Blueprint`](blueprint::Blueprint):
//! constructor candidates plus optional injectable properties. The
//! activator scores each candidate by how many of its parameters are
//! currently resolvable and builds with the best one.
//!
//! ## Quick start
//!
//! ```rust
//! use ambar_container::prelude::*;
//! use std::sync::Arc;
//!
//! #[derive(Clone)]
//! struct Settings { retries: u32 }
//!
//! struct Client { settings: Settings }
//!
//! let container = Container::new();
//! container.register_instance(None, Settings { retries: 3 });
//! container.add_blueprint(
//!     Blueprint::of::<Client>()
//!         .constructor(|(settings,): (Dep<Settings>,)| {
//!             Ok(Client { settings: settings.required()? })
//!         })
//!         .build(),
//! );
//! container.register_singleton_as::<Arc<Client>, Client, _>(None, Arc::new);
//!
//! let client = container.get_instance::<Arc<Client>>(None).unwrap().unwrap();
//! assert_eq!(client.settings.retries, 3);
//! ```
//!
//! ## Hierarchies
//!
//! [`Container::create_child_container`] forks a scope: the child sees
//! everything registered before the fork and may add registrations the
//! parent never observes. Producers resolve their own dependencies against
//! the container that invoked them, so a service registered on the parent
//! picks up child-local overrides when resolved through the child.

pub mod blueprint;
pub mod container;
pub mod dependencies;
pub mod error;
pub mod key;
pub mod module;
pub mod producer;

pub(crate) mod registry;

pub use container::prelude;
pub use container::{ActivationHandle, ActivationObserver, AllInstances, Container, Factory};
pub use error::{AmbarError, Result};
pub use key::{ServiceKey, ServiceType};
pub use producer::{Lifetime, Object, Producer};
