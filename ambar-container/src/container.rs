//! # The Container — registry, resolver, activator, injector
//!
//! One mutable, cheaply-cloneable handle carrying the four cooperating
//! responsibilities:
//!
//! ```text
//! register_* ──> Registry (ordered entries, shared with children)
//!                    │
//! get_instance ──> Resolver ──(per-request / singleton producers)──> Activator
//!                    │                                                  │
//!              property injection <── Injector <── blueprints ──────────┘
//! ```
//!
//! Resolution misses are `Ok(None)`; only construction can fault. Producers
//! receive the container that performed the resolution, so registrations on
//! a parent resolve their own dependencies against whichever child invoked
//! them.
//!
//! # Examples
//! ```rust
//! use ambar_container::prelude::*;
//! use std::sync::Arc;
//!
//! trait Logger: Send + Sync {
//!     fn log(&self, message: &str);
//! }
//!
//! struct ConsoleLogger;
//! impl Logger for ConsoleLogger {
//!     fn log(&self, message: &str) { println!("{message}"); }
//! }
//!
//! struct AuditService {
//!     logger: Arc<dyn Logger>,
//! }
//!
//! let container = Container::new();
//! container.register_handler(None, |_| Ok(Arc::new(ConsoleLogger) as Arc<dyn Logger>));
//! container.add_blueprint(
//!     Blueprint::of::<AuditService>()
//!         .constructor(|(logger,): (Dep<Arc<dyn Logger>>,)| {
//!             Ok(AuditService { logger: logger.required()? })
//!         })
//!         .build(),
//! );
//! container.register_per_request::<AuditService>(None);
//!
//! let service = container
//!     .get_instance::<AuditService>(None)
//!     .expect("construction succeeds")
//!     .expect("a handler is registered");
//! service.logger.log("ready");
//! ```

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, instrument, trace};

use ambar_support::rendering::suggest_similar;

use crate::blueprint::Blueprint;
use crate::error::{AmbarError, NotActivatableError, Result};
use crate::key::{ServiceKey, ServiceType};
use crate::module::Module;
use crate::producer::{Object, Producer};
use crate::registry::{Entry, Registry};

/// Callback fired with each freshly activated (blueprint-built) instance.
pub type ActivationObserver = Arc<dyn Fn(&(dyn Any + Send + Sync)) + Send + Sync>;

/// Subscription token returned by [`Container::on_activated`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActivationHandle(u64);

struct ContainerCore {
    registry: RwLock<Registry>,
    /// Construction metadata, shared by every container in the hierarchy.
    blueprints: Arc<DashMap<TypeId, Arc<Blueprint>>>,
    observers: RwLock<Vec<(u64, ActivationObserver)>>,
    next_observer: AtomicU64,
    inject_properties: AtomicBool,
}

// ═══════════════════════════════════════════
// Container
// ═══════════════════════════════════════════

/// The service-location container.
///
/// Clones share the same state; [`create_child_container`](Container::create_child_container)
/// forks it instead. Registration is open and infallible at any point;
/// intended usage is still to compose registrations up front and resolve
/// afterwards. Produced values are owned by the caller, never by the
/// container.
///
/// Dependency cycles are not detected: a cycle recurses until the stack
/// runs out (or a singleton cell is re-entered), exactly like any other
/// unbounded recursion.
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerCore>,
}

impl Container {
    /// Creates an empty root container.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ContainerCore {
                registry: RwLock::new(Registry::new()),
                blueprints: Arc::new(DashMap::new()),
                observers: RwLock::new(Vec::new()),
                next_observer: AtomicU64::new(0),
                inject_properties: AtomicBool::new(false),
            }),
        }
    }

    // ── Registration ──

    /// Registers a producer under an explicit [`ServiceKey`].
    ///
    /// This is the primitive all the typed `register_*` sugar reduces to,
    /// and the only way to register under a wildcard (key-only) identity.
    /// Registration always succeeds; a producer registered for an already
    /// existing identity is appended to that entry, and the lookup rule
    /// decides which entry an identity maps to (see
    /// [`has_handler`](Container::has_handler) and friends).
    pub fn register_producer(&self, key: ServiceKey, producer: Producer) {
        debug!(key = %key, lifetime = %producer.lifetime(), "Registered producer");
        let entry = self.inner.registry.write().get_or_create(key);
        entry.push_producer(producer);
    }

    /// Registers a custom handler for `T`: the closure runs on every
    /// resolution and may itself resolve from the container it receives.
    pub fn register_handler<T, F>(&self, key: Option<&str>, handler: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> Result<T> + Send + Sync + 'static,
    {
        let produce =
            move |container: &Container| Ok(Box::new(handler(container)?) as Object);
        self.register_producer(ServiceKey::typed::<T>(key), Producer::custom(produce));
    }

    /// Registers a pre-built value; every resolution clones it out.
    ///
    /// Use `Arc<T>` (or `Arc<dyn Trait>`) when callers should observe one
    /// shared allocation.
    pub fn register_instance<T: Clone + Send + Sync + 'static>(
        &self,
        key: Option<&str>,
        value: T,
    ) {
        self.register_producer(ServiceKey::typed::<T>(key), Producer::instance(value));
    }

    /// Registers `T` to be built from its blueprint on every resolution.
    pub fn register_per_request<T: Send + Sync + 'static>(&self, key: Option<&str>) {
        self.register_producer(
            ServiceKey::typed::<T>(key),
            Producer::per_request(|container: &Container| container.activate::<T>()),
        );
    }

    /// Registers service `S` produced by building implementation `I` from
    /// its blueprint on every resolution, converted via `into`
    /// (typically `|i| Arc::new(i) as Arc<dyn Service>`).
    pub fn register_per_request_as<S, I, F>(&self, key: Option<&str>, into: F)
    where
        S: Send + Sync + 'static,
        I: Send + Sync + 'static,
        F: Fn(I) -> S + Send + Sync + 'static,
    {
        self.register_producer(
            ServiceKey::typed::<S>(key),
            Producer::per_request(move |container: &Container| {
                Ok(into(container.activate::<I>()?))
            }),
        );
    }

    /// Registers `T` to be built from its blueprint once; later resolutions
    /// reuse the cached value.
    ///
    /// Each call creates an independent cache cell, so repeated singleton
    /// registrations coexist as separate producers with separate caches.
    pub fn register_singleton<T: Clone + Send + Sync + 'static>(&self, key: Option<&str>) {
        self.register_producer(
            ServiceKey::typed::<T>(key),
            Producer::singleton(|container: &Container| container.activate::<T>()),
        );
    }

    /// Registers service `S` as a singleton built from implementation `I`.
    pub fn register_singleton_as<S, I, F>(&self, key: Option<&str>, into: F)
    where
        S: Clone + Send + Sync + 'static,
        I: Send + Sync + 'static,
        F: Fn(I) -> S + Send + Sync + 'static,
    {
        self.register_producer(
            ServiceKey::typed::<S>(key),
            Producer::singleton(move |container: &Container| {
                Ok(into(container.activate::<I>()?))
            }),
        );
    }

    /// Registers a singleton over a custom factory closure instead of a
    /// blueprint.
    pub fn register_singleton_with<T, F>(&self, key: Option<&str>, factory: F)
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(&Container) -> Result<T> + Send + Sync + 'static,
    {
        self.register_producer(ServiceKey::typed::<T>(key), Producer::singleton(factory));
    }

    /// Removes the entry (with all its producers) matching the exact
    /// (service, key) pair. Returns `false` when no exact match exists;
    /// removal never uses the lookup fallback.
    pub fn unregister_handler<T: ?Sized + 'static>(&self, key: Option<&str>) -> bool {
        self.inner
            .registry
            .write()
            .remove(Some(ServiceType::of::<T>()), key)
    }

    // ── Query ──

    /// True iff resolution of (T, key) would find an entry, using the same
    /// lookup rule as resolution itself.
    pub fn has_handler<T: ?Sized + 'static>(&self, key: Option<&str>) -> bool {
        self.has_entry(Some(ServiceType::of::<T>()), key)
    }

    /// [`has_handler`](Container::has_handler) over an explicit key,
    /// including wildcard queries.
    pub fn has_handler_key(&self, key: &ServiceKey) -> bool {
        self.has_entry(key.service(), key.name())
    }

    pub(crate) fn has_entry(&self, service: Option<ServiceType>, name: Option<&str>) -> bool {
        self.inner.registry.read().find(service, name).is_some()
    }

    // ── Resolution ──

    /// Resolves one instance of `T`.
    ///
    /// Invokes exactly the first producer of the matched entry. `Ok(None)`
    /// when nothing matches — a miss is valid "optional dependency"
    /// behavior, not an error. Construction faults propagate unchanged.
    pub fn get_instance<T: Send + Sync + 'static>(&self, key: Option<&str>) -> Result<Option<T>> {
        let service = ServiceType::of::<T>();
        trace!(service = %service, key = ?key, "Resolving");

        let Some(entry) = self.find_entry(Some(service), key) else {
            return Ok(None);
        };
        let Some(producer) = entry.first_producer() else {
            return Ok(None);
        };
        self.realize::<T>(&producer, key).map(Some)
    }

    /// Resolves by string key alone, matching an entry of any service type.
    /// The result stays type-erased because the caller, by construction,
    /// does not know the type.
    pub fn get_by_key(&self, key: &str) -> Result<Option<Object>> {
        trace!(key, "Resolving by key alone");

        let Some(entry) = self.find_entry(None, Some(key)) else {
            return Ok(None);
        };
        let Some(producer) = entry.first_producer() else {
            return Ok(None);
        };

        let mut object = producer.produce(self)?;
        if self.property_injection() {
            self.inject_into(&mut *object)?;
        }
        Ok(Some(object))
    }

    /// Resolves a factory for `T`.
    ///
    /// A registered `Factory<T>` entry wins; otherwise a factory bound to
    /// this container is synthesized, whose [`create`](Factory::create)
    /// resolves (T, no key) at call time. Synthesis cannot miss, so a
    /// factory is always returned.
    pub fn get_factory<T: Send + Sync + 'static>(&self, key: Option<&str>) -> Result<Factory<T>> {
        if let Some(factory) = self.get_instance::<Factory<T>>(key)? {
            return Ok(factory);
        }
        Ok(Factory::synthesized(self.clone()))
    }

    /// Resolves every producer of `T` into a `Vec`.
    ///
    /// A registered `Vec<T>` entry wins; otherwise all producers of (T, no
    /// key) are realized in registration order, and the first per-element
    /// fault aborts with that error.
    pub fn get_collection<T: Send + Sync + 'static>(&self, key: Option<&str>) -> Result<Vec<T>> {
        if let Some(collection) = self.get_instance::<Vec<T>>(key)? {
            return Ok(collection);
        }
        self.get_all_instances::<T>(None).collect()
    }

    /// Lazily resolves every producer of the entry matched for (T, key).
    ///
    /// The matched entry's producer list is snapshotted now; each call to
    /// `next()` invokes one producer (injecting properties when enabled)
    /// and yields its result. An unmatched query yields an empty iterator.
    pub fn get_all_instances<T: Send + Sync + 'static>(
        &self,
        key: Option<&str>,
    ) -> AllInstances<T> {
        let producers = self
            .find_entry(Some(ServiceType::of::<T>()), key)
            .map(|entry| entry.producers())
            .unwrap_or_default();
        trace!(service = %ServiceType::of::<T>(), count = producers.len(), "Resolving all");

        AllInstances {
            container: self.clone(),
            name: key.map(str::to_owned),
            producers: producers.into_iter(),
            _marker: PhantomData,
        }
    }

    fn find_entry(&self, service: Option<ServiceType>, name: Option<&str>) -> Option<Arc<Entry>> {
        self.inner.registry.read().find(service, name)
    }

    /// Produce, optionally inject, downcast.
    fn realize<T: Send + Sync + 'static>(
        &self,
        producer: &Producer,
        key: Option<&str>,
    ) -> Result<T> {
        let mut object = producer.produce(self)?;
        if self.property_injection() {
            self.inject_into(&mut *object)?;
        }
        object
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| AmbarError::TypeMismatch {
                key: ServiceKey::typed::<T>(key),
                expected: type_name::<T>(),
            })
    }

    // ── Activator ──

    /// Builds `T` from its blueprint right now, firing the activation
    /// observers with the new instance.
    ///
    /// This is what per-request and singleton producers call; it is public
    /// because "construct this blueprinted type" is useful on its own.
    /// A missing blueprint or an empty one is a construction fault.
    #[instrument(level = "debug", skip(self), fields(service = %type_name::<T>()))]
    pub fn activate<T: Send + Sync + 'static>(&self) -> Result<T> {
        let object = self.activate_erased(ServiceType::of::<T>())?;
        object
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| AmbarError::TypeMismatch {
                key: ServiceKey::of::<T>(),
                expected: type_name::<T>(),
            })
    }

    fn activate_erased(&self, target: ServiceType) -> Result<Object> {
        let Some(blueprint) = self
            .inner
            .blueprints
            .get(&target.type_id())
            .map(|entry| Arc::clone(entry.value()))
        else {
            return Err(AmbarError::NotActivatable(NotActivatableError {
                requested: target,
                suggestions: self.blueprint_suggestions(target.type_name()),
            }));
        };

        let spec = blueprint
            .select_constructor(self)
            .ok_or(AmbarError::NoConstructor {
                type_name: target.type_name(),
            })?;

        let object = spec.build(self)?;
        debug!(service = target.type_name(), "Activated instance");
        self.notify_activated(object.as_ref());
        Ok(object)
    }

    fn blueprint_suggestions(&self, requested: &str) -> Vec<String> {
        let known: Vec<&str> = self
            .inner
            .blueprints
            .iter()
            .map(|entry| entry.value().target().type_name())
            .collect();
        suggest_similar(requested, &known, 3)
    }

    // ── Injector ──

    /// Pushes dependencies into an existing value, following `T`'s
    /// blueprint property list.
    ///
    /// Each declared property is resolved with no key and assigned only
    /// when something produced it; misses leave the property untouched.
    /// A type without a blueprint (or without properties) is a no-op.
    pub fn build_up<T: Any + Send + Sync>(&self, target: &mut T) -> Result<()> {
        self.inject_with(TypeId::of::<T>(), target)
    }

    /// Injector over an erased target; used for automatic injection, where
    /// only the runtime type is known.
    fn inject_into(&self, target: &mut (dyn Any + Send + Sync)) -> Result<()> {
        let type_id = (*target).type_id();
        self.inject_with(type_id, target)
    }

    fn inject_with(&self, type_id: TypeId, target: &mut dyn Any) -> Result<()> {
        let Some(blueprint) = self
            .inner
            .blueprints
            .get(&type_id)
            .map(|entry| Arc::clone(entry.value()))
        else {
            return Ok(());
        };

        for property in blueprint.properties() {
            trace!(
                service = blueprint.target().type_name(),
                property = property.name(),
                "Injecting property"
            );
            property.inject(self, &mut *target)?;
        }
        Ok(())
    }

    /// Turns automatic property injection after every resolution on or off.
    /// Off by default, and not inherited by child containers.
    pub fn set_property_injection(&self, enabled: bool) {
        debug!(enabled, "Toggled automatic property injection");
        self.inner.inject_properties.store(enabled, Ordering::Relaxed);
    }

    /// Whether automatic property injection is currently enabled.
    pub fn property_injection(&self) -> bool {
        self.inner.inject_properties.load(Ordering::Relaxed)
    }

    // ── Blueprints ──

    /// Records construction metadata for a concrete type.
    ///
    /// Blueprints are shared across the whole container hierarchy, like the
    /// type metadata they stand in for; entries are not.
    pub fn add_blueprint(&self, blueprint: Blueprint) -> &Self {
        debug!(service = blueprint.target().type_name(), "Recorded blueprint");
        self.inner
            .blueprints
            .insert(blueprint.target().type_id(), Arc::new(blueprint));
        self
    }

    // ── Hierarchy ──

    /// Forks a child container.
    ///
    /// The child starts with a shallow copy of this container's entry list:
    /// the same entry objects, so producers appended to a pre-fork entry
    /// are visible on both sides, while entries either side creates
    /// afterwards stay private to it. Blueprints are shared; observers and
    /// the injection flag start fresh.
    pub fn create_child_container(&self) -> Container {
        debug!("Forked child container");
        Container {
            inner: Arc::new(ContainerCore {
                registry: RwLock::new(self.inner.registry.read().fork()),
                blueprints: Arc::clone(&self.inner.blueprints),
                observers: RwLock::new(Vec::new()),
                next_observer: AtomicU64::new(0),
                inject_properties: AtomicBool::new(false),
            }),
        }
    }

    // ── Activation observers ──

    /// Subscribes to activation: `observer` runs synchronously, in
    /// subscription order, with each instance the activator builds.
    /// Instances supplied via `register_instance` or produced by custom
    /// handlers do not fire it.
    pub fn on_activated<F>(&self, observer: F) -> ActivationHandle
    where
        F: Fn(&(dyn Any + Send + Sync)) + Send + Sync + 'static,
    {
        let id = self.inner.next_observer.fetch_add(1, Ordering::Relaxed);
        self.inner.observers.write().push((id, Arc::new(observer)));
        ActivationHandle(id)
    }

    /// Unsubscribes; `false` when the handle was already removed.
    pub fn remove_activated(&self, handle: ActivationHandle) -> bool {
        let mut observers = self.inner.observers.write();
        let before = observers.len();
        observers.retain(|(id, _)| *id != handle.0);
        observers.len() != before
    }

    fn notify_activated(&self, instance: &(dyn Any + Send + Sync)) {
        let observers: Vec<ActivationObserver> = self
            .inner
            .observers
            .read()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();
        for observer in observers {
            observer(instance);
        }
    }

    // ── Modules ──

    /// Installs a [`Module`]'s registrations into this container.
    pub fn install(&self, module: &dyn Module) -> &Self {
        debug!(module = module.name(), "Installing module");
        module.install(self);
        self
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("entries", &self.inner.registry.read().len())
            .field("blueprints", &self.inner.blueprints.len())
            .field("property_injection", &self.property_injection())
            .finish()
    }
}

// ═══════════════════════════════════════════
// Factory
// ═══════════════════════════════════════════

/// A zero-argument factory for `T`, bound to a container.
///
/// Obtained from [`Container::get_factory`] (or a `Fac<T>` constructor
/// parameter). Each [`create`](Factory::create) performs an ordinary
/// unkeyed resolution, so the lifetime of the underlying registration
/// decides whether calls yield fresh values or the shared one. Cloneable
/// and registrable as a service in its own right.
pub struct Factory<T> {
    container: Container,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> Factory<T> {
    fn synthesized(container: Container) -> Self {
        Self {
            container,
            _marker: PhantomData,
        }
    }

    /// Produces one value now; `Ok(None)` when `T` has no producer.
    pub fn create(&self) -> Result<Option<T>> {
        self.container.get_instance::<T>(None)
    }
}

impl<T> Clone for Factory<T> {
    fn clone(&self) -> Self {
        Self {
            container: self.container.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Factory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory")
            .field("service", &type_name::<T>())
            .finish_non_exhaustive()
    }
}

// ═══════════════════════════════════════════
// AllInstances
// ═══════════════════════════════════════════

/// Lazy iterator over every producer of one matched entry.
///
/// Returned by [`Container::get_all_instances`]. Producers run one at a
/// time as the iterator is driven; each item is the result of producing
/// (and, when enabled, injecting) one value.
pub struct AllInstances<T> {
    container: Container,
    name: Option<String>,
    producers: std::vec::IntoIter<Producer>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> Iterator for AllInstances<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let producer = self.producers.next()?;
        Some(self.container.realize::<T>(&producer, self.name.as_deref()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.producers.size_hint()
    }
}

impl<T: Send + Sync + 'static> ExactSizeIterator for AllInstances<T> {}

impl<T> fmt::Debug for AllInstances<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AllInstances")
            .field("service", &type_name::<T>())
            .field("remaining", &self.producers.len())
            .finish()
    }
}

// ═══════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════

pub mod prelude {
    pub use super::{ActivationHandle, AllInstances, Container, Factory};
    pub use crate::blueprint::{Blueprint, BlueprintBuilder};
    pub use crate::dependencies::{All, Dep, Fac};
    pub use crate::error::{AmbarError, Result};
    pub use crate::key::{ServiceKey, ServiceType};
    pub use crate::module::Module;
    pub use crate::producer::{Lifetime, Object, Producer};
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
