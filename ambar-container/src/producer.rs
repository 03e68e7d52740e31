//! Producers — the unit of registration.
//!
//! A producer is a function from the container to a type-erased value,
//! tagged with the [`Lifetime`] it implements. The three built-in lifetimes
//! all reduce to a closure shape:
//! - [`Lifetime::Instance`] — clones a pre-built value out on every call
//! - [`Lifetime::PerRequest`] — runs the factory on every call
//! - [`Lifetime::Singleton`] — runs the factory once into a cache cell,
//!   clones the cached value out thereafter
//!
//! Custom handlers carry [`Lifetime::Custom`] and do whatever their closure
//! does.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::container::Container;
use crate::error::Result;

/// The type-erased payload every producer yields.
///
/// Resolution moves values out of the box, so shared services are
/// registered as `Arc<T>` (or `Arc<dyn Trait>`) — cloning the arc out
/// preserves allocation identity.
pub type Object = Box<dyn Any + Send + Sync>;

/// Shared produce function: container in, erased value out.
///
/// `Arc` rather than `Box` because producers are snapshotted for lazy
/// iteration and shared between parent and child containers.
pub type ProducerFn = Arc<dyn Fn(&Container) -> Result<Object> + Send + Sync>;

/// How a producer manages the values it yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// Always the same pre-built value, captured at registration time.
    Instance,
    /// A fresh value built on every resolution.
    PerRequest,
    /// Built on first resolution, cached in a per-producer cell, reused.
    Singleton,
    /// A caller-supplied handler; caching behavior is whatever it implements.
    Custom,
}

impl Lifetime {
    /// Returns `true` if this lifetime yields one shared value.
    #[inline]
    pub fn is_shared(&self) -> bool {
        matches!(self, Lifetime::Instance | Lifetime::Singleton)
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifetime::Instance => write!(f, "instance"),
            Lifetime::PerRequest => write!(f, "per-request"),
            Lifetime::Singleton => write!(f, "singleton"),
            Lifetime::Custom => write!(f, "custom"),
        }
    }
}

/// A registered producer: a lifetime tag plus the produce function.
///
/// Cloning a producer shares its closure (and therefore a singleton's cache
/// cell) — this is what entry snapshots and parent/child sharing rely on.
#[derive(Clone)]
pub struct Producer {
    lifetime: Lifetime,
    produce: ProducerFn,
}

impl Producer {
    /// Producer that clones `value` out on every call.
    pub fn instance<T: Clone + Send + Sync + 'static>(value: T) -> Self {
        Self {
            lifetime: Lifetime::Instance,
            produce: Arc::new(move |_: &Container| Ok(Box::new(value.clone()) as Object)),
        }
    }

    /// Producer that runs `factory` on every call.
    pub fn per_request<T, F>(factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> Result<T> + Send + Sync + 'static,
    {
        Self {
            lifetime: Lifetime::PerRequest,
            produce: Arc::new(move |container: &Container| {
                Ok(Box::new(factory(container)?) as Object)
            }),
        }
    }

    /// Producer that runs `factory` once and caches the result.
    ///
    /// Every call to this constructor creates a fresh cache cell, so two
    /// singleton registrations for the same key keep independent caches.
    /// The cell write is first-call-wins.
    ///
    /// **`T` must implement `Clone`** — use `Arc<T>` for services.
    pub fn singleton<T, F>(factory: F) -> Self
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(&Container) -> Result<T> + Send + Sync + 'static,
    {
        let cell: Arc<OnceCell<T>> = Arc::new(OnceCell::new());

        Self {
            lifetime: Lifetime::Singleton,
            produce: Arc::new(move |container: &Container| {
                let value = cell.get_or_try_init(|| factory(container))?;
                Ok(Box::new(value.clone()) as Object)
            }),
        }
    }

    /// Producer from a raw handler yielding an already-erased value.
    pub fn custom<F>(handler: F) -> Self
    where
        F: Fn(&Container) -> Result<Object> + Send + Sync + 'static,
    {
        Self {
            lifetime: Lifetime::Custom,
            produce: Arc::new(handler),
        }
    }

    /// Returns the lifetime tag.
    #[inline]
    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// Invokes the produce function with `container`.
    pub(crate) fn produce(&self, container: &Container) -> Result<Object> {
        (self.produce)(container)
    }
}

impl fmt::Debug for Producer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn unbox<T: 'static>(object: Object) -> T {
        *object.downcast::<T>().unwrap()
    }

    #[test]
    fn instance_yields_same_allocation() {
        let container = Container::new();
        let producer = Producer::instance(Arc::new(7u32));

        let a: Arc<u32> = unbox(producer.produce(&container).unwrap());
        let b: Arc<u32> = unbox(producer.produce(&container).unwrap());

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(producer.lifetime(), Lifetime::Instance);
    }

    #[test]
    fn per_request_runs_factory_each_call() {
        let container = Container::new();
        let counter = Arc::new(AtomicU32::new(0));
        let producer = Producer::per_request({
            let counter = counter.clone();
            move |_| Ok(counter.fetch_add(1, Ordering::SeqCst))
        });

        let a: u32 = unbox(producer.produce(&container).unwrap());
        let b: u32 = unbox(producer.produce(&container).unwrap());

        assert_eq!((a, b), (0, 1));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn singleton_runs_factory_once() {
        let container = Container::new();
        let counter = Arc::new(AtomicU32::new(0));
        let producer = Producer::singleton({
            let counter = counter.clone();
            move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(42u32))
            }
        });

        let a: Arc<u32> = unbox(producer.produce(&container).unwrap());
        let b: Arc<u32> = unbox(producer.produce(&container).unwrap());

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cloned_singleton_shares_cache_cell() {
        let container = Container::new();
        let counter = Arc::new(AtomicU32::new(0));
        let producer = Producer::singleton({
            let counter = counter.clone();
            move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(1u8))
            }
        });
        let snapshot = producer.clone();

        let a: Arc<u8> = unbox(producer.produce(&container).unwrap());
        let b: Arc<u8> = unbox(snapshot.produce(&container).unwrap());

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn custom_handler_controls_payload() {
        let container = Container::new();
        let producer = Producer::custom(|_| Ok(Box::new(String::from("raw")) as Object));

        let value: String = unbox(producer.produce(&container).unwrap());
        assert_eq!(value, "raw");
        assert_eq!(producer.lifetime(), Lifetime::Custom);
    }

    #[test]
    fn lifetime_display_and_sharing() {
        assert_eq!(format!("{}", Lifetime::PerRequest), "per-request");
        assert!(Lifetime::Singleton.is_shared());
        assert!(Lifetime::Instance.is_shared());
        assert!(!Lifetime::PerRequest.is_shared());
        assert!(!Lifetime::Custom.is_shared());
    }

    #[test]
    fn debug_hides_closure() {
        let producer = Producer::instance(3i32);
        let debug = format!("{producer:?}");
        assert!(debug.contains("Instance"));
    }
}
