//! Blueprints — per-type construction metadata.
//!
//! A blueprint records how a concrete type can be built: an ordered list of
//! constructors (each declaring the service types of its parameters plus a
//! build closure) and an ordered list of injectable properties. The
//! container keeps one blueprint per target type and picks a constructor at
//! activation time by counting, per constructor, how many parameter types
//! currently have a handler — highest count wins, first declared wins ties.
//!
//! Blueprints stand in for runtime type introspection: what a reflective
//! container discovers from constructor signatures and property setters is
//! declared here explicitly through [`BlueprintBuilder`].
//!
//! # Examples
//! ```
//! use ambar_container::prelude::*;
//!
//! struct Greeter {
//!     greeting: String,
//! }
//!
//! let blueprint = Blueprint::of::<Greeter>()
//!     .constructor(|(greeting,): (Dep<String>,)| {
//!         Ok(Greeter { greeting: greeting.required()? })
//!     })
//!     .build();
//!
//! assert_eq!(blueprint.constructor_count(), 1);
//! ```

use std::any::{Any, type_name};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::trace;

use crate::container::Container;
use crate::dependencies::Dependencies;
use crate::error::{AmbarError, Result};
use crate::key::ServiceType;
use crate::producer::Object;

/// Shared build closure: resolves the declared parameters, runs the user
/// constructor, boxes the result.
pub(crate) type BuildFn = Arc<dyn Fn(&Container) -> Result<Object> + Send + Sync>;

/// Shared property-injection closure: resolves the property's service type
/// and assigns it into the (erased) target when available.
pub(crate) type InjectFn = Arc<dyn Fn(&Container, &mut dyn Any) -> Result<()> + Send + Sync>;

/// One declared constructor: parameter identities plus the build closure.
pub(crate) struct ConstructorSpec {
    params: Vec<ServiceType>,
    build: BuildFn,
}

impl ConstructorSpec {
    pub fn build(&self, container: &Container) -> Result<Object> {
        (self.build)(container)
    }
}

/// One declared injectable property.
pub(crate) struct PropertySpec {
    name: &'static str,
    inject: InjectFn,
}

impl PropertySpec {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn inject(&self, container: &Container, target: &mut dyn Any) -> Result<()> {
        (self.inject)(container, target)
    }
}

// ═══════════════════════════════════════════
// Blueprint
// ═══════════════════════════════════════════

/// Construction metadata for one concrete type.
///
/// Created through [`Blueprint::of`] and registered with
/// [`Container::add_blueprint`](crate::container::Container::add_blueprint).
pub struct Blueprint {
    target: ServiceType,
    constructors: Vec<ConstructorSpec>,
    properties: Vec<PropertySpec>,
}

impl Blueprint {
    /// Starts a builder for type `T`.
    pub fn of<T: Send + Sync + 'static>() -> BlueprintBuilder<T> {
        BlueprintBuilder::new()
    }

    /// The type this blueprint constructs.
    pub fn target(&self) -> ServiceType {
        self.target
    }

    pub fn constructor_count(&self) -> usize {
        self.constructors.len()
    }

    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    /// Picks the constructor whose parameters the container can currently
    /// satisfy best.
    ///
    /// Scores count parameter service types with a handler under no key
    /// (the lookup fallback applies, so keyed-only registrations count too).
    /// The first constructor at the highest score wins; `None` only when no
    /// constructor was declared at all.
    pub(crate) fn select_constructor(&self, container: &Container) -> Option<&ConstructorSpec> {
        let mut best: Option<(&ConstructorSpec, usize)> = None;

        for (index, spec) in self.constructors.iter().enumerate() {
            let score = spec
                .params
                .iter()
                .filter(|param| container.has_entry(Some(**param), None))
                .count();
            trace!(
                blueprint = self.target.type_name(),
                constructor = index,
                score,
                "Scored constructor"
            );

            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((spec, score)),
            }
        }

        best.map(|(spec, _)| spec)
    }

    pub(crate) fn properties(&self) -> &[PropertySpec] {
        &self.properties
    }
}

impl fmt::Debug for Blueprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blueprint")
            .field("target", &self.target.type_name())
            .field("constructors", &self.constructors.len())
            .field(
                "properties",
                &self.properties.iter().map(|p| p.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

// ═══════════════════════════════════════════
// BlueprintBuilder
// ═══════════════════════════════════════════

/// Typed builder filling in a [`Blueprint`] for `T`.
pub struct BlueprintBuilder<T> {
    constructors: Vec<ConstructorSpec>,
    properties: Vec<PropertySpec>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> BlueprintBuilder<T> {
    fn new() -> Self {
        Self {
            constructors: Vec::new(),
            properties: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Declares a constructor.
    ///
    /// `A` is a tuple of dependency markers ([`Dep`](crate::dependencies::Dep),
    /// [`Fac`](crate::dependencies::Fac), [`All`](crate::dependencies::All));
    /// annotate the closure parameter and the tuple is resolved through the
    /// container before `construct` runs. An unresolvable `Dep` arrives as
    /// `Dep(None)` rather than failing the build.
    pub fn constructor<A, F>(mut self, construct: F) -> Self
    where
        A: Dependencies,
        F: Fn(A) -> Result<T> + Send + Sync + 'static,
    {
        self.constructors.push(ConstructorSpec {
            params: A::services(),
            build: Arc::new(move |container: &Container| {
                let dependencies = A::resolve(container)?;
                let value = construct(dependencies)?;
                Ok(Box::new(value) as Object)
            }),
        });
        self
    }

    /// Declares zero-argument construction through `Default`.
    pub fn with_default(mut self) -> Self
    where
        T: Default,
    {
        self.constructors.push(ConstructorSpec {
            params: Vec::new(),
            build: Arc::new(|_: &Container| Ok(Box::new(T::default()) as Object)),
        });
        self
    }

    /// Declares an injectable property.
    ///
    /// During injection the property's service type `P` is resolved with no
    /// key; `assign` runs only when a value was produced, so missing
    /// registrations leave the property untouched.
    pub fn property<P, F>(mut self, name: &'static str, assign: F) -> Self
    where
        P: Send + Sync + 'static,
        F: Fn(&mut T, P) + Send + Sync + 'static,
    {
        self.properties.push(PropertySpec {
            name,
            inject: Arc::new(move |container: &Container, target: &mut dyn Any| {
                let Some(value) = container.get_instance::<P>(None)? else {
                    return Ok(());
                };
                match target.downcast_mut::<T>() {
                    Some(concrete) => {
                        assign(concrete, value);
                        Ok(())
                    }
                    None => Err(AmbarError::Construction {
                        type_name: type_name::<T>(),
                        source: "property injection target has a different runtime type".into(),
                    }),
                }
            }),
        });
        self
    }

    pub fn build(self) -> Blueprint {
        Blueprint {
            target: ServiceType::of::<T>(),
            constructors: self.constructors,
            properties: self.properties,
        }
    }
}
