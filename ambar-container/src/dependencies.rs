//! Constructor dependency markers.
//!
//! Each marker fixes two things about one constructor parameter: the
//! service type it counts as when the container checks which constructor it
//! can satisfy best, and how the value is resolved when the constructor
//! runs. Markers compose into tuples (up to eight parameters), which is the
//! shape [`BlueprintBuilder::constructor`](crate::blueprint::BlueprintBuilder::constructor)
//! accepts.
//!
//! - [`Dep<T>`] — an eager instance; a miss arrives as `Dep(None)` instead
//!   of failing the build.
//! - [`Fac<T>`] — a [`Factory<T>`]; synthesized when not registered, so it
//!   never misses.
//! - [`All<T>`] — every producer of `T`, realized into a `Vec`.
//!
//! Availability counting only consults registered entries: a `Fac<T>` or
//! `All<T>` parameter raises a constructor's score only when a `Factory<T>`
//! or `Vec<T>` entry exists, even though resolution would synthesize one.

use std::any::type_name;

use crate::container::{Container, Factory};
use crate::error::{AmbarError, Result};
use crate::key::ServiceType;

/// One resolvable constructor parameter.
pub trait Dependency: Sized + 'static {
    /// The service type consulted when counting satisfiable parameters.
    fn service() -> ServiceType;

    /// Resolves the parameter against `container`.
    fn resolve(container: &Container) -> Result<Self>;
}

/// A tuple of [`Dependency`] parameters, resolved left to right.
pub trait Dependencies: Sized + 'static {
    /// Parameter service types in declaration order.
    fn services() -> Vec<ServiceType>;

    /// Resolves the whole tuple against `container`.
    fn resolve(container: &Container) -> Result<Self>;
}

// ── Dep ──

/// An instance of `T`, or `None` when nothing produces one.
pub struct Dep<T>(pub Option<T>);

impl<T: Send + Sync + 'static> Dep<T> {
    /// Unwraps the value, turning a miss into a missing-dependency fault.
    pub fn required(self) -> Result<T> {
        self.0.ok_or(AmbarError::MissingDependency {
            type_name: type_name::<T>(),
        })
    }
}

impl<T: Send + Sync + 'static> Dependency for Dep<T> {
    fn service() -> ServiceType {
        ServiceType::of::<T>()
    }

    fn resolve(container: &Container) -> Result<Self> {
        Ok(Dep(container.get_instance::<T>(None)?))
    }
}

// ── Fac ──

/// A factory for `T`: defers production to `create()` call time.
pub struct Fac<T>(pub Factory<T>);

impl<T: Send + Sync + 'static> Dependency for Fac<T> {
    fn service() -> ServiceType {
        ServiceType::of::<Factory<T>>()
    }

    fn resolve(container: &Container) -> Result<Self> {
        Ok(Fac(container.get_factory::<T>(None)?))
    }
}

// ── All ──

/// Every registered producer of `T`, realized in registration order.
pub struct All<T>(pub Vec<T>);

impl<T: Send + Sync + 'static> Dependency for All<T> {
    fn service() -> ServiceType {
        ServiceType::of::<Vec<T>>()
    }

    fn resolve(container: &Container) -> Result<Self> {
        Ok(All(container.get_collection::<T>(None)?))
    }
}

// ── Tuples ──

impl Dependencies for () {
    fn services() -> Vec<ServiceType> {
        Vec::new()
    }

    fn resolve(_container: &Container) -> Result<Self> {
        Ok(())
    }
}

macro_rules! impl_dependencies {
    ($($ty:ident),+) => {
        impl<$($ty: Dependency),+> Dependencies for ($($ty,)+) {
            fn services() -> Vec<ServiceType> {
                vec![$($ty::service()),+]
            }

            fn resolve(container: &Container) -> Result<Self> {
                Ok(($($ty::resolve(container)?,)+))
            }
        }
    };
}

impl_dependencies!(A);
impl_dependencies!(A, B);
impl_dependencies!(A, B, C);
impl_dependencies!(A, B, C, D);
impl_dependencies!(A, B, C, D, E);
impl_dependencies!(A, B, C, D, E, F);
impl_dependencies!(A, B, C, D, E, F, G);
impl_dependencies!(A, B, C, D, E, F, G, H);
