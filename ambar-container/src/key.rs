//! Service identification keys.
//!
//! [`ServiceType`] names a Rust type; [`ServiceKey`] combines an optional
//! service type (unset means the wildcard "any type") with an optional
//! string key, and is what entries and queries are identified by.

use std::any::{TypeId, type_name};
use std::fmt;

/// Identifies a service type by its [`TypeId`].
///
/// Carries the human-readable type name alongside for error messages
/// and logs. Equality and hashing use the `TypeId` only.
///
/// # Examples
/// ```
/// use ambar_container::key::ServiceType;
///
/// let ty = ServiceType::of::<String>();
/// assert_eq!(ty.type_name(), "alloc::string::String");
/// assert_eq!(ty, ServiceType::of::<String>());
/// assert_ne!(ty, ServiceType::of::<i32>());
/// ```
#[derive(Clone, Copy)]
pub struct ServiceType {
    type_id: TypeId,
    type_name: &'static str,
}

impl ServiceType {
    /// Creates the identity of type `T`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }

    /// Returns the [`TypeId`] of this service type.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the fully qualified type name.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl PartialEq for ServiceType {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ServiceType {}

impl fmt::Debug for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceType({})", self.type_name)
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name)
    }
}

/// Identifies an entry (or a query) in the container.
///
/// The service half may be unset, which acts as the wildcard for pure
/// key-based lookup; the name half is the optional string key that lets
/// several producers of the same type coexist.
///
/// # Examples
/// ```
/// use ambar_container::key::ServiceKey;
///
/// // Plain key — type only
/// let key = ServiceKey::of::<String>();
/// assert_eq!(key.name(), None);
///
/// // Named key — type + string key
/// let primary = ServiceKey::named::<String>("primary_db");
/// let replica = ServiceKey::named::<String>("replica_db");
/// assert_ne!(primary, replica);
///
/// // Wildcard key — string key only, matches any type
/// let by_name = ServiceKey::name_only("primary_db");
/// assert!(by_name.service().is_none());
/// ```
#[derive(Clone)]
pub struct ServiceKey {
    service: Option<ServiceType>,
    name: Option<String>,
}

impl ServiceKey {
    /// Creates a key for type `T` with no string key.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            service: Some(ServiceType::of::<T>()),
            name: None,
        }
    }

    /// Creates a key for type `T` with a string key.
    #[inline]
    pub fn named<T: ?Sized + 'static>(name: impl Into<String>) -> Self {
        Self {
            service: Some(ServiceType::of::<T>()),
            name: Some(name.into()),
        }
    }

    /// Creates a wildcard key: matches entries of any service type
    /// whose string key equals `name`.
    #[inline]
    pub fn name_only(name: impl Into<String>) -> Self {
        Self {
            service: None,
            name: Some(name.into()),
        }
    }

    /// Creates a key for type `T` with an optional string key.
    #[inline]
    pub fn typed<T: ?Sized + 'static>(name: Option<&str>) -> Self {
        Self {
            service: Some(ServiceType::of::<T>()),
            name: name.map(str::to_owned),
        }
    }

    /// Returns the service type half, unset for wildcard keys.
    #[inline]
    pub fn service(&self) -> Option<ServiceType> {
        self.service
    }

    /// Returns the string key half.
    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl PartialEq for ServiceKey {
    fn eq(&self, other: &Self) -> bool {
        self.service == other.service && self.name == other.name
    }
}

impl Eq for ServiceKey {}

impl fmt::Debug for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.service, &self.name) {
            (Some(service), Some(name)) => {
                write!(f, "ServiceKey({}, key={:?})", service.type_name(), name)
            }
            (Some(service), None) => write!(f, "ServiceKey({})", service.type_name()),
            (None, Some(name)) => write!(f, "ServiceKey(any, key={name:?})"),
            (None, None) => write!(f, "ServiceKey(any)"),
        }
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.service, &self.name) {
            (Some(service), Some(name)) => {
                write!(f, "{} (key={:?})", service.type_name(), name)
            }
            (Some(service), None) => write!(f, "{}", service.type_name()),
            (None, Some(name)) => write!(f, "any (key={name:?})"),
            (None, None) => write!(f, "any"),
        }
    }
}
