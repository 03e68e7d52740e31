//! Reusable registration bundles.
//!
//! A [`Module`] groups related registrations so an application can compose
//! its container out of named pieces instead of one long setup function.

use crate::container::Container;

/// A named bundle of registrations.
///
/// ```rust
/// use ambar_container::prelude::*;
///
/// struct HttpDefaults;
///
/// impl Module for HttpDefaults {
///     fn install(&self, container: &Container) {
///         container.register_instance(Some("timeout_ms"), 5_000u64);
///         container.register_instance(Some("user_agent"), String::from("ambar"));
///     }
/// }
///
/// let container = Container::new();
/// container.install(&HttpDefaults);
/// assert_eq!(container.get_instance::<u64>(Some("timeout_ms")).unwrap(), Some(5_000));
/// ```
pub trait Module {
    /// Performs this module's registrations.
    fn install(&self, container: &Container);

    /// Name used in logs; defaults to the implementing type's name.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Storage;
    impl Module for Storage {
        fn install(&self, container: &Container) {
            container.register_instance(None, String::from("postgres://localhost"));
        }
    }

    struct Limits;
    impl Module for Limits {
        fn install(&self, container: &Container) {
            container.register_instance(Some("max_connections"), 32u32);
        }

        fn name(&self) -> &str {
            "limits"
        }
    }

    #[test]
    fn install_applies_registrations() {
        let container = Container::new();
        container.install(&Storage).install(&Limits);

        assert_eq!(
            container.get_instance::<String>(None).unwrap().unwrap(),
            "postgres://localhost"
        );
        assert_eq!(
            container.get_instance::<u32>(Some("max_connections")).unwrap(),
            Some(32)
        );
    }

    #[test]
    fn name_defaults_to_type_name() {
        assert!(Storage.name().contains("Storage"));
        assert_eq!(Limits.name(), "limits");
    }
}
