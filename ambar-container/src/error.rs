//! Error types for container operations.
//!
//! Lookup misses are not errors: resolving an unregistered service yields
//! `Ok(None)` by design. Everything here is a construction fault — something
//! went wrong while actually building a value.

use std::fmt;

use ambar_support::rendering::shorten_type_name;

use crate::key::{ServiceKey, ServiceType};

/// Main error type for all container operations.
#[derive(Debug, thiserror::Error)]
pub enum AmbarError {
    /// A build was requested for a type with no recorded blueprint.
    #[error("{}", .0)]
    NotActivatable(NotActivatableError),

    /// The blueprint exists but declares no constructors.
    #[error(
        "no constructor recorded for {type_name}\n  Hint: declare one with .constructor(..) or .with_default() on the blueprint"
    )]
    NoConstructor { type_name: &'static str },

    /// A constructor marked a dependency as required and it resolved to nothing.
    #[error(
        "required dependency is not available: {type_name}\n  Hint: register a producer for it, or accept the miss instead of calling .required()"
    )]
    MissingDependency { type_name: &'static str },

    /// A producer or constructor closure failed while building a value.
    #[error("failed to construct {type_name}: {source}")]
    Construction {
        type_name: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The matched entry produced a value of a different type than requested.
    #[error("type mismatch resolving {key}: producer did not yield a {expected}")]
    TypeMismatch {
        key: ServiceKey,
        expected: &'static str,
    },
}

impl AmbarError {
    /// Wraps a domain error as a construction fault for type `T`.
    ///
    /// Convenience for producer closures:
    ///
    /// ```rust,ignore
    /// container.register_handler(None, |_| {
    ///     Database::connect(url).map_err(AmbarError::construction::<Database>)
    /// });
    /// ```
    pub fn construction<T: ?Sized + 'static>(
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        AmbarError::Construction {
            type_name: std::any::type_name::<T>(),
            source: source.into(),
        }
    }
}

/// Fault raised when activation finds no blueprint for the requested type.
///
/// Carries close matches among the recorded blueprints so typos surface
/// immediately.
#[derive(Debug)]
pub struct NotActivatableError {
    /// The type whose construction was requested
    pub requested: ServiceType,
    /// Blueprinted types with similar names (for "did you mean?" output)
    pub suggestions: Vec<String>,
}

impl fmt::Display for NotActivatableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no blueprint recorded for type: {}", self.requested)?;

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {}", shorten_type_name(suggestion))?;
            }
        }

        write!(
            f,
            "\n  Hint: add one with container.add_blueprint(Blueprint::of::<{}>()..)",
            shorten_type_name(self.requested.type_name())
        )
    }
}

/// Convenient Result type for container operations.
pub type Result<T> = std::result::Result<T, AmbarError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_activatable_display() {
        let err = AmbarError::NotActivatable(NotActivatableError {
            requested: ServiceType::of::<String>(),
            suggestions: vec!["alloc::string::String".to_string()],
        });

        let msg = format!("{err}");
        assert!(msg.contains("no blueprint"));
        assert!(msg.contains("String"));
        assert!(msg.contains("Did you mean"));
        assert!(msg.contains("Hint"));
    }

    #[test]
    fn construction_wraps_source() {
        let source = std::io::Error::other("connection refused");
        let err = AmbarError::construction::<Vec<u8>>(source);

        let msg = format!("{err}");
        assert!(msg.contains("failed to construct"));
        assert!(msg.contains("Vec<u8>"));
        assert!(msg.contains("connection refused"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn type_mismatch_display() {
        let err = AmbarError::TypeMismatch {
            key: ServiceKey::named::<String>("primary"),
            expected: "alloc::string::String",
        };

        let msg = format!("{err}");
        assert!(msg.contains("type mismatch"));
        assert!(msg.contains("primary"));
    }

    #[test]
    fn missing_dependency_display() {
        let err = AmbarError::MissingDependency { type_name: "app::Database" };
        let msg = format!("{err}");
        assert!(msg.contains("required dependency"));
        assert!(msg.contains("app::Database"));
    }
}
