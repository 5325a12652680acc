//! Errors raised while building and validating a factory model.
//!
//! Every error aborts the current build step. The variants group the failures by their cause so
//! that callers running many configurations (e.g. a sensitivity sweep) can decide whether to skip
//! a configuration or abort the whole batch.
use thiserror::Error;

/// The category of a [`ModelError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ErrorKind {
    /// Duplicate keys, missing components, wrong connection cardinality
    Structure,
    /// Incompatible flowtypes
    FlowType,
    /// Invalid or conflicting component parameters
    Configuration,
    /// Defects found by the graph-wide validity check
    Validity,
}

/// An error in the definition of a factory model
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// The graph structure is invalid
    #[error("{0}")]
    Structure(String),
    /// Two flowtypes which should agree do not
    #[error(
        "Flowtype mismatch between {origin} ({origin_flowtype}) and {destination} \
         ({destination_flowtype})"
    )]
    FlowType {
        /// Name of the first component
        origin: String,
        /// Flowtype of the first component
        origin_flowtype: String,
        /// Name of the second component
        destination: String,
        /// Flowtype of the second component
        destination_flowtype: String,
    },
    /// A component parameter is invalid
    #[error("Invalid configuration for {component}: {message}")]
    Configuration {
        /// The key of the component being configured
        component: String,
        /// What is wrong with the configuration
        message: String,
    },
    /// The factory failed the graph-wide validity check
    #[error("Factory is invalid:\n  * {}", .0.join("\n  * "))]
    Validity(Vec<String>),
}

impl ModelError {
    /// Create a new structural error
    pub fn structure(message: impl Into<String>) -> Self {
        Self::Structure(message.into())
    }

    /// Create a new configuration error for the given component
    pub fn configuration(component: impl ToString, message: impl Into<String>) -> Self {
        Self::Configuration {
            component: component.to_string(),
            message: message.into(),
        }
    }

    /// The category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Structure(_) => ErrorKind::Structure,
            Self::FlowType { .. } => ErrorKind::FlowType,
            Self::Configuration { .. } => ErrorKind::Configuration,
            Self::Validity(_) => ErrorKind::Validity,
        }
    }

    /// Whether the error means the model itself is corrupt, rather than a single configuration
    /// choice being unworkable.
    ///
    /// Structural errors come from wiring the graph incorrectly and will recur for every scenario,
    /// whereas configuration errors may only affect particular parameter combinations.
    pub fn is_model_defect(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Structure | ErrorKind::FlowType | ErrorKind::Validity
        )
    }
}

/// Shorthand for results with a [`ModelError`]
pub type ModelResult<T> = Result<T, ModelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity_message() {
        let err = ModelError::Validity(vec!["first".into(), "second".into()]);
        assert_eq!(err.to_string(), "Factory is invalid:\n  * first\n  * second");
        assert_eq!(err.kind(), ErrorKind::Validity);
    }

    #[test]
    fn test_is_model_defect() {
        assert!(ModelError::structure("duplicate").is_model_defect());
        assert!(!ModelError::configuration("pool", "bad").is_model_defect());
    }
}
