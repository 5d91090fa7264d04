//! Error types for Horizon UX components.

/// Result type alias for component operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or driving components.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No factory is registered under the requested component name.
    #[error("Unknown component type '{name}'")]
    UnknownComponent { name: String },

    /// A component config could not be deserialized.
    #[error("Invalid config for component '{component}': {source}")]
    InvalidConfig {
        component: String,
        #[source]
        source: serde_json::Error,
    },

    /// The host supplied no query source for a component that needs one.
    #[error("No query source available for component '{id}'")]
    MissingQuerySource { id: String },

    /// A query failed.
    #[error("Query error: {0}")]
    Query(#[from] QueryError),
}

impl Error {
    /// Create an unknown-component error.
    pub fn unknown_component(name: impl Into<String>) -> Self {
        Self::UnknownComponent { name: name.into() }
    }

    /// Create an invalid-config error.
    pub fn invalid_config(component: impl Into<String>, source: serde_json::Error) -> Self {
        Self::InvalidConfig {
            component: component.into(),
            source,
        }
    }
}

/// Errors reported by a query source.
///
/// The combo box never surfaces these to the host: a failed query is logged
/// and behaves like an empty result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// The source could not produce results.
    #[error("Query failed: {0}")]
    Failed(String),

    /// The source dropped the request without answering.
    #[error("Query was cancelled")]
    Cancelled,
}

impl QueryError {
    /// Create a failure with a message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::unknown_component("UiTagComboBox");
        assert_eq!(err.to_string(), "Unknown component type 'UiTagComboBox'");

        let err: Error = QueryError::failed("timeout").into();
        assert_eq!(err.to_string(), "Query error: Query failed: timeout");
    }

    #[test]
    fn test_invalid_config_keeps_source() {
        let source = serde_json::from_str::<u32>("\"x\"").unwrap_err();
        let err = Error::invalid_config("UiComboBox", source);
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().starts_with("Invalid config for component 'UiComboBox'"));
    }
}
