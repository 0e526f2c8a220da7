use thiserror::Error;

/// Result type for gazetteer operations
pub type Result<T> = std::result::Result<T, GazetteerError>;

/// Errors raised while loading or querying gazetteer data
#[derive(Error, Debug)]
pub enum GazetteerError {
    /// Gazetteer document failed to parse
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Unsupported document schema
    #[error("Unsupported gazetteer schema_version {0} (expected 1)")]
    UnsupportedSchema(u32),

    /// A state was declared without districts
    #[error("State '{0}' has no districts")]
    EmptyState(String),

    /// A name appears twice where it must be unique
    #[error("Duplicate entry '{name}' in {scope}")]
    Duplicate { scope: String, name: String },

    /// An alias points at a state or district that does not exist
    #[error("Alias '{alias}' targets unknown entry '{target}'")]
    DanglingAlias { alias: String, target: String },

    /// Lookup of a state that is not a gazetteer key
    #[error("Unknown state: {0}")]
    UnknownState(String),

    #[error("{0}")]
    Other(String),
}

impl GazetteerError {
    pub fn duplicate(scope: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Duplicate {
            scope: scope.into(),
            name: name.into(),
        }
    }

    pub fn dangling(alias: impl Into<String>, target: impl Into<String>) -> Self {
        Self::DanglingAlias {
            alias: alias.into(),
            target: target.into(),
        }
    }
}
