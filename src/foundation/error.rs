use std::fmt;

/// Convenience result type used across scenecraft.
pub type EditorResult<T> = Result<T, EditorError>;

/// Top-level error taxonomy used by editor APIs.
///
/// Stale references and out-of-range values are not errors: the stores ignore the former and clamp
/// the latter. Everything that does surface here is recoverable.
#[derive(thiserror::Error, Debug)]
pub enum EditorError {
    /// Invalid user-provided or persisted data.
    #[error("validation error: {0}")]
    Validation(String),

    /// An operation was attempted without the context it requires.
    #[error("precondition failed: {0}")]
    Precondition(Precondition),

    /// A backend call failed; the message is meant for the user.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Missing context reported back to the caller instead of mutating state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Precondition {
    /// Adding a component requires a selected scene.
    NoSceneSelected,
    /// A property key does not exist on the targeted component variant.
    PropertyKindMismatch {
        /// Property key that was rejected.
        key: &'static str,
        /// Variant of the component that was targeted.
        kind: &'static str,
    },
}

impl fmt::Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSceneSelected => f.write_str("no scene selected"),
            Self::PropertyKindMismatch { key, kind } => {
                write!(f, "property '{key}' does not apply to {kind} components")
            }
        }
    }
}

impl EditorError {
    /// Build a [`EditorError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`EditorError::Persistence`] value.
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Build a [`EditorError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Returns the precondition that failed, if this is a precondition error.
    pub fn precondition(&self) -> Option<&Precondition> {
        match self {
            Self::Precondition(p) => Some(p),
            _ => None,
        }
    }
}

impl From<Precondition> for EditorError {
    fn from(p: Precondition) -> Self {
        Self::Precondition(p)
    }
}

impl From<serde_json::Error> for EditorError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
