use crate::MarkerId;

/// Errors returned by registry lookups and configuration checks.
///
/// None of these are fatal to a frame: the session logs them and moves on.
#[derive(Debug, Clone, PartialEq)]
pub enum AnchorError {
    /// The event or call referenced an identity that was never registered.
    NotFound(MarkerId),
    /// A configuration value is out of its valid range.
    InvalidConfig(String),
}

impl std::fmt::Display for AnchorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "marker '{}' is not registered", id),
            Self::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for AnchorError {}
