use std::borrow::Borrow;

/// Name of a recognizable marker, as reported by the tracking subsystem.
///
/// The only join key between raw tracking events and registered entities.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct MarkerId(String);

impl MarkerId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MarkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for MarkerId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MarkerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for MarkerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}
