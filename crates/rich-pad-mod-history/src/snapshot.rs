/// Immutable serialized document state.
use std::fmt;
use std::sync::Arc;

/// Full markup of the editable region at one point in time.
///
/// Cloning is cheap (shared string). Equality is plain string equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Snapshot(Arc<str>);

impl Snapshot {
    /// Returns the snapshot markup.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length of the markup in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the snapshot holds an empty document.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Snapshot {
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<String> for Snapshot {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl AsRef<str> for Snapshot {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Snapshot {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for Snapshot {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
