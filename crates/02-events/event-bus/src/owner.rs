use std::fmt;
use std::sync::Arc;

/// Identity of the extension that owns a handler, used in failure logs.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExtensionId(Arc<str>);

impl ExtensionId {
    /// Creates an id from the extension's unique name.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// Returns the unique name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExtensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ExtensionId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ExtensionId {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}
