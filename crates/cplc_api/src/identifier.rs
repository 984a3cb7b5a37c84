use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Fully qualified binary name of a type, e.g. `java.util.Map$Entry`.
///
/// Identifiers are ordered by name so that sets of them iterate
/// deterministically and support prefix range scans.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeIdentifier(String);

impl TypeIdentifier {
    /// The root object type. It is assumed to always be available.
    pub const ROOT_OBJECT: &'static str = "java.lang.Object";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Builds an identifier from an internal (slash separated) class name.
    pub fn from_internal(name: &str) -> Self {
        Self(name.replace('/', "."))
    }

    pub fn root_object() -> Self {
        Self(Self::ROOT_OBJECT.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_root_object(&self) -> bool {
        self.0 == Self::ROOT_OBJECT
    }

    /// Package part of the name, empty for the unnamed package.
    pub fn package(&self) -> &str {
        self.0.rsplit_once('.').map(|(pkg, _)| pkg).unwrap_or("")
    }

    pub fn simple_name(&self) -> &str {
        self.0.rsplit_once('.').map(|(_, name)| name).unwrap_or(&self.0)
    }

    /// True for array descriptors such as `[Ljava.lang.String;`.
    pub fn is_array_descriptor(&self) -> bool {
        is_array_descriptor(&self.0)
    }

    /// True for synthetic names carrying a path separator (hidden/lambda classes).
    pub fn has_path_separator(&self) -> bool {
        has_path_separator(&self.0)
    }

    /// Internal form with `/` separators, as found inside class files.
    pub fn to_internal(&self) -> String {
        self.0.replace('.', "/")
    }
}

pub(crate) fn is_array_descriptor(name: &str) -> bool {
    name.starts_with('[')
}

pub(crate) fn has_path_separator(name: &str) -> bool {
    name.contains('/')
}

impl fmt::Display for TypeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeIdentifier {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TypeIdentifier {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for TypeIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for TypeIdentifier {
    fn borrow(&self) -> &str {
        &self.0
    }
}
