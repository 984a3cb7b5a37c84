use crate::identifier::TypeIdentifier;
use std::sync::Arc;

/// Binary content of one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BytecodeBlob {
    identifier: TypeIdentifier,
    bytes: Arc<[u8]>,
}

impl BytecodeBlob {
    pub fn new(identifier: impl Into<TypeIdentifier>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            identifier: identifier.into(),
            bytes: bytes.into(),
        }
    }

    pub fn identifier(&self) -> &TypeIdentifier {
        &self.identifier
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Shared handle to the bytes, cloning it never copies the content.
    pub fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }
}

/// Source text of one compilation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    identifier: TypeIdentifier,
    source: String,
}

impl SourceUnit {
    pub fn new(identifier: impl Into<TypeIdentifier>, source: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            source: source.into(),
        }
    }

    pub fn identifier(&self) -> &TypeIdentifier {
        &self.identifier
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn replace_source(&mut self, source: impl Into<String>) {
        self.source = source.into();
    }

    /// Relative file name a compiler expects for this unit, e.g. `a/b/Hello.java`.
    pub fn file_name(&self) -> String {
        format!("{}.java", self.identifier.to_internal())
    }
}
