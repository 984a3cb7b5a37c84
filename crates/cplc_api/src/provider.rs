use crate::bytecode::BytecodeBlob;
use crate::identifier::TypeIdentifier;
use std::collections::BTreeMap;

/// Supplies class bytes on demand in place of a classpath.
pub trait ClassesProvider {
    /// Returns the bytecode of every requested name the provider knows.
    /// Unknown names are simply absent from the result.
    fn get_class(&self, names: &[TypeIdentifier]) -> Vec<BytecodeBlob>;

    /// Flat listing of every type name visible to the provider. May contain
    /// array descriptors and synthetic names with path separators.
    fn class_path_listing(&self) -> Vec<String>;
}

impl<P: ClassesProvider + ?Sized> ClassesProvider for &P {
    fn get_class(&self, names: &[TypeIdentifier]) -> Vec<BytecodeBlob> {
        (**self).get_class(names)
    }

    fn class_path_listing(&self) -> Vec<String> {
        (**self).class_path_listing()
    }
}

/// Provider backed by an ordered in-memory map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryClassesProvider {
    classes: BTreeMap<TypeIdentifier, BytecodeBlob>,
    extra_listing: Vec<String>,
}

impl InMemoryClassesProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_blobs<I>(blobs: I) -> Self
    where
        I: IntoIterator<Item = BytecodeBlob>,
    {
        let mut provider = Self::new();
        for blob in blobs {
            provider.insert(blob);
        }
        provider
    }

    pub fn insert(&mut self, blob: BytecodeBlob) -> Option<BytecodeBlob> {
        self.classes.insert(blob.identifier().clone(), blob)
    }

    /// Adds a raw entry to the flat listing without any bytecode behind it.
    pub fn add_listing_entry(&mut self, name: impl Into<String>) {
        self.extra_listing.push(name.into());
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl ClassesProvider for InMemoryClassesProvider {
    fn get_class(&self, names: &[TypeIdentifier]) -> Vec<BytecodeBlob> {
        names
            .iter()
            .filter_map(|name| self.classes.get(name))
            .cloned()
            .collect()
    }

    fn class_path_listing(&self) -> Vec<String> {
        self.classes
            .keys()
            .map(|name| name.as_str().to_string())
            .chain(self.extra_listing.iter().cloned())
            .collect()
    }
}
