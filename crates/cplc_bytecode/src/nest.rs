//! Enclosing and nested class resolution.
//!
//! A nest group is the outermost class of a nest together with every class
//! transitively nested in it, as recorded by `InnerClasses` tables.

use crate::classfile::ClassFile;
use crate::error::{ClassParseError, NestError};
use cplc_api::{BytecodeBlob, ClassesProvider, TypeIdentifier};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Immediately enclosing class of `class`, if it is nested.
pub fn outer_of(class: &ClassFile) -> Option<TypeIdentifier> {
    class
        .inner_classes()
        .find(|entry| entry.inner_class == class.this_class && entry.outer_class.is_some())
        .and_then(|entry| entry.outer_class.as_deref())
        .or_else(|| class.enclosing_class())
        .map(TypeIdentifier::from_internal)
}

/// Classes immediately nested in `class`: members naming it as their outer
/// class, and local or anonymous classes named `<this>$<suffix>`.
pub fn direct_nested_of(class: &ClassFile) -> BTreeSet<TypeIdentifier> {
    let local_prefix = format!("{}$", class.this_class);
    class
        .inner_classes()
        .filter(|entry| entry.inner_class != class.this_class)
        .filter(|entry| match &entry.outer_class {
            Some(outer) => *outer == class.this_class,
            None => entry
                .inner_class
                .strip_prefix(&local_prefix)
                .is_some_and(|suffix| !suffix.is_empty() && !suffix.contains('$')),
        })
        .map(|entry| TypeIdentifier::from_internal(&entry.inner_class))
        .collect()
}

pub fn outer_of_blob(blob: &BytecodeBlob) -> Result<Option<TypeIdentifier>, ClassParseError> {
    Ok(outer_of(&ClassFile::parse(blob.bytes())?))
}

pub fn direct_nested_of_blob(blob: &BytecodeBlob) -> Result<BTreeSet<TypeIdentifier>, ClassParseError> {
    Ok(direct_nested_of(&ClassFile::parse(blob.bytes())?))
}

/// The whole nest group `blob` belongs to, outermost class included.
///
/// Ancestors the provider cannot supply are an error; nested members it
/// cannot supply stay in the group but are not expanded.
pub fn full_nest_group<P>(
    blob: &BytecodeBlob,
    provider: &P,
) -> Result<BTreeSet<TypeIdentifier>, NestError>
where
    P: ClassesProvider + ?Sized,
{
    let mut parsed: BTreeMap<TypeIdentifier, ClassFile> = BTreeMap::new();
    let start = parse_blob(blob)?;
    let mut outermost = blob.identifier().clone();
    let mut outer = outer_of(&start);
    parsed.insert(outermost.clone(), start);

    while let Some(ancestor) = outer.take() {
        if parsed.contains_key(&ancestor) {
            break;
        }
        let class = fetch(provider, &ancestor)?.ok_or_else(|| NestError::MissingBytecode {
            identifier: ancestor.clone(),
        })?;
        outer = outer_of(&class);
        parsed.insert(ancestor.clone(), class);
        outermost = ancestor;
    }

    let mut group = BTreeSet::new();
    group.insert(outermost.clone());
    let mut queue = VecDeque::from([outermost]);
    while let Some(current) = queue.pop_front() {
        let class = match parsed.remove(&current) {
            Some(class) => class,
            None => match fetch(provider, &current)? {
                Some(class) => class,
                None => {
                    tracing::debug!(member = %current, "nested class not available, not expanding");
                    continue;
                }
            },
        };
        for nested in direct_nested_of(&class) {
            if group.insert(nested.clone()) {
                queue.push_back(nested);
            }
        }
    }

    Ok(group)
}

fn parse_blob(blob: &BytecodeBlob) -> Result<ClassFile, NestError> {
    ClassFile::parse(blob.bytes()).map_err(|source| NestError::MalformedBytecode {
        identifier: blob.identifier().clone(),
        source,
    })
}

fn fetch<P>(provider: &P, identifier: &TypeIdentifier) -> Result<Option<ClassFile>, NestError>
where
    P: ClassesProvider + ?Sized,
{
    let blobs = provider.get_class(std::slice::from_ref(identifier));
    match blobs.iter().find(|blob| blob.identifier() == identifier) {
        Some(blob) => parse_blob(blob).map(Some),
        None => Ok(None),
    }
}
