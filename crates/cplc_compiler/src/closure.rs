//! Dependency closure over a classes provider.
//!
//! The closure is the set of type names the backend is told exist before it
//! starts resolving symbols. It is built in three phases:
//!
//! 1. nest groups of the sources that already have bytecode,
//! 2. every type referenced by the bytecode of a closure member,
//! 3. the enclosing classes of those references, walked upward.
//!
//! Each phase only adds names. Failures while expanding one dependency are
//! logged and skip that dependency.

use crate::error::CompilerError;
use crate::reporter::Reporter;
use cplc_api::{BytecodeBlob, ClassesProvider, LoggingCategory, SourceUnit, TypeIdentifier};
use cplc_bytecode::{extract_type_names, full_nest_group, nest, ClassFile};
use serde::{Deserialize, Serialize};
use std::collections::{btree_set, BTreeSet};
use std::fmt;

/// Ordered, duplicate-free set of type names.
///
/// Array descriptors and names with path separators (lambda and other
/// synthetic names) are never admitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClosureSet {
    names: BTreeSet<TypeIdentifier>,
}

impl ClosureSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_admissible(name: &TypeIdentifier) -> bool {
        !name.as_str().is_empty() && !name.is_array_descriptor() && !name.has_path_separator()
    }

    /// Adds `name`; returns `true` if it was admissible and new.
    pub fn insert(&mut self, name: TypeIdentifier) -> bool {
        Self::is_admissible(&name) && self.names.insert(name)
    }

    pub fn remove(&mut self, name: &TypeIdentifier) -> bool {
        self.names.remove(name)
    }

    pub fn retain(&mut self, keep: impl FnMut(&TypeIdentifier) -> bool) {
        self.names.retain(keep);
    }

    pub fn contains(&self, name: &TypeIdentifier) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn clear(&mut self) {
        self.names.clear();
    }

    pub fn iter(&self) -> btree_set::Iter<'_, TypeIdentifier> {
        self.names.iter()
    }

    pub fn is_superset(&self, other: &ClosureSet) -> bool {
        self.names.is_superset(&other.names)
    }
}

impl<'a> IntoIterator for &'a ClosureSet {
    type Item = &'a TypeIdentifier;
    type IntoIter = btree_set::Iter<'a, TypeIdentifier>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.iter()
    }
}

impl FromIterator<TypeIdentifier> for ClosureSet {
    fn from_iter<I: IntoIterator<Item = TypeIdentifier>>(iter: I) -> Self {
        let mut set = Self::new();
        for name in iter {
            set.insert(name);
        }
        set
    }
}

/// Tunables of the closure computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClosureOptions {
    /// Names never fetched during the outer-chain phase because the backend
    /// always has them.
    pub always_available: BTreeSet<TypeIdentifier>,
}

impl Default for ClosureOptions {
    fn default() -> Self {
        Self {
            always_available: BTreeSet::from([TypeIdentifier::root_object()]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosurePhase {
    NestGroup,
    DirectReference,
    OuterChain,
}

impl fmt::Display for ClosurePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ClosurePhase::NestGroup => "nested group",
            ClosurePhase::DirectReference => "direct import",
            ClosurePhase::OuterChain => "enclosing class of direct import",
        })
    }
}

/// Drives the three closure phases over one provider.
pub struct ClosureBuilder<'a> {
    provider: &'a dyn ClassesProvider,
    reporter: Reporter<'a>,
    options: &'a ClosureOptions,
    closure: ClosureSet,
    referenced: BTreeSet<TypeIdentifier>,
    sources: Vec<TypeIdentifier>,
    added: [usize; 3],
    skipped: usize,
}

/// Whether compiling `source` writes `name`: the class itself or any class
/// whose binary name extends it with `$`.
fn is_output_of(name: &TypeIdentifier, source: &TypeIdentifier) -> bool {
    name.as_str()
        .strip_prefix(source.as_str())
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('$'))
}

impl<'a> ClosureBuilder<'a> {
    pub fn new(
        provider: &'a dyn ClassesProvider,
        reporter: Reporter<'a>,
        options: &'a ClosureOptions,
    ) -> Self {
        Self {
            provider,
            reporter,
            options,
            closure: ClosureSet::new(),
            referenced: BTreeSet::new(),
            sources: Vec::new(),
            added: [0; 3],
            skipped: 0,
        }
    }

    pub fn closure(&self) -> &ClosureSet {
        &self.closure
    }

    /// Names first discovered by the direct-reference phase.
    pub fn referenced(&self) -> &BTreeSet<TypeIdentifier> {
        &self.referenced
    }

    /// Adds the nest group of every source that already has bytecode.
    pub fn nest_group_phase(&mut self, sources: &[SourceUnit]) {
        for source in sources {
            let identifier = source.identifier().clone();
            if !self.sources.contains(&identifier) {
                self.sources.push(identifier.clone());
            }

            for blob in self.fetch(&identifier) {
                match full_nest_group(&blob, self.provider) {
                    Ok(group) => {
                        for member in group {
                            self.add(member, ClosurePhase::NestGroup);
                        }
                    }
                    Err(error) => self.skip(&identifier, &CompilerError::from(error)),
                }
            }
        }
    }

    /// Adds every type referenced by the bytecode of a current member.
    pub fn direct_reference_phase(&mut self) {
        let members: Vec<TypeIdentifier> = self.closure.iter().cloned().collect();
        if members.is_empty() {
            return;
        }

        for blob in self.provider.get_class(&members) {
            match extract_type_names(blob.bytes()) {
                Ok(names) => {
                    for name in names {
                        if self.add(name.clone(), ClosurePhase::DirectReference) {
                            self.referenced.insert(name);
                        }
                    }
                }
                Err(source) => self.skip(
                    blob.identifier(),
                    &CompilerError::malformed(blob.identifier(), source),
                ),
            }
        }
    }

    /// Walks the enclosing classes of the referenced set upward, largest
    /// name first. Each name is walked at most once.
    pub fn outer_chain_phase(&mut self) {
        let mut pending = self.referenced.clone();
        let mut walked = BTreeSet::new();

        while let Some(name) = pending.pop_last() {
            if !walked.insert(name.clone()) {
                continue;
            }
            if self.options.always_available.contains(&name) {
                continue;
            }

            for blob in self.fetch(&name) {
                match ClassFile::parse(blob.bytes()) {
                    Ok(class) => {
                        if let Some(outer) = nest::outer_of(&class) {
                            self.add(outer.clone(), ClosurePhase::OuterChain);
                            pending.insert(outer);
                        }
                    }
                    Err(source) => self.skip(&name, &CompilerError::malformed(&name, source)),
                }
            }
        }
    }

    /// Removes the sources' own outputs (each source and the classes nested
    /// in it) and reports the totals.
    pub fn finish(mut self) -> ClosureSet {
        let sources = &self.sources;
        self.closure
            .retain(|name| !sources.iter().any(|source| is_output_of(name, source)));

        let [nested, direct, outer] = self.added;
        tracing::debug!(
            total = self.closure.len(),
            nested,
            direct,
            outer,
            skipped = self.skipped,
            "dependency closure computed"
        );
        self.reporter.report(
            LoggingCategory::BytecodeExtractionSummary,
            format_args!(
                "Found {} type names in the bytecode ({nested} from nested groups, {direct} direct imports, {outer} enclosing classes, {} skipped)",
                self.closure.len(),
                self.skipped
            ),
        );
        if self.reporter.enabled(LoggingCategory::AvailableTypeNames) {
            let names: Vec<&str> = self.closure.iter().map(TypeIdentifier::as_str).collect();
            self.reporter.report(
                LoggingCategory::AvailableTypeNames,
                format_args!("Type names found in the bytecode: {names:?}"),
            );
        }
        self.closure
    }

    fn fetch(&self, identifier: &TypeIdentifier) -> Vec<BytecodeBlob> {
        self.provider
            .get_class(std::slice::from_ref(identifier))
            .into_iter()
            .filter(|blob| blob.identifier() == identifier)
            .collect()
    }

    fn add(&mut self, name: TypeIdentifier, phase: ClosurePhase) -> bool {
        let description = self
            .reporter
            .enabled(LoggingCategory::BytecodeExtractionDetailed)
            .then(|| name.to_string());
        if !self.closure.insert(name) {
            return false;
        }
        let slot = match phase {
            ClosurePhase::NestGroup => 0,
            ClosurePhase::DirectReference => 1,
            ClosurePhase::OuterChain => 2,
        };
        self.added[slot] += 1;
        if let Some(name) = description {
            self.reporter.report(
                LoggingCategory::BytecodeExtractionDetailed,
                format_args!("Adding class to classpath listing ({phase}): {name}"),
            );
        }
        true
    }

    fn skip(&mut self, dependency: &TypeIdentifier, error: &CompilerError) {
        self.skipped += 1;
        tracing::warn!(dependency = %dependency, error = %error, "skipping dependency");
        self.reporter.report(
            LoggingCategory::BytecodeExtractionDetailed,
            format_args!("Skipping dependency {dependency}: {error}"),
        );
    }
}

/// Runs all three phases and returns the finished closure.
pub fn compute_closure(
    sources: &[SourceUnit],
    provider: &dyn ClassesProvider,
    reporter: Reporter<'_>,
    options: &ClosureOptions,
) -> ClosureSet {
    let mut builder = ClosureBuilder::new(provider, reporter, options);
    builder.nest_group_phase(sources);
    builder.direct_reference_phase();
    builder.outer_chain_phase();
    builder.finish()
}
