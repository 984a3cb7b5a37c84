//! The virtual classpath served to the backend.

use crate::closure::ClosureSet;
use crate::content::ContentCell;
use crate::reporter::Reporter;
use cplc_api::{ConfigurationOptions, LoggingCategory, TypeIdentifier};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Bound;

/// Module holding `java.lang`, the only system module exposed when host
/// system types are disabled.
pub const BASE_MODULE: &str = "java.base";

/// Where the backend is looking for types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    ClassPath,
    /// Host system classes of pre-module platforms.
    HostPlatformClassPath,
    /// Host system modules.
    HostSystemModules,
}

/// Who supplies the bytes of a listed type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Origin {
    Provider,
    Host,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClasspathEntry {
    pub identifier: TypeIdentifier,
    pub origin: Origin,
}

impl fmt::Display for ClasspathEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.origin {
            Origin::Provider => write!(f, "{}", self.identifier),
            Origin::Host => write!(f, "{} (host)", self.identifier),
        }
    }
}

/// The host's own system types.
pub trait HostTypeIndex {
    fn list(&self, package: &str, recursive: bool) -> Vec<TypeIdentifier>;
    fn modules(&self) -> Vec<String>;

    /// Non-class objects stored in `package`, such as data files inside
    /// system modules. They are never served to the backend.
    fn resources(&self, _package: &str, _recursive: bool) -> Vec<String> {
        Vec::new()
    }
}

/// A host without any system types of its own.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHostTypes;

impl HostTypeIndex for NoHostTypes {
    fn list(&self, _package: &str, _recursive: bool) -> Vec<TypeIdentifier> {
        Vec::new()
    }

    fn modules(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Host index over a fixed list of names, all in [`BASE_MODULE`].
#[derive(Debug, Default, Clone)]
pub struct StaticHostTypes {
    names: Vec<TypeIdentifier>,
    resources: Vec<String>,
}

impl StaticHostTypes {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TypeIdentifier>,
    {
        let mut names: Vec<TypeIdentifier> = names.into_iter().map(Into::into).collect();
        names.sort();
        names.dedup();
        Self {
            names,
            resources: Vec::new(),
        }
    }

    /// Adds dotted resource paths (`pkg.name.ext`) listed alongside the types.
    pub fn with_resources<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resources.extend(resources.into_iter().map(Into::into));
        self.resources.sort();
        self
    }
}

impl HostTypeIndex for StaticHostTypes {
    fn list(&self, package: &str, recursive: bool) -> Vec<TypeIdentifier> {
        self.names
            .iter()
            .filter(|name| in_package(name.as_str(), package, recursive))
            .cloned()
            .collect()
    }

    fn modules(&self) -> Vec<String> {
        vec![BASE_MODULE.to_string()]
    }

    fn resources(&self, package: &str, recursive: bool) -> Vec<String> {
        self.resources
            .iter()
            .filter(|resource| {
                resource
                    .rsplit_once('.')
                    .is_some_and(|(stem, _)| in_package(stem, package, recursive))
            })
            .cloned()
            .collect()
    }
}

/// Whether `name` lies in `package` (directly, or anywhere below it when
/// `recursive`).
pub fn in_package(name: &str, package: &str, recursive: bool) -> bool {
    if package.is_empty() {
        return recursive || !name.contains('.');
    }
    match name
        .strip_prefix(package)
        .and_then(|rest| rest.strip_prefix('.'))
    {
        Some(rest) => !rest.is_empty() && (recursive || !rest.contains('.')),
        None => false,
    }
}

/// Closure set plus provider listing, indexed by name.
pub struct ClasspathView<'a> {
    entries: RefCell<BTreeMap<TypeIdentifier, Origin>>,
    host: &'a dyn HostTypeIndex,
    options: &'a ConfigurationOptions,
    reporter: Reporter<'a>,
}

impl<'a> ClasspathView<'a> {
    /// `listing` is the provider's flat listing; array descriptors and names
    /// with path separators in it are dropped.
    pub fn new(
        closure: &ClosureSet,
        listing: Vec<String>,
        host: &'a dyn HostTypeIndex,
        options: &'a ConfigurationOptions,
        reporter: Reporter<'a>,
    ) -> Self {
        let mut entries: BTreeMap<TypeIdentifier, Origin> = closure
            .iter()
            .map(|name| (name.clone(), Origin::Provider))
            .collect();

        for name in listing {
            let identifier = TypeIdentifier::new(name);
            if identifier.is_array_descriptor() {
                reporter.report(
                    LoggingCategory::IgnoringNonTypes,
                    format_args!("Ignoring array type from classpath listing: {identifier}"),
                );
            } else if identifier.has_path_separator() {
                reporter.report(
                    LoggingCategory::IgnoringNonTypes,
                    format_args!("Ignoring lambda type from classpath listing: {identifier}"),
                );
            } else if !identifier.as_str().is_empty() {
                entries.entry(identifier).or_insert(Origin::Provider);
            }
        }

        if reporter.enabled(LoggingCategory::AvailableTypeNames) {
            let names: Vec<&str> = entries.keys().map(TypeIdentifier::as_str).collect();
            reporter.report(
                LoggingCategory::AvailableTypeNames,
                format_args!("All available type names: {names:?}"),
            );
        }
        tracing::debug!(entries = entries.len(), "classpath view ready");

        Self {
            entries: RefCell::new(entries),
            host,
            options,
            reporter,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn contains(&self, identifier: &TypeIdentifier) -> bool {
        self.entries.borrow().contains_key(identifier)
    }

    pub fn origin_of(&self, identifier: &TypeIdentifier) -> Option<Origin> {
        self.entries.borrow().get(identifier).copied()
    }

    /// Names in `package` (and its subpackages when `recursive`), ordered by
    /// name.
    pub fn list(&self, package: &str, recursive: bool) -> Vec<TypeIdentifier> {
        self.reporter
            .trace_call("list", format_args!("package={package:?} recursive={recursive}"));
        self.select(package, recursive)
            .into_iter()
            .map(|entry| entry.identifier)
            .collect()
    }

    /// Lists `package` under a backend location, substituting host system
    /// types according to the configuration.
    pub fn list_location(
        &self,
        location: Location,
        package: &str,
        recursive: bool,
    ) -> Vec<ClasspathEntry> {
        self.reporter.trace_call(
            "list_location",
            format_args!("location={location:?} package={package:?} recursive={recursive}"),
        );

        if self.options.use_host_system_types {
            return match location {
                Location::ClassPath => self.select(package, recursive),
                Location::HostPlatformClassPath | Location::HostSystemModules => self
                    .host_types(package, recursive)
                    .into_iter()
                    .map(|identifier| ClasspathEntry {
                        identifier,
                        origin: Origin::Host,
                    })
                    .collect(),
            };
        }

        match location {
            Location::ClassPath => self.select(package, recursive),
            Location::HostPlatformClassPath => {
                // Absorbed now, listed when the backend asks under ClassPath.
                let host_names = self.host_types(package, recursive);
                let mut entries = self.entries.borrow_mut();
                for identifier in host_names {
                    let origin = self.host_origin(&identifier);
                    entries.insert(identifier, origin);
                }
                Vec::new()
            }
            Location::HostSystemModules => {
                let mut merged: BTreeMap<TypeIdentifier, Origin> = self
                    .select(package, recursive)
                    .into_iter()
                    .map(|entry| (entry.identifier, entry.origin))
                    .collect();
                for identifier in self.host_types(package, recursive) {
                    let origin = self.host_origin(&identifier);
                    merged.entry(identifier).or_insert(origin);
                }
                merged
                    .into_iter()
                    .map(|(identifier, origin)| ClasspathEntry { identifier, origin })
                    .collect()
            }
        }
    }

    /// System modules visible to the backend.
    pub fn system_module_locations(&self) -> Vec<String> {
        let modules = self.host.modules();
        if self.options.use_host_system_types {
            return modules;
        }
        modules
            .into_iter()
            .filter(|module| module == BASE_MODULE)
            .collect()
    }

    pub fn module_for_package(&self, package: &str) -> Option<&str> {
        self.options.module_for_package(package)
    }

    /// Patched packages grouped by module.
    pub fn patch_module_locations(&self) -> BTreeMap<String, Vec<String>> {
        let mut locations: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (package, module) in &self.options.module_patch_map {
            locations
                .entry(module.clone())
                .or_default()
                .push(package.clone());
        }
        locations
    }

    pub fn infer_binary_name(&self, cell: &ContentCell<'_>) -> TypeIdentifier {
        self.reporter
            .trace_call("infer_binary_name", format_args!("{}", cell.identifier()));
        cell.identifier().clone()
    }

    fn host_types(&self, package: &str, recursive: bool) -> Vec<TypeIdentifier> {
        for resource in self.host.resources(package, recursive) {
            self.reporter.report(
                LoggingCategory::SkippingNonClassObject,
                format_args!("Skipping non-class object: \"{resource}\""),
            );
        }
        self.host.list(package, recursive)
    }

    fn host_origin(&self, identifier: &TypeIdentifier) -> Origin {
        if identifier.is_root_object() && self.options.use_host_root_object_type {
            Origin::Host
        } else {
            Origin::Provider
        }
    }

    /// Range scan from `<package>.` that stops at the first name outside the
    /// prefix.
    fn select(&self, package: &str, recursive: bool) -> Vec<ClasspathEntry> {
        let entries = self.entries.borrow();
        let mut selected = Vec::new();

        if package.is_empty() {
            for (identifier, origin) in entries.iter() {
                if !recursive && identifier.as_str().contains('.') {
                    self.reporter.report(
                        LoggingCategory::SkippingSubpackage,
                        format_args!("Skipping over class from a package: \"{identifier}\""),
                    );
                    continue;
                }
                self.expose(identifier, *origin, &mut selected);
            }
            return selected;
        }

        let prefix = format!("{package}.");
        let range = entries.range::<str, _>((Bound::Included(prefix.as_str()), Bound::Unbounded));
        for (identifier, origin) in range {
            let Some(rest) = identifier.as_str().strip_prefix(prefix.as_str()) else {
                break;
            };
            if !recursive && rest.contains('.') {
                self.reporter.report(
                    LoggingCategory::SkippingSubpackage,
                    format_args!("Skipping over class from a subpackage: \"{identifier}\""),
                );
                continue;
            }
            self.expose(identifier, *origin, &mut selected);
        }
        selected
    }

    fn expose(&self, identifier: &TypeIdentifier, origin: Origin, selected: &mut Vec<ClasspathEntry>) {
        self.reporter.report(
            LoggingCategory::ExposingClassFromProvider,
            format_args!("Exposing class to the compiler: \"{identifier}\""),
        );
        selected.push(ClasspathEntry {
            identifier: identifier.clone(),
            origin,
        });
    }
}

impl fmt::Debug for ClasspathView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClasspathView")
            .field("entries", &self.entries.borrow().len())
            .field("use_host_system_types", &self.options.use_host_system_types)
            .finish_non_exhaustive()
    }
}
