use crate::messages::LoggingCategory;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

const PATCH_MODULE_FLAG: &str = "--patch-module";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionsError {
    #[error("`--patch-module` requires a value of the form <module>=<package>[:<package>...]")]
    PatchModuleMissingValue,
    #[error("malformed `--patch-module` value: {value}")]
    PatchModuleMalformed { value: String },
}

/// Options fixed for the lifetime of one compiler instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigurationOptions {
    /// Serve the host's own standard library types instead of asking the
    /// provider for them.
    pub use_host_system_types: bool,
    /// Keep the host's root object type even when host system types are
    /// disabled. Mixing two representations of the root type crashes some
    /// backends.
    pub use_host_root_object_type: bool,
    /// Flags handed to the backend verbatim.
    pub backend_flags: Vec<String>,
    /// Package name to module name.
    pub module_patch_map: BTreeMap<String, String>,
    pub logging: LogSettings,
}

impl Default for ConfigurationOptions {
    fn default() -> Self {
        Self {
            use_host_system_types: true,
            use_host_root_object_type: true,
            backend_flags: Vec::new(),
            module_patch_map: BTreeMap::new(),
            logging: LogSettings::default(),
        }
    }
}

impl ConfigurationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn use_host_system_types(mut self, value: bool) -> Self {
        self.use_host_system_types = value;
        self
    }

    pub fn use_host_root_object_type(mut self, value: bool) -> Self {
        self.use_host_root_object_type = value;
        self
    }

    pub fn with_logging(mut self, logging: LogSettings) -> Self {
        self.logging = logging;
        self
    }

    /// Sets the backend flags.
    ///
    /// `--patch-module <module>=<pkg>[:<pkg>...]` pairs are not passed on:
    /// they replace the module patch map, one entry per listed package.
    pub fn with_backend_flags<I, S>(mut self, flags: I) -> Result<Self, OptionsError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut backend_flags = Vec::new();
        let mut flags = flags.into_iter().map(Into::into);
        while let Some(flag) = flags.next() {
            if flag == PATCH_MODULE_FLAG {
                let value = flags.next().ok_or(OptionsError::PatchModuleMissingValue)?;
                self.module_patch_map = parse_patch_module(&value)?;
            } else if let Some(value) = flag.strip_prefix("--patch-module=") {
                self.module_patch_map = parse_patch_module(value)?;
            } else {
                backend_flags.push(flag);
            }
        }
        self.backend_flags = backend_flags;
        Ok(self)
    }

    /// Re-applies flag normalisation, used after deserialising options that
    /// may still carry `--patch-module` inside `backend_flags`.
    pub fn normalized(self) -> Result<Self, OptionsError> {
        let flags = self.backend_flags.clone();
        let patched = self.module_patch_map.clone();
        let mut options = self.with_backend_flags(flags)?;
        for (package, module) in patched {
            options.module_patch_map.entry(package).or_insert(module);
        }
        Ok(options)
    }

    pub fn module_for_package(&self, package: &str) -> Option<&str> {
        self.module_patch_map.get(package).map(String::as_str)
    }
}

fn parse_patch_module(value: &str) -> Result<BTreeMap<String, String>, OptionsError> {
    let malformed = || OptionsError::PatchModuleMalformed {
        value: value.to_string(),
    };
    let (module, packages) = value.split_once('=').ok_or_else(malformed)?;
    let module = module.trim();
    if module.is_empty() {
        return Err(malformed());
    }

    let mut map = BTreeMap::new();
    for package in packages.split(':').map(str::trim) {
        if package.is_empty() {
            return Err(malformed());
        }
        map.insert(package.to_string(), module.to_string());
    }
    Ok(map)
}

/// Which messages reach the listener, passed in at construction instead of
/// being read from process-wide state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub categories: BTreeSet<LoggingCategory>,
    /// Emit a trace record for every call the backend makes into the view.
    pub tracing: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            categories: LoggingCategory::defaults().into_iter().collect(),
            tracing: false,
        }
    }
}

impl LogSettings {
    pub fn silent() -> Self {
        Self {
            categories: BTreeSet::new(),
            tracing: false,
        }
    }

    pub fn verbose() -> Self {
        Self {
            categories: LoggingCategory::ALL.into_iter().collect(),
            tracing: true,
        }
    }

    pub fn enables(&self, category: LoggingCategory) -> bool {
        self.categories.contains(&category)
    }
}
