use crate::closure::ClosureOptions;
use crate::compiler::ClasspathlessCompiler;
use cplc_api::{ConfigurationOptions, OptionsError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {source}")]
    Parse {
        path: Option<PathBuf>,
        #[source]
        source: toml::de::Error,
    },
    #[error(transparent)]
    Options(#[from] OptionsError),
}

/// Compiler configuration as written in a TOML file.
///
/// ```toml
/// use_host_system_types = false
/// backend_flags = ["-g", "--patch-module", "java.base=java.lang"]
///
/// [module_patch_map]
/// "com.example" = "example.module"
///
/// [logging]
/// categories = ["info", "compiler-diagnostics"]
///
/// [closure]
/// always_available = ["java.lang.Object"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerConfig {
    #[serde(flatten)]
    pub options: ConfigurationOptions,
    #[serde(default)]
    pub closure: ClosureOptions,
}

impl CompilerConfig {
    /// Parses `text`; `--patch-module` flags are moved into the patch map.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(text).map_err(|source| ConfigError::Parse { path: None, source })?;
        config.normalized()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: Some(path.to_path_buf()),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded compiler configuration");
        config.normalized()
    }

    pub fn into_compiler(self) -> ClasspathlessCompiler {
        ClasspathlessCompiler::new(self.options).with_closure_options(self.closure)
    }

    fn normalized(mut self) -> Result<Self, ConfigError> {
        self.options = self.options.normalized()?;
        Ok(self)
    }
}
