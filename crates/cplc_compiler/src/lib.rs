//! Classpathless compilation driver.
//!
//! [`ClasspathlessCompiler::compile`] computes the dependency closure of the
//! sources over a [`ClassesProvider`](cplc_api::ClassesProvider), exposes it
//! to a [`CompilerBackend`] through a [`ClasspathView`], and retries with
//! postprocessed sources until the backend succeeds or nothing changes.

mod backend;
mod classpath;
mod closure;
mod compiler;
mod config;
mod content;
mod error;
mod reporter;
mod retry;

pub use backend::{BackendContext, BackendOutcome, BackendRequest, CompilerBackend, Diagnostic};
pub use classpath::{
    in_package, ClasspathEntry, ClasspathView, HostTypeIndex, Location, NoHostTypes, Origin,
    StaticHostTypes, BASE_MODULE,
};
pub use closure::{compute_closure, ClosureBuilder, ClosureOptions, ClosurePhase, ClosureSet};
pub use compiler::ClasspathlessCompiler;
pub use config::{CompilerConfig, ConfigError};
pub use content::ContentCell;
pub use error::CompilerError;
pub use reporter::Reporter;
pub use retry::{postprocess_sources, AttemptResult, RetryState};

#[cfg(test)]
mod tests;
