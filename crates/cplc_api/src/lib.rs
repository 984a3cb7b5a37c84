//! Value types and collaborator contracts shared by the classpathless
//! compiler crates.
//!
//! The compiler never reads a classpath from disk. Everything it knows about
//! the outside world comes through the traits defined here: a
//! [`ClassesProvider`] supplies class bytes, a [`MessagesListener`] receives
//! progress and diagnostics, and a [`SourcePostprocessor`] may rewrite
//! sources that failed to compile.

mod bytecode;
mod identifier;
mod issue;
mod messages;
mod options;
mod postprocess;
mod provider;

pub use bytecode::{BytecodeBlob, SourceUnit};
pub use identifier::TypeIdentifier;
pub use issue::{group_by_unit, CompilationIssue, IssuesByUnit, Severity};
pub use messages::{
    LoggingCategory, MessagesListener, NullMessagesListener, RecordingMessagesListener,
    TracingMessagesListener, UnknownCategory,
};
pub use options::{ConfigurationOptions, LogSettings, OptionsError};
pub use postprocess::{NullPostprocessor, PostprocessOutcome, SourcePostprocessor};
pub use provider::{ClassesProvider, InMemoryClassesProvider};

#[cfg(test)]
mod tests;
