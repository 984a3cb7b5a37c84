use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Category attached to every message sent to a [`MessagesListener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoggingCategory {
    /// Generic progress messages ("starting compilation", results).
    Info,
    /// Per-name progress of the bytecode extraction phases.
    BytecodeExtractionDetailed,
    /// Totals found during bytecode extraction.
    BytecodeExtractionSummary,
    /// Array and synthetic entries dropped from the classpath listing.
    IgnoringNonTypes,
    /// Every type name made available to the backend.
    AvailableTypeNames,
    /// One message per class exposed to the backend from the listing.
    ExposingClassFromProvider,
    /// One message per class hidden because it belongs to a subpackage.
    SkippingSubpackage,
    /// Host objects that do not look like class files.
    SkippingNonClassObject,
    /// Bytecode requested by the backend and served by the provider.
    LoadingBytecode,
    /// Internal failures of the backend itself.
    CompilerCritical,
    CompilerDiagnostics,
    CompilerDiagnosticsWarning,
    CompilerDiagnosticsNote,
}

impl LoggingCategory {
    pub const ALL: [LoggingCategory; 13] = [
        LoggingCategory::Info,
        LoggingCategory::BytecodeExtractionDetailed,
        LoggingCategory::BytecodeExtractionSummary,
        LoggingCategory::IgnoringNonTypes,
        LoggingCategory::AvailableTypeNames,
        LoggingCategory::ExposingClassFromProvider,
        LoggingCategory::SkippingSubpackage,
        LoggingCategory::SkippingNonClassObject,
        LoggingCategory::LoadingBytecode,
        LoggingCategory::CompilerCritical,
        LoggingCategory::CompilerDiagnostics,
        LoggingCategory::CompilerDiagnosticsWarning,
        LoggingCategory::CompilerDiagnosticsNote,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            LoggingCategory::Info => "info",
            LoggingCategory::BytecodeExtractionDetailed => "bytecode-extraction-detailed",
            LoggingCategory::BytecodeExtractionSummary => "bytecode-extraction-summary",
            LoggingCategory::IgnoringNonTypes => "ignoring-non-types",
            LoggingCategory::AvailableTypeNames => "available-type-names",
            LoggingCategory::ExposingClassFromProvider => "exposing-class-from-provider",
            LoggingCategory::SkippingSubpackage => "skipping-subpackage",
            LoggingCategory::SkippingNonClassObject => "skipping-non-class-object",
            LoggingCategory::LoadingBytecode => "loading-bytecode",
            LoggingCategory::CompilerCritical => "compiler-critical",
            LoggingCategory::CompilerDiagnostics => "compiler-diagnostics",
            LoggingCategory::CompilerDiagnosticsWarning => "compiler-diagnostics-warning",
            LoggingCategory::CompilerDiagnosticsNote => "compiler-diagnostics-note",
        }
    }

    /// Categories enabled when nothing is configured: the ones a user
    /// normally wants to see without tracing through the resolver.
    pub fn defaults() -> Vec<LoggingCategory> {
        vec![
            LoggingCategory::Info,
            LoggingCategory::BytecodeExtractionSummary,
            LoggingCategory::CompilerCritical,
            LoggingCategory::CompilerDiagnostics,
            LoggingCategory::CompilerDiagnosticsWarning,
            LoggingCategory::CompilerDiagnosticsNote,
        ]
    }

    /// Categories producing one message per name or per call.
    pub fn is_verbose(self) -> bool {
        matches!(
            self,
            LoggingCategory::BytecodeExtractionDetailed
                | LoggingCategory::IgnoringNonTypes
                | LoggingCategory::AvailableTypeNames
                | LoggingCategory::ExposingClassFromProvider
                | LoggingCategory::SkippingSubpackage
                | LoggingCategory::SkippingNonClassObject
                | LoggingCategory::LoadingBytecode
        )
    }
}

impl fmt::Display for LoggingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown logging category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for LoggingCategory {
    type Err = UnknownCategory;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('_', "-");
        LoggingCategory::ALL
            .iter()
            .copied()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| UnknownCategory(value.to_string()))
    }
}

/// Sink for progress and diagnostic messages.
///
/// Implementations must be cheap: the resolver may emit one message per
/// type name when verbose categories are enabled.
pub trait MessagesListener {
    fn add_message(&self, category: LoggingCategory, message: &str);
}

impl<L: MessagesListener + ?Sized> MessagesListener for &L {
    fn add_message(&self, category: LoggingCategory, message: &str) {
        (**self).add_message(category, message)
    }
}

impl<L: MessagesListener + ?Sized> MessagesListener for Arc<L> {
    fn add_message(&self, category: LoggingCategory, message: &str) {
        (**self).add_message(category, message)
    }
}

/// Discards every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMessagesListener;

impl MessagesListener for NullMessagesListener {
    fn add_message(&self, _category: LoggingCategory, _message: &str) {}
}

/// Forwards messages to `tracing`, choosing the level from the category.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMessagesListener;

impl MessagesListener for TracingMessagesListener {
    fn add_message(&self, category: LoggingCategory, message: &str) {
        match category {
            LoggingCategory::CompilerCritical | LoggingCategory::CompilerDiagnostics => {
                tracing::error!(category = %category, "{message}");
            }
            LoggingCategory::CompilerDiagnosticsWarning => {
                tracing::warn!(category = %category, "{message}");
            }
            LoggingCategory::Info
            | LoggingCategory::BytecodeExtractionSummary
            | LoggingCategory::CompilerDiagnosticsNote => {
                tracing::info!(category = %category, "{message}");
            }
            _ => tracing::debug!(category = %category, "{message}"),
        }
    }
}

/// Keeps every message in memory.
#[derive(Debug, Default)]
pub struct RecordingMessagesListener {
    messages: Mutex<Vec<(LoggingCategory, String)>>,
}

impl RecordingMessagesListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<(LoggingCategory, String)> {
        match self.messages.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn messages_in(&self, category: LoggingCategory) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|(recorded, _)| *recorded == category)
            .map(|(_, message)| message)
            .collect()
    }
}

impl MessagesListener for RecordingMessagesListener {
    fn add_message(&self, category: LoggingCategory, message: &str) {
        let mut guard = match self.messages.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push((category, message.to_string()));
    }
}
