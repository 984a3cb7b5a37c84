//! Contract between the driver and the compiler backend.

use crate::classpath::ClasspathView;
use crate::content::ContentCell;
use crate::error::CompilerError;
use crate::reporter::Reporter;
use cplc_api::{
    BytecodeBlob, ClassesProvider, CompilationIssue, LoggingCategory, Severity, SourceUnit,
    TypeIdentifier,
};
use std::fmt;

/// One diagnostic reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Compilation unit the diagnostic belongs to, if any.
    pub unit: Option<TypeIdentifier>,
    pub line: u64,
    pub column: u64,
    pub code: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        unit: Option<TypeIdentifier>,
        line: u64,
        column: u64,
        code: Option<&str>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            unit,
            line,
            column,
            code: code.map(str::to_string),
            message: message.into(),
        }
    }

    pub fn severity(&self) -> Severity {
        Severity::from_code(self.code.as_deref())
    }

    pub fn category(&self) -> LoggingCategory {
        match self.severity() {
            Severity::Error => LoggingCategory::CompilerDiagnostics,
            Severity::Warning => LoggingCategory::CompilerDiagnosticsWarning,
            Severity::Note => LoggingCategory::CompilerDiagnosticsNote,
        }
    }

    /// Diagnostics without a unit cannot be fed back to the postprocessor.
    pub fn to_issue(&self) -> Option<CompilationIssue> {
        self.unit.as_ref().map(|unit| {
            CompilationIssue::new(
                unit.clone(),
                self.line,
                self.column,
                self.code.clone(),
                self.message.clone(),
            )
        })
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Compiler diagnostic at ")?;
        if let Some(unit) = &self.unit {
            write!(f, "({unit}) ")?;
        }
        write!(
            f,
            "[{}, {}]: {} (code: {})",
            self.line,
            self.column,
            self.message,
            self.code.as_deref().unwrap_or("none")
        )
    }
}

/// Result of one backend invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendOutcome {
    pub success: bool,
    pub diagnostics: Vec<Diagnostic>,
}

impl BackendOutcome {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            diagnostics: Vec::new(),
        }
    }

    pub fn failed(diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            success: false,
            diagnostics,
        }
    }

    pub fn with_diagnostic(mut self, diagnostic: Diagnostic) -> Self {
        self.diagnostics.push(diagnostic);
        self
    }
}

/// What the backend is asked to compile.
#[derive(Debug, Clone, Copy)]
pub struct BackendRequest<'r> {
    pub sources: &'r [SourceUnit],
    pub flags: &'r [String],
    pub classpath: &'r ClasspathView<'r>,
}

/// Services offered to the backend during one attempt.
pub struct BackendContext<'p> {
    provider: &'p dyn ClassesProvider,
    reporter: Reporter<'p>,
    outputs: Vec<ContentCell<'static>>,
}

impl<'p> BackendContext<'p> {
    pub fn new(provider: &'p dyn ClassesProvider, reporter: Reporter<'p>) -> Self {
        Self {
            provider,
            reporter,
            outputs: Vec::new(),
        }
    }

    /// A cell that fetches `identifier` from the provider when first read.
    pub fn open_input(&self, identifier: &TypeIdentifier) -> ContentCell<'p> {
        self.reporter
            .trace_call("open_input", format_args!("{identifier}"));
        ContentCell::lazy(identifier.clone(), self.provider, self.reporter)
    }

    /// A fresh output cell for the class `identifier`.
    pub fn create_output(&mut self, identifier: TypeIdentifier) -> &mut ContentCell<'static> {
        self.reporter
            .trace_call("create_output", format_args!("{identifier}"));
        let index = self.outputs.len();
        self.outputs.push(ContentCell::output(identifier));
        &mut self.outputs[index]
    }

    /// Reports a failure internal to the backend. Blank lines are dropped.
    pub fn report_critical(&self, message: &str) {
        let message = message.trim_end_matches(['\r', '\n']);
        if message.trim().is_empty() {
            return;
        }
        tracing::error!(detail = message, "compiler backend reported a critical failure");
        self.reporter.report(LoggingCategory::CompilerCritical, message);
    }

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    pub(crate) fn into_outputs(self) -> Result<Vec<BytecodeBlob>, CompilerError> {
        self.outputs.into_iter().map(ContentCell::into_blob).collect()
    }
}

impl fmt::Debug for BackendContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendContext")
            .field("outputs", &self.outputs)
            .finish_non_exhaustive()
    }
}

/// A compiler that turns sources into class files against a virtual
/// classpath.
pub trait CompilerBackend {
    fn compile(
        &mut self,
        request: BackendRequest<'_>,
        context: &mut BackendContext<'_>,
    ) -> Result<BackendOutcome, CompilerError>;
}

impl<B: CompilerBackend + ?Sized> CompilerBackend for &mut B {
    fn compile(
        &mut self,
        request: BackendRequest<'_>,
        context: &mut BackendContext<'_>,
    ) -> Result<BackendOutcome, CompilerError> {
        (**self).compile(request, context)
    }
}
