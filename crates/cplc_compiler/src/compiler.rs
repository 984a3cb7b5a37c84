use crate::backend::{BackendContext, BackendRequest, CompilerBackend, Diagnostic};
use crate::classpath::{ClasspathView, HostTypeIndex, NoHostTypes};
use crate::closure::{ClosureBuilder, ClosureOptions, ClosureSet};
use crate::error::CompilerError;
use crate::reporter::Reporter;
use crate::retry::{postprocess_sources, AttemptResult, RetryState};
use cplc_api::{
    group_by_unit, BytecodeBlob, ClassesProvider, CompilationIssue, ConfigurationOptions,
    LoggingCategory, MessagesListener, NullMessagesListener, NullPostprocessor,
    SourcePostprocessor, SourceUnit,
};

/// Compiles sources against a classes provider instead of a classpath.
///
/// An instance may be reused for any number of sequential compilations; all
/// per-call state is dropped when [`compile`](Self::compile) returns.
pub struct ClasspathlessCompiler {
    options: ConfigurationOptions,
    closure_options: ClosureOptions,
    listener: Box<dyn MessagesListener>,
    postprocessor: Box<dyn SourcePostprocessor>,
    host: Box<dyn HostTypeIndex>,
    closure: ClosureSet,
    sources: Vec<SourceUnit>,
    last_attempts: usize,
}

impl ClasspathlessCompiler {
    pub fn new(options: ConfigurationOptions) -> Self {
        Self {
            options,
            closure_options: ClosureOptions::default(),
            listener: Box::new(NullMessagesListener),
            postprocessor: Box::new(NullPostprocessor),
            host: Box::new(NoHostTypes),
            closure: ClosureSet::new(),
            sources: Vec::new(),
            last_attempts: 0,
        }
    }

    pub fn with_listener(mut self, listener: impl MessagesListener + 'static) -> Self {
        self.listener = Box::new(listener);
        self
    }

    pub fn with_postprocessor(mut self, postprocessor: impl SourcePostprocessor + 'static) -> Self {
        self.postprocessor = Box::new(postprocessor);
        self
    }

    pub fn with_host_types(mut self, host: impl HostTypeIndex + 'static) -> Self {
        self.host = Box::new(host);
        self
    }

    pub fn with_closure_options(mut self, closure_options: ClosureOptions) -> Self {
        self.closure_options = closure_options;
        self
    }

    pub fn options(&self) -> &ConfigurationOptions {
        &self.options
    }

    /// Closure of the compilation in progress; empty between calls.
    pub fn closure(&self) -> &ClosureSet {
        &self.closure
    }

    /// Backend invocations made by the last call to `compile`.
    pub fn last_attempts(&self) -> usize {
        self.last_attempts
    }

    /// Compiles `sources`, retrying while the postprocessor keeps changing
    /// failing sources, and returns every class the backend wrote.
    pub fn compile(
        &mut self,
        sources: Vec<SourceUnit>,
        provider: &dyn ClassesProvider,
        backend: &mut dyn CompilerBackend,
    ) -> Result<Vec<BytecodeBlob>, CompilerError> {
        let result = self.run(sources, provider, backend);
        self.closure.clear();
        self.sources.clear();
        if let Err(error) = &result {
            tracing::warn!(error = %error, "compilation did not produce any classes");
        }
        result
    }

    fn run(
        &mut self,
        sources: Vec<SourceUnit>,
        provider: &dyn ClassesProvider,
        backend: &mut dyn CompilerBackend,
    ) -> Result<Vec<BytecodeBlob>, CompilerError> {
        let reporter = Reporter::new(self.listener.as_ref(), &self.options.logging);
        self.sources = sources;
        self.last_attempts = 0;

        let names: Vec<&str> = self
            .sources
            .iter()
            .map(|source| source.identifier().as_str())
            .collect();
        tracing::info!(sources = names.len(), "starting classpathless compilation");
        reporter.report(
            LoggingCategory::Info,
            format_args!("Starting a compilation task of sources: {names:?}"),
        );

        let mut builder = ClosureBuilder::new(provider, reporter, &self.closure_options);
        builder.nest_group_phase(&self.sources);
        builder.direct_reference_phase();
        builder.outer_chain_phase();
        self.closure = builder.finish();

        let view = ClasspathView::new(
            &self.closure,
            provider.class_path_listing(),
            self.host.as_ref(),
            &self.options,
            reporter,
        );

        let mut state = RetryState::Attempting;
        let mut outputs = Vec::new();
        let mut issues: Vec<CompilationIssue> = Vec::new();

        while !state.is_terminal() {
            if state == RetryState::Reattempting {
                state = state.resume();
                continue;
            }

            self.last_attempts += 1;
            tracing::debug!(attempt = self.last_attempts, "invoking compiler backend");

            let mut context = BackendContext::new(provider, reporter);
            let request = BackendRequest {
                sources: &self.sources,
                flags: &self.options.backend_flags,
                classpath: &view,
            };
            let outcome = backend.compile(request, &mut context)?;
            forward_diagnostics(&outcome.diagnostics, reporter);

            if outcome.success {
                outputs = context.into_outputs()?;
                state = state.after_attempt(AttemptResult::Success);
                continue;
            }

            // Outputs of a failed attempt are dropped with the context.
            drop(context);
            issues = outcome
                .diagnostics
                .iter()
                .filter_map(Diagnostic::to_issue)
                .collect();
            let grouped = group_by_unit(issues.iter().cloned());
            let sources_changed = postprocess_sources(
                &mut self.sources,
                &grouped,
                self.postprocessor.as_ref(),
                reporter,
            );
            state = state.after_attempt(AttemptResult::Failure { sources_changed });
        }

        if state == RetryState::Failed {
            return Err(CompilerError::CompilationFailed { issues });
        }

        for output in &outputs {
            reporter.report(
                LoggingCategory::Info,
                format_args!("Compilation result: {}", output.identifier()),
            );
        }
        tracing::info!(
            outputs = outputs.len(),
            attempts = self.last_attempts,
            "compilation finished"
        );
        Ok(outputs)
    }
}

fn forward_diagnostics(diagnostics: &[Diagnostic], reporter: Reporter<'_>) {
    for diagnostic in diagnostics {
        reporter.report(diagnostic.category(), diagnostic);
    }
}

impl std::fmt::Debug for ClasspathlessCompiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClasspathlessCompiler")
            .field("options", &self.options)
            .field("closure_options", &self.closure_options)
            .field("last_attempts", &self.last_attempts)
            .finish_non_exhaustive()
    }
}

