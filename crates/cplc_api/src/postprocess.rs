use crate::bytecode::SourceUnit;
use crate::issue::CompilationIssue;

/// Result of one postprocessing attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostprocessOutcome {
    pub changed: bool,
    pub source: SourceUnit,
}

impl PostprocessOutcome {
    pub fn unchanged(source: &SourceUnit) -> Self {
        Self {
            changed: false,
            source: source.clone(),
        }
    }

    pub fn changed(source: SourceUnit) -> Self {
        Self {
            changed: true,
            source,
        }
    }
}

/// Rewrites failing sources in response to compiler diagnostics.
///
/// The retry loop keeps compiling as long as some unit reports a change, so
/// an implementation must eventually stop reporting changes.
pub trait SourcePostprocessor {
    fn postprocess(&self, source: &SourceUnit, issues: &[CompilationIssue]) -> PostprocessOutcome;
}

/// Never changes anything: the first failed attempt is final.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPostprocessor;

impl SourcePostprocessor for NullPostprocessor {
    fn postprocess(&self, source: &SourceUnit, _issues: &[CompilationIssue]) -> PostprocessOutcome {
        PostprocessOutcome::unchanged(source)
    }
}
