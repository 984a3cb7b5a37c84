//! Compile/postprocess retry state machine.
//!
//! ```text
//! Attempting --success--> Succeeded
//! Attempting --failure, sources changed--> Reattempting --> Attempting
//! Attempting --failure, nothing changed--> Failed
//! ```
//!
//! There is no iteration bound: the loop ends when the postprocessor stops
//! changing sources.

use crate::reporter::Reporter;
use cplc_api::{IssuesByUnit, LoggingCategory, SourcePostprocessor, SourceUnit};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Attempting,
    Reattempting,
    Succeeded,
    Failed,
}

/// What one backend attempt led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptResult {
    Success,
    Failure { sources_changed: bool },
}

impl RetryState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RetryState::Succeeded | RetryState::Failed)
    }

    /// Transition out of `Attempting`. Other states ignore attempt results.
    pub fn after_attempt(self, result: AttemptResult) -> Self {
        match (self, result) {
            (RetryState::Attempting, AttemptResult::Success) => RetryState::Succeeded,
            (RetryState::Attempting, AttemptResult::Failure { sources_changed: true }) => {
                RetryState::Reattempting
            }
            (RetryState::Attempting, AttemptResult::Failure { sources_changed: false }) => {
                RetryState::Failed
            }
            (state, _) => state,
        }
    }

    /// Transition out of `Reattempting`.
    pub fn resume(self) -> Self {
        match self {
            RetryState::Reattempting => RetryState::Attempting,
            state => state,
        }
    }
}

/// Offers every unit with issues to the postprocessor and applies the
/// rewrites it reports. Returns whether any source changed.
pub fn postprocess_sources(
    sources: &mut [SourceUnit],
    issues: &IssuesByUnit,
    postprocessor: &dyn SourcePostprocessor,
    reporter: Reporter<'_>,
) -> bool {
    let mut changed = false;
    for (unit, unit_issues) in issues {
        let Some(source) = sources
            .iter_mut()
            .find(|source| source.identifier() == unit)
        else {
            tracing::debug!(unit = %unit, "issues reported for a unit that is not being compiled");
            continue;
        };

        let outcome = postprocessor.postprocess(source, unit_issues);
        if outcome.changed {
            reporter.report(
                LoggingCategory::Info,
                format_args!("Source {unit} was modified by the postprocessor"),
            );
            source.replace_source(outcome.source.source());
            changed = true;
        }
    }
    changed
}
