use crate::identifier::TypeIdentifier;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Severity of a backend diagnostic, derived from its code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl Severity {
    /// `compiler.warn.*` codes are warnings, `compiler.note.*` codes are notes,
    /// everything else (including a missing code) is an error.
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some(code) if code.starts_with("compiler.warn") => Severity::Warning,
            Some(code) if code.starts_with("compiler.note") => Severity::Note,
            _ => Severity::Error,
        }
    }
}

/// One diagnostic attributed to a source unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilationIssue {
    pub unit: TypeIdentifier,
    pub line: u64,
    pub column: u64,
    pub code: Option<String>,
    pub message: String,
}

impl CompilationIssue {
    pub fn new(
        unit: impl Into<TypeIdentifier>,
        line: u64,
        column: u64,
        code: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            unit: unit.into(),
            line,
            column,
            code,
            message: message.into(),
        }
    }

    pub fn severity(&self) -> Severity {
        Severity::from_code(self.code.as_deref())
    }
}

impl fmt::Display for CompilationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}: {}", self.unit, self.line, self.column, self.message)?;
        if let Some(code) = &self.code {
            write!(f, " (code: {code})")?;
        }
        Ok(())
    }
}

/// Issues of one compile attempt grouped by owning unit.
pub type IssuesByUnit = BTreeMap<TypeIdentifier, Vec<CompilationIssue>>;

/// Groups issues by unit, keeping the reported order inside each group.
pub fn group_by_unit<I>(issues: I) -> IssuesByUnit
where
    I: IntoIterator<Item = CompilationIssue>,
{
    let mut grouped = IssuesByUnit::new();
    for issue in issues {
        grouped.entry(issue.unit.clone()).or_default().push(issue);
    }
    grouped
}
