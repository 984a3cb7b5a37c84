use crate::config::ConfigError;
use cplc_api::{CompilationIssue, TypeIdentifier};
use cplc_bytecode::{ClassParseError, NestError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompilerError {
    #[error("malformed bytecode for {identifier}: {source}")]
    MalformedBytecode {
        identifier: TypeIdentifier,
        #[source]
        source: ClassParseError,
    },
    #[error("no bytecode available for {identifier}")]
    MissingBytecode { identifier: TypeIdentifier },
    #[error("classes provider could not resolve {identifier}")]
    UnresolvableType { identifier: TypeIdentifier },
    #[error("classes provider returned {count} classes for {identifier}")]
    AmbiguousProvider {
        identifier: TypeIdentifier,
        count: usize,
    },
    #[error("compilation failed:{}", render_issues(.issues))]
    CompilationFailed { issues: Vec<CompilationIssue> },
    #[error("compiler backend failure: {0}")]
    Backend(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<NestError> for CompilerError {
    fn from(error: NestError) -> Self {
        match error {
            NestError::MissingBytecode { identifier } => Self::MissingBytecode { identifier },
            NestError::MalformedBytecode { identifier, source } => {
                Self::MalformedBytecode { identifier, source }
            }
        }
    }
}

impl CompilerError {
    pub fn malformed(identifier: &TypeIdentifier, source: ClassParseError) -> Self {
        Self::MalformedBytecode {
            identifier: identifier.clone(),
            source,
        }
    }

    /// Issues carried by a failed compilation, empty for other errors.
    pub fn issues(&self) -> &[CompilationIssue] {
        match self {
            Self::CompilationFailed { issues } => issues,
            _ => &[],
        }
    }
}

fn render_issues(issues: &[CompilationIssue]) -> String {
    if issues.is_empty() {
        return " no diagnostics reported".to_string();
    }
    issues.iter().map(|issue| format!("\n  {issue}")).collect()
}
