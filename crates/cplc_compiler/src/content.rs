use crate::error::CompilerError;
use crate::reporter::Reporter;
use cplc_api::{BytecodeBlob, ClassesProvider, LoggingCategory, TypeIdentifier};
use std::fmt;
use std::io;
use std::sync::Arc;

enum CellState<'p> {
    Unresolved {
        provider: &'p dyn ClassesProvider,
        reporter: Reporter<'p>,
    },
    Resolved(Arc<[u8]>),
    Output(Vec<u8>),
}

/// Bytecode of one type, fetched from the provider on first read.
///
/// Once resolved the cell no longer holds on to the provider.
pub struct ContentCell<'p> {
    identifier: TypeIdentifier,
    state: CellState<'p>,
}

impl<'p> ContentCell<'p> {
    pub fn lazy(
        identifier: TypeIdentifier,
        provider: &'p dyn ClassesProvider,
        reporter: Reporter<'p>,
    ) -> Self {
        Self {
            identifier,
            state: CellState::Unresolved { provider, reporter },
        }
    }

    /// An empty cell the backend writes a compiled class into.
    pub fn output(identifier: TypeIdentifier) -> Self {
        Self {
            identifier,
            state: CellState::Output(Vec::new()),
        }
    }

    pub fn identifier(&self) -> &TypeIdentifier {
        &self.identifier
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self.state, CellState::Unresolved { .. })
    }

    pub fn is_output(&self) -> bool {
        matches!(self.state, CellState::Output(_))
    }

    pub fn read(&mut self) -> Result<&[u8], CompilerError> {
        if let CellState::Unresolved { provider, reporter } = &self.state {
            let (provider, reporter) = (*provider, *reporter);
            reporter.trace_call("read", format_args!("{}", self.identifier));
            let bytes = self.fetch(provider)?;
            reporter.report(
                LoggingCategory::LoadingBytecode,
                format_args!("Loading bytecode of {} ({} bytes)", self.identifier, bytes.len()),
            );
            self.state = CellState::Resolved(bytes);
        }

        Ok(match &self.state {
            CellState::Resolved(bytes) => &bytes[..],
            CellState::Output(bytes) => bytes.as_slice(),
            CellState::Unresolved { .. } => &[],
        })
    }

    pub fn into_blob(mut self) -> Result<BytecodeBlob, CompilerError> {
        self.read()?;
        let bytes: Arc<[u8]> = match self.state {
            CellState::Resolved(bytes) => bytes,
            CellState::Output(bytes) => bytes.into(),
            CellState::Unresolved { .. } => Arc::from(Vec::new()),
        };
        Ok(BytecodeBlob::new(self.identifier, bytes))
    }

    fn fetch(&self, provider: &dyn ClassesProvider) -> Result<Arc<[u8]>, CompilerError> {
        let mut blobs = provider.get_class(std::slice::from_ref(&self.identifier));
        match blobs.len() {
            0 => Err(CompilerError::UnresolvableType {
                identifier: self.identifier.clone(),
            }),
            1 => Ok(blobs.remove(0).shared_bytes()),
            count => Err(CompilerError::AmbiguousProvider {
                identifier: self.identifier.clone(),
                count,
            }),
        }
    }
}

impl io::Write for ContentCell<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.state {
            CellState::Output(bytes) => {
                bytes.extend_from_slice(buf);
                Ok(buf.len())
            }
            _ => Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{} is an input class and cannot be written", self.identifier),
            )),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl fmt::Debug for ContentCell<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.state {
            CellState::Unresolved { .. } => "unresolved",
            CellState::Resolved(_) => "resolved",
            CellState::Output(_) => "output",
        };
        f.debug_struct("ContentCell")
            .field("identifier", &self.identifier)
            .field("state", &state)
            .finish()
    }
}
