#![allow(dead_code)]

use cplc_api::{
    BytecodeBlob, CompilationIssue, InMemoryClassesProvider, PostprocessOutcome, Severity,
    SourcePostprocessor, SourceUnit, TypeIdentifier,
};
use cplc_bytecode::fixture::{ClassFileBuilder, FieldSpec};
use cplc_compiler::{
    BackendContext, BackendOutcome, BackendRequest, CompilerBackend, CompilerError, Diagnostic,
    Location, Origin,
};
use std::io::Write;

/// Backend for a line-oriented toy language:
///
/// - `uses <binary name>` needs the type on the classpath,
/// - `nested <simple name>` declares a member class,
/// - `broken` is a compile error, `warn <text>` a warning,
/// - `critical <text>` is reported as an internal backend failure,
/// - `abort` makes the backend itself fail.
///
/// Outputs are written even for failing attempts.
#[derive(Debug, Default)]
pub struct ToyBackend {
    pub attempts: usize,
    /// Provider types read through content cells, in order.
    pub loaded: Vec<TypeIdentifier>,
    /// Host types the backend resolved without reading them.
    pub host_resolved: Vec<TypeIdentifier>,
    /// Flags seen on the last attempt.
    pub flags: Vec<String>,
    /// Every name on the classpath during the last attempt.
    pub visible: Vec<TypeIdentifier>,
}

impl CompilerBackend for ToyBackend {
    fn compile(
        &mut self,
        request: BackendRequest<'_>,
        context: &mut BackendContext<'_>,
    ) -> Result<BackendOutcome, CompilerError> {
        self.attempts += 1;
        self.flags = request.flags.to_vec();
        self.visible = request.classpath.list("", true);
        let mut diagnostics = Vec::new();

        for source in request.sources {
            let unit = source.identifier();
            let internal = unit.to_internal();
            let mut class = ClassFileBuilder::new(&internal);
            let mut members = Vec::new();

            for (index, line) in source.source().lines().enumerate() {
                let line_number = index as u64 + 1;
                let line = line.trim();
                if let Some(name) = line.strip_prefix("uses ") {
                    let name = TypeIdentifier::new(name.trim());
                    match resolve(&request, &name) {
                        Some(Origin::Provider) => {
                            let mut cell = context.open_input(&name);
                            cell.read()?;
                            self.loaded.push(name.clone());
                            class = class.field(FieldSpec::new(
                                "dependency",
                                &format!("L{};", name.to_internal()),
                            ));
                        }
                        Some(Origin::Host) => self.host_resolved.push(name),
                        None => diagnostics.push(Diagnostic::new(
                            Some(unit.clone()),
                            line_number,
                            6,
                            Some("compiler.err.cant.resolve"),
                            format!("cannot find symbol {name}"),
                        )),
                    }
                } else if let Some(simple) = line.strip_prefix("nested ") {
                    let simple = simple.trim();
                    let inner = format!("{internal}${simple}");
                    class = class.inner_class(&inner, Some(&internal), Some(simple), 0);
                    members.push((
                        TypeIdentifier::new(format!("{unit}${simple}")),
                        ClassFileBuilder::new(&inner).member_of(&internal),
                    ));
                } else if line == "broken" {
                    diagnostics.push(Diagnostic::new(
                        Some(unit.clone()),
                        line_number,
                        1,
                        Some("compiler.err.expected"),
                        "';' expected",
                    ));
                } else if let Some(text) = line.strip_prefix("warn ") {
                    diagnostics.push(Diagnostic::new(
                        Some(unit.clone()),
                        line_number,
                        1,
                        Some("compiler.warn.toy"),
                        text,
                    ));
                } else if let Some(text) = line.strip_prefix("critical ") {
                    context.report_critical(&format!("{text}\n"));
                    context.report_critical("   \n");
                } else if line == "abort" {
                    return Err(CompilerError::Backend(format!("cannot compile {unit}")));
                }
            }

            emit(context, unit.clone(), &class)?;
            for (identifier, member) in &members {
                emit(context, identifier.clone(), member)?;
            }
        }

        let success = diagnostics
            .iter()
            .all(|diagnostic| diagnostic.severity() != Severity::Error);
        Ok(BackendOutcome {
            success,
            diagnostics,
        })
    }
}

fn resolve(request: &BackendRequest<'_>, name: &TypeIdentifier) -> Option<Origin> {
    [Location::ClassPath, Location::HostSystemModules]
        .into_iter()
        .find_map(|location| {
            request
                .classpath
                .list_location(location, name.package(), false)
                .into_iter()
                .find(|entry| &entry.identifier == name)
                .map(|entry| entry.origin)
        })
}

fn emit(
    context: &mut BackendContext<'_>,
    identifier: TypeIdentifier,
    class: &ClassFileBuilder,
) -> Result<(), CompilerError> {
    context
        .create_output(identifier)
        .write_all(&class.build())
        .map_err(|error| CompilerError::Backend(error.to_string()))
}

/// Removes the first `broken` line of every unit with an error.
#[derive(Debug, Default, Clone, Copy)]
pub struct DropBrokenLine;

impl SourcePostprocessor for DropBrokenLine {
    fn postprocess(&self, source: &SourceUnit, issues: &[CompilationIssue]) -> PostprocessOutcome {
        let lines: Vec<&str> = source.source().lines().collect();
        let Some(position) = lines.iter().position(|line| line.trim() == "broken") else {
            return PostprocessOutcome::unchanged(source);
        };
        if issues.is_empty() {
            return PostprocessOutcome::unchanged(source);
        }

        let kept: Vec<&str> = lines
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != position)
            .map(|(_, line)| *line)
            .collect();
        let mut fixed = source.clone();
        fixed.replace_source(kept.join("\n"));
        PostprocessOutcome::changed(fixed)
    }
}

pub fn blob(name: &str, class: ClassFileBuilder) -> BytecodeBlob {
    BytecodeBlob::new(name, class.build())
}

pub fn provider(blobs: impl IntoIterator<Item = BytecodeBlob>) -> InMemoryClassesProvider {
    InMemoryClassesProvider::from_blobs(blobs)
}

pub fn identifiers(blobs: &[BytecodeBlob]) -> Vec<&str> {
    blobs.iter().map(|blob| blob.identifier().as_str()).collect()
}
