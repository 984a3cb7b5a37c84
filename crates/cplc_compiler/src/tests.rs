use super::*;
use cplc_api::{
    BytecodeBlob, ClassesProvider, ConfigurationOptions, InMemoryClassesProvider, LogSettings,
    LoggingCategory, RecordingMessagesListener, TypeIdentifier,
};
use std::cell::Cell;
use std::io::Write;

fn id(name: &str) -> TypeIdentifier {
    TypeIdentifier::new(name)
}

fn only(categories: &[LoggingCategory]) -> LogSettings {
    LogSettings {
        categories: categories.iter().copied().collect(),
        tracing: false,
    }
}

fn names(entries: &[ClasspathEntry]) -> Vec<&str> {
    entries.iter().map(|entry| entry.identifier.as_str()).collect()
}

/// Serves the same name twice.
struct DuplicatingProvider;

impl ClassesProvider for DuplicatingProvider {
    fn get_class(&self, names: &[TypeIdentifier]) -> Vec<BytecodeBlob> {
        names
            .iter()
            .flat_map(|name| {
                [
                    BytecodeBlob::new(name.clone(), vec![1]),
                    BytecodeBlob::new(name.clone(), vec![2]),
                ]
            })
            .collect()
    }

    fn class_path_listing(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Counts `get_class` calls on top of an in-memory provider.
struct CountingProvider {
    inner: InMemoryClassesProvider,
    calls: Cell<usize>,
}

impl ClassesProvider for CountingProvider {
    fn get_class(&self, names: &[TypeIdentifier]) -> Vec<BytecodeBlob> {
        self.calls.set(self.calls.get() + 1);
        self.inner.get_class(names)
    }

    fn class_path_listing(&self) -> Vec<String> {
        self.inner.class_path_listing()
    }
}

#[test]
fn closure_set_rejects_arrays_and_synthetic_names() {
    let mut set = ClosureSet::new();
    assert!(set.insert(id("pkg.Hello")));
    assert!(!set.insert(id("pkg.Hello")));
    assert!(!set.insert(id("[Lpkg.Hello;")));
    assert!(!set.insert(id("pkg.Hello$$Lambda/0x0000000800c03000")));
    assert!(!set.insert(id("")));

    assert_eq!(set.len(), 1);
    assert!(set.contains(&id("pkg.Hello")));
    assert!(set.remove(&id("pkg.Hello")));
    assert!(set.is_empty());
}

#[test]
fn closure_set_collects_only_admissible_names() {
    let set: ClosureSet = ["b.B", "a.A", "[I", "a.A"].into_iter().map(id).collect();
    let ordered: Vec<&str> = set.iter().map(TypeIdentifier::as_str).collect();
    assert_eq!(ordered, vec!["a.A", "b.B"]);

    let smaller: ClosureSet = [id("a.A")].into_iter().collect();
    assert!(set.is_superset(&smaller));
    assert!(!smaller.is_superset(&set));
}

#[test]
fn closure_options_default_to_the_root_object() {
    let options = ClosureOptions::default();
    assert!(options.always_available.contains(&TypeIdentifier::root_object()));
    assert_eq!(ClosurePhase::OuterChain.to_string(), "enclosing class of direct import");
}

#[test]
fn retry_state_transitions() {
    use AttemptResult::*;

    assert_eq!(
        RetryState::Attempting.after_attempt(Success),
        RetryState::Succeeded
    );
    assert_eq!(
        RetryState::Attempting.after_attempt(Failure {
            sources_changed: true
        }),
        RetryState::Reattempting
    );
    assert_eq!(
        RetryState::Attempting.after_attempt(Failure {
            sources_changed: false
        }),
        RetryState::Failed
    );
    assert_eq!(RetryState::Reattempting.resume(), RetryState::Attempting);
    assert_eq!(RetryState::Failed.after_attempt(Success), RetryState::Failed);
    assert_eq!(RetryState::Succeeded.resume(), RetryState::Succeeded);

    assert!(RetryState::Succeeded.is_terminal());
    assert!(RetryState::Failed.is_terminal());
    assert!(!RetryState::Attempting.is_terminal());
    assert!(!RetryState::Reattempting.is_terminal());
}

#[test]
fn package_membership_respects_boundaries() {
    assert!(in_package("a.b.C", "a.b", false));
    assert!(!in_package("a.b.c.D", "a.b", false));
    assert!(in_package("a.b.c.D", "a.b", true));
    assert!(!in_package("a.bc.E", "a.b", true));
    assert!(!in_package("a.b", "a.b", true));
    assert!(in_package("Hello", "", false));
    assert!(!in_package("pkg.Hello", "", false));
    assert!(in_package("pkg.Hello", "", true));
}

#[test]
fn diagnostic_renders_unit_position_and_code() {
    let error = Diagnostic::new(
        Some(id("pkg.Hello")),
        3,
        7,
        Some("compiler.err.cant.resolve"),
        "cannot find symbol",
    );
    assert_eq!(
        error.to_string(),
        "Compiler diagnostic at (pkg.Hello) [3, 7]: cannot find symbol (code: compiler.err.cant.resolve)"
    );
    assert_eq!(error.category(), LoggingCategory::CompilerDiagnostics);
    let issue = error.to_issue().expect("issue for unit");
    assert_eq!(issue.unit, id("pkg.Hello"));
    assert_eq!(issue.line, 3);

    let warning = Diagnostic::new(None, 0, 0, Some("compiler.warn.deprecated"), "old");
    assert_eq!(
        warning.to_string(),
        "Compiler diagnostic at [0, 0]: old (code: compiler.warn.deprecated)"
    );
    assert_eq!(warning.category(), LoggingCategory::CompilerDiagnosticsWarning);
    assert!(warning.to_issue().is_none());

    let note = Diagnostic::new(None, 1, 1, Some("compiler.note.unchecked"), "unchecked");
    assert_eq!(note.category(), LoggingCategory::CompilerDiagnosticsNote);
    let bare = Diagnostic::new(None, 1, 2, None, "boom");
    assert_eq!(bare.to_string(), "Compiler diagnostic at [1, 2]: boom (code: none)");
}

#[test]
fn reporter_filters_by_category() {
    let listener = RecordingMessagesListener::new();
    let settings = only(&[LoggingCategory::Info]);
    let reporter = Reporter::new(&listener, &settings);

    reporter.report(LoggingCategory::Info, "kept");
    reporter.report(LoggingCategory::LoadingBytecode, "dropped");
    reporter.trace_call("list", format_args!("ignored without tracing"));

    assert_eq!(
        listener.messages(),
        vec![(LoggingCategory::Info, "kept".to_string())]
    );
    assert!(reporter.enabled(LoggingCategory::Info));
    assert!(!reporter.enabled(LoggingCategory::CompilerCritical));
}

#[test]
fn content_cell_reports_unresolvable_type() {
    let provider = InMemoryClassesProvider::new();
    let listener = RecordingMessagesListener::new();
    let settings = LogSettings::verbose();
    let mut cell = ContentCell::lazy(
        id("pkg.Missing"),
        &provider,
        Reporter::new(&listener, &settings),
    );

    let error = cell.read().expect_err("nothing to read");
    assert!(matches!(
        error,
        CompilerError::UnresolvableType { identifier } if identifier == id("pkg.Missing")
    ));
    assert!(!cell.is_resolved());
}

#[test]
fn content_cell_rejects_ambiguous_provider() {
    let listener = RecordingMessagesListener::new();
    let settings = LogSettings::silent();
    let provider = DuplicatingProvider;
    let mut cell = ContentCell::lazy(
        id("pkg.Twice"),
        &provider,
        Reporter::new(&listener, &settings),
    );

    let error = cell.read().expect_err("two answers");
    assert!(matches!(error, CompilerError::AmbiguousProvider { count: 2, .. }));
}

#[test]
fn content_cell_fetches_once_and_caches() {
    let provider = CountingProvider {
        inner: InMemoryClassesProvider::from_blobs([BytecodeBlob::new(
            "pkg.Hello",
            vec![0xCA, 0xFE],
        )]),
        calls: Cell::new(0),
    };
    let listener = RecordingMessagesListener::new();
    let settings = only(&[LoggingCategory::LoadingBytecode]);
    let mut cell = ContentCell::lazy(
        id("pkg.Hello"),
        &provider,
        Reporter::new(&listener, &settings),
    );

    assert!(!cell.is_resolved());
    assert_eq!(provider.calls.get(), 0);
    assert_eq!(cell.read().expect("first read"), &[0xCA, 0xFE]);
    assert_eq!(cell.read().expect("second read"), &[0xCA, 0xFE]);
    assert_eq!(provider.calls.get(), 1);
    assert!(cell.is_resolved());
    assert_eq!(
        listener.messages_in(LoggingCategory::LoadingBytecode),
        vec!["Loading bytecode of pkg.Hello (2 bytes)".to_string()]
    );

    let blob = cell.into_blob().expect("resolved blob");
    assert_eq!(blob.bytes(), &[0xCA, 0xFE]);
    assert_eq!(provider.calls.get(), 1);
}

#[test]
fn output_cells_accept_writes_and_input_cells_do_not() {
    let mut output = ContentCell::output(id("pkg.Hello"));
    assert!(output.is_output());
    output.write_all(&[1, 2]).expect("write");
    output.write_all(&[3]).expect("write");
    assert_eq!(output.read().expect("read back"), &[1, 2, 3]);
    let blob = output.into_blob().expect("blob");
    assert_eq!(blob.identifier(), &id("pkg.Hello"));
    assert_eq!(blob.bytes(), &[1, 2, 3]);

    let provider = InMemoryClassesProvider::new();
    let listener = RecordingMessagesListener::new();
    let settings = LogSettings::silent();
    let mut input = ContentCell::lazy(
        id("pkg.Dep"),
        &provider,
        Reporter::new(&listener, &settings),
    );
    let error = input.write(&[0]).expect_err("input cells are read only");
    assert_eq!(error.kind(), std::io::ErrorKind::PermissionDenied);
}

#[test]
fn classpath_listing_stops_at_the_package_boundary() {
    let closure: ClosureSet = ["a.b.C", "a.b.c.D", "a.bc.E", "a.b$X", "a.A"]
        .into_iter()
        .map(id)
        .collect();
    let options = ConfigurationOptions::new();
    let listener = RecordingMessagesListener::new();
    let settings = only(&[LoggingCategory::SkippingSubpackage]);
    let view = ClasspathView::new(
        &closure,
        Vec::new(),
        &NoHostTypes,
        &options,
        Reporter::new(&listener, &settings),
    );

    let flat = view.list("a.b", false);
    let flat: Vec<&str> = flat.iter().map(TypeIdentifier::as_str).collect();
    assert_eq!(flat, vec!["a.b.C"]);
    assert_eq!(
        listener.messages_in(LoggingCategory::SkippingSubpackage),
        vec!["Skipping over class from a subpackage: \"a.b.c.D\"".to_string()]
    );

    let recursive = view.list("a.b", true);
    let recursive: Vec<&str> = recursive.iter().map(TypeIdentifier::as_str).collect();
    assert_eq!(recursive, vec!["a.b.C", "a.b.c.D"]);

    let top = view.list("a", false);
    let top: Vec<&str> = top.iter().map(TypeIdentifier::as_str).collect();
    assert_eq!(top, vec!["a.A", "a.b$X"]);

    assert!(view.list("a.b.C", true).is_empty());
    assert!(view.list("z", true).is_empty());
}

#[test]
fn listing_orders_names_within_a_package() {
    let closure: ClosureSet = ["a.a", "a.b$a", "a.ba", "a.b.a", "a.b.b"]
        .into_iter()
        .map(id)
        .collect();
    let options = ConfigurationOptions::new();
    let listener = RecordingMessagesListener::new();
    let settings = LogSettings::silent();
    let view = ClasspathView::new(
        &closure,
        Vec::new(),
        &NoHostTypes,
        &options,
        Reporter::new(&listener, &settings),
    );

    let top = view.list("a", false);
    let top: Vec<&str> = top.iter().map(TypeIdentifier::as_str).collect();
    assert_eq!(top, vec!["a.a", "a.b$a", "a.ba"]);

    let nested = view.list("a.b", false);
    let nested: Vec<&str> = nested.iter().map(TypeIdentifier::as_str).collect();
    assert_eq!(nested, vec!["a.b.a", "a.b.b"]);
}

#[test]
fn classpath_view_drops_arrays_and_synthetic_listing_entries() {
    let closure = ClosureSet::new();
    let options = ConfigurationOptions::new();
    let listener = RecordingMessagesListener::new();
    let settings = only(&[LoggingCategory::IgnoringNonTypes]);
    let view = ClasspathView::new(
        &closure,
        vec![
            "pkg.Listed".to_string(),
            "[Lpkg.Listed;".to_string(),
            "pkg.Listed$$Lambda/0x01".to_string(),
        ],
        &NoHostTypes,
        &options,
        Reporter::new(&listener, &settings),
    );

    assert_eq!(view.len(), 1);
    assert!(view.contains(&id("pkg.Listed")));
    assert_eq!(view.origin_of(&id("pkg.Listed")), Some(Origin::Provider));
    assert_eq!(
        listener.messages_in(LoggingCategory::IgnoringNonTypes),
        vec![
            "Ignoring array type from classpath listing: [Lpkg.Listed;".to_string(),
            "Ignoring lambda type from classpath listing: pkg.Listed$$Lambda/0x01".to_string(),
        ]
    );
}

#[test]
fn host_types_are_substituted_when_disabled() {
    let closure: ClosureSet = [id("java.lang.Thing")].into_iter().collect();
    let options = ConfigurationOptions::new()
        .use_host_system_types(false)
        .use_host_root_object_type(true);
    let host = StaticHostTypes::new(["java.lang.Object", "java.lang.String"]);
    let listener = RecordingMessagesListener::new();
    let settings = LogSettings::silent();
    let view = ClasspathView::new(
        &closure,
        Vec::new(),
        &host,
        &options,
        Reporter::new(&listener, &settings),
    );

    let modules = view.list_location(Location::HostSystemModules, "java.lang", false);
    assert_eq!(
        names(&modules),
        vec!["java.lang.Object", "java.lang.String", "java.lang.Thing"]
    );

    assert!(view
        .list_location(Location::HostPlatformClassPath, "java.lang", false)
        .is_empty());
    let class_path = view.list_location(Location::ClassPath, "java.lang", false);
    let rendered: Vec<String> = class_path.iter().map(ToString::to_string).collect();
    assert_eq!(
        rendered,
        vec![
            "java.lang.Object (host)".to_string(),
            "java.lang.String".to_string(),
            "java.lang.Thing".to_string(),
        ]
    );

    assert_eq!(view.system_module_locations(), vec![BASE_MODULE.to_string()]);
}

#[test]
fn host_types_are_served_directly_when_enabled() {
    let closure: ClosureSet = [id("java.lang.Thing")].into_iter().collect();
    let options = ConfigurationOptions::new();
    let host = StaticHostTypes::new(["java.lang.String"]);
    let listener = RecordingMessagesListener::new();
    let settings = LogSettings::silent();
    let view = ClasspathView::new(
        &closure,
        Vec::new(),
        &host,
        &options,
        Reporter::new(&listener, &settings),
    );

    let modules = view.list_location(Location::HostSystemModules, "java.lang", true);
    assert_eq!(modules.len(), 1);
    assert_eq!(modules[0].origin, Origin::Host);
    assert_eq!(
        names(&view.list_location(Location::ClassPath, "java.lang", false)),
        vec!["java.lang.Thing"]
    );
    assert_eq!(view.system_module_locations(), vec![BASE_MODULE.to_string()]);

    let none = ClasspathView::new(
        &closure,
        Vec::new(),
        &NoHostTypes,
        &options,
        Reporter::new(&listener, &settings),
    );
    assert!(none.system_module_locations().is_empty());
}

#[test]
fn host_resources_are_never_listed() {
    let closure = ClosureSet::new();
    let options = ConfigurationOptions::new();
    let host = StaticHostTypes::new(["java.lang.String"])
        .with_resources(["java.lang.uniName.dat", "java.util.currency.data"]);
    let listener = RecordingMessagesListener::new();
    let settings = only(&[LoggingCategory::SkippingNonClassObject]);
    let view = ClasspathView::new(
        &closure,
        Vec::new(),
        &host,
        &options,
        Reporter::new(&listener, &settings),
    );

    let listed = view.list_location(Location::HostSystemModules, "java.lang", false);

    assert_eq!(names(&listed), vec!["java.lang.String"]);
    assert_eq!(
        listener.messages_in(LoggingCategory::SkippingNonClassObject),
        vec!["Skipping non-class object: \"java.lang.uniName.dat\"".to_string()]
    );
}

#[test]
fn patched_packages_are_grouped_by_module() {
    let options = ConfigurationOptions::new()
        .with_backend_flags(["-g", "--patch-module", "java.base=java.lang:java.util"])
        .expect("valid flags");
    let closure = ClosureSet::new();
    let listener = RecordingMessagesListener::new();
    let settings = LogSettings::silent();
    let view = ClasspathView::new(
        &closure,
        Vec::new(),
        &NoHostTypes,
        &options,
        Reporter::new(&listener, &settings),
    );

    assert_eq!(view.module_for_package("java.util"), Some("java.base"));
    assert_eq!(view.module_for_package("pkg"), None);
    let locations = view.patch_module_locations();
    assert_eq!(
        locations.get("java.base"),
        Some(&vec!["java.lang".to_string(), "java.util".to_string()])
    );

    let cell = ContentCell::output(id("pkg.Hello"));
    assert_eq!(view.infer_binary_name(&cell), id("pkg.Hello"));
}

#[test]
fn compilation_failure_lists_every_issue() {
    let error = CompilerError::CompilationFailed {
        issues: vec![cplc_api::CompilationIssue::new(
            "pkg.Hello",
            1,
            2,
            Some("compiler.err.expected".to_string()),
            "';' expected",
        )],
    };
    assert_eq!(
        error.to_string(),
        "compilation failed:\n  pkg.Hello:1:2: ';' expected (code: compiler.err.expected)"
    );
    assert_eq!(error.issues().len(), 1);

    let empty = CompilerError::CompilationFailed { issues: Vec::new() };
    assert_eq!(empty.to_string(), "compilation failed: no diagnostics reported");
    assert!(CompilerError::Backend("x".to_string()).issues().is_empty());
}
