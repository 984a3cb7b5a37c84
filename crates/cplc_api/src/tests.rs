use super::*;
use std::collections::BTreeSet;

#[test]
fn identifier_splits_package_and_simple_name() {
    let id = TypeIdentifier::new("java.util.Map$Entry");
    assert_eq!(id.package(), "java.util");
    assert_eq!(id.simple_name(), "Map$Entry");

    let unnamed = TypeIdentifier::new("Hello");
    assert_eq!(unnamed.package(), "");
    assert_eq!(unnamed.simple_name(), "Hello");
}

#[test]
fn identifier_converts_internal_names() {
    let id = TypeIdentifier::from_internal("java/lang/String");
    assert_eq!(id.as_str(), "java.lang.String");
    assert_eq!(id.to_internal(), "java/lang/String");
    assert!(!id.has_path_separator());
    assert!(TypeIdentifier::new("[Ljava.lang.String;").is_array_descriptor());
    assert!(TypeIdentifier::new("Foo$$Lambda/0x1234").has_path_separator());
    assert!(TypeIdentifier::root_object().is_root_object());
}

#[test]
fn identifiers_order_by_name() {
    let names: BTreeSet<TypeIdentifier> = ["a.ba", "a.b$a", "a.a"]
        .into_iter()
        .map(TypeIdentifier::from)
        .collect();
    let ordered: Vec<&str> = names.iter().map(TypeIdentifier::as_str).collect();
    assert_eq!(ordered, vec!["a.a", "a.b$a", "a.ba"]);
}

#[test]
fn source_unit_file_name_uses_path_separators() {
    let mut unit = SourceUnit::new("com.example.Hello", "class Hello {}");
    assert_eq!(unit.file_name(), "com/example/Hello.java");
    unit.replace_source("class Hello { int x; }");
    assert_eq!(unit.source(), "class Hello { int x; }");
}

#[test]
fn in_memory_provider_omits_unknown_names() {
    let mut provider = InMemoryClassesProvider::new();
    provider.insert(BytecodeBlob::new("a.A", vec![1u8, 2, 3]));
    provider.add_listing_entry("[La.A;");

    let found = provider.get_class(&[TypeIdentifier::new("a.A"), TypeIdentifier::new("a.B")]);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].bytes(), &[1, 2, 3]);
    assert_eq!(provider.class_path_listing(), vec!["a.A", "[La.A;"]);
}

#[test]
fn severity_follows_code_prefix() {
    assert_eq!(Severity::from_code(Some("compiler.warn.raw")), Severity::Warning);
    assert_eq!(Severity::from_code(Some("compiler.note.unchecked")), Severity::Note);
    assert_eq!(Severity::from_code(Some("compiler.err.cant.resolve")), Severity::Error);
    assert_eq!(Severity::from_code(None), Severity::Error);
}

#[test]
fn issues_group_by_unit_in_report_order() {
    let grouped = group_by_unit(vec![
        CompilationIssue::new("b.B", 3, 1, None, "second"),
        CompilationIssue::new("a.A", 1, 1, None, "first"),
        CompilationIssue::new("b.B", 1, 2, None, "third"),
    ]);
    let units: Vec<&str> = grouped.keys().map(TypeIdentifier::as_str).collect();
    assert_eq!(units, vec!["a.A", "b.B"]);
    let messages: Vec<&str> = grouped[&TypeIdentifier::new("b.B")]
        .iter()
        .map(|issue| issue.message.as_str())
        .collect();
    assert_eq!(messages, vec!["second", "third"]);
}

#[test]
fn patch_module_flags_become_map_entries() {
    let options = ConfigurationOptions::new()
        .with_backend_flags(["-g", "--patch-module", "java.base=java.lang:java.util", "-Xlint"])
        .expect("valid flags");
    assert_eq!(options.backend_flags, vec!["-g", "-Xlint"]);
    assert_eq!(options.module_for_package("java.lang"), Some("java.base"));
    assert_eq!(options.module_for_package("java.util"), Some("java.base"));
    assert_eq!(options.module_for_package("java.io"), None);
}

#[test]
fn patch_module_flag_requires_a_value() {
    let error = ConfigurationOptions::new()
        .with_backend_flags(["--patch-module"])
        .expect_err("missing value");
    assert_eq!(error, OptionsError::PatchModuleMissingValue);

    let error = ConfigurationOptions::new()
        .with_backend_flags(["--patch-module=java.base"])
        .expect_err("missing packages");
    assert!(matches!(error, OptionsError::PatchModuleMalformed { .. }));
}

#[test]
fn options_deserialize_with_defaults() {
    let options: ConfigurationOptions = toml::from_str(
        r#"
        use_host_system_types = false

        [logging]
        categories = ["info", "loading-bytecode"]
        "#,
    )
    .expect("parse options");
    assert!(!options.use_host_system_types);
    assert!(options.use_host_root_object_type);
    assert!(options.logging.enables(LoggingCategory::LoadingBytecode));
    assert!(!options.logging.enables(LoggingCategory::CompilerDiagnostics));
}

#[test]
fn categories_parse_from_config_names() {
    assert_eq!(
        "COMPILER_DIAGNOSTICS_NOTE".parse::<LoggingCategory>(),
        Ok(LoggingCategory::CompilerDiagnosticsNote)
    );
    assert!("nonsense".parse::<LoggingCategory>().is_err());
}

#[test]
fn recording_listener_filters_by_category() {
    let listener = RecordingMessagesListener::new();
    listener.add_message(LoggingCategory::Info, "one");
    listener.add_message(LoggingCategory::LoadingBytecode, "two");
    assert_eq!(listener.messages_in(LoggingCategory::Info), vec!["one"]);
    assert_eq!(listener.messages().len(), 2);
}
