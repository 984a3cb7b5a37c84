//! Package listings served to the backend.

use proptest::prelude::*;

use cplc_api::{ConfigurationOptions, LogSettings, RecordingMessagesListener, TypeIdentifier};
use cplc_compiler::{
    in_package, ClasspathView, ClosureSet, Location, NoHostTypes, Reporter, StaticHostTypes,
};

fn render(view: &ClasspathView<'_>) -> String {
    [
        (Location::ClassPath, "pkg", false),
        (Location::ClassPath, "pkg", true),
        (Location::HostSystemModules, "java.lang", false),
        (Location::HostPlatformClassPath, "java.lang", false),
        (Location::ClassPath, "java.lang", false),
    ]
    .into_iter()
    .map(|(location, package, recursive)| {
        let entries: Vec<String> = view
            .list_location(location, package, recursive)
            .iter()
            .map(ToString::to_string)
            .collect();
        format!(
            "{location:?} {package} recursive={recursive}: [{}]",
            entries.join(", ")
        )
    })
    .collect::<Vec<_>>()
    .join("\n")
}

#[test]
fn listing_with_host_substitution_snapshot() {
    let closure: ClosureSet = [
        "java.lang.Thing",
        "pkg.Hello$Inner",
        "pkg.Helper",
        "pkg.sub.Deep",
        "pkgs.Other",
    ]
    .into_iter()
    .map(TypeIdentifier::from)
    .collect();
    let options = ConfigurationOptions::new().use_host_system_types(false);
    let host = StaticHostTypes::new(["java.lang.Object", "java.lang.String"]);
    let listener = RecordingMessagesListener::new();
    let settings = LogSettings::silent();
    let view = ClasspathView::new(
        &closure,
        vec!["pkg.Listed".to_string(), "[Lpkg.Listed;".to_string()],
        &host,
        &options,
        Reporter::new(&listener, &settings),
    );

    let snapshot = render(&view);
    insta::assert_snapshot!("listing_with_host_substitution", snapshot);
}

fn segment() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["a", "b", "ab", "B", "a$1", "b0"]).prop_map(str::to_string)
}

fn dotted(segments: std::ops::Range<usize>) -> impl Strategy<Value = String> {
    prop::collection::vec(segment(), segments).prop_map(|parts| parts.join("."))
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn listing_returns_exactly_the_package_members(
        names in prop::collection::vec(dotted(1..5), 0..24),
        package in dotted(0..3),
        recursive in any::<bool>(),
    ) {
        let closure: ClosureSet = names.iter().map(|name| TypeIdentifier::new(name.as_str())).collect();
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

        let listed: Vec<String> = view
            .list(&package, recursive)
            .into_iter()
            .map(TypeIdentifier::into_string)
            .collect();
        let mut expected: Vec<String> = names
            .iter()
            .filter(|name| in_package(name, &package, recursive))
            .cloned()
            .collect();
        expected.sort();
        expected.dedup();

        prop_assert_eq!(listed, expected);
    }
}
