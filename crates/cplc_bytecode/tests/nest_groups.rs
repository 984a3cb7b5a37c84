use cplc_api::{BytecodeBlob, ClassesProvider, InMemoryClassesProvider, TypeIdentifier};
use cplc_bytecode::fixture::ClassFileBuilder;
use cplc_bytecode::{full_nest_group, nest};

/// `pkg.Shape` with a member tree two levels deep and one anonymous class.
fn shapes() -> InMemoryClassesProvider {
    let shape = ClassFileBuilder::new("pkg/Shape")
        .inner_class("pkg/Shape$Circle", Some("pkg/Shape"), Some("Circle"), 0)
        .inner_class("pkg/Shape$Square", Some("pkg/Shape"), Some("Square"), 0)
        .inner_class("pkg/Shape$1", None, None, 0);
    let circle = ClassFileBuilder::new("pkg/Shape$Circle")
        .member_of("pkg/Shape")
        .inner_class("pkg/Shape$Circle$Arc", Some("pkg/Shape$Circle"), Some("Arc"), 0);
    let square = ClassFileBuilder::new("pkg/Shape$Square").member_of("pkg/Shape");
    let arc = ClassFileBuilder::new("pkg/Shape$Circle$Arc")
        .member_of("pkg/Shape$Circle")
        .inner_class("pkg/Shape$Circle", Some("pkg/Shape"), Some("Circle"), 0);
    let anonymous = ClassFileBuilder::new("pkg/Shape$1")
        .inner_class("pkg/Shape$1", None, None, 0)
        .enclosing_method("pkg/Shape", Some(("area", "()D")));

    InMemoryClassesProvider::from_blobs(
        [
            ("pkg.Shape", shape),
            ("pkg.Shape$Circle", circle),
            ("pkg.Shape$Square", square),
            ("pkg.Shape$Circle$Arc", arc),
            ("pkg.Shape$1", anonymous),
        ]
        .into_iter()
        .map(|(name, builder)| BytecodeBlob::new(name, builder.build())),
    )
}

fn fetch(provider: &InMemoryClassesProvider, name: &str) -> BytecodeBlob {
    provider
        .get_class(&[TypeIdentifier::new(name)])
        .pop()
        .expect("fixture class")
}

#[test]
fn nest_group_is_idempotent_from_every_member() {
    let provider = shapes();
    let group = full_nest_group(&fetch(&provider, "pkg.Shape$Square"), &provider).expect("group");

    let names: Vec<&str> = group.iter().map(TypeIdentifier::as_str).collect();
    assert_eq!(
        names,
        vec![
            "pkg.Shape",
            "pkg.Shape$1",
            "pkg.Shape$Circle",
            "pkg.Shape$Circle$Arc",
            "pkg.Shape$Square"
        ]
    );

    for member in &group {
        let again = full_nest_group(&fetch(&provider, member.as_str()), &provider).expect("regroup");
        assert_eq!(again, group, "group differs when starting from {member}");
    }
}

#[test]
fn blob_level_helpers_match_parsed_helpers() {
    let provider = shapes();
    let arc = fetch(&provider, "pkg.Shape$Circle$Arc");
    assert_eq!(
        nest::outer_of_blob(&arc).expect("parse"),
        Some(TypeIdentifier::new("pkg.Shape$Circle"))
    );

    let shape = fetch(&provider, "pkg.Shape");
    assert_eq!(nest::outer_of_blob(&shape).expect("parse"), None);
    assert_eq!(nest::direct_nested_of_blob(&shape).expect("parse").len(), 3);
}
