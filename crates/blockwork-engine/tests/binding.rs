mod common;

use blockwork_engine::{
    BlockError, BlockEvents, InheritDataAwareIter, Object, Options, TypeRef, Value,
};
use common::{core_factory, log, person_data, person_factory, tagging};
use pretty_assertions::assert_eq;
use rstest::rstest;

#[test]
fn test_person_data_reaches_children() {
    let factory = person_factory();
    let block = factory
        .create("person", person_data("Ann", "Lee"), Options::new())
        .unwrap();

    assert_eq!(block.data().unwrap(), person_data("Ann", "Lee"));
    assert_eq!(block.get("firstName").unwrap().data().unwrap(), Value::from("Ann"));
    assert_eq!(block.get("lastName").unwrap().view_data().unwrap(), Value::from("Lee"));
    assert_eq!(
        block.get("firstName").unwrap().property_path().unwrap().to_string(),
        "[firstName]"
    );
}

#[test]
fn test_object_data_is_read_by_property() {
    let factory = person_factory();
    let person = Object::new("Person")
        .with("firstName", "Ann")
        .with("lastName", "Lee");

    let block = factory
        .create(
            "person",
            Value::Object(person),
            Options::new().with("data_class", "Person"),
        )
        .unwrap();

    let first = block.get("firstName").unwrap();
    assert_eq!(first.property_path().unwrap().to_string(), "firstName");
    assert_eq!(first.data().unwrap(), Value::from("Ann"));
}

#[test]
fn test_view_data_must_match_data_class() {
    let factory = core_factory();

    let err = factory
        .create(
            "block",
            person_data("Ann", "Lee"),
            Options::new().with("data_class", "Person"),
        )
        .unwrap_err();
    assert!(matches!(err, BlockError::Logic(_)));

    let err = factory
        .create("block", Value::Object(Object::new("Person")), Options::new())
        .unwrap_err();
    assert!(matches!(err, BlockError::Logic(_)));
}

#[rstest]
#[case(Value::from(1), "1")]
#[case(Value::from(true), "1")]
#[case(Value::from(2.5), "2.5")]
#[case(Value::from("Ann"), "Ann")]
#[case(Value::Null, "")]
fn test_simple_block_view_data_is_a_string(#[case] data: Value, #[case] expected: &str) {
    let factory = core_factory();
    let block = factory.create("text", data, Options::new()).unwrap();

    assert_eq!(block.view_data().unwrap(), Value::from(expected));
}

#[test]
fn test_scalar_model_data_is_stringified_without_transformers() {
    let factory = core_factory();
    let block = factory.create("text", Value::from(1), Options::new()).unwrap();

    assert_eq!(block.data().unwrap(), Value::from("1"));
}

#[test]
fn test_model_transformers_run_in_order() {
    let factory = core_factory();
    let calls = log();
    let mut builder = factory
        .create_builder("text", Value::Null, Options::new())
        .unwrap();
    builder
        .add_model_transformer(tagging("a", &calls))
        .unwrap()
        .add_model_transformer(tagging("b", &calls))
        .unwrap()
        .prepend_model_transformer(tagging("c", &calls))
        .unwrap()
        .set_auto_initialize(false)
        .unwrap();
    let block = builder.get_block().unwrap();

    block.set_data(Value::from("x")).unwrap();

    assert_eq!(block.data().unwrap(), Value::from("x"));
    assert_eq!(block.norm_data().unwrap(), Value::from("xcab"));
    assert_eq!(block.view_data().unwrap(), Value::from("xcab"));

    block.submit(Value::from("y"), true).unwrap();

    assert_eq!(*calls.borrow(), vec!["b", "a", "c"]);
    assert_eq!(block.data().unwrap(), Value::from("y"));
}

#[test]
fn test_reset_model_transformers() {
    let factory = core_factory();
    let calls = log();
    let mut builder = factory
        .create_builder("text", Value::from(7), Options::new())
        .unwrap();
    builder
        .add_model_transformer(tagging("a", &calls))
        .unwrap()
        .reset_model_transformers()
        .unwrap();

    let block = builder.get_block().unwrap();

    assert_eq!(block.norm_data().unwrap(), Value::from("7"));
}

#[test]
fn test_view_transformer_output_is_kept() {
    let factory = core_factory();
    let calls = log();
    let mut builder = factory
        .create_builder("text", Value::from("x"), Options::new())
        .unwrap();
    builder.add_view_transformer(tagging("!", &calls)).unwrap();

    let block = builder.get_block().unwrap();

    assert_eq!(block.norm_data().unwrap(), Value::from("x"));
    assert_eq!(block.view_data().unwrap(), Value::from("x!"));
}

#[test]
fn test_locked_data_ignores_other_values() {
    let factory = core_factory();
    let block = factory
        .create("text", Value::from("locked"), Options::new())
        .unwrap();

    block.set_data(Value::from("other")).unwrap();

    assert_eq!(block.data().unwrap(), Value::from("locked"));
}

#[test]
fn test_pre_set_data_listener_replaces_data() {
    let factory = core_factory();
    let mut builder = factory
        .create_builder("text", Value::Null, Options::new())
        .unwrap();
    builder
        .add_event_listener(BlockEvents::PreSetData, 0, |event| {
            let upper = event.data().as_str().unwrap_or_default().to_uppercase();
            event.set_data(Value::from(upper));
            Ok(())
        })
        .unwrap()
        .set_auto_initialize(false)
        .unwrap();
    let block = builder.get_block().unwrap();

    block.set_data(Value::from("ann")).unwrap();

    assert_eq!(block.data().unwrap(), Value::from("ANN"));
}

#[test]
fn test_set_data_events_fire_in_order() {
    let factory = core_factory();
    let events = log();
    let mut builder = factory
        .create_builder("text", Value::Null, Options::new())
        .unwrap();
    let pre = events.clone();
    let post = events.clone();
    builder
        .add_event_listener(BlockEvents::PostSetData, 0, move |event| {
            post.borrow_mut().push(format!("post:{}", event.data().describe()));
            Ok(())
        })
        .unwrap()
        .add_event_listener(BlockEvents::PreSetData, 0, move |_| {
            pre.borrow_mut().push("pre".to_string());
            Ok(())
        })
        .unwrap()
        .set_auto_initialize(false)
        .unwrap();
    let block = builder.get_block().unwrap();

    block.set_data(Value::from("x")).unwrap();

    assert_eq!(*events.borrow(), vec!["pre", "post:a(n) string"]);
}

#[rstest]
#[case::unlocked(Value::Null, Value::from("x"))]
#[case::locked(Value::from("seed"), Value::from("seed"))]
fn test_set_data_from_pre_set_data_listener_is_a_cycle(
    #[case] seed: Value,
    #[case] bound: Value,
) {
    let factory = core_factory();
    let mut builder = factory
        .create_builder("text", seed, Options::new())
        .unwrap();
    builder
        .add_event_listener(BlockEvents::PreSetData, 0, |event| {
            event.block().set_data(Value::from("again"))
        })
        .unwrap()
        .set_auto_initialize(false)
        .unwrap();
    let block = builder.get_block().unwrap();

    let err = block.set_data(bound).unwrap_err();
    assert!(matches!(err, BlockError::Runtime(_)));
    assert!(err.to_string().starts_with("A cycle was detected."));
}

#[test]
fn test_reading_data_from_pre_set_data_listener_is_a_cycle() {
    let factory = core_factory();
    let mut builder = factory
        .create_builder("text", Value::Null, Options::new())
        .unwrap();
    builder
        .add_event_listener(BlockEvents::PreSetData, 0, |event| {
            event.block().data().map(|_| ())
        })
        .unwrap()
        .set_auto_initialize(false)
        .unwrap();
    let block = builder.get_block().unwrap();

    let err = block.data().unwrap_err();
    assert!(matches!(err, BlockError::Runtime(_)));
}

fn nested_tree() -> blockwork_engine::Block {
    let factory = core_factory();
    let mut root = factory
        .create_builder("block", Value::Null, Options::new())
        .unwrap();
    let mut group = factory
        .create_named_builder(
            "group",
            "block",
            Value::Null,
            Options::new().with("inherit_data", true),
        )
        .unwrap();
    group
        .add("y1", Some(TypeRef::from("text")), Options::new())
        .unwrap()
        .add("y2", Some(TypeRef::from("text")), Options::new())
        .unwrap();

    root.add("x", Some(TypeRef::from("text")), Options::new())
        .unwrap()
        .add(group, None, Options::new())
        .unwrap()
        .add("z", Some(TypeRef::from("text")), Options::new())
        .unwrap();
    root.get_block().unwrap()
}

#[test]
fn test_inherit_data_children_are_flattened() {
    let root = nested_tree();

    let names: Vec<String> = InheritDataAwareIter::new(root.children())
        .map(|block| block.name().to_string())
        .collect();

    assert_eq!(names, vec!["x", "y1", "y2", "z"]);
}

#[test]
fn test_inherit_data_children_bind_against_ancestor() {
    let root = nested_tree();
    let data = Value::map([
        ("x", Value::from("1")),
        ("y1", Value::from("2")),
        ("y2", Value::from("3")),
        ("z", Value::from("4")),
    ]);

    root.set_data(data.clone()).unwrap();

    let group = root.get("group").unwrap();
    assert_eq!(group.data().unwrap(), data);
    assert_eq!(group.get("y2").unwrap().data().unwrap(), Value::from("3"));
    assert_eq!(root.get("z").unwrap().data().unwrap(), Value::from("4"));
}

#[test]
fn test_inherit_data_block_rejects_set_data() {
    let root = nested_tree();

    let err = root.get("group").unwrap().set_data(Value::Null).unwrap_err();
    assert!(matches!(err, BlockError::Runtime(_)));
}

#[test]
fn test_orphan_inherit_data_block_has_no_data() {
    let factory = core_factory();
    let block = factory
        .create("block", Value::Null, Options::new().with("inherit_data", true))
        .unwrap();

    let err = block.data().unwrap_err();
    assert!(matches!(err, BlockError::Runtime(_)));
}

#[test]
fn test_child_added_after_binding_receives_its_slice() {
    let factory = core_factory();
    let root = factory
        .create(
            "block",
            Value::map([("title", Value::from("Hello"))]),
            Options::new(),
        )
        .unwrap();

    let title = root
        .add_new("title", Some(TypeRef::from("text")), Options::new())
        .unwrap();

    assert_eq!(title.parent(), Some(root.clone()));
    assert_eq!(title.view_data().unwrap(), Value::from("Hello"));
}

#[test]
fn test_unmapped_child_keeps_its_own_data() {
    let factory = core_factory();
    let root = factory
        .create(
            "block",
            Value::map([("title", Value::from("Hello"))]),
            Options::new(),
        )
        .unwrap();

    let title = root
        .add_new(
            "title",
            Some(TypeRef::from("text")),
            Options::new().with("mapped", false),
        )
        .unwrap();

    assert_eq!(title.data().unwrap(), Value::Null);
}

#[test]
fn test_add_rejects_invalid_children() {
    let factory = core_factory();
    let detached = || Options::new().with("auto_initialize", false);
    let root = factory.create("block", Value::Null, detached()).unwrap();

    let text = factory.create("text", Value::Null, detached()).unwrap();
    let err = text
        .add(factory.create_named("a", "text", Value::Null, detached()).unwrap())
        .unwrap_err();
    assert!(matches!(err, BlockError::Logic(_)));

    let initialized = factory.create("text", Value::Null, Options::new()).unwrap();
    let err = root.add(initialized).unwrap_err();
    assert!(matches!(err, BlockError::Runtime(_)));

    let unnamed = factory.create_named("", "text", Value::Null, detached()).unwrap();
    let err = root.add(unnamed).unwrap_err();
    assert!(matches!(err, BlockError::Logic(_)));

    let child = factory.create_named("child", "block", Value::Null, detached()).unwrap();
    root.add(child.clone()).unwrap();
    let err = child.add(root.clone()).unwrap_err();
    assert!(matches!(err, BlockError::Logic(_)));

    let other = factory.create("block", Value::Null, detached()).unwrap();
    let err = other.add(child).unwrap_err();
    assert!(matches!(err, BlockError::Logic(_)));
}

#[test]
fn test_remove_detaches_child() {
    let factory = core_factory();
    let root = factory.create("block", Value::Null, Options::new()).unwrap();
    let title = root
        .add_new("title", Some(TypeRef::from("text")), Options::new())
        .unwrap();

    root.remove("title").unwrap().remove("never_added").unwrap();

    assert!(!root.has("title"));
    assert!(title.parent().is_none());
    assert!(matches!(
        root.get("title").unwrap_err(),
        BlockError::InvalidArgument(_)
    ));
}

#[test]
fn test_only_roots_initialize() {
    let factory = person_factory();
    let block = factory
        .create("person", person_data("Ann", "Lee"), Options::new())
        .unwrap();

    let err = block.get("firstName").unwrap().initialize().unwrap_err();
    assert!(matches!(err, BlockError::Runtime(_)));
    assert!(block.initialize().is_ok());
    assert_eq!(block.get("firstName").unwrap().root(), block);
}
