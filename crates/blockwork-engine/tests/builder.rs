mod common;

use std::rc::Rc;

use blockwork_engine::{
    Block, BlockError, BlockEvents, CallbackTransformer, DataMapper, Options, PropertyPath,
    PropertyPathMapper, TypeRef, Value,
};
use common::{core_factory, person_factory};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn is_sealed<T>(result: Result<T, BlockError>) -> bool {
    matches!(result, Err(BlockError::BadMethodCall(_)))
}

#[test]
fn test_children_keep_insertion_order() {
    let factory = core_factory();
    let mut root = factory
        .create_builder("block", Value::Null, Options::new())
        .unwrap();
    let b = factory
        .create_named_builder("b", "text", Value::Null, Options::new())
        .unwrap();

    root.add("a", Some(TypeRef::from("text")), Options::new())
        .unwrap()
        .add(b, None, Options::new())
        .unwrap()
        .add("c", None, Options::new())
        .unwrap();

    let resolved: Vec<String> = root
        .all()
        .unwrap()
        .iter()
        .map(|child| child.name().to_string())
        .collect();
    assert_eq!(resolved, vec!["a", "b", "c"]);

    let block = root.get_block().unwrap();
    assert_eq!(block.child_names(), vec!["a", "b", "c"]);
}

#[test]
fn test_children_are_resolved_lazily() {
    let factory = core_factory();
    let mut root = factory
        .create_builder("block", Value::Null, Options::new())
        .unwrap();

    // An unknown type only fails once the child is needed
    root.add("broken", Some(TypeRef::from("missing")), Options::new())
        .unwrap();
    assert!(root.has("broken").unwrap());
    assert_eq!(root.count().unwrap(), 1);

    let err = root.get("broken").unwrap_err();
    assert!(matches!(err, BlockError::InvalidArgument(_)));
}

#[test]
fn test_untyped_child_uses_fallback_type() {
    let factory = core_factory();
    let mut root = factory
        .create_builder("block", Value::Null, Options::new())
        .unwrap();
    root.add("note", None, Options::new()).unwrap();

    assert_eq!(root.get("note").unwrap().block_type().name(), "text");
}

#[test]
fn test_get_missing_child() {
    let factory = core_factory();
    let mut root = factory
        .create_builder("block", Value::Null, Options::new())
        .unwrap();

    let err = root.get("nope").unwrap_err();
    assert_eq!(
        err.to_string(),
        "The child with the name \"nope\" does not exist."
    );
}

#[test]
fn test_remove_child() {
    let factory = core_factory();
    let mut root = factory
        .create_builder("block", Value::Null, Options::new())
        .unwrap();
    root.add("a", None, Options::new()).unwrap();

    root.remove("a").unwrap().remove("never_added").unwrap();

    assert!(!root.has("a").unwrap());
    assert_eq!(root.count().unwrap(), 0);
}

#[test]
fn test_create_does_not_register() {
    let factory = core_factory();
    let root = factory
        .create_builder("block", Value::Null, Options::new())
        .unwrap();

    let child = root
        .create("title", Some(TypeRef::from("text")), Options::new())
        .unwrap();

    assert_eq!(child.name(), "title");
    assert_eq!(root.count().unwrap(), 0);
}

#[test]
fn test_builder_name_defaults_to_block_prefix() {
    let factory = person_factory();
    let builder = factory
        .create_builder("person", Value::Null, Options::new())
        .unwrap();

    assert_eq!(builder.name(), "person");
    assert!(builder.compound());
}

#[rstest]
#[case::get_block(true)]
#[case::get_block_config(false)]
fn test_sealed_builder_rejects_every_method(#[case] seal_with_get_block: bool) {
    let factory = core_factory();
    let mut builder = factory
        .create_builder("block", Value::Null, Options::new())
        .unwrap();
    if seal_with_get_block {
        builder.get_block().unwrap();
    } else {
        builder.get_block_config().unwrap();
    }

    assert!(builder.is_locked());
    assert!(is_sealed(builder.add("a", None, Options::new())));
    assert!(is_sealed(builder.create("a", None, Options::new())));
    assert!(is_sealed(builder.get("a")));
    assert!(is_sealed(builder.remove("a")));
    assert!(is_sealed(builder.has("a")));
    assert!(is_sealed(builder.all()));
    assert!(is_sealed(builder.count()));
    assert!(is_sealed(builder.iter()));
    assert!(is_sealed(builder.add_event_listener(
        BlockEvents::PreSetData,
        0,
        |_| Ok(())
    )));
    let transformer = Rc::new(CallbackTransformer::new(|value| Ok(value), |value| Ok(value)));
    assert!(is_sealed(builder.add_model_transformer(transformer.clone())));
    assert!(is_sealed(builder.prepend_model_transformer(transformer.clone())));
    assert!(is_sealed(builder.reset_model_transformers()));
    assert!(is_sealed(builder.add_view_transformer(transformer.clone())));
    assert!(is_sealed(builder.prepend_view_transformer(transformer)));
    assert!(is_sealed(builder.reset_view_transformers()));
    assert!(is_sealed(builder.set_attribute("x", 1)));
    assert!(is_sealed(builder.set_data_mapper(None)));
    assert!(is_sealed(builder.set_mapped(false)));
    assert!(is_sealed(builder.set_inherit_data(true)));
    assert!(is_sealed(builder.set_compound(false)));
    assert!(is_sealed(builder.set_auto_initialize(false)));
    assert!(is_sealed(builder.set_data_locked(true)));
    assert!(is_sealed(builder.set_property_path(None)));
    assert!(is_sealed(builder.set_empty_data(Value::Null)));
    assert!(is_sealed(builder.set_data(Value::Null)));
    assert!(is_sealed(builder.get_block_config()));
    assert!(is_sealed(builder.get_block()));
}

#[test]
fn test_get_block_seals_the_builder() {
    let factory = core_factory();
    let mut builder = factory
        .create_builder("text", Value::Null, Options::new())
        .unwrap();

    builder.get_block().unwrap();

    assert!(builder.is_locked());
    assert!(is_sealed(builder.get_block()));
}

#[test]
fn test_config_snapshot_carries_builder_settings() {
    let factory = core_factory();
    let mut builder = factory
        .create_builder("block", Value::Null, Options::new())
        .unwrap();
    builder
        .set_attribute("role", "form")
        .unwrap()
        .set_mapped(false)
        .unwrap()
        .set_property_path(Some(PropertyPath::parse("[person]").unwrap()))
        .unwrap();

    let config = builder.get_block_config().unwrap();

    assert_eq!(config.name(), "block");
    assert_eq!(config.block_type().name(), "block");
    assert_eq!(config.attribute("role"), Some(&Value::from("form")));
    assert!(!config.mapped());
    assert_eq!(config.property_path().map(ToString::to_string).as_deref(), Some("[person]"));
}

#[test]
fn test_compound_block_without_mapper_is_rejected() {
    let factory = core_factory();
    let mut builder = factory
        .create_builder("block", Value::Null, Options::new())
        .unwrap();
    builder.set_data_mapper(None).unwrap();
    let config = builder.get_block_config().unwrap();

    let err = Block::new(config).unwrap_err();
    assert!(matches!(err, BlockError::Logic(_)));
}

#[test]
fn test_unmapped_compound_block_needs_no_mapper() {
    let factory = core_factory();
    let mut builder = factory
        .create_builder("block", Value::Null, Options::new())
        .unwrap();
    builder.set_data_mapper(None).unwrap().set_mapped(false).unwrap();
    let config = builder.get_block_config().unwrap();

    assert!(Block::new(config).is_ok());
}

#[test]
fn test_custom_mapper_is_used() {
    struct Silent;

    impl DataMapper for Silent {
        fn map_data_to_views(&self, _data: &Value, _blocks: &[Block]) -> Result<(), BlockError> {
            Ok(())
        }

        fn map_views_to_data(&self, _blocks: &[Block], _data: &mut Value) -> Result<(), BlockError> {
            Ok(())
        }
    }

    let factory = person_factory();
    let mut builder = factory
        .create_builder("person", common::person_data("Ann", "Lee"), Options::new())
        .unwrap();
    builder.set_data_mapper(Some(Rc::new(Silent))).unwrap();

    let block = builder.get_block().unwrap();

    // The text children never received their slice
    assert_eq!(block.get("firstName").unwrap().data().unwrap(), Value::Null);

    let mut builder = factory
        .create_builder("person", common::person_data("Ann", "Lee"), Options::new())
        .unwrap();
    builder
        .set_data_mapper(Some(Rc::new(PropertyPathMapper)))
        .unwrap();
    let block = builder.get_block().unwrap();
    assert_eq!(
        block.get("firstName").unwrap().data().unwrap(),
        Value::from("Ann")
    );
}
