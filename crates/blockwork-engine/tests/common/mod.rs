// Shared fixtures. Not every test binary uses every helper.
#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use blockwork_engine::{
    BlockBuilder, BlockError, BlockFactory, BlockFactoryBuilder, BlockType, CallbackTransformer,
    Options, Parent, TypeRef, Value,
};

/// A compound type with two text children.
pub struct PersonType;

impl BlockType for PersonType {
    fn name(&self) -> &str {
        "person"
    }

    fn parent(&self) -> Option<Parent> {
        Some(Parent::from("block"))
    }

    fn build_block(&self, builder: &mut BlockBuilder, _options: &Options) -> Result<(), BlockError> {
        builder
            .add("firstName", Some(TypeRef::from("text")), Options::new())?
            .add("lastName", Some(TypeRef::from("text")), Options::new())?;
        Ok(())
    }
}

pub fn core_factory() -> BlockFactory {
    BlockFactoryBuilder::new().with_core().build().unwrap()
}

pub fn person_factory() -> BlockFactory {
    BlockFactoryBuilder::new()
        .with_core()
        .add_type(Rc::new(PersonType))
        .build()
        .unwrap()
}

pub fn person_data(first: &str, last: &str) -> Value {
    Value::map([("firstName", Value::from(first)), ("lastName", Value::from(last))])
}

pub type Log = Rc<RefCell<Vec<String>>>;

pub fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

/// Appends `tag` to strings going forward and records its name going back.
pub fn tagging(tag: &str, log: &Log) -> Rc<CallbackTransformer> {
    let forward = tag.to_string();
    let backward = tag.to_string();
    let log = Rc::clone(log);

    Rc::new(CallbackTransformer::new(
        move |value| {
            let text = value.coerce_to_string().unwrap_or_default();
            Ok(Value::String(format!("{text}{forward}")))
        },
        move |value| {
            log.borrow_mut().push(backward.clone());
            Ok(value)
        },
    ))
}
