mod common;

use std::rc::Rc;

use blockwork_engine::{
    Block, BlockBuilder, BlockError, BlockFactory, BlockFactoryBuilder, BlockType,
    BlockTypeExtension, Options, Parent, Value,
};
use common::{Log, log};
use pretty_assertions::assert_eq;

fn record(log: &Log, hook: &str, who: &str) -> Result<(), BlockError> {
    log.borrow_mut().push(format!("{hook} {who}"));
    Ok(())
}

/// Records every chained hook it takes part in.
struct SpyType {
    name: &'static str,
    parent: &'static str,
    log: Log,
}

impl BlockType for SpyType {
    fn name(&self) -> &str {
        self.name
    }

    fn parent(&self) -> Option<Parent> {
        Some(Parent::from(self.parent))
    }

    fn build_block(&self, _builder: &mut BlockBuilder, _options: &Options) -> Result<(), BlockError> {
        record(&self.log, "build_block", self.name)
    }

    fn finish_block(&self, _builder: &mut BlockBuilder, _options: &Options) -> Result<(), BlockError> {
        record(&self.log, "finish_block", self.name)
    }

    fn add_parent(&self, _parent: &Block, _block: &Block, _options: &Options) -> Result<(), BlockError> {
        record(&self.log, "add_parent", self.name)
    }

    fn remove_parent(&self, _parent: &Block, _block: &Block, _options: &Options) -> Result<(), BlockError> {
        record(&self.log, "remove_parent", self.name)
    }

    fn add_child(&self, _child: &Block, _block: &Block, _options: &Options) -> Result<(), BlockError> {
        record(&self.log, "add_child", self.name)
    }

    fn remove_child(&self, _child: &Block, _block: &Block, _options: &Options) -> Result<(), BlockError> {
        record(&self.log, "remove_child", self.name)
    }
}

struct SpyExtension {
    name: &'static str,
    log: Log,
}

impl BlockTypeExtension for SpyExtension {
    fn extended_types(&self) -> Vec<String> {
        vec!["leaf".to_string()]
    }

    fn build_block(&self, _builder: &mut BlockBuilder, _options: &Options) -> Result<(), BlockError> {
        record(&self.log, "build_block", self.name)
    }

    fn finish_block(&self, _builder: &mut BlockBuilder, _options: &Options) -> Result<(), BlockError> {
        record(&self.log, "finish_block", self.name)
    }

    fn add_parent(&self, _parent: &Block, _block: &Block, _options: &Options) -> Result<(), BlockError> {
        record(&self.log, "add_parent", self.name)
    }

    fn remove_parent(&self, _parent: &Block, _block: &Block, _options: &Options) -> Result<(), BlockError> {
        record(&self.log, "remove_parent", self.name)
    }

    fn add_child(&self, _child: &Block, _block: &Block, _options: &Options) -> Result<(), BlockError> {
        record(&self.log, "add_child", self.name)
    }

    fn remove_child(&self, _child: &Block, _block: &Block, _options: &Options) -> Result<(), BlockError> {
        record(&self.log, "remove_child", self.name)
    }
}

/// `block` > `base` > `leaf`, with two extensions on `leaf`.
fn spy_factory(log: &Log) -> BlockFactory {
    BlockFactoryBuilder::new()
        .with_core()
        .add_type(Rc::new(SpyType {
            name: "base",
            parent: "block",
            log: Rc::clone(log),
        }))
        .add_type(Rc::new(SpyType {
            name: "leaf",
            parent: "base",
            log: Rc::clone(log),
        }))
        .add_type_extension(Rc::new(SpyExtension {
            name: "first_extension",
            log: Rc::clone(log),
        }))
        .add_type_extension(Rc::new(SpyExtension {
            name: "second_extension",
            log: Rc::clone(log),
        }))
        .build()
        .unwrap()
}

fn chain(hook: &str) -> Vec<String> {
    ["base", "leaf", "first_extension", "second_extension"]
        .iter()
        .map(|who| format!("{hook} {who}"))
        .collect()
}

fn take(log: &Log) -> Vec<String> {
    std::mem::take(&mut *log.borrow_mut())
}

#[test]
fn test_build_hooks_run_parent_first_then_extensions() {
    let calls = log();
    let factory = spy_factory(&calls);

    factory.create("leaf", Value::Null, Options::new()).unwrap();

    let mut expected = chain("build_block");
    expected.extend(chain("finish_block"));
    assert_eq!(take(&calls), expected);
}

#[test]
fn test_attach_hooks_run_parent_first_then_extensions() {
    let calls = log();
    let factory = spy_factory(&calls);
    let root = factory.create("leaf", Value::Null, Options::new()).unwrap();
    let child = factory
        .create_named(
            "child",
            "leaf",
            Value::Null,
            Options::new().with("auto_initialize", false),
        )
        .unwrap();
    take(&calls);

    root.add(child.clone()).unwrap();

    let mut expected = chain("add_child");
    expected.extend(chain("add_parent"));
    assert_eq!(take(&calls), expected);

    root.remove("child").unwrap();

    let mut expected = chain("remove_child");
    expected.extend(chain("remove_parent"));
    assert_eq!(take(&calls), expected);
}

/// Only accepts children that are text blocks.
struct TextListType;

impl BlockType for TextListType {
    fn name(&self) -> &str {
        "text_list"
    }

    fn parent(&self) -> Option<Parent> {
        Some(Parent::from("block"))
    }

    fn add_child(&self, child: &Block, _block: &Block, _options: &Options) -> Result<(), BlockError> {
        if child.config().block_type().is_type_of("text") {
            return Ok(());
        }
        Err(BlockError::Logic(format!(
            "The block \"{}\" only accepts text children.",
            child.name()
        )))
    }
}

#[test]
fn test_type_can_reject_children() {
    let factory = BlockFactoryBuilder::new()
        .with_core()
        .add_type(Rc::new(TextListType))
        .build()
        .unwrap();
    let root = factory
        .create("text_list", Value::Null, Options::new())
        .unwrap();
    let detached = Options::new().with("auto_initialize", false);
    let text = factory
        .create_named("a", "text", Value::Null, detached.clone())
        .unwrap();
    let nested = factory
        .create_named("b", "block", Value::Null, detached)
        .unwrap();

    root.add(text).unwrap();
    let err = root.add(nested.clone()).unwrap_err();

    assert!(matches!(err, BlockError::Logic(_)));
    assert_eq!(root.child_names(), vec!["a"]);
    assert!(nested.parent().is_none());
}
