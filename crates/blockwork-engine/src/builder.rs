//! Mutable construction-time blocks.
//!
//! A [`BlockBuilder`] holds named children, some of which may still be
//! deferred (a name plus the type and options to create it with). Deferred
//! children are only turned into builders when somebody looks at them or when
//! the builder is sealed by [`BlockBuilder::get_block`].

use std::fmt;
use std::rc::Rc;
use std::sync::LazyLock;

use indexmap::IndexMap;
use log::trace;
use regex::Regex;

use crate::block::Block;
use crate::config::BlockConfig;
use crate::error::BlockError;
use crate::events::{BlockEvent, BlockEvents, EventDispatcher, EventSubscriber};
use crate::factory::BlockFactory;
use crate::mapper::DataMapper;
use crate::options::Options;
use crate::transformer::{DataTransformer, TransformerChain};
use crate::types::{BlockType, ResolvedBlockType};
use crate::value::{PropertyPath, Value};

static BLOCK_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9_][a-zA-Z0-9_\-:]*$").expect("block name pattern is valid")
});

/// A child passed to [`BlockBuilder::add`].
pub enum ChildRef {
    Name(String),
    Builder(Box<BlockBuilder>),
}

impl From<&str> for ChildRef {
    fn from(name: &str) -> Self {
        ChildRef::Name(name.to_string())
    }
}

impl From<String> for ChildRef {
    fn from(name: String) -> Self {
        ChildRef::Name(name)
    }
}

impl From<BlockBuilder> for ChildRef {
    fn from(builder: BlockBuilder) -> Self {
        ChildRef::Builder(Box::new(builder))
    }
}

/// A type given by registry name or as an instance.
#[derive(Clone)]
pub enum TypeRef {
    Name(String),
    Type(Rc<dyn BlockType>),
}

impl From<&str> for TypeRef {
    fn from(name: &str) -> Self {
        TypeRef::Name(name.to_string())
    }
}

impl From<String> for TypeRef {
    fn from(name: String) -> Self {
        TypeRef::Name(name)
    }
}

impl From<Rc<dyn BlockType>> for TypeRef {
    fn from(block_type: Rc<dyn BlockType>) -> Self {
        TypeRef::Type(block_type)
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Name(name) => write!(f, "{name}"),
            TypeRef::Type(block_type) => write!(f, "{} (instance)", block_type.name()),
        }
    }
}

enum ChildSlot {
    Resolved(Box<BlockBuilder>),
    Deferred {
        type_ref: Option<TypeRef>,
        options: Options,
    },
}

pub struct BlockBuilder {
    name: String,
    data_class: Option<String>,
    factory: BlockFactory,
    options: Options,
    block_type: Rc<ResolvedBlockType>,
    dispatcher: EventDispatcher,
    children: IndexMap<String, ChildSlot>,
    model_transformers: TransformerChain,
    view_transformers: TransformerChain,
    attributes: IndexMap<String, Value>,
    data_mapper: Option<Rc<dyn DataMapper>>,
    mapped: bool,
    inherit_data: bool,
    compound: bool,
    auto_initialize: bool,
    data_locked: bool,
    property_path: Option<PropertyPath>,
    empty_data: Value,
    data: Value,
    locked: bool,
}

impl BlockBuilder {
    pub fn new(
        name: &str,
        data_class: Option<String>,
        factory: BlockFactory,
        options: Options,
        block_type: Rc<ResolvedBlockType>,
    ) -> Result<Self, BlockError> {
        validate_name(name)?;

        Ok(Self {
            name: name.to_string(),
            data_class,
            factory,
            options,
            block_type,
            dispatcher: EventDispatcher::new(),
            children: IndexMap::new(),
            model_transformers: TransformerChain::default(),
            view_transformers: TransformerChain::default(),
            attributes: IndexMap::new(),
            data_mapper: None,
            mapped: true,
            inherit_data: false,
            compound: false,
            auto_initialize: true,
            data_locked: false,
            property_path: None,
            empty_data: Value::Null,
            data: Value::Null,
            locked: false,
        })
    }

    /// Register a child. A name is stored unresolved until the child is needed.
    pub fn add(
        &mut self,
        child: impl Into<ChildRef>,
        type_ref: Option<TypeRef>,
        options: Options,
    ) -> Result<&mut Self, BlockError> {
        self.ensure_unlocked()?;

        match child.into() {
            ChildRef::Builder(builder) => {
                let name = builder.name.clone();
                self.children.insert(name, ChildSlot::Resolved(builder));
            }
            ChildRef::Name(name) => {
                self.children
                    .insert(name, ChildSlot::Deferred { type_ref, options });
            }
        }

        Ok(self)
    }

    /// Create a builder the way `add` would, without registering it.
    pub fn create(
        &self,
        name: &str,
        type_ref: Option<TypeRef>,
        options: Options,
    ) -> Result<BlockBuilder, BlockError> {
        self.ensure_unlocked()?;
        self.create_child(name, type_ref, options)
    }

    pub fn get(&mut self, name: &str) -> Result<&mut BlockBuilder, BlockError> {
        self.ensure_unlocked()?;
        if !self.children.contains_key(name) {
            return Err(BlockError::InvalidArgument(format!(
                "The child with the name \"{name}\" does not exist."
            )));
        }
        self.resolve_child(name)
    }

    pub fn remove(&mut self, name: &str) -> Result<&mut Self, BlockError> {
        self.ensure_unlocked()?;
        self.children.shift_remove(name);
        Ok(self)
    }

    pub fn has(&self, name: &str) -> Result<bool, BlockError> {
        self.ensure_unlocked()?;
        Ok(self.children.contains_key(name))
    }

    /// Every child, resolved, in the order it was added.
    pub fn all(&mut self) -> Result<Vec<&BlockBuilder>, BlockError> {
        self.ensure_unlocked()?;
        self.resolve_children()?;

        Ok(self
            .children
            .values()
            .filter_map(|slot| match slot {
                ChildSlot::Resolved(builder) => Some(builder.as_ref()),
                ChildSlot::Deferred { .. } => None,
            })
            .collect())
    }

    pub fn count(&self) -> Result<usize, BlockError> {
        self.ensure_unlocked()?;
        Ok(self.children.len())
    }

    pub fn iter(&mut self) -> Result<impl Iterator<Item = &BlockBuilder>, BlockError> {
        Ok(self.all()?.into_iter())
    }

    pub fn add_event_listener<F>(
        &mut self,
        event: BlockEvents,
        priority: i32,
        listener: F,
    ) -> Result<&mut Self, BlockError>
    where
        F: Fn(&mut BlockEvent) -> Result<(), BlockError> + 'static,
    {
        self.ensure_unlocked()?;
        self.dispatcher.add_listener(event, priority, listener);
        Ok(self)
    }

    pub fn add_event_subscriber(
        &mut self,
        subscriber: Rc<dyn EventSubscriber>,
    ) -> Result<&mut Self, BlockError> {
        self.ensure_unlocked()?;
        self.dispatcher.add_subscriber(subscriber);
        Ok(self)
    }

    pub fn add_model_transformer(
        &mut self,
        transformer: Rc<dyn DataTransformer>,
    ) -> Result<&mut Self, BlockError> {
        self.ensure_unlocked()?;
        self.model_transformers.push(transformer);
        Ok(self)
    }

    pub fn prepend_model_transformer(
        &mut self,
        transformer: Rc<dyn DataTransformer>,
    ) -> Result<&mut Self, BlockError> {
        self.ensure_unlocked()?;
        self.model_transformers.prepend(transformer);
        Ok(self)
    }

    pub fn reset_model_transformers(&mut self) -> Result<&mut Self, BlockError> {
        self.ensure_unlocked()?;
        self.model_transformers.clear();
        Ok(self)
    }

    pub fn add_view_transformer(
        &mut self,
        transformer: Rc<dyn DataTransformer>,
    ) -> Result<&mut Self, BlockError> {
        self.ensure_unlocked()?;
        self.view_transformers.push(transformer);
        Ok(self)
    }

    pub fn prepend_view_transformer(
        &mut self,
        transformer: Rc<dyn DataTransformer>,
    ) -> Result<&mut Self, BlockError> {
        self.ensure_unlocked()?;
        self.view_transformers.prepend(transformer);
        Ok(self)
    }

    pub fn reset_view_transformers(&mut self) -> Result<&mut Self, BlockError> {
        self.ensure_unlocked()?;
        self.view_transformers.clear();
        Ok(self)
    }

    pub fn set_attribute(
        &mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<&mut Self, BlockError> {
        self.ensure_unlocked()?;
        self.attributes.insert(name.into(), value.into());
        Ok(self)
    }

    pub fn set_data_mapper(
        &mut self,
        data_mapper: Option<Rc<dyn DataMapper>>,
    ) -> Result<&mut Self, BlockError> {
        self.ensure_unlocked()?;
        self.data_mapper = data_mapper;
        Ok(self)
    }

    pub fn set_mapped(&mut self, mapped: bool) -> Result<&mut Self, BlockError> {
        self.ensure_unlocked()?;
        self.mapped = mapped;
        Ok(self)
    }

    pub fn set_inherit_data(&mut self, inherit_data: bool) -> Result<&mut Self, BlockError> {
        self.ensure_unlocked()?;
        self.inherit_data = inherit_data;
        Ok(self)
    }

    pub fn set_compound(&mut self, compound: bool) -> Result<&mut Self, BlockError> {
        self.ensure_unlocked()?;
        self.compound = compound;
        Ok(self)
    }

    pub fn set_auto_initialize(&mut self, auto_initialize: bool) -> Result<&mut Self, BlockError> {
        self.ensure_unlocked()?;
        self.auto_initialize = auto_initialize;
        Ok(self)
    }

    pub fn set_data_locked(&mut self, data_locked: bool) -> Result<&mut Self, BlockError> {
        self.ensure_unlocked()?;
        self.data_locked = data_locked;
        Ok(self)
    }

    pub fn set_property_path(
        &mut self,
        property_path: Option<PropertyPath>,
    ) -> Result<&mut Self, BlockError> {
        self.ensure_unlocked()?;
        self.property_path = property_path;
        Ok(self)
    }

    pub fn set_empty_data(&mut self, empty_data: Value) -> Result<&mut Self, BlockError> {
        self.ensure_unlocked()?;
        self.empty_data = empty_data;
        Ok(self)
    }

    pub fn set_data(&mut self, data: Value) -> Result<&mut Self, BlockError> {
        self.ensure_unlocked()?;
        self.data = data;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_class(&self) -> Option<&str> {
        self.data_class.as_deref()
    }

    pub fn factory(&self) -> &BlockFactory {
        &self.factory
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn block_type(&self) -> &Rc<ResolvedBlockType> {
        &self.block_type
    }

    pub fn compound(&self) -> bool {
        self.compound
    }

    pub fn inherit_data(&self) -> bool {
        self.inherit_data
    }

    pub fn mapped(&self) -> bool {
        self.mapped
    }

    pub fn auto_initialize(&self) -> bool {
        self.auto_initialize
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Seal the builder and return its configuration. Children are dropped.
    pub fn get_block_config(&mut self) -> Result<BlockConfig, BlockError> {
        self.ensure_unlocked()?;
        self.locked = true;
        Ok(self.snapshot())
    }

    /// Seal the builder and turn it, and every child, into a block tree.
    pub fn get_block(&mut self) -> Result<Block, BlockError> {
        self.ensure_unlocked()?;
        self.resolve_children()?;

        let children = std::mem::take(&mut self.children);
        self.locked = true;
        trace!("Sealing block builder \"{}\" ({} children)", self.name, children.len());

        let block = Block::new(self.snapshot())?;

        for (_, slot) in children {
            if let ChildSlot::Resolved(mut child) = slot {
                // Only roots initialize themselves
                child.auto_initialize = false;
                block.add(child.get_block()?)?;
            }
        }

        if block.config().auto_initialize() {
            block.initialize()?;
        }

        Ok(block)
    }

    fn snapshot(&self) -> BlockConfig {
        BlockConfig {
            name: self.name.clone(),
            data_class: self.data_class.clone(),
            factory: self.factory.clone(),
            options: self.options.clone(),
            block_type: Rc::clone(&self.block_type),
            dispatcher: self.dispatcher.clone(),
            model_transformers: self.model_transformers.clone(),
            view_transformers: self.view_transformers.clone(),
            attributes: self.attributes.clone(),
            data_mapper: self.data_mapper.clone(),
            mapped: self.mapped,
            inherit_data: self.inherit_data,
            compound: self.compound,
            auto_initialize: self.auto_initialize,
            data_locked: self.data_locked,
            property_path: self.property_path.clone(),
            empty_data: self.empty_data.clone(),
            data: self.data.clone(),
        }
    }

    fn ensure_unlocked(&self) -> Result<(), BlockError> {
        if self.locked {
            return Err(BlockError::sealed());
        }
        Ok(())
    }

    fn resolve_children(&mut self) -> Result<(), BlockError> {
        let deferred: Vec<String> = self
            .children
            .iter()
            .filter(|(_, slot)| matches!(slot, ChildSlot::Deferred { .. }))
            .map(|(name, _)| name.clone())
            .collect();

        for name in deferred {
            self.resolve_child(&name)?;
        }
        Ok(())
    }

    fn resolve_child(&mut self, name: &str) -> Result<&mut BlockBuilder, BlockError> {
        if let Some(ChildSlot::Deferred { type_ref, options }) = self.children.get(name) {
            let builder = self.create_child(name, type_ref.clone(), options.clone())?;
            // Replacing the value keeps the slot at its original position
            self.children
                .insert(name.to_string(), ChildSlot::Resolved(Box::new(builder)));
        }

        match self.children.get_mut(name) {
            Some(ChildSlot::Resolved(builder)) => Ok(&mut **builder),
            _ => Err(BlockError::InvalidArgument(format!(
                "The child with the name \"{name}\" does not exist."
            ))),
        }
    }

    fn create_child(
        &self,
        name: &str,
        type_ref: Option<TypeRef>,
        options: Options,
    ) -> Result<BlockBuilder, BlockError> {
        match (type_ref, &self.data_class) {
            (Some(type_ref), _) => {
                self.factory
                    .create_named_builder(name, type_ref, Value::Null, options)
            }
            (None, Some(data_class)) => {
                self.factory
                    .create_builder_for_property(data_class, name, Value::Null, options)
            }
            (None, None) => {
                let fallback = self.factory.fallback_type().to_string();
                self.factory
                    .create_named_builder(name, TypeRef::Name(fallback), Value::Null, options)
            }
        }
    }
}

fn validate_name(name: &str) -> Result<(), BlockError> {
    if !name.is_empty() && !BLOCK_NAME.is_match(name) {
        return Err(BlockError::InvalidArgument(format!(
            "The name \"{name}\" contains illegal characters. Names should start with a letter, digit or underscore and only contain letters, digits, numbers, underscores (\"_\"), hyphens (\"-\") and colons (\":\")."
        )));
    }
    Ok(())
}

impl fmt::Debug for BlockBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockBuilder")
            .field("name", &self.name)
            .field("type", &self.block_type.name())
            .field("children", &self.children.keys().collect::<Vec<_>>())
            .field("locked", &self.locked)
            .finish()
    }
}
