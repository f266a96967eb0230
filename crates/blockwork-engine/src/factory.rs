//! Entry point for creating builders and blocks.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use blockwork_config::Config;
use indexmap::IndexMap;
use log::debug;

use crate::block::Block;
use crate::builder::{BlockBuilder, TypeRef};
use crate::builtin::CoreExtension;
use crate::declared::DeclaredExtension;
use crate::error::BlockError;
use crate::options::Options;
use crate::types::{
    BlockExtension, BlockType, BlockTypeExtension, DefaultResolvedTypeFactory, PreloadedExtension,
    Registry, ResolvedBlockType, ResolvedTypeFactory, TypeGuess, TypeGuesser, TypeGuesserChain,
};
use crate::value::Value;

pub const DEFAULT_FALLBACK_TYPE: &str = "text";

type GuessCache = HashMap<(String, String), Option<TypeGuess>>;

/// Cheap to clone; every clone shares the registry and the guess cache.
#[derive(Clone)]
pub struct BlockFactory(Rc<FactoryInner>);

struct FactoryInner {
    registry: Registry,
    fallback_type: String,
    guesses: RefCell<GuessCache>,
}

impl BlockFactory {
    pub fn new(registry: Registry) -> Self {
        Self::with_fallback_type(registry, DEFAULT_FALLBACK_TYPE)
    }

    pub fn with_fallback_type(registry: Registry, fallback_type: impl Into<String>) -> Self {
        Self(Rc::new(FactoryInner {
            registry,
            fallback_type: fallback_type.into(),
            guesses: RefCell::default(),
        }))
    }

    /// The core types plus every type declared in `config`.
    pub fn from_config(config: &Config) -> Result<Self, BlockError> {
        BlockFactoryBuilder::new()
            .with_core()
            .add_extension(DeclaredExtension::from_config(config)?)
            .set_fallback_type(&config.engine.fallback_type)
            .build()
    }

    pub fn registry(&self) -> &Registry {
        &self.0.registry
    }

    /// Type used for children without a type when nothing better is known.
    pub fn fallback_type(&self) -> &str {
        &self.0.fallback_type
    }

    pub fn create(
        &self,
        type_ref: impl Into<TypeRef>,
        data: Value,
        options: Options,
    ) -> Result<Block, BlockError> {
        self.create_builder(type_ref, data, options)?.get_block()
    }

    pub fn create_named(
        &self,
        name: &str,
        type_ref: impl Into<TypeRef>,
        data: Value,
        options: Options,
    ) -> Result<Block, BlockError> {
        self.create_named_builder(name, type_ref, data, options)?
            .get_block()
    }

    pub fn create_for_property(
        &self,
        class: &str,
        property: &str,
        data: Value,
        options: Options,
    ) -> Result<Block, BlockError> {
        self.create_builder_for_property(class, property, data, options)?
            .get_block()
    }

    /// A builder named after the type's block prefix.
    pub fn create_builder(
        &self,
        type_ref: impl Into<TypeRef>,
        data: Value,
        options: Options,
    ) -> Result<BlockBuilder, BlockError> {
        let resolved = self.resolve(type_ref.into())?;
        let name = resolved.block_prefix();
        self.build(&resolved, &name, data, options)
    }

    pub fn create_named_builder(
        &self,
        name: &str,
        type_ref: impl Into<TypeRef>,
        data: Value,
        options: Options,
    ) -> Result<BlockBuilder, BlockError> {
        let resolved = self.resolve(type_ref.into())?;
        self.build(&resolved, name, data, options)
    }

    /// A builder whose type is guessed from a property of a data class. Caller
    /// options win over guessed ones; without a guess the fallback type is used.
    pub fn create_builder_for_property(
        &self,
        class: &str,
        property: &str,
        data: Value,
        options: Options,
    ) -> Result<BlockBuilder, BlockError> {
        let Some(guess) = self.guess(class, property) else {
            let fallback = TypeRef::Name(self.fallback_type().to_string());
            return self.create_named_builder(property, fallback, data, options);
        };

        let mut merged = guess.options;
        merged.merge(options);
        self.create_named_builder(property, TypeRef::Name(guess.type_name), data, merged)
    }

    fn guess(&self, class: &str, property: &str) -> Option<TypeGuess> {
        let key = (class.to_string(), property.to_string());
        if let Some(cached) = self.0.guesses.borrow().get(&key) {
            return cached.clone();
        }

        let guess = self
            .registry()
            .type_guesser()
            .and_then(|guesser| guesser.guess_type(class, property));
        self.0.guesses.borrow_mut().insert(key, guess.clone());
        guess
    }

    fn resolve(&self, type_ref: TypeRef) -> Result<Rc<ResolvedBlockType>, BlockError> {
        match type_ref {
            TypeRef::Name(name) => self.registry().get_type(&name),
            TypeRef::Type(block_type) => self.registry().resolve_instance(block_type),
        }
    }

    fn build(
        &self,
        resolved: &Rc<ResolvedBlockType>,
        name: &str,
        data: Value,
        mut options: Options,
    ) -> Result<BlockBuilder, BlockError> {
        if !data.is_null() && !options.contains("data") {
            options.insert("data", data);
        }

        let mut builder = resolved.create_builder(self, name, options)?;
        let resolved_options = builder.options().clone();
        resolved.build_block(&mut builder, &resolved_options)?;
        resolved.finish_block(&mut builder, &resolved_options)?;

        debug!("Created builder \"{name}\" of type \"{}\"", resolved.name());
        Ok(builder)
    }
}

impl fmt::Debug for BlockFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockFactory")
            .field("registry", &self.0.registry)
            .field("fallback_type", &self.0.fallback_type)
            .finish()
    }
}

/// Collects extensions and loose types, then builds a [`BlockFactory`].
#[derive(Default)]
pub struct BlockFactoryBuilder {
    extensions: Vec<Box<dyn BlockExtension>>,
    types: Vec<Rc<dyn BlockType>>,
    type_extensions: IndexMap<String, Vec<Rc<dyn BlockTypeExtension>>>,
    guessers: Vec<Rc<dyn TypeGuesser>>,
    resolved_type_factory: Option<Box<dyn ResolvedTypeFactory>>,
    fallback_type: Option<String>,
}

impl BlockFactoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the `block`, `text` and `collection` types.
    pub fn with_core(self) -> Self {
        self.add_extension(CoreExtension)
    }

    pub fn add_extension(mut self, extension: impl BlockExtension + 'static) -> Self {
        self.extensions.push(Box::new(extension));
        self
    }

    pub fn add_type(mut self, block_type: Rc<dyn BlockType>) -> Self {
        self.types.push(block_type);
        self
    }

    /// Register `extension` for every type it extends.
    pub fn add_type_extension(mut self, extension: Rc<dyn BlockTypeExtension>) -> Self {
        for name in extension.extended_types() {
            self.type_extensions
                .entry(name)
                .or_default()
                .push(Rc::clone(&extension));
        }
        self
    }

    pub fn add_type_guesser(mut self, guesser: Rc<dyn TypeGuesser>) -> Self {
        self.guessers.push(guesser);
        self
    }

    pub fn set_resolved_type_factory(mut self, factory: impl ResolvedTypeFactory + 'static) -> Self {
        self.resolved_type_factory = Some(Box::new(factory));
        self
    }

    pub fn set_fallback_type(mut self, name: &str) -> Self {
        self.fallback_type = Some(name.to_string());
        self
    }

    pub fn build(self) -> Result<BlockFactory, BlockError> {
        let mut extensions = self.extensions;

        if !self.types.is_empty() || !self.type_extensions.is_empty() || !self.guessers.is_empty() {
            let guesser: Option<Rc<dyn TypeGuesser>> = match self.guessers.len() {
                0 => None,
                1 => self.guessers.into_iter().next(),
                _ => Some(Rc::new(TypeGuesserChain::new(self.guessers))),
            };
            extensions.push(Box::new(PreloadedExtension::new(
                self.types,
                self.type_extensions,
                guesser,
            )));
        }

        let resolved_type_factory = self
            .resolved_type_factory
            .unwrap_or_else(|| Box::new(DefaultResolvedTypeFactory));
        let registry = Registry::new(extensions, resolved_type_factory)?;

        Ok(BlockFactory::with_fallback_type(
            registry,
            self.fallback_type
                .unwrap_or_else(|| DEFAULT_FALLBACK_TYPE.to_string()),
        ))
    }
}
