use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::debug;

use super::{
    BlockExtension, BlockType, Parent, ResolvedBlockType, ResolvedTypeFactory, TypeGuesser,
    TypeGuesserChain,
};
use crate::error::BlockError;

/// Resolves type names into cached resolved chains.
pub struct Registry {
    extensions: Vec<Box<dyn BlockExtension>>,
    resolved_type_factory: Box<dyn ResolvedTypeFactory>,
    types: RefCell<HashMap<String, Rc<ResolvedBlockType>>>,
    resolving: RefCell<Vec<String>>,
    guesser: Option<TypeGuesserChain>,
}

impl Registry {
    pub fn new(
        extensions: Vec<Box<dyn BlockExtension>>,
        resolved_type_factory: Box<dyn ResolvedTypeFactory>,
    ) -> Result<Self, BlockError> {
        for extension in &extensions {
            extension.validate()?;
        }

        let guessers: Vec<_> = extensions
            .iter()
            .filter_map(|extension| extension.type_guesser())
            .collect();
        let guesser = (!guessers.is_empty()).then(|| TypeGuesserChain::new(guessers));

        Ok(Self {
            extensions,
            resolved_type_factory,
            types: RefCell::default(),
            resolving: RefCell::default(),
            guesser,
        })
    }

    /// The resolved chain for `name`, resolving parents first on a cache miss.
    pub fn get_type(&self, name: &str) -> Result<Rc<ResolvedBlockType>, BlockError> {
        if let Some(resolved) = self.types.borrow().get(name) {
            return Ok(Rc::clone(resolved));
        }

        let inner = match self.extensions.iter().find(|e| e.has_type(name)) {
            Some(extension) => extension.get_type(name)?,
            None => {
                return Err(BlockError::InvalidArgument(format!(
                    "Could not load type \"{name}\": no registered extension provides it."
                )));
            }
        };

        if self.resolving.borrow().iter().any(|n| n == name) {
            let chain = self.resolving.borrow().join(" > ");
            return Err(BlockError::Logic(format!(
                "Circular reference detected for block type \"{name}\" ({chain} > {name})."
            )));
        }

        self.resolving.borrow_mut().push(name.to_string());
        let resolved = self.resolve_type(inner);
        self.resolving.borrow_mut().pop();

        let resolved = Rc::new(resolved?);
        debug!("Resolved block type \"{name}\"");
        self.types
            .borrow_mut()
            .insert(name.to_string(), Rc::clone(&resolved));

        Ok(resolved)
    }

    pub fn has_type(&self, name: &str) -> bool {
        if self.types.borrow().contains_key(name) {
            return true;
        }
        self.get_type(name).is_ok()
    }

    /// Resolve a type instance that is not looked up by name. The result is not cached.
    pub fn resolve_instance(
        &self,
        block_type: Rc<dyn BlockType>,
    ) -> Result<Rc<ResolvedBlockType>, BlockError> {
        self.resolve_type(block_type).map(Rc::new)
    }

    pub fn type_guesser(&self) -> Option<&dyn TypeGuesser> {
        self.guesser.as_ref().map(|g| g as &dyn TypeGuesser)
    }

    pub fn extensions(&self) -> &[Box<dyn BlockExtension>] {
        &self.extensions
    }

    fn resolve_type(&self, inner: Rc<dyn BlockType>) -> Result<ResolvedBlockType, BlockError> {
        let parent = match inner.parent() {
            Some(Parent::Name(parent)) => Some(self.get_type(&parent)?),
            Some(Parent::Type(parent)) => Some(self.resolve_instance(parent)?),
            None => None,
        };

        let type_extensions = self
            .extensions
            .iter()
            .flat_map(|extension| extension.get_type_extensions(inner.name()))
            .collect();

        self.resolved_type_factory
            .create_resolved_type(inner, type_extensions, parent)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut cached: Vec<_> = self.types.borrow().keys().cloned().collect();
        cached.sort();
        f.debug_struct("Registry")
            .field("extensions", &self.extensions.len())
            .field("cached", &cached)
            .finish()
    }
}
