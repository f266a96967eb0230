//! Block types, their extensions and how they are resolved into chains.

mod extension;
mod guess;
mod registry;
mod resolved;

use std::fmt;
use std::rc::Rc;

use crate::block::Block;
use crate::builder::BlockBuilder;
use crate::error::BlockError;
use crate::options::{Options, OptionsResolver};
use crate::view::BlockView;

pub use extension::{BlockExtension, PreloadedExtension};
pub use guess::{Confidence, TypeGuess, TypeGuesser, TypeGuesserChain};
pub use registry::Registry;
pub use resolved::{DefaultResolvedTypeFactory, ResolvedBlockType, ResolvedTypeFactory};

/// The parent a type inherits from.
#[derive(Clone)]
pub enum Parent {
    /// Looked up in the registry.
    Name(String),
    /// Resolved on its own, outside the registry cache.
    Type(Rc<dyn BlockType>),
}

impl From<&str> for Parent {
    fn from(name: &str) -> Self {
        Parent::Name(name.to_string())
    }
}

impl fmt::Debug for Parent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parent::Name(name) => f.debug_tuple("Name").field(name).finish(),
            Parent::Type(block_type) => f.debug_tuple("Type").field(&block_type.name()).finish(),
        }
    }
}

/// A named unit of block behavior.
///
/// Hooks run as part of a resolved chain: the parent chain first, then the
/// type itself, then its type extensions. Every hook has a no-op default.
pub trait BlockType {
    fn name(&self) -> &str;

    fn parent(&self) -> Option<Parent> {
        None
    }

    /// Prefix used by renderers to find templates for this type.
    fn block_prefix(&self) -> String {
        self.name().to_string()
    }

    fn configure_options(&self, _resolver: &mut OptionsResolver) {}

    fn build_block(&self, _builder: &mut BlockBuilder, _options: &Options) -> Result<(), BlockError> {
        Ok(())
    }

    fn finish_block(&self, _builder: &mut BlockBuilder, _options: &Options) -> Result<(), BlockError> {
        Ok(())
    }

    /// Called on the child's type when it is attached to `parent`.
    fn add_parent(&self, _parent: &Block, _block: &Block, _options: &Options) -> Result<(), BlockError> {
        Ok(())
    }

    fn remove_parent(&self, _parent: &Block, _block: &Block, _options: &Options) -> Result<(), BlockError> {
        Ok(())
    }

    /// Called on the parent's type before `child` is attached. Returning an
    /// error rejects the child.
    fn add_child(&self, _child: &Block, _block: &Block, _options: &Options) -> Result<(), BlockError> {
        Ok(())
    }

    fn remove_child(&self, _child: &Block, _block: &Block, _options: &Options) -> Result<(), BlockError> {
        Ok(())
    }

    /// Runs before child views exist.
    fn build_view(&self, _view: &mut BlockView, _block: &Block, _options: &Options) -> Result<(), BlockError> {
        Ok(())
    }

    /// Runs after every child view was built.
    fn finish_view(&self, _view: &mut BlockView, _block: &Block, _options: &Options) -> Result<(), BlockError> {
        Ok(())
    }
}

/// Behavior attached to existing types by name.
pub trait BlockTypeExtension {
    /// Names of the types this extension applies to.
    fn extended_types(&self) -> Vec<String>;

    fn configure_options(&self, _resolver: &mut OptionsResolver) {}

    fn build_block(&self, _builder: &mut BlockBuilder, _options: &Options) -> Result<(), BlockError> {
        Ok(())
    }

    fn finish_block(&self, _builder: &mut BlockBuilder, _options: &Options) -> Result<(), BlockError> {
        Ok(())
    }

    fn add_parent(&self, _parent: &Block, _block: &Block, _options: &Options) -> Result<(), BlockError> {
        Ok(())
    }

    fn remove_parent(&self, _parent: &Block, _block: &Block, _options: &Options) -> Result<(), BlockError> {
        Ok(())
    }

    fn add_child(&self, _child: &Block, _block: &Block, _options: &Options) -> Result<(), BlockError> {
        Ok(())
    }

    fn remove_child(&self, _child: &Block, _block: &Block, _options: &Options) -> Result<(), BlockError> {
        Ok(())
    }

    fn build_view(&self, _view: &mut BlockView, _block: &Block, _options: &Options) -> Result<(), BlockError> {
        Ok(())
    }

    fn finish_view(&self, _view: &mut BlockView, _block: &Block, _options: &Options) -> Result<(), BlockError> {
        Ok(())
    }
}
