//! The core types every factory built `with_core()` knows about.

mod block_type;
mod collection_type;
mod resize_listener;
mod text_type;

use std::rc::Rc;

use crate::error::BlockError;
use crate::types::{BlockExtension, BlockType, BlockTypeExtension};

pub use block_type::BaseBlockType;
pub use collection_type::CollectionType;
pub use resize_listener::ResizeListener;
pub use text_type::TextType;

/// Provides `block`, `text` and `collection`.
#[derive(Debug, Default, Clone, Copy)]
pub struct CoreExtension;

impl BlockExtension for CoreExtension {
    fn has_type(&self, name: &str) -> bool {
        matches!(name, "block" | "text" | "collection")
    }

    fn get_type(&self, name: &str) -> Result<Rc<dyn BlockType>, BlockError> {
        match name {
            "block" => Ok(Rc::new(BaseBlockType)),
            "text" => Ok(Rc::new(TextType)),
            "collection" => Ok(Rc::new(CollectionType)),
            other => Err(BlockError::InvalidArgument(format!(
                "The type \"{other}\" cannot be loaded by the core extension."
            ))),
        }
    }

    fn get_type_extensions(&self, _name: &str) -> Vec<Rc<dyn BlockTypeExtension>> {
        Vec::new()
    }
}
