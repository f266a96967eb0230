use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::{BlockType, BlockTypeExtension, TypeGuesser};
use crate::error::BlockError;

/// A source of block types, type extensions and guessers.
pub trait BlockExtension {
    fn has_type(&self, name: &str) -> bool;

    fn get_type(&self, name: &str) -> Result<Rc<dyn BlockType>, BlockError>;

    fn get_type_extensions(&self, name: &str) -> Vec<Rc<dyn BlockTypeExtension>>;

    fn type_guesser(&self) -> Option<Rc<dyn TypeGuesser>> {
        None
    }

    /// Checked once when the extension is handed to a registry.
    fn validate(&self) -> Result<(), BlockError> {
        Ok(())
    }
}

/// An extension over types and type extensions that already exist.
#[derive(Default)]
pub struct PreloadedExtension {
    types: IndexMap<String, Rc<dyn BlockType>>,
    type_extensions: IndexMap<String, Vec<Rc<dyn BlockTypeExtension>>>,
    guesser: Option<Rc<dyn TypeGuesser>>,
}

impl PreloadedExtension {
    /// `type_extensions` is keyed by the name of the type they extend.
    pub fn new(
        types: Vec<Rc<dyn BlockType>>,
        type_extensions: IndexMap<String, Vec<Rc<dyn BlockTypeExtension>>>,
        guesser: Option<Rc<dyn TypeGuesser>>,
    ) -> Self {
        Self {
            types: types
                .into_iter()
                .map(|block_type| (block_type.name().to_string(), block_type))
                .collect(),
            type_extensions,
            guesser,
        }
    }

    pub fn with_types(types: Vec<Rc<dyn BlockType>>) -> Self {
        Self::new(types, IndexMap::new(), None)
    }
}

impl BlockExtension for PreloadedExtension {
    fn has_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    fn get_type(&self, name: &str) -> Result<Rc<dyn BlockType>, BlockError> {
        self.types.get(name).cloned().ok_or_else(|| {
            BlockError::InvalidArgument(format!(
                "The type \"{name}\" cannot be loaded by this extension."
            ))
        })
    }

    fn get_type_extensions(&self, name: &str) -> Vec<Rc<dyn BlockTypeExtension>> {
        self.type_extensions.get(name).cloned().unwrap_or_default()
    }

    fn type_guesser(&self) -> Option<Rc<dyn TypeGuesser>> {
        self.guesser.clone()
    }

    fn validate(&self) -> Result<(), BlockError> {
        for (name, extensions) in &self.type_extensions {
            for extension in extensions {
                let extended = extension.extended_types();
                if !extended.iter().any(|t| t == name) {
                    return Err(BlockError::unexpected_type(
                        format!("type extension of \"{name}\""),
                        format!("type extension of \"{}\"", extended.join("\", \"")),
                    ));
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for PreloadedExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreloadedExtension")
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .field("type_extensions", &self.type_extensions.keys().collect::<Vec<_>>())
            .field("guesser", &self.guesser.is_some())
            .finish()
    }
}
