//! Block types described in configuration files.

use std::rc::Rc;

use blockwork_config::{Config, TypeDeclaration};
use indexmap::IndexMap;

use crate::builder::{BlockBuilder, TypeRef};
use crate::error::BlockError;
use crate::options::{Options, OptionsResolver};
use crate::types::{BlockExtension, BlockType, BlockTypeExtension, Parent};

const DEFAULT_PARENT: &str = "block";

#[derive(Debug, Clone)]
struct DeclaredChild {
    name: String,
    type_name: Option<String>,
    options: Options,
}

/// A type whose parent, option defaults and children come from a declaration.
#[derive(Debug, Clone)]
pub struct DeclaredType {
    name: String,
    parent: String,
    defaults: Options,
    children: Vec<DeclaredChild>,
}

impl DeclaredType {
    pub fn new(declaration: &TypeDeclaration) -> Result<Self, BlockError> {
        let children = declaration
            .children
            .iter()
            .map(|child| {
                Ok(DeclaredChild {
                    name: child.name.clone(),
                    type_name: child.type_name.clone(),
                    options: child.options()?,
                })
            })
            .collect::<Result<Vec<_>, BlockError>>()?;

        Ok(Self {
            name: declaration.name.clone(),
            parent: declaration
                .parent
                .clone()
                .unwrap_or_else(|| DEFAULT_PARENT.to_string()),
            defaults: declaration.options()?,
            children,
        })
    }
}

impl BlockType for DeclaredType {
    fn name(&self) -> &str {
        &self.name
    }

    fn parent(&self) -> Option<Parent> {
        Some(Parent::Name(self.parent.clone()))
    }

    fn configure_options(&self, resolver: &mut OptionsResolver) {
        for (name, value) in self.defaults.iter() {
            resolver.set_default(name, value.clone());
        }
    }

    fn build_block(&self, builder: &mut BlockBuilder, _options: &Options) -> Result<(), BlockError> {
        for child in &self.children {
            let type_ref = child.type_name.clone().map(TypeRef::Name);
            builder.add(child.name.as_str(), type_ref, child.options.clone())?;
        }
        Ok(())
    }
}

/// Registers every `[[types]]` entry of a configuration.
#[derive(Debug, Default)]
pub struct DeclaredExtension {
    types: IndexMap<String, Rc<DeclaredType>>,
}

impl DeclaredExtension {
    pub fn from_config(config: &Config) -> Result<Self, BlockError> {
        let mut types = IndexMap::new();
        for declaration in &config.types {
            // Later declarations replace earlier ones with the same name
            types.insert(
                declaration.name.clone(),
                Rc::new(DeclaredType::new(declaration)?),
            );
        }
        Ok(Self { types })
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }
}

impl BlockExtension for DeclaredExtension {
    fn has_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    fn get_type(&self, name: &str) -> Result<Rc<dyn BlockType>, BlockError> {
        self.types
            .get(name)
            .map(|declared| Rc::clone(declared) as Rc<dyn BlockType>)
            .ok_or_else(|| {
                BlockError::InvalidArgument(format!("No block type \"{name}\" is declared."))
            })
    }

    fn get_type_extensions(&self, _name: &str) -> Vec<Rc<dyn BlockTypeExtension>> {
        Vec::new()
    }
}
