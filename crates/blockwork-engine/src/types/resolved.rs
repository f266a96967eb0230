use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;
use std::sync::LazyLock;

use regex::Regex;

use super::{BlockType, BlockTypeExtension};
use crate::block::Block;
use crate::builder::BlockBuilder;
use crate::error::BlockError;
use crate::factory::BlockFactory;
use crate::options::{Options, OptionsResolver};
use crate::view::{BlockView, ViewParent};

static TYPE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_]+$").expect("type name pattern is valid"));

/// One link of a resolved inheritance chain: a type, the extensions applied
/// to it and the resolved parent it inherits from.
pub struct ResolvedBlockType {
    inner: Rc<dyn BlockType>,
    type_extensions: Vec<Rc<dyn BlockTypeExtension>>,
    parent: Option<Rc<ResolvedBlockType>>,
    options_resolver: OnceCell<OptionsResolver>,
}

/// Runs a hook on the parent chain, then the inner type, then the extensions.
macro_rules! chained_hook {
    ($(#[$meta:meta])* $hook:ident($($arg:ident: $ty:ty),*)) => {
        $(#[$meta])*
        pub fn $hook(&self, $($arg: $ty),*) -> Result<(), BlockError> {
            if let Some(resolved_parent) = &self.parent {
                resolved_parent.$hook($($arg),*)?;
            }
            self.inner.$hook($($arg),*)?;
            for extension in &self.type_extensions {
                extension.$hook($($arg),*)?;
            }
            Ok(())
        }
    };
}

impl ResolvedBlockType {
    pub fn new(
        inner: Rc<dyn BlockType>,
        type_extensions: Vec<Rc<dyn BlockTypeExtension>>,
        parent: Option<Rc<ResolvedBlockType>>,
    ) -> Result<Self, BlockError> {
        if !TYPE_NAME.is_match(inner.name()) {
            return Err(BlockError::InvalidArgument(format!(
                "The \"{}\" block type name is not valid. Names must only contain lowercase letters, numbers and \"_\".",
                inner.name()
            )));
        }

        Ok(Self {
            inner,
            type_extensions,
            parent,
            options_resolver: OnceCell::new(),
        })
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn block_prefix(&self) -> String {
        self.inner.block_prefix()
    }

    pub fn parent(&self) -> Option<&Rc<ResolvedBlockType>> {
        self.parent.as_ref()
    }

    pub fn inner_type(&self) -> &Rc<dyn BlockType> {
        &self.inner
    }

    pub fn type_extensions(&self) -> &[Rc<dyn BlockTypeExtension>] {
        &self.type_extensions
    }

    /// Whether `name` is this type or one of its ancestors.
    pub fn is_type_of(&self, name: &str) -> bool {
        let mut current = Some(self);
        while let Some(resolved) = current {
            if resolved.name() == name {
                return true;
            }
            current = resolved.parent.as_deref();
        }
        false
    }

    /// The merged option schema, computed on first access.
    pub fn options_resolver(&self) -> &OptionsResolver {
        self.options_resolver.get_or_init(|| {
            let mut resolver = self
                .parent
                .as_ref()
                .map(|parent| parent.options_resolver().clone())
                .unwrap_or_default();
            self.inner.configure_options(&mut resolver);
            for extension in &self.type_extensions {
                extension.configure_options(&mut resolver);
            }
            resolver
        })
    }

    /// Resolve `options` against the schema and create an unbuilt builder.
    pub fn create_builder(
        self: &Rc<Self>,
        factory: &BlockFactory,
        name: &str,
        options: Options,
    ) -> Result<BlockBuilder, BlockError> {
        let options = self
            .options_resolver()
            .resolve(options)
            .map_err(|source| BlockError::Options {
                type_name: self.name().to_string(),
                source,
            })?;
        let data_class = options.str("data_class").map(str::to_string);

        BlockBuilder::new(name, data_class, factory.clone(), options, Rc::clone(self))
    }

    pub fn create_view(&self, _block: &Block, parent: Option<Rc<ViewParent>>) -> BlockView {
        BlockView::new(parent)
    }

    chained_hook!(build_block(builder: &mut BlockBuilder, options: &Options));
    chained_hook!(finish_block(builder: &mut BlockBuilder, options: &Options));
    chained_hook!(add_parent(parent: &Block, block: &Block, options: &Options));
    chained_hook!(remove_parent(parent: &Block, block: &Block, options: &Options));
    chained_hook!(add_child(child: &Block, block: &Block, options: &Options));
    chained_hook!(remove_child(child: &Block, block: &Block, options: &Options));
    chained_hook!(build_view(view: &mut BlockView, block: &Block, options: &Options));
    chained_hook!(finish_view(view: &mut BlockView, block: &Block, options: &Options));
}

impl fmt::Debug for ResolvedBlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedBlockType")
            .field("name", &self.name())
            .field("type_extensions", &self.type_extensions.len())
            .field("parent", &self.parent.as_ref().map(|p| p.name().to_string()))
            .finish()
    }
}

/// Creates the chain links the registry caches.
pub trait ResolvedTypeFactory {
    fn create_resolved_type(
        &self,
        inner: Rc<dyn BlockType>,
        type_extensions: Vec<Rc<dyn BlockTypeExtension>>,
        parent: Option<Rc<ResolvedBlockType>>,
    ) -> Result<ResolvedBlockType, BlockError>;
}

#[derive(Debug, Default)]
pub struct DefaultResolvedTypeFactory;

impl ResolvedTypeFactory for DefaultResolvedTypeFactory {
    fn create_resolved_type(
        &self,
        inner: Rc<dyn BlockType>,
        type_extensions: Vec<Rc<dyn BlockTypeExtension>>,
        parent: Option<Rc<ResolvedBlockType>>,
    ) -> Result<ResolvedBlockType, BlockError> {
        ResolvedBlockType::new(inner, type_extensions, parent)
    }
}
