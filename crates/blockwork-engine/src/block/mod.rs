//! The runtime block tree.
//!
//! A [`Block`] is a cheap handle. Parents own their children; a child only
//! keeps a weak link back to its parent, so dropping the root drops the tree.

mod data;
mod iter;
mod submit;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::builder::TypeRef;
use crate::config::BlockConfig;
use crate::error::BlockError;
use crate::options::Options;
use crate::transformer::TransformationFailed;
use crate::value::{PropertyPath, Value};
use crate::view::{BlockView, ViewParent};

pub use iter::InheritDataAwareIter;
pub(crate) use iter::flatten;

#[derive(Clone)]
pub struct Block(Rc<BlockInner>);

struct BlockInner {
    config: BlockConfig,
    parent: RefCell<Weak<BlockInner>>,
    children: RefCell<IndexMap<String, Block>>,
    model_data: RefCell<Value>,
    norm_data: RefCell<Value>,
    view_data: RefCell<Value>,
    default_data_set: Cell<bool>,
    lock_set_data: Cell<bool>,
    submitted: Cell<bool>,
    transformation_failure: RefCell<Option<TransformationFailed>>,
}

impl Block {
    pub fn new(config: BlockConfig) -> Result<Self, BlockError> {
        if config.compound() && config.mapped() && config.data_mapper().is_none() {
            return Err(BlockError::Logic(
                "Compound blocks need a data mapper".to_string(),
            ));
        }

        // Inheriting blocks never hold data of their own
        let default_data_set = config.inherit_data();

        Ok(Self(Rc::new(BlockInner {
            config,
            parent: RefCell::new(Weak::new()),
            children: RefCell::default(),
            model_data: RefCell::default(),
            norm_data: RefCell::default(),
            view_data: RefCell::default(),
            default_data_set: Cell::new(default_data_set),
            lock_set_data: Cell::new(false),
            submitted: Cell::new(false),
            transformation_failure: RefCell::default(),
        })))
    }

    pub fn config(&self) -> &BlockConfig {
        &self.0.config
    }

    pub fn name(&self) -> &str {
        self.0.config.name()
    }

    pub fn parent(&self) -> Option<Block> {
        self.0.parent.borrow().upgrade().map(Block)
    }

    pub fn root(&self) -> Block {
        let mut current = self.clone();
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    pub fn is_root(&self) -> bool {
        self.parent().is_none()
    }

    /// Where this block reads its data from in the parent's data.
    ///
    /// Without an explicit path a child is addressed as `[name]` when the
    /// nearest ancestor that holds data has no data class, and as `name`
    /// otherwise.
    pub fn property_path(&self) -> Option<PropertyPath> {
        if let Some(path) = self.config().property_path() {
            return Some(path.clone());
        }
        if self.name().is_empty() {
            return None;
        }

        let mut parent = self.parent();
        while let Some(current) = parent.clone() {
            if !current.config().inherit_data() {
                break;
            }
            parent = current.parent();
        }

        match parent {
            Some(parent) if parent.config().data_class().is_none() => {
                Some(PropertyPath::index(self.name()))
            }
            _ => Some(PropertyPath::property(self.name())),
        }
    }

    /// Attach `child`. If this block already holds data, the child's slice is
    /// mapped into it right away.
    pub fn add(&self, child: Block) -> Result<&Self, BlockError> {
        if self.is_submitted() {
            return Err(BlockError::Logic(
                "You cannot add children to a submitted block.".to_string(),
            ));
        }
        if !self.config().compound() {
            return Err(BlockError::Logic(
                "You cannot add children to a simple block. Maybe you should set the option \"compound\" to true?"
                    .to_string(),
            ));
        }
        if child.config().auto_initialize() {
            return Err(BlockError::Runtime(format!(
                "Automatic initialization is only supported on root blocks. You should set the \"auto_initialize\" option to false on the block \"{}\".",
                child.name()
            )));
        }
        if child.name().is_empty() {
            return Err(BlockError::Logic(
                "A block with an empty name cannot have a parent block.".to_string(),
            ));
        }
        if child.is_submitted() {
            return Err(BlockError::Logic(
                "You cannot set the parent of a submitted block.".to_string(),
            ));
        }
        if child.parent().is_some() {
            return Err(BlockError::Logic(format!(
                "The block \"{}\" already has a parent.",
                child.name()
            )));
        }
        let mut ancestor = Some(self.clone());
        while let Some(current) = ancestor {
            if current == child {
                return Err(BlockError::Logic(
                    "A block cannot be added to itself or to one of its descendants.".to_string(),
                ));
            }
            ancestor = current.parent();
        }

        let config = self.config();
        config.block_type().add_child(&child, self, config.options())?;
        child
            .config()
            .block_type()
            .add_parent(self, &child, child.config().options())?;

        let replaced = self
            .0
            .children
            .borrow_mut()
            .insert(child.name().to_string(), child.clone());
        if let Some(replaced) = replaced {
            replaced.detach();
        }
        *child.0.parent.borrow_mut() = Rc::downgrade(&self.0);

        // While set_data runs, it maps all children itself once it is done
        if !self.0.lock_set_data.get() && self.0.default_data_set.get() && !config.inherit_data() {
            if let Some(mapper) = config.data_mapper() {
                let view_data = self.view_data()?;
                mapper.map_data_to_views(&view_data, &flatten(vec![child]))?;
            }
        }

        Ok(self)
    }

    /// Create a child through the factory and attach it.
    pub fn add_new(
        &self,
        name: &str,
        type_ref: Option<TypeRef>,
        mut options: Options,
    ) -> Result<Block, BlockError> {
        options.insert("auto_initialize", false);

        let factory = self.config().factory();
        let child = match (type_ref, self.config().data_class()) {
            (Some(type_ref), _) => factory.create_named(name, type_ref, Value::Null, options)?,
            (None, Some(data_class)) => {
                factory.create_for_property(data_class, name, Value::Null, options)?
            }
            (None, None) => {
                let fallback = TypeRef::Name(factory.fallback_type().to_string());
                factory.create_named(name, fallback, Value::Null, options)?
            }
        };

        self.add(child.clone())?;
        Ok(child)
    }

    /// Detach a child. Removing a name that is not there does nothing.
    pub fn remove(&self, name: &str) -> Result<&Self, BlockError> {
        if self.is_submitted() {
            return Err(BlockError::Logic(
                "You cannot remove children from a submitted block.".to_string(),
            ));
        }

        let Some(child) = self.0.children.borrow().get(name).cloned() else {
            return Ok(self);
        };

        let config = self.config();
        config.block_type().remove_child(&child, self, config.options())?;
        child
            .config()
            .block_type()
            .remove_parent(self, &child, child.config().options())?;

        self.0.children.borrow_mut().shift_remove(name);
        if !child.is_submitted() {
            child.detach();
        }

        Ok(self)
    }

    pub fn get(&self, name: &str) -> Result<Block, BlockError> {
        self.0
            .children
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| BlockError::InvalidArgument(format!("Child \"{name}\" does not exist.")))
    }

    pub fn has(&self, name: &str) -> bool {
        self.0.children.borrow().contains_key(name)
    }

    /// The direct children, in order.
    pub fn children(&self) -> Vec<Block> {
        self.0.children.borrow().values().cloned().collect()
    }

    pub fn child_names(&self) -> Vec<String> {
        self.0.children.borrow().keys().cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.0.children.borrow().len()
    }

    /// Bind the configured data if nothing was bound yet. Only valid on roots.
    pub fn initialize(&self) -> Result<&Self, BlockError> {
        if !self.is_root() {
            return Err(BlockError::Runtime(
                "Only root blocks should be initialized.".to_string(),
            ));
        }

        if !self.0.default_data_set.get() {
            self.set_data(self.config().data().clone())?;
        }

        Ok(self)
    }

    /// Build the view of this block and its descendants. A child block first
    /// builds its ancestors' views, root first, so it sees the same parent
    /// variables as when the whole tree is built from the root.
    pub fn create_view(&self) -> Result<BlockView, BlockError> {
        let parent = self.ancestor_views()?;
        self.build_view_tree(parent)
    }

    /// Build the view of this block below an existing parent view.
    pub fn create_view_in(&self, parent: &BlockView) -> Result<BlockView, BlockError> {
        self.build_view_tree(Some(parent.as_parent()))
    }

    /// The parent view as children see it: built, not yet finished.
    fn ancestor_views(&self) -> Result<Option<Rc<ViewParent>>, BlockError> {
        let Some(parent) = self.parent() else {
            return Ok(None);
        };
        let grandparent = parent.ancestor_views()?;

        let config = parent.config();
        let block_type = config.block_type();
        let mut view = block_type.create_view(&parent, grandparent);
        block_type.build_view(&mut view, &parent, config.options())?;
        Ok(Some(view.as_parent()))
    }

    fn build_view_tree(&self, parent: Option<Rc<ViewParent>>) -> Result<BlockView, BlockError> {
        let config = self.config();
        let block_type = config.block_type();
        let options = config.options();

        let mut view = block_type.create_view(self, parent);
        block_type.build_view(&mut view, self, options)?;

        let children = self.children();
        if !children.is_empty() {
            let snapshot = view.as_parent();
            for child in children {
                let child_view = child.build_view_tree(Some(Rc::clone(&snapshot)))?;
                view.children.insert(child.name().to_string(), child_view);
            }
        }

        block_type.finish_view(&mut view, self, options)?;
        Ok(view)
    }

    fn detach(&self) {
        *self.0.parent.borrow_mut() = Weak::new();
    }
}

impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Block {}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("name", &self.name())
            .field("type", &self.config().block_type().name())
            .field("children", &self.child_names())
            .field("submitted", &self.0.submitted.get())
            .finish()
    }
}
