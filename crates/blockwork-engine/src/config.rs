use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::events::EventDispatcher;
use crate::factory::BlockFactory;
use crate::mapper::DataMapper;
use crate::options::Options;
use crate::transformer::TransformerChain;
use crate::types::ResolvedBlockType;
use crate::value::{PropertyPath, Value};

/// The immutable configuration of a block, taken from a sealed builder.
#[derive(Clone)]
pub struct BlockConfig {
    pub(crate) name: String,
    pub(crate) data_class: Option<String>,
    pub(crate) factory: BlockFactory,
    pub(crate) options: Options,
    pub(crate) block_type: Rc<ResolvedBlockType>,
    pub(crate) dispatcher: EventDispatcher,
    pub(crate) model_transformers: TransformerChain,
    pub(crate) view_transformers: TransformerChain,
    pub(crate) attributes: IndexMap<String, Value>,
    pub(crate) data_mapper: Option<Rc<dyn DataMapper>>,
    pub(crate) mapped: bool,
    pub(crate) inherit_data: bool,
    pub(crate) compound: bool,
    pub(crate) auto_initialize: bool,
    pub(crate) data_locked: bool,
    pub(crate) property_path: Option<PropertyPath>,
    pub(crate) empty_data: Value,
    pub(crate) data: Value,
}

impl BlockConfig {
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

    pub fn option(&self, name: &str) -> &Value {
        self.options.value(name)
    }

    pub fn block_type(&self) -> &Rc<ResolvedBlockType> {
        &self.block_type
    }

    pub fn event_dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    pub fn model_transformers(&self) -> &TransformerChain {
        &self.model_transformers
    }

    pub fn view_transformers(&self) -> &TransformerChain {
        &self.view_transformers
    }

    pub fn attributes(&self) -> &IndexMap<String, Value> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn data_mapper(&self) -> Option<&Rc<dyn DataMapper>> {
        self.data_mapper.as_ref()
    }

    pub fn mapped(&self) -> bool {
        self.mapped
    }

    pub fn inherit_data(&self) -> bool {
        self.inherit_data
    }

    pub fn compound(&self) -> bool {
        self.compound
    }

    pub fn auto_initialize(&self) -> bool {
        self.auto_initialize
    }

    /// Whether the configured data wins over data pushed in by a parent.
    pub fn data_locked(&self) -> bool {
        self.data_locked
    }

    pub fn property_path(&self) -> Option<&PropertyPath> {
        self.property_path.as_ref()
    }

    pub fn empty_data(&self) -> &Value {
        &self.empty_data
    }

    pub fn data(&self) -> &Value {
        &self.data
    }
}

impl fmt::Debug for BlockConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockConfig")
            .field("name", &self.name)
            .field("type", &self.block_type.name())
            .field("data_class", &self.data_class)
            .field("compound", &self.compound)
            .field("mapped", &self.mapped)
            .field("inherit_data", &self.inherit_data)
            .field("property_path", &self.property_path)
            .finish_non_exhaustive()
    }
}
