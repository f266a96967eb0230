use std::rc::Rc;

use indexmap::IndexMap;

use crate::block::Block;
use crate::builder::BlockBuilder;
use crate::error::BlockError;
use crate::mapper::{DataMapper, PropertyPathMapper};
use crate::options::{Options, OptionsResolver};
use crate::types::BlockType;
use crate::value::{Object, PropertyPath, Value, ValueKind};
use crate::view::{BlockView, ViewParent};

/// The root of every core type. Turns options into builder settings and
/// fills the common view variables.
#[derive(Debug, Default, Clone, Copy)]
pub struct BaseBlockType;

const NULLABLE_STRING: &[ValueKind] = &[ValueKind::Null, ValueKind::String];

impl BlockType for BaseBlockType {
    fn name(&self) -> &str {
        "block"
    }

    fn configure_options(&self, resolver: &mut OptionsResolver) {
        resolver
            .set_default("block_name", Value::Null)
            .set_allowed_kinds("block_name", NULLABLE_STRING)
            .set_default("data_class", Value::Null)
            .set_allowed_kinds("data_class", NULLABLE_STRING)
            .set_defined(&["data"])
            .set_default("compound", true)
            .set_allowed_kinds("compound", &[ValueKind::Bool])
            .set_lazy_default("empty_data", |options| match options.str("data_class") {
                Some(class) => Value::Object(Object::new(class)),
                None if options.bool("compound") => Value::Map(IndexMap::new()),
                None => Value::from(""),
            })
            .set_default("inherit_data", false)
            .set_allowed_kinds("inherit_data", &[ValueKind::Bool])
            .set_default("mapped", true)
            .set_allowed_kinds("mapped", &[ValueKind::Bool])
            .set_default("property_path", Value::Null)
            .set_allowed_kinds("property_path", NULLABLE_STRING)
            .set_default("attr", Value::Map(IndexMap::new()))
            .set_allowed_kinds("attr", &[ValueKind::Map])
            .set_default("label", Value::Null)
            .set_allowed_kinds("label", NULLABLE_STRING)
            .set_default("auto_initialize", true)
            .set_allowed_kinds("auto_initialize", &[ValueKind::Bool]);
    }

    fn build_block(&self, builder: &mut BlockBuilder, options: &Options) -> Result<(), BlockError> {
        let property_path = options
            .str("property_path")
            .map(PropertyPath::parse)
            .transpose()?;
        let compound = options.bool("compound");
        let data_mapper: Option<Rc<dyn DataMapper>> =
            compound.then(|| Rc::new(PropertyPathMapper) as Rc<dyn DataMapper>);

        builder
            .set_compound(compound)?
            .set_inherit_data(options.bool("inherit_data"))?
            .set_mapped(options.bool("mapped"))?
            .set_property_path(property_path)?
            .set_empty_data(options.value("empty_data").clone())?
            .set_data(options.value("data").clone())?
            .set_data_locked(options.contains("data"))?
            .set_auto_initialize(options.bool("auto_initialize"))?
            .set_data_mapper(data_mapper)?;

        Ok(())
    }

    fn build_view(&self, view: &mut BlockView, block: &Block, options: &Options) -> Result<(), BlockError> {
        let name = block.name().to_string();
        let block_name = options.str("block_name").unwrap_or(&name).to_string();

        let parent = view
            .parent
            .as_deref()
            .filter(|parent| !parent_var(parent, "full_name").is_empty());
        let (id, full_name, unique_block_prefix) = match parent {
            Some(parent) => (
                format!("{}_{name}", parent_var(parent, "id")),
                format!("{}[{name}]", parent_var(parent, "full_name")),
                format!("{}_{block_name}", parent_var(parent, "unique_block_prefix")),
            ),
            None => (name.clone(), name.clone(), format!("_{block_name}")),
        };

        let mut block_prefixes = Vec::new();
        let mut resolved = Some(block.config().block_type());
        while let Some(current) = resolved {
            block_prefixes.insert(0, Value::from(current.block_prefix()));
            resolved = current.parent();
        }
        block_prefixes.push(Value::from(unique_block_prefix.as_str()));

        view.set_var("id", id);
        view.set_var("name", name);
        view.set_var("full_name", full_name);
        view.set_var("value", block.view_data()?);
        view.set_var("data", block.norm_data()?);
        view.set_var("attr", options.value("attr").clone());
        view.set_var("label", options.value("label").clone());
        view.set_var("compound", block.config().compound());
        view.set_var("block_prefixes", Value::List(block_prefixes));
        view.set_var("unique_block_prefix", unique_block_prefix);

        Ok(())
    }
}

fn parent_var<'a>(parent: &'a ViewParent, name: &str) -> &'a str {
    parent.var(name).and_then(Value::as_str).unwrap_or_default()
}
