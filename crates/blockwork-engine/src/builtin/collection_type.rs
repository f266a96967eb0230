use std::rc::Rc;

use indexmap::IndexMap;

use super::ResizeListener;
use crate::block::Block;
use crate::builder::BlockBuilder;
use crate::error::BlockError;
use crate::options::{Options, OptionsResolver};
use crate::types::{BlockType, Parent};
use crate::value::{Value, ValueKind};
use crate::view::BlockView;

/// One child per entry of a list or map, all of the same entry type.
#[derive(Debug, Default, Clone, Copy)]
pub struct CollectionType;

impl BlockType for CollectionType {
    fn name(&self) -> &str {
        "collection"
    }

    fn parent(&self) -> Option<Parent> {
        Some(Parent::from("block"))
    }

    fn configure_options(&self, resolver: &mut OptionsResolver) {
        resolver
            .set_default("entry_type", "text")
            .set_allowed_kinds("entry_type", &[ValueKind::String])
            .set_default("entry_options", Value::Map(IndexMap::new()))
            .set_allowed_kinds("entry_options", &[ValueKind::Map])
            .set_normalizer("entry_options", |_, entry_options| {
                let Value::Map(mut entry_options) = entry_options else {
                    return Ok(entry_options);
                };
                entry_options
                    .entry("block_name".to_string())
                    .or_insert_with(|| Value::from("entry"));
                Ok(Value::Map(entry_options))
            })
            .set_default("allow_add", false)
            .set_allowed_kinds("allow_add", &[ValueKind::Bool])
            .set_default("allow_delete", false)
            .set_allowed_kinds("allow_delete", &[ValueKind::Bool]);
    }

    fn build_block(&self, builder: &mut BlockBuilder, options: &Options) -> Result<(), BlockError> {
        let entry_type = options.str("entry_type").unwrap_or("text");
        let entry_options: Options = options
            .value("entry_options")
            .as_map()
            .cloned()
            .unwrap_or_default()
            .into();

        builder.add_event_subscriber(Rc::new(ResizeListener::new(
            entry_type,
            entry_options,
            options.bool("allow_add"),
            options.bool("allow_delete"),
        )))?;

        Ok(())
    }

    fn build_view(&self, view: &mut BlockView, _block: &Block, options: &Options) -> Result<(), BlockError> {
        view.set_var("allow_add", options.bool("allow_add"));
        view.set_var("allow_delete", options.bool("allow_delete"));
        Ok(())
    }
}
