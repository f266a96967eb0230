use crate::block::Block;
use crate::error::BlockError;
use crate::value::Value;

/// Distributes a compound block's view data over its children and collects it back.
///
/// `blocks` is already flattened: children that inherit data are replaced by
/// their own children.
pub trait DataMapper {
    fn map_data_to_views(&self, data: &Value, blocks: &[Block]) -> Result<(), BlockError>;

    fn map_views_to_data(&self, blocks: &[Block], data: &mut Value) -> Result<(), BlockError>;
}

/// Reads and writes each child at its property path.
#[derive(Debug, Default, Clone, Copy)]
pub struct PropertyPathMapper;

impl DataMapper for PropertyPathMapper {
    fn map_data_to_views(&self, data: &Value, blocks: &[Block]) -> Result<(), BlockError> {
        let empty = data.is_empty();

        if !empty && !data.is_composite() {
            return Err(BlockError::unexpected_type("map, list or object", data.kind()));
        }

        for block in blocks {
            let config = block.config();
            if !config.mapped() {
                continue;
            }

            let value = match block.property_path() {
                Some(path) if !empty => path.read(data).cloned().unwrap_or_default(),
                _ => config.data().clone(),
            };
            block.set_data(value)?;
        }

        Ok(())
    }

    fn map_views_to_data(&self, blocks: &[Block], data: &mut Value) -> Result<(), BlockError> {
        if data.is_null() {
            return Ok(());
        }

        if !data.is_composite() {
            return Err(BlockError::unexpected_type("map, list or object", data.kind()));
        }

        for block in blocks {
            let config = block.config();
            if !config.mapped() || !block.is_submitted() || !block.is_synchronized() {
                continue;
            }
            if let Some(path) = block.property_path() {
                path.write(data, block.data()?)?;
            }
        }

        Ok(())
    }
}
