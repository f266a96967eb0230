use log::debug;

use crate::block::Block;
use crate::builder::TypeRef;
use crate::error::BlockError;
use crate::events::{BlockEvent, BlockEvents, EventSubscriber};
use crate::options::Options;
use crate::value::Value;

/// Keeps a collection's children in line with the entries of its data.
#[derive(Debug, Clone)]
pub struct ResizeListener {
    entry_type: String,
    entry_options: Options,
    allow_add: bool,
    allow_delete: bool,
}

impl ResizeListener {
    pub fn new(entry_type: &str, entry_options: Options, allow_add: bool, allow_delete: bool) -> Self {
        Self {
            entry_type: entry_type.to_string(),
            entry_options,
            allow_add,
            allow_delete,
        }
    }

    /// Replace every child with one entry per key of the incoming data.
    fn pre_set_data(&self, event: &mut BlockEvent) -> Result<(), BlockError> {
        let block = event.block().clone();
        let keys = entry_keys(event.data())?;

        for name in block.child_names() {
            block.remove(&name)?;
        }
        for name in &keys {
            self.add_entry(&block, name)?;
        }

        debug!("Resized collection \"{}\" to {} entries", block.name(), keys.len());
        Ok(())
    }

    fn pre_submit(&self, event: &mut BlockEvent) -> Result<(), BlockError> {
        let block = event.block().clone();
        let keys = match event.data() {
            data @ (Value::List(_) | Value::Map(_)) => data.keys(),
            _ => Vec::new(),
        };

        if self.allow_delete {
            for name in block.child_names() {
                if !keys.contains(&name) {
                    block.remove(&name)?;
                }
            }
        }
        if self.allow_add {
            for name in &keys {
                if !block.has(name) {
                    self.add_entry(&block, name)?;
                }
            }
        }

        debug!("Collection \"{}\" has {} entries on submission", block.name(), block.count());
        Ok(())
    }

    /// The data mapper only writes entries, so deleted ones are dropped here.
    fn on_submit(&self, event: &mut BlockEvent) -> Result<(), BlockError> {
        let block = event.block().clone();
        let data = match event.data() {
            Value::Null => Value::Map(Default::default()),
            data @ (Value::List(_) | Value::Map(_)) => data.clone(),
            other => return Err(BlockError::unexpected_type("list or map", other.kind())),
        };

        if !self.allow_delete {
            event.set_data(data);
            return Ok(());
        }

        let kept = match data {
            Value::List(items) => Value::List(
                items
                    .into_iter()
                    .enumerate()
                    .filter(|(index, _)| block.has(&index.to_string()))
                    .map(|(_, item)| item)
                    .collect(),
            ),
            Value::Map(mut entries) => {
                entries.retain(|name, _| block.has(name));
                Value::Map(entries)
            }
            other => other,
        };
        event.set_data(kept);
        Ok(())
    }

    fn add_entry(&self, block: &Block, name: &str) -> Result<Block, BlockError> {
        let mut options = Options::new().with("property_path", format!("[{name}]"));
        options.merge(self.entry_options.clone());
        block.add_new(name, Some(TypeRef::Name(self.entry_type.clone())), options)
    }
}

fn entry_keys(data: &Value) -> Result<Vec<String>, BlockError> {
    match data {
        Value::Null => Ok(Vec::new()),
        Value::List(_) | Value::Map(_) => Ok(data.keys()),
        other => Err(BlockError::unexpected_type("list or map", other.kind())),
    }
}

impl EventSubscriber for ResizeListener {
    fn subscribed_events(&self) -> Vec<(BlockEvents, i32)> {
        vec![
            (BlockEvents::PreSetData, 0),
            (BlockEvents::PreSubmit, 0),
            (BlockEvents::Submit, 50),
        ]
    }

    fn handle(&self, kind: BlockEvents, event: &mut BlockEvent) -> Result<(), BlockError> {
        match kind {
            BlockEvents::PreSetData => self.pre_set_data(event),
            BlockEvents::PreSubmit => self.pre_submit(event),
            BlockEvents::Submit => self.on_submit(event),
            BlockEvents::PostSetData | BlockEvents::PostSubmit => Ok(()),
        }
    }
}
