use std::cell::Cell;

use log::trace;

use super::{Block, flatten};
use crate::error::BlockError;
use crate::events::{BlockEvent, BlockEvents};
use crate::transformer::TransformationFailed;
use crate::value::Value;

/// Marks a block as being inside `set_data` until dropped.
struct SetDataGuard<'a>(&'a Cell<bool>);

impl<'a> SetDataGuard<'a> {
    fn acquire(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for SetDataGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl Block {
    /// Bind model data, derive the normalized and view data from it and push
    /// the view data down to the children.
    pub fn set_data(&self, model_data: Value) -> Result<(), BlockError> {
        let config = self.config();

        if self.is_submitted() {
            return Err(BlockError::Logic(
                "You cannot change the data of a submitted block.".to_string(),
            ));
        }
        if config.inherit_data() {
            return Err(BlockError::Runtime(
                "You cannot change the data of a block inheriting its parent data.".to_string(),
            ));
        }
        if self.0.lock_set_data.get() {
            return Err(BlockError::Runtime(
                "A cycle was detected. Listeners to the PreSetData event must not call set_data(). You should call set_data() on the event instead."
                    .to_string(),
            ));
        }
        if config.data_locked() && model_data != *config.data() {
            return Ok(());
        }

        let guard = SetDataGuard::acquire(&self.0.lock_set_data);
        let dispatcher = config.event_dispatcher();
        let mut model_data = model_data;

        if dispatcher.has_listeners(BlockEvents::PreSetData) {
            let mut event = BlockEvent::new(self.clone(), model_data);
            dispatcher.dispatch(BlockEvents::PreSetData, &mut event)?;
            model_data = event.into_data();
        }

        // Without any transformer, scalars are treated as strings
        if model_data.is_scalar()
            && config.model_transformers().is_empty()
            && config.view_transformers().is_empty()
        {
            model_data = Value::String(model_data.coerce_to_string().unwrap_or_default());
        }

        let norm_data = self.model_to_norm(model_data.clone())?;
        let view_data = self.norm_to_view(norm_data.clone())?;
        self.check_view_data(&view_data)?;

        *self.0.model_data.borrow_mut() = model_data.clone();
        *self.0.norm_data.borrow_mut() = norm_data;
        *self.0.view_data.borrow_mut() = view_data.clone();
        self.0.default_data_set.set(true);
        drop(guard);

        let children = self.children();
        if !children.is_empty() {
            if let Some(mapper) = config.data_mapper() {
                mapper.map_data_to_views(&view_data, &flatten(children))?;
            }
        }

        if dispatcher.has_listeners(BlockEvents::PostSetData) {
            let mut event = BlockEvent::new(self.clone(), model_data);
            dispatcher.dispatch(BlockEvents::PostSetData, &mut event)?;
        }

        Ok(())
    }

    /// The model data, bound lazily from the configured data on first access.
    pub fn data(&self) -> Result<Value, BlockError> {
        if self.config().inherit_data() {
            return self.data_parent()?.data();
        }
        self.ensure_default_data()?;
        Ok(self.0.model_data.borrow().clone())
    }

    pub fn norm_data(&self) -> Result<Value, BlockError> {
        if self.config().inherit_data() {
            return self.data_parent()?.norm_data();
        }
        self.ensure_default_data()?;
        Ok(self.0.norm_data.borrow().clone())
    }

    pub fn view_data(&self) -> Result<Value, BlockError> {
        if self.config().inherit_data() {
            return self.data_parent()?.view_data();
        }
        self.ensure_default_data()?;
        Ok(self.0.view_data.borrow().clone())
    }

    pub(super) fn ensure_default_data(&self) -> Result<(), BlockError> {
        if self.0.default_data_set.get() {
            return Ok(());
        }
        if self.0.lock_set_data.get() {
            return Err(BlockError::Runtime(
                "A cycle was detected. Listeners to the PreSetData event must not read the block data before it is set. You should read the data from the event instead."
                    .to_string(),
            ));
        }
        self.set_data(self.config().data().clone())
    }

    fn data_parent(&self) -> Result<Block, BlockError> {
        self.parent().ok_or_else(|| {
            BlockError::Runtime(
                "The block is configured to inherit its parent's data, but does not have a parent."
                    .to_string(),
            )
        })
    }

    pub(super) fn model_to_norm(&self, value: Value) -> Result<Value, TransformationFailed> {
        let chain = self.config().model_transformers();
        if chain.is_empty() {
            return Ok(value);
        }
        trace!("Transforming model data of \"{}\" ({} transformers)", self.name(), chain.len());
        chain.transform(value)
    }

    pub(super) fn norm_to_model(&self, value: Value) -> Result<Value, TransformationFailed> {
        self.config().model_transformers().reverse_transform(value)
    }

    pub(super) fn norm_to_view(&self, value: Value) -> Result<Value, TransformationFailed> {
        let config = self.config();
        let chain = config.view_transformers();

        if chain.is_empty() && !config.compound() {
            // Tells an empty value apart from zero
            return Ok(match value {
                Value::Null => Value::String(String::new()),
                scalar if scalar.is_scalar() => {
                    Value::String(scalar.coerce_to_string().unwrap_or_default())
                }
                other => other,
            });
        }

        trace!("Transforming view data of \"{}\" ({} transformers)", self.name(), chain.len());
        chain.transform(value)
    }

    pub(super) fn view_to_norm(&self, value: Value) -> Result<Value, TransformationFailed> {
        let chain = self.config().view_transformers();
        if chain.is_empty() {
            return Ok(match value {
                Value::String(s) if s.is_empty() => Value::Null,
                other => other,
            });
        }
        chain.reverse_transform(value)
    }

    fn check_view_data(&self, view_data: &Value) -> Result<(), BlockError> {
        if view_data.is_empty() {
            return Ok(());
        }

        match (self.config().data_class(), view_data) {
            (Some(class), Value::Object(object)) if object.class() == class => Ok(()),
            (Some(class), other) => Err(BlockError::Logic(format!(
                "The view data of block \"{}\" is expected to be an instance of class {class}, but is {}. You can avoid this error by setting the \"data_class\" option to null or by adding a view transformer that transforms {} to an instance of {class}.",
                self.name(),
                other.describe(),
                other.describe(),
            ))),
            (None, Value::Object(object)) => Err(BlockError::Logic(format!(
                "The view data of block \"{}\" is expected to be a scalar, a list or a map, but is {}. You should set the \"data_class\" option to \"{}\" or add a view transformer that transforms {} to a scalar, a list or a map.",
                self.name(),
                view_data.describe(),
                object.class(),
                view_data.describe(),
            ))),
            (None, _) => Ok(()),
        }
    }
}
