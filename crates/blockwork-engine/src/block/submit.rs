use indexmap::IndexMap;

use super::{Block, flatten};
use crate::error::BlockError;
use crate::events::{BlockEvent, BlockEvents};
use crate::transformer::TransformationFailed;
use crate::value::Value;

#[derive(Default)]
struct Submission {
    submitted: Value,
    model: Value,
    norm: Value,
    view: Value,
}

impl Block {
    /// Run submitted data back through the pipeline: children first, then the
    /// data mapper, then the view and model transformers in reverse.
    ///
    /// A transformer failure does not fail the call. It is recorded and the
    /// block reports itself as not synchronized.
    pub fn submit(&self, submitted: Value, clear_missing: bool) -> Result<(), BlockError> {
        if self.is_submitted() {
            return Err(BlockError::Logic(
                "A block can only be submitted once.".to_string(),
            ));
        }

        // Listeners to the set data events always run before submission
        self.ensure_default_data()?;

        let submitted = match submitted {
            Value::Bool(false) => Value::Null,
            scalar if scalar.is_scalar() => {
                Value::String(scalar.coerce_to_string().unwrap_or_default())
            }
            other => other,
        };

        let mut submission = Submission {
            submitted,
            ..Submission::default()
        };

        let failure = match self.process_submission(&mut submission, clear_missing) {
            Ok(()) => None,
            Err(BlockError::Transformation(failure)) => {
                // Keep the erroneous value reachable through the view data
                if submission.view.is_null() && !self.config().inherit_data() {
                    submission.view = submission.submitted.clone();
                }
                Some(failure)
            }
            Err(err) => return Err(err),
        };

        self.0.submitted.set(true);
        *self.0.model_data.borrow_mut() = submission.model.clone();
        *self.0.norm_data.borrow_mut() = submission.norm;
        *self.0.view_data.borrow_mut() = submission.view;
        *self.0.transformation_failure.borrow_mut() = failure;

        let dispatcher = self.config().event_dispatcher();
        if dispatcher.has_listeners(BlockEvents::PostSubmit) {
            let mut event = BlockEvent::new(self.clone(), submission.model);
            dispatcher.dispatch(BlockEvents::PostSubmit, &mut event)?;
        }

        Ok(())
    }

    pub fn is_submitted(&self) -> bool {
        self.0.submitted.get()
    }

    /// False when a transformer failed during submission.
    pub fn is_synchronized(&self) -> bool {
        self.0.transformation_failure.borrow().is_none()
    }

    pub fn transformation_failure(&self) -> Option<TransformationFailed> {
        self.0.transformation_failure.borrow().clone()
    }

    fn process_submission(
        &self,
        submission: &mut Submission,
        clear_missing: bool,
    ) -> Result<(), BlockError> {
        let config = self.config();
        let dispatcher = config.event_dispatcher();

        if dispatcher.has_listeners(BlockEvents::PreSubmit) {
            let data = std::mem::take(&mut submission.submitted);
            let mut event = BlockEvent::new(self.clone(), data);
            dispatcher.dispatch(BlockEvents::PreSubmit, &mut event)?;
            submission.submitted = event.into_data();
        }

        if config.compound() {
            if submission.submitted.is_null() {
                submission.submitted = Value::Map(IndexMap::new());
            }
            if !matches!(submission.submitted, Value::Map(_) | Value::List(_)) {
                return Err(TransformationFailed::new(
                    "Compound blocks expect a map, a list or null on submission.",
                )
                .into());
            }

            for child in self.children() {
                let value = submission.submitted.get(child.name()).cloned();
                if value.is_some() || clear_missing {
                    child.submit(value.unwrap_or_default(), clear_missing)?;
                }
            }
        }

        // Inheriting blocks leave the merge to the nearest ancestor holding data
        if config.inherit_data() {
            return Ok(());
        }

        let mut view = if config.compound() {
            self.0.view_data.borrow().clone()
        } else {
            submission.submitted.clone()
        };
        if view.is_empty() {
            view = config.empty_data().clone();
        }

        let children = self.children();
        if !children.is_empty() {
            if let Some(mapper) = config.data_mapper() {
                mapper.map_views_to_data(&flatten(children), &mut view)?;
            }
        }
        submission.view = view.clone();

        let mut norm = self.view_to_norm(view)?;
        if dispatcher.has_listeners(BlockEvents::Submit) {
            let mut event = BlockEvent::new(self.clone(), norm);
            dispatcher.dispatch(BlockEvents::Submit, &mut event)?;
            norm = event.into_data();
        }

        let model = self.norm_to_model(norm.clone())?;
        let view = self.norm_to_view(norm.clone())?;

        submission.model = model;
        submission.norm = norm;
        submission.view = view;
        Ok(())
    }
}
