use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use crate::value::Value;

/// Raised by a transformer that cannot convert a value. During submission it is
/// recorded on the block instead of being propagated.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct TransformationFailed {
    message: String,
}

impl TransformationFailed {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A reversible conversion between two representations of a block's data.
pub trait DataTransformer {
    fn transform(&self, value: Value) -> Result<Value, TransformationFailed>;

    fn reverse_transform(&self, value: Value) -> Result<Value, TransformationFailed>;
}

type TransformFn = dyn Fn(Value) -> Result<Value, TransformationFailed>;

/// Transformer built from two closures.
pub struct CallbackTransformer {
    transform: Box<TransformFn>,
    reverse: Box<TransformFn>,
}

impl CallbackTransformer {
    pub fn new<T, R>(transform: T, reverse: R) -> Self
    where
        T: Fn(Value) -> Result<Value, TransformationFailed> + 'static,
        R: Fn(Value) -> Result<Value, TransformationFailed> + 'static,
    {
        Self {
            transform: Box::new(transform),
            reverse: Box::new(reverse),
        }
    }
}

impl DataTransformer for CallbackTransformer {
    fn transform(&self, value: Value) -> Result<Value, TransformationFailed> {
        (self.transform)(value)
    }

    fn reverse_transform(&self, value: Value) -> Result<Value, TransformationFailed> {
        (self.reverse)(value)
    }
}

/// Ordered transformers. Forward runs first to last, reverse runs last to first.
#[derive(Clone, Default)]
pub struct TransformerChain {
    transformers: Vec<Rc<dyn DataTransformer>>,
}

impl TransformerChain {
    pub fn push(&mut self, transformer: Rc<dyn DataTransformer>) {
        self.transformers.push(transformer);
    }

    pub fn prepend(&mut self, transformer: Rc<dyn DataTransformer>) {
        self.transformers.insert(0, transformer);
    }

    pub fn clear(&mut self) {
        self.transformers.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.transformers.len()
    }

    pub fn transform(&self, value: Value) -> Result<Value, TransformationFailed> {
        self.transformers
            .iter()
            .try_fold(value, |value, transformer| transformer.transform(value))
    }

    pub fn reverse_transform(&self, value: Value) -> Result<Value, TransformationFailed> {
        self.transformers
            .iter()
            .rev()
            .try_fold(value, |value, transformer| transformer.reverse_transform(value))
    }
}

impl fmt::Debug for TransformerChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformerChain")
            .field("len", &self.transformers.len())
            .finish()
    }
}
