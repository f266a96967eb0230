//! Option schemas for block types.
//!
//! Every resolved type owns an [`OptionsResolver`] built by cloning its parent's
//! schema and letting the type and its extensions declare on top of it. A
//! builder's options are the caller's map resolved against that schema.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value::{Value, ValueKind};

static NULL: Value = Value::Null;

/// A resolved (or to-be-resolved) option map, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Options(IndexMap<String, Value>);

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.shift_remove(name)
    }

    /// The value of an option, null when absent.
    pub fn value(&self, name: &str) -> &Value {
        self.0.get(name).unwrap_or(&NULL)
    }

    pub fn bool(&self, name: &str) -> bool {
        self.value(name).as_bool().unwrap_or(false)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.value(name).as_str()
    }

    /// Merge `other` on top of `self`; entries of `other` win.
    pub fn merge(&mut self, other: Options) {
        self.0.extend(other.0);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<IndexMap<String, Value>> for Options {
    fn from(map: IndexMap<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Options {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl IntoIterator for Options {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptionsError {
    #[error("The option \"{name}\" does not exist. Defined options are: \"{defined}\".")]
    Undefined { name: String, defined: String },

    #[error("The required option \"{0}\" is missing.")]
    Missing(String),

    #[error("The option \"{name}\" with value of kind \"{actual}\" is expected to be of kind \"{expected}\".")]
    InvalidKind {
        name: String,
        expected: String,
        actual: ValueKind,
    },

    #[error("The option \"{name}\" with value {value} is invalid. Accepted values are: {accepted}.")]
    InvalidValue {
        name: String,
        value: String,
        accepted: String,
    },
}

pub type LazyDefault = Rc<dyn Fn(&Options) -> Value>;
pub type Normalizer = Rc<dyn Fn(&Options, Value) -> Result<Value, OptionsError>>;

#[derive(Clone)]
enum DefaultValue {
    Static(Value),
    Lazy(LazyDefault),
}

#[derive(Clone, Default)]
struct OptionSpec {
    default: Option<DefaultValue>,
    required: bool,
    allowed_kinds: Vec<ValueKind>,
    allowed_values: Vec<Value>,
    normalizer: Option<Normalizer>,
}

#[derive(Clone, Default)]
pub struct OptionsResolver {
    specs: IndexMap<String, OptionSpec>,
}

impl OptionsResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_default(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        self.spec(name).default = Some(DefaultValue::Static(value.into()));
        self
    }

    /// Default computed from the options resolved so far.
    pub fn set_lazy_default<F>(&mut self, name: &str, default: F) -> &mut Self
    where
        F: Fn(&Options) -> Value + 'static,
    {
        self.spec(name).default = Some(DefaultValue::Lazy(Rc::new(default)));
        self
    }

    /// Accept the options without giving them a default.
    pub fn set_defined(&mut self, names: &[&str]) -> &mut Self {
        for name in names {
            self.spec(name);
        }
        self
    }

    pub fn set_required(&mut self, names: &[&str]) -> &mut Self {
        for name in names {
            self.spec(name).required = true;
        }
        self
    }

    pub fn set_allowed_kinds(&mut self, name: &str, kinds: &[ValueKind]) -> &mut Self {
        self.spec(name).allowed_kinds = kinds.to_vec();
        self
    }

    pub fn set_allowed_values(&mut self, name: &str, values: Vec<Value>) -> &mut Self {
        self.spec(name).allowed_values = values;
        self
    }

    pub fn set_normalizer<F>(&mut self, name: &str, normalizer: F) -> &mut Self
    where
        F: Fn(&Options, Value) -> Result<Value, OptionsError> + 'static,
    {
        self.spec(name).normalizer = Some(Rc::new(normalizer));
        self
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.specs.contains_key(name)
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.specs.get(name).is_some_and(|spec| spec.required)
    }

    pub fn has_default(&self, name: &str) -> bool {
        self.specs.get(name).is_some_and(|spec| spec.default.is_some())
    }

    pub fn defined_options(&self) -> Vec<&str> {
        self.specs.keys().map(String::as_str).collect()
    }

    pub fn resolve(&self, options: Options) -> Result<Options, OptionsError> {
        if let Some((name, _)) = options.iter().find(|(name, _)| !self.specs.contains_key(*name)) {
            let mut defined = self.defined_options();
            defined.sort_unstable();
            return Err(OptionsError::Undefined {
                name: name.clone(),
                defined: defined.join("\", \""),
            });
        }

        let mut supplied = options;
        let mut resolved = Options::new();
        let mut lazy = Vec::new();

        for (name, spec) in &self.specs {
            if let Some(value) = supplied.remove(name) {
                resolved.insert(name.clone(), value);
                continue;
            }
            match &spec.default {
                Some(DefaultValue::Static(value)) => {
                    resolved.insert(name.clone(), value.clone());
                }
                Some(DefaultValue::Lazy(default)) => lazy.push((name, default)),
                None if spec.required => return Err(OptionsError::Missing(name.clone())),
                None => {}
            }
        }

        for (name, default) in lazy {
            let value = default(&resolved);
            resolved.insert(name.clone(), value);
        }

        for (name, spec) in &self.specs {
            if let Some(value) = resolved.get(name) {
                Self::validate(name, spec, value)?;
            }
        }

        for (name, spec) in &self.specs {
            if let (Some(normalizer), Some(value)) = (&spec.normalizer, resolved.get(name)) {
                let normalized = normalizer(&resolved, value.clone())?;
                resolved.insert(name.clone(), normalized);
            }
        }

        Ok(resolved)
    }

    fn validate(name: &str, spec: &OptionSpec, value: &Value) -> Result<(), OptionsError> {
        if !spec.allowed_kinds.is_empty() && !spec.allowed_kinds.contains(&value.kind()) {
            let expected: Vec<String> = spec.allowed_kinds.iter().map(ToString::to_string).collect();
            return Err(OptionsError::InvalidKind {
                name: name.to_string(),
                expected: expected.join("\", \""),
                actual: value.kind(),
            });
        }

        if !spec.allowed_values.is_empty() && !spec.allowed_values.contains(value) {
            let accepted: Vec<String> = spec.allowed_values.iter().map(|v| format!("{v:?}")).collect();
            return Err(OptionsError::InvalidValue {
                name: name.to_string(),
                value: format!("{value:?}"),
                accepted: accepted.join(", "),
            });
        }

        Ok(())
    }

    fn spec(&mut self, name: &str) -> &mut OptionSpec {
        self.specs.entry(name.to_string()).or_default()
    }
}

impl fmt::Debug for OptionsResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionsResolver")
            .field("defined", &self.defined_options())
            .finish()
    }
}
