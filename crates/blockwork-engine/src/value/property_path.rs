use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use super::Value;
use crate::error::BlockError;

/// One step of a [`PropertyPath`]: `.name` or `[key]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathElement {
    Property(String),
    Index(String),
}

impl PathElement {
    pub fn key(&self) -> &str {
        match self {
            PathElement::Property(name) | PathElement::Index(name) => name,
        }
    }
}

/// Location of a value inside a composite, e.g. `address.city` or `[0].name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyPath {
    elements: Vec<PathElement>,
}

static ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(\.?)([^.\[\]]+)|\[([^\[\]]+)\])").expect("property path pattern is valid")
});

impl PropertyPath {
    pub fn parse(path: &str) -> Result<Self, BlockError> {
        let mut elements = Vec::new();
        let mut position = 0;

        while position < path.len() {
            let rest = &path[position..];
            let captures = ELEMENT
                .captures(rest)
                .ok_or_else(|| unexpected_token(path, position))?;

            if let Some(index) = captures.get(3) {
                elements.push(PathElement::Index(index.as_str().to_string()));
            } else {
                let dotted = captures.get(1).is_some_and(|dot| !dot.as_str().is_empty());
                // A property needs a leading dot everywhere but at the start
                if dotted == (position == 0) {
                    return Err(unexpected_token(path, position));
                }
                let name = captures.get(2).map_or("", |m| m.as_str());
                elements.push(PathElement::Property(name.to_string()));
            }

            position += captures.get(0).map_or(rest.len(), |m| m.end());
        }

        if elements.is_empty() {
            return Err(BlockError::InvalidArgument(
                "The property path must not be empty.".to_string(),
            ));
        }

        Ok(Self { elements })
    }

    pub fn property(name: impl Into<String>) -> Self {
        Self {
            elements: vec![PathElement::Property(name.into())],
        }
    }

    pub fn index(key: impl Into<String>) -> Self {
        Self {
            elements: vec![PathElement::Index(key.into())],
        }
    }

    pub fn elements(&self) -> &[PathElement] {
        &self.elements
    }

    /// Read the value at this path, `None` when any step is missing.
    pub fn read<'a>(&self, data: &'a Value) -> Option<&'a Value> {
        self.elements
            .iter()
            .try_fold(data, |current, element| current.get(element.key()))
    }

    /// Write `value` at this path, creating intermediate maps for missing steps.
    pub fn write(&self, data: &mut Value, value: Value) -> Result<(), BlockError> {
        write_at(data, &self.elements, value)
    }
}

fn write_at(target: &mut Value, elements: &[PathElement], value: Value) -> Result<(), BlockError> {
    let Some((first, rest)) = elements.split_first() else {
        *target = value;
        return Ok(());
    };

    if target.is_null() {
        *target = Value::Map(Default::default());
    }

    // A list only grows by appending; any other key turns it into a map
    if let Value::List(items) = target {
        if !first.key().parse::<usize>().is_ok_and(|index| index <= items.len()) {
            let entries = std::mem::take(items)
                .into_iter()
                .enumerate()
                .map(|(index, item)| (index.to_string(), item))
                .collect();
            *target = Value::Map(entries);
        }
    }

    let slot = match target {
        Value::Map(entries) => entries.entry(first.key().to_string()).or_default(),
        Value::Object(object) => object
            .properties_mut()
            .entry(first.key().to_string())
            .or_default(),
        Value::List(items) => {
            let index = first.key().parse::<usize>().map_err(|_| {
                BlockError::InvalidArgument(format!(
                    "Cannot write list element \"{}\": not an index.",
                    first.key()
                ))
            })?;
            if index == items.len() {
                items.push(Value::Null);
            }
            &mut items[index]
        }
        other => return Err(BlockError::unexpected_type("map, list or object", other.kind())),
    };

    write_at(slot, rest, value)
}

fn unexpected_token(path: &str, position: usize) -> BlockError {
    BlockError::InvalidArgument(format!(
        "Could not parse property path \"{path}\". Unexpected token \"{}\" at position {position}.",
        path[position..].chars().next().unwrap_or(' ')
    ))
}

impl FromStr for PropertyPath {
    type Err = BlockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, element) in self.elements.iter().enumerate() {
            match element {
                PathElement::Property(name) if i == 0 => write!(f, "{name}")?,
                PathElement::Property(name) => write!(f, ".{name}")?,
                PathElement::Index(key) => write!(f, "[{key}]")?,
            }
        }
        Ok(())
    }
}
