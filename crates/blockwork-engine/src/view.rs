use std::rc::Rc;

use indexmap::IndexMap;
use serde::Serialize;

use crate::value::Value;

/// What a child view sees of its parent: the parent's variables as they were
/// after the parent's `build_view` chain ran.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewParent {
    pub vars: IndexMap<String, Value>,
    pub parent: Option<Rc<ViewParent>>,
}

impl ViewParent {
    pub fn var(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }
}

/// Render-oriented projection of a block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockView {
    pub vars: IndexMap<String, Value>,
    pub children: IndexMap<String, BlockView>,
    #[serde(skip)]
    pub parent: Option<Rc<ViewParent>>,
    #[serde(skip)]
    rendered: bool,
}

impl BlockView {
    pub fn new(parent: Option<Rc<ViewParent>>) -> Self {
        let mut vars = IndexMap::new();
        vars.insert("value".to_string(), Value::Null);
        vars.insert("attr".to_string(), Value::Map(IndexMap::new()));

        Self {
            vars,
            children: IndexMap::new(),
            parent,
            rendered: false,
        }
    }

    pub fn var(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn set_var(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn child(&self, name: &str) -> Option<&BlockView> {
        self.children.get(name)
    }

    /// A view with children counts as rendered once all of them are.
    pub fn is_rendered(&self) -> bool {
        if self.rendered || self.children.is_empty() {
            return self.rendered;
        }
        self.children.values().all(BlockView::is_rendered)
    }

    pub fn set_rendered(&mut self) {
        self.rendered = true;
    }

    /// Snapshot handed to child views as their parent.
    pub(crate) fn as_parent(&self) -> Rc<ViewParent> {
        Rc::new(ViewParent {
            vars: self.vars.clone(),
            parent: self.parent.clone(),
        })
    }
}
