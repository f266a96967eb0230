use std::vec;

use super::Block;

/// Iterates blocks in order, replacing every block that inherits its parent's
/// data with its own children, at any depth.
pub struct InheritDataAwareIter {
    stack: Vec<vec::IntoIter<Block>>,
}

impl InheritDataAwareIter {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            stack: vec![blocks.into_iter()],
        }
    }
}

impl Iterator for InheritDataAwareIter {
    type Item = Block;

    fn next(&mut self) -> Option<Block> {
        loop {
            let level = self.stack.last_mut()?;
            match level.next() {
                Some(block) if block.config().inherit_data() => {
                    self.stack.push(block.children().into_iter());
                }
                Some(block) => return Some(block),
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

pub(crate) fn flatten(blocks: Vec<Block>) -> Vec<Block> {
    InheritDataAwareIter::new(blocks).collect()
}
