use crate::options::OptionsResolver;
use crate::types::{BlockType, Parent};

/// A single scalar value.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextType;

impl BlockType for TextType {
    fn name(&self) -> &str {
        "text"
    }

    fn parent(&self) -> Option<Parent> {
        Some(Parent::from("block"))
    }

    fn configure_options(&self, resolver: &mut OptionsResolver) {
        resolver.set_default("compound", false);
    }
}
