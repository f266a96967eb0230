use std::rc::Rc;

use crate::options::Options;

/// How sure a guesser is about its suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Confidence {
    Low,
    Medium,
    High,
    VeryHigh,
}

/// A suggested type for a property of a data class.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeGuess {
    pub type_name: String,
    pub options: Options,
    pub confidence: Confidence,
}

impl TypeGuess {
    pub fn new(type_name: impl Into<String>, options: Options, confidence: Confidence) -> Self {
        Self {
            type_name: type_name.into(),
            options,
            confidence,
        }
    }
}

pub trait TypeGuesser {
    fn guess_type(&self, class: &str, property: &str) -> Option<TypeGuess>;
}

/// Asks every guesser and keeps the most confident answer.
///
/// Only a strictly higher confidence replaces the current best guess, so on a
/// tie the guesser registered first wins.
#[derive(Clone, Default)]
pub struct TypeGuesserChain {
    guessers: Vec<Rc<dyn TypeGuesser>>,
}

impl TypeGuesserChain {
    pub fn new(guessers: Vec<Rc<dyn TypeGuesser>>) -> Self {
        Self { guessers }
    }

    pub fn is_empty(&self) -> bool {
        self.guessers.is_empty()
    }
}

impl TypeGuesser for TypeGuesserChain {
    fn guess_type(&self, class: &str, property: &str) -> Option<TypeGuess> {
        let mut best: Option<TypeGuess> = None;
        for guess in self
            .guessers
            .iter()
            .filter_map(|guesser| guesser.guess_type(class, property))
        {
            if best.as_ref().is_none_or(|b| guess.confidence > b.confidence) {
                best = Some(guess);
            }
        }
        best
    }
}
