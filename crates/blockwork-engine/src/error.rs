use blockwork_config::ConfigError;
use thiserror::Error;

use crate::options::OptionsError;
use crate::transformer::TransformationFailed;

/// Every failure the engine reports. All of them are raised synchronously to the
/// caller; nothing is retried internally.
#[derive(Debug, Error)]
pub enum BlockError {
    /// Unknown type names, unknown children, malformed names and paths.
    #[error("{0}")]
    InvalidArgument(String),

    /// A value does not have the shape an operation requires.
    #[error("Expected argument of type \"{expected}\", \"{actual}\" given")]
    UnexpectedType { expected: String, actual: String },

    /// Structural misuse detectable while configuring a tree.
    #[error("{0}")]
    Logic(String),

    /// Misuse detectable only while the tree runs (bind cycles, orphaned inherit-data blocks).
    #[error("{0}")]
    Runtime(String),

    /// A sealed builder was used after being turned into a block.
    #[error("{0}")]
    BadMethodCall(String),

    #[error("An error has occurred resolving the options of the block type \"{type_name}\": {source}")]
    Options {
        type_name: String,
        source: OptionsError,
    },

    #[error(transparent)]
    Transformation(#[from] TransformationFailed),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl BlockError {
    pub(crate) fn unexpected_type(expected: impl Into<String>, actual: impl ToString) -> Self {
        Self::UnexpectedType {
            expected: expected.into(),
            actual: actual.to_string(),
        }
    }

    pub(crate) fn sealed() -> Self {
        Self::BadMethodCall(
            "BlockBuilder methods cannot be accessed anymore once the builder is turned into a BlockConfig instance."
                .to_string(),
        )
    }
}
