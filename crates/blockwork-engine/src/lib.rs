pub mod block;
pub mod builder;
pub mod builtin;
pub mod config;
pub mod declared;
pub mod error;
pub mod events;
pub mod factory;
pub mod mapper;
pub mod options;
pub mod transformer;
pub mod types;
pub mod value;
pub mod view;

// Re-export key types for easier usage
pub use block::{Block, InheritDataAwareIter};
pub use builder::{BlockBuilder, ChildRef, TypeRef};
pub use builtin::CoreExtension;
pub use config::BlockConfig;
pub use declared::{DeclaredExtension, DeclaredType};
pub use error::BlockError;
pub use events::{BlockEvent, BlockEvents, EventDispatcher, EventSubscriber};
pub use factory::{BlockFactory, BlockFactoryBuilder};
pub use mapper::{DataMapper, PropertyPathMapper};
pub use options::{Options, OptionsError, OptionsResolver};
pub use transformer::{CallbackTransformer, DataTransformer, TransformationFailed};
pub use types::{
    BlockExtension, BlockType, BlockTypeExtension, Confidence, Parent, PreloadedExtension,
    Registry, ResolvedBlockType, TypeGuess, TypeGuesser,
};
pub use value::{Object, PropertyPath, Value, ValueKind};
pub use view::BlockView;
