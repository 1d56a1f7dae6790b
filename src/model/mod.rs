pub mod entity;
pub mod kind;
pub mod options;
pub mod phase;
pub mod urn;

pub use entity::{
    EntityMetadata, EntityRepository, ForeignKeyRef, InCreationRegistry, NothingInCreation,
};
pub use kind::{FunctionType, IndexKeyType, IndexType, LoginType, ObjectType, UserType};
pub use options::{ScriptBehavior, ScriptingOptions};
pub use phase::PhaseTag;
pub use urn::Urn;
