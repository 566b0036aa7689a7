pub mod component;
pub mod errors;
pub mod repository;
pub mod types;

pub use component::Component;
pub use errors::{Error, Result};
pub use repository::{Commit, ComponentRef, Diff, DiffKind, FixPattern, Repository};
pub use types::{ComponentKind, FeatureWeights, Granularity, Identity};
