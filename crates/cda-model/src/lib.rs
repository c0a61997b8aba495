pub mod cancel;
pub mod error;
pub mod graph;
pub mod ids;
pub mod kind;
pub mod options;
pub mod processing;
pub mod record;
pub mod resource;
pub mod summary;

pub use cancel::CancelToken;
pub use error::{ModelError, Result, TransformError};
pub use graph::ResourceGraph;
pub use ids::{IdentifierEntry, NaturalKey, ResourceId};
pub use kind::ResourceKind;
pub use options::{MAX_SAMPLE, TransformOptions};
pub use processing::{FieldWarning, RunReport, SkippedRecord};
pub use record::SourceRecord;
pub use resource::{ReferenceSlot, SlotState, TargetResource};
pub use summary::{DanglingReference, ValidationSummary};
