// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Object specs, stages, file areas, lifecycles, and phantom-typed ids.

mod area;
mod id;
mod object_spec;
mod stage;

pub use area::{AreaType, FileArea, Lifecycle};
pub use id::{ExecutionId, Id, JobName};
pub use object_spec::{ObjectSpec, ObjectSpecError};
pub use stage::StageId;
