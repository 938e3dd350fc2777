//! Per-collection engine instances.

mod instance;
mod projection;

pub use instance::CaseInstance;
pub use projection::{Projection, ProjectionLoader};
