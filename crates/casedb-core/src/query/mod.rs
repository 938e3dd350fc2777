//! Predicate resolution for child selection.
//!
//! The planner routes each batch to the backing store or the relationship
//! index; the combinator narrows the running candidate set.

mod combinator;
mod planner;

pub use combinator::intersect;
pub use planner::{BatchPlan, QueryPlanner};
