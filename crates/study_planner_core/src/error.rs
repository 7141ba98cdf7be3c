//! crates/study_planner_core/src/error.rs
//!
//! Errors raised while validating, scheduling and persisting a study plan.

use crate::ports::PortError;

#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    /// The request was rejected before any scheduling took place.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The scheduler refused to place work past its horizon.
    #[error("Allocation error: {0}")]
    Allocation(String),

    /// A read or write through the persistence port failed.
    #[error("Persistence error: {0}")]
    Persistence(#[from] PortError),
}

pub type PlannerResult<T> = Result<T, PlannerError>;
