//! State module for tracking resolution progress
//!
//! # Components
//!
//! - `ResourceState`: the state machine each resolved URL walks through
//! - `Resource`: a URL together with the dataset that referenced it
//! - `Outcome`: the per-seed result written to the status table

mod outcome;
mod resource_state;

pub use outcome::Outcome;
pub use resource_state::{Resource, ResourceState};
