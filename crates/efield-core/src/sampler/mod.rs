//! Grid walks over a charge snapshot: field arrows and potential corners.

pub mod potential;
pub mod vector;

pub use potential::{PotentialGrid, PotentialGridSampler};
pub use vector::{FieldArrow, VectorFieldSampler, DEGENERATE_FIELD_MAGNITUDE};
