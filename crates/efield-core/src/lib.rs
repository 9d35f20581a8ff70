//! Field and potential evaluation for a 2D set of point charges, with
//! field-arrow sampling and marching-squares equipotential extraction.

pub mod cancel;
pub mod charge;
pub mod color;
pub mod config;
pub mod contour;
pub mod field;
pub mod frame;
pub mod geom;
pub mod grid;
pub mod layout;
pub mod registry;
pub mod sampler;
pub mod spatial;

pub use cancel::{CancelToken, Cancelled};
pub use charge::{ChargeError, ChargeId, PointChargeSource};
pub use color::{Color, ColorGradient, ColorMap, GradientKey};
pub use config::{ConfigError, EquipotentialConfig, VectorFieldConfig, VisualizationConfig};
pub use contour::ContourLine;
pub use field::FieldEvaluator;
pub use frame::{
    compute_frame, compute_frame_cancellable, compute_frame_timed, compute_registry_frame,
    ColoredSegment, FrameError, FrameTimings, RenderData,
};
pub use geom::{LineSegment, Vec2};
pub use grid::GridSpec;
pub use layout::{regenerate, DipoleArray, DipoleArrayConfig};
pub use registry::{ChargeRegistry, ChargeSnapshot, SharedRegistry};
pub use sampler::{FieldArrow, PotentialGrid, PotentialGridSampler, VectorFieldSampler};
