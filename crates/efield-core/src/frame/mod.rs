
use crate::cancel::{CancelToken, Cancelled};
use crate::color::Color;
use crate::config::{ConfigError, VisualizationConfig};
use crate::contour::{self, ContourLine};
use crate::field::FieldEvaluator;
use crate::geom::LineSegment;
use crate::registry::{ChargeSnapshot, SharedRegistry};
use crate::sampler::{FieldArrow, PotentialGridSampler, VectorFieldSampler};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use std::{error::Error, fmt};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColoredSegment {
    pub segment: LineSegment,
    pub color: Color,
}

/// Wall-clock cost of each pass. Kept apart from [`RenderData`] so frames
/// over the same input compare equal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameTimings {
    pub vector_pass_us: u64,
    pub potential_pass_us: u64,
    pub contour_pass_us: u64,
    pub total_us: u64,
}

/// Everything the host draws for one refresh.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderData {
    pub field_segments: Vec<ColoredSegment>,
    pub equipotentials: Vec<ContourLine>,
    pub line_color: Color,
}

impl RenderData {
    pub fn contour_segment_count(&self) -> usize {
        self.equipotentials.iter().map(|c| c.segments.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameError {
    Config(ConfigError),
    Cancelled,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Config(e) => write!(f, "{}", e),
            FrameError::Cancelled => write!(f, "{}", Cancelled),
        }
    }
}

impl From<ConfigError> for FrameError {
    fn from(err: ConfigError) -> Self {
        FrameError::Config(err)
    }
}

impl From<Cancelled> for FrameError {
    fn from(_: Cancelled) -> Self {
        FrameError::Cancelled
    }
}

impl Error for FrameError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            FrameError::Config(e) => Some(e),
            FrameError::Cancelled => None,
        }
    }
}

fn micros_since(start: Instant) -> u64 {
    start.elapsed().as_micros() as u64
}

/// Compute one frame from an immutable snapshot. The vector and potential
/// paths only read the snapshot and run side by side.
pub fn compute_frame(
    snapshot: &ChargeSnapshot,
    config: &VisualizationConfig,
) -> Result<RenderData, ConfigError> {
    compute_frame_timed(snapshot, config).map(|(frame, _)| frame)
}

/// As [`compute_frame`], also returning how long each pass took.
pub fn compute_frame_timed(
    snapshot: &ChargeSnapshot,
    config: &VisualizationConfig,
) -> Result<(RenderData, FrameTimings), ConfigError> {
    match run_frame(snapshot, config, None) {
        Ok(timed) => Ok(timed),
        Err(FrameError::Config(e)) => Err(e),
        // No token, nothing can cancel.
        Err(FrameError::Cancelled) => unreachable!("uncancellable frame was cancelled"),
    }
}

/// Snapshot `registry` once and compute a frame over that snapshot; later
/// activations do not affect the pass.
pub fn compute_registry_frame(
    registry: &SharedRegistry,
    config: &VisualizationConfig,
) -> Result<RenderData, ConfigError> {
    compute_frame(&registry.snapshot(), config)
}

/// As [`compute_frame`], abandoning the pass once `cancel` is set.
pub fn compute_frame_cancellable(
    snapshot: &ChargeSnapshot,
    config: &VisualizationConfig,
    cancel: &CancelToken,
) -> Result<RenderData, FrameError> {
    run_frame(snapshot, config, Some(cancel)).map(|(frame, _)| frame)
}

fn run_frame(
    snapshot: &ChargeSnapshot,
    config: &VisualizationConfig,
    cancel: Option<&CancelToken>,
) -> Result<(RenderData, FrameTimings), FrameError> {
    config.validate()?;
    let total_start = Instant::now();
    let evaluator = FieldEvaluator::new(snapshot.clone(), config.coulomb_constant);
    let vector_sampler = VectorFieldSampler::from_config(&evaluator, &config.vector)?;
    let potential_sampler = PotentialGridSampler::new(&evaluator, config.equipotential.grid)?;

    let ((arrows, vector_pass_us), (contours, potential_pass_us, contour_pass_us)) = rayon::join(
        || {
            let t0 = Instant::now();
            let arrows = vector_sampler.sample(cancel);
            (arrows, micros_since(t0))
        },
        || -> (Result<Vec<ContourLine>, Cancelled>, u64, u64) {
            let t1 = Instant::now();
            let grid = match potential_sampler.sample(cancel) {
                Ok(grid) => grid,
                Err(e) => return (Err(e), micros_since(t1), 0),
            };
            let potential_us = micros_since(t1);
            if let Some(Err(e)) = cancel.map(CancelToken::check) {
                return (Err(e), potential_us, 0);
            }
            let t2 = Instant::now();
            let lines = contour::extract_levels(&grid, &config.equipotential.contour_levels);
            (Ok(lines), potential_us, micros_since(t2))
        },
    );

    let field_segments: Vec<ColoredSegment> = arrows?
        .iter()
        .filter_map(|arrow: &FieldArrow| {
            arrow.segment().map(|segment| ColoredSegment {
                segment,
                color: arrow.color,
            })
        })
        .collect();

    let timings = FrameTimings {
        vector_pass_us,
        potential_pass_us,
        contour_pass_us,
        total_us: micros_since(total_start),
    };
    log::debug!(
        "frame over {} charges: vector {}us, potential {}us, contours {}us",
        snapshot.len(),
        timings.vector_pass_us,
        timings.potential_pass_us,
        timings.contour_pass_us
    );

    let frame = RenderData {
        field_segments,
        equipotentials: contours?,
        line_color: config.equipotential.line_color,
    };
    Ok((frame, timings))
}
