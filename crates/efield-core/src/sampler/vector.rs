use crate::cancel::{CancelToken, Cancelled};
use crate::color::{Color, ColorMap};
use crate::config::{ConfigError, VectorFieldConfig};
use crate::field::FieldEvaluator;
use crate::geom::{self, LineSegment, Vec2};
use crate::grid::GridSpec;
use crate::spatial::ExclusionIndex;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Below this magnitude the field direction is treated as undefined.
pub const DEGENERATE_FIELD_MAGNITUDE: f64 = 1e-9;

/// One sampled, non-excluded grid node.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldArrow {
    pub position: Vec2,
    pub field: Vec2,
    pub magnitude: f64,
    /// Unit field direction, or zero when the field cancels out.
    pub direction: Vec2,
    /// `position + direction * vector_scale`.
    pub tip: Vec2,
    pub color: Color,
}

impl FieldArrow {
    pub fn is_degenerate(&self) -> bool {
        self.direction == geom::ZERO
    }

    /// Drawable segment; `None` for a cancelled-out field.
    pub fn segment(&self) -> Option<LineSegment> {
        (!self.is_degenerate()).then(|| LineSegment::new(self.position, self.tip))
    }
}

/// Walks the nodes `(i, j)` for `i < width`, `j < height`, skipping nodes
/// inside any exclusion disc. Node order is column by column (`i` outer).
pub struct VectorFieldSampler<'a> {
    evaluator: &'a FieldEvaluator,
    exclusion: ExclusionIndex,
    grid: GridSpec,
    vector_scale: f64,
    max_magnitude_for_color: f64,
    colors: &'a dyn ColorMap,
}

impl<'a> VectorFieldSampler<'a> {
    pub fn new(
        evaluator: &'a FieldEvaluator,
        config: &VectorFieldConfig,
        colors: &'a dyn ColorMap,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            evaluator,
            exclusion: ExclusionIndex::build(evaluator.snapshot()),
            grid: config.grid,
            vector_scale: config.vector_scale,
            max_magnitude_for_color: config.max_magnitude_for_color,
            colors,
        })
    }

    /// Sampler coloured by the config's own gradient.
    pub fn from_config(
        evaluator: &'a FieldEvaluator,
        config: &'a VectorFieldConfig,
    ) -> Result<Self, ConfigError> {
        Self::new(evaluator, config, &config.gradient)
    }

    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    fn arrow_at(&self, i: usize, j: usize) -> Option<FieldArrow> {
        let position = self.grid.point(i, j);
        if self.exclusion.is_excluded(position) {
            return None;
        }
        let field = self.evaluator.field_at(position);
        let magnitude = geom::length(field);
        let direction = if magnitude.is_finite() && magnitude > DEGENERATE_FIELD_MAGNITUDE {
            geom::scale(field, 1.0 / magnitude)
        } else {
            geom::ZERO
        };
        let normalized = (magnitude / self.max_magnitude_for_color).clamp(0.0, 1.0);
        Some(FieldArrow {
            position,
            field,
            magnitude,
            direction,
            tip: geom::add(position, geom::scale(direction, self.vector_scale)),
            color: self.colors.map(normalized),
        })
    }

    fn column(&self, i: usize) -> impl Iterator<Item = FieldArrow> + '_ {
        (0..self.grid.height()).filter_map(move |j| self.arrow_at(i, j))
    }

    /// Lazy, sequential walk of the grid.
    pub fn iter(&self) -> impl Iterator<Item = FieldArrow> + '_ {
        (0..self.grid.width()).flat_map(move |i| self.column(i))
    }

    /// Same arrows as `iter`, in the same order, evaluated column-parallel.
    pub fn sample(&self, cancel: Option<&CancelToken>) -> Result<Vec<FieldArrow>, Cancelled> {
        let columns = (0..self.grid.width())
            .into_par_iter()
            .map(|i| -> Result<Vec<FieldArrow>, Cancelled> {
                if let Some(token) = cancel {
                    token.check()?;
                }
                Ok(self.column(i).collect())
            })
            .collect::<Result<Vec<_>, Cancelled>>()?;
        let arrows: Vec<FieldArrow> = columns.into_iter().flatten().collect();
        log::debug!(
            "vector pass: {} of {} nodes drawn",
            arrows.len(),
            self.grid.width() * self.grid.height()
        );
        Ok(arrows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charge::PointChargeSource;
    use crate::registry::ChargeSnapshot;

    fn config(origin: Vec2, dims: [usize; 2]) -> VectorFieldConfig {
        VectorFieldConfig {
            grid: GridSpec::new(origin, 1.0, dims),
            vector_scale: 0.25,
            max_magnitude_for_color: 10.0,
            ..VectorFieldConfig::default()
        }
    }

    fn evaluator(sources: Vec<PointChargeSource>) -> FieldEvaluator {
        FieldEvaluator::new(ChargeSnapshot::from_sources(sources).unwrap(), 1.0)
    }

    #[test]
    fn excluded_nodes_are_skipped() {
        // 5x5 nodes at integer coords 0..=4; radius 1.5 around (2, 2) covers
        // the center, its 4 axis neighbours and 4 diagonals (dist ~1.414).
        let eval = evaluator(vec![PointChargeSource::new([2.0, 2.0], 1.0, 1.5)]);
        let cfg = config([0.0, 0.0], [5, 5]);
        let sampler = VectorFieldSampler::from_config(&eval, &cfg).unwrap();
        let arrows: Vec<FieldArrow> = sampler.iter().collect();
        assert_eq!(arrows.len(), 25 - 9);
        assert!(arrows
            .iter()
            .all(|a| geom::distance(a.position, [2.0, 2.0]) >= 1.5));
    }

    #[test]
    fn parallel_sample_matches_lazy_iteration() {
        let eval = evaluator(vec![
            PointChargeSource::new([1.3, 2.1], 3.0, 0.4),
            PointChargeSource::new([6.2, 4.4], -2.0, 0.8),
        ]);
        let cfg = config([0.0, 0.0], [9, 7]);
        let sampler = VectorFieldSampler::from_config(&eval, &cfg).unwrap();
        let lazy: Vec<FieldArrow> = sampler.iter().collect();
        let parallel = sampler.sample(None).unwrap();
        assert_eq!(lazy, parallel);
    }

    #[test]
    fn arrows_have_uniform_length_and_field_direction() {
        let eval = evaluator(vec![PointChargeSource::new([0.0, 0.0], 5.0, 0.5)]);
        let cfg = config([-3.0, -3.0], [7, 7]);
        let sampler = VectorFieldSampler::from_config(&eval, &cfg).unwrap();
        for arrow in sampler.iter() {
            let seg = arrow.segment().unwrap();
            assert!((seg.length() - 0.25).abs() < 1e-12);
            let dot = arrow.direction[0] * arrow.field[0] + arrow.direction[1] * arrow.field[1];
            assert!((dot - arrow.magnitude).abs() < 1e-9 * (1.0 + arrow.magnitude));
        }
    }

    #[test]
    fn color_uses_clamped_normalized_magnitude() {
        let eval = evaluator(vec![PointChargeSource::new([0.0, 0.0], 40.0, 0.1)]);
        let cfg = config([1.0, 0.0], [10, 1]);
        let gray = |t: f64| Color::rgb(t as f32, t as f32, t as f32);
        let sampler = VectorFieldSampler::new(&eval, &cfg, &gray).unwrap();
        let arrows: Vec<FieldArrow> = sampler.iter().collect();
        // |E| at x=1 is 40 (clamped to 1.0); at x=4 it is 2.5 -> 0.25.
        assert_eq!(arrows[0].color, Color::rgb(1.0, 1.0, 1.0));
        assert!((arrows[3].color.r - 0.25).abs() < 1e-6);
    }

    #[test]
    fn cancelling_field_emits_degenerate_arrow_without_nan() {
        let eval = evaluator(vec![
            PointChargeSource::new([-1.0, 0.0], 2.0, 0.1),
            PointChargeSource::new([1.0, 0.0], 2.0, 0.1),
        ]);
        let cfg = config([0.0, 0.0], [1, 1]);
        let sampler = VectorFieldSampler::from_config(&eval, &cfg).unwrap();
        let arrows = sampler.sample(None).unwrap();
        assert_eq!(arrows.len(), 1);
        let arrow = arrows[0];
        assert!(arrow.is_degenerate());
        assert!(arrow.magnitude < 1e-12);
        assert!(geom::is_finite(arrow.tip));
        assert_eq!(arrow.tip, arrow.position);
        assert_eq!(arrow.segment(), None);
    }

    #[test]
    fn empty_snapshot_yields_only_degenerate_arrows() {
        let eval = evaluator(Vec::new());
        let cfg = config([0.0, 0.0], [4, 3]);
        let sampler = VectorFieldSampler::from_config(&eval, &cfg).unwrap();
        let arrows = sampler.sample(None).unwrap();
        assert_eq!(arrows.len(), 12);
        assert!(arrows.iter().all(|a| a.is_degenerate() && a.field == geom::ZERO));
    }

    #[test]
    fn cancelled_pass_returns_error() {
        let eval = evaluator(vec![PointChargeSource::new([0.0, 0.0], 1.0, 0.1)]);
        let cfg = config([0.0, 0.0], [8, 8]);
        let sampler = VectorFieldSampler::from_config(&eval, &cfg).unwrap();
        let token = CancelToken::new();
        token.cancel();
        assert_eq!(sampler.sample(Some(&token)), Err(Cancelled));
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let eval = evaluator(Vec::new());
        let mut cfg = config([0.0, 0.0], [4, 4]);
        cfg.grid.cell_size = -0.5;
        assert!(matches!(
            VectorFieldSampler::from_config(&eval, &cfg),
            Err(ConfigError::InvalidCellSize(_))
        ));
    }
}
