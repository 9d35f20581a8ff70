use crate::cancel::{CancelToken, Cancelled};
use crate::config::ConfigError;
use crate::field::FieldEvaluator;
use crate::geom::Vec2;
use crate::grid::GridSpec;
use rayon::prelude::*;

/// Dense potential values on the corners of a `width x height` cell grid,
/// i.e. `(width + 1) x (height + 1)` nodes stored column by column.
#[derive(Clone, Debug, PartialEq)]
pub struct PotentialGrid {
    spec: GridSpec,
    values: Vec<f64>,
}

impl PotentialGrid {
    /// Fill every corner node from `f`. Used for synthetic grids as well as
    /// by the sampler's sequential path.
    pub fn from_fn(spec: GridSpec, f: impl Fn(Vec2) -> f64) -> Result<Self, ConfigError> {
        spec.validate()?;
        let stride = spec.height() + 1;
        let values = (0..=spec.width())
            .flat_map(|i| (0..stride).map(move |j| (i, j)))
            .map(|(i, j)| f(spec.point(i, j)))
            .collect();
        Ok(Self { spec, values })
    }

    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    /// Number of corner nodes per axis.
    pub fn node_dimensions(&self) -> [usize; 2] {
        [self.spec.width() + 1, self.spec.height() + 1]
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * (self.spec.height() + 1) + j]
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// (min, max) over all nodes.
    pub fn range(&self) -> (f64, f64) {
        self.values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }
}

/// Evaluates the scalar potential at every corner node of a grid.
pub struct PotentialGridSampler<'a> {
    evaluator: &'a FieldEvaluator,
    grid: GridSpec,
}

impl<'a> PotentialGridSampler<'a> {
    pub fn new(evaluator: &'a FieldEvaluator, grid: GridSpec) -> Result<Self, ConfigError> {
        grid.validate()?;
        Ok(Self { evaluator, grid })
    }

    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    /// Fill the grid, one column per rayon task.
    pub fn sample(&self, cancel: Option<&CancelToken>) -> Result<PotentialGrid, Cancelled> {
        let stride = self.grid.height() + 1;
        let mut values = vec![0.0f64; (self.grid.width() + 1) * stride];
        values
            .par_chunks_mut(stride)
            .enumerate()
            .try_for_each(|(i, column)| -> Result<(), Cancelled> {
                if let Some(token) = cancel {
                    token.check()?;
                }
                for (j, v) in column.iter_mut().enumerate() {
                    *v = self.evaluator.potential_at(self.grid.point(i, j));
                }
                Ok(())
            })?;
        log::debug!(
            "potential pass: {} x {} nodes",
            self.grid.width() + 1,
            stride
        );
        Ok(PotentialGrid {
            spec: self.grid,
            values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charge::PointChargeSource;
    use crate::registry::ChargeSnapshot;

    fn evaluator(sources: Vec<PointChargeSource>) -> FieldEvaluator {
        FieldEvaluator::new(ChargeSnapshot::from_sources(sources).unwrap(), 2.0)
    }

    #[test]
    fn grid_has_closing_row_and_column() {
        let eval = evaluator(vec![PointChargeSource::new([0.5, 0.5], 1.0, 0.2)]);
        let spec = GridSpec::new([0.0, 0.0], 0.5, [4, 3]);
        let grid = PotentialGridSampler::new(&eval, spec).unwrap().sample(None).unwrap();
        assert_eq!(grid.node_dimensions(), [5, 4]);
        assert_eq!(grid.values().len(), 20);
        let corner = spec.point(4, 3);
        assert_eq!(grid.get(4, 3), eval.potential_at(corner));
    }

    #[test]
    fn parallel_sample_matches_from_fn() {
        let eval = evaluator(vec![
            PointChargeSource::new([1.0, 1.0], 3.0, 0.3),
            PointChargeSource::new([3.0, 2.0], -1.0, 0.3),
        ]);
        let spec = GridSpec::new([-1.0, -1.0], 0.25, [24, 17]);
        let sampled = PotentialGridSampler::new(&eval, spec).unwrap().sample(None).unwrap();
        let direct = PotentialGrid::from_fn(spec, |p| eval.potential_at(p)).unwrap();
        assert_eq!(sampled, direct);
    }

    #[test]
    fn repeated_passes_are_deterministic() {
        let eval = evaluator(vec![PointChargeSource::new([0.3, -0.2], -4.0, 0.5)]);
        let sampler = PotentialGridSampler::new(&eval, GridSpec::default()).unwrap();
        assert_eq!(sampler.sample(None), sampler.sample(None));
    }

    #[test]
    fn empty_snapshot_yields_zero_grid() {
        let eval = evaluator(Vec::new());
        let grid = PotentialGridSampler::new(&eval, GridSpec::default())
            .unwrap()
            .sample(None)
            .unwrap();
        assert_eq!(grid.range(), (0.0, 0.0));
    }

    #[test]
    fn cancelled_pass_returns_error() {
        let eval = evaluator(Vec::new());
        let sampler = PotentialGridSampler::new(&eval, GridSpec::default()).unwrap();
        let token = CancelToken::new();
        token.cancel();
        assert_eq!(sampler.sample(Some(&token)), Err(Cancelled));
    }

    #[test]
    fn malformed_grid_is_rejected() {
        let eval = evaluator(Vec::new());
        let spec = GridSpec::new([0.0, 0.0], 1.0, [0, 4]);
        assert!(PotentialGridSampler::new(&eval, spec).is_err());
        assert!(PotentialGrid::from_fn(spec, |_| 0.0).is_err());
    }
}
