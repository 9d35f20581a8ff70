use crate::geom::{self, Vec2};
use crate::registry::ChargeSnapshot;

/// Sources closer than this to the query point contribute no field.
pub const FIELD_SKIP_DISTANCE: f64 = 0.01;

/// Superposition of inverse-square point sources over one registry snapshot.
#[derive(Clone, Debug)]
pub struct FieldEvaluator {
    snapshot: ChargeSnapshot,
    coulomb_constant: f64,
}

impl FieldEvaluator {
    pub fn new(snapshot: ChargeSnapshot, coulomb_constant: f64) -> Self {
        Self {
            snapshot,
            coulomb_constant,
        }
    }

    pub fn snapshot(&self) -> &ChargeSnapshot {
        &self.snapshot
    }

    pub fn coulomb_constant(&self) -> f64 {
        self.coulomb_constant
    }

    /// Net field vector: sum of `k q / r^2` along the outward direction of
    /// every source, skipping sources within `FIELD_SKIP_DISTANCE`.
    pub fn field_at(&self, point: Vec2) -> Vec2 {
        let mut field = geom::ZERO;
        for source in self.snapshot.sources() {
            let direction = geom::sub(point, source.position);
            let distance = geom::length(direction);
            if distance < FIELD_SKIP_DISTANCE {
                continue;
            }
            let magnitude = self.coulomb_constant * source.charge / (distance * distance);
            field = geom::add(field, geom::scale(direction, magnitude / distance));
        }
        field
    }

    /// Net scalar potential. Inside a source's exclusion radius the distance
    /// is clamped to the radius, so the disc sits at its surface potential.
    pub fn potential_at(&self, point: Vec2) -> f64 {
        self.snapshot
            .sources()
            .iter()
            .map(|source| {
                let distance = geom::distance(point, source.position).max(source.exclusion_radius);
                self.coulomb_constant * source.charge / distance
            })
            .sum()
    }

    /// Field vector and potential at one point.
    pub fn sample_at(&self, point: Vec2) -> (Vec2, f64) {
        (self.field_at(point), self.potential_at(point))
    }
}
