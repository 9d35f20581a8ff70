use crate::geom::{self, Vec2};
use serde::{Deserialize, Serialize};
use std::{error::Error, fmt};

/// Handle for a charge owned by the host scene. The registry tracks
/// membership by id and never owns the underlying object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChargeId(pub u64);

impl fmt::Display for ChargeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "charge#{}", self.0)
    }
}

/// Idealized point source. `exclusion_radius` is the disc inside which the
/// field is not drawn and the potential is clamped to its surface value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointChargeSource {
    pub position: Vec2,
    pub charge: f64,
    #[serde(default = "default_exclusion_radius")]
    pub exclusion_radius: f64,
}

fn default_exclusion_radius() -> f64 {
    PointChargeSource::DEFAULT_EXCLUSION_RADIUS
}

impl PointChargeSource {
    pub const DEFAULT_EXCLUSION_RADIUS: f64 = 0.5;

    pub fn new(position: Vec2, charge: f64, exclusion_radius: f64) -> Self {
        Self::try_new(position, charge, exclusion_radius).unwrap_or_else(|e| panic!("{e}"))
    }

    pub fn try_new(position: Vec2, charge: f64, exclusion_radius: f64) -> Result<Self, ChargeError> {
        let source = Self {
            position,
            charge,
            exclusion_radius,
        };
        source.validate()?;
        Ok(source)
    }

    pub fn validate(&self) -> Result<(), ChargeError> {
        if !geom::is_finite(self.position) {
            return Err(ChargeError::NonFinitePosition);
        }
        if !self.charge.is_finite() {
            return Err(ChargeError::NonFiniteCharge);
        }
        if !self.exclusion_radius.is_finite() || self.exclusion_radius < 0.0 {
            return Err(ChargeError::InvalidExclusionRadius(self.exclusion_radius));
        }
        Ok(())
    }

    /// Strictly inside the exclusion disc; the boundary itself is outside.
    #[inline]
    pub fn excludes(&self, point: Vec2) -> bool {
        geom::distance(point, self.position) < self.exclusion_radius
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChargeError {
    NonFinitePosition,
    NonFiniteCharge,
    InvalidExclusionRadius(f64),
    NotActive(ChargeId),
    AlreadyActive(ChargeId),
}

impl fmt::Display for ChargeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChargeError::NonFinitePosition => write!(f, "charge position must be finite"),
            ChargeError::NonFiniteCharge => write!(f, "charge magnitude must be finite"),
            ChargeError::InvalidExclusionRadius(r) => {
                write!(f, "exclusion radius ({r}) must be finite and non-negative")
            }
            ChargeError::NotActive(id) => write!(f, "{id} is not registered"),
            ChargeError::AlreadyActive(id) => write!(f, "{id} is already registered"),
        }
    }
}

impl Error for ChargeError {}
