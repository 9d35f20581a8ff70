use crate::color::{Color, ColorGradient};
use crate::geom;
use crate::grid::GridSpec;
use serde::{Deserialize, Serialize};
use std::{error::Error, fmt};

/// Full set of visualization inputs. Both sampling paths share the Coulomb
/// constant but each has its own lattice.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizationConfig {
    pub coulomb_constant: f64,
    pub vector: VectorFieldConfig,
    pub equipotential: EquipotentialConfig,
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            coulomb_constant: 8.987,
            vector: VectorFieldConfig::default(),
            equipotential: EquipotentialConfig::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorFieldConfig {
    pub grid: GridSpec,
    /// Drawn arrow length; arrows show direction only.
    pub vector_scale: f64,
    /// Field magnitude that maps to the top of the gradient.
    pub max_magnitude_for_color: f64,
    pub gradient: ColorGradient,
}

impl Default for VectorFieldConfig {
    fn default() -> Self {
        Self {
            grid: GridSpec::centered([0.0, 0.0], 1.0, [20, 20]),
            vector_scale: 0.1,
            max_magnitude_for_color: 100.0,
            gradient: ColorGradient::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EquipotentialConfig {
    /// `dimensions` counts cells; the sampled lattice has one extra node per axis.
    pub grid: GridSpec,
    pub contour_levels: Vec<f64>,
    pub line_color: Color,
}

impl Default for EquipotentialConfig {
    fn default() -> Self {
        Self {
            grid: GridSpec::centered([0.0, 0.0], 0.5, [40, 40]),
            contour_levels: vec![-20.0, -10.0, -5.0, 5.0, 10.0, 20.0],
            line_color: Color::GREEN,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    InvalidCellSize(f64),
    NonFiniteOrigin,
    EmptyGrid { dimensions: [usize; 2] },
    GridNodeCountOverflow,
    TooManyGridNodes { max: usize, actual: usize },
    NonFiniteCoulombConstant(f64),
    InvalidVectorScale(f64),
    InvalidMaxMagnitude(f64),
    NonFiniteContourLevel { index: usize, value: f64 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidCellSize(v) => {
                write!(f, "cell_size ({v}) must be finite and positive")
            }
            ConfigError::NonFiniteOrigin => write!(f, "grid origin must be finite"),
            ConfigError::EmptyGrid { dimensions } => write!(
                f,
                "grid dimensions ({} x {}) must both be positive",
                dimensions[0], dimensions[1]
            ),
            ConfigError::GridNodeCountOverflow => write!(f, "grid node count overflows usize"),
            ConfigError::TooManyGridNodes { max, actual } => {
                write!(f, "grid node count ({actual}) exceeds supported maximum ({max})")
            }
            ConfigError::NonFiniteCoulombConstant(v) => {
                write!(f, "coulomb_constant ({v}) must be finite")
            }
            ConfigError::InvalidVectorScale(v) => {
                write!(f, "vector_scale ({v}) must be finite and positive")
            }
            ConfigError::InvalidMaxMagnitude(v) => {
                write!(f, "max_magnitude_for_color ({v}) must be finite and positive")
            }
            ConfigError::NonFiniteContourLevel { index, value } => {
                write!(f, "contour level {index} ({value}) must be finite")
            }
        }
    }
}

impl Error for ConfigError {}

impl GridSpec {
    pub const MAX_NODES: usize = 1 << 24;

    /// Checks the lattice including the closing row/column of corners, so a
    /// spec that passes is safe for both samplers.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(ConfigError::InvalidCellSize(self.cell_size));
        }
        if !geom::is_finite(self.origin) {
            return Err(ConfigError::NonFiniteOrigin);
        }
        if self.dimensions[0] == 0 || self.dimensions[1] == 0 {
            return Err(ConfigError::EmptyGrid {
                dimensions: self.dimensions,
            });
        }
        let nodes = self
            .checked_corner_count()
            .ok_or(ConfigError::GridNodeCountOverflow)?;
        if nodes > Self::MAX_NODES {
            return Err(ConfigError::TooManyGridNodes {
                max: Self::MAX_NODES,
                actual: nodes,
            });
        }
        Ok(())
    }
}

pub(crate) fn validate_coulomb_constant(k: f64) -> Result<(), ConfigError> {
    if k.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFiniteCoulombConstant(k))
    }
}

impl VectorFieldConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.grid.validate()?;
        if !self.vector_scale.is_finite() || self.vector_scale <= 0.0 {
            return Err(ConfigError::InvalidVectorScale(self.vector_scale));
        }
        if !self.max_magnitude_for_color.is_finite() || self.max_magnitude_for_color <= 0.0 {
            return Err(ConfigError::InvalidMaxMagnitude(self.max_magnitude_for_color));
        }
        Ok(())
    }
}

impl EquipotentialConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.grid.validate()?;
        if let Some((index, &value)) = self
            .contour_levels
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite())
        {
            return Err(ConfigError::NonFiniteContourLevel { index, value });
        }
        Ok(())
    }
}

impl VisualizationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_coulomb_constant(self.coulomb_constant)?;
        self.vector.validate()?;
        self.equipotential.validate()
    }
}
