use crate::charge::{ChargeError, ChargeId, PointChargeSource};
use crate::geom::{self, Vec2};
use crate::registry::SharedRegistry;
use serde::{Deserialize, Serialize};

/// Evenly spaced charges along a line: negative tail, positive head and
/// neutral charges in between.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DipoleArrayConfig {
    pub origin: Vec2,
    /// Counter-clockwise angle of the array axis, radians.
    pub rotation: f64,
    pub charge_count: usize,
    pub length: f64,
    pub base_charge: f64,
    pub charge_radius: f64,
}

impl Default for DipoleArrayConfig {
    fn default() -> Self {
        Self {
            origin: [0.0, 0.0],
            rotation: 0.0,
            charge_count: 10,
            length: 4.0,
            base_charge: 50.0,
            charge_radius: 0.1,
        }
    }
}

/// Place the array's charges in world space. Fewer than two charges
/// produce an empty layout.
pub fn regenerate(config: &DipoleArrayConfig) -> Result<Vec<PointChargeSource>, ChargeError> {
    let n = config.charge_count;
    if n <= 1 {
        return Ok(Vec::new());
    }
    let half = config.length / 2.0;
    (0..n)
        .map(|i| {
            let t = i as f64 / (n - 1) as f64;
            let local = [-half + (config.length * t), 0.0];
            let position = geom::add(config.origin, geom::rotate(local, config.rotation));
            let charge = if i == n - 1 {
                config.base_charge
            } else if i == 0 {
                -config.base_charge
            } else {
                0.0
            };
            PointChargeSource::try_new(position, charge, config.charge_radius)
        })
        .collect()
}

/// A generated array that owns the ids it registered, so regenerating
/// replaces its previous charges instead of piling up duplicates.
#[derive(Debug)]
pub struct DipoleArray {
    first_id: u64,
    active: Vec<ChargeId>,
}

impl DipoleArray {
    /// Ids are allocated from `first_id` upward, one per charge slot.
    pub fn new(first_id: u64) -> Self {
        Self {
            first_id,
            active: Vec::new(),
        }
    }

    pub fn active_ids(&self) -> &[ChargeId] {
        &self.active
    }

    /// Swap the array's registered charges for a fresh layout under one
    /// write lock. Fails without touching the registry if the layout is
    /// invalid or a slot id is held by a charge this array does not own.
    pub fn regenerate_into(
        &mut self,
        registry: &SharedRegistry,
        config: &DipoleArrayConfig,
    ) -> Result<usize, ChargeError> {
        let sources = regenerate(config)?;
        let ids: Vec<ChargeId> = (0..sources.len())
            .map(|slot| ChargeId(self.first_id + slot as u64))
            .collect();
        let previous = &self.active;
        registry.write(|r| {
            if let Some(&taken) = ids
                .iter()
                .find(|id| r.contains(**id) && !previous.contains(id))
            {
                return Err(ChargeError::AlreadyActive(taken));
            }
            for id in previous {
                r.deactivate(*id);
            }
            for (id, source) in ids.iter().zip(&sources) {
                // Slots were just freed and sources validated by `regenerate`.
                r.activate(*id, *source)?;
            }
            Ok(())
        })?;
        log::info!(
            "dipole array regenerated: {} charges replaced by {}",
            self.active.len(),
            ids.len()
        );
        self.active = ids;
        Ok(self.active.len())
    }

    /// Deregister every charge this array created.
    pub fn clear(&mut self, registry: &SharedRegistry) {
        let ids = std::mem::take(&mut self.active);
        registry.write(|r| {
            for id in ids {
                r.deactivate(id);
            }
        });
    }
}
