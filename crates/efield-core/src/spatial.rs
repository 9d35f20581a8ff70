use crate::geom::Vec2;
use crate::registry::ChargeSnapshot;
use rstar::{RTree, RTreeObject, AABB};

/// Exclusion disc of one source, indexed by its bounding box.
#[derive(Clone, Copy, Debug)]
pub struct ExclusionDisc {
    pub center: Vec2,
    pub radius: f64,
}

impl RTreeObject for ExclusionDisc {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.center[0] - self.radius, self.center[1] - self.radius],
            [self.center[0] + self.radius, self.center[1] + self.radius],
        )
    }
}

/// Point-in-any-disc queries over a snapshot's exclusion radii.
pub struct ExclusionIndex {
    tree: RTree<ExclusionDisc>,
}

impl ExclusionIndex {
    /// Build via bulk_load (O(n log n)). Zero-radius sources can never
    /// exclude a point and are left out.
    pub fn build(snapshot: &ChargeSnapshot) -> Self {
        let discs: Vec<ExclusionDisc> = snapshot
            .sources()
            .iter()
            .filter(|s| s.exclusion_radius > 0.0)
            .map(|s| ExclusionDisc {
                center: s.position,
                radius: s.exclusion_radius,
            })
            .collect();
        Self {
            tree: RTree::bulk_load(discs),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// True if `point` lies strictly inside any disc. Envelope hit first,
    /// then the exact Euclidean test.
    pub fn is_excluded(&self, point: Vec2) -> bool {
        let probe = AABB::from_point(point);
        self.tree
            .locate_in_envelope_intersecting(&probe)
            .any(|disc| {
                let dx = point[0] - disc.center[0];
                let dy = point[1] - disc.center[1];
                dx * dx + dy * dy < disc.radius * disc.radius
            })
    }
}
