//! Integer axis-aligned bounding boxes over chunk coordinates

use crate::core::types::IVec3;

/// Inclusive axis-aligned box of integer coordinates
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Aabb3 {
    pub min: IVec3,
    pub max: IVec3,
}

impl Aabb3 {
    /// Create a box from min and max corners (both inclusive)
    pub fn new(min: IVec3, max: IVec3) -> Self {
        Self { min, max }
    }

    /// Box of all points within `radius` of `center` in the Chebyshev metric
    pub fn from_center_radius(center: IVec3, radius: i32) -> Self {
        Self {
            min: center - IVec3::splat(radius),
            max: center + IVec3::splat(radius),
        }
    }

    /// Intersection of two boxes
    ///
    /// Collapses to a zero-volume box at the origin when the boxes do not
    /// properly overlap on some axis.
    pub fn overlap(&self, other: &Aabb3) -> Aabb3 {
        let result = Aabb3 {
            min: self.min.max(other.min),
            max: self.max.min(other.max),
        };
        if (result.max - result.min).cmple(IVec3::ZERO).any() {
            return Aabb3::default();
        }
        result
    }

    /// Whether `p` lies inside the box (inclusive on both corners)
    pub fn contains(&self, p: IVec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }
}
