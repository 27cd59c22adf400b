//! Distance-ordered sweep offsets

use crate::core::types::IVec3;

/// Every integer offset within a cubic radius, sorted ascending by squared
/// distance from the origin
///
/// Sweeping this list loads the nearest chunks first, so the viewer sees
/// progress expand outward from the center.
pub struct RadiusIterator {
    offsets: Vec<IVec3>,
}

impl RadiusIterator {
    pub fn new(radius: i32) -> Self {
        let side = (2 * radius.max(0) + 1) as usize;
        let mut offsets = Vec::with_capacity(side * side * side);
        for z in -radius..=radius {
            for y in -radius..=radius {
                for x in -radius..=radius {
                    offsets.push(IVec3::new(x, y, z));
                }
            }
        }
        offsets.sort_by_key(|o| o.length_squared());
        Self { offsets }
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn offsets(&self) -> &[IVec3] {
        &self.offsets
    }

    pub fn into_offsets(self) -> Vec<IVec3> {
        self.offsets
    }
}
