//! Mathematical utilities for the voxel grid

pub mod aabb;
pub mod coords;

pub use aabb::Aabb3;
pub use coords::{
    floor_div, floor_mod, in_coord_range, pack_coord, position_to_index, to_index, unpack_coord,
    COORD_BITS, COORD_MAX, COORD_MIN, INVALID_PACKED,
};
