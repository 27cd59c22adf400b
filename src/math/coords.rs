//! Signed grid coordinate math and single-word packed coordinates

use crate::core::types::IVec3;

/// Bits reserved per axis in a packed coordinate
pub const COORD_BITS: u32 = 21;

/// Largest representable coordinate component, inclusive
pub const COORD_MAX: i32 = (1 << (COORD_BITS - 1)) - 1;

/// Smallest representable coordinate component, inclusive
pub const COORD_MIN: i32 = -(1 << (COORD_BITS - 1));

const AXIS_MASK: u64 = (1 << COORD_BITS) - 1;

/// Sentinel that no packed coordinate can equal
///
/// A pack occupies bits 0..63, so bit 63 is clear in every valid value.
pub const INVALID_PACKED: u64 = u64::MAX;

/// Component-wise floor division (rounds toward negative infinity)
pub fn floor_div(a: IVec3, b: IVec3) -> IVec3 {
    IVec3::new(
        a.x.div_euclid(b.x),
        a.y.div_euclid(b.y),
        a.z.div_euclid(b.z),
    )
}

/// Component-wise floor modulo, in `[0, b)` for positive `b`
pub fn floor_mod(a: IVec3, b: IVec3) -> IVec3 {
    IVec3::new(
        a.x.rem_euclid(b.x),
        a.y.rem_euclid(b.y),
        a.z.rem_euclid(b.z),
    )
}

/// Row-major linear index of `p` inside a box of dimensions `dim`
///
/// Expects `0 <= p < dim` component-wise.
pub fn to_index(p: IVec3, dim: IVec3) -> usize {
    ((p.z * dim.y + p.y) * dim.x + p.x) as usize
}

/// Ring-array slot for an arbitrary coordinate, `to_index(floor_mod(p, dim), dim)`
pub fn position_to_index(p: IVec3, dim: IVec3) -> usize {
    to_index(floor_mod(p, dim), dim)
}

/// Whether every component of `p` fits in a packed axis field
pub fn in_coord_range(p: IVec3) -> bool {
    p.cmpge(IVec3::splat(COORD_MIN)).all() && p.cmple(IVec3::splat(COORD_MAX)).all()
}

/// Pack three 21-bit signed components into a single 64-bit word
///
/// The packed form fits one atomic load/store, so position and identity
/// publish together.
pub fn pack_coord(p: IVec3) -> u64 {
    debug_assert!(in_coord_range(p), "coordinate out of packed range: {p}");
    (p.x as u32 as u64 & AXIS_MASK)
        | ((p.y as u32 as u64 & AXIS_MASK) << COORD_BITS)
        | ((p.z as u32 as u64 & AXIS_MASK) << (2 * COORD_BITS))
}

/// Inverse of [`pack_coord`], sign-extending each component from bit 20
pub fn unpack_coord(d: u64) -> IVec3 {
    IVec3::new(
        sign_extend((d & AXIS_MASK) as u32),
        sign_extend(((d >> COORD_BITS) & AXIS_MASK) as u32),
        sign_extend(((d >> (2 * COORD_BITS)) & AXIS_MASK) as u32),
    )
}

fn sign_extend(axis: u32) -> i32 {
    ((axis << (32 - COORD_BITS)) as i32) >> (32 - COORD_BITS)
}
