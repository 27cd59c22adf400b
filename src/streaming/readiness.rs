//! Mesh readiness tracking
//!
//! Each mesh slot carries an atomic bitmask recording which of its eight
//! contributing chunks have been stored during the current sweep. Chunks OR
//! their bit into every mesh they touch; the worker whose bit completes a
//! mask is the sole emitter of that mesh. Masks are cleared once per sweep
//! by the last worker, before the sweep cursor resets.

use std::sync::atomic::{AtomicU8, Ordering};

use crate::core::types::IVec3;
use crate::math::coords::position_to_index;
use crate::mesher::{MESH_CHUNK_END, MESH_CHUNK_START, MESH_CHUNK_VOLUME};

/// First mesh offset a loaded chunk contributes to, inclusive
///
/// Inverse of the mesh->chunk window: a chunk at `c` feeds the meshes at
/// `c + CHUNK_MESH_START .. c + CHUNK_MESH_END`.
pub const CHUNK_MESH_START: IVec3 = IVec3::new(
    1 - MESH_CHUNK_END.x,
    1 - MESH_CHUNK_END.y,
    1 - MESH_CHUNK_END.z,
);

/// One past the last mesh offset a loaded chunk contributes to
pub const CHUNK_MESH_END: IVec3 = IVec3::new(
    1 - MESH_CHUNK_START.x,
    1 - MESH_CHUNK_START.y,
    1 - MESH_CHUNK_START.z,
);

/// Mask value once every contributing chunk has reported in
pub const ALL_READY: u8 = ((1u16 << MESH_CHUNK_VOLUME) - 1) as u8;

/// Per-mesh-slot readiness masks for a ring array of dimensions `dim`
///
/// Within one sweep each contributing chunk sets a distinct bit of a given
/// mesh's mask: the bit index is the chunk's position inside the mesh's
/// window, and no chunk occupies two positions.
pub struct MeshReadiness {
    masks: Vec<AtomicU8>,
    dim: IVec3,
}

impl MeshReadiness {
    pub fn new(dim: IVec3) -> Self {
        let volume = (dim.x * dim.y * dim.z) as usize;
        Self {
            masks: (0..volume).map(|_| AtomicU8::new(0)).collect(),
            dim,
        }
    }

    /// Reset every mask; runs with all other workers parked at the barrier
    pub fn clear(&self) {
        for mask in &self.masks {
            mask.store(0, Ordering::Relaxed);
        }
    }

    /// Record `chunk` as stored and report each mesh this completed
    ///
    /// `on_complete` receives the mesh position whose mask just reached
    /// [`ALL_READY`]; at most one caller observes the completion of any
    /// given mesh per sweep.
    pub fn mark_chunk<F: FnMut(IVec3)>(&self, chunk: IVec3, mut on_complete: F) {
        let mut bit: u8 = 1;
        for z in chunk.z + CHUNK_MESH_START.z..chunk.z + CHUNK_MESH_END.z {
            for y in chunk.y + CHUNK_MESH_START.y..chunk.y + CHUNK_MESH_END.y {
                for x in chunk.x + CHUNK_MESH_START.x..chunk.x + CHUNK_MESH_END.x {
                    let mesh = IVec3::new(x, y, z);
                    let slot = position_to_index(mesh, self.dim);
                    let state = self.masks[slot].fetch_or(bit, Ordering::AcqRel) | bit;
                    if state == ALL_READY {
                        on_complete(mesh);
                    }
                    bit <<= 1;
                }
            }
        }
    }
}
