//! Face mesher over a 2x2x2 chunk neighborhood
//!
//! A mesh anchored at chunk coordinate `m` owns every block-face pair whose
//! first block lies in chunk `m`; pairs crossing into the +x/+y/+z
//! neighbors pull their second block from the neighborhood. Neighboring
//! meshes own the remaining boundary faces, so the tiling is seamless. The
//! output is a packed vertex stream of three `u8` per vertex (mesh-local
//! position), two triangles per visible face.

use crate::core::types::IVec3;
use crate::voxel::chunk::{block_index, ChunkBlocks, AIR, CHUNK_SIZE};

/// First chunk offset a mesh consumes, inclusive
pub const MESH_CHUNK_START: IVec3 = IVec3::new(0, 0, 0);

/// One past the last chunk offset a mesh consumes
pub const MESH_CHUNK_END: IVec3 = IVec3::new(2, 2, 2);

/// Chunks consumed per mesh
pub const MESH_CHUNK_VOLUME: usize = ((MESH_CHUNK_END.x - MESH_CHUNK_START.x)
    * (MESH_CHUNK_END.y - MESH_CHUNK_START.y)
    * (MESH_CHUNK_END.z - MESH_CHUNK_START.z)) as usize;

/// The blocks of a mesh's chunk neighborhood, enumerated z-major (same
/// order as `to_index` over the neighborhood dimensions)
pub type MeshNeighborhood<'a> = [&'a ChunkBlocks; MESH_CHUNK_VOLUME];

const NEIGHBORHOOD_DIM: IVec3 = IVec3::new(
    MESH_CHUNK_END.x - MESH_CHUNK_START.x,
    MESH_CHUNK_END.y - MESH_CHUNK_START.y,
    MESH_CHUNK_END.z - MESH_CHUNK_START.z,
);

/// Block at a neighborhood-local position, `0 <= p < 2 * CHUNK_SIZE`
fn block_at(neighborhood: &MeshNeighborhood, p: IVec3) -> u8 {
    let chunk = p / CHUNK_SIZE;
    let local = p - chunk * CHUNK_SIZE;
    let chunk_index =
        ((chunk.z * NEIGHBORHOOD_DIM.y + chunk.y) * NEIGHBORHOOD_DIM.x + chunk.x) as usize;
    neighborhood[chunk_index][block_index(local)]
}

const AXES: [IVec3; 3] = [IVec3::new(1, 0, 0), IVec3::new(0, 1, 0), IVec3::new(0, 0, 1)];

/// Build the vertex stream for the anchor chunk of `neighborhood`
pub fn build_mesh(neighborhood: &MeshNeighborhood) -> Vec<u8> {
    let mut vertices = Vec::new();
    for z in 0..CHUNK_SIZE.z {
        for y in 0..CHUNK_SIZE.y {
            for x in 0..CHUNK_SIZE.x {
                let p = IVec3::new(x, y, z);
                let here = block_at(neighborhood, p);
                for (axis, &step) in AXES.iter().enumerate() {
                    let there = block_at(neighborhood, p + step);
                    if (here == AIR) != (there == AIR) {
                        emit_face(&mut vertices, p, axis, here != AIR);
                    }
                }
            }
        }
    }
    vertices
}

/// Append the two triangles of the face between `p` and its +axis neighbor
///
/// `solid_below` selects the winding: true when the face looks toward
/// +axis (the solid block is `p`), false when it looks toward -axis.
fn emit_face(vertices: &mut Vec<u8>, p: IVec3, axis: usize, solid_below: bool) {
    let (u, v) = match axis {
        0 => (IVec3::new(0, 1, 0), IVec3::new(0, 0, 1)),
        1 => (IVec3::new(0, 0, 1), IVec3::new(1, 0, 0)),
        _ => (IVec3::new(1, 0, 0), IVec3::new(0, 1, 0)),
    };
    let base = p + AXES[axis];
    let corners = [base, base + u, base + u + v, base + v];
    // counter-clockwise as seen from the air side
    let order: [usize; 6] = if solid_below {
        [0, 1, 2, 0, 2, 3]
    } else {
        [0, 2, 1, 0, 3, 2]
    };
    for &c in &order {
        let corner = corners[c];
        vertices.push(corner.x as u8);
        vertices.push(corner.y as u8);
        vertices.push(corner.z as u8);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxel::chunk::CHUNK_VOLUME;

    const VERTS_PER_FACE: usize = 6;

    fn neighborhood_of(chunks: &[Box<ChunkBlocks>; MESH_CHUNK_VOLUME]) -> MeshNeighborhood<'_> {
        [
            &chunks[0], &chunks[1], &chunks[2], &chunks[3],
            &chunks[4], &chunks[5], &chunks[6], &chunks[7],
        ]
    }

    fn empty_chunks() -> [Box<ChunkBlocks>; MESH_CHUNK_VOLUME] {
        std::array::from_fn(|_| Box::new([AIR; CHUNK_VOLUME]))
    }

    #[test]
    fn test_empty_neighborhood_yields_nothing() {
        let chunks = empty_chunks();
        assert!(build_mesh(&neighborhood_of(&chunks)).is_empty());
    }

    #[test]
    fn test_single_block_has_six_faces() {
        let mut chunks = empty_chunks();
        chunks[0][block_index(IVec3::new(5, 5, 5))] = 1;
        let mesh = build_mesh(&neighborhood_of(&chunks));
        assert_eq!(mesh.len(), 6 * VERTS_PER_FACE * 3);

        // all vertices hug the unit cube at (5,5,5)
        for vertex in mesh.chunks_exact(3) {
            for &c in vertex {
                assert!(c == 5 || c == 6, "vertex component {c} off the cube");
            }
        }
    }

    #[test]
    fn test_boundary_face_pulls_from_neighbor() {
        // a block on the +x face of the anchor chunk, +x neighbor all air
        let mut chunks = empty_chunks();
        chunks[0][block_index(IVec3::new(15, 5, 5))] = 1;
        let mesh = build_mesh(&neighborhood_of(&chunks));
        assert_eq!(mesh.len(), 6 * VERTS_PER_FACE * 3);
        // the +x face sits on the chunk seam at x=16
        assert!(mesh.chunks_exact(3).any(|v| v[0] == 16));
    }

    #[test]
    fn test_seam_face_suppressed_by_solid_neighbor() {
        let mut chunks = empty_chunks();
        chunks[0][block_index(IVec3::new(15, 5, 5))] = 1;
        // +x neighbor occupies the adjacent cell
        chunks[1][block_index(IVec3::new(0, 5, 5))] = 1;
        let mesh = build_mesh(&neighborhood_of(&chunks));
        // five faces of the anchor block remain; the seam face is interior
        // (the neighbor block's own faces belong to the +x mesh)
        assert_eq!(mesh.len(), 5 * VERTS_PER_FACE * 3);
    }

    #[test]
    fn test_fully_solid_neighborhood_yields_nothing() {
        let chunks: [Box<ChunkBlocks>; MESH_CHUNK_VOLUME] =
            std::array::from_fn(|_| Box::new([1u8; CHUNK_VOLUME]));
        assert!(build_mesh(&neighborhood_of(&chunks)).is_empty());
    }

    #[test]
    fn test_air_pocket_face_faces_inward() {
        // solid anchor with a single air cell: six faces around the pocket
        let mut chunks: [Box<ChunkBlocks>; MESH_CHUNK_VOLUME] =
            std::array::from_fn(|_| Box::new([1u8; CHUNK_VOLUME]));
        chunks[0][block_index(IVec3::new(8, 8, 8))] = AIR;
        let mesh = build_mesh(&neighborhood_of(&chunks));
        assert_eq!(mesh.len(), 6 * VERTS_PER_FACE * 3);
    }
}
