//! Chunks: fixed cubic arrays of blocks

use crate::core::types::IVec3;
use crate::math::coords::{floor_div, floor_mod, to_index};

/// A single voxel's material id; 0 means air
pub type Block = u8;

/// The empty block
pub const AIR: Block = 0;

/// Blocks per chunk axis
pub const CHUNK_SIZE: IVec3 = IVec3::new(16, 16, 16);

/// Blocks per chunk
pub const CHUNK_VOLUME: usize =
    (CHUNK_SIZE.x * CHUNK_SIZE.y * CHUNK_SIZE.z) as usize;

/// Dense block payload of one chunk
pub type ChunkBlocks = [Block; CHUNK_VOLUME];

/// A chunk resident in the store cache
pub struct Chunk {
    pub blocks: Box<ChunkBlocks>,
    /// Set when the blocks changed after the last successful persist
    pub dirty: bool,
}

impl Default for Chunk {
    fn default() -> Self {
        Self {
            blocks: Box::new([AIR; CHUNK_VOLUME]),
            dirty: false,
        }
    }
}

/// Linear index of a chunk-local block position
///
/// Expects `0 <= local < CHUNK_SIZE` component-wise.
pub fn block_index(local: IVec3) -> usize {
    to_index(local, CHUNK_SIZE)
}

/// Split a world block position into its chunk coordinate and local index
pub fn split_block_pos(world_block: IVec3) -> (IVec3, usize) {
    let chunk = floor_div(world_block, CHUNK_SIZE);
    let local = floor_mod(world_block, CHUNK_SIZE);
    (chunk, to_index(local, CHUNK_SIZE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_index_order() {
        assert_eq!(block_index(IVec3::new(0, 0, 0)), 0);
        assert_eq!(block_index(IVec3::new(15, 0, 0)), 15);
        assert_eq!(block_index(IVec3::new(0, 1, 0)), 16);
        assert_eq!(block_index(IVec3::new(0, 0, 1)), 256);
        assert_eq!(block_index(IVec3::new(15, 15, 15)), CHUNK_VOLUME - 1);
    }

    #[test]
    fn test_split_block_pos() {
        let (chunk, index) = split_block_pos(IVec3::new(17, -1, 0));
        assert_eq!(chunk, IVec3::new(1, -1, 0));
        assert_eq!(index, block_index(IVec3::new(1, 15, 0)));
    }

    #[test]
    fn test_default_chunk_is_clean_air() {
        let chunk = Chunk::default();
        assert!(!chunk.dirty);
        assert!(chunk.blocks.iter().all(|&b| b == AIR));
    }
}
