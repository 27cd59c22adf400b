//! Voxel data model

pub mod chunk;

pub use chunk::{block_index, split_block_pos, Block, Chunk, ChunkBlocks, AIR, CHUNK_SIZE, CHUNK_VOLUME};
