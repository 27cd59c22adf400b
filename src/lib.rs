//! Voxstream - persistent voxel world store and streaming loader
//!
//! An infinite, editable grid of blocks organized into chunks, persisted in
//! compressed region files, streamed in and out of a fixed resident array
//! as the viewer moves, and continuously re-meshed into packed vertex
//! streams for a renderer to upload.

pub mod core;
pub mod math;
pub mod mesher;
pub mod storage;
pub mod streaming;
pub mod terrain;
pub mod voxel;

pub use crate::core::{Error, Result};
pub use crate::storage::{StoreConfig, VoxelStore};
pub use crate::streaming::{ChunkMesh, StreamConfig, StreamingVolume};
pub use crate::terrain::{ChunkGenerator, NoiseTerrain, TerrainParams};
pub use crate::voxel::{Block, ChunkBlocks, CHUNK_SIZE, CHUNK_VOLUME};
