//! Concurrent chunk streaming around a moving center

pub mod queue;
pub mod radius;
pub mod readiness;
pub mod volume;

pub use queue::{ChunkMesh, MeshQueue};
pub use radius::RadiusIterator;
pub use readiness::{MeshReadiness, ALL_READY, CHUNK_MESH_END, CHUNK_MESH_START};
pub use volume::{StreamConfig, StreamingVolume};
