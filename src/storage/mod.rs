//! Persistent chunk storage: LRU caches over region files

pub mod lru;
pub mod region;
pub mod store;

pub use lru::LruCache;
pub use region::{chunk_slot, region_path, RegionFile, HEADER_BYTES, REGION_SIZE, REGION_VOLUME};
pub use store::{StoreConfig, StoreStats, VoxelStore};
