//! Disk-backed voxel store
//!
//! Chunks live in a fixed-capacity LRU layered over a second LRU of open
//! region files. A miss either inflates the chunk's compressed payload from
//! its region or asks the terrain generator; eviction deflates and writes
//! back through the region layer. The store is single-threaded by design —
//! callers funnel access through one call chain or wrap it in a lock.

use std::io::{Read, Write};
use std::path::PathBuf;

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::core::error::Error;
use crate::core::types::{IVec3, Result};
use crate::math::coords::{floor_div, in_coord_range};
use crate::storage::lru::{LruCache, NodeId};
use crate::storage::region::{chunk_slot, region_path, RegionFile, REGION_SIZE};
use crate::terrain::ChunkGenerator;
use crate::voxel::chunk::{Chunk, ChunkBlocks, CHUNK_VOLUME};

/// Store sizing and persistence knobs
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Directory holding one file per region; created if missing
    pub world_dir: PathBuf,
    /// Maximum chunks held decompressed in memory
    pub chunk_heap_size: usize,
    /// Maximum simultaneously open region files
    pub region_heap_size: usize,
    /// Garbage bytes per region that trigger defragmentation
    pub defragment_garbage_threshold: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            world_dir: PathBuf::from("world"),
            chunk_heap_size: 32 * 1024,
            region_heap_size: 2 * 1024,
            defragment_garbage_threshold: 16 * 1024,
        }
    }
}

/// Resident-memory accounting
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub resident_chunks: usize,
    pub resident_regions: usize,
    /// Bytes of decompressed block data currently cached
    pub block_bytes: usize,
}

/// Persistent chunk store with write-back caching
pub struct VoxelStore {
    chunks: LruCache<Chunk>,
    regions: LruCache<Option<RegionFile>>,
    generator: Box<dyn ChunkGenerator>,
    scratch: Vec<u8>,
    cfg: StoreConfig,
}

impl VoxelStore {
    /// Open a store over `cfg.world_dir`, creating the directory if needed
    pub fn open(cfg: StoreConfig, generator: Box<dyn ChunkGenerator>) -> Result<Self> {
        if cfg.chunk_heap_size == 0 || cfg.region_heap_size == 0 {
            return Err(Error::Config("store heap sizes must be nonzero".into()));
        }
        std::fs::create_dir_all(&cfg.world_dir)?;
        log::info!(
            "voxel store opened at {:?}: {} chunk slots, {} region slots",
            cfg.world_dir,
            cfg.chunk_heap_size,
            cfg.region_heap_size
        );
        Ok(Self {
            chunks: LruCache::new(cfg.chunk_heap_size, 4 * cfg.chunk_heap_size),
            regions: LruCache::new(cfg.region_heap_size, 4 * cfg.region_heap_size),
            generator,
            scratch: Vec::new(),
            cfg,
        })
    }

    /// Read access to a chunk's blocks, faulting it in if necessary
    pub fn blocks(&mut self, p: IVec3) -> Result<&ChunkBlocks> {
        let node = self.chunk_node(p)?;
        Ok(&self.chunks.value(node).blocks)
    }

    /// Write access to a chunk's blocks; the chunk becomes dirty
    pub fn blocks_mut(&mut self, p: IVec3) -> Result<&mut ChunkBlocks> {
        let node = self.chunk_node(p)?;
        let chunk = self.chunks.value_mut(node);
        chunk.dirty = true;
        Ok(&mut chunk.blocks)
    }

    /// Write every dirty chunk and region header to disk
    ///
    /// Empties both caches; the store remains usable afterwards.
    pub fn flush(&mut self) -> Result<()> {
        while let Some(node) = self.chunks.evict_lru() {
            let result = self.flush_chunk(node);
            self.chunks.release(node);
            result?;
        }
        while let Some(node) = self.regions.evict_lru() {
            let result = match self.regions.value_mut(node).take() {
                Some(region) => region.flush_header(),
                None => Ok(()),
            };
            self.regions.release(node);
            result?;
        }
        Ok(())
    }

    /// Current cache occupancy
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            resident_chunks: self.chunks.len(),
            resident_regions: self.regions.len(),
            block_bytes: self.chunks.len() * CHUNK_VOLUME,
        }
    }

    fn chunk_node(&mut self, p: IVec3) -> Result<NodeId> {
        debug_assert!(in_coord_range(p), "chunk coordinate out of world range: {p}");
        if let Some(node) = self.chunks.get(p) {
            return Ok(node);
        }
        let node = match self.chunks.take_free() {
            Some(node) => node,
            None => {
                let node = self
                    .chunks
                    .evict_lru()
                    .expect("chunk cache has capacity but no evictable node");
                if let Err(e) = self.flush_chunk(node) {
                    self.chunks.release(node);
                    return Err(e);
                }
                node
            }
        };
        match self.load_chunk(node, p) {
            Ok(()) => {
                self.chunks.insert(node, p);
                Ok(node)
            }
            Err(e) => {
                self.chunks.release(node);
                Err(e)
            }
        }
    }

    /// Fill `node` with the chunk at `p`, from disk or the generator
    fn load_chunk(&mut self, node: NodeId, p: IVec3) -> Result<()> {
        let region_node = self.region_node(floor_div(p, REGION_SIZE))?;
        let region = self
            .regions
            .value(region_node)
            .as_ref()
            .expect("cached region has an open file");
        let exists = region.read_chunk(chunk_slot(p), &mut self.scratch)?;

        let chunk = self.chunks.value_mut(node);
        if exists {
            let mut decoder = ZlibDecoder::new(&self.scratch[..]);
            decoder
                .read_exact(&mut chunk.blocks[..])
                .map_err(|e| Error::CorruptRegion(format!("chunk {p}: {e}")))?;
            let mut excess = [0u8; 1];
            if !matches!(decoder.read(&mut excess), Ok(0)) {
                return Err(Error::CorruptRegion(format!(
                    "chunk {p}: payload larger than {CHUNK_VOLUME} blocks"
                )));
            }
            chunk.dirty = false;
        } else {
            self.generator.generate(p, &mut chunk.blocks);
            chunk.dirty = true;
        }
        Ok(())
    }

    /// Compress and write back an evicted chunk, if it is dirty
    fn flush_chunk(&mut self, node: NodeId) -> Result<()> {
        if !self.chunks.value(node).dirty {
            return Ok(());
        }
        let p = self.chunks.key(node);

        self.scratch.clear();
        let chunk = self.chunks.value(node);
        let mut encoder = ZlibEncoder::new(&mut self.scratch, Compression::best());
        encoder
            .write_all(&chunk.blocks[..])
            .map_err(|e| Error::Compression(format!("chunk {p}: {e}")))?;
        encoder
            .finish()
            .map_err(|e| Error::Compression(format!("chunk {p}: {e}")))?;

        let region_node = self.region_node(floor_div(p, REGION_SIZE))?;
        let region = self
            .regions
            .value_mut(region_node)
            .as_mut()
            .expect("cached region has an open file");
        region.write_chunk(chunk_slot(p), &self.scratch)?;
        if region.needs_defragment(self.cfg.defragment_garbage_threshold) {
            region.defragment()?;
        }
        self.chunks.value_mut(node).dirty = false;
        Ok(())
    }

    fn region_node(&mut self, region: IVec3) -> Result<NodeId> {
        if let Some(node) = self.regions.get(region) {
            return Ok(node);
        }
        let node = match self.regions.take_free() {
            Some(node) => node,
            None => {
                let node = self
                    .regions
                    .evict_lru()
                    .expect("region cache has capacity but no evictable node");
                if let Some(old) = self.regions.value_mut(node).take() {
                    if let Err(e) = old.flush_header() {
                        self.regions.release(node);
                        return Err(e);
                    }
                }
                node
            }
        };
        match RegionFile::open(&region_path(&self.cfg.world_dir, region)) {
            Ok(file) => {
                *self.regions.value_mut(node) = Some(file);
                self.regions.insert(node, region);
                Ok(node)
            }
            Err(e) => {
                self.regions.release(node);
                Err(e)
            }
        }
    }
}

impl Drop for VoxelStore {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            log::error!("voxel store flush on drop failed: {e}");
        }
    }
}
