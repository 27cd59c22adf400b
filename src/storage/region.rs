//! Region files: the on-disk unit of chunk persistence
//!
//! One file per region of 32x32x32 chunks. The header holds the arena end
//! offset, a garbage counter and a per-chunk `(offset, size)` slot table,
//! followed by an append-only arena of compressed chunk payloads. All words
//! are little-endian u32. Rewriting a chunk reuses its old span when the new
//! payload fits, otherwise appends and counts the abandoned span as garbage;
//! crossing the garbage threshold triggers in-place defragmentation.

use std::fs::{File, OpenOptions};
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};

use crate::core::error::Error;
use crate::core::types::{IVec3, Result};
use crate::math::coords::position_to_index;

/// Chunks per region axis
pub const REGION_SIZE: IVec3 = IVec3::new(32, 32, 32);

/// Chunks per region
pub const REGION_VOLUME: usize =
    (REGION_SIZE.x * REGION_SIZE.y * REGION_SIZE.z) as usize;

/// u32 words in the header: end, garbage, then two words per chunk slot
const HEADER_WORDS: usize = 2 + 2 * REGION_VOLUME;

/// Byte offset where the payload arena begins
pub const HEADER_BYTES: u32 = (HEADER_WORDS * 4) as u32;

/// File name for a region, `{x}|{y}|{z}` under the world directory
pub fn region_path(world_dir: &Path, region: IVec3) -> PathBuf {
    world_dir.join(format!("{}|{}|{}", region.x, region.y, region.z))
}

/// Slot table index of a chunk inside its owning region
pub fn chunk_slot(chunk: IVec3) -> usize {
    position_to_index(chunk, REGION_SIZE)
}

fn slot_byte_offset(slot: usize) -> u64 {
    ((2 + 2 * slot) * 4) as u64
}

fn read_pair(file: &File, offset: u64) -> Result<(u32, u32)> {
    let mut bytes = [0u8; 8];
    file.read_exact_at(&mut bytes, offset)?;
    Ok((
        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
    ))
}

fn write_pair(file: &File, offset: u64, a: u32, b: u32) -> Result<()> {
    let mut bytes = [0u8; 8];
    bytes[..4].copy_from_slice(&a.to_le_bytes());
    bytes[4..].copy_from_slice(&b.to_le_bytes());
    file.write_all_at(&bytes, offset)?;
    Ok(())
}

fn write_word(file: &File, offset: u64, word: u32) -> Result<()> {
    file.write_all_at(&word.to_le_bytes(), offset)?;
    Ok(())
}

/// An open region file with its header words cached in memory
///
/// `end` and `garbage` are only persisted by [`flush_header`]; the store
/// calls it on eviction and shutdown.
///
/// [`flush_header`]: RegionFile::flush_header
pub struct RegionFile {
    file: File,
    end: u32,
    garbage: u32,
}

impl RegionFile {
    /// Open or create the region file at `path`
    ///
    /// A zero-length file is a fresh region: it is extended to the header
    /// size (zero-filled, so every slot reads as never-written).
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;
        if file.metadata()?.len() == 0 {
            file.set_len(HEADER_BYTES as u64)?;
            return Ok(Self {
                file,
                end: HEADER_BYTES,
                garbage: 0,
            });
        }
        let (end, garbage) = read_pair(&file, 0)?;
        if end < HEADER_BYTES || garbage > end - HEADER_BYTES {
            return Err(Error::CorruptRegion(format!(
                "{}: bad header (end={end}, garbage={garbage})",
                path.display()
            )));
        }
        Ok(Self { file, end, garbage })
    }

    /// First free byte of the payload arena
    pub fn end(&self) -> u32 {
        self.end
    }

    /// Reclaimable bytes inside the arena
    pub fn garbage(&self) -> u32 {
        self.garbage
    }

    fn read_slot(&self, slot: usize) -> Result<(u32, u32)> {
        debug_assert!(slot < REGION_VOLUME);
        let (offset, size) = read_pair(&self.file, slot_byte_offset(slot))?;
        if (offset == 0) != (size == 0) {
            return Err(Error::CorruptRegion(format!(
                "slot {slot}: half-empty entry (offset={offset}, size={size})"
            )));
        }
        if offset != 0 && (offset < HEADER_BYTES || offset as u64 + size as u64 > self.end as u64) {
            return Err(Error::CorruptRegion(format!(
                "slot {slot}: span {offset}+{size} outside arena (end={})",
                self.end
            )));
        }
        Ok((offset, size))
    }

    /// Read the compressed payload of `slot` into `buf`
    ///
    /// Returns `false` without touching `buf` when the slot was never
    /// written.
    pub fn read_chunk(&self, slot: usize, buf: &mut Vec<u8>) -> Result<bool> {
        let (offset, size) = self.read_slot(slot)?;
        if offset == 0 {
            return Ok(false);
        }
        buf.resize(size as usize, 0);
        self.file.read_exact_at(buf, offset as u64)?;
        Ok(true)
    }

    /// Write the compressed payload of `slot`
    ///
    /// Overwrites in place when the new payload fits in the old span, else
    /// appends to the arena; either way the dead bytes are accounted as
    /// garbage.
    pub fn write_chunk(&mut self, slot: usize, data: &[u8]) -> Result<()> {
        debug_assert!(!data.is_empty());
        let (old_offset, old_size) = self.read_slot(slot)?;
        let new_size = data.len() as u32;
        if old_offset != 0 && new_size <= old_size {
            self.file.write_all_at(data, old_offset as u64)?;
            write_word(&self.file, slot_byte_offset(slot) + 4, new_size)?;
            self.garbage += old_size - new_size;
        } else {
            write_pair(&self.file, slot_byte_offset(slot), self.end, new_size)?;
            self.file.write_all_at(data, self.end as u64)?;
            self.end += new_size;
            self.garbage += old_size;
        }
        Ok(())
    }

    /// Whether accumulated garbage has crossed `threshold` bytes
    pub fn needs_defragment(&self, threshold: u32) -> bool {
        self.garbage >= threshold
    }

    /// Compact the payload arena, reclaiming all garbage
    ///
    /// Live spans are moved toward the header in ascending offset order, so
    /// no move can overwrite a span that has not been relocated yet. The
    /// file is not shrunk.
    pub fn defragment(&mut self) -> Result<()> {
        let mut table = vec![0u8; 2 * REGION_VOLUME * 4];
        self.file.read_exact_at(&mut table, 8)?;
        let mut entries: Vec<(u32, u32, u32)> = Vec::new();
        for slot in 0..REGION_VOLUME {
            let words = &table[slot * 8..slot * 8 + 8];
            let offset = u32::from_le_bytes([words[0], words[1], words[2], words[3]]);
            let size = u32::from_le_bytes([words[4], words[5], words[6], words[7]]);
            if offset != 0 {
                entries.push((slot as u32, offset, size));
            }
        }
        entries.sort_unstable_by_key(|&(_, offset, _)| offset);

        let mut buf = Vec::new();
        let mut new_end = HEADER_BYTES;
        for &(slot, offset, size) in &entries {
            if offset != new_end {
                buf.resize(size as usize, 0);
                self.file.read_exact_at(&mut buf, offset as u64)?;
                self.file.write_all_at(&buf, new_end as u64)?;
                table[slot as usize * 8..slot as usize * 8 + 4]
                    .copy_from_slice(&new_end.to_le_bytes());
            }
            new_end += size;
        }
        self.file.write_all_at(&table, 8)?;

        log::debug!(
            "defragmented region: reclaimed {} bytes, arena end {} -> {}",
            self.garbage,
            self.end,
            new_end
        );
        self.garbage = 0;
        self.end = new_end;
        Ok(())
    }

    /// Persist the `end` and `garbage` header words
    pub fn flush_header(&self) -> Result<()> {
        write_pair(&self.file, 0, self.end, self.garbage)
    }
}
