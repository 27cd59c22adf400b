//! Noise-based procedural terrain generation

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};

use crate::core::types::IVec3;
use crate::voxel::chunk::{ChunkBlocks, AIR, CHUNK_SIZE};

/// Produces the block payload of a chunk on first touch
///
/// Implementations must be deterministic in `coord` and callable from any
/// thread; the same coordinate must always yield the same blocks.
pub trait ChunkGenerator: Send + Sync {
    fn generate(&self, coord: IVec3, blocks: &mut ChunkBlocks);
}

impl<F> ChunkGenerator for F
where
    F: Fn(IVec3, &mut ChunkBlocks) + Send + Sync,
{
    fn generate(&self, coord: IVec3, blocks: &mut ChunkBlocks) {
        self(coord, blocks)
    }
}

/// Parameters controlling terrain generation
#[derive(Clone, Debug)]
pub struct TerrainParams {
    pub seed: u32,
    pub scale: f64,        // Horizontal scale in blocks (larger = smoother)
    pub height_scale: f64, // Maximum surface height in blocks
    pub octaves: u32,      // FBM octaves (detail levels)
    pub persistence: f64,  // FBM persistence (0.5 typical)
    pub lacunarity: f64,   // FBM lacunarity (2.0 typical)
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            seed: 12345,
            scale: 64.0,
            height_scale: 24.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
        }
    }
}

/// Heightmap terrain from fractal Brownian motion: solid below the surface
pub struct NoiseTerrain {
    params: TerrainParams,
    noise: Fbm<Perlin>,
}

/// Block id emitted below the surface
pub const SOLID: u8 = 1;

impl NoiseTerrain {
    /// Create a generator with the given parameters
    pub fn new(params: TerrainParams) -> Self {
        let noise = Fbm::<Perlin>::new(params.seed)
            .set_octaves(params.octaves as usize)
            .set_persistence(params.persistence)
            .set_lacunarity(params.lacunarity);
        Self { params, noise }
    }

    pub fn params(&self) -> &TerrainParams {
        &self.params
    }

    /// Surface height in blocks at world block column (x, z), in
    /// `[0, height_scale]`
    pub fn height_at(&self, x: i32, z: i32) -> f64 {
        let nx = x as f64 / self.params.scale;
        let nz = z as f64 / self.params.scale;
        let value = self.noise.get([nx, nz]); // [-1, 1]
        (value + 1.0) / 2.0 * self.params.height_scale
    }
}

impl ChunkGenerator for NoiseTerrain {
    fn generate(&self, coord: IVec3, blocks: &mut ChunkBlocks) {
        let from = coord * CHUNK_SIZE;
        let mut i = 0;
        for z in from.z..from.z + CHUNK_SIZE.z {
            for y in from.y..from.y + CHUNK_SIZE.y {
                for x in from.x..from.x + CHUNK_SIZE.x {
                    blocks[i] = if (y as f64) < self.height_at(x, z) {
                        SOLID
                    } else {
                        AIR
                    };
                    i += 1;
                }
            }
        }
    }
}
