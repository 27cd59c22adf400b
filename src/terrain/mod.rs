//! Pluggable terrain generation

pub mod generator;

pub use generator::{ChunkGenerator, NoiseTerrain, TerrainParams, SOLID};
