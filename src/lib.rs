//! Terraforming descent puzzle library
//!
//! Procedural height-field generation with a guaranteed safe corridor to the
//! shelter, cost-aware A* path search, terrain editing tools and the skier
//! descent simulation. Re-exports modules for use by binaries and tools.

pub mod config;
pub mod error;
pub mod generation;
pub mod heightfield;
pub mod logging;
pub mod pathfinding;
pub mod persistence;
pub mod seeds;
pub mod session;
pub mod skier;
pub mod tilemap;
pub mod tools;

pub use error::{Result, TerrainError};
pub use generation::{generate, CorridorMask, MapGenerator};
pub use heightfield::HeightField;
pub use pathfinding::{find_path, Path};
pub use tools::ToolKind;
