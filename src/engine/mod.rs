// engine/mod.rs
mod annealer;
mod config;
mod growth;
mod optimizer;
mod shape;
mod solution;
mod stats;
mod terrain;
mod types;

pub use annealer::{AnnealProfile, SimAnneal};
pub use config::{AnnealConfig, ConfigError, GrowthConfig};
pub use growth::{grow_dividers, FrontierCell, GrowthResult, GrowthSim, WallSegment};
pub use optimizer::{LayoutOptimizer, RunOutcome};
pub use shape::{Mask, Shape};
pub use solution::{Layout, Placement, Solution};
pub use stats::{AnnealStats, ProgressSink, ProgressUpdate, RunPhase};
pub use terrain::TerrainGrid;
pub use types::{CancelToken, Direction, ShapeId, StrainId};
