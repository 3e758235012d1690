//! cubbyforge — packs irregular cubby shapes onto a shared integer grid and
//! grows divider walls out from their footprints.
//!
//! Two subsystems, both pure grid/shape work with no I/O:
//! - the layout optimizer: multi-start adaptive simulated annealing over
//!   candidate placements, judged by empty-cell count plus weighted overlap;
//! - the growth engine: per-shape strains expand across empty cells under
//!   crowding and terrain-ridge rules until every front dies, leaving a
//!   network of axis-aligned wall segments.
//!
//! Rendering, mask extraction from images, cutlist export, and persistence
//! are the caller's business; this crate only trades in shapes, solutions,
//! and segments.

pub mod engine;

pub use engine::{
    grow_dividers, AnnealConfig, AnnealStats, CancelToken, ConfigError, GrowthConfig,
    GrowthResult, Layout, LayoutOptimizer, Mask, Placement, ProgressSink, ProgressUpdate,
    RunOutcome, RunPhase, Shape, ShapeId, Solution, StrainId, TerrainGrid, WallSegment,
};
