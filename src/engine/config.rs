// -----------------------------------------------------------------------------
// Optimizer / growth configuration
// -----------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected configuration, reported synchronously before any search starts.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("need at least 2 shapes to lay out, got {got}")]
    NotEnoughShapes { got: usize },
    #[error("temperature bounds must satisfy 0 < min_temp < initial_temp (min={min}, initial={initial})")]
    InvalidTemperature { min: f64, initial: f64 },
    #[error("cooling rate must lie in (0, 1), got {0}")]
    InvalidCoolingRate(f64),
    #[error("reheating boost must be > 1, got {0}")]
    InvalidReheatingBoost(f64),
    #[error("num_starts must be at least 1")]
    NoStarts,
    #[error("max_iterations must be at least 1")]
    NoIterations,
    #[error("movement range must satisfy 1 <= min <= max (min={min}, max={max})")]
    InvalidMovementRange { min: u32, max: u32 },
}

/// Knobs for the annealing search. Defaults are the tuned values; callers
/// usually override only `seed` and `num_starts`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnnealConfig {
    /// Independent random restarts in the multi-start phase.
    pub num_starts: usize,
    /// Hard per-run iteration cap.
    pub max_iterations: u64,
    /// Consecutive non-improving iterations before a reheat.
    pub reheat_counter: u64,
    pub initial_temp: f64,
    pub min_temp: f64,
    /// Cooling rate at the start of a run; nudged upward on improvement.
    pub initial_cooling_rate: f64,
    /// Added to the cooling rate on every new best, capped at 0.99.
    pub cooling_increment: f64,
    /// Multiplier applied to the temperature on a reheat (clamped to initial_temp).
    pub reheating_boost: f64,
    /// Score weight for one unit of cell overlap. Large relative to an empty
    /// cell so the search resolves overlaps before compacting.
    pub overlap_penalty: f64,
    pub min_movement_range: u32,
    pub max_movement_range: u32,
    /// Progress snapshot cadence in iterations.
    pub progress_interval: u64,
    /// Base RNG seed; each start derives its own stream from it.
    pub seed: u64,
}

impl Default for AnnealConfig {
    fn default() -> Self {
        Self {
            num_starts: 8,
            max_iterations: 20_000,
            reheat_counter: 500,
            initial_temp: 100.0,
            min_temp: 0.1,
            initial_cooling_rate: 0.95,
            cooling_increment: 0.005,
            reheating_boost: 5.0,
            overlap_penalty: 10.0,
            min_movement_range: 1,
            max_movement_range: 10,
            progress_interval: 256,
            seed: 0x5eed_cafe,
        }
    }
}

impl AnnealConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_temp > 0.0 && self.initial_temp > self.min_temp) {
            return Err(ConfigError::InvalidTemperature {
                min: self.min_temp,
                initial: self.initial_temp,
            });
        }
        if !(self.initial_cooling_rate > 0.0 && self.initial_cooling_rate < 1.0) {
            return Err(ConfigError::InvalidCoolingRate(self.initial_cooling_rate));
        }
        if self.reheating_boost <= 1.0 {
            return Err(ConfigError::InvalidReheatingBoost(self.reheating_boost));
        }
        if self.num_starts == 0 {
            return Err(ConfigError::NoStarts);
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::NoIterations);
        }
        if self.min_movement_range < 1 || self.min_movement_range > self.max_movement_range {
            return Err(ConfigError::InvalidMovementRange {
                min: self.min_movement_range,
                max: self.max_movement_range,
            });
        }
        Ok(())
    }
}

/// Knobs for the divider growth pass.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GrowthConfig {
    /// Empty cells padded around the layout so fronts can bound outermost
    /// shapes instead of immediately running off the grid.
    pub margin: usize,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self { margin: 2 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(AnnealConfig::default().validate(), Ok(()));
    }

    #[test]
    fn bad_temperature_bounds_are_rejected() {
        let mut cfg = AnnealConfig::default();
        cfg.min_temp = cfg.initial_temp;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidTemperature { .. })
        ));

        let mut cfg = AnnealConfig::default();
        cfg.min_temp = -1.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn bad_cooling_rate_is_rejected() {
        let mut cfg = AnnealConfig::default();
        cfg.initial_cooling_rate = 1.0;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::InvalidCoolingRate(1.0))
        );
    }

    #[test]
    fn bad_movement_range_is_rejected() {
        let mut cfg = AnnealConfig::default();
        cfg.min_movement_range = 12;
        cfg.max_movement_range = 4;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidMovementRange { .. })
        ));
    }
}
