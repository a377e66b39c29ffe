//! Tunable constants for the packing search.
//!
//! None of these values are provably optimal; they were picked empirically
//! for residential jobs (tens of rooms on a 12ft roll) and every one can be
//! overridden.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{InputError, Result};

/// Standard broadloom roll width: 12ft.
pub const DEFAULT_ROLL_WIDTH: u32 = 144;

/// Cutting margin added to each side of a piece when slippage is requested.
pub const DEFAULT_SLIPPAGE: u32 = 4;

/// Footprint of one stair tread/riser allowance.
pub const DEFAULT_STEP_WIDTH: u32 = 48;
pub const DEFAULT_STEP_LENGTH: u32 = 24;

/// Roll widths accepted from outside input, in inches.
pub const MIN_ROLL_WIDTH: u32 = 12;
pub const MAX_ROLL_WIDTH: u32 = 600;

/// Ceiling on the annealing wall-clock budget.
pub const MAX_TIME_LIMIT_MS: u64 = 3000;
pub const MAX_TIME_CHECK_INTERVAL: u32 = 1000;

/// Ceiling on slippage and step sides.
pub const MAX_ALLOWANCE: u32 = 144;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnealConfig {
    /// Starting temperature.
    pub initial_temp: f64,
    /// Geometric cooling factor applied every iteration.
    pub cooling_rate: f64,
    /// Temperature never drops below this.
    pub min_temp: f64,
    pub max_iterations: u32,
    /// Wall-clock budget in milliseconds.
    pub time_limit_ms: u64,
    /// The clock is only consulted every this many iterations.
    pub time_check_interval: u32,
    /// Refinement is skipped for fewer needs pieces than this.
    pub min_pieces: usize,
}

impl Default for AnnealConfig {
    fn default() -> Self {
        Self {
            initial_temp: 30.0,
            cooling_rate: 0.99,
            min_temp: 0.1,
            max_iterations: 3000,
            time_limit_ms: 3000,
            time_check_interval: 100,
            min_pieces: 3,
        }
    }
}

impl AnnealConfig {
    pub fn time_limit(&self) -> Duration {
        Duration::from_millis(self.time_limit_ms)
    }

    pub fn with_initial_temp(mut self, temp: f64) -> Self {
        self.initial_temp = temp.max(0.001);
        self
    }

    pub fn with_cooling_rate(mut self, rate: f64) -> Self {
        self.cooling_rate = rate.clamp(0.001, 0.9999);
        self
    }

    pub fn with_min_temp(mut self, temp: f64) -> Self {
        self.min_temp = temp.max(0.0001);
        self
    }

    pub fn with_max_iterations(mut self, iterations: u32) -> Self {
        self.max_iterations = iterations;
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit_ms = limit.as_millis() as u64;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackingConfig {
    pub roll_width: u32,
    /// Max shelf height surplus for the loose shelf heuristic.
    pub loose_shelf_tolerance: u32,
    /// Max shelf height surplus for the tight shelf heuristic.
    pub tight_shelf_tolerance: u32,
    /// Max length difference between members of one length group.
    pub length_group_tolerance: u32,
    /// A piece with either side at least this long is "large".
    pub large_piece_threshold: u32,
    /// Unique pieces longer than this are placed before clusters.
    pub long_piece_threshold: u32,
    /// Max per-side difference for two pieces to count as the same size.
    pub cluster_tolerance: u32,
    /// Smallest gap (both sides) worth trying to fill.
    pub min_gap: u32,
    /// Weight of the unsupported area under a piece in scored placement.
    pub gap_penalty: f64,
    pub slippage: u32,
    pub step_width: u32,
    pub step_length: u32,
    pub anneal: AnnealConfig,
}

impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            roll_width: DEFAULT_ROLL_WIDTH,
            loose_shelf_tolerance: 6,
            tight_shelf_tolerance: 4,
            length_group_tolerance: 6,
            large_piece_threshold: 48,
            long_piece_threshold: 100,
            cluster_tolerance: 2,
            min_gap: 12,
            gap_penalty: 0.5,
            slippage: DEFAULT_SLIPPAGE,
            step_width: DEFAULT_STEP_WIDTH,
            step_length: DEFAULT_STEP_LENGTH,
            anneal: AnnealConfig::default(),
        }
    }
}

impl PackingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_roll_width(mut self, width: u32) -> Self {
        self.roll_width = width.max(1);
        self
    }

    pub fn with_shelf_tolerances(mut self, loose: u32, tight: u32) -> Self {
        self.loose_shelf_tolerance = loose;
        self.tight_shelf_tolerance = tight;
        self
    }

    pub fn with_gap_penalty(mut self, penalty: f64) -> Self {
        self.gap_penalty = penalty.max(0.0);
        self
    }

    pub fn with_anneal(mut self, anneal: AnnealConfig) -> Self {
        self.anneal = anneal;
        self
    }

    /// Puts a config that bypassed the builders (e.g. deserialized from a
    /// request) through the same clamps, and rejects sizes and budgets the
    /// search cannot honor.
    pub fn sanitized(self) -> Result<Self> {
        let invalid = |message: String| Err(InputError::InvalidConfig { message });

        if !(MIN_ROLL_WIDTH..=MAX_ROLL_WIDTH).contains(&self.roll_width) {
            return invalid(format!(
                "roll_width must be between {MIN_ROLL_WIDTH} and {MAX_ROLL_WIDTH} inches, got {}",
                self.roll_width
            ));
        }
        if self.anneal.time_limit_ms > MAX_TIME_LIMIT_MS {
            return invalid(format!(
                "anneal.time_limit_ms must be at most {MAX_TIME_LIMIT_MS}, got {}",
                self.anneal.time_limit_ms
            ));
        }
        for (name, value) in [
            ("slippage", self.slippage),
            ("step_width", self.step_width),
            ("step_length", self.step_length),
        ] {
            if value > MAX_ALLOWANCE {
                return invalid(format!("{name} must be at most {MAX_ALLOWANCE} inches, got {value}"));
            }
        }

        let a = self.anneal;
        let mut anneal = a
            .with_initial_temp(a.initial_temp)
            .with_cooling_rate(a.cooling_rate)
            .with_min_temp(a.min_temp);
        anneal.time_check_interval = a.time_check_interval.clamp(1, MAX_TIME_CHECK_INTERVAL);

        Ok(self.with_gap_penalty(self.gap_penalty).with_anneal(anneal))
    }
}
