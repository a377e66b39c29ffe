//! Simulated annealing over the order in which needs pieces are dropped onto
//! the skyline.

use rand::Rng;
use std::time::{Duration, Instant};

use crate::config::AnnealConfig;
use crate::strategies::{Packing, place_in_order};
use crate::types::Piece;

#[derive(Debug, Clone)]
pub struct AnnealOutcome {
    /// Best placement seen; never longer than the seed.
    pub packing: Packing,
    pub order: Vec<Piece>,
    pub iterations: u32,
    pub accepted: u32,
    pub final_temperature: f64,
    pub elapsed: Duration,
}

pub struct Annealer {
    config: AnnealConfig,
    roll_width: u32,
}

impl Annealer {
    pub fn new(config: AnnealConfig, roll_width: u32) -> Self {
        Self { config, roll_width }
    }

    /// Starts from the seed's placement order and swaps two positions per
    /// iteration, replaying the order greedily each time.
    pub fn run<R: Rng>(&self, seed: &Packing, rng: &mut R) -> AnnealOutcome {
        let start = Instant::now();
        let cfg = &self.config;
        let check_every = cfg.time_check_interval.max(1);
        let time_limit = cfg.time_limit();

        let mut current = seed.order();
        let mut current_len = seed.max_length;
        let mut best_order = current.clone();
        let mut best = seed.clone();

        let mut temperature = cfg.initial_temp;
        let mut iterations = 0;
        let mut accepted = 0;
        let n = current.len();

        if n >= 2 {
            while iterations < cfg.max_iterations {
                if iterations > 0 && iterations % check_every == 0 && start.elapsed() >= time_limit {
                    tracing::debug!(iterations, "annealing stopped by time limit");
                    break;
                }
                iterations += 1;

                let i = rng.gen_range(0..n);
                let j = rng.gen_range(0..n);
                let mut candidate = current.clone();
                candidate.swap(i, j);
                let packing = place_in_order(&candidate, self.roll_width);

                let delta = packing.max_length as f64 - current_len as f64;
                if delta < 0.0 || rng.gen_bool(acceptance(delta, temperature)) {
                    accepted += 1;
                    current_len = packing.max_length;
                    current = candidate;
                    if packing.max_length < best.max_length {
                        best_order.clone_from(&current);
                        best = packing;
                    }
                }

                temperature = (temperature * cfg.cooling_rate).max(cfg.min_temp);
            }
        }

        AnnealOutcome {
            packing: best,
            order: best_order,
            iterations,
            accepted,
            final_temperature: temperature,
            elapsed: start.elapsed(),
        }
    }
}

/// Chance of taking a move that lengthens the layout by `delta`, always a
/// valid probability even for a zero or non-finite temperature.
fn acceptance(delta: f64, temperature: f64) -> f64 {
    let p = (-delta / temperature).exp();
    if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) }
}
