use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::anneal::Annealer;
use crate::config::PackingConfig;
use crate::prepare::{aggregate, augment, split_by_width, transpose};
use crate::strategies::{Heuristic, Packing};
use crate::summary::synthesize;
use crate::types::{PackOptions, PackingMethod, Piece, RollLayout};

pub struct Solver {
    config: PackingConfig,
    options: PackOptions,
    pieces: Vec<Piece>,
}

/// Everything decided for one orientation of the job.
#[derive(Debug, Clone)]
struct OrientedPlan {
    standard: Vec<Piece>,
    standard_length: u32,
    packing: Packing,
    method: PackingMethod,
}

impl OrientedPlan {
    fn total_length(&self) -> u32 {
        self.standard_length.saturating_add(self.packing.max_length)
    }
}

impl Solver {
    pub fn new(config: PackingConfig, options: PackOptions, pieces: Vec<Piece>) -> Self {
        Self {
            config,
            options,
            pieces,
        }
    }

    /// Runs the search with an entropy-seeded generator. May take up to the
    /// annealing time limit; call it off any thread that must stay responsive.
    pub fn solve(&self) -> RollLayout {
        self.solve_with_rng(&mut StdRng::from_entropy())
    }

    pub fn solve_with_rng<R: Rng>(&self, rng: &mut R) -> RollLayout {
        let prepared = augment(&self.pieces, self.options, &self.config);
        if prepared.pieces.is_empty() {
            return RollLayout {
                roll_width: self.config.roll_width,
                ..Default::default()
            };
        }

        let original = self.pack_orientation(&prepared.pieces, rng);
        let flipped = self.pack_orientation(&transpose(&prepared.pieces), rng);
        tracing::debug!(
            original = original.total_length(),
            flipped = flipped.total_length(),
            "orientations compared"
        );

        // Ties keep the job as entered.
        let is_flipped = flipped.total_length() < original.total_length();
        let chosen = if is_flipped { flipped } else { original };

        let summary = synthesize(
            self.config.roll_width,
            chosen.standard_length,
            chosen.packing.max_length,
            prepared.used_area,
        );
        tracing::info!(
            total_length = summary.total_length,
            waste_percent = summary.waste_percent,
            is_flipped,
            method = %chosen.method,
            "layout chosen"
        );

        let mut layout = RollLayout {
            roll_width: self.config.roll_width,
            standard: chosen.standard,
            needs: chosen.packing.placed,
            standard_length: chosen.standard_length,
            needs_length: chosen.packing.max_length,
            is_flipped,
            method: chosen.method,
            ..Default::default()
        };
        layout.apply_summary(summary);
        layout
    }

    fn pack_orientation<R: Rng>(&self, pieces: &[Piece], rng: &mut R) -> OrientedPlan {
        let mut next_id = 0;
        let aggregated = aggregate(pieces, &mut next_id);
        let split = split_by_width(&aggregated, self.config.roll_width, &mut next_id);
        let (packing, method) = self.best_packing(&split.needs, rng);

        OrientedPlan {
            standard_length: split.standard_length(),
            standard: split.standard,
            packing,
            method,
        }
    }

    fn best_packing<R: Rng>(&self, needs: &[Piece], rng: &mut R) -> (Packing, PackingMethod) {
        let Some((heuristic, seed)) = self.greedy_best(needs) else {
            return (Packing::default(), PackingMethod::None);
        };
        if needs.len() < self.config.anneal.min_pieces {
            return (seed, PackingMethod::Heuristic(heuristic));
        }

        let annealer = Annealer::new(self.config.anneal, self.config.roll_width);
        let outcome = annealer.run(&seed, rng);
        tracing::debug!(
            seed = seed.max_length,
            annealed = outcome.packing.max_length,
            iterations = outcome.iterations,
            accepted = outcome.accepted,
            elapsed_ms = outcome.elapsed.as_millis() as u64,
            "annealing finished"
        );

        if outcome.packing.max_length < seed.max_length {
            (outcome.packing, PackingMethod::Annealed { seed: heuristic })
        } else {
            (seed, PackingMethod::Heuristic(heuristic))
        }
    }

    /// Races every heuristic; earlier ones win ties.
    fn greedy_best(&self, needs: &[Piece]) -> Option<(Heuristic, Packing)> {
        if needs.is_empty() {
            return None;
        }

        let mut best: Option<(Heuristic, Packing)> = None;
        for heuristic in Heuristic::ALL {
            let packing = heuristic.pack(needs, &self.config);
            tracing::debug!(%heuristic, max_length = packing.max_length, "heuristic packed");
            if best
                .as_ref()
                .is_none_or(|(_, b)| packing.max_length < b.max_length)
            {
                best = Some((heuristic, packing));
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnnealConfig;
    use crate::strategies::tests::{assert_packing_valid, mixed_rooms};
    use pretty_assertions::assert_eq;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 0.01
    }

    fn quick_config() -> PackingConfig {
        PackingConfig::default().with_anneal(AnnealConfig::default().with_max_iterations(40))
    }

    fn solve(pieces: Vec<Piece>, options: PackOptions) -> RollLayout {
        let mut rng = StdRng::seed_from_u64(42);
        Solver::new(quick_config(), options, pieces).solve_with_rng(&mut rng)
    }

    fn assert_layout_consistent(layout: &RollLayout) {
        assert!(layout.validate().is_empty(), "{:?}", layout.validate());
        assert_eq!(layout.total_length, layout.standard_length + layout.needs_length);
        assert_eq!(
            layout.standard_length,
            layout.standard.iter().map(|p| p.length_total).sum::<u32>()
        );
        assert_eq!(
            layout.needs_length,
            layout.needs.iter().map(|p| p.bottom()).max().unwrap_or(0)
        );
        assert!(layout.standard.iter().all(|p| p.width_total == layout.roll_width));
        assert!(layout.needs.iter().all(|p| p.piece.width_total < layout.roll_width));
        let expected = if layout.total_sq_ft > 0.0 {
            (layout.total_sq_ft - layout.used_sq_ft) / layout.total_sq_ft * 100.0
        } else {
            0.0
        };
        assert!(close(layout.waste_percent, expected));
    }

    #[test]
    fn test_single_room() {
        let layout = solve(vec![Piece::new(1, 10, 0, 10, 0)], PackOptions::default());
        assert_layout_consistent(&layout);
        assert_eq!(layout.needs.len(), 1);
        let placed = layout.needs[0];
        assert_eq!((placed.x, placed.y), (0, 0));
        assert_eq!((placed.piece.width_total, placed.piece.length_total), (120, 120));
        assert!(layout.standard.is_empty());
        assert_eq!(layout.standard_length, 0);
        assert_eq!(layout.needs_length, 120);
        assert_eq!(layout.total_length, 120);
        assert!(close(layout.used_sq_ft, 100.0));
        assert!(close(layout.total_sq_ft, 120.0));
        assert!(close(layout.waste_sq_ft, 20.0));
        assert!(close(layout.waste_percent, 16.67));
        // square job: both orientations tie
        assert!(!layout.is_flipped);
    }

    #[test]
    fn test_exact_roll_width_becomes_standard() {
        let layout = solve(
            vec![Piece::from_inches(1, 60, 120), Piece::from_inches(2, 84, 120)],
            PackOptions::default(),
        );
        assert_layout_consistent(&layout);
        assert_eq!(layout.standard.len(), 1);
        assert_eq!(layout.standard[0].width_total, 144);
        assert!(layout.needs.is_empty());
        assert_eq!(layout.standard_length, 120);
        assert_eq!(layout.needs_length, 0);
        assert_eq!(layout.total_length, 120);
        assert!(close(layout.used_sq_ft, 120.0));
        assert!(close(layout.total_sq_ft, 120.0));
        assert!(close(layout.waste_sq_ft, 0.0));
        assert!(close(layout.waste_percent, 0.0));
        assert_eq!(layout.method, PackingMethod::None);
        assert!(!layout.is_flipped);
    }

    #[test]
    fn test_no_pieces() {
        let layout = solve(vec![], PackOptions::default());
        assert_eq!(
            layout,
            RollLayout {
                roll_width: 144,
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_long_narrow_piece_is_flipped() {
        let layout = solve(vec![Piece::from_inches(1, 10, 200)], PackOptions::default());
        assert_layout_consistent(&layout);
        assert!(layout.is_flipped);
        assert_eq!(layout.standard.len(), 1);
        assert_eq!(layout.standard[0].length_total, 10);
        assert_eq!(layout.needs.len(), 1);
        assert_eq!(layout.needs[0].piece.width_total, 56);
        assert_eq!(layout.standard_length, 10);
        assert_eq!(layout.needs_length, 10);
        assert_eq!(layout.total_length, 20);
    }

    #[test]
    fn test_orientation_is_no_worse_than_either() {
        let config = PackingConfig::default().with_anneal(AnnealConfig::default().with_max_iterations(0));
        let pieces = mixed_rooms();
        let solver = Solver::new(config, PackOptions::default(), pieces.clone());
        let mut rng = StdRng::seed_from_u64(0);

        let original = solver.pack_orientation(&pieces, &mut rng).total_length();
        let flipped = solver.pack_orientation(&transpose(&pieces), &mut rng).total_length();
        let layout = solver.solve_with_rng(&mut rng);

        assert!(layout.total_length <= original.min(flipped));
        assert_eq!(layout.is_flipped, flipped < original);
    }

    #[test]
    fn test_mixed_rooms_with_steps_and_slippage() {
        let options = PackOptions {
            add_slippage: true,
            steps: 3,
        };
        let layout = solve(mixed_rooms(), options);
        assert_layout_consistent(&layout);

        let requested: u64 = mixed_rooms().iter().map(Piece::area).sum::<u64>() + 3 * 48 * 24;
        assert!(close(layout.used_sq_ft, requested as f64 / 144.0));
        assert!(layout.waste_sq_ft > 0.0);
    }

    #[test]
    fn test_needs_pieces_all_placed() {
        let mut rng = StdRng::seed_from_u64(9);
        let pieces = mixed_rooms();
        let solver = Solver::new(quick_config(), PackOptions::default(), pieces.clone());
        let plan = solver.pack_orientation(&pieces, &mut rng);

        let mut next_id = 0;
        let split = split_by_width(&aggregate(&pieces, &mut next_id), 144, &mut next_id);
        assert_packing_valid(&plan.packing, &split.needs, 144);
    }

    #[test]
    fn test_refined_never_worse_than_best_heuristic() {
        let pieces = mixed_rooms();
        let solver = Solver::new(quick_config(), PackOptions::default(), pieces.clone());
        let mut next_id = 0;
        let split = split_by_width(&aggregate(&pieces, &mut next_id), 144, &mut next_id);
        let (_, seed) = solver.greedy_best(&split.needs).unwrap();

        for s in 0..3 {
            let mut rng = StdRng::seed_from_u64(s);
            let (packing, _) = solver.best_packing(&split.needs, &mut rng);
            assert!(packing.max_length <= seed.max_length);
        }
    }

    #[test]
    fn test_adding_a_piece_does_not_shorten_roll() {
        let base = solve(vec![Piece::new(1, 10, 0, 10, 0)], PackOptions::default());
        let more = solve(
            vec![Piece::new(1, 10, 0, 10, 0), Piece::new(2, 5, 0, 5, 0)],
            PackOptions::default(),
        );
        assert!(more.total_length >= base.total_length);
        assert_eq!(more.total_length, 180);
    }

    #[test]
    fn test_random_additions_never_shorten_roll() {
        let mut pick = StdRng::seed_from_u64(2024);
        let room = |pick: &mut StdRng, id: u32| {
            Piece::new(id, pick.gen_range(3..=11), pick.gen_range(0..12), pick.gen_range(3..=14), 0)
        };
        for case in 0..25 {
            let count = pick.gen_range(1..=3);
            let base: Vec<Piece> = (0..count).map(|id| room(&mut pick, id)).collect();
            let mut more = base.clone();
            more.push(room(&mut pick, count));

            let before = solve(base.clone(), PackOptions::default());
            let after = solve(more.clone(), PackOptions::default());
            assert!(
                after.total_length >= before.total_length,
                "case {case}: {base:?} -> {} but with {:?} -> {}",
                before.total_length,
                more.last(),
                after.total_length
            );
        }
    }

    #[test]
    fn test_standard_strips_stack_with_needs() {
        let layout = solve(
            vec![Piece::from_inches(1, 300, 50), Piece::from_inches(2, 40, 30)],
            PackOptions::default(),
        );
        assert_layout_consistent(&layout);
        assert!(layout.total_length <= 100 + 50);
    }

    #[test]
    fn test_entropy_solve_is_consistent() {
        let solver = Solver::new(quick_config(), PackOptions::default(), mixed_rooms());
        assert_layout_consistent(&solver.solve());
    }
}
