//! Material figures derived from a layout. Kept separate from the search so
//! a layout edited by hand can be re-costed without packing again.

use serde::Serialize;

use crate::types::{PlacedPiece, RollLayout};

const SQ_IN_PER_SQ_FT: f64 = 144.0;
const SQ_FT_PER_SQ_YD: f64 = 9.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AreaSummary {
    pub total_length: u32,
    pub total_sq_ft: f64,
    pub total_sq_yd: f64,
    pub used_sq_ft: f64,
    pub waste_sq_ft: f64,
    pub waste_percent: f64,
}

/// `used_area` is the requested area in square inches, before slippage.
pub fn synthesize(roll_width: u32, standard_length: u32, needs_length: u32, used_area: u64) -> AreaSummary {
    let total_length = standard_length.saturating_add(needs_length);
    let total_sq_ft = roll_width as f64 * total_length as f64 / SQ_IN_PER_SQ_FT;
    let used_sq_ft = used_area as f64 / SQ_IN_PER_SQ_FT;
    let waste_sq_ft = total_sq_ft - used_sq_ft;
    let waste_percent = if total_sq_ft > 0.0 {
        waste_sq_ft / total_sq_ft * 100.0
    } else {
        0.0
    };

    AreaSummary {
        total_length,
        total_sq_ft,
        total_sq_yd: total_sq_ft / SQ_FT_PER_SQ_YD,
        used_sq_ft,
        waste_sq_ft,
        waste_percent,
    }
}

/// Far edge of the needs placement.
pub fn needs_length(needs: &[PlacedPiece]) -> u32 {
    needs.iter().map(PlacedPiece::bottom).max().unwrap_or(0)
}

impl RollLayout {
    pub fn apply_summary(&mut self, summary: AreaSummary) {
        self.total_length = summary.total_length;
        self.total_sq_ft = summary.total_sq_ft;
        self.total_sq_yd = summary.total_sq_yd;
        self.used_sq_ft = summary.used_sq_ft;
        self.waste_sq_ft = summary.waste_sq_ft;
        self.waste_percent = summary.waste_percent;
    }

    /// Re-derives `needs_length` and every area figure from the current
    /// geometry, e.g. after needs pieces were dragged to new positions.
    /// `used_sq_ft` does not depend on geometry and is kept.
    pub fn recompute(&mut self) {
        self.standard_length = self
            .standard
            .iter()
            .fold(0, |total: u32, p| total.saturating_add(p.length_total));
        self.needs_length = needs_length(&self.needs);
        let used_area = (self.used_sq_ft * SQ_IN_PER_SQ_FT).round() as u64;
        let summary = synthesize(self.roll_width, self.standard_length, self.needs_length, used_area);
        self.apply_summary(summary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Piece;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    fn test_zero_total_has_zero_waste_percent() {
        let s = synthesize(144, 0, 0, 0);
        assert_eq!(s, AreaSummary::default());
        assert_eq!(s.waste_percent, 0.0);
    }

    #[test]
    fn test_single_room_figures() {
        let s = synthesize(144, 0, 120, 120 * 120);
        assert_eq!(s.total_length, 120);
        assert!(close(s.total_sq_ft, 120.0));
        assert!(close(s.total_sq_yd, 13.33));
        assert!(close(s.used_sq_ft, 100.0));
        assert!(close(s.waste_sq_ft, 20.0));
        assert!(close(s.waste_percent, 16.67));
    }

    #[test]
    fn test_waste_percent_formula() {
        let s = synthesize(144, 37, 51, 9_000);
        let expected = (s.total_sq_ft - s.used_sq_ft) / s.total_sq_ft * 100.0;
        assert!(close(s.waste_percent, expected));
        assert_eq!(s.total_length, 88);
    }

    #[test]
    fn test_recompute_after_manual_move() {
        let a = PlacedPiece::new(Piece::from_inches(0, 60, 100), 0, 0);
        let b = PlacedPiece::new(Piece::from_inches(1, 60, 40), 60, 0);
        let mut layout = RollLayout {
            roll_width: 144,
            standard: vec![Piece::from_inches(2, 144, 50)],
            needs: vec![a, b],
            used_sq_ft: (60.0 * 100.0 + 60.0 * 40.0 + 144.0 * 50.0) / 144.0,
            ..Default::default()
        };
        layout.recompute();
        assert_eq!(layout.standard_length, 50);
        assert_eq!(layout.needs_length, 100);
        assert_eq!(layout.total_length, 150);
        assert!(close(layout.total_sq_ft, 150.0));

        // drag b below a
        layout.needs[1].x = 0;
        layout.needs[1].y = 100;
        layout.recompute();
        assert_eq!(layout.needs_length, 140);
        assert_eq!(layout.total_length, 190);
        assert!(close(layout.total_sq_ft, 190.0));
        assert!(close(layout.used_sq_ft, 108.33));
        assert!(close(layout.waste_sq_ft, 190.0 - 108.33));
    }

    #[test]
    fn test_recompute_with_piece_at_far_end() {
        let mut layout = RollLayout {
            roll_width: 144,
            standard: vec![Piece::from_inches(2, 144, 50)],
            needs: vec![PlacedPiece::new(Piece::from_inches(0, 60, 100), 0, u32::MAX - 5)],
            used_sq_ft: 100.0,
            ..Default::default()
        };
        layout.recompute();
        assert_eq!(layout.needs_length, u32::MAX);
        assert_eq!(layout.total_length, u32::MAX);
        assert!(!layout.validate().is_empty());
    }
}
