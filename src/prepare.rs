//! Turns the requested pieces into what the packer works on: stair and
//! slippage allowances first, then equal-length merging, then full-width
//! strips peeled off each merged piece.

use std::collections::BTreeMap;

use crate::config::PackingConfig;
use crate::types::{PackOptions, Piece};

/// Pieces ready for packing plus the area the customer actually asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedInput {
    pub pieces: Vec<Piece>,
    /// Square inches of the requested pieces and steps, before slippage.
    pub used_area: u64,
}

/// Adds `options.steps` synthetic step pieces and, when requested, the
/// slippage margin on both sides of every piece. Zero-area pieces are dropped.
pub fn augment(pieces: &[Piece], options: PackOptions, config: &PackingConfig) -> PreparedInput {
    let mut out: Vec<Piece> = pieces
        .iter()
        .filter(|p| p.width_total > 0 && p.length_total > 0)
        .copied()
        .collect();

    let mut next_id = out.iter().map(|p| p.id).max().map_or(0, |id| id.saturating_add(1));
    for _ in 0..options.steps {
        out.push(Piece::from_inches(next_id, config.step_width, config.step_length));
        next_id = next_id.saturating_add(1);
    }

    let used_area = out.iter().map(Piece::area).sum();

    if options.add_slippage {
        for p in &mut out {
            *p = Piece::from_inches(
                p.id,
                p.width_total.saturating_add(config.slippage),
                p.length_total.saturating_add(config.slippage),
            );
        }
    }

    PreparedInput { pieces: out, used_area }
}

/// Swaps width and length of every piece, i.e. the whole job turned 90°.
pub fn transpose(pieces: &[Piece]) -> Vec<Piece> {
    pieces.iter().map(Piece::transposed).collect()
}

/// Merges all pieces of equal length into one piece whose width is their
/// combined width. Longest first.
pub fn aggregate(pieces: &[Piece], next_id: &mut u32) -> Vec<Piece> {
    let mut widths: BTreeMap<u32, u32> = BTreeMap::new();
    for p in pieces {
        let width = widths.entry(p.length_total).or_insert(0);
        *width = width.saturating_add(p.width_total);
    }

    widths
        .into_iter()
        .rev()
        .map(|(length, width)| {
            let piece = Piece::from_inches(*next_id, width, length);
            *next_id = next_id.wrapping_add(1);
            piece
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Split {
    /// Exactly roll-width pieces, laid end to end.
    pub standard: Vec<Piece>,
    /// Narrower remainders that need cross-width packing.
    pub needs: Vec<Piece>,
}

impl Split {
    pub fn standard_length(&self) -> u32 {
        self.standard.iter().fold(0, |total: u32, p| total.saturating_add(p.length_total))
    }
}

/// Peels full roll-width strips off each aggregated piece.
pub fn split_by_width(aggregated: &[Piece], roll_width: u32, next_id: &mut u32) -> Split {
    let mut split = Split::default();
    let mut mint = |width: u32, length: u32| {
        let piece = Piece::from_inches(*next_id, width, length);
        *next_id = next_id.wrapping_add(1);
        piece
    };

    for p in aggregated {
        let mut remaining = p.width_total;
        while remaining > roll_width {
            split.standard.push(mint(roll_width, p.length_total));
            remaining -= roll_width;
        }
        if remaining == roll_width {
            split.standard.push(mint(roll_width, p.length_total));
        } else if remaining > 0 {
            split.needs.push(mint(remaining, p.length_total));
        }
    }

    split
}
