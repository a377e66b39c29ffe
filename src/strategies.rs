use serde::{Deserialize, Serialize};

use crate::config::PackingConfig;
use crate::skyline::{HeightMap, Position, Shelf, find_gaps};
use crate::types::{Piece, PlacedPiece};

/// The greedy placement heuristics raced against each other for the needs
/// pieces. None rotates a piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Heuristic {
    /// Shelves by descending length then width, up to the loose tolerance of
    /// wasted shelf height.
    LooseShelf,
    /// Shelves by descending length only, tight tolerance.
    TightShelf,
    /// Large pieces of similar length laid side by side as one band, small
    /// pieces dropped into the lowest spots afterwards.
    LengthGroups,
    /// Largest area first, each at the lowest point of the skyline.
    FirstFitDecreasing,
    /// Like first fit, but a position also pays for the empty area it
    /// leaves underneath.
    ScoredPlacement,
    /// Same-size pieces laid as contiguous rows.
    SmallPieceGroups,
    /// Each piece first tries to sit inside an existing hole in the layout.
    AggressiveGapFill,
}

impl Heuristic {
    pub const ALL: [Heuristic; 7] = [
        Heuristic::LooseShelf,
        Heuristic::TightShelf,
        Heuristic::LengthGroups,
        Heuristic::FirstFitDecreasing,
        Heuristic::ScoredPlacement,
        Heuristic::SmallPieceGroups,
        Heuristic::AggressiveGapFill,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Heuristic::LooseShelf => "loose shelf",
            Heuristic::TightShelf => "tight shelf",
            Heuristic::LengthGroups => "length groups",
            Heuristic::FirstFitDecreasing => "first fit decreasing",
            Heuristic::ScoredPlacement => "scored placement",
            Heuristic::SmallPieceGroups => "small piece groups",
            Heuristic::AggressiveGapFill => "aggressive gap fill",
        }
    }

    /// Places every piece no wider than the roll. Each call works on its own
    /// height map and shelves.
    pub fn pack(&self, pieces: &[Piece], config: &PackingConfig) -> Packing {
        let width = config.roll_width;
        let pieces: Vec<Piece> = pieces
            .iter()
            .filter(|p| {
                let fits = p.width_total <= width;
                if !fits {
                    tracing::warn!(piece = p.id, width = p.width_total, "piece wider than roll, skipped");
                }
                fits
            })
            .copied()
            .collect();

        let placed = match self {
            Heuristic::LooseShelf => shelf_pack(&pieces, config.loose_shelf_tolerance, true, width),
            Heuristic::TightShelf => shelf_pack(&pieces, config.tight_shelf_tolerance, false, width),
            Heuristic::LengthGroups => length_groups(&pieces, config),
            Heuristic::FirstFitDecreasing => first_fit_decreasing(&pieces, width),
            Heuristic::ScoredPlacement => scored_placement(&pieces, config),
            Heuristic::SmallPieceGroups => small_piece_groups(&pieces, config),
            Heuristic::AggressiveGapFill => aggressive_gap_fill(&pieces, config),
        };
        Packing::from_placed(placed)
    }
}

impl std::fmt::Display for Heuristic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A placement of needs pieces and how far down the roll it reaches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Packing {
    /// In the order the pieces were placed.
    pub placed: Vec<PlacedPiece>,
    pub max_length: u32,
}

impl Packing {
    pub fn from_placed(placed: Vec<PlacedPiece>) -> Self {
        let max_length = placed.iter().map(PlacedPiece::bottom).max().unwrap_or(0);
        Self { placed, max_length }
    }

    /// The pieces in placement order.
    pub fn order(&self) -> Vec<Piece> {
        self.placed.iter().map(|p| p.piece).collect()
    }
}

/// Places pieces in the given order, each at its lowest resting point.
pub fn place_in_order(order: &[Piece], roll_width: u32) -> Packing {
    let mut map = HeightMap::new(roll_width);
    let placed = order.iter().filter_map(|&p| map.place_lowest(p)).collect();
    Packing::from_placed(placed)
}

fn by_length_then_width(a: &Piece, b: &Piece) -> std::cmp::Ordering {
    b.length_total
        .cmp(&a.length_total)
        .then(b.width_total.cmp(&a.width_total))
}

fn by_area(a: &Piece, b: &Piece) -> std::cmp::Ordering {
    b.area().cmp(&a.area())
}

fn shelf_pack(pieces: &[Piece], tolerance: u32, tie_by_width: bool, roll_width: u32) -> Vec<PlacedPiece> {
    let mut sorted = pieces.to_vec();
    if tie_by_width {
        sorted.sort_by(by_length_then_width);
    } else {
        sorted.sort_by(|a, b| b.length_total.cmp(&a.length_total));
    }

    let mut shelves: Vec<Shelf> = Vec::new();
    let mut placed = Vec::with_capacity(sorted.len());
    for piece in sorted {
        let best = shelves
            .iter()
            .enumerate()
            .filter_map(|(i, shelf)| {
                shelf
                    .surplus(&piece, roll_width)
                    .filter(|&surplus| surplus <= tolerance)
                    .map(|surplus| (surplus, i))
            })
            .min();

        let idx = match best {
            Some((_, i)) => i,
            None => {
                let y = shelves.last().map_or(0, Shelf::bottom);
                shelves.push(Shelf::new(y, piece.length_total));
                shelves.len() - 1
            }
        };
        placed.push(shelves[idx].push(piece));
    }
    placed
}

/// Lays `row` left to right starting at the lowest spot wide enough for all
/// of it. Each piece raises only its own columns.
fn place_row(map: &mut HeightMap, row: &[Piece], placed: &mut Vec<PlacedPiece>) {
    let row_width: u32 = row.iter().map(|p| p.width_total).sum();
    let Some(start) = map.lowest(row_width) else {
        return;
    };
    let mut x = start.x;
    for &piece in row {
        placed.push(map.place(piece, Position { x, ..start }));
        x += piece.width_total;
    }
}

fn is_large(piece: &Piece, config: &PackingConfig) -> bool {
    piece.width_total >= config.large_piece_threshold || piece.length_total >= config.large_piece_threshold
}

fn length_groups(pieces: &[Piece], config: &PackingConfig) -> Vec<PlacedPiece> {
    let (mut large, mut small): (Vec<Piece>, Vec<Piece>) = pieces.iter().partition(|p| is_large(p, config));
    large.sort_by(by_length_then_width);
    small.sort_by(by_length_then_width);

    let mut map = HeightMap::new(config.roll_width);
    let mut placed = Vec::with_capacity(pieces.len());
    let mut grouped = vec![false; large.len()];

    for i in 0..large.len() {
        if grouped[i] {
            continue;
        }
        grouped[i] = true;
        let anchor = large[i];
        let mut group = vec![anchor];
        let mut group_width = anchor.width_total;

        for j in (i + 1)..large.len() {
            let candidate = large[j];
            if !grouped[j]
                && anchor.length_total - candidate.length_total <= config.length_group_tolerance
                && group_width + candidate.width_total <= config.roll_width
            {
                grouped[j] = true;
                group_width += candidate.width_total;
                group.push(candidate);
            }
        }
        place_row(&mut map, &group, &mut placed);
    }

    placed.extend(small.into_iter().filter_map(|p| map.place_lowest(p)));
    placed
}

fn first_fit_decreasing(pieces: &[Piece], roll_width: u32) -> Vec<PlacedPiece> {
    let mut sorted = pieces.to_vec();
    sorted.sort_by(by_area);
    place_in_order(&sorted, roll_width).placed
}

fn scored_placement(pieces: &[Piece], config: &PackingConfig) -> Vec<PlacedPiece> {
    let (mut large, mut small): (Vec<Piece>, Vec<Piece>) = pieces.iter().partition(|p| is_large(p, config));
    large.sort_by(by_area);
    small.sort_by(by_area);

    let mut map = HeightMap::new(config.roll_width);
    let mut placed = Vec::with_capacity(pieces.len());
    for piece in large.into_iter().chain(small) {
        let score = |pos: &Position| (pos.y + piece.length_total) as f64 + config.gap_penalty * pos.gap_area as f64;
        let mut best: Option<(f64, Position)> = None;
        for pos in map.positions(piece.width_total) {
            let s = score(&pos);
            if best.is_none_or(|(b, _)| s < b) {
                best = Some((s, pos));
            }
        }
        if let Some((_, pos)) = best {
            placed.push(map.place(piece, pos));
        }
    }
    placed
}

fn same_size(a: &Piece, b: &Piece, tolerance: u32) -> bool {
    a.width_total.abs_diff(b.width_total) <= tolerance && a.length_total.abs_diff(b.length_total) <= tolerance
}

fn small_piece_groups(pieces: &[Piece], config: &PackingConfig) -> Vec<PlacedPiece> {
    let mut sorted = pieces.to_vec();
    sorted.sort_by(by_area);

    let mut clusters: Vec<Vec<Piece>> = Vec::new();
    let mut unique: Vec<Piece> = Vec::new();
    let mut assigned = vec![false; sorted.len()];
    for i in 0..sorted.len() {
        if assigned[i] {
            continue;
        }
        assigned[i] = true;
        let mut members = vec![sorted[i]];
        for j in (i + 1)..sorted.len() {
            if !assigned[j] && same_size(&sorted[i], &sorted[j], config.cluster_tolerance) {
                assigned[j] = true;
                members.push(sorted[j]);
            }
        }
        if members.len() >= 2 {
            clusters.push(members);
        } else {
            unique.push(sorted[i]);
        }
    }

    let (mut long, mut short): (Vec<Piece>, Vec<Piece>) = unique
        .into_iter()
        .partition(|p| p.length_total > config.long_piece_threshold);
    long.sort_by(by_length_then_width);
    short.sort_by(by_length_then_width);

    let mut map = HeightMap::new(config.roll_width);
    let mut placed = Vec::with_capacity(pieces.len());
    placed.extend(long.into_iter().filter_map(|p| map.place_lowest(p)));

    for cluster in &clusters {
        let mut row: Vec<Piece> = Vec::new();
        let mut row_width = 0;
        for &piece in cluster {
            if row_width + piece.width_total > config.roll_width {
                place_row(&mut map, &row, &mut placed);
                row.clear();
                row_width = 0;
            }
            row_width += piece.width_total;
            row.push(piece);
        }
        if !row.is_empty() {
            place_row(&mut map, &row, &mut placed);
        }
    }

    for piece in short {
        if let Some(pos) = map.lowest_snug(piece.width_total) {
            placed.push(map.place(piece, pos));
        }
    }
    placed
}

/// Rebuilds the hole list from every placed piece before each placement;
/// quadratic in pieces, fine for room-scale jobs.
fn aggressive_gap_fill(pieces: &[Piece], config: &PackingConfig) -> Vec<PlacedPiece> {
    let mut sorted = pieces.to_vec();
    sorted.sort_by(by_length_then_width);

    let mut map = HeightMap::new(config.roll_width);
    let mut placed: Vec<PlacedPiece> = Vec::with_capacity(sorted.len());
    for piece in sorted {
        let limit = map.max_height();
        let gap = find_gaps(&placed, config.roll_width, limit, config.min_gap)
            .into_iter()
            .filter(|g| g.fits(&piece))
            .min_by_key(|g| (g.y, g.x));

        match gap {
            Some(g) => {
                map.raise(g.x, piece.width_total, g.y.saturating_add(piece.length_total));
                placed.push(PlacedPiece::new(piece, g.x, g.y));
            }
            None => placed.extend(map.place_lowest(piece)),
        }
    }
    placed
}
