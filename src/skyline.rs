use crate::types::{Piece, PlacedPiece};

/// Per-inch-column record of how far down the roll each column is consumed.
#[derive(Debug, Clone)]
pub struct HeightMap {
    heights: Vec<u32>,
}

/// A candidate position on the height map and what it would cost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: u32,
    pub y: u32,
    /// Square inches left unused between the skyline and the piece.
    pub gap_area: u64,
}

impl HeightMap {
    pub fn new(roll_width: u32) -> Self {
        Self {
            heights: vec![0; roll_width as usize],
        }
    }

    pub fn roll_width(&self) -> u32 {
        self.heights.len() as u32
    }

    pub fn max_height(&self) -> u32 {
        self.heights.iter().copied().max().unwrap_or(0)
    }

    /// Lowest y at which a `width`-wide footprint starting at `x` would rest.
    pub fn rest_height(&self, x: u32, width: u32) -> u32 {
        let (x, width) = (x as usize, width as usize);
        self.heights[x..x + width].iter().copied().max().unwrap_or(0)
    }

    /// Every x where `width` fits, with its resting height and gap area.
    pub fn positions(&self, width: u32) -> impl Iterator<Item = Position> + '_ {
        let count = (self.roll_width() + 1).saturating_sub(width);
        (0..count).map(move |x| {
            let y = self.rest_height(x, width);
            let gap_area = self.heights[x as usize..(x + width) as usize]
                .iter()
                .map(|&h| (y - h) as u64)
                .sum();
            Position { x, y, gap_area }
        })
    }

    /// Lowest resting position, leftmost on ties. The gap area is not
    /// computed.
    pub fn lowest(&self, width: u32) -> Option<Position> {
        let count = (self.roll_width() + 1).saturating_sub(width);
        let mut best: Option<(u32, u32)> = None;
        for x in 0..count {
            let y = self.rest_height(x, width);
            if best.is_none_or(|(_, by)| y < by) {
                best = Some((x, y));
            }
        }
        best.map(|(x, y)| Position { x, y, gap_area: 0 })
    }

    /// Lowest resting position, preferring the one that leaves the least
    /// unsupported area beneath it when heights tie.
    pub fn lowest_snug(&self, width: u32) -> Option<Position> {
        let mut best: Option<Position> = None;
        for pos in self.positions(width) {
            if best.is_none_or(|b| (pos.y, pos.gap_area) < (b.y, b.gap_area)) {
                best = Some(pos);
            }
        }
        best
    }

    /// Raises the columns under a placed piece to its far edge. Columns never
    /// move back up the roll.
    pub fn raise(&mut self, x: u32, width: u32, top: u32) {
        for h in &mut self.heights[x as usize..(x + width) as usize] {
            *h = (*h).max(top);
        }
    }

    pub fn place(&mut self, piece: Piece, pos: Position) -> PlacedPiece {
        self.raise(pos.x, piece.width_total, pos.y.saturating_add(piece.length_total));
        PlacedPiece::new(piece, pos.x, pos.y)
    }

    /// Places the piece at the lowest position. `None` only if it is wider
    /// than the roll.
    pub fn place_lowest(&mut self, piece: Piece) -> Option<PlacedPiece> {
        let pos = self.lowest(piece.width_total)?;
        Some(self.place(piece, pos))
    }
}

/// A horizontal band of the roll holding pieces of similar length side by side.
#[derive(Debug, Clone)]
pub struct Shelf {
    pub y: u32,
    pub height: u32,
    pub used_width: u32,
    pub placements: Vec<PlacedPiece>,
}

impl Shelf {
    pub fn new(y: u32, height: u32) -> Self {
        Self {
            y,
            height,
            used_width: 0,
            placements: Vec::new(),
        }
    }

    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    /// How much taller the shelf is than the piece, if the piece fits at all.
    pub fn surplus(&self, piece: &Piece, roll_width: u32) -> Option<u32> {
        if piece.length_total <= self.height && self.used_width + piece.width_total <= roll_width {
            Some(self.height - piece.length_total)
        } else {
            None
        }
    }

    pub fn push(&mut self, piece: Piece) -> PlacedPiece {
        let placed = PlacedPiece::new(piece, self.used_width, self.y);
        self.used_width += piece.width_total;
        self.placements.push(placed);
        placed
    }
}

/// An empty rectangle of the roll above some placed pieces and below the
/// current far edge of the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gap {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Gap {
    pub fn fits(&self, piece: &Piece) -> bool {
        piece.width_total <= self.w && piece.length_total <= self.h
    }
}

fn covers(p: &PlacedPiece, x: u32, y: u32) -> bool {
    p.x <= x && x < p.right() && p.y <= y && y < p.bottom()
}

/// Finds empty rectangles of at least `min_side` on both sides inside
/// `[0, roll_width) x [0, limit)`. Each candidate corner (roll edge or a
/// placed piece's edge) is grown right as far as the row allows, then down
/// as far as the whole span allows. Quadratic in placed pieces per corner.
pub fn find_gaps(placed: &[PlacedPiece], roll_width: u32, limit: u32, min_side: u32) -> Vec<Gap> {
    let mut xs: Vec<u32> = std::iter::once(0).chain(placed.iter().map(|p| p.right())).collect();
    let mut ys: Vec<u32> = std::iter::once(0).chain(placed.iter().map(|p| p.bottom())).collect();
    xs.sort_unstable();
    xs.dedup();
    ys.sort_unstable();
    ys.dedup();

    let mut gaps = Vec::new();
    for &y in ys.iter().filter(|&&y| y < limit) {
        for &x in xs.iter().filter(|&&x| x < roll_width) {
            if placed.iter().any(|p| covers(p, x, y)) {
                continue;
            }
            let right = placed
                .iter()
                .filter(|p| p.y <= y && y < p.bottom() && p.x >= x)
                .map(|p| p.x)
                .min()
                .unwrap_or(roll_width);
            let bottom = placed
                .iter()
                .filter(|p| p.x < right && x < p.right() && p.y >= y)
                .map(|p| p.y)
                .min()
                .unwrap_or(limit)
                .min(limit);
            let gap = Gap {
                x,
                y,
                w: right - x,
                h: bottom - y,
            };
            if gap.w >= min_side && gap.h >= min_side {
                gaps.push(gap);
            }
        }
    }
    gaps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowest_prefers_left_on_ties() {
        let map = HeightMap::new(144);
        let pos = map.lowest(50).unwrap();
        assert_eq!((pos.x, pos.y), (0, 0));
    }

    #[test]
    fn test_place_lowest_fills_beside_then_on_top() {
        let mut map = HeightMap::new(144);
        let a = map.place_lowest(Piece::from_inches(0, 100, 60)).unwrap();
        let b = map.place_lowest(Piece::from_inches(1, 44, 30)).unwrap();
        let c = map.place_lowest(Piece::from_inches(2, 44, 30)).unwrap();
        let d = map.place_lowest(Piece::from_inches(3, 144, 10)).unwrap();
        assert_eq!((a.x, a.y), (0, 0));
        assert_eq!((b.x, b.y), (100, 0));
        assert_eq!((c.x, c.y), (100, 30));
        assert_eq!((d.x, d.y), (0, 60));
        assert_eq!(map.max_height(), 70);
    }

    #[test]
    fn test_too_wide_has_no_position() {
        let map = HeightMap::new(144);
        assert!(map.lowest(145).is_none());
        assert!(map.lowest(144).is_some());
    }

    #[test]
    fn test_snug_prefers_supported_footprint() {
        let mut map = HeightMap::new(144);
        map.raise(0, 40, 20);
        map.raise(40, 104, 10);
        let pos = map.lowest_snug(30).unwrap();
        assert_eq!((pos.x, pos.y, pos.gap_area), (40, 10, 0));
        map.raise(40, 104, 20);
        let pos = map.lowest_snug(50).unwrap();
        assert_eq!((pos.x, pos.y, pos.gap_area), (0, 20, 0));
    }

    #[test]
    fn test_raise_never_lowers() {
        let mut map = HeightMap::new(10);
        map.raise(0, 10, 50);
        map.raise(2, 3, 20);
        assert_eq!(map.rest_height(0, 10), 50);
        assert_eq!(map.max_height(), 50);
    }

    #[test]
    fn test_shelf_surplus() {
        let mut shelf = Shelf::new(0, 100);
        shelf.push(Piece::from_inches(0, 100, 100));
        assert_eq!(shelf.surplus(&Piece::from_inches(1, 44, 95), 144), Some(5));
        assert_eq!(shelf.surplus(&Piece::from_inches(2, 45, 95), 144), None);
        assert_eq!(shelf.surplus(&Piece::from_inches(3, 10, 101), 144), None);
        let placed = shelf.push(Piece::from_inches(1, 44, 95));
        assert_eq!((placed.x, placed.y), (100, 0));
        assert_eq!(shelf.bottom(), 100);
    }

    #[test]
    fn test_find_gaps_beside_short_piece() {
        let placed = vec![
            PlacedPiece::new(Piece::from_inches(0, 80, 100), 0, 0),
            PlacedPiece::new(Piece::from_inches(1, 64, 40), 80, 0),
        ];
        let gaps = find_gaps(&placed, 144, 100, 12);
        assert!(gaps.contains(&Gap { x: 80, y: 40, w: 64, h: 60 }));
        for g in &gaps {
            for p in &placed {
                let as_piece = PlacedPiece::new(Piece::from_inches(9, g.w, g.h), g.x, g.y);
                assert!(!as_piece.overlaps(p), "gap {g:?} overlaps {p:?}");
            }
        }
    }

    #[test]
    fn test_find_gaps_ignores_slivers() {
        let placed = vec![PlacedPiece::new(Piece::from_inches(0, 140, 100), 0, 0)];
        assert!(find_gaps(&placed, 144, 100, 12).is_empty());
    }
}
