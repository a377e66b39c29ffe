use serde::{Deserialize, Deserializer, Serialize};

use crate::error::InputError;
use crate::strategies::Heuristic;

pub const INCHES_PER_FOOT: u32 = 12;

/// Longest side accepted for a piece, in inches (1000ft).
pub const MAX_DIMENSION: u32 = 12_000;

/// A required rectangular cut. Dimensions are stored both as feet/inches
/// (inches normalized to `0..12`) and as total inches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PieceInput")]
pub struct Piece {
    pub id: u32,
    pub width_feet: u32,
    pub width_inches: u32,
    pub length_feet: u32,
    pub length_inches: u32,
    pub width_total: u32,
    pub length_total: u32,
}

impl Piece {
    pub fn new(id: u32, width_feet: u32, width_inches: u32, length_feet: u32, length_inches: u32) -> Self {
        Self::from_inches(
            id,
            width_feet.saturating_mul(INCHES_PER_FOOT).saturating_add(width_inches),
            length_feet.saturating_mul(INCHES_PER_FOOT).saturating_add(length_inches),
        )
    }

    /// Like [`Piece::new`], but refuses sides longer than [`MAX_DIMENSION`].
    pub fn checked_new(
        id: u32,
        width_feet: u32,
        width_inches: u32,
        length_feet: u32,
        length_inches: u32,
    ) -> Result<Self, InputError> {
        let total = |feet: u32, inches: u32| {
            feet.checked_mul(INCHES_PER_FOOT)
                .and_then(|f| f.checked_add(inches))
                .filter(|&t| t <= MAX_DIMENSION)
                .ok_or(InputError::OversizedPiece { id, max: MAX_DIMENSION })
        };
        let width = total(width_feet, width_inches)?;
        let length = total(length_feet, length_inches)?;
        Ok(Self::from_inches(id, width, length))
    }

    pub fn from_inches(id: u32, width: u32, length: u32) -> Self {
        Self {
            id,
            width_feet: width / INCHES_PER_FOOT,
            width_inches: width % INCHES_PER_FOOT,
            length_feet: length / INCHES_PER_FOOT,
            length_inches: length % INCHES_PER_FOOT,
            width_total: width,
            length_total: length,
        }
    }

    pub fn area(&self) -> u64 {
        self.width_total as u64 * self.length_total as u64
    }

    pub fn transposed(&self) -> Self {
        Self::from_inches(self.id, self.length_total, self.width_total)
    }
}

/// A length in inches shown as `11'6"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeetInches(pub u32);

impl std::fmt::Display for FeetInches {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}'{}\"", self.0 / INCHES_PER_FOOT, self.0 % INCHES_PER_FOOT)
    }
}

impl std::fmt::Display for Piece {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", FeetInches(self.width_total), FeetInches(self.length_total))
    }
}

/// Wire form of a piece. Totals are always derived, never trusted.
#[derive(Debug, Clone, Deserialize)]
pub struct PieceInput {
    #[serde(default, deserialize_with = "deserialize_u32_from_number")]
    pub id: u32,
    #[serde(default, deserialize_with = "deserialize_u32_from_number")]
    pub width_feet: u32,
    #[serde(default, deserialize_with = "deserialize_u32_from_number")]
    pub width_inches: u32,
    #[serde(default, deserialize_with = "deserialize_u32_from_number")]
    pub length_feet: u32,
    #[serde(default, deserialize_with = "deserialize_u32_from_number")]
    pub length_inches: u32,
}

impl TryFrom<PieceInput> for Piece {
    type Error = InputError;

    fn try_from(input: PieceInput) -> Result<Self, Self::Error> {
        Piece::checked_new(
            input.id,
            input.width_feet,
            input.width_inches,
            input.length_feet,
            input.length_inches,
        )
    }
}

/// Accepts any JSON number that holds a non-negative integer (`12` or `12.0`).
pub fn deserialize_u32_from_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if value < 0.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
        return Err(serde::de::Error::custom(format!(
            "expected a non-negative integer, got {value}"
        )));
    }
    Ok(value as u32)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedPiece {
    #[serde(flatten)]
    pub piece: Piece,
    pub x: u32,
    pub y: u32,
}

impl PlacedPiece {
    pub fn new(piece: Piece, x: u32, y: u32) -> Self {
        Self { piece, x, y }
    }

    /// Saturates, so a piece pushed past `u32::MAX` still reads as out of
    /// bounds instead of wrapping.
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.piece.width_total)
    }

    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.piece.length_total)
    }

    pub fn overlaps(&self, other: &PlacedPiece) -> bool {
        self.x < other.right() && other.x < self.right() && self.y < other.bottom() && other.y < self.bottom()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackOptions {
    #[serde(default)]
    pub add_slippage: bool,
    #[serde(default, deserialize_with = "deserialize_u32_from_number")]
    pub steps: u32,
}

/// How the needs placement of a layout was produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackingMethod {
    /// Nothing needed cross-width packing.
    #[default]
    None,
    Heuristic(Heuristic),
    Annealed { seed: Heuristic },
}

impl std::fmt::Display for PackingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PackingMethod::None => write!(f, "none"),
            PackingMethod::Heuristic(h) => write!(f, "{h}"),
            PackingMethod::Annealed { seed } => write!(f, "annealed (seeded by {seed})"),
        }
    }
}

/// The full answer for one job: which pieces run full-width, where the
/// narrower pieces sit, and the derived material figures. Lengths in inches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RollLayout {
    pub roll_width: u32,
    pub standard: Vec<Piece>,
    pub needs: Vec<PlacedPiece>,
    pub standard_length: u32,
    pub needs_length: u32,
    pub total_length: u32,
    pub total_sq_ft: f64,
    pub total_sq_yd: f64,
    pub used_sq_ft: f64,
    pub waste_sq_ft: f64,
    pub waste_percent: f64,
    pub is_flipped: bool,
    #[serde(default)]
    pub method: PackingMethod,
}

/// A geometric invariant a layout breaks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutViolation {
    OutOfBounds { id: u32, x: u32, right: u32 },
    /// `y + length` does not fit in a `u32`.
    TooFar { id: u32, y: u32 },
    Overlap { a: u32, b: u32 },
}

impl std::fmt::Display for LayoutViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutViolation::OutOfBounds { id, x, right } => {
                write!(f, "piece {id} spans x={x}..{right}, beyond the roll width")
            }
            LayoutViolation::TooFar { id, y } => {
                write!(f, "piece {id} at y={y} runs past the end of any roll")
            }
            LayoutViolation::Overlap { a, b } => write!(f, "piece {a} overlaps piece {b}"),
        }
    }
}

impl RollLayout {
    /// Checks that every needs piece lies on the roll and none overlap.
    pub fn validate(&self) -> Vec<LayoutViolation> {
        let mut violations = Vec::new();
        for p in &self.needs {
            if p.x.checked_add(p.piece.width_total).is_none_or(|right| right > self.roll_width) {
                violations.push(LayoutViolation::OutOfBounds {
                    id: p.piece.id,
                    x: p.x,
                    right: p.right(),
                });
            }
            if p.y.checked_add(p.piece.length_total).is_none() {
                violations.push(LayoutViolation::TooFar { id: p.piece.id, y: p.y });
            }
        }
        for i in 0..self.needs.len() {
            for j in (i + 1)..self.needs.len() {
                if self.needs[i].overlaps(&self.needs[j]) {
                    violations.push(LayoutViolation::Overlap {
                        a: self.needs[i].piece.id,
                        b: self.needs[j].piece.id,
                    });
                }
            }
        }
        violations
    }
}
