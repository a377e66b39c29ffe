//! Piece input for the binaries: `WxL` on the command line, where each side
//! is `feet` or `feet-inches`, or a JSON array of pieces in a file.

use std::path::Path;

use crate::error::{InputError, Result};
use crate::types::{INCHES_PER_FOOT, MAX_DIMENSION, PackOptions, Piece};

/// Largest job accepted from outside input.
pub const MAX_PIECES: usize = 1000;
pub const MAX_STEPS: u32 = 200;

/// Parses `11-6` (11ft 6in) or `11` into total inches.
pub fn parse_dimension(s: &str) -> Result<u32> {
    let invalid = || InputError::InvalidDimension { input: s.to_string() };
    let (feet, inches) = match s.trim().split_once('-') {
        Some((f, i)) => (f, i),
        None => (s.trim(), "0"),
    };
    let feet = feet.trim().parse::<u32>().map_err(|_| invalid())?;
    let inches = inches.trim().parse::<u32>().map_err(|_| invalid())?;
    feet.checked_mul(INCHES_PER_FOOT)
        .and_then(|f| f.checked_add(inches))
        .ok_or_else(invalid)
}

/// Parses `WxL`, e.g. `11-6x13-6`.
pub fn parse_piece(s: &str, id: u32) -> Result<Piece> {
    let parts: Vec<&str> = s.split(['x', 'X']).collect();
    if parts.len() != 2 {
        return Err(InputError::InvalidPiece { input: s.to_string() });
    }
    let width = parse_dimension(parts[0])?;
    let length = parse_dimension(parts[1])?;
    if width == 0 || length == 0 {
        return Err(InputError::ZeroDimension { input: s.to_string() });
    }
    if width > MAX_DIMENSION || length > MAX_DIMENSION {
        return Err(InputError::OversizedPiece { id, max: MAX_DIMENSION });
    }
    Ok(Piece::from_inches(id, width, length))
}

/// Rejects pieces the packer would silently ignore, and jobs too large to
/// pack in reasonable time.
pub fn validate_pieces(pieces: &[Piece]) -> Result<()> {
    if pieces.len() > MAX_PIECES {
        return Err(InputError::TooManyPieces {
            count: pieces.len(),
            max: MAX_PIECES,
        });
    }
    for p in pieces {
        if p.width_total == 0 || p.length_total == 0 {
            return Err(InputError::EmptyPiece { id: p.id });
        }
        if p.width_total > MAX_DIMENSION || p.length_total > MAX_DIMENSION {
            return Err(InputError::OversizedPiece { id: p.id, max: MAX_DIMENSION });
        }
    }
    Ok(())
}

pub fn validate_options(options: &PackOptions) -> Result<()> {
    if options.steps > MAX_STEPS {
        return Err(InputError::TooManySteps {
            count: options.steps,
            max: MAX_STEPS,
        });
    }
    Ok(())
}

pub fn parse_pieces_json(json: &str) -> Result<Vec<Piece>> {
    let pieces: Vec<Piece> = serde_json::from_str(json)?;
    validate_pieces(&pieces)?;
    Ok(pieces)
}

pub fn load_pieces(path: &Path) -> Result<Vec<Piece>> {
    let json = std::fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_pieces_json(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_dimension() {
        assert_eq!(parse_dimension("11-6").unwrap(), 138);
        assert_eq!(parse_dimension("12").unwrap(), 144);
        assert_eq!(parse_dimension(" 0-9 ").unwrap(), 9);
        assert!(parse_dimension("11.6").is_err());
        assert!(parse_dimension("a-3").is_err());
        assert!(parse_dimension("").is_err());
    }

    #[test]
    fn test_parse_piece() {
        let p = parse_piece("11-6x13-6", 4).unwrap();
        assert_eq!(p, Piece::new(4, 11, 6, 13, 6));
        let p = parse_piece("10X12", 1).unwrap();
        assert_eq!((p.width_total, p.length_total), (120, 144));
    }

    #[test]
    fn test_parse_piece_errors() {
        assert!(matches!(
            parse_piece("10x12x3", 0),
            Err(InputError::InvalidPiece { .. })
        ));
        assert!(matches!(
            parse_piece("0x12", 0),
            Err(InputError::ZeroDimension { .. })
        ));
        assert!(matches!(
            parse_piece("ten x 12", 0),
            Err(InputError::InvalidDimension { .. })
        ));
    }

    #[test]
    fn test_parse_pieces_json() {
        let pieces = parse_pieces_json(
            r#"[{"id": 1, "width_feet": 10, "width_inches": 0, "length_feet": 12, "length_inches": 6},
                {"id": 2, "width_feet": 4, "length_feet": 2}]"#,
        )
        .unwrap();
        assert_eq!(pieces, vec![Piece::new(1, 10, 0, 12, 6), Piece::new(2, 4, 0, 2, 0)]);
    }

    #[test]
    fn test_parse_pieces_json_rejects_empty_piece() {
        let err = parse_pieces_json(r#"[{"id": 5, "width_feet": 10}]"#).unwrap_err();
        assert!(matches!(err, InputError::EmptyPiece { id: 5 }));
    }

    #[test]
    fn test_oversized_pieces_rejected() {
        assert!(matches!(
            parse_piece("1001x2", 6),
            Err(InputError::OversizedPiece { id: 6, .. })
        ));
        assert!(parse_piece("1000x2", 6).is_ok());
        let err = validate_pieces(&[Piece::from_inches(2, 40, MAX_DIMENSION + 1)]).unwrap_err();
        assert!(matches!(err, InputError::OversizedPiece { id: 2, .. }));
    }

    #[test]
    fn test_job_size_limits() {
        let pieces = vec![Piece::from_inches(0, 10, 10); MAX_PIECES + 1];
        assert!(matches!(
            validate_pieces(&pieces),
            Err(InputError::TooManyPieces { count: 1001, .. })
        ));
        assert!(validate_pieces(&pieces[..MAX_PIECES]).is_ok());

        let options = PackOptions { add_slippage: false, steps: u32::MAX };
        assert!(matches!(validate_options(&options), Err(InputError::TooManySteps { .. })));
        assert!(validate_options(&PackOptions { add_slippage: true, steps: MAX_STEPS }).is_ok());
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_pieces(Path::new("/nonexistent/pieces.json")).unwrap_err();
        assert!(matches!(err, InputError::Io { .. }));
    }
}
