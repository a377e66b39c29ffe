use crate::types::PlacedPiece;

const MAX_COLS: f64 = 72.0;
const MAX_ROWS: f64 = 36.0;

/// ASCII sketch of the needs area: roll width across, roll length down.
/// Pieces are labelled with their id.
pub fn render_needs(roll_width: u32, needs_length: u32, needs: &[PlacedPiece]) -> String {
    if roll_width == 0 || needs_length == 0 {
        return String::new();
    }

    // Characters are roughly twice as tall as they are wide.
    let scale_x = MAX_COLS / roll_width as f64;
    let scale_y = f64::min(scale_x / 2.0, MAX_ROWS / needs_length as f64);
    let cols = (roll_width as f64 * scale_x).round() as usize;
    let rows = ((needs_length as f64 * scale_y).round() as usize).max(1);

    let mut grid = vec![vec![' '; cols + 1]; rows + 1];
    draw_rect(&mut grid, 0, 0, cols, rows);

    for p in needs {
        let sx = (p.x as f64 * scale_x).round() as usize;
        let sy = (p.y as f64 * scale_y).round() as usize;
        let ex = (p.right() as f64 * scale_x).round() as usize;
        let ey = (p.bottom() as f64 * scale_y).round() as usize;
        if ex <= sx || ey <= sy {
            continue;
        }
        draw_rect(&mut grid, sx, sy, ex - sx, ey - sy);

        let label: Vec<char> = format!("#{}", p.piece.id).chars().collect();
        if ex - sx > label.len() + 1 && ey - sy > 1 {
            let cy = (sy + ey) / 2;
            let start = (sx + ex) / 2 - label.len() / 2;
            for (i, &ch) in label.iter().enumerate() {
                grid[cy][start + i] = ch;
            }
        }
    }

    let mut out = String::new();
    for row in &grid {
        let line: String = row.iter().collect();
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

fn mark(cell: &mut char, edge: char) {
    *cell = match (*cell, edge) {
        ('+', _) => '+',
        ('-', '|') | ('|', '-') => '+',
        _ => edge,
    };
}

fn draw_rect(grid: &mut [Vec<char>], x: usize, y: usize, w: usize, h: usize) {
    let rows = grid.len();
    let cols = grid.first().map_or(0, Vec::len);

    for i in x..=(x + w).min(cols.saturating_sub(1)) {
        for j in [y, y + h] {
            if j < rows {
                mark(&mut grid[j][i], '-');
            }
        }
    }
    for j in y..=(y + h).min(rows.saturating_sub(1)) {
        for i in [x, x + w] {
            if i < cols {
                mark(&mut grid[j][i], '|');
            }
        }
    }
    for cx in [x, x + w] {
        for cy in [y, y + h] {
            if cy < rows && cx < cols {
                grid[cy][cx] = '+';
            }
        }
    }
}
