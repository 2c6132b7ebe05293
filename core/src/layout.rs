use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::geom::{Point, Rect};
use crate::outline::{SideKind, SideSpec};

pub const SCATTER_BAND_ROWS_DEFAULT: u32 = 2;
pub const SCATTER_GAP_RATIO_DEFAULT: f64 = 0.12;
pub const SCATTER_BAND_ROWS_MAX: u32 = 16;
const SEED_BASE_MAX: u32 = 1 << 24;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorderEdge {
    pub seed: u32,
    pub kind: SideKind,
}

impl BorderEdge {
    pub const FLAT: BorderEdge = BorderEdge {
        seed: 0,
        kind: SideKind::Flat,
    };

    pub fn is_flat(&self) -> bool {
        self.kind == SideKind::Flat
    }
}

/// Seeds and authored kinds for every border of a `rows x cols` grid.
///
/// `vertical` holds `rows * (cols + 1)` entries (border left of column `c`),
/// `horizontal` holds `(rows + 1) * cols` entries (border above row `r`).
#[derive(Clone, Debug, PartialEq)]
pub struct BorderLattice {
    rows: u32,
    cols: u32,
    vertical: Vec<BorderEdge>,
    horizontal: Vec<BorderEdge>,
}

impl BorderLattice {
    pub fn generate<R: Rng>(rows: u32, cols: u32, rng: &mut R) -> Self {
        let mut next_seed = rng.random_range(1..SEED_BASE_MAX);
        let mut fresh = |rng: &mut R| {
            let seed = next_seed;
            next_seed += 1;
            let kind = if rng.random_bool(0.5) {
                SideKind::Tab
            } else {
                SideKind::Slot
            };
            BorderEdge { seed, kind }
        };

        let mut vertical = vec![BorderEdge::FLAT; (rows * (cols + 1)) as usize];
        for row in 0..rows {
            for col in 1..cols {
                vertical[(row * (cols + 1) + col) as usize] = fresh(rng);
            }
        }

        let mut horizontal = vec![BorderEdge::FLAT; ((rows + 1) * cols) as usize];
        for row in 1..rows {
            for col in 0..cols {
                horizontal[(row * cols + col) as usize] = fresh(rng);
            }
        }

        Self {
            rows,
            cols,
            vertical,
            horizontal,
        }
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    /// Border on the left of column `col` (`col` in `0..=cols`).
    pub fn vertical(&self, row: u32, col: u32) -> BorderEdge {
        self.vertical
            .get((row * (self.cols + 1) + col) as usize)
            .copied()
            .unwrap_or(BorderEdge::FLAT)
    }

    /// Border above row `row` (`row` in `0..=rows`).
    pub fn horizontal(&self, row: u32, col: u32) -> BorderEdge {
        self.horizontal
            .get((row * self.cols + col) as usize)
            .copied()
            .unwrap_or(BorderEdge::FLAT)
    }

    pub fn interior_edges(&self) -> impl Iterator<Item = BorderEdge> + '_ {
        self.vertical
            .iter()
            .chain(self.horizontal.iter())
            .copied()
            .filter(|edge| !edge.is_flat())
    }

    /// Resolved `[top, right, bottom, left]` sides of one cell.
    ///
    /// Bottom and right carry the authored kind, top and left see the inverse.
    /// Bottom and left are traced against the border's authored direction.
    pub fn cell_sides(&self, row: u32, col: u32) -> [SideSpec; 4] {
        let top = if row == 0 {
            SideSpec::FLAT
        } else {
            let edge = self.horizontal(row, col);
            SideSpec::new(edge.kind.inverse(), edge.seed, false)
        };
        let right = if col + 1 >= self.cols {
            SideSpec::FLAT
        } else {
            let edge = self.vertical(row, col + 1);
            SideSpec::new(edge.kind, edge.seed, false)
        };
        let bottom = if row + 1 >= self.rows {
            SideSpec::FLAT
        } else {
            let edge = self.horizontal(row + 1, col);
            SideSpec::new(edge.kind, edge.seed, true)
        };
        let left = if col == 0 {
            SideSpec::FLAT
        } else {
            let edge = self.vertical(row, col);
            SideSpec::new(edge.kind.inverse(), edge.seed, true)
        };
        [top, right, bottom, left]
    }
}

pub fn target_position(row: u32, col: u32, cell_size: f64) -> Point {
    Point::new(col as f64 * cell_size, row as f64 * cell_size)
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScatterSettings {
    /// Parallel slot rows on each side of the board.
    pub band_rows: u32,
    /// Gap between slots as a fraction of the cell size.
    pub gap_ratio: f64,
}

impl Default for ScatterSettings {
    fn default() -> Self {
        Self {
            band_rows: SCATTER_BAND_ROWS_DEFAULT,
            gap_ratio: SCATTER_GAP_RATIO_DEFAULT,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScatterLayout {
    pub positions: Vec<Point>,
    pub canvas: Rect,
    pub board: Rect,
    pub fallback_count: usize,
}

pub fn board_rect(rows: u32, cols: u32, cell_size: f64) -> Rect {
    Rect::from_origin_size(
        Point::ORIGIN,
        cols as f64 * cell_size,
        rows as f64 * cell_size,
    )
}

/// Canvas around the board with room for the slot bands (at least one band).
pub fn canvas_rect(rows: u32, cols: u32, cell_size: f64, settings: &ScatterSettings) -> Rect {
    let gap = cell_size * settings.gap_ratio;
    let bands = settings.band_rows.max(1) as f64;
    let margin = bands * (cell_size + gap) + gap;
    let board = board_rect(rows, cols, cell_size);
    Rect::new(
        board.min_x - margin,
        board.min_y - margin,
        board.max_x + margin,
        board.max_y + margin,
    )
}

/// Grid-aligned slot origins in bands around the board. Top and bottom bands
/// span the full canvas width; left and right bands only the board height.
pub fn perimeter_slots(
    rows: u32,
    cols: u32,
    cell_size: f64,
    settings: &ScatterSettings,
) -> Vec<Point> {
    let gap = cell_size * settings.gap_ratio;
    let step = cell_size + gap;
    let board = board_rect(rows, cols, cell_size);
    let canvas = canvas_rect(rows, cols, cell_size, settings);
    let mut slots = Vec::new();

    for band in 0..settings.band_rows {
        let offset = band as f64 * step;
        let top_y = board.min_y - gap - cell_size - offset;
        let bottom_y = board.max_y + gap + offset;
        let mut x = canvas.min_x + gap;
        while x + cell_size <= canvas.max_x - gap + 1e-9 {
            slots.push(Point::new(x, top_y));
            slots.push(Point::new(x, bottom_y));
            x += step;
        }

        let left_x = board.min_x - gap - cell_size - offset;
        let right_x = board.max_x + gap + offset;
        let mut y = board.min_y;
        while y + cell_size <= board.max_y + 1e-9 {
            slots.push(Point::new(left_x, y));
            slots.push(Point::new(right_x, y));
            y += step;
        }
    }
    slots
}

/// Uniformly random origin inside the margin ring, weighted by strip area.
pub fn fallback_position<R: Rng>(
    canvas: &Rect,
    board: &Rect,
    cell_size: f64,
    rng: &mut R,
) -> Point {
    let strips = [
        Rect::new(canvas.min_x, canvas.min_y, canvas.max_x, board.min_y),
        Rect::new(canvas.min_x, board.max_y, canvas.max_x, canvas.max_y),
        Rect::new(canvas.min_x, board.min_y, board.min_x, board.max_y),
        Rect::new(board.max_x, board.min_y, canvas.max_x, board.max_y),
    ];
    // Origins are sampled so the whole cell fits inside the strip.
    let spans: Vec<Rect> = strips
        .iter()
        .map(|strip| {
            Rect::new(
                strip.min_x,
                strip.min_y,
                (strip.max_x - cell_size).max(strip.min_x),
                (strip.max_y - cell_size).max(strip.min_y),
            )
        })
        .collect();
    let weights: Vec<f64> = strips.iter().map(Rect::area).collect();
    let total: f64 = weights.iter().sum();
    let mut pick = rng.random::<f64>() * total;
    let mut chosen = spans[0];
    for (span, weight) in spans.iter().zip(&weights) {
        chosen = *span;
        if pick < *weight {
            break;
        }
        pick -= weight;
    }
    Point::new(
        chosen.min_x + rng.random::<f64>() * chosen.width(),
        chosen.min_y + rng.random::<f64>() * chosen.height(),
    )
}

pub fn scatter_layout<R: Rng>(
    count: usize,
    rows: u32,
    cols: u32,
    cell_size: f64,
    settings: &ScatterSettings,
    rng: &mut R,
) -> ScatterLayout {
    let canvas = canvas_rect(rows, cols, cell_size, settings);
    let board = board_rect(rows, cols, cell_size);
    let mut positions = perimeter_slots(rows, cols, cell_size, settings);
    positions.shuffle(rng);
    positions.truncate(count);
    let fallback_count = count - positions.len();
    if fallback_count > 0 {
        tracing::debug!(
            count,
            slots = positions.len(),
            fallback_count,
            "scatter band too small, sampling margin"
        );
    }
    while positions.len() < count {
        positions.push(fallback_position(&canvas, &board, cell_size, rng));
    }
    ScatterLayout {
        positions,
        canvas,
        board,
        fallback_count,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn cell_rect(origin: Point, cell: f64) -> Rect {
        Rect::from_origin_size(origin, cell, cell)
    }

    #[test]
    fn interior_borders_get_unique_positive_seeds() {
        let mut rng = StdRng::seed_from_u64(1);
        let lattice = BorderLattice::generate(4, 5, &mut rng);
        let seeds: Vec<u32> = lattice.interior_edges().map(|edge| edge.seed).collect();
        // 4 rows * 4 inner vertical borders + 3 inner horizontal rows * 5 cols
        assert_eq!(seeds.len(), 16 + 15);
        assert!(seeds.iter().all(|seed| *seed > 0));
        let unique: HashSet<u32> = seeds.iter().copied().collect();
        assert_eq!(unique.len(), seeds.len());
        for row in 0..4 {
            assert!(lattice.vertical(row, 0).is_flat());
            assert!(lattice.vertical(row, 5).is_flat());
        }
        for col in 0..5 {
            assert!(lattice.horizontal(0, col).is_flat());
            assert!(lattice.horizontal(4, col).is_flat());
        }
    }

    #[test]
    fn adjoining_sides_are_inverse_and_share_seed() {
        let mut rng = StdRng::seed_from_u64(2);
        let (rows, cols) = (3, 4);
        let lattice = BorderLattice::generate(rows, cols, &mut rng);
        for row in 0..rows {
            for col in 0..cols {
                let sides = lattice.cell_sides(row, col);
                if col + 1 < cols {
                    let right = sides[1];
                    let left = lattice.cell_sides(row, col + 1)[3];
                    let authored = lattice.vertical(row, col + 1);
                    assert_eq!(right.seed, left.seed);
                    assert_eq!(right.kind, left.kind.inverse());
                    assert_eq!(right.kind, authored.kind);
                    assert_ne!(left.kind, authored.kind);
                    assert_ne!(right.reversed, left.reversed);
                }
                if row + 1 < rows {
                    let bottom = sides[2];
                    let top = lattice.cell_sides(row + 1, col)[0];
                    assert_eq!(bottom.seed, top.seed);
                    assert_eq!(bottom.kind, top.kind.inverse());
                    assert_ne!(bottom.reversed, top.reversed);
                }
            }
        }
    }

    #[test]
    fn boundary_sides_are_flat() {
        let mut rng = StdRng::seed_from_u64(3);
        let lattice = BorderLattice::generate(2, 2, &mut rng);
        assert_eq!(lattice.cell_sides(0, 0)[0], SideSpec::FLAT);
        assert_eq!(lattice.cell_sides(0, 0)[3], SideSpec::FLAT);
        assert_eq!(lattice.cell_sides(1, 1)[1], SideSpec::FLAT);
        assert_eq!(lattice.cell_sides(1, 1)[2], SideSpec::FLAT);
        assert_ne!(lattice.cell_sides(0, 0)[1].kind, SideKind::Flat);

        let single = BorderLattice::generate(1, 1, &mut rng);
        assert_eq!(single.cell_sides(0, 0), [SideSpec::FLAT; 4]);
    }

    #[test]
    fn perimeter_slots_do_not_overlap_board_or_each_other() {
        let settings = ScatterSettings::default();
        let cell = 100.0;
        let slots = perimeter_slots(3, 4, cell, &settings);
        let board = board_rect(3, 4, cell);
        let canvas = canvas_rect(3, 4, cell, &settings);
        assert!(!slots.is_empty());
        for (idx, slot) in slots.iter().enumerate() {
            let rect = cell_rect(*slot, cell);
            assert!(!rect.overlaps(&board), "slot {idx} over board");
            assert!(canvas.contains_rect(&rect), "slot {idx} outside canvas");
            for other in &slots[idx + 1..] {
                assert!(!rect.overlaps(&cell_rect(*other, cell)));
            }
        }
    }

    #[test]
    fn scatter_assigns_each_piece_a_distinct_slot() {
        let mut rng = StdRng::seed_from_u64(4);
        let layout = scatter_layout(12, 3, 4, 100.0, &ScatterSettings::default(), &mut rng);
        assert_eq!(layout.positions.len(), 12);
        assert_eq!(layout.fallback_count, 0);
        let unique: HashSet<(u64, u64)> = layout
            .positions
            .iter()
            .map(|p| (p.x.to_bits(), p.y.to_bits()))
            .collect();
        assert_eq!(unique.len(), 12);
    }

    #[test]
    fn shortfall_falls_back_to_margin_sampling() {
        let mut rng = StdRng::seed_from_u64(5);
        let settings = ScatterSettings {
            band_rows: 0,
            ..ScatterSettings::default()
        };
        let layout = scatter_layout(30, 5, 6, 50.0, &settings, &mut rng);
        assert_eq!(layout.positions.len(), 30);
        assert_eq!(layout.fallback_count, 30);
        for pos in &layout.positions {
            let rect = cell_rect(*pos, 50.0);
            assert!(layout.canvas.contains_rect(&rect), "{pos:?} outside canvas");
            assert!(!rect.overlaps(&layout.board), "{pos:?} over board");
        }
    }

    #[test]
    fn targets_follow_lattice() {
        assert_eq!(target_position(0, 0, 100.0), Point::new(0.0, 0.0));
        assert_eq!(target_position(2, 3, 50.0), Point::new(150.0, 100.0));
    }
}
