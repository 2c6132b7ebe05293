use std::fmt::Write;

use jigsnap_core::outline::fmt_coord;
use jigsnap_core::{Board, Piece};

pub const INFLATE_DEFAULT: f64 = 1.0;
pub const STROKE_WIDTH_DEFAULT: f64 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SvgOptions {
    /// Grows each piece about its cell centre to hide hairline seams.
    pub inflate: f64,
    pub stroke_width: f64,
    pub show_board: bool,
}

impl Default for SvgOptions {
    fn default() -> Self {
        Self {
            inflate: INFLATE_DEFAULT,
            stroke_width: STROKE_WIDTH_DEFAULT,
            show_board: true,
        }
    }
}

/// Renders the board as a standalone SVG document. Pieces are drawn in
/// `paint_order` (back to front); an empty order means id order.
pub fn render_board(board: &Board, paint_order: &[usize], options: &SvgOptions) -> String {
    let canvas = board.canvas();
    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{} {} {} {}" width="{}" height="{}">"#,
        fmt_num(canvas.min_x),
        fmt_num(canvas.min_y),
        fmt_num(canvas.width()),
        fmt_num(canvas.height()),
        fmt_num(canvas.width()),
        fmt_num(canvas.height())
    );
    if options.show_board {
        let _ = writeln!(
            out,
            r##"  <rect x="0" y="0" width="{}" height="{}" fill="none" stroke="#888" stroke-dasharray="4 4"/>"##,
            fmt_num(board.cols() as f64 * board.cell_size()),
            fmt_num(board.rows() as f64 * board.cell_size())
        );
    }

    let default_order: Vec<usize>;
    let order = if paint_order.is_empty() {
        default_order = (0..board.len()).collect();
        &default_order[..]
    } else {
        paint_order
    };
    for id in order {
        if let Some(piece) = board.piece(*id) {
            write_piece(&mut out, board, piece, options);
        }
    }
    out.push_str("</svg>\n");
    out
}

fn write_piece(out: &mut String, board: &Board, piece: &Piece, options: &SvgOptions) {
    let inflate = if options.inflate.is_finite() && options.inflate > 0.0 {
        options.inflate
    } else {
        INFLATE_DEFAULT
    };
    let scale = board.outline_scale() * inflate;
    let shift = (inflate - 1.0) * board.cell_size() * 0.5;
    let stroke = options.stroke_width / scale;
    let _ = writeln!(
        out,
        r#"  <path data-id="{}" data-cluster="{}" d="{}" transform="translate({} {}) scale({})" fill="{}" stroke="{}" stroke-width="{}"/>"#,
        piece.id,
        piece.cluster,
        piece.outline().to_svg_path(),
        fmt_num(piece.position.x - shift),
        fmt_num(piece.position.y - shift),
        fmt_num(scale),
        cluster_fill(piece.cluster),
        if piece.solved { "#2a6" } else { "#333" },
        fmt_num(stroke)
    );
}

/// Golden-angle hue per cluster so fused groups share a colour.
fn cluster_fill(cluster: usize) -> String {
    let hue = (cluster as f64 * 137.508) % 360.0;
    format!("hsl({} 55% 68%)", fmt_num(hue))
}

/// `fmt_coord` without trailing zeros.
fn fmt_num(value: f64) -> String {
    let formatted = fmt_coord(value);
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use jigsnap_core::BuildRequest;

    fn board() -> Board {
        Board::build(&BuildRequest::new(2, 2, 50.0, 10.0).with_seed(17)).expect("board")
    }

    #[test]
    fn one_path_per_piece_in_paint_order() {
        let board = board();
        let svg = render_board(&board, &[3, 1, 0, 2], &SvgOptions::default());
        assert!(svg.starts_with("<svg "));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches("<path ").count(), 4);
        let positions: Vec<usize> = ["data-id=\"3\"", "data-id=\"1\"", "data-id=\"0\"", "data-id=\"2\""]
            .iter()
            .map(|needle| svg.find(needle).expect("piece"))
            .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(svg.contains("scale(0.5)"));
    }

    #[test]
    fn unknown_ids_are_skipped_and_empty_order_uses_ids() {
        let board = board();
        let svg = render_board(&board, &[7, 0], &SvgOptions::default());
        assert_eq!(svg.matches("<path ").count(), 1);
        let svg = render_board(&board, &[], &SvgOptions::default());
        assert_eq!(svg.matches("<path ").count(), 4);
    }

    #[test]
    fn inflation_keeps_the_cell_centred() {
        let board = board();
        let options = SvgOptions {
            inflate: 1.02,
            show_board: false,
            ..SvgOptions::default()
        };
        let svg = render_board(&board, &[0], &options);
        assert!(svg.contains("scale(0.51)"), "{svg}");
        assert!(!svg.contains("<rect"));
    }

    #[test]
    fn numbers_are_trimmed() {
        assert_eq!(fmt_num(100.0), "100");
        assert_eq!(fmt_num(0.5), "0.5");
        assert_eq!(fmt_num(-0.0001), "0");
        assert_eq!(fmt_num(12.34567), "12.346");
    }
}
