use crate::board::Board;
use crate::geom::Point;
use crate::outline::Side;

const NEIGHBOR_ORDER: [Side; 4] = [Side::Top, Side::Right, Side::Bottom, Side::Left];

/// A qualifying (dragged piece, stationary neighbour) pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SnapMatch {
    pub moving: usize,
    pub anchor: usize,
    pub moving_cluster: usize,
    pub anchor_cluster: usize,
    /// Translation that puts `moving` exactly on the lattice relative to `anchor`.
    pub correction: Point,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MergeReport {
    pub absorbed: usize,
    pub into: usize,
    pub moving: usize,
    pub anchor: usize,
    pub correction: Point,
    pub members: Vec<usize>,
}

#[derive(Clone, Debug)]
pub struct ReleaseOutcome {
    pub board: Board,
    pub merge: Option<MergeReport>,
    pub cleared: bool,
}

/// Ideal `position(a) - position(b)` for two cells on the lattice.
pub fn ideal_offset(board: &Board, a: usize, b: usize) -> Option<Point> {
    let pa = board.piece(a)?;
    let pb = board.piece(b)?;
    let cell = board.cell_size();
    Some(Point::new(
        (pa.col as f64 - pb.col as f64) * cell,
        (pa.row as f64 - pb.row as f64) * cell,
    ))
}

pub fn translate_cluster(board: &Board, cluster: usize, delta: Point) -> Board {
    let pieces = board
        .pieces()
        .iter()
        .cloned()
        .map(|mut piece| {
            if piece.cluster == cluster {
                piece.position = piece.position + delta;
            }
            piece
        })
        .collect();
    board.with_pieces(pieces, board.is_cleared())
}

/// First qualifying pair in ascending member id, then `top, right, bottom,
/// left` neighbour order. No search for a better match.
pub fn find_snap(board: &Board, cluster: usize) -> Option<SnapMatch> {
    let tolerance = board.snap_threshold();
    for moving in board.cluster_members(cluster) {
        let Some(piece) = board.piece(moving) else {
            continue;
        };
        for side in NEIGHBOR_ORDER {
            let Some(neighbor) = board.neighbor(moving, side) else {
                continue;
            };
            if neighbor.cluster == cluster {
                continue;
            }
            let Some(ideal) = ideal_offset(board, moving, neighbor.id) else {
                continue;
            };
            let actual = piece.position - neighbor.position;
            if actual.within(ideal, tolerance) {
                return Some(SnapMatch {
                    moving,
                    anchor: neighbor.id,
                    moving_cluster: cluster,
                    anchor_cluster: neighbor.cluster,
                    correction: ideal - actual,
                });
            }
        }
    }
    None
}

/// Rigidly moves the dragged cluster by the correction and relabels it with
/// the anchor's cluster id. Both clusters end up solved.
pub fn merge(board: &Board, found: &SnapMatch) -> (Board, MergeReport) {
    let mut members = Vec::new();
    let pieces = board
        .pieces()
        .iter()
        .cloned()
        .map(|mut piece| {
            if piece.cluster == found.moving_cluster {
                piece.position = piece.position + found.correction;
                piece.cluster = found.anchor_cluster;
                piece.solved = true;
            } else if piece.cluster == found.anchor_cluster {
                piece.solved = true;
            }
            if piece.cluster == found.anchor_cluster {
                members.push(piece.id);
            }
            piece
        })
        .collect();
    let report = MergeReport {
        absorbed: found.moving_cluster,
        into: found.anchor_cluster,
        moving: found.moving,
        anchor: found.anchor,
        correction: found.correction,
        members,
    };
    tracing::debug!(
        absorbed = report.absorbed,
        into = report.into,
        size = report.members.len(),
        dx = report.correction.x,
        dy = report.correction.y,
        "clusters merged"
    );
    (board.with_pieces(pieces, board.is_cleared()), report)
}

/// Every piece within the snap threshold of its target on both axes.
pub fn is_complete(board: &Board) -> bool {
    let tolerance = board.snap_threshold();
    !board.is_empty()
        && board
            .pieces()
            .iter()
            .all(|piece| piece.position.within(piece.target, tolerance))
}

/// Puts every piece exactly on its target and marks the board cleared.
pub fn settle(board: &Board) -> Board {
    let pieces = board
        .pieces()
        .iter()
        .cloned()
        .map(|mut piece| {
            piece.position = piece.target;
            piece.solved = true;
            piece
        })
        .collect();
    board.with_pieces(pieces, true)
}

/// Snap check for a released cluster: at most one merge, then the completion
/// check, which runs on every release.
pub fn release(board: &Board, cluster: usize) -> ReleaseOutcome {
    if board.is_cleared() {
        return ReleaseOutcome {
            board: board.clone(),
            merge: None,
            cleared: true,
        };
    }
    let (next, merge_report) = match find_snap(board, cluster) {
        Some(found) => {
            let (next, report) = merge(board, &found);
            (next, Some(report))
        }
        None => (board.clone(), None),
    };
    if is_complete(&next) {
        tracing::info!(pieces = next.len(), "puzzle cleared");
        return ReleaseOutcome {
            board: settle(&next),
            merge: merge_report,
            cleared: true,
        };
    }
    ReleaseOutcome {
        board: next,
        merge: merge_report,
        cleared: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildRequest;

    fn board_2x2() -> Board {
        Board::build(&BuildRequest::new(2, 2, 100.0, 20.0).with_seed(3)).expect("board")
    }

    fn place(board: &Board, id: usize, pos: Point) -> Board {
        let piece = board.piece(id).expect("piece");
        translate_cluster(board, piece.cluster, pos - piece.position)
    }

    fn assert_close(a: Point, b: Point) {
        assert!(a.distance(b) < 1e-9, "{a:?} vs {b:?}");
    }

    #[test]
    fn translate_moves_only_the_cluster() {
        let board = board_2x2();
        let before: Vec<Point> = board.pieces().iter().map(|p| p.position).collect();
        let moved = translate_cluster(&board, 2, Point::new(5.0, -3.0));
        for piece in moved.pieces() {
            let expected = if piece.id == 2 {
                before[2] + Point::new(5.0, -3.0)
            } else {
                before[piece.id]
            };
            assert_eq!(piece.position, expected);
        }
        // the source snapshot is untouched
        assert_eq!(board.piece(2).map(|p| p.position), Some(before[2]));
    }

    #[test]
    fn find_snap_uses_per_axis_tolerance() {
        let board = board_2x2();
        let board = place(&board, 0, Point::new(400.0, 400.0));
        // euclidean 27.6 but within tolerance on each axis
        let board = place(&board, 1, Point::new(519.5, 419.5));
        let found = find_snap(&board, 1).expect("match");
        assert_eq!(found.anchor, 0);
        assert_close(found.correction, Point::new(-19.5, -19.5));

        let board = place(&board, 1, Point::new(521.0, 400.0));
        assert!(find_snap(&board, 1).is_none());
    }

    #[test]
    fn merge_relabels_and_corrects_rigidly() {
        let board = board_2x2();
        let board = place(&board, 2, Point::new(300.0, 400.0));
        let board = place(&board, 3, Point::new(402.0, 399.0));
        let found = find_snap(&board, 3).expect("match");
        let (board, report) = merge(&board, &found);
        assert_eq!(report.into, 2);
        assert_eq!(report.absorbed, 3);
        assert_eq!(report.members, vec![2, 3]);
        let p2 = board.piece(2).expect("piece");
        let p3 = board.piece(3).expect("piece");
        assert_eq!(p3.cluster, 2);
        assert!(p2.solved && p3.solved);
        assert_close(p3.position - p2.position, Point::new(100.0, 0.0));
        assert!(!board.piece(0).expect("piece").solved);
    }

    #[test]
    fn release_without_neighbor_keeps_clusters() {
        let board = board_2x2();
        let board = place(&board, 0, Point::new(-300.0, -300.0));
        let outcome = release(&board, 0);
        assert!(outcome.merge.is_none());
        assert!(!outcome.cleared);
        assert_eq!(outcome.board.cluster_count(), 4);
        let piece = outcome.board.piece(0).expect("piece");
        assert_close(piece.position, Point::new(-300.0, -300.0));
    }

    #[test]
    fn release_on_cleared_board_is_inert() {
        let board = settle(&board_2x2());
        let outcome = release(&board, 0);
        assert!(outcome.cleared);
        assert!(outcome.merge.is_none());
    }
}
