use std::collections::BTreeMap;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::BuildRequest;
use crate::error::BuildError;
use crate::geom::{Point, Rect};
use crate::layout::{scatter_layout, target_position, BorderLattice};
use crate::outline::{OutlineBuilder, PieceOutline, Side, SideSpec};

#[derive(Clone, Debug, PartialEq)]
pub struct Piece {
    pub id: usize,
    pub row: u32,
    pub col: u32,
    pub cluster: usize,
    pub sides: [SideSpec; 4],
    pub position: Point,
    pub target: Point,
    pub solved: bool,
    outline: Rc<PieceOutline>,
}

impl Piece {
    pub fn outline(&self) -> &PieceOutline {
        &self.outline
    }
}

/// Immutable snapshot of every piece. Engine operations return a new `Board`.
#[derive(Clone, Debug)]
pub struct Board {
    rows: u32,
    cols: u32,
    cell_size: f64,
    snap_threshold: f64,
    outline_size: f64,
    canvas: Rect,
    pieces: Rc<[Piece]>,
    cleared: bool,
}

impl Board {
    /// Validates the request, then plans the lattice, outlines and scatter in
    /// one pass. Nothing is produced on error.
    pub fn build(request: &BuildRequest) -> Result<Self, BuildError> {
        request.validate()?;
        let seed = request.seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);
        Self::build_with_rng(request, &mut rng)
    }

    pub fn build_with_rng(request: &BuildRequest, rng: &mut StdRng) -> Result<Self, BuildError> {
        request.validate()?;
        let rows = request.rows;
        let cols = request.cols;
        let lattice = BorderLattice::generate(rows, cols, rng);
        let mut builder = OutlineBuilder::new(request.outline_size, request.shape)?;
        let scatter = scatter_layout(
            request.piece_count(),
            rows,
            cols,
            request.cell_size,
            &request.scatter,
            rng,
        );

        let mut pieces = Vec::with_capacity(request.piece_count());
        for row in 0..rows {
            for col in 0..cols {
                let id = (row * cols + col) as usize;
                let sides = lattice.cell_sides(row, col);
                let outline = Rc::new(builder.build(&sides)?);
                pieces.push(Piece {
                    id,
                    row,
                    col,
                    cluster: id,
                    sides,
                    position: scatter.positions[id],
                    target: target_position(row, col, request.cell_size),
                    solved: false,
                    outline,
                });
            }
        }
        tracing::debug!(
            rows,
            cols,
            profiles = builder.cache().len(),
            fallback = scatter.fallback_count,
            "board built"
        );

        Ok(Self {
            rows,
            cols,
            cell_size: request.cell_size,
            snap_threshold: request.snap_threshold,
            outline_size: request.outline_size,
            canvas: scatter.canvas,
            pieces: pieces.into(),
            cleared: false,
        })
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn snap_threshold(&self) -> f64 {
        self.snap_threshold
    }

    pub fn canvas(&self) -> Rect {
        self.canvas
    }

    /// Factor mapping the canonical outline frame onto board units.
    pub fn outline_scale(&self) -> f64 {
        self.cell_size / self.outline_size
    }

    pub fn is_cleared(&self) -> bool {
        self.cleared
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn piece(&self, id: usize) -> Option<&Piece> {
        self.pieces.get(id)
    }

    pub fn piece_at(&self, row: u32, col: u32) -> Option<&Piece> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.piece((row * self.cols + col) as usize)
    }

    pub fn neighbor(&self, id: usize, side: Side) -> Option<&Piece> {
        let piece = self.piece(id)?;
        let (d_row, d_col) = side.grid_step();
        let row = piece.row.checked_add_signed(d_row as i32)?;
        let col = piece.col.checked_add_signed(d_col as i32)?;
        self.piece_at(row, col)
    }

    pub fn cluster_of(&self, id: usize) -> Option<usize> {
        self.piece(id).map(|piece| piece.cluster)
    }

    /// Member ids of one cluster, ascending.
    pub fn cluster_members(&self, cluster: usize) -> Vec<usize> {
        self.pieces
            .iter()
            .filter(|piece| piece.cluster == cluster)
            .map(|piece| piece.id)
            .collect()
    }

    pub fn clusters(&self) -> BTreeMap<usize, Vec<usize>> {
        let mut clusters: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for piece in self.pieces.iter() {
            clusters.entry(piece.cluster).or_default().push(piece.id);
        }
        clusters
    }

    pub fn cluster_count(&self) -> usize {
        self.clusters().len()
    }

    /// Publishes a replacement piece set computed from this snapshot.
    pub(crate) fn with_pieces(&self, pieces: Vec<Piece>, cleared: bool) -> Self {
        Self {
            pieces: pieces.into(),
            cleared,
            ..self.clone()
        }
    }
}
