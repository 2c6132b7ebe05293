pub mod board;
pub mod config;
pub mod edge;
pub mod error;
pub mod geom;
pub mod layout;
pub mod outline;
pub mod snap;

pub use board::{Board, Piece};
pub use config::BuildRequest;
pub use edge::{EdgeProfile, ProfileCache, ShapeSettings};
pub use error::{BuildError, ConfigError, GeometryError};
pub use geom::{CubicSegment, Point, Rect};
pub use layout::{BorderEdge, BorderLattice, ScatterLayout, ScatterSettings};
pub use outline::{
    OutlineBuilder, PathCommand, PieceOutline, Side, SideCurve, SideKind, SideSpec,
};
pub use snap::{
    find_snap, is_complete, merge, release, settle, translate_cluster, MergeReport,
    ReleaseOutcome, SnapMatch,
};
