pub mod input;
pub mod session;
pub mod svg;

pub use jigsnap_core::{Board, BuildError, BuildRequest, Piece, Point};

pub use input::{PointerEvent, RawPointer, ScreenToLocal, ViewTransform};
pub use session::{DropResult, EventSubscriber, GameEvent, PuzzleSession, Subscription};
pub use svg::{render_board, SvgOptions};
