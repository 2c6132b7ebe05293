use std::cell::Cell;
use std::rc::Rc;

use jigsnap::{GameEvent, PointerEvent, PuzzleSession, RawPointer, ViewTransform};
use jigsnap_core::{BuildRequest, Point};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use super::BoardArgs;

#[derive(clap::Args, Clone, Debug)]
pub(super) struct PlayArgs {
    #[command(flatten)]
    board: BoardArgs,
    /// Per-axis placement error; capped at the snap threshold.
    #[arg(long, default_value_t = 4.0)]
    jitter_px: f64,
    #[arg(long, default_value_t = 10_000)]
    max_drags: u32,
    #[arg(long, default_value_t = 4)]
    steps_max: u32,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct BotRunConfig {
    pub jitter_px: f64,
    pub max_drags: u32,
    pub steps_max: u32,
}

#[derive(Clone, Debug, Serialize)]
pub(crate) struct PlaySummary {
    pub rows: u32,
    pub cols: u32,
    pub seed: u64,
    pub drags: u32,
    pub snaps: usize,
    pub cleared: bool,
}

pub(super) fn run(args: PlayArgs) -> Result<(), Box<dyn std::error::Error>> {
    let request = args.board.request()?;
    let config = BotRunConfig {
        jitter_px: args.jitter_px,
        max_drags: args.max_drags,
        steps_max: args.steps_max,
    };
    let summary = play(request, config)?;
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

/// Drags piece 0 onto its target, then attaches the lowest-id piece outside
/// the main cluster next to it until the board clears.
pub(crate) fn play(
    mut request: BuildRequest,
    config: BotRunConfig,
) -> Result<PlaySummary, jigsnap_core::BuildError> {
    let seed = *request.seed.get_or_insert_with(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);
    let jitter = config.jitter_px.clamp(0.0, request.snap_threshold);

    // the bot samples directly in board units
    let mapper = ViewTransform::identity(1.0, 1.0);
    let mut session = PuzzleSession::new(request.clone(), mapper)?;

    let snaps = Rc::new(Cell::new(0usize));
    let counter = Rc::clone(&snaps);
    let _subscription = session.subscribe(Rc::new(move |event: &GameEvent| {
        if let GameEvent::Snapped(_) = event {
            counter.set(counter.get() + 1);
        }
    }));

    let mut drags = 0;
    let mut anchor_placed = false;
    while !session.board().is_cleared() && drags < config.max_drags {
        let board = session.board();
        let Some(anchor) = board.piece(0) else {
            break;
        };
        let anchor_cluster = anchor.cluster;
        let next = board.pieces().iter().find(|p| p.cluster != anchor_cluster);
        let (piece_id, goal) = match next {
            Some(piece) if anchor_placed => {
                (piece.id, anchor.position + (piece.target - anchor.target))
            }
            _ => (0, anchor.target),
        };
        anchor_placed = true;
        let offset = Point::new(
            rng.random_range(-jitter..=jitter),
            rng.random_range(-jitter..=jitter),
        );
        let Some(start) = board.piece(piece_id).map(|piece| piece.position) else {
            break;
        };
        drag(&mut session, piece_id, start, goal + offset, &mut rng, config.steps_max);
        drags += 1;
    }

    let board = session.board();
    let summary = PlaySummary {
        rows: request.rows,
        cols: request.cols,
        seed,
        drags,
        snaps: snaps.get(),
        cleared: board.is_cleared(),
    };
    tracing::info!(
        drags = summary.drags,
        snaps = summary.snaps,
        cleared = summary.cleared,
        "play finished"
    );
    Ok(summary)
}

fn drag<M>(
    session: &mut PuzzleSession<RawPointer, M>,
    piece_id: usize,
    start: Point,
    end: Point,
    rng: &mut StdRng,
    steps_max: u32,
) where
    M: jigsnap::ScreenToLocal<RawPointer>,
{
    let sample = |p: Point| RawPointer::new(p.x, p.y);
    if !session.handle(PointerEvent::Down {
        piece: piece_id,
        sample: sample(start),
    }) {
        return;
    }
    let steps = rng.random_range(1..=steps_max.max(1));
    for step in 1..=steps {
        let t = step as f64 / steps as f64;
        let p = Point::new(
            start.x + (end.x - start.x) * t,
            start.y + (end.y - start.y) * t,
        );
        session.handle(PointerEvent::Move(sample(p)));
    }
    session.handle(PointerEvent::Up(sample(end)));
}
