use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;

use jigsnap_core::{release, translate_cluster, Board, BuildError, BuildRequest, MergeReport, Point};

use crate::input::{PointerEvent, ScreenToLocal};

pub type EventSubscriber = Rc<dyn Fn(&GameEvent)>;

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    Rebuilt { pieces: usize },
    Snapped(MergeReport),
    Cleared,
}

/// What a finished drag did to the board.
#[derive(Clone, Debug, PartialEq)]
pub struct DropResult {
    pub cluster: usize,
    pub merge: Option<MergeReport>,
    pub cleared: bool,
}

#[derive(Clone, Debug)]
struct DragSession {
    cluster: usize,
    last: Point,
}

/// Owns the published board and turns pointer samples into engine calls.
pub struct PuzzleSession<E, M> {
    mapper: M,
    request: BuildRequest,
    board: Board,
    paint_order: Vec<usize>,
    drag: Option<DragSession>,
    subscribers: Rc<RefCell<Vec<EventSubscriber>>>,
    _sample: PhantomData<fn(&E)>,
}

impl<E, M> PuzzleSession<E, M>
where
    M: ScreenToLocal<E>,
{
    pub fn new(request: BuildRequest, mapper: M) -> Result<Self, BuildError> {
        let board = Board::build(&request)?;
        let paint_order = (0..board.len()).collect();
        Ok(Self {
            mapper,
            request,
            board,
            paint_order,
            drag: None,
            subscribers: Rc::new(RefCell::new(Vec::new())),
            _sample: PhantomData,
        })
    }

    /// Builds a fresh board and publishes it in one step. On error the
    /// current board stays in place.
    pub fn rebuild(&mut self, request: BuildRequest) -> Result<(), BuildError> {
        let board = match Board::build(&request) {
            Ok(board) => board,
            Err(err) => {
                tracing::warn!(%err, "rebuild rejected");
                return Err(err);
            }
        };
        self.drag = None;
        self.paint_order = (0..board.len()).collect();
        self.board = board;
        self.request = request;
        self.emit(&GameEvent::Rebuilt {
            pieces: self.board.len(),
        });
        Ok(())
    }

    /// Rebuilds with the current request. An unpinned seed yields a new scatter.
    pub fn restart(&mut self) -> Result<(), BuildError> {
        self.rebuild(self.request.clone())
    }

    pub fn board(&self) -> Board {
        self.board.clone()
    }

    pub fn request(&self) -> &BuildRequest {
        &self.request
    }

    /// Back-to-front piece ids.
    pub fn paint_order(&self) -> &[usize] {
        &self.paint_order
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn dragged_cluster(&self) -> Option<usize> {
        self.drag.as_ref().map(|drag| drag.cluster)
    }

    pub fn subscribe(&self, subscriber: EventSubscriber) -> Subscription {
        self.subscribers.borrow_mut().push(subscriber.clone());
        Subscription {
            subscriber,
            subscribers: Rc::clone(&self.subscribers),
        }
    }

    pub fn handle(&mut self, event: PointerEvent<E>) -> bool {
        match event {
            PointerEvent::Down { piece, sample } => self.pointer_down(piece, &sample),
            PointerEvent::Move(sample) => self.pointer_move(&sample),
            PointerEvent::Up(sample) => self.pointer_up(&sample).is_some(),
            PointerEvent::Cancel => self.pointer_cancel().is_some(),
        }
    }

    pub fn pointer_down(&mut self, piece_id: usize, sample: &E) -> bool {
        if self.board.is_cleared() || self.drag.is_some() {
            return false;
        }
        let Some(cluster) = self.board.cluster_of(piece_id) else {
            return false;
        };
        let Some(local) = self.mapper.to_local(sample) else {
            return false;
        };
        let members = self.board.cluster_members(cluster);
        bring_members_to_front(&mut self.paint_order, &members);
        tracing::trace!(piece_id, cluster, x = local.x, y = local.y, "drag start");
        self.drag = Some(DragSession {
            cluster,
            last: local,
        });
        true
    }

    pub fn pointer_move(&mut self, sample: &E) -> bool {
        let Some(drag) = self.drag.as_mut() else {
            return false;
        };
        let Some(local) = self.mapper.to_local(sample) else {
            return false;
        };
        let delta = local - drag.last;
        drag.last = local;
        let cluster = drag.cluster;
        tracing::trace!(cluster, dx = delta.x, dy = delta.y, "drag move");
        if delta == Point::ORIGIN {
            return true;
        }
        self.board = translate_cluster(&self.board, cluster, delta);
        true
    }

    pub fn pointer_up(&mut self, sample: &E) -> Option<DropResult> {
        if self.drag.is_none() {
            return None;
        }
        self.pointer_move(sample);
        self.finish_drag()
    }

    /// Ends the drag where the cluster currently is, through the same snap
    /// path as a release.
    pub fn pointer_cancel(&mut self) -> Option<DropResult> {
        self.finish_drag()
    }

    fn finish_drag(&mut self) -> Option<DropResult> {
        let drag = self.drag.take()?;
        let outcome = release(&self.board, drag.cluster);
        self.board = outcome.board;
        if let Some(report) = &outcome.merge {
            self.emit(&GameEvent::Snapped(report.clone()));
        }
        if outcome.cleared {
            self.emit(&GameEvent::Cleared);
        }
        Some(DropResult {
            cluster: drag.cluster,
            merge: outcome.merge,
            cleared: outcome.cleared,
        })
    }

    fn emit(&self, event: &GameEvent) {
        let subscribers = self.subscribers.borrow().clone();
        for subscriber in subscribers {
            subscriber(event);
        }
    }
}

pub struct Subscription {
    subscriber: EventSubscriber,
    subscribers: Rc<RefCell<Vec<EventSubscriber>>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let mut subscribers = self.subscribers.borrow_mut();
        subscribers.retain(|item| !Rc::ptr_eq(item, &self.subscriber));
    }
}

fn bring_members_to_front(order: &mut Vec<usize>, members: &[usize]) {
    if order.is_empty() || members.is_empty() {
        return;
    }
    let mut keep = Vec::with_capacity(order.len());
    for id in order.iter().copied() {
        if !members.contains(&id) {
            keep.push(id);
        }
    }
    keep.extend_from_slice(members);
    *order = keep;
}
