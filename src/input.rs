use jigsnap_core::{Point, Rect};

/// A pointer sample in screen pixels, as delivered by a windowing layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawPointer {
    pub screen_x: f64,
    pub screen_y: f64,
}

impl RawPointer {
    pub fn new(screen_x: f64, screen_y: f64) -> Self {
        Self {
            screen_x,
            screen_y,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent<E> {
    Down { piece: usize, sample: E },
    Move(E),
    Up(E),
    Cancel,
}

/// Maps a pointer sample into the board's local coordinate space.
/// `None` means the sample cannot be placed, e.g. a collapsed viewport.
pub trait ScreenToLocal<E> {
    fn to_local(&self, sample: &E) -> Option<Point>;
}

impl<E, F> ScreenToLocal<E> for F
where
    F: Fn(&E) -> Option<Point>,
{
    fn to_local(&self, sample: &E) -> Option<Point> {
        self(sample)
    }
}

/// Viewport mapping from an on-screen client rectangle onto a board-space view rectangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub client: Rect,
    pub view: Rect,
}

impl ViewTransform {
    pub fn new(client: Rect, view: Rect) -> Self {
        Self { client, view }
    }

    /// Screen pixels map one to one onto board units.
    pub fn identity(width: f64, height: f64) -> Self {
        let rect = Rect::from_origin_size(Point::ORIGIN, width, height);
        Self::new(rect, rect)
    }

    pub fn screen_to_view(&self, screen_x: f64, screen_y: f64) -> Option<Point> {
        let (scale_x, scale_y) = self.scale()?;
        Some(Point::new(
            self.view.min_x + (screen_x - self.client.min_x) * scale_x,
            self.view.min_y + (screen_y - self.client.min_y) * scale_y,
        ))
    }

    fn scale(&self) -> Option<(f64, f64)> {
        let client_w = self.client.width();
        let client_h = self.client.height();
        if client_w <= 0.0 || client_h <= 0.0 {
            return None;
        }
        Some((self.view.width() / client_w, self.view.height() / client_h))
    }
}

impl ScreenToLocal<RawPointer> for ViewTransform {
    fn to_local(&self, sample: &RawPointer) -> Option<Point> {
        self.screen_to_view(sample.screen_x, sample.screen_y)
    }
}
