use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::edge::{ProfileCache, ShapeSettings};
use crate::error::GeometryError;
use crate::geom::{rotate_quarter, CubicSegment, Point};

pub const OUTLINE_SIZE_DEFAULT: f64 = 100.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SideKind {
    Flat,
    Tab,
    Slot,
}

impl SideKind {
    pub fn inverse(self) -> Self {
        match self {
            SideKind::Flat => SideKind::Flat,
            SideKind::Tab => SideKind::Slot,
            SideKind::Slot => SideKind::Tab,
        }
    }

    /// Multiplier applied to the base profile's `y`. Clockwise tracing in a
    /// y-down frame puts local `+y` inside the cell, so tabs flip outward.
    fn polarity(self) -> f64 {
        match self {
            SideKind::Flat => 0.0,
            SideKind::Tab => -1.0,
            SideKind::Slot => 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Top, Side::Right, Side::Bottom, Side::Left];

    pub fn index(self) -> usize {
        match self {
            Side::Top => 0,
            Side::Right => 1,
            Side::Bottom => 2,
            Side::Left => 3,
        }
    }

    pub fn opposite(self) -> Side {
        match self {
            Side::Top => Side::Bottom,
            Side::Right => Side::Left,
            Side::Bottom => Side::Top,
            Side::Left => Side::Right,
        }
    }

    /// Grid step `(d_row, d_col)` toward the neighbour across this side.
    pub fn grid_step(self) -> (i64, i64) {
        match self {
            Side::Top => (-1, 0),
            Side::Right => (0, 1),
            Side::Bottom => (1, 0),
            Side::Left => (0, -1),
        }
    }

    fn quarter_turns(self) -> u8 {
        self.index() as u8
    }

    fn start(self, size: f64) -> Point {
        match self {
            Side::Top => Point::new(0.0, 0.0),
            Side::Right => Point::new(size, 0.0),
            Side::Bottom => Point::new(size, size),
            Side::Left => Point::new(0.0, size),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SideSpec {
    pub kind: SideKind,
    pub seed: u32,
    pub reversed: bool,
}

impl SideSpec {
    pub const FLAT: SideSpec = SideSpec {
        kind: SideKind::Flat,
        seed: 0,
        reversed: false,
    };

    pub const fn new(kind: SideKind, seed: u32, reversed: bool) -> Self {
        Self {
            kind,
            seed,
            reversed,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SideCurve {
    Straight { start: Point, end: Point },
    Curved([CubicSegment; 4]),
}

impl SideCurve {
    pub fn start(&self) -> Point {
        match self {
            SideCurve::Straight { start, .. } => *start,
            SideCurve::Curved(segments) => segments[0].start,
        }
    }

    pub fn end(&self) -> Point {
        match self {
            SideCurve::Straight { end, .. } => *end,
            SideCurve::Curved(segments) => segments[3].end,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    CubicTo { ctrl1: Point, ctrl2: Point, end: Point },
    Close,
}

/// Closed piece outline in a `size x size` frame, clockwise from the top-left corner.
#[derive(Clone, Debug, PartialEq)]
pub struct PieceOutline {
    size: f64,
    sides: [SideCurve; 4],
}

impl PieceOutline {
    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn side(&self, side: Side) -> &SideCurve {
        &self.sides[side.index()]
    }

    pub fn commands(&self) -> Vec<PathCommand> {
        let mut commands = Vec::with_capacity(18);
        commands.push(PathCommand::MoveTo(self.sides[0].start()));
        for curve in &self.sides {
            match curve {
                SideCurve::Straight { end, .. } => commands.push(PathCommand::LineTo(*end)),
                SideCurve::Curved(segments) => {
                    for seg in segments {
                        commands.push(PathCommand::CubicTo {
                            ctrl1: seg.ctrl1,
                            ctrl2: seg.ctrl2,
                            end: seg.end,
                        });
                    }
                }
            }
        }
        commands.push(PathCommand::Close);
        commands
    }

    pub fn to_svg_path(&self) -> String {
        let mut path = String::new();
        for command in self.commands() {
            if !path.is_empty() {
                path.push(' ');
            }
            let _ = match command {
                PathCommand::MoveTo(p) => write!(path, "M {} {}", fmt_coord(p.x), fmt_coord(p.y)),
                PathCommand::LineTo(p) => write!(path, "L {} {}", fmt_coord(p.x), fmt_coord(p.y)),
                PathCommand::CubicTo { ctrl1, ctrl2, end } => write!(
                    path,
                    "C {} {} {} {} {} {}",
                    fmt_coord(ctrl1.x),
                    fmt_coord(ctrl1.y),
                    fmt_coord(ctrl2.x),
                    fmt_coord(ctrl2.y),
                    fmt_coord(end.x),
                    fmt_coord(end.y)
                ),
                PathCommand::Close => write!(path, "Z"),
            };
        }
        path
    }
}

/// Fixed three-decimal coordinate text with `-0.000` folded into `0.000`.
pub fn fmt_coord(value: f64) -> String {
    let formatted = format!("{:.3}", value);
    if formatted == "-0.000" {
        "0.000".to_string()
    } else {
        formatted
    }
}

/// Composes piece outlines; owns the profile cache for one board build.
#[derive(Debug)]
pub struct OutlineBuilder {
    size: f64,
    cache: ProfileCache,
}

impl OutlineBuilder {
    pub fn new(size: f64, settings: ShapeSettings) -> Result<Self, GeometryError> {
        if !size.is_finite() || size <= 0.0 {
            return Err(GeometryError::InvalidLength(size));
        }
        Ok(Self {
            size,
            cache: ProfileCache::new(settings),
        })
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn cache(&self) -> &ProfileCache {
        &self.cache
    }

    pub fn build(&mut self, specs: &[SideSpec; 4]) -> Result<PieceOutline, GeometryError> {
        let sides = [
            self.side_curve(Side::Top, specs[0])?,
            self.side_curve(Side::Right, specs[1])?,
            self.side_curve(Side::Bottom, specs[2])?,
            self.side_curve(Side::Left, specs[3])?,
        ];
        Ok(PieceOutline {
            size: self.size,
            sides,
        })
    }

    pub fn side_curve(&mut self, side: Side, spec: SideSpec) -> Result<SideCurve, GeometryError> {
        let len = self.size;
        let origin = side.start(len);
        let turns = side.quarter_turns();
        let place = |p: Point| origin + rotate_quarter(p, turns);

        if spec.kind == SideKind::Flat {
            return Ok(SideCurve::Straight {
                start: place(Point::ORIGIN),
                end: place(Point::new(len, 0.0)),
            });
        }

        let profile = self.cache.profile(spec.seed, len)?;
        let polarity = spec.kind.polarity();
        let mut local = profile
            .segments()
            .map(|seg| seg.map(|p| Point::new(p.x, p.y * polarity)));
        if spec.reversed {
            local.reverse();
            local = local.map(|seg| seg.reversed().map(|p| Point::new(len - p.x, p.y)));
        }
        Ok(SideCurve::Curved(local.map(|seg| seg.map(place))))
    }
}
