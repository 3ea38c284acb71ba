//! Cursor snapping for interactive track drawing
//!
//! Biases the cursor toward useful points while a track is being drawn:
//! pads first, then vias, then the crossing point with an existing track,
//! then (in the track tool) the nearest track endpoint.
//!
//! `project` and `join` are the geometric primitives; `magnetize` is the
//! policy combining them with the user's magnetic settings.

use serde::{Deserialize, Serialize};

use crate::board::{Board, PadId, Segment, SegmentId};
use crate::connectivity::locate_track_hit;
use crate::geometry::{Point, Size2D};
use crate::layer::{LayerId, LayerMask};

/// When a magnetic attraction applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MagneticMode {
    NoEffect,
    #[default]
    CaptureInTrackTool,
    CaptureAlways,
}

/// User settings driving [`magnetize`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MagneticSettings {
    pub pads: MagneticMode,
    pub tracks: MagneticMode,
    /// Design rule checking on: only snap to items of the drawn track's net
    pub drc_on: bool,
    /// Tracks are drawn as two segments (a 45 degree leg plus a straight one)
    pub two_segment_build: bool,
}

impl Default for MagneticSettings {
    fn default() -> Self {
        Self {
            pads: MagneticMode::CaptureInTrackTool,
            tracks: MagneticMode::CaptureInTrackTool,
            drc_on: true,
            two_segment_build: true,
        }
    }
}

/// Editing tool currently active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    #[default]
    Select,
    Track,
}

/// Cursor state for one mouse move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapContext {
    pub tool: Tool,
    pub active_layer: LayerId,
    pub grid: Size2D,
    /// Cursor position rounded to the grid
    pub on_grid: Point,
    /// Raw cursor position
    pub cursor: Point,
    /// Segment being drawn, if any
    pub current_track: Option<SegmentId>,
    /// A via is being dragged
    pub moving_via: bool,
}

impl SnapContext {
    pub fn new(cursor: Point, active_layer: LayerId, grid: Size2D) -> Self {
        Self {
            tool: Tool::Select,
            active_layer,
            grid,
            on_grid: snap_to_grid(cursor, grid),
            cursor,
            current_track: None,
            moving_via: false,
        }
    }

    pub fn with_tool(mut self, tool: Tool) -> Self {
        self.tool = tool;
        self
    }

    pub fn with_current_track(mut self, track: SegmentId) -> Self {
        self.current_track = Some(track);
        self
    }
}

/// What the cursor was attracted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SnapTarget {
    Pad { pad: PadId },
    Via { via: SegmentId },
    Projection { track: SegmentId },
    Join { track: SegmentId },
    Endpoint { track: SegmentId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snap {
    pub point: Point,
    pub target: SnapTarget,
}

/// Round a point to the nearest grid node
pub fn snap_to_grid(point: Point, grid: Size2D) -> Point {
    let round = |v: i64, step: i64| {
        if step <= 0 {
            v
        } else {
            ((v as f64 / step as f64).round() as i64).saturating_mul(step)
        }
    };
    Point::new(round(point.x, grid.width), round(point.y, grid.height))
}

/// Orthogonal projection of `on_grid` onto the segment `start`-`end`,
/// clamped to the segment. `None` for a zero-length segment.
pub fn project(on_grid: Point, start: Point, end: Point) -> Option<Point> {
    if start == end {
        return None;
    }
    let (vx, vy) = start.delta(end);
    let (px, py) = start.delta(on_grid);
    let t = ((px * vx + py * vy) / (vx * vx + vy * vy)).clamp(0.0, 1.0);
    Some(Point::rounded(start.x as f64 + t * vx, start.y as f64 + t * vy))
}

/// [`project`] onto a track's centre line
pub fn project_on_track(on_grid: Point, track: &Segment) -> Option<Point> {
    project(on_grid, track.start, track.end)
}

/// Intersection of the line through `b0`-`b1` with the segment `a0`-`a1`,
/// clamped to segment `a`. `None` when either segment has zero length, when
/// the two are parallel, or when the cross products leave the i128 range.
pub fn join(a0: Point, a1: Point, b0: Point, b1: Point) -> Option<Point> {
    if a0 == a1 || b0 == b1 {
        return None;
    }
    let a = Wide::between(a0, a1);
    let b = Wide::between(b0, b1);
    let d = Wide::between(a0, b0);

    let denom = b.cross(a)?;
    if denom == 0 {
        return None;
    }
    let num = b.cross(d)?;
    let t = (num as f64 / denom as f64).clamp(0.0, 1.0);

    Some(Point::rounded(a0.x as f64 + t * a.x as f64, a0.y as f64 + t * a.y as f64))
}

/// Exact difference of two points
#[derive(Debug, Clone, Copy)]
struct Wide {
    x: i128,
    y: i128,
}

impl Wide {
    fn between(from: Point, to: Point) -> Self {
        Self {
            x: i128::from(to.x) - i128::from(from.x),
            y: i128::from(to.y) - i128::from(from.y),
        }
    }

    /// `self.y * other.x - self.x * other.y`, `None` past the i128 range
    fn cross(self, other: Wide) -> Option<i128> {
        self.y.checked_mul(other.x)?.checked_sub(self.x.checked_mul(other.y)?)
    }
}

/// Decide where the cursor should snap, if anywhere.
pub fn magnetize(board: &Board, ctx: &SnapContext, settings: &MagneticSettings) -> Option<Snap> {
    if ctx.moving_via {
        return None;
    }

    let store = &board.store;
    let check_net = settings.pads != MagneticMode::CaptureAlways && settings.drc_on;
    let in_track_tool = ctx.tool == Tool::Track;
    let applies = |mode: MagneticMode| match mode {
        MagneticMode::CaptureAlways => true,
        MagneticMode::CaptureInTrackTool => in_track_tool,
        MagneticMode::NoEffect => false,
    };
    let do_pad = applies(settings.pads);
    let do_track = applies(settings.tracks);

    let mut current_id = ctx.current_track.filter(|id| store.contains(*id));
    let current_net = current_id.and_then(|id| store.get(id)).map(|s| s.net);
    let same_net = |net: u32| !check_net || current_net.map_or(true, |n| n == net);

    if do_pad {
        let mask = LayerMask::from_layer(ctx.active_layer);
        if let Some(pad_id) = board.pad_hit(ctx.cursor, mask) {
            let pad = board.pad(pad_id)?;
            if !same_net(pad.net) {
                return None;
            }
            return Some(Snap {
                point: pad.position,
                target: SnapTarget::Pad { pad: pad_id },
            });
        }
    }

    if !do_track {
        return None;
    }

    let via_hit = store.iter().find(|(id, s)| {
        s.is_via()
            && !s.deleted
            && Some(*id) != current_id
            && s.is_on_layer(ctx.active_layer)
            && s.start.distance(ctx.cursor) <= s.width as f64 / 2.0
            && same_net(s.net)
    });
    if let Some((via_id, via)) = via_hit {
        return Some(Snap {
            point: via.start,
            target: SnapTarget::Via { via: via_id },
        });
    }

    let Some(mut current) = current_id.and_then(|id| store.get(id)) else {
        let track_id = locate_track_hit(store, ctx.cursor, ctx.active_layer)?;
        let track = store.get(track_id)?;
        return project_on_track(ctx.on_grid, track).map(|point| Snap {
            point,
            target: SnapTarget::Projection { track: track_id },
        });
    };

    // the last leg of a two-segment build is ignored while shorter than a grid step
    if settings.two_segment_build && within_grid(current.start, current.end, ctx.grid) {
        if let Some((prev_id, prev)) = current_id
            .and_then(|id| store.prev(id))
            .and_then(|id| store.get(id).map(|s| (id, s)))
        {
            if prev.is_track() {
                current = prev;
                current_id = Some(prev_id);
            }
        }
    }

    for (track_id, track) in store.iter() {
        if !track.is_track() || track.deleted || Some(track_id) == current_id {
            continue;
        }
        if !same_net(track.net) || !board.is_layer_visible(track.layer()) {
            continue;
        }
        if !track.is_on_layer(ctx.active_layer) || !track.hit_test(ctx.cursor) {
            continue;
        }

        if let Some(point) = join(track.start, track.end, current.start, current.end) {
            return Some(Snap {
                point,
                target: SnapTarget::Join { track: track_id },
            });
        }

        if in_track_tool {
            let reach = ctx.grid.width as f64;
            for end in [track.start, track.end] {
                if ctx.cursor.distance(end) < reach {
                    return Some(Snap {
                        point: end,
                        target: SnapTarget::Endpoint { track: track_id },
                    });
                }
            }
        }
    }

    None
}

fn within_grid(start: Point, end: Point, grid: Size2D) -> bool {
    let (dx, dy) = (start.x.abs_diff(end.x), start.y.abs_diff(end.y));
    i128::from(dx) < i128::from(grid.width) && i128::from(dy) < i128::from(grid.height)
}
