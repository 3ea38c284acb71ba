//! Board items: track segments, vias, pads and nets

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::geometry::{distance_to_segment, Point, Size2D};
use crate::layer::{LayerId, LayerMask};

/// Stable identifier of a segment inside a [`SegmentStore`](super::SegmentStore)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentId(pub u32);

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Index of a pad on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PadId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViaType {
    #[default]
    Through,
    BlindBuried,
    Micro,
}

/// What a segment physically is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentKind {
    /// Straight copper conductor on one layer
    Track { layer: LayerId },
    /// Layer-spanning via, anchored at a single point
    Via {
        top: LayerId,
        bottom: LayerId,
        via_type: ViaType,
    },
}

/// Track segment or via
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub uuid: String,
    pub kind: SegmentKind,
    pub start: Point,
    pub end: Point,
    pub width: i64,
    pub net: u32,
    /// Pending deletion; locators skip deleted segments
    pub deleted: bool,
}

impl Segment {
    pub fn track(uuid: impl Into<String>, start: Point, end: Point, width: i64, layer: LayerId, net: u32) -> Self {
        Self {
            uuid: uuid.into(),
            kind: SegmentKind::Track { layer },
            start,
            end,
            width,
            net,
            deleted: false,
        }
    }

    /// A via is a zero-length segment: start and end coincide
    pub fn via(
        uuid: impl Into<String>,
        position: Point,
        diameter: i64,
        top: LayerId,
        bottom: LayerId,
        net: u32,
    ) -> Self {
        Self {
            uuid: uuid.into(),
            kind: SegmentKind::Via {
                top,
                bottom,
                via_type: ViaType::Through,
            },
            start: position,
            end: position,
            width: diameter,
            net,
            deleted: false,
        }
    }

    pub fn with_via_type(mut self, via_type: ViaType) -> Self {
        if let SegmentKind::Via { via_type: t, .. } = &mut self.kind {
            *t = via_type;
        }
        self
    }

    pub fn is_via(&self) -> bool {
        matches!(self.kind, SegmentKind::Via { .. })
    }

    pub fn is_track(&self) -> bool {
        matches!(self.kind, SegmentKind::Track { .. })
    }

    /// Assigned layer of a track, top layer of a via
    pub fn layer(&self) -> LayerId {
        match self.kind {
            SegmentKind::Track { layer } => layer,
            SegmentKind::Via { top, .. } => top,
        }
    }

    /// Occupied layers: one bit for a track, the full span for a via
    pub fn layer_mask(&self) -> LayerMask {
        match self.kind {
            SegmentKind::Track { layer } => LayerMask::from_layer(layer),
            SegmentKind::Via { top, bottom, .. } => LayerMask::span(top, bottom),
        }
    }

    pub fn is_on_layer(&self, layer: LayerId) -> bool {
        self.layer_mask().contains(layer)
    }

    /// Geometric length; zero for a via
    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }

    pub fn touches(&self, point: Point) -> bool {
        self.start == point || self.end == point
    }

    /// Endpoint opposite to `point`
    pub fn other_end(&self, point: Point) -> Point {
        if self.start == point {
            self.end
        } else {
            self.start
        }
    }

    /// Whether `point` lies on the copper of this segment
    pub fn hit_test(&self, point: Point) -> bool {
        let radius = self.width as f64 / 2.0;
        distance_to_segment(point, self.start, self.end) <= radius
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadShape {
    #[default]
    Circle,
    Rect,
    Oval,
}

/// Footprint pad
#[derive(Debug, Clone, PartialEq)]
pub struct Pad {
    pub uuid: String,
    pub reference: String,
    pub number: String,
    pub position: Point,
    pub size: Size2D,
    pub shape: PadShape,
    pub layers: LayerMask,
    pub net: u32,
    /// Trace length embedded in the package between die and pad
    pub die_length: i64,
}

impl Pad {
    pub fn new(reference: impl Into<String>, number: impl Into<String>, position: Point, size: Size2D, layers: LayerMask, net: u32) -> Self {
        Self {
            uuid: uuid::Uuid::new_v4().to_string(),
            reference: reference.into(),
            number: number.into(),
            position,
            size,
            shape: PadShape::Circle,
            layers,
            net,
            die_length: 0,
        }
    }

    pub fn with_shape(mut self, shape: PadShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_die_length(mut self, die_length: i64) -> Self {
        self.die_length = die_length;
        self
    }

    /// `REF.NUMBER`, e.g. `U1.3`
    pub fn label(&self) -> String {
        format!("{}.{}", self.reference, self.number)
    }

    /// Whether `point` falls inside the pad outline (rotation ignored)
    pub fn hit_test(&self, point: Point) -> bool {
        let (dx, dy) = self.position.delta(point);
        let half_w = self.size.width as f64 / 2.0;
        let half_h = self.size.height as f64 / 2.0;
        match self.shape {
            PadShape::Circle => dx.hypot(dy) <= half_w,
            PadShape::Rect => dx.abs() <= half_w && dy.abs() <= half_h,
            PadShape::Oval => {
                // capsule along the long axis
                let radius = half_w.min(half_h);
                let (ax, ay) = if half_w >= half_h {
                    ((dx.abs() - (half_w - radius)).max(0.0), dy)
                } else {
                    (dx, (dy.abs() - (half_h - radius)).max(0.0))
                };
                ax.hypot(ay) <= radius
            }
        }
    }
}

/// Net definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Net {
    pub id: u32,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_via_is_degenerate() {
        let via = Segment::via("v", Point::new(5, 5), 8, LayerId(0), LayerId(1), 1);
        assert_eq!(via.start, via.end);
        assert_eq!(via.length(), 0.0);
        assert_eq!(via.layer_mask().0, 0b11);
    }

    #[test]
    fn test_track_mask_and_other_end() {
        let t = Segment::track("t", Point::new(0, 0), Point::new(3, 4), 2, LayerId(1), 1);
        assert_eq!(t.layer_mask().0, 0b10);
        assert_eq!(t.length(), 5.0);
        assert_eq!(t.other_end(Point::new(0, 0)), Point::new(3, 4));
        assert_eq!(t.other_end(Point::new(3, 4)), Point::new(0, 0));
    }

    #[test]
    fn test_track_hit_test_uses_half_width() {
        let t = Segment::track("t", Point::new(0, 0), Point::new(100, 0), 10, LayerId(0), 1);
        assert!(t.hit_test(Point::new(50, 5)));
        assert!(!t.hit_test(Point::new(50, 6)));
    }

    #[test]
    fn test_pad_hit_tests() {
        let mask = LayerMask::from_layer(LayerId(0));
        let circle = Pad::new("U1", "1", Point::new(0, 0), Size2D::square(10), mask, 1);
        assert!(circle.hit_test(Point::new(3, 4)));
        assert!(!circle.hit_test(Point::new(4, 4)));
        let far = Pad::new("U1", "9", Point::new(i64::MAX, 0), Size2D::square(10), mask, 1);
        assert!(!far.hit_test(Point::new(i64::MIN, 0)));

        let rect = Pad::new("U1", "2", Point::new(0, 0), Size2D::new(10, 4), mask, 1).with_shape(PadShape::Rect);
        assert!(rect.hit_test(Point::new(5, 2)));
        assert!(!rect.hit_test(Point::new(5, 3)));

        let oval = Pad::new("U1", "3", Point::new(0, 0), Size2D::new(20, 10), mask, 1).with_shape(PadShape::Oval);
        assert!(oval.hit_test(Point::new(9, 0)));
        assert!(oval.hit_test(Point::new(5, 5)));
        assert!(!oval.hit_test(Point::new(9, 4)));
    }
}
