//! Magnetic cursor snapping tests

use std::path::PathBuf;
use trackwalk::prelude::*;
use trackwalk::{project, MagneticMode, Size2D, SnapTarget, Tool, TrackWalkCore};

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn two_layer() -> Board {
    trackwalk::parse_board(&fixture_path("two_layer.json")).unwrap()
}

fn track_tool(x: i64, y: i64, grid: i64) -> SnapContext {
    SnapContext::new(Point::new(x, y), LayerId::FRONT, Size2D::square(grid)).with_tool(Tool::Track)
}

/// Board with one existing track and one being drawn
fn drawing_board(current: (Point, Point), current_net: u32) -> (Board, SegmentId, SegmentId) {
    let mut board = Board::new("draw", 2);
    let existing = board.store.push(Segment::track(
        "x",
        Point::new(0, 0),
        Point::new(100, 0),
        20,
        LayerId::FRONT,
        1,
    ));
    let drawn = board
        .store
        .push(Segment::track("cur", current.0, current.1, 20, LayerId::FRONT, current_net));
    (board, existing, drawn)
}

#[test]
fn test_snaps_to_pad_centre() {
    let board = two_layer();
    let snap = magnetize(&board, &track_tool(30, 40, 1), &MagneticSettings::default()).unwrap();
    assert_eq!(snap.point, Point::new(0, 0));
    assert!(matches!(snap.target, SnapTarget::Pad { .. }));
}

#[test]
fn test_select_tool_needs_capture_always() {
    let board = two_layer();
    let ctx = SnapContext::new(Point::new(30, 40), LayerId::FRONT, Size2D::square(1));
    assert!(magnetize(&board, &ctx, &MagneticSettings::default()).is_none());

    let settings = MagneticSettings {
        pads: MagneticMode::CaptureAlways,
        ..MagneticSettings::default()
    };
    let snap = magnetize(&board, &ctx, &settings).unwrap();
    assert_eq!(snap.point, Point::new(0, 0));
}

#[test]
fn test_no_effect_disables_snapping() {
    let board = two_layer();
    let settings = MagneticSettings {
        pads: MagneticMode::NoEffect,
        tracks: MagneticMode::NoEffect,
        ..MagneticSettings::default()
    };
    assert!(magnetize(&board, &track_tool(30, 40, 1), &settings).is_none());
}

#[test]
fn test_snaps_to_via() {
    let board = two_layer();
    let snap = magnetize(&board, &track_tool(1010, 10, 1), &MagneticSettings::default()).unwrap();
    assert_eq!(snap.point, Point::new(1000, 0));
    assert_eq!(
        snap.target,
        SnapTarget::Via {
            via: board.store.find_by_uuid("sig-via").unwrap()
        }
    );
}

#[test]
fn test_projects_onto_hit_track_without_current() {
    let board = two_layer();
    let snap = magnetize(&board, &track_tool(400, 5, 1), &MagneticSettings::default()).unwrap();
    assert_eq!(snap.point, Point::new(400, 0));
    assert_eq!(
        snap.target,
        SnapTarget::Projection {
            track: board.store.find_by_uuid("sig-a").unwrap()
        }
    );
}

#[test]
fn test_joins_current_track_with_hit_track() {
    let (board, existing, drawn) = drawing_board((Point::new(30, 50), Point::new(30, 20)), 1);
    let ctx = track_tool(30, 5, 1).with_current_track(drawn);

    let snap = magnetize(&board, &ctx, &MagneticSettings::default()).unwrap();
    assert_eq!(snap.point, Point::new(30, 0));
    assert_eq!(snap.target, SnapTarget::Join { track: existing });
}

#[test]
fn test_drc_rejects_other_net() {
    let (board, _, drawn) = drawing_board((Point::new(30, 50), Point::new(30, 20)), 2);
    let ctx = track_tool(30, 5, 1).with_current_track(drawn);
    assert!(magnetize(&board, &ctx, &MagneticSettings::default()).is_none());

    let settings = MagneticSettings {
        drc_on: false,
        ..MagneticSettings::default()
    };
    assert!(magnetize(&board, &ctx, &settings).is_some());
}

#[test]
fn test_parallel_track_falls_back_to_endpoint() {
    let (board, existing, drawn) = drawing_board((Point::new(0, 40), Point::new(50, 40)), 1);
    let ctx = track_tool(97, 3, 10).with_current_track(drawn);

    let snap = magnetize(&board, &ctx, &MagneticSettings::default()).unwrap();
    assert_eq!(snap.point, Point::new(100, 0));
    assert_eq!(snap.target, SnapTarget::Endpoint { track: existing });
}

#[test]
fn test_moving_via_never_snaps() {
    let board = two_layer();
    let mut ctx = track_tool(30, 40, 1);
    ctx.moving_via = true;
    assert!(magnetize(&board, &ctx, &MagneticSettings::default()).is_none());
}

#[test]
fn test_projection_stays_on_segment() {
    let start = Point::new(-40, 10);
    let end = Point::new(160, 90);
    for (x, y) in [(-500, -500), (0, 0), (70, 60), (300, 20), (1000, 1000), (60, -200)] {
        let p = project(Point::new(x, y), start, end).unwrap();
        assert!(p.x >= start.x && p.x <= end.x, "x out of range for ({}, {})", x, y);
        assert!(p.y >= start.y && p.y <= end.y, "y out of range for ({}, {})", x, y);
    }
}

#[test]
fn test_core_snap_report() {
    let board = two_layer();
    let report = TrackWalkCore::snap(&board, &track_tool(400, 5, 1), &MagneticSettings::default());
    assert!(report.snapped);
    assert_eq!(report.point, Point::new(400, 0));
    assert_eq!(report.target.as_deref(), Some("projection on sig-a"));

    let miss = TrackWalkCore::snap(&board, &track_tool(5000, 5000, 1), &MagneticSettings::default());
    assert!(!miss.snapped);
    assert_eq!(miss.point, Point::new(5000, 5000));
}
