//! Track Marker
//!
//! Delimits the logical track containing a reference segment:
//! 1. Walk the chain from both ends of the reference (or outward from a via)
//! 2. Decide which of the vias met on the way belong to this track
//! 3. Report the marked segments in store order, with count, length and
//!    die length, optionally relinking the store so they are contiguous
//!
//! All traversal state lives in a [`VisitedSet`] owned by the call, so
//! marking never leaves anything behind on the board.

use serde::{Deserialize, Serialize};

use super::locate::{segments_at_point, ItemFilter, VisitedSet};
use super::walker::{chain_marked_segments, ChainEnd, ChainWalk};
use crate::board::{Board, Segment, SegmentId};
use crate::geometry::Point;
use crate::layer::LayerMask;

/// Number of tracks at a via that makes the via a track of its own
const VIA_JUNCTION_DEGREE: usize = 3;

/// What `mark_trace` should do besides marking
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkOptions {
    /// Relink the store so the marked segments follow the first one
    pub reorder: bool,
    pub with_length: bool,
    pub with_die_length: bool,
}

impl MarkOptions {
    /// Length and die length, no reordering
    pub fn measure() -> Self {
        Self {
            reorder: false,
            with_length: true,
            with_die_length: true,
        }
    }

    pub fn reorder(mut self, reorder: bool) -> Self {
        self.reorder = reorder;
        self
    }
}

/// One end of a marked track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackEnd {
    pub point: Point,
    pub end: ChainEnd,
}

/// A logical track
#[derive(Debug, Clone, PartialEq)]
pub struct MarkedTrack {
    pub reference: SegmentId,
    /// First marked segment in store order
    pub first: SegmentId,
    /// Marked tracks and vias, in store order (before any reordering)
    pub segments: Vec<SegmentId>,
    pub count: usize,
    /// Rounded sum of segment lengths; 0 unless requested
    pub length: i64,
    /// Rounded sum of the die lengths of pads at track ends; 0 unless requested
    pub die_length: i64,
    pub ends: Vec<TrackEnd>,
}

impl MarkedTrack {
    pub fn contains(&self, id: SegmentId) -> bool {
        self.segments.contains(&id)
    }
}

/// Mark the track containing `reference`.
///
/// Returns `None` when the reference is not in the store or is deleted.
pub fn mark_trace(board: &mut Board, reference: SegmentId, options: MarkOptions) -> Option<MarkedTrack> {
    let track = measure_track(board, reference, options)?;
    if options.reorder {
        if let Some((first, rest)) = track.segments.split_first() {
            board.store.relink_after(*first, rest);
        }
    }
    Some(track)
}

/// Read-only marking with every statistic
pub fn trace_track(board: &Board, reference: SegmentId) -> Option<MarkedTrack> {
    measure_track(board, reference, MarkOptions::measure())
}

/// Unlink every segment of the track containing `reference`.
///
/// Returns the removed segments in their former store order.
pub fn delete_track(board: &mut Board, reference: SegmentId) -> Option<Vec<Segment>> {
    let track = measure_track(board, reference, MarkOptions::default())?;
    let removed: Vec<Segment> = track
        .segments
        .iter()
        .filter_map(|id| board.store.remove(*id))
        .collect();
    tracing::info!("Deleted track of {} segments", removed.len());
    Some(removed)
}

fn measure_track(board: &Board, reference: SegmentId, options: MarkOptions) -> Option<MarkedTrack> {
    let (visited, ends) = collect_track(board, reference)?;
    let store = &board.store;

    let mut segments: Vec<(usize, SegmentId)> = visited
        .iter()
        .filter_map(|id| store.position(*id).map(|pos| (pos, *id)))
        .collect();
    segments.sort_unstable();
    let segments: Vec<SegmentId> = segments.into_iter().map(|(_, id)| id).collect();
    let first = *segments.first()?;

    let length: f64 = if options.with_length {
        segments.iter().filter_map(|id| store.get(*id)).map(Segment::length).sum()
    } else {
        0.0
    };
    let die_length: f64 = if options.with_die_length {
        ends.iter()
            .filter_map(|e| match e.end {
                ChainEnd::Pad { pad } => board.pad(pad),
                _ => None,
            })
            .map(|pad| pad.die_length as f64)
            .sum()
    } else {
        0.0
    };

    let track = MarkedTrack {
        reference,
        first,
        count: segments.len(),
        segments,
        length: length.round() as i64,
        die_length: die_length.round() as i64,
        ends,
    };
    tracing::debug!(
        "Marked track from {}: {} segments, first {}, length {}",
        reference,
        track.count,
        track.first,
        track.length
    );
    Some(track)
}

fn collect_track(board: &Board, reference: SegmentId) -> Option<(VisitedSet, Vec<TrackEnd>)> {
    let store = &board.store;
    let segment = store.get(reference)?;
    if segment.deleted {
        return None;
    }

    let mut visited = VisitedSet::from([reference]);
    let mut walks: Vec<ChainWalk> = Vec::new();
    let mut ends = Vec::new();

    if segment.is_via() {
        let at = segment.start;
        let connected: Vec<SegmentId> = segments_at_point(store, at, segment.layer_mask(), &visited, ItemFilter::TracksOnly)
            .into_iter()
            .take(VIA_JUNCTION_DEGREE)
            .collect();

        if connected.len() >= VIA_JUNCTION_DEGREE {
            ends.push(TrackEnd {
                point: at,
                end: ChainEnd::Junction {
                    branches: connected.len(),
                },
            });
            return Some((visited, ends));
        }
        if connected.len() < 2 {
            ends.push(TrackEnd { point: at, end: ChainEnd::DeadEnd });
        }

        // walk out of the via once per layer, on that layer alone
        let mut masks: Vec<LayerMask> = Vec::new();
        for mask in connected.iter().filter_map(|id| store.get(*id)).map(Segment::layer_mask) {
            if !masks.contains(&mask) {
                masks.push(mask);
                walks.push(chain_marked_segments(board, at, mask, &mut visited));
            }
        }
    } else {
        let mask = segment.layer_mask();
        walks.push(chain_marked_segments(board, segment.start, mask, &mut visited));
        walks.push(chain_marked_segments(board, segment.end, mask, &mut visited));
    }

    ends.extend(walks.iter().map(|w| TrackEnd {
        point: w.end_point,
        end: w.end,
    }));

    let candidates: Vec<SegmentId> = walks
        .iter()
        .flat_map(|w| w.candidate_vias.iter().copied())
        .collect();
    resolve_vias(board, reference, &candidates, &mut visited);

    Some((visited, ends))
}

/// Decide which candidate vias belong to the track, latest found first.
///
/// A via is kept when no other unmarked track reaches it. When others do,
/// it stays only if they all share one layer: those tracks stay connected
/// without the via, so removing it cannot split anything. Tracks on
/// different layers depend on the via, which then belongs to their track.
fn resolve_vias(board: &Board, reference: SegmentId, candidates: &[SegmentId], visited: &mut VisitedSet) {
    let store = &board.store;
    let mut decided = VisitedSet::new();

    for via_id in candidates.iter().rev().copied() {
        if via_id == reference || !decided.insert(via_id) {
            continue;
        }
        let Some(via) = store.get(via_id) else { continue };
        visited.insert(via_id);

        let others = segments_at_point(store, via.start, via.layer_mask(), visited, ItemFilter::TracksOnly);
        let Some((first, rest)) = others.split_first() else {
            continue;
        };
        let Some(layer) = store.get(*first).map(Segment::layer) else {
            continue;
        };
        if rest
            .iter()
            .filter_map(|id| store.get(*id))
            .any(|s| s.layer() != layer)
        {
            tracing::debug!("Via {} belongs to another track", via_id);
            visited.remove(&via_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Pad, PadId};
    use crate::geometry::Size2D;
    use crate::layer::{LayerId, LayerMask};

    fn add_track(board: &mut Board, name: &str, start: (i64, i64), end: (i64, i64), layer: u8) -> SegmentId {
        board.store.push(Segment::track(
            name,
            Point::new(start.0, start.1),
            Point::new(end.0, end.1),
            2,
            LayerId(layer),
            1,
        ))
    }

    fn add_via(board: &mut Board, name: &str, at: (i64, i64)) -> SegmentId {
        board
            .store
            .push(Segment::via(name, Point::new(at.0, at.1), 4, LayerId(0), LayerId(1), 1))
    }

    #[test]
    fn test_marks_straight_run() {
        let mut board = Board::new("t", 2);
        let a = add_track(&mut board, "a", (0, 0), (10, 0), 0);
        let b = add_track(&mut board, "b", (10, 0), (20, 0), 0);
        let c = add_track(&mut board, "c", (20, 0), (30, 0), 0);

        let track = trace_track(&board, b).unwrap();
        assert_eq!(track.segments, vec![a, b, c]);
        assert_eq!(track.first, a);
        assert_eq!(track.count, 3);
        assert_eq!(track.length, 30);
        assert_eq!(track.ends.len(), 2);
    }

    #[test]
    fn test_unrequested_stats_are_zero() {
        let mut board = Board::new("t", 2);
        let a = add_track(&mut board, "a", (0, 0), (10, 0), 0);
        let track = mark_trace(&mut board, a, MarkOptions::default()).unwrap();
        assert_eq!(track.count, 1);
        assert_eq!(track.length, 0);
        assert_eq!(track.die_length, 0);
    }

    #[test]
    fn test_unknown_or_deleted_reference() {
        let mut board = Board::new("t", 2);
        let a = add_track(&mut board, "a", (0, 0), (10, 0), 0);
        assert!(trace_track(&board, SegmentId(99)).is_none());
        board.store.mark_deleted(a, true);
        assert!(trace_track(&board, a).is_none());
    }

    #[test]
    fn test_via_reference_with_two_tracks() {
        let mut board = Board::new("t", 2);
        let a = add_track(&mut board, "a", (0, 5), (5, 5), 0);
        let v = add_via(&mut board, "v", (5, 5));
        let b = add_track(&mut board, "b", (5, 5), (10, 5), 1);
        let c = add_track(&mut board, "c", (10, 5), (10, 20), 1);

        let track = trace_track(&board, v).unwrap();
        assert_eq!(track.segments, vec![a, v, b, c]);
        assert_eq!(track.length, 25);
        let ends: Vec<Point> = track.ends.iter().map(|e| e.point).collect();
        assert_eq!(ends, vec![Point::new(0, 5), Point::new(10, 20)]);
    }

    #[test]
    fn test_via_reference_between_same_layer_tracks() {
        let mut board = Board::new("t", 2);
        add_track(&mut board, "a", (0, 5), (5, 5), 0);
        let v = add_via(&mut board, "v", (5, 5));
        add_track(&mut board, "b", (5, 5), (10, 5), 0);

        let track = trace_track(&board, v).unwrap();
        assert_eq!(track.segments, vec![v]);
        assert_eq!(track.length, 0);
        assert_eq!(
            track.ends,
            vec![TrackEnd {
                point: Point::new(5, 5),
                end: ChainEnd::Junction { branches: 2 },
            }]
        );
    }

    #[test]
    fn test_via_reference_with_one_track_has_two_ends() {
        let mut board = Board::new("t", 2);
        let a = add_track(&mut board, "a", (0, 5), (5, 5), 0);
        let v = add_via(&mut board, "v", (5, 5));

        let track = trace_track(&board, v).unwrap();
        assert_eq!(track.segments, vec![a, v]);
        assert_eq!(
            track.ends,
            vec![
                TrackEnd { point: Point::new(5, 5), end: ChainEnd::DeadEnd },
                TrackEnd { point: Point::new(0, 5), end: ChainEnd::DeadEnd },
            ]
        );
    }

    #[test]
    fn test_via_reference_at_junction_is_alone() {
        let mut board = Board::new("t", 2);
        add_track(&mut board, "a", (0, 5), (5, 5), 0);
        let v = add_via(&mut board, "v", (5, 5));
        add_track(&mut board, "b", (5, 5), (10, 5), 1);
        add_track(&mut board, "c", (5, 5), (5, 10), 1);

        let track = trace_track(&board, v).unwrap();
        assert_eq!(track.segments, vec![v]);
        assert_eq!(track.count, 1);
        assert!(matches!(track.ends[0].end, ChainEnd::Junction { branches: 3 }));
    }

    #[test]
    fn test_dangling_via_joins_track() {
        let mut board = Board::new("t", 2);
        let a = add_track(&mut board, "a", (0, 5), (5, 5), 0);
        let v = add_via(&mut board, "v", (5, 5));

        let track = trace_track(&board, a).unwrap();
        assert_eq!(track.segments, vec![a, v]);
    }

    #[test]
    fn test_via_serving_other_layers_is_excluded() {
        let mut board = Board::new("t", 2);
        let a = add_track(&mut board, "a", (0, 5), (5, 5), 0);
        let v = add_via(&mut board, "v", (5, 5));
        let b = add_track(&mut board, "b", (5, 5), (10, 5), 1);
        let c = add_track(&mut board, "c", (5, 5), (5, 10), 0);

        let track = trace_track(&board, a).unwrap();
        assert_eq!(track.segments, vec![a]);
        assert!(!track.contains(v) && !track.contains(b) && !track.contains(c));
    }

    #[test]
    fn test_die_length_counts_both_ends() {
        let mut board = Board::new("t", 2);
        let front = LayerMask::from_layer(LayerId(0));
        board.add_pad(Pad::new("U1", "1", Point::new(0, 0), Size2D::square(4), front, 1).with_die_length(120));
        board.add_pad(Pad::new("U2", "7", Point::new(20, 0), Size2D::square(4), front, 1).with_die_length(35));
        let a = add_track(&mut board, "a", (0, 0), (10, 0), 0);
        add_track(&mut board, "b", (10, 0), (20, 0), 0);

        let track = trace_track(&board, a).unwrap();
        assert_eq!(track.count, 2);
        assert_eq!(track.die_length, 155);
        assert!(track.ends.iter().all(|e| matches!(e.end, ChainEnd::Pad { .. })));
    }

    #[test]
    fn test_die_length_of_pad_reached_off_anchor() {
        let mut board = Board::new("t", 2);
        let front = LayerMask::from_layer(LayerId(0));
        board.add_pad(Pad::new("U1", "1", Point::new(0, 1), Size2D::square(4), front, 1).with_die_length(50));
        let a = add_track(&mut board, "a", (0, 0), (10, 0), 0);
        let b = add_track(&mut board, "b", (10, 0), (20, 0), 0);

        let track = trace_track(&board, b).unwrap();
        assert_eq!(track.segments, vec![a, b]);
        assert_eq!(track.die_length, 50);
        assert_eq!(track.ends[0].end, ChainEnd::Pad { pad: PadId(0) });
    }

    #[test]
    fn test_reorder_makes_track_contiguous() {
        let mut board = Board::new("t", 2);
        let a = add_track(&mut board, "a", (0, 0), (10, 0), 0);
        let x = add_track(&mut board, "x", (100, 0), (110, 0), 0);
        let b = add_track(&mut board, "b", (10, 0), (20, 0), 0);
        let y = add_track(&mut board, "y", (200, 0), (210, 0), 0);
        let c = add_track(&mut board, "c", (20, 0), (30, 0), 0);

        let track = mark_trace(&mut board, c, MarkOptions::measure().reorder(true)).unwrap();
        assert_eq!(track.first, a);
        assert_eq!(track.length, 30);
        let order: Vec<SegmentId> = board.store.ids().collect();
        assert_eq!(order, vec![a, b, c, x, y]);
    }

    #[test]
    fn test_delete_track_unlinks_segments() {
        let mut board = Board::new("t", 2);
        add_track(&mut board, "a", (0, 0), (10, 0), 0);
        let b = add_track(&mut board, "b", (10, 0), (20, 0), 0);
        let d = add_track(&mut board, "d", (10, 0), (10, 10), 0);
        let e = add_track(&mut board, "e", (50, 0), (60, 0), 0);

        let removed = delete_track(&mut board, e).unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].uuid, "e");
        assert_eq!(board.store.len(), 3);
        assert!(board.store.contains(b) && board.store.contains(d));
    }
}
