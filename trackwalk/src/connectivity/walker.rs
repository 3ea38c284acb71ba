//! Chain Walker
//!
//! Follows a chain of uniquely connected track segments from a starting
//! point. Each step looks at the current point:
//! - a pad covering the point ends the chain
//! - a via widens the layer mask to its span (the walk may change layers)
//! - exactly one unvisited track continues the chain
//! - no track is a dead end, two or more is a junction
//!
//! Vias met on the way are only reported as candidates. Whether a via
//! belongs to the track is decided by the marker once both directions
//! have been walked.

use serde::{Deserialize, Serialize};

use super::locate::{find_via_at_point, segments_at_point, ItemFilter, VisitedSet};
use crate::board::{Board, PadId, SegmentId};
use crate::geometry::Point;
use crate::layer::LayerMask;

/// Why a walk stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChainEnd {
    /// A pad sits on the end point
    Pad { pad: PadId },
    /// Nothing else connects here
    DeadEnd,
    /// Several unvisited tracks meet here
    Junction { branches: usize },
}

/// Result of walking in one direction
#[derive(Debug, Clone, PartialEq)]
pub struct ChainWalk {
    /// Tracks added to the chain, in walk order
    pub segments: Vec<SegmentId>,
    /// Vias found at points the walk passed through, in discovery order
    pub candidate_vias: Vec<SegmentId>,
    pub end: ChainEnd,
    pub end_point: Point,
}

/// Walk from `start` on `mask`, claiming every track added to the chain in
/// `visited`.
pub fn chain_marked_segments(
    board: &Board,
    start: Point,
    mask: LayerMask,
    visited: &mut VisitedSet,
) -> ChainWalk {
    let store = &board.store;
    let mut position = start;
    let mut mask = mask;
    let mut segments = Vec::new();
    let mut candidate_vias = Vec::new();

    let end = loop {
        if let Some(pad) = board.pad_hit(position, mask) {
            break ChainEnd::Pad { pad };
        }

        if let Some(via_id) = find_via_at_point(store, position, mask, visited) {
            if let Some(via) = store.get(via_id) {
                mask = via.layer_mask();
            }
            if !candidate_vias.contains(&via_id) {
                candidate_vias.push(via_id);
            }
        }

        let tracks = segments_at_point(store, position, mask, visited, ItemFilter::TracksOnly);
        let next = match tracks.as_slice() {
            [] => break ChainEnd::DeadEnd,
            [only] => *only,
            many => break ChainEnd::Junction { branches: many.len() },
        };

        let Some(segment) = store.get(next) else {
            break ChainEnd::DeadEnd;
        };
        visited.insert(next);
        segments.push(next);
        position = segment.other_end(position);
        mask = segment.layer_mask();
    };

    tracing::trace!(
        "Chain from {} stopped at {} ({:?}) after {} segments",
        start,
        position,
        end,
        segments.len()
    );

    ChainWalk {
        segments,
        candidate_vias,
        end,
        end_point: position,
    }
}
