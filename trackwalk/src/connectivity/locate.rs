//! Endpoint Locator
//!
//! Finds segments whose start or end coincides exactly with a point on a
//! given layer mask. Candidates come from the store's endpoint index and are
//! returned in store order, so results equal a linear scan of the store.

use std::collections::HashSet;

use crate::board::{Segment, SegmentId, SegmentStore};
use crate::geometry::Point;
use crate::layer::{LayerId, LayerMask};

/// Segments already claimed by a traversal
pub type VisitedSet = HashSet<SegmentId>;

/// Default neighbourhood scanned around a reference segment
pub const DEFAULT_NEIGHBOR_WINDOW: usize = 50;

/// Which segment kinds a lookup accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemFilter {
    Any,
    TracksOnly,
    ViasOnly,
}

impl ItemFilter {
    fn accepts(self, segment: &Segment) -> bool {
        match self {
            ItemFilter::Any => true,
            ItemFilter::TracksOnly => segment.is_track(),
            ItemFilter::ViasOnly => segment.is_via(),
        }
    }
}

/// Which end of a reference segment to search from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndPoint {
    Start,
    End,
}

/// Store-order range `[from, until)`; `None` bounds are open
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanRange {
    pub from: Option<SegmentId>,
    pub until: Option<SegmentId>,
}

impl ScanRange {
    pub fn all() -> Self {
        Self::default()
    }

    /// Positions covered by this range; `None` if a bound is not in the store
    fn bounds(self, store: &SegmentStore) -> Option<(usize, usize)> {
        let lo = match self.from {
            Some(id) => store.position(id)?,
            None => 0,
        };
        let hi = match self.until {
            Some(id) => store.position(id)?,
            None => store.len(),
        };
        Some((lo, hi))
    }
}

fn matches(segment: &Segment, mask: LayerMask, filter: ItemFilter) -> bool {
    !segment.deleted && filter.accepts(segment) && segment.layer_mask().intersects(mask)
}

/// Every live, unvisited segment touching `position` on `mask`, with its
/// store position, sorted by store order
fn candidates(
    store: &SegmentStore,
    position: Point,
    mask: LayerMask,
    visited: &VisitedSet,
    filter: ItemFilter,
) -> Vec<(usize, SegmentId)> {
    let mut found: Vec<(usize, SegmentId)> = store
        .at_point(position)
        .iter()
        .filter(|id| !visited.contains(*id))
        .filter_map(|id| {
            let segment = store.get(*id)?;
            if matches(segment, mask, filter) {
                store.position(*id).map(|pos| (pos, *id))
            } else {
                None
            }
        })
        .collect();
    found.sort_unstable();
    found
}

/// First segment in store order within `range` that ends at `position`
/// on a layer of `mask`, skipping visited and deleted segments
pub fn find_segment_at_point(
    store: &SegmentStore,
    range: ScanRange,
    position: Point,
    mask: LayerMask,
    visited: &VisitedSet,
    filter: ItemFilter,
) -> Option<SegmentId> {
    let (lo, hi) = range.bounds(store)?;
    candidates(store, position, mask, visited, filter)
        .into_iter()
        .find(|(pos, _)| *pos >= lo && *pos < hi)
        .map(|(_, id)| id)
}

/// All matches at `position`, in store order
pub fn segments_at_point(
    store: &SegmentStore,
    position: Point,
    mask: LayerMask,
    visited: &VisitedSet,
    filter: ItemFilter,
) -> Vec<SegmentId> {
    candidates(store, position, mask, visited, filter)
        .into_iter()
        .map(|(_, id)| id)
        .collect()
}

/// Unvisited via anchored at `position` on a layer of `mask`
pub fn find_via_at_point(
    store: &SegmentStore,
    position: Point,
    mask: LayerMask,
    visited: &VisitedSet,
) -> Option<SegmentId> {
    find_segment_at_point(store, ScanRange::all(), position, mask, visited, ItemFilter::ViasOnly)
}

/// Segment connected to one end of `reference`.
///
/// Searches `window` store positions before the reference (nearest
/// first), then `window` positions after it, and only then the whole
/// store. Nets are usually stored contiguously, so the neighbourhood
/// nearly always holds the answer.
pub fn find_connected_segment(
    store: &SegmentStore,
    reference: SegmentId,
    end: EndPoint,
    visited: &VisitedSet,
    window: usize,
) -> Option<SegmentId> {
    let segment = store.get(reference)?;
    let ref_pos = store.position(reference)?;
    let position = match end {
        EndPoint::Start => segment.start,
        EndPoint::End => segment.end,
    };
    let mask = segment.layer_mask();

    let found: Vec<(usize, SegmentId)> = candidates(store, position, mask, visited, ItemFilter::Any)
        .into_iter()
        .filter(|(_, id)| *id != reference)
        .collect();

    let before = found
        .iter()
        .rev()
        .find(|(pos, _)| *pos < ref_pos && ref_pos - pos <= window);
    if let Some((_, id)) = before {
        return Some(*id);
    }

    let after = found
        .iter()
        .find(|(pos, _)| *pos > ref_pos && pos - ref_pos <= window);
    if let Some((_, id)) = after {
        return Some(*id);
    }

    found.first().map(|(_, id)| *id)
}

/// Via whose drilled disc covers `position` and whose span includes `layer`
pub fn locate_via_area(store: &SegmentStore, position: Point, layer: LayerId) -> Option<SegmentId> {
    store
        .iter()
        .find(|(_, s)| {
            s.is_via()
                && !s.deleted
                && s.is_on_layer(layer)
                && s.start.distance(position) <= s.width as f64 / 2.0
        })
        .map(|(id, _)| id)
}

/// First track whose copper covers `position` on `layer`
pub fn locate_track_hit(store: &SegmentStore, position: Point, layer: LayerId) -> Option<SegmentId> {
    store
        .iter()
        .find(|(_, s)| s.is_track() && !s.deleted && s.is_on_layer(layer) && s.hit_test(position))
        .map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(name: &str, start: (i64, i64), end: (i64, i64), layer: u8) -> Segment {
        Segment::track(name, Point::new(start.0, start.1), Point::new(end.0, end.1), 2, LayerId(layer), 1)
    }

    fn front() -> LayerMask {
        LayerMask::from_layer(LayerId(0))
    }

    #[test]
    fn test_first_match_in_store_order() {
        let mut store = SegmentStore::new();
        let a = store.push(track("a", (0, 0), (10, 0), 0));
        let b = store.push(track("b", (10, 0), (20, 0), 0));
        let visited = VisitedSet::new();

        let hit = find_segment_at_point(&store, ScanRange::all(), Point::new(10, 0), front(), &visited, ItemFilter::Any);
        assert_eq!(hit, Some(a));

        let from_b = ScanRange { from: Some(b), until: None };
        let hit = find_segment_at_point(&store, from_b, Point::new(10, 0), front(), &visited, ItemFilter::Any);
        assert_eq!(hit, Some(b));

        let until_b = ScanRange { from: None, until: Some(b) };
        let hit = find_segment_at_point(&store, until_b, Point::new(20, 0), front(), &visited, ItemFilter::Any);
        assert_eq!(hit, None);
    }

    #[test]
    fn test_skips_visited_deleted_and_other_layers() {
        let mut store = SegmentStore::new();
        let a = store.push(track("a", (0, 0), (10, 0), 0));
        let b = store.push(track("b", (10, 0), (20, 0), 0));
        let c = store.push(track("c", (10, 0), (10, 10), 1));
        let mut visited = VisitedSet::new();
        visited.insert(a);

        let p = Point::new(10, 0);
        assert_eq!(segments_at_point(&store, p, front(), &visited, ItemFilter::Any), vec![b]);

        store.mark_deleted(b, true);
        assert!(segments_at_point(&store, p, front(), &visited, ItemFilter::Any).is_empty());

        let both = LayerMask::span(LayerId(0), LayerId(1));
        assert_eq!(segments_at_point(&store, p, both, &visited, ItemFilter::Any), vec![c]);
    }

    #[test]
    fn test_no_tolerance_on_endpoints() {
        let mut store = SegmentStore::new();
        store.push(track("a", (0, 0), (10, 0), 0));
        let visited = VisitedSet::new();
        let hit = find_segment_at_point(&store, ScanRange::all(), Point::new(10, 1), front(), &visited, ItemFilter::Any);
        assert!(hit.is_none());
    }

    #[test]
    fn test_via_filter() {
        let mut store = SegmentStore::new();
        store.push(track("a", (0, 5), (5, 5), 0));
        let v = store.push(Segment::via("v", Point::new(5, 5), 4, LayerId(0), LayerId(1), 1));
        let visited = VisitedSet::new();
        assert_eq!(find_via_at_point(&store, Point::new(5, 5), front(), &visited), Some(v));
        let tracks = segments_at_point(&store, Point::new(5, 5), front(), &visited, ItemFilter::TracksOnly);
        assert_eq!(tracks.len(), 1);
    }

    #[test]
    fn test_connected_segment_prefers_neighbourhood() {
        let mut store = SegmentStore::new();
        let far = store.push(track("far", (10, 0), (10, 50), 0));
        for i in 0..5 {
            store.push(track("filler", (1000 + i, 0), (1000 + i, 10), 0));
        }
        let reference = store.push(track("ref", (0, 0), (10, 0), 0));
        let near = store.push(track("near", (10, 0), (20, 0), 0));
        let visited = VisitedSet::new();

        assert_eq!(find_connected_segment(&store, reference, EndPoint::End, &visited, 3), Some(near));
        // a window wide enough to reach backwards finds the earlier one first
        assert_eq!(find_connected_segment(&store, reference, EndPoint::End, &visited, 50), Some(far));
        // nothing in the window at all: full scan fallback
        assert_eq!(find_connected_segment(&store, reference, EndPoint::End, &visited, 0), Some(far));
        assert_eq!(find_connected_segment(&store, reference, EndPoint::Start, &visited, 50), None);
    }

    #[test]
    fn test_area_lookups() {
        let mut store = SegmentStore::new();
        let t = store.push(Segment::track("t", Point::new(0, 0), Point::new(100, 0), 10, LayerId(0), 1));
        let v = store.push(Segment::via("v", Point::new(200, 0), 20, LayerId(0), LayerId(1), 1));
        assert_eq!(locate_track_hit(&store, Point::new(50, 4), LayerId(0)), Some(t));
        assert_eq!(locate_track_hit(&store, Point::new(50, 4), LayerId(1)), None);
        assert_eq!(locate_via_area(&store, Point::new(205, 5), LayerId(1)), Some(v));
        assert_eq!(locate_via_area(&store, Point::new(215, 0), LayerId(1)), None);
    }
}
