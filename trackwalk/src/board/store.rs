//! Segment Store
//!
//! Ordered sequence of the board's tracks and vias. Order matters: locators
//! return the first match in store order, and the track marker can relink a
//! traced track so its segments are contiguous.
//!
//! Every segment gets a stable [`SegmentId`] that survives reordering. An
//! endpoint index (`Point -> [SegmentId]`) gives constant-time adjacency
//! lookups instead of linear scans.

use std::collections::{HashMap, HashSet};

use super::items::{Segment, SegmentId};
use crate::geometry::Point;

#[derive(Debug, Clone, Default)]
pub struct SegmentStore {
    segments: HashMap<SegmentId, Segment>,
    order: Vec<SegmentId>,
    positions: HashMap<SegmentId, usize>,
    endpoints: HashMap<Point, Vec<SegmentId>>,
    next_id: u32,
}

impl SegmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.get(&id)
    }

    pub fn contains(&self, id: SegmentId) -> bool {
        self.segments.contains_key(&id)
    }

    /// Append a segment at the end of the store
    pub fn push(&mut self, segment: Segment) -> SegmentId {
        let pos = self.order.len();
        self.insert_at(pos, segment)
    }

    /// Insert a segment immediately after `anchor`
    pub fn insert_after(&mut self, anchor: SegmentId, segment: Segment) -> Option<SegmentId> {
        let pos = self.position(anchor)?;
        Some(self.insert_at(pos + 1, segment))
    }

    /// Insert a segment immediately before `anchor`
    pub fn insert_before(&mut self, anchor: SegmentId, segment: Segment) -> Option<SegmentId> {
        let pos = self.position(anchor)?;
        Some(self.insert_at(pos, segment))
    }

    fn insert_at(&mut self, pos: usize, segment: Segment) -> SegmentId {
        let id = SegmentId(self.next_id);
        self.next_id += 1;

        self.index_endpoints(id, &segment);
        self.segments.insert(id, segment);
        self.order.insert(pos, id);
        self.reindex_from(pos);
        id
    }

    /// Unlink a segment from the store and hand it back
    pub fn remove(&mut self, id: SegmentId) -> Option<Segment> {
        let pos = self.position(id)?;
        let segment = self.segments.remove(&id)?;
        self.order.remove(pos);
        self.positions.remove(&id);
        self.unindex_endpoints(id, &segment);
        self.reindex_from(pos);
        Some(segment)
    }

    /// Flag a segment as pending deletion. Returns false for unknown ids.
    pub fn mark_deleted(&mut self, id: SegmentId, deleted: bool) -> bool {
        match self.segments.get_mut(&id) {
            Some(segment) => {
                segment.deleted = deleted;
                true
            }
            None => false,
        }
    }

    /// Position of a segment in store order
    pub fn position(&self, id: SegmentId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    pub fn id_at(&self, pos: usize) -> Option<SegmentId> {
        self.order.get(pos).copied()
    }

    pub fn first(&self) -> Option<SegmentId> {
        self.order.first().copied()
    }

    pub fn next(&self, id: SegmentId) -> Option<SegmentId> {
        self.position(id).and_then(|pos| self.id_at(pos + 1))
    }

    pub fn prev(&self, id: SegmentId) -> Option<SegmentId> {
        self.position(id)
            .and_then(|pos| pos.checked_sub(1))
            .and_then(|pos| self.id_at(pos))
    }

    /// Segment ids in store order
    pub fn ids(&self) -> impl Iterator<Item = SegmentId> + '_ {
        self.order.iter().copied()
    }

    /// Segments in store order
    pub fn iter(&self) -> impl Iterator<Item = (SegmentId, &Segment)> + '_ {
        self.order
            .iter()
            .filter_map(move |id| self.segments.get(id).map(|s| (*id, s)))
    }

    /// Every segment with an endpoint exactly at `point`, in no particular order
    pub fn at_point(&self, point: Point) -> &[SegmentId] {
        self.endpoints
            .get(&point)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn find_by_uuid(&self, uuid: &str) -> Option<SegmentId> {
        self.iter().find(|(_, s)| s.uuid == uuid).map(|(id, _)| id)
    }

    /// Relink `moved` so those segments directly follow `first`, in the
    /// given order. Ids that are unknown or equal to `first` are ignored.
    pub fn relink_after(&mut self, first: SegmentId, moved: &[SegmentId]) -> bool {
        if !self.contains(first) {
            return false;
        }
        let moved: Vec<SegmentId> = moved
            .iter()
            .copied()
            .filter(|id| *id != first && self.contains(*id))
            .collect();
        let moving: HashSet<SegmentId> = moved.iter().copied().collect();

        self.order.retain(|id| !moving.contains(id));
        let anchor = match self.order.iter().position(|id| *id == first) {
            Some(pos) => pos,
            None => return false,
        };
        self.order.splice(anchor + 1..anchor + 1, moved);
        self.reindex_from(0);
        true
    }

    fn reindex_from(&mut self, start: usize) {
        for (pos, id) in self.order.iter().enumerate().skip(start) {
            self.positions.insert(*id, pos);
        }
    }

    fn index_endpoints(&mut self, id: SegmentId, segment: &Segment) {
        self.endpoints.entry(segment.start).or_default().push(id);
        if segment.end != segment.start {
            self.endpoints.entry(segment.end).or_default().push(id);
        }
    }

    fn unindex_endpoints(&mut self, id: SegmentId, segment: &Segment) {
        for point in [segment.start, segment.end] {
            if let Some(ids) = self.endpoints.get_mut(&point) {
                ids.retain(|other| *other != id);
                if ids.is_empty() {
                    self.endpoints.remove(&point);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::LayerId;

    fn track(name: &str, x0: i64, x1: i64) -> Segment {
        Segment::track(name, Point::new(x0, 0), Point::new(x1, 0), 1, LayerId(0), 1)
    }

    fn names(store: &SegmentStore) -> Vec<String> {
        store.iter().map(|(_, s)| s.uuid.clone()).collect()
    }

    #[test]
    fn test_insert_before_and_after() {
        let mut store = SegmentStore::new();
        let a = store.push(track("a", 0, 10));
        let c = store.push(track("c", 20, 30));
        store.insert_after(a, track("b", 10, 20)).unwrap();
        store.insert_before(a, track("z", -10, 0)).unwrap();
        assert_eq!(names(&store), vec!["z", "a", "b", "c"]);
        assert_eq!(store.position(c), Some(3));
        assert_eq!(store.prev(a).map(|id| store.get(id).unwrap().uuid.clone()), Some("z".to_string()));
    }

    #[test]
    fn test_remove_updates_index_and_positions() {
        let mut store = SegmentStore::new();
        let a = store.push(track("a", 0, 10));
        let b = store.push(track("b", 10, 20));
        assert_eq!(store.at_point(Point::new(10, 0)).len(), 2);

        let removed = store.remove(a).unwrap();
        assert_eq!(removed.uuid, "a");
        assert_eq!(store.at_point(Point::new(10, 0)), &[b]);
        assert!(store.at_point(Point::new(0, 0)).is_empty());
        assert_eq!(store.position(b), Some(0));
        assert!(store.remove(a).is_none());
    }

    #[test]
    fn test_relink_after_keeps_relative_order() {
        let mut store = SegmentStore::new();
        let ids: Vec<SegmentId> = ["a", "b", "c", "d", "e"]
            .iter()
            .enumerate()
            .map(|(i, n)| store.push(track(n, i as i64 * 10, i as i64 * 10 + 10)))
            .collect();

        assert!(store.relink_after(ids[1], &[ids[3], ids[4]]));
        assert_eq!(names(&store), vec!["a", "b", "d", "e", "c"]);
        assert_eq!(store.position(ids[2]), Some(4));
        assert_eq!(store.next(ids[1]), Some(ids[3]));
    }

    #[test]
    fn test_via_indexed_once() {
        let mut store = SegmentStore::new();
        let via = store.push(Segment::via("v", Point::new(5, 5), 4, LayerId(0), LayerId(1), 1));
        assert_eq!(store.at_point(Point::new(5, 5)), &[via]);
        store.remove(via);
        assert!(store.at_point(Point::new(5, 5)).is_empty());
    }
}
