//! Board connectivity: endpoint lookups, chain walking, track marking and
//! per-net connectivity graphs.

pub mod graph;
pub mod locate;
pub mod marker;
pub mod walker;

pub use graph::{summarize_nets, Island, NetGraph, NetNode, NetSummary};
pub use locate::{
    find_connected_segment, find_segment_at_point, find_via_at_point, locate_track_hit, locate_via_area,
    segments_at_point, EndPoint, ItemFilter, ScanRange, VisitedSet, DEFAULT_NEIGHBOR_WINDOW,
};
pub use marker::{delete_track, mark_trace, trace_track, MarkOptions, MarkedTrack, TrackEnd};
pub use walker::{chain_marked_segments, ChainEnd, ChainWalk};
