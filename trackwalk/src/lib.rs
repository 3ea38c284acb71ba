//! trackwalk - PCB connectivity and track tracing library
//!
//! This library finds the logical track a segment belongs to on a routed
//! board: the chain of tracks and vias running from pad to pad (or up to a
//! junction or dead end). It also measures tracks, deletes them, reports
//! per-net copper islands and snaps the cursor while tracks are drawn.
//!
//! # Quick Start
//!
//! ```no_run
//! use trackwalk::{TrackOptions, TrackWalkCore};
//! use std::path::Path;
//!
//! let mut board = TrackWalkCore::load_board(Path::new("board.json")).unwrap();
//! let report = TrackWalkCore::select_track(&mut board, "seg-a", &TrackOptions::default()).unwrap();
//!
//! println!("{} segments, length {}", report.count, report.length);
//! for end in &report.ends {
//!     println!("{} at {}", end.kind, end.point);
//! }
//! ```
//!
//! # Features
//!
//! - **Track marking**: chain walking across vias with via disambiguation
//! - **Measurement**: track length and pad die length
//! - **Net islands**: petgraph connectivity per net
//! - **Magnetic snap**: pad, via, projection and join snapping

pub mod board;
pub mod config;
pub mod connectivity;
pub mod core;
pub mod geometry;
pub mod layer;
pub mod magnetic;

// Re-export main types
pub use board::{Board, BoardFile, Pad, PadId, Segment, SegmentId, SegmentKind, SegmentStore, ViaType};
pub use board::schema::BoardParser;
pub use config::TrackConfig;
pub use connectivity::{
    chain_marked_segments, delete_track, mark_trace, summarize_nets, trace_track, ChainEnd, MarkOptions, MarkedTrack,
    NetGraph, VisitedSet,
};
pub use self::core::{
    LinksReport, NetReport, SnapReport, TrackOptions, TrackReport, TrackWalkCore, TrackWalkError,
};
pub use geometry::{Point, Size2D};
pub use layer::{LayerId, LayerMask};
pub use magnetic::{join, magnetize, project, MagneticMode, MagneticSettings, Snap, SnapContext, SnapTarget, Tool};

/// Parse a board description file (convenience wrapper).
pub fn parse_board(path: &std::path::Path) -> Result<Board, TrackWalkError> {
    BoardParser::parse_board(path).map_err(TrackWalkError::from)
}

/// Commonly used items.
pub mod prelude {
    pub use crate::board::{Board, Pad, Segment, SegmentId};
    pub use crate::connectivity::{mark_trace, trace_track, MarkOptions, VisitedSet};
    pub use crate::geometry::Point;
    pub use crate::layer::{LayerId, LayerMask};
    pub use crate::magnetic::{magnetize, MagneticSettings, SnapContext};
}
