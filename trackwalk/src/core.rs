//! Core track operations shared by the CLI and library users.
//! Resolves segments by uuid and turns marking results into reports.

use serde::Serialize;
use std::path::Path;

use crate::board::schema::BoardParser;
use crate::board::{Board, BoardFile, BoardParseError, SegmentId, SegmentKind};
use crate::connectivity::{self, ChainEnd, EndPoint, MarkOptions, MarkedTrack, NetSummary, VisitedSet};
use crate::config::TrackConfig;
use crate::geometry::Point;
use crate::magnetic::{magnetize, MagneticSettings, Snap, SnapContext, SnapTarget};

#[derive(Debug, thiserror::Error)]
pub enum TrackWalkError {
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid board: {0}")]
    InvalidBoard(String),
    #[error("Unknown segment: {0}")]
    UnknownSegment(String),
    #[error("Config error: {0}")]
    Config(String),
    #[error("{0}")]
    Other(String),
}

impl From<BoardParseError> for TrackWalkError {
    fn from(e: BoardParseError) -> Self {
        match e {
            BoardParseError::Io(io) => TrackWalkError::Io(io),
            BoardParseError::Json(json) => TrackWalkError::Parse(json.to_string()),
            other => TrackWalkError::InvalidBoard(other.to_string()),
        }
    }
}

/// Options for track commands (CLI or library)
#[derive(Clone, Debug)]
pub struct TrackOptions {
    pub reorder: bool,
    pub with_length: bool,
    pub with_die_length: bool,
}

impl Default for TrackOptions {
    fn default() -> Self {
        Self {
            reorder: false,
            with_length: true,
            with_die_length: true,
        }
    }
}

impl From<&TrackConfig> for TrackOptions {
    fn from(config: &TrackConfig) -> Self {
        Self {
            reorder: config.reorder_on_select,
            ..Self::default()
        }
    }
}

impl TrackOptions {
    fn mark_options(&self) -> MarkOptions {
        MarkOptions {
            reorder: self.reorder,
            with_length: self.with_length,
            with_die_length: self.with_die_length,
        }
    }
}

/// One segment of a reported track
#[derive(Debug, Clone, Serialize)]
pub struct SegmentReport {
    pub uuid: String,
    pub kind: &'static str,
    pub layer: String,
    pub start: Point,
    pub end: Point,
    pub width: i64,
    pub net: u32,
}

/// One end of a reported track
#[derive(Debug, Clone, Serialize)]
pub struct EndReport {
    pub point: Point,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pad: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branches: Option<usize>,
}

/// Result of a track command
#[derive(Debug, Clone, Serialize)]
pub struct TrackReport {
    pub board: String,
    pub reference: String,
    pub first: String,
    pub count: usize,
    pub length: i64,
    pub die_length: i64,
    pub segments: Vec<SegmentReport>,
    pub ends: Vec<EndReport>,
}

impl TrackReport {
    /// Electrical length including the die length of the end pads
    pub fn total_length(&self) -> i64 {
        self.length + self.die_length
    }

    fn build(board: &Board, track: &MarkedTrack) -> Self {
        let copper = board.copper_layers;
        let uuid_of = |id: SegmentId| board.segment(id).map(|s| s.uuid.clone()).unwrap_or_default();

        let segments = track
            .segments
            .iter()
            .filter_map(|id| board.segment(*id))
            .map(|s| SegmentReport {
                uuid: s.uuid.clone(),
                kind: if s.is_via() { "via" } else { "track" },
                layer: match s.kind {
                    SegmentKind::Track { layer } => layer.name(copper),
                    SegmentKind::Via { top, bottom, .. } => format!("{}-{}", top.name(copper), bottom.name(copper)),
                },
                start: s.start,
                end: s.end,
                width: s.width,
                net: s.net,
            })
            .collect();

        let ends = track
            .ends
            .iter()
            .map(|e| match e.end {
                ChainEnd::Pad { pad } => EndReport {
                    point: e.point,
                    kind: "pad",
                    pad: board.pad(pad).map(|p| p.label()),
                    branches: None,
                },
                ChainEnd::DeadEnd => EndReport {
                    point: e.point,
                    kind: "dead_end",
                    pad: None,
                    branches: None,
                },
                ChainEnd::Junction { branches } => EndReport {
                    point: e.point,
                    kind: "junction",
                    pad: None,
                    branches: Some(branches),
                },
            })
            .collect();

        Self {
            board: board.name.clone(),
            reference: uuid_of(track.reference),
            first: uuid_of(track.first),
            count: track.count,
            length: track.length,
            die_length: track.die_length,
            segments,
            ends,
        }
    }
}

/// Connectivity of one net
#[derive(Debug, Clone, Serialize)]
pub struct NetReport {
    pub net: u32,
    pub name: Option<String>,
    pub routed: bool,
    pub islands: Vec<IslandReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IslandReport {
    pub segments: Vec<String>,
    pub pads: Vec<String>,
}

impl NetReport {
    fn build(board: &Board, summary: &NetSummary) -> Self {
        let islands = summary
            .islands
            .iter()
            .map(|island| IslandReport {
                segments: island
                    .segments
                    .iter()
                    .filter_map(|id| board.segment(*id).map(|s| s.uuid.clone()))
                    .collect(),
                pads: island
                    .pads
                    .iter()
                    .filter_map(|id| board.pad(*id).map(|p| p.label()))
                    .collect(),
            })
            .collect();
        Self {
            net: summary.net,
            name: summary.name.clone(),
            routed: summary.is_routed(),
            islands,
        }
    }
}

/// Neighbours of one segment
#[derive(Debug, Clone, Serialize)]
pub struct LinksReport {
    pub segment: String,
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Result of a snap query
#[derive(Debug, Clone, Serialize)]
pub struct SnapReport {
    pub snapped: bool,
    pub point: Point,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl SnapReport {
    fn build(board: &Board, cursor: Point, snap: Option<Snap>) -> Self {
        let uuid_of = |id: SegmentId| board.segment(id).map(|s| s.uuid.clone()).unwrap_or_default();
        match snap {
            Some(snap) => {
                let target = match snap.target {
                    SnapTarget::Pad { pad } => format!("pad {}", board.pad(pad).map(|p| p.label()).unwrap_or_default()),
                    SnapTarget::Via { via } => format!("via {}", uuid_of(via)),
                    SnapTarget::Projection { track } => format!("projection on {}", uuid_of(track)),
                    SnapTarget::Join { track } => format!("join with {}", uuid_of(track)),
                    SnapTarget::Endpoint { track } => format!("endpoint of {}", uuid_of(track)),
                };
                Self {
                    snapped: true,
                    point: snap.point,
                    target: Some(target),
                }
            }
            None => Self {
                snapped: false,
                point: cursor,
                target: None,
            },
        }
    }
}

/// Core track API used by the CLI.
pub struct TrackWalkCore;

impl TrackWalkCore {
    /// Load a board description file
    pub fn load_board(path: &Path) -> Result<Board, TrackWalkError> {
        let board = BoardParser::parse_board(path)?;
        tracing::info!(
            "Loaded board '{}': {} segments, {} pads",
            board.name,
            board.store.len(),
            board.pads.len()
        );
        Ok(board)
    }

    /// Write a board description file
    pub fn save_board(board: &Board, path: &Path) -> Result<(), TrackWalkError> {
        let json = BoardFile::from_board(board).to_json()?;
        std::fs::write(path, json)?;
        tracing::info!("Saved board '{}' to {}", board.name, path.display());
        Ok(())
    }

    fn resolve(board: &Board, uuid: &str) -> Result<SegmentId, TrackWalkError> {
        board
            .store
            .find_by_uuid(uuid)
            .ok_or_else(|| TrackWalkError::UnknownSegment(uuid.to_string()))
    }

    /// Mark the track containing segment `uuid`
    pub fn select_track(board: &mut Board, uuid: &str, options: &TrackOptions) -> Result<TrackReport, TrackWalkError> {
        let reference = Self::resolve(board, uuid)?;
        let track = connectivity::mark_trace(board, reference, options.mark_options())
            .ok_or_else(|| TrackWalkError::UnknownSegment(uuid.to_string()))?;
        Ok(TrackReport::build(board, &track))
    }

    /// Delete the track containing segment `uuid`; the report lists what was removed
    pub fn delete_track(board: &mut Board, uuid: &str) -> Result<TrackReport, TrackWalkError> {
        let reference = Self::resolve(board, uuid)?;
        let track = connectivity::trace_track(board, reference)
            .ok_or_else(|| TrackWalkError::UnknownSegment(uuid.to_string()))?;
        let report = TrackReport::build(board, &track);
        connectivity::delete_track(board, reference)
            .ok_or_else(|| TrackWalkError::UnknownSegment(uuid.to_string()))?;
        Ok(report)
    }

    /// Segments connected to each end of segment `uuid`
    pub fn links(board: &Board, uuid: &str, window: usize) -> Result<LinksReport, TrackWalkError> {
        let reference = Self::resolve(board, uuid)?;
        let visited = VisitedSet::new();
        let uuid_of = |id: SegmentId| board.segment(id).map(|s| s.uuid.clone());
        let at = |end: EndPoint| {
            connectivity::find_connected_segment(&board.store, reference, end, &visited, window).and_then(&uuid_of)
        };
        Ok(LinksReport {
            segment: uuid.to_string(),
            start: at(EndPoint::Start),
            end: at(EndPoint::End),
        })
    }

    /// Island report for every net on the board
    pub fn net_report(board: &Board) -> Vec<NetReport> {
        connectivity::summarize_nets(board)
            .iter()
            .map(|summary| NetReport::build(board, summary))
            .collect()
    }

    /// Magnetic snap for one cursor position
    pub fn snap(board: &Board, ctx: &SnapContext, settings: &MagneticSettings) -> SnapReport {
        let snap = magnetize(board, ctx, settings);
        tracing::debug!("Snap at {}: {:?}", ctx.cursor, snap);
        SnapReport::build(board, ctx.cursor, snap)
    }
}
