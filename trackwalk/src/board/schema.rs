//! Board description file
//!
//! JSON document describing a board for the tracing engine:
//! - Coordinates and widths are integer board units
//! - Layers are identified by canonical name (`F.Cu`, `In1.Cu`, `B.Cu`, ...)
//! - `tracks` is ordered; its order becomes the segment store order
//! - Items without a `uuid` get a generated one

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use super::items::{Net, Pad, PadShape, Segment, SegmentKind, ViaType};
use super::Board;
use crate::geometry::{Point, Size2D};
use crate::layer::{LayerId, LayerMask, COPPER_LAYER_COUNT};

/// Largest coordinate magnitude accepted from a board file
pub const MAX_COORDINATE: i64 = i32::MAX as i64;

#[derive(Debug, Error)]
pub enum BoardParseError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid layer '{layer}' on {item}")]
    InvalidLayer { layer: String, item: String },
    #[error("Invalid via {0}: {1}")]
    InvalidVia(String, String),
    #[error("Invalid board format: {0}")]
    InvalidFormat(String),
}

/// Complete board description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardFile {
    pub name: String,
    #[serde(default = "default_copper_layers")]
    pub copper_layers: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_layers: Option<Vec<String>>,
    #[serde(default)]
    pub nets: Vec<Net>,
    #[serde(default)]
    pub pads: Vec<PadDef>,
    #[serde(default)]
    pub tracks: Vec<TrackItem>,
}

fn default_copper_layers() -> u8 {
    2
}

/// One entry of the ordered track list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrackItem {
    Segment(TraceDef),
    Via(ViaDef),
}

/// Track segment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    pub start: Point,
    pub end: Point,
    pub width: i64,
    pub layer: String,
    #[serde(default)]
    pub net: u32,
}

/// Via (vertical interconnect)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViaDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    pub position: Point,
    pub size: i64,
    #[serde(default = "default_via_layers")]
    pub layers: (String, String),
    #[serde(default)]
    pub net: u32,
    #[serde(default)]
    pub via_type: ViaType,
}

fn default_via_layers() -> (String, String) {
    ("F.Cu".to_string(), "B.Cu".to_string())
}

/// Footprint pad
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PadDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub number: String,
    pub position: Point,
    pub size: Size2D,
    #[serde(default)]
    pub shape: PadShape,
    pub layers: Vec<String>,
    #[serde(default)]
    pub net: u32,
    #[serde(default)]
    pub die_length: i64,
}

/// Loader for board description files
pub struct BoardParser;

impl BoardParser {
    /// Read and parse a board description file
    pub fn parse_board(path: &Path) -> Result<Board, BoardParseError> {
        let content = std::fs::read_to_string(path)?;
        let board = Self::parse_board_str(&content)?;
        tracing::debug!(
            "Parsed board '{}' from {}: {} segments, {} pads",
            board.name,
            path.display(),
            board.store.len(),
            board.pads.len()
        );
        Ok(board)
    }

    pub fn parse_board_str(content: &str) -> Result<Board, BoardParseError> {
        let file: BoardFile = serde_json::from_str(content)?;
        file.into_board()
    }
}

impl BoardFile {
    /// Validate and convert into a [`Board`]
    pub fn into_board(self) -> Result<Board, BoardParseError> {
        if self.copper_layers == 0 || self.copper_layers > COPPER_LAYER_COUNT {
            return Err(BoardParseError::InvalidFormat(format!(
                "copper_layers must be between 1 and {}, found {}",
                COPPER_LAYER_COUNT, self.copper_layers
            )));
        }
        let copper = self.copper_layers;
        let mut board = Board::new(self.name, copper);
        board.nets = self.nets;

        if let Some(visible) = &self.visible_layers {
            board.visible_layers = parse_mask(visible, copper, "visible_layers")?;
        }

        for pad in self.pads {
            let item = format!("pad {}.{}", pad.reference, pad.number);
            let layers = parse_mask(&pad.layers, copper, &item)?;
            check_point(pad.position, &item)?;
            board.add_pad(Pad {
                uuid: pad.uuid.unwrap_or_else(new_uuid),
                reference: pad.reference,
                number: pad.number,
                position: pad.position,
                size: pad.size,
                shape: pad.shape,
                layers,
                net: pad.net,
                die_length: pad.die_length,
            });
        }

        for item in self.tracks {
            let segment = match item {
                TrackItem::Segment(trace) => {
                    let uuid = trace.uuid.unwrap_or_else(new_uuid);
                    let layer = parse_copper_layer(&trace.layer, copper, &uuid)?;
                    check_point(trace.start, &uuid)?;
                    check_point(trace.end, &uuid)?;
                    Segment::track(uuid, trace.start, trace.end, trace.width, layer, trace.net)
                }
                TrackItem::Via(via) => {
                    let uuid = via.uuid.unwrap_or_else(new_uuid);
                    let top = parse_copper_layer(&via.layers.0, copper, &uuid)?;
                    let bottom = parse_copper_layer(&via.layers.1, copper, &uuid)?;
                    check_point(via.position, &uuid)?;
                    if top == bottom {
                        return Err(BoardParseError::InvalidVia(
                            uuid,
                            format!("layer pair {} / {} spans a single layer", via.layers.0, via.layers.1),
                        ));
                    }
                    if !board.is_via_span_valid(top, bottom) {
                        return Err(BoardParseError::InvalidVia(
                            uuid,
                            format!("layers exceed {} copper layers", copper),
                        ));
                    }
                    Segment::via(uuid, via.position, via.size, top, bottom, via.net)
                        .with_via_type(via.via_type)
                }
            };
            board.store.push(segment);
        }

        Ok(board)
    }

    /// Describe a board, keeping store order and skipping deleted segments
    pub fn from_board(board: &Board) -> Self {
        let copper = board.copper_layers;
        let visible_layers = (board.visible_layers != LayerMask::ALL)
            .then(|| board.visible_layers.layers().map(|l| l.name(copper)).collect());

        let pads = board
            .pads
            .iter()
            .map(|pad| PadDef {
                uuid: Some(pad.uuid.clone()),
                reference: pad.reference.clone(),
                number: pad.number.clone(),
                position: pad.position,
                size: pad.size,
                shape: pad.shape,
                layers: pad.layers.layers().map(|l| l.name(copper)).collect(),
                net: pad.net,
                die_length: pad.die_length,
            })
            .collect();

        let tracks = board
            .store
            .iter()
            .filter(|(_, s)| !s.deleted)
            .map(|(_, s)| match s.kind {
                SegmentKind::Track { layer } => TrackItem::Segment(TraceDef {
                    uuid: Some(s.uuid.clone()),
                    start: s.start,
                    end: s.end,
                    width: s.width,
                    layer: layer.name(copper),
                    net: s.net,
                }),
                SegmentKind::Via { top, bottom, via_type } => TrackItem::Via(ViaDef {
                    uuid: Some(s.uuid.clone()),
                    position: s.start,
                    size: s.width,
                    layers: (top.name(copper), bottom.name(copper)),
                    net: s.net,
                    via_type,
                }),
            })
            .collect();

        Self {
            name: board.name.clone(),
            copper_layers: copper,
            visible_layers,
            nets: board.nets.clone(),
            pads,
            tracks,
        }
    }

    pub fn to_json(&self) -> Result<String, BoardParseError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn new_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn check_point(point: Point, item: &str) -> Result<(), BoardParseError> {
    if point.x.unsigned_abs() > MAX_COORDINATE as u64 || point.y.unsigned_abs() > MAX_COORDINATE as u64 {
        return Err(BoardParseError::InvalidFormat(format!(
            "{} at {} is outside +/-{}",
            item, point, MAX_COORDINATE
        )));
    }
    Ok(())
}

fn parse_copper_layer(name: &str, copper: u8, item: &str) -> Result<LayerId, BoardParseError> {
    LayerId::parse(name, copper)
        .filter(|l| l.is_copper())
        .ok_or_else(|| BoardParseError::InvalidLayer {
            layer: name.to_string(),
            item: item.to_string(),
        })
}

/// Parse layer names into a mask; `*.Cu` and `*.Mask` expand to groups
fn parse_mask(names: &[String], copper: u8, item: &str) -> Result<LayerMask, BoardParseError> {
    let mut mask = LayerMask::EMPTY;
    for name in names {
        let layers = match name.as_str() {
            "*.Cu" => LayerMask::all_copper(copper),
            "*.Mask" => LayerMask::from_layer(LayerId(22)).union(LayerMask::from_layer(LayerId(23))),
            "*.Paste" => LayerMask::from_layer(LayerId(18)).union(LayerMask::from_layer(LayerId(19))),
            other => LayerId::parse(other, copper)
                .map(LayerMask::from_layer)
                .ok_or_else(|| BoardParseError::InvalidLayer {
                    layer: other.to_string(),
                    item: item.to_string(),
                })?,
        };
        mask = mask.union(layers);
    }
    Ok(mask)
}
