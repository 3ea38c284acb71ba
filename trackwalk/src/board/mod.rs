//! Board model: the segment store plus the pads, nets and layer setup the
//! connectivity algorithms consult.

pub mod items;
pub mod schema;
pub mod store;

pub use items::{Net, Pad, PadId, PadShape, Segment, SegmentId, SegmentKind, ViaType};
pub use schema::{BoardFile, BoardParseError};
pub use store::SegmentStore;

use crate::geometry::Point;
use crate::layer::{LayerId, LayerMask};

/// A board: ordered segment store, pads and layer configuration
#[derive(Debug, Clone)]
pub struct Board {
    pub name: String,
    pub copper_layers: u8,
    pub visible_layers: LayerMask,
    pub nets: Vec<Net>,
    pub pads: Vec<Pad>,
    pub store: SegmentStore,
}

impl Board {
    /// Empty board with every layer visible
    pub fn new(name: impl Into<String>, copper_layers: u8) -> Self {
        Self {
            name: name.into(),
            copper_layers,
            visible_layers: LayerMask::ALL,
            nets: Vec::new(),
            pads: Vec::new(),
            store: SegmentStore::new(),
        }
    }

    pub fn add_pad(&mut self, pad: Pad) -> PadId {
        self.pads.push(pad);
        PadId(self.pads.len() - 1)
    }

    pub fn pad(&self, id: PadId) -> Option<&Pad> {
        self.pads.get(id.0)
    }

    pub fn segment(&self, id: SegmentId) -> Option<&Segment> {
        self.store.get(id)
    }

    pub fn is_layer_visible(&self, layer: LayerId) -> bool {
        self.visible_layers.contains(layer)
    }

    pub fn net_name(&self, net: u32) -> Option<&str> {
        self.nets.iter().find(|n| n.id == net).map(|n| n.name.as_str())
    }

    /// Whether a via's layer pair is legal on this board
    pub fn is_via_span_valid(&self, top: LayerId, bottom: LayerId) -> bool {
        top.index() < self.copper_layers && bottom.index() < self.copper_layers
    }

    /// Pad whose outline covers `position` on a layer of `mask`.
    /// A track ending anywhere on the pad copper connects to it.
    pub fn pad_hit(&self, position: Point, mask: LayerMask) -> Option<PadId> {
        self.pads
            .iter()
            .position(|p| p.layers.intersects(mask) && p.hit_test(position))
            .map(PadId)
    }

    /// Pads belonging to `net`
    pub fn pads_on_net(&self, net: u32) -> impl Iterator<Item = (PadId, &Pad)> + '_ {
        self.pads
            .iter()
            .enumerate()
            .filter(move |(_, p)| p.net == net)
            .map(|(i, p)| (PadId(i), p))
    }

    /// Net ids that appear on segments or pads, ascending
    pub fn used_nets(&self) -> Vec<u32> {
        let mut nets: Vec<u32> = self
            .store
            .iter()
            .filter(|(_, s)| !s.deleted)
            .map(|(_, s)| s.net)
            .chain(self.pads.iter().map(|p| p.net))
            .filter(|net| *net != 0)
            .collect();
        nets.sort_unstable();
        nets.dedup();
        nets
    }
}
