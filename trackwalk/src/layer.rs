//! Layer and layer mask model
//!
//! Layers are numbered the way the board stack is read from the top:
//! - Copper layers occupy bits 0..16 (`0` = front copper, `copper_layers - 1` = back copper)
//! - Technical layers (adhesive, paste, silkscreen, mask, drawings) occupy bits 16..29
//!
//! Out-of-range layer indices never panic; they produce the empty mask.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of copper layers on a board
pub const COPPER_LAYER_COUNT: u8 = 16;

/// Total number of layers addressable by a mask
pub const LAYER_COUNT: u8 = 32;

/// Technical layer names and their fixed indices
const TECHNICAL_LAYERS: [(&str, u8); 13] = [
    ("B.Adhes", 16),
    ("F.Adhes", 17),
    ("B.Paste", 18),
    ("F.Paste", 19),
    ("B.SilkS", 20),
    ("F.SilkS", 21),
    ("B.Mask", 22),
    ("F.Mask", 23),
    ("Dwgs.User", 24),
    ("Cmts.User", 25),
    ("Eco1.User", 26),
    ("Eco2.User", 27),
    ("Edge.Cuts", 28),
];

/// Index of a single board layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerId(pub u8);

impl LayerId {
    pub const FRONT: LayerId = LayerId(0);

    /// Back copper layer for a board with `copper_layers` copper layers
    pub fn back(copper_layers: u8) -> Self {
        LayerId(copper_layers.saturating_sub(1))
    }

    pub fn index(self) -> u8 {
        self.0
    }

    pub fn is_valid(self) -> bool {
        self.0 < LAYER_COUNT
    }

    pub fn is_copper(self) -> bool {
        self.0 < COPPER_LAYER_COUNT
    }

    /// Parse a layer name.
    ///
    /// Accepts `F.Cu`, `B.Cu`, `InN.Cu`, the technical layer names, or a
    /// plain numeric index. Inner layers must exist on the board.
    pub fn parse(name: &str, copper_layers: u8) -> Option<Self> {
        let name = name.trim();
        match name {
            "F.Cu" => return Some(LayerId::FRONT),
            "B.Cu" => return Some(LayerId::back(copper_layers)),
            _ => {}
        }

        if let Some(inner) = name.strip_prefix("In").and_then(|s| s.strip_suffix(".Cu")) {
            let n: u8 = inner.parse().ok()?;
            if n == 0 || n + 1 >= copper_layers {
                return None;
            }
            return Some(LayerId(n));
        }

        if let Some((_, idx)) = TECHNICAL_LAYERS.iter().find(|(n, _)| *n == name) {
            return Some(LayerId(*idx));
        }

        let idx: u8 = name.parse().ok()?;
        let layer = LayerId(idx);
        if layer.is_copper() && idx >= copper_layers {
            return None;
        }
        layer.is_valid().then_some(layer)
    }

    /// Canonical name of this layer on a board with `copper_layers` copper layers
    pub fn name(self, copper_layers: u8) -> String {
        if self.0 == 0 {
            return "F.Cu".to_string();
        }
        if self.is_copper() {
            if self.0 + 1 == copper_layers {
                return "B.Cu".to_string();
            }
            return format!("In{}.Cu", self.0);
        }
        TECHNICAL_LAYERS
            .iter()
            .find(|(_, idx)| *idx == self.0)
            .map(|(n, _)| n.to_string())
            .unwrap_or_else(|| self.0.to_string())
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer {}", self.0)
    }
}

/// Set of layers encoded as a bit mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const EMPTY: LayerMask = LayerMask(0);
    pub const ALL: LayerMask = LayerMask(u32::MAX);

    /// Single-bit mask for `layer`; empty when the layer is out of range
    pub fn from_layer(layer: LayerId) -> Self {
        if layer.is_valid() {
            LayerMask(1u32 << layer.0)
        } else {
            LayerMask::EMPTY
        }
    }

    /// Contiguous mask covering every layer between `a` and `b` inclusive
    pub fn span(a: LayerId, b: LayerId) -> Self {
        if !a.is_valid() || !b.is_valid() {
            return LayerMask::EMPTY;
        }
        let (lo, hi) = if a.0 <= b.0 { (a.0, b.0) } else { (b.0, a.0) };
        let width = u32::from(hi - lo) + 1;
        let bits = if width >= 32 {
            u32::MAX
        } else {
            ((1u32 << width) - 1) << lo
        };
        LayerMask(bits)
    }

    /// All copper layers of a board with `copper_layers` copper layers
    pub fn all_copper(copper_layers: u8) -> Self {
        if copper_layers == 0 {
            return LayerMask::EMPTY;
        }
        let count = copper_layers.min(COPPER_LAYER_COUNT);
        LayerMask::span(LayerId::FRONT, LayerId(count - 1))
    }

    pub fn intersects(self, other: LayerMask) -> bool {
        self.0 & other.0 != 0
    }

    pub fn contains(self, layer: LayerId) -> bool {
        self.intersects(LayerMask::from_layer(layer))
    }

    pub fn union(self, other: LayerMask) -> Self {
        LayerMask(self.0 | other.0)
    }

    pub fn intersection(self, other: LayerMask) -> Self {
        LayerMask(self.0 & other.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Layers set in this mask, lowest index first
    pub fn layers(self) -> impl Iterator<Item = LayerId> {
        (0..LAYER_COUNT)
            .filter(move |i| self.0 & (1u32 << i) != 0)
            .map(LayerId)
    }
}

impl FromIterator<LayerId> for LayerMask {
    fn from_iter<I: IntoIterator<Item = LayerId>>(iter: I) -> Self {
        iter.into_iter()
            .fold(LayerMask::EMPTY, |mask, layer| mask.union(LayerMask::from_layer(layer)))
    }
}

/// Intersection test between two masks
pub fn masks_intersect(a: LayerMask, b: LayerMask) -> bool {
    a.intersects(b)
}
