//! Net Connectivity Graph
//!
//! Graph view of one net using petgraph. Nodes are the net's live segments
//! and pads; edges join items that touch:
//! - two segments sharing an endpoint on intersecting layer masks
//! - a segment ending on a pad's copper on a shared layer
//!
//! Connected components are the net's copper islands. A fully routed net
//! has a single island.

use petgraph::algo::connected_components;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::Bfs;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::board::{Board, PadId, SegmentId};

/// Node in the net graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum NetNode {
    Segment(SegmentId),
    Pad(PadId),
}

/// One connected piece of copper
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Island {
    pub segments: Vec<SegmentId>,
    pub pads: Vec<PadId>,
}

/// Connectivity graph of a single net
#[derive(Debug, Clone)]
pub struct NetGraph {
    pub net: u32,
    graph: UnGraph<NetNode, ()>,
    indices: HashMap<NetNode, NodeIndex>,
}

impl NetGraph {
    pub fn build(board: &Board, net: u32) -> Self {
        let store = &board.store;
        let mut graph = UnGraph::new_undirected();
        let mut indices = HashMap::new();

        for (id, segment) in store.iter() {
            if segment.net == net && !segment.deleted {
                let node = NetNode::Segment(id);
                indices.insert(node, graph.add_node(node));
            }
        }
        for (pad_id, _) in board.pads_on_net(net) {
            let node = NetNode::Pad(pad_id);
            indices.insert(node, graph.add_node(node));
        }

        let mut linked: HashSet<(SegmentId, SegmentId)> = HashSet::new();
        for (id, segment) in store.iter() {
            let Some(&from) = indices.get(&NetNode::Segment(id)) else {
                continue;
            };
            for point in [segment.start, segment.end] {
                for other in store.at_point(point) {
                    if *other == id {
                        continue;
                    }
                    let Some(&to) = indices.get(&NetNode::Segment(*other)) else {
                        continue;
                    };
                    let touches = store
                        .get(*other)
                        .map(|o| o.layer_mask().intersects(segment.layer_mask()))
                        .unwrap_or(false);
                    let key = if id < *other { (id, *other) } else { (*other, id) };
                    if touches && linked.insert(key) {
                        graph.add_edge(from, to, ());
                    }
                }
            }
        }

        for (pad_id, pad) in board.pads_on_net(net) {
            let Some(&pad_node) = indices.get(&NetNode::Pad(pad_id)) else {
                continue;
            };
            for (id, segment) in store.iter() {
                let Some(&seg_node) = indices.get(&NetNode::Segment(id)) else {
                    continue;
                };
                let on_pad = segment.layer_mask().intersects(pad.layers)
                    && (pad.hit_test(segment.start) || pad.hit_test(segment.end));
                if on_pad {
                    graph.add_edge(pad_node, seg_node, ());
                }
            }
        }

        Self { net, graph, indices }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// True when the net forms at most one island
    pub fn is_connected(&self) -> bool {
        connected_components(&self.graph) <= 1
    }

    /// Connected components, ordered by their lowest segment id (then pad id)
    pub fn islands(&self) -> Vec<Island> {
        let mut seen: HashSet<NodeIndex> = HashSet::new();
        let mut islands = Vec::new();

        for start in self.graph.node_indices() {
            if seen.contains(&start) {
                continue;
            }
            let mut island = Island::default();
            let mut bfs = Bfs::new(&self.graph, start);
            while let Some(node) = bfs.next(&self.graph) {
                seen.insert(node);
                match self.graph[node] {
                    NetNode::Segment(id) => island.segments.push(id),
                    NetNode::Pad(id) => island.pads.push(id),
                }
            }
            island.segments.sort_unstable();
            island.pads.sort_unstable();
            islands.push(island);
        }

        islands.sort_by(|a, b| (a.segments.first(), a.pads.first()).cmp(&(b.segments.first(), b.pads.first())));
        islands
    }

    /// Whether two items of this net are electrically joined
    pub fn are_connected(&self, a: NetNode, b: NetNode) -> bool {
        let (Some(&from), Some(&to)) = (self.indices.get(&a), self.indices.get(&b)) else {
            return false;
        };
        let mut bfs = Bfs::new(&self.graph, from);
        while let Some(node) = bfs.next(&self.graph) {
            if node == to {
                return true;
            }
        }
        false
    }
}

/// Island summary of one net
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetSummary {
    pub net: u32,
    pub name: Option<String>,
    pub islands: Vec<Island>,
}

impl NetSummary {
    pub fn is_routed(&self) -> bool {
        self.islands.len() <= 1
    }
}

/// Summaries of every net used on the board
pub fn summarize_nets(board: &Board) -> Vec<NetSummary> {
    board
        .used_nets()
        .into_iter()
        .map(|net| {
            let graph = NetGraph::build(board, net);
            NetSummary {
                net,
                name: board.net_name(net).map(str::to_string),
                islands: graph.islands(),
            }
        })
        .collect()
}
