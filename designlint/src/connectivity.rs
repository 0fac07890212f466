//! Connectivity graph over a schematic.
//!
//! Parts and nets become nodes of a directed graph; every pin reference
//! becomes an edge from the owning part to its net, labeled with the pin
//! name. The graph is the adjacency index behind pattern matching, so edge
//! enumeration preserves document order: callers see a part's nets, and a
//! net's pins, in the order the schematic lists them.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::document::{Net, Part, Schematic};

/// Node payload: a part or a net borrowed from the schematic.
#[derive(Debug, Clone, Copy)]
pub enum GraphNode<'a> {
    Part(&'a Part),
    Net(&'a Net),
}

impl<'a> GraphNode<'a> {
    pub fn as_part(&self) -> Option<&'a Part> {
        match *self {
            GraphNode::Part(part) => Some(part),
            GraphNode::Net(_) => None,
        }
    }

    pub fn as_net(&self) -> Option<&'a Net> {
        match *self {
            GraphNode::Net(net) => Some(net),
            GraphNode::Part(_) => None,
        }
    }
}

/// Edge payload: the pin name of one pin reference.
#[derive(Debug, Clone)]
pub struct PinEdge {
    pub pin: String,
}

/// Bipartite part/net adjacency built from a schematic.
pub struct ConnectivityGraph<'a> {
    graph: DiGraph<GraphNode<'a>, PinEdge>,
    part_indices: HashMap<&'a str, NodeIndex>,
    net_indices: HashMap<&'a str, NodeIndex>,
}

impl<'a> ConnectivityGraph<'a> {
    pub fn from_schematic(schematic: &'a Schematic) -> Self {
        let mut graph = DiGraph::new();
        let mut part_indices = HashMap::new();
        let mut net_indices = HashMap::new();

        for part in &schematic.parts {
            let idx = graph.add_node(GraphNode::Part(part));
            part_indices.insert(part.name.as_str(), idx);
        }

        for net in &schematic.nets {
            let idx = graph.add_node(GraphNode::Net(net));
            net_indices.insert(net.name.as_str(), idx);
        }

        // Edge insertion order is pin-reference document order; queries sort
        // by edge id to recover it.
        let mut connections = 0usize;
        for net in &schematic.nets {
            let Some(&net_idx) = net_indices.get(net.name.as_str()) else {
                continue;
            };
            for pinref in net.pinrefs() {
                let Some(&part_idx) = part_indices.get(pinref.part.as_str()) else {
                    tracing::debug!(
                        "Pin reference to unknown part '{}' on net '{}'",
                        pinref.part,
                        net.name
                    );
                    continue;
                };
                graph.add_edge(
                    part_idx,
                    net_idx,
                    PinEdge {
                        pin: pinref.pin.clone(),
                    },
                );
                connections += 1;
            }
        }

        tracing::debug!(
            "Built connectivity graph: {} parts, {} nets, {} connections",
            part_indices.len(),
            net_indices.len(),
            connections
        );

        Self {
            graph,
            part_indices,
            net_indices,
        }
    }

    pub fn part_count(&self) -> usize {
        self.part_indices.len()
    }

    pub fn net_count(&self) -> usize {
        self.net_indices.len()
    }

    pub fn connection_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// The nets a part connects to, one entry per pin reference, in
    /// document order. A net appears once per connected pin.
    pub fn nets_attached(&self, part: &str) -> Vec<(&str, &'a Net)> {
        let Some(&idx) = self.part_indices.get(part) else {
            return Vec::new();
        };
        let mut edges: Vec<_> = self.graph.edges_directed(idx, Direction::Outgoing).collect();
        edges.sort_by_key(|e| e.id());
        edges
            .into_iter()
            .filter_map(|e| {
                let net = self.graph.node_weight(e.target())?.as_net()?;
                Some((e.weight().pin.as_str(), net))
            })
            .collect()
    }

    /// The pins attached to a net, one entry per pin reference, in document
    /// order.
    pub fn pinrefs_on(&self, net: &str) -> Vec<(&str, &'a Part)> {
        let Some(&idx) = self.net_indices.get(net) else {
            return Vec::new();
        };
        let mut edges: Vec<_> = self.graph.edges_directed(idx, Direction::Incoming).collect();
        edges.sort_by_key(|e| e.id());
        edges
            .into_iter()
            .filter_map(|e| {
                let part = self.graph.node_weight(e.source())?.as_part()?;
                Some((e.weight().pin.as_str(), part))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Net;

    fn sample_schematic() -> Schematic {
        let mut sch = Schematic::new("divider.sch");
        sch.add_part(Part::new("R1"));
        sch.add_part(Part::new("R2"));
        sch.add_part(Part::new("GND1"));
        sch.add_net(
            Net::new("VCC").with_pinref("R1", "1"),
        );
        sch.add_net(
            Net::new("MID")
                .with_pinref("R1", "2")
                .with_pinref("R2", "1"),
        );
        sch.add_net(
            Net::new("GND")
                .with_pinref("R2", "2")
                .with_pinref("GND1", "GND"),
        );
        sch
    }

    #[test]
    fn test_counts() {
        let sch = sample_schematic();
        let graph = ConnectivityGraph::from_schematic(&sch);
        assert_eq!(graph.part_count(), 3);
        assert_eq!(graph.net_count(), 3);
        assert_eq!(graph.connection_count(), 5);
    }

    #[test]
    fn test_nets_attached_in_document_order() {
        let sch = sample_schematic();
        let graph = ConnectivityGraph::from_schematic(&sch);
        let attached: Vec<(&str, &str)> = graph
            .nets_attached("R1")
            .into_iter()
            .map(|(pin, net)| (pin, net.name.as_str()))
            .collect();
        assert_eq!(attached, vec![("1", "VCC"), ("2", "MID")]);
    }

    #[test]
    fn test_pinrefs_on_net_in_document_order() {
        let sch = sample_schematic();
        let graph = ConnectivityGraph::from_schematic(&sch);
        let pins: Vec<(&str, &str)> = graph
            .pinrefs_on("MID")
            .into_iter()
            .map(|(pin, part)| (pin, part.name.as_str()))
            .collect();
        assert_eq!(pins, vec![("2", "R1"), ("1", "R2")]);
    }

    #[test]
    fn test_unknown_names_yield_empty_adjacency() {
        let sch = sample_schematic();
        let graph = ConnectivityGraph::from_schematic(&sch);
        assert!(graph.nets_attached("R99").is_empty());
        assert!(graph.pinrefs_on("NOWHERE").is_empty());
    }

    #[test]
    fn test_dangling_pinref_is_skipped() {
        let mut sch = sample_schematic();
        sch.add_net(Net::new("ORPHAN").with_pinref("U404", "1"));
        let graph = ConnectivityGraph::from_schematic(&sch);
        assert_eq!(graph.connection_count(), 5);
        assert!(graph.pinrefs_on("ORPHAN").is_empty());
    }

    #[test]
    fn test_part_connected_to_same_net_twice() {
        let mut sch = Schematic::new("x.sch");
        sch.add_part(Part::new("U1"));
        sch.add_net(
            Net::new("GND")
                .with_pinref("U1", "GND@1")
                .with_pinref("U1", "GND@2"),
        );
        let graph = ConnectivityGraph::from_schematic(&sch);
        let attached = graph.nets_attached("U1");
        assert_eq!(attached.len(), 2);
        assert_eq!(attached[0].0, "GND@1");
        assert_eq!(attached[1].0, "GND@2");
    }
}
