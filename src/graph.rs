use std::collections::HashMap;
use std::sync::Arc;

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use tracing::info;

use crate::coord::{Coordinate, GridKey};
use crate::segment::StreetSegment;

pub type NodeId = NodeIndex;

#[derive(Debug, Clone, Copy)]
pub struct GraphNode {
    /// Coordinate of the first segment endpoint that produced this node.
    pub coord: Coordinate,
}

/// One direction of a street segment.
#[derive(Debug, Clone)]
pub struct StreetEdge {
    pub segment: Arc<StreetSegment>,
    pub distance_km: f64,
}

/// Street network with one node per canonical endpoint coordinate.
///
/// Every segment is stored as a pair of directed edges sharing the same
/// segment and weight. Parallel edges between the same nodes are kept.
pub struct StreetGraph {
    pub graph: DiGraph<GraphNode, StreetEdge>,
    node_keys: HashMap<GridKey, NodeIndex>,
}

impl StreetGraph {
    pub fn build<I>(segments: I) -> Self
    where
        I: IntoIterator<Item = StreetSegment>,
    {
        let mut graph = DiGraph::new();
        let mut node_keys: HashMap<GridKey, NodeIndex> = HashMap::new();

        for segment in segments {
            let segment = Arc::new(segment);

            let mut node_for = |coord: Coordinate| {
                let key = GridKey::node(coord);
                *node_keys
                    .entry(key)
                    .or_insert_with(|| graph.add_node(GraphNode { coord }))
            };
            let idx_a = node_for(segment.start);
            let idx_b = node_for(segment.end);

            let edge_data = StreetEdge {
                distance_km: segment.length_km,
                segment,
            };

            graph.add_edge(idx_a, idx_b, edge_data.clone());
            graph.add_edge(idx_b, idx_a, edge_data);
        }

        info!(
            "Graph built: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        Self { graph, node_keys }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.graph.node_weight(id)
    }

    pub fn coordinate(&self, id: NodeId) -> Option<Coordinate> {
        self.node(id).map(|n| n.coord)
    }

    /// Node whose canonical key matches `coord`, if any.
    pub fn node_at(&self, coord: Coordinate) -> Option<NodeId> {
        self.node_keys.get(&GridKey::node(coord)).copied()
    }

    pub fn edge(&self, id: EdgeIndex) -> Option<&StreetEdge> {
        self.graph.edge_weight(id)
    }

    /// All edges from `from` to `to`, in insertion order.
    pub fn edges_between(
        &self,
        from: NodeId,
        to: NodeId,
    ) -> impl Iterator<Item = (EdgeIndex, &StreetEdge)> {
        self.graph
            .edges_connecting(from, to)
            .map(|e| (e.id(), e.weight()))
    }

    /// Node for `coord`: the one recorded under its canonical key, otherwise
    /// the nearest by Haversine distance.
    ///
    /// The fallback is a full scan over every node; ties resolve to the node
    /// inserted first. Returns `None` only for an empty graph.
    pub fn find_nearest_node(&self, coord: Coordinate) -> Option<NodeId> {
        self.node_at(coord).or_else(|| {
            self.graph.node_indices().min_by(|&a, &b| {
                let da = self.graph[a].coord.distance_m(coord);
                let db = self.graph[b].coord.distance_m(coord);
                da.total_cmp(&db)
            })
        })
    }
}
