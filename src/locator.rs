//! R-tree nearest-node index.
//!
//! Nodes are stored as points on the unit sphere. Chord length is monotone in
//! great-circle distance, so a Euclidean nearest-neighbour query in 3-D
//! returns the same node as a Haversine full scan
//! ([`StreetGraph::find_nearest_node`]) at O(log n) per query.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use crate::coord::Coordinate;
use crate::graph::{NodeId, StreetGraph};

/// Relative slack when collecting equidistant candidates.
const TIE_EPSILON: f64 = 1e-15;

#[derive(Clone)]
struct NodeEntry {
    point: [f64; 3],
    id: NodeId,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f64; 3]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    fn distance_2(&self, point: &[f64; 3]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        let dz = self.point[2] - point[2];
        dx * dx + dy * dy + dz * dz
    }
}

fn unit_vector(coord: Coordinate) -> [f64; 3] {
    let (lat, lon) = (coord.lat.to_radians(), coord.lon.to_radians());
    [lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()]
}

pub struct NodeLocator {
    tree: RTree<NodeEntry>,
}

impl NodeLocator {
    pub fn new(graph: &StreetGraph) -> Self {
        let entries = graph
            .graph
            .node_indices()
            .map(|id| NodeEntry {
                point: unit_vector(graph.graph[id].coord),
                id,
            })
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Nearest node to `coord`; equidistant nodes resolve to the lowest node id.
    pub fn nearest(&self, coord: Coordinate) -> Option<NodeId> {
        let query = unit_vector(coord);
        let mut candidates = self.tree.nearest_neighbor_iter_with_distance_2(&query);
        let (first, best) = candidates.next()?;
        let limit = best * (1.0 + TIE_EPSILON);
        candidates
            .take_while(|(_, d)| *d <= limit)
            .map(|(entry, _)| entry.id)
            .chain(std::iter::once(first.id))
            .min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::{Scores, StreetSegment};

    fn grid_graph() -> StreetGraph {
        let street = |id: String, a: Coordinate, b: Coordinate| {
            StreetSegment::new(id, vec![a, b], None, Scores::default()).unwrap()
        };
        let mut segments = Vec::new();
        for i in 0..6 {
            for j in 0..6 {
                let a = Coordinate::new(49.28 + i as f64 * 0.001, -123.12 + j as f64 * 0.001);
                let b = Coordinate::new(a.lat, a.lon + 0.001);
                let c = Coordinate::new(a.lat + 0.001, a.lon);
                segments.push(street(format!("{i}-{j}-e"), a, b));
                segments.push(street(format!("{i}-{j}-n"), a, c));
            }
        }
        StreetGraph::build(segments)
    }

    #[test]
    fn agrees_with_full_scan() {
        let graph = grid_graph();
        let locator = NodeLocator::new(&graph);
        assert_eq!(locator.len(), graph.node_count());

        for k in 0..40 {
            let q = Coordinate::new(49.2795 + k as f64 * 0.00017, -123.1207 + k as f64 * 0.00013);
            let expected = graph.find_nearest_node(q).map(|n| graph.graph[n].coord);
            let got = locator.nearest(q).map(|n| graph.graph[n].coord);
            assert_eq!(got, expected, "query {q}");
        }
    }

    #[test]
    fn empty_graph_has_no_nearest() {
        let graph = StreetGraph::build(Vec::new());
        let locator = NodeLocator::new(&graph);
        assert!(locator.is_empty());
        assert_eq!(locator.nearest(Coordinate::new(0.0, 0.0)), None);
    }
}
