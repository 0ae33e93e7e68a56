//! Single-source shortest paths over the street graph.
//!
//! One Dijkstra core, [`shortest_path`], parameterized by an edge-cost
//! closure. The fastest variant costs edges by physical length; the safest
//! variant by a [`WeightProfile`] chosen from the query time, so the search
//! itself knows nothing about time of day.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use petgraph::graph::EdgeIndex;
use petgraph::visit::EdgeRef;

use crate::graph::{NodeId, StreetEdge, StreetGraph};
use crate::safety::{DaylightWindow, QueryTime, WeightProfile};

#[derive(Copy, Clone, PartialEq)]
struct State {
    cost: f64,
    node: NodeId,
}

impl Eq for State {}

// Min-heap by cost, ties by node id (reversed from standard Rust BinaryHeap)
impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A found path: nodes in order, the edge taken for each hop and the summed cost.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub nodes: Vec<NodeId>,
    pub edges: Vec<EdgeIndex>,
    pub cost: f64,
}

impl Route {
    fn trivial(node: NodeId) -> Self {
        Self {
            nodes: vec![node],
            edges: Vec::new(),
            cost: 0.0,
        }
    }
}

/// Dijkstra from `from` to `to` with `edge_cost` giving each edge's weight.
///
/// `edge_cost` must return non-negative values. Stops as soon as `to` is
/// settled. Returns `None` when `to` is unreachable or either id is not in
/// the graph.
pub fn shortest_path<F>(
    graph: &StreetGraph,
    from: NodeId,
    to: NodeId,
    edge_cost: F,
) -> Option<Route>
where
    F: Fn(&StreetEdge) -> f64,
{
    let n = graph.node_count();
    if from.index() >= n || to.index() >= n {
        return None;
    }
    if from == to {
        return Some(Route::trivial(from));
    }

    let mut dist = vec![f64::INFINITY; n];
    let mut prev: Vec<Option<(NodeId, EdgeIndex)>> = vec![None; n];
    let mut settled = vec![false; n];
    let mut heap = BinaryHeap::new();

    dist[from.index()] = 0.0;
    heap.push(State {
        cost: 0.0,
        node: from,
    });

    while let Some(State { cost, node }) = heap.pop() {
        if settled[node.index()] {
            continue;
        }
        settled[node.index()] = true;

        if node == to {
            return Some(reconstruct(&prev, from, to, cost));
        }

        for edge in graph.graph.edges(node) {
            let next = edge.target();
            if settled[next.index()] {
                continue;
            }
            let next_cost = cost + edge_cost(edge.weight());
            if next_cost < dist[next.index()] {
                dist[next.index()] = next_cost;
                prev[next.index()] = Some((node, edge.id()));
                heap.push(State {
                    cost: next_cost,
                    node: next,
                });
            }
        }
    }

    None
}

fn reconstruct(
    prev: &[Option<(NodeId, EdgeIndex)>],
    from: NodeId,
    to: NodeId,
    cost: f64,
) -> Route {
    let mut nodes = vec![to];
    let mut edges = Vec::new();
    let mut cur = to;
    while cur != from {
        match prev[cur.index()] {
            Some((p, e)) => {
                edges.push(e);
                nodes.push(p);
                cur = p;
            }
            None => break,
        }
    }
    nodes.reverse();
    edges.reverse();
    Route { nodes, edges, cost }
}

/// Minimum physical distance; `cost` is in kilometres.
pub fn fastest_route(graph: &StreetGraph, from: NodeId, to: NodeId) -> Option<Route> {
    shortest_path(graph, from, to, |e| e.distance_km)
}

/// Safety-weighted route under `profile`; `cost` is in weighted metres.
pub fn safest_route(
    graph: &StreetGraph,
    from: NodeId,
    to: NodeId,
    profile: &WeightProfile,
) -> Option<Route> {
    shortest_path(graph, from, to, |e| {
        profile.edge_cost(e.distance_km, &e.segment.scores)
    })
}

/// Node path of the fastest route, empty if unreachable.
pub fn find_fastest_path(graph: &StreetGraph, from: NodeId, to: NodeId) -> Vec<NodeId> {
    fastest_route(graph, from, to)
        .map(|r| r.nodes)
        .unwrap_or_default()
}

/// Node path of the safest route at `time`, empty if unreachable.
///
/// Always classifies `time` with the default 07:00-19:00 daylight window.
/// For a configured window, resolve the profile with
/// [`DaylightWindow::profile`] and call [`safest_route`].
pub fn find_safest_path(
    graph: &StreetGraph,
    from: NodeId,
    to: NodeId,
    time: QueryTime,
) -> Vec<NodeId> {
    let profile = DaylightWindow::default().profile(time);
    safest_route(graph, from, to, &profile)
        .map(|r| r.nodes)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::Coordinate;
    use crate::segment::{Scores, StreetSegment};

    fn seg(id: &str, a: Coordinate, b: Coordinate, km: f64) -> StreetSegment {
        StreetSegment::new(id, vec![a, b], Some(km), Scores::default()).unwrap()
    }

    /// 0-1-2-4 is 0.3 km; 0-3-4 is 0.6 km. Node 5-6 is a separate component.
    fn network() -> (StreetGraph, Vec<NodeId>) {
        let p: Vec<Coordinate> = (0..7)
            .map(|i| Coordinate::new(49.28 + i as f64 * 0.001, -123.12))
            .collect();
        let g = StreetGraph::build(vec![
            seg("01", p[0], p[1], 0.1),
            seg("12", p[1], p[2], 0.1),
            seg("24", p[2], p[4], 0.1),
            seg("03", p[0], p[3], 0.5),
            seg("34", p[3], p[4], 0.1),
            seg("56", p[5], p[6], 0.1),
        ]);
        let ids = p.iter().map(|c| g.node_at(*c).unwrap()).collect();
        (g, ids)
    }

    #[test]
    fn picks_shortest_distance() {
        let (g, n) = network();
        let route = fastest_route(&g, n[0], n[4]).unwrap();
        assert_eq!(route.nodes, vec![n[0], n[1], n[2], n[4]]);
        assert_eq!(route.edges.len(), 3);
        assert!((route.cost - 0.3).abs() < 1e-12);
    }

    #[test]
    fn cost_equals_sum_of_edge_weights() {
        let (g, n) = network();
        let route = fastest_route(&g, n[3], n[1]).unwrap();
        let sum: f64 = route
            .edges
            .iter()
            .map(|e| g.edge(*e).unwrap().distance_km)
            .sum();
        assert!((route.cost - sum).abs() < 1e-12);
    }

    #[test]
    fn same_node_is_a_single_node_path() {
        let (g, n) = network();
        let route = fastest_route(&g, n[2], n[2]).unwrap();
        assert_eq!(route.nodes, vec![n[2]]);
        assert_eq!(route.cost, 0.0);
        assert_eq!(find_safest_path(&g, n[2], n[2], QueryTime::Hour(12)), vec![n[2]]);
    }

    #[test]
    fn disconnected_components_give_empty_paths() {
        let (g, n) = network();
        assert!(find_fastest_path(&g, n[0], n[6]).is_empty());
        assert!(find_safest_path(&g, n[0], n[6], QueryTime::Hour(23)).is_empty());
    }

    #[test]
    fn unknown_node_ids_give_no_route() {
        let (g, n) = network();
        assert!(fastest_route(&g, n[0], NodeId::new(999)).is_none());
    }

    /// Direct risky a-b edge next to a lit two-edge detour through c.
    fn detour() -> (StreetGraph, NodeId, NodeId, NodeId) {
        let a = Coordinate::new(49.280, -123.120);
        let b = Coordinate::new(49.281, -123.120);
        let c = Coordinate::new(49.2805, -123.119);
        let risky = StreetSegment::new(
            "direct",
            vec![a, b],
            Some(0.11),
            Scores { crime: 9.0, light: 2.0, ..Scores::default() },
        )
        .unwrap();
        let safe = |id: &str, x, y| {
            StreetSegment::new(
                id,
                vec![x, y],
                Some(0.08),
                Scores { infra: 9.0, light: 10.0, crime: 1.0, amenity: 8.0, disruption: 0.0 },
            )
            .unwrap()
        };
        let g = StreetGraph::build(vec![risky, safe("ac", a, c), safe("cb", c, b)]);
        let (na, nb, nc) = (g.node_at(a).unwrap(), g.node_at(b).unwrap(), g.node_at(c).unwrap());
        (g, na, nb, nc)
    }

    #[test]
    fn safest_avoids_high_crime_at_night() {
        let (g, na, nb, nc) = detour();
        assert_eq!(find_fastest_path(&g, na, nb), vec![na, nb]);
        assert_eq!(find_safest_path(&g, na, nb, QueryTime::Hour(22)), vec![na, nc, nb]);
    }

    #[test]
    fn find_safest_path_uses_the_default_window() {
        let (g, na, nb, _) = detour();
        let late_summer = DaylightWindow {
            day_start_hour: 6,
            day_end_hour: 21,
        };
        let hour = QueryTime::Hour(20);
        assert_eq!(late_summer.profile(hour), WeightProfile::DAY);

        let night = safest_route(&g, na, nb, &WeightProfile::NIGHT).unwrap();
        assert_eq!(find_safest_path(&g, na, nb, hour), night.nodes);

        let configured = safest_route(&g, na, nb, &late_summer.profile(hour)).unwrap();
        let day = safest_route(&g, na, nb, &WeightProfile::DAY).unwrap();
        assert_eq!(configured.nodes, day.nodes);
    }
}
