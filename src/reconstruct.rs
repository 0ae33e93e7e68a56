//! Turning node paths back into polylines.

use itertools::Itertools;
use serde::Serialize;

use crate::coord::Coordinate;
use crate::graph::{NodeId, StreetEdge, StreetGraph};
use crate::pathfinding::Route;
use crate::safety::WeightProfile;

/// Gaps below this (metres) at the path end are closed by snapping, not by an extra point.
const END_SNAP_TOLERANCE_M: f64 = 0.5;

/// Polyline for a node path.
///
/// Where several edges connect a hop, the shortest one is followed.
pub fn path_to_coordinates(path: &[NodeId], graph: &StreetGraph) -> Vec<Coordinate> {
    let hops = path.iter().tuple_windows().map(|(&a, &b)| {
        let edge = graph
            .edges_between(a, b)
            .map(|(_, e)| e)
            .min_by(|x, y| x.distance_km.total_cmp(&y.distance_km));
        (a, b, edge)
    });
    assemble(graph, path, hops)
}

/// Polyline for a [`Route`], following exactly the edges it took.
pub fn route_to_coordinates(route: &Route, graph: &StreetGraph) -> Vec<Coordinate> {
    let hops = route
        .nodes
        .iter()
        .tuple_windows()
        .enumerate()
        .map(|(i, (&a, &b))| {
            let edge = route.edges.get(i).and_then(|&e| graph.edge(e));
            (a, b, edge)
        });
    assemble(graph, &route.nodes, hops)
}

fn assemble<'g, I>(graph: &'g StreetGraph, path: &[NodeId], hops: I) -> Vec<Coordinate>
where
    I: Iterator<Item = (NodeId, NodeId, Option<&'g StreetEdge>)>,
{
    let coords: Vec<Coordinate> = path.iter().filter_map(|&n| graph.coordinate(n)).collect();
    if coords.len() != path.len() || coords.is_empty() {
        return Vec::new();
    }
    if coords.len() == 1 {
        return coords;
    }

    let mut out: Vec<Coordinate> = Vec::new();
    for (a, b, edge) in hops {
        let (Some(from), Some(to)) = (graph.coordinate(a), graph.coordinate(b)) else {
            continue;
        };
        let piece: Vec<Coordinate> = match edge {
            Some(edge) => {
                let seg = &edge.segment;
                if seg.start.distance_m(from) <= seg.end.distance_m(from) {
                    seg.coordinates.clone()
                } else {
                    seg.coordinates.iter().rev().copied().collect()
                }
            }
            None => vec![from, to],
        };
        let skip = usize::from(!out.is_empty());
        out.extend(piece.into_iter().skip(skip));
    }

    if let Some(first) = out.first_mut() {
        *first = coords[0];
    }
    let target = coords[coords.len() - 1];
    let gap = match out.last_mut() {
        Some(last) if *last == target => false,
        Some(last) if last.distance_m(target) < END_SNAP_TOLERANCE_M => {
            *last = target;
            false
        }
        _ => true,
    };
    if gap {
        out.push(target);
    }
    out
}

/// Replace the first and last polyline points with the caller's query points.
pub fn pin_endpoints(coords: &mut [Coordinate], origin: Coordinate, destination: Coordinate) {
    if let Some(first) = coords.first_mut() {
        *first = origin;
    }
    if let Some(last) = coords.last_mut() {
        *last = destination;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSummary {
    pub distance_km: f64,
    /// Length-weighted safety score under the query's weight profile.
    pub average_safety: f64,
    /// Street names in travel order, consecutive repeats collapsed.
    pub street_names: Vec<String>,
}

pub fn summarize(route: &Route, graph: &StreetGraph, profile: &WeightProfile) -> RouteSummary {
    let edges: Vec<&StreetEdge> = route.edges.iter().filter_map(|&e| graph.edge(e)).collect();

    let distance_km: f64 = edges.iter().map(|e| e.distance_km).sum();
    let average_safety = if edges.is_empty() {
        0.0
    } else if distance_km > 0.0 {
        edges
            .iter()
            .map(|e| profile.safety_score(&e.segment.scores) * e.distance_km)
            .sum::<f64>()
            / distance_km
    } else {
        edges
            .iter()
            .map(|e| profile.safety_score(&e.segment.scores))
            .sum::<f64>()
            / edges.len() as f64
    };
    let street_names = edges
        .iter()
        .map(|e| e.segment.street_name.as_str())
        .filter(|name| !name.is_empty())
        .dedup()
        .map(str::to_string)
        .collect();

    RouteSummary {
        distance_km,
        average_safety,
        street_names,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pathfinding::{fastest_route, safest_route};
    use crate::segment::{Scores, StreetSegment};

    fn c(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon)
    }

    /// a -> b drawn forwards with a bend, c -> b drawn backwards.
    fn bent() -> StreetGraph {
        let ab = StreetSegment::new(
            "ab",
            vec![c(49.280, -123.120), c(49.2805, -123.1195), c(49.281, -123.120)],
            None,
            Scores::default(),
        )
        .unwrap()
        .with_street_name("Main St");
        let cb = StreetSegment::new(
            "cb",
            vec![c(49.282, -123.120), c(49.2815, -123.1205), c(49.281, -123.120)],
            None,
            Scores::default(),
        )
        .unwrap()
        .with_street_name("Oak St");
        StreetGraph::build(vec![ab, cb])
    }

    #[test]
    fn two_node_path_starts_and_ends_on_nodes() {
        let g = bent();
        let a = g.node_at(c(49.280, -123.120)).unwrap();
        let b = g.node_at(c(49.281, -123.120)).unwrap();
        let coords = path_to_coordinates(&[a, b], &g);
        assert_eq!(coords.first(), g.coordinate(a).as_ref());
        assert_eq!(coords.last(), g.coordinate(b).as_ref());
        assert_eq!(coords.len(), 3);
    }

    #[test]
    fn reverses_segments_drawn_against_travel() {
        let g = bent();
        let a = g.node_at(c(49.280, -123.120)).unwrap();
        let b = g.node_at(c(49.281, -123.120)).unwrap();
        let cc = g.node_at(c(49.282, -123.120)).unwrap();
        let coords = path_to_coordinates(&[a, b, cc], &g);
        assert_eq!(
            coords,
            vec![
                c(49.280, -123.120),
                c(49.2805, -123.1195),
                c(49.281, -123.120),
                c(49.2815, -123.1205),
                c(49.282, -123.120),
            ]
        );
    }

    #[test]
    fn missing_edge_falls_back_to_straight_connector() {
        let g = bent();
        let a = g.node_at(c(49.280, -123.120)).unwrap();
        let cc = g.node_at(c(49.282, -123.120)).unwrap();
        let coords = path_to_coordinates(&[a, cc], &g);
        assert_eq!(coords, vec![c(49.280, -123.120), c(49.282, -123.120)]);
    }

    #[test]
    fn single_and_empty_paths() {
        let g = bent();
        let a = g.node_at(c(49.280, -123.120)).unwrap();
        assert_eq!(path_to_coordinates(&[a], &g), vec![c(49.280, -123.120)]);
        assert!(path_to_coordinates(&[], &g).is_empty());
    }

    #[test]
    fn route_follows_the_chosen_parallel_edge() {
        let a = c(49.280, -123.120);
        let b = c(49.281, -123.120);
        let risky = Scores {
            crime: 9.0,
            ..Scores::default()
        };
        let short = StreetSegment::new("short", vec![a, b], Some(0.1), risky).unwrap();
        let long = StreetSegment::new(
            "long",
            vec![a, c(49.2805, -123.119), b],
            Some(0.2),
            Scores { infra: 9.0, light: 9.0, crime: 1.0, amenity: 8.0, disruption: 0.0 },
        )
        .unwrap();
        let g = StreetGraph::build(vec![short, long]);
        let (na, nb) = (g.node_at(a).unwrap(), g.node_at(b).unwrap());

        let fast = fastest_route(&g, na, nb).unwrap();
        assert_eq!(route_to_coordinates(&fast, &g).len(), 2);

        let safe = safest_route(&g, na, nb, &WeightProfile::NIGHT).unwrap();
        assert_eq!(route_to_coordinates(&safe, &g).len(), 3);
    }

    #[test]
    fn summary_and_pinning() {
        let g = bent();
        let a = g.node_at(c(49.280, -123.120)).unwrap();
        let cc = g.node_at(c(49.282, -123.120)).unwrap();
        let route = fastest_route(&g, a, cc).unwrap();
        let summary = summarize(&route, &g, &WeightProfile::DAY);
        assert_eq!(summary.street_names, vec!["Main St", "Oak St"]);
        assert!((summary.distance_km - route.cost).abs() < 1e-12);
        let expected = WeightProfile::DAY.safety_score(&Scores::default());
        assert!((summary.average_safety - expected).abs() < 1e-9);

        let mut coords = route_to_coordinates(&route, &g);
        let origin = c(49.2799, -123.1201);
        let destination = c(49.2821, -123.1199);
        pin_endpoints(&mut coords, origin, destination);
        assert_eq!(coords.first(), Some(&origin));
        assert_eq!(coords.last(), Some(&destination));
    }
}
