//! Safety-aware street routing.
//!
//! Street segments come in already parsed, get their scores enriched from
//! auxiliary condition and lighting datasets, and are folded into an
//! undirected street graph. Queries snap coordinates to graph nodes, search
//! either the shortest or the safety-weighted path, and rebuild the result as
//! a polyline.
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`geometry`]    | embedded GeoJSON → (lat, lon) sequences               |
//! | [`enrichment`]  | grid-bucket joins of condition and lighting data      |
//! | [`graph`]       | `StreetGraph` construction, full-scan nearest node    |
//! | [`locator`]     | R-tree nearest node                                   |
//! | [`safety`]      | day/night regimes, weight profiles, safety cost       |
//! | [`pathfinding`] | generic Dijkstra, fastest and safest variants         |
//! | [`reconstruct`] | node paths → polylines, route summaries               |
//! | [`context`]     | `RoutingContext`, single-flight `GraphCache`          |

pub mod config;
pub mod context;
pub mod coord;
pub mod enrichment;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod loader;
pub mod locator;
pub mod logging;
pub mod pathfinding;
pub mod reconstruct;
pub mod safety;
pub mod segment;

pub use context::{GraphCache, PlannedRoute, RouteMode, RoutingContext};
pub use coord::Coordinate;
pub use error::{Result, RoutingError};
pub use graph::{NodeId, StreetEdge, StreetGraph};
pub use pathfinding::{Route, find_fastest_path, find_safest_path};
pub use reconstruct::path_to_coordinates;
pub use safety::{DayNight, DaylightWindow, QueryTime, WeightProfile};
pub use segment::{Scores, StreetSegment};

pub fn build_graph<I>(segments: I) -> StreetGraph
where
    I: IntoIterator<Item = StreetSegment>,
{
    StreetGraph::build(segments)
}

/// Nearest node to `coord`, `None` for an empty graph.
pub fn find_closest_node(coord: Coordinate, graph: &StreetGraph) -> Option<NodeId> {
    graph.find_nearest_node(coord)
}
