//! Owned routing context and the single-flight graph cache.

use std::future::Future;
use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::info;

use crate::coord::Coordinate;
use crate::error::{Result, RoutingError};
use crate::graph::{NodeId, StreetGraph};
use crate::locator::NodeLocator;
use crate::pathfinding::{self, Route};
use crate::reconstruct::{self, RouteSummary};
use crate::safety::{DayNight, DaylightWindow, QueryTime, WeightProfile};
use crate::segment::StreetSegment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteMode {
    Fastest,
    #[default]
    Safest,
}

/// A computed route, ready for the serving layer.
#[derive(Debug, Clone)]
pub struct PlannedRoute {
    pub route: Route,
    /// Starts at the query origin and ends at the query destination.
    pub coordinates: Vec<Coordinate>,
    pub summary: RouteSummary,
    pub regime: DayNight,
}

/// Everything queries need, built once and read-only afterwards.
pub struct RoutingContext {
    pub graph: StreetGraph,
    locator: NodeLocator,
    daylight: DaylightWindow,
}

impl RoutingContext {
    pub fn new(segments: Vec<StreetSegment>, daylight: DaylightWindow) -> Self {
        let graph = StreetGraph::build(segments);
        let locator = NodeLocator::new(&graph);
        Self {
            graph,
            locator,
            daylight,
        }
    }

    /// The node recorded at `coord` if there is one, else the nearest by distance.
    pub fn closest_node(&self, coord: Coordinate) -> Option<NodeId> {
        self.graph
            .node_at(coord)
            .or_else(|| self.locator.nearest(coord))
    }

    pub fn regime(&self, time: QueryTime) -> DayNight {
        self.daylight.regime(time)
    }

    /// Snap both endpoints, search, and rebuild the polyline.
    ///
    /// `Ok(None)` means the destination is unreachable from the origin.
    pub fn plan(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        mode: RouteMode,
        time: QueryTime,
    ) -> Result<Option<PlannedRoute>> {
        let start = self.closest_node(origin).ok_or(RoutingError::NoNearbyNodes)?;
        let end = self
            .closest_node(destination)
            .ok_or(RoutingError::NoNearbyNodes)?;

        let regime = self.daylight.regime(time);
        let profile = WeightProfile::for_regime(regime);
        let route = match mode {
            RouteMode::Fastest => pathfinding::fastest_route(&self.graph, start, end),
            RouteMode::Safest => pathfinding::safest_route(&self.graph, start, end, &profile),
        };
        let Some(route) = route else {
            return Ok(None);
        };

        let mut coordinates = reconstruct::route_to_coordinates(&route, &self.graph);
        reconstruct::pin_endpoints(&mut coordinates, origin, destination);
        let summary = reconstruct::summarize(&route, &self.graph, &profile);

        Ok(Some(PlannedRoute {
            route,
            coordinates,
            summary,
            regime,
        }))
    }
}

/// Builds the [`RoutingContext`] at most once.
///
/// Callers arriving while a build is in flight wait for that build instead of
/// starting another. A failed build leaves the cache empty so a later call can
/// retry.
#[derive(Default)]
pub struct GraphCache {
    cell: OnceCell<Arc<RoutingContext>>,
}

impl GraphCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<Arc<RoutingContext>> {
        self.cell.get().cloned()
    }

    pub async fn get_or_build<F, Fut>(&self, build: F) -> Result<Arc<RoutingContext>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<RoutingContext>>,
    {
        self.cell
            .get_or_try_init(|| async move {
                let context = build().await?;
                info!(
                    "Routing context ready: {} nodes, {} edges",
                    context.graph.node_count(),
                    context.graph.edge_count()
                );
                Ok::<_, RoutingError>(Arc::new(context))
            })
            .await
            .cloned()
    }

    /// Build from a blocking segment loader on the blocking thread pool.
    pub async fn get_or_load<F>(
        &self,
        load: F,
        daylight: DaylightWindow,
    ) -> Result<Arc<RoutingContext>>
    where
        F: FnOnce() -> Result<Vec<StreetSegment>> + Send + 'static,
    {
        self.get_or_build(|| async move {
            tokio::task::spawn_blocking(move || -> Result<RoutingContext> {
                let segments = load()?;
                Ok(RoutingContext::new(segments, daylight))
            })
            .await
            .map_err(|e| RoutingError::GraphBuild(e.to_string()))?
        })
        .await
    }
}
