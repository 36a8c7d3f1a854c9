//! Road network port and the in-memory reference graph.
//!
//! The coordinator only ever talks to the road network through
//! [`RoadNetworkPort`], so any graph service (OSM-backed, remote, scripted)
//! can be plugged in. [`RoadGraph`] is a small self-contained implementation
//! used by the binary and the tests.

mod graph;
mod loader;

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::geo::GeoPoint;

pub use graph::{RoadGraph, RoadGraphBuilder};
pub use loader::load_csv;

/// Dense road node identifier, valid in `0..node_count()`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "N{}", self.0)
    }
}

/// One point along a path: the road node and its coordinate.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct Waypoint {
    pub node: NodeId,
    pub position: GeoPoint,
}

/// The graph has no route between the requested nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no path from {from} to {to}")]
pub struct NoPathFound {
    pub from: NodeId,
    pub to: NodeId,
}

/// Errors raised while building or loading a road graph.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("edge references unknown node {0}")]
    UnknownNode(u32),

    #[error("node ids must be dense and ordered: expected {expected}, found {found}")]
    NodeOrder { expected: u32, found: u32 },

    #[error("grid must have at least one row and one column")]
    EmptyGrid,

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// Synchronous road network queries consumed by the coordinator.
///
/// Implementations must always terminate. A missing route is reported as
/// [`NoPathFound`], which callers treat as a normal outcome.
pub trait RoadNetworkPort {
    /// Nearest road node to `at`. `None` only when the graph has no nodes.
    fn nearest_node(&self, at: GeoPoint) -> Option<NodeId>;

    /// Ordered waypoints from `from` to `to`, both inclusive.
    ///
    /// `from == to` yields a single-waypoint path.
    fn shortest_path(&self, from: NodeId, to: NodeId) -> Result<Vec<Waypoint>, NoPathFound>;

    /// Number of nodes; node ids are `0..node_count()`.
    fn node_count(&self) -> usize;

    /// Coordinate of `node`, if it exists.
    fn node_position(&self, node: NodeId) -> Option<GeoPoint>;
}

impl<T: RoadNetworkPort + ?Sized> RoadNetworkPort for &T {
    fn nearest_node(&self, at: GeoPoint) -> Option<NodeId> {
        (**self).nearest_node(at)
    }

    fn shortest_path(&self, from: NodeId, to: NodeId) -> Result<Vec<Waypoint>, NoPathFound> {
        (**self).shortest_path(from, to)
    }

    fn node_count(&self) -> usize {
        (**self).node_count()
    }

    fn node_position(&self, node: NodeId) -> Option<GeoPoint> {
        (**self).node_position(node)
    }
}
