//! In-memory road graph with Dijkstra routing and an R-tree node index.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;

use rstar::{AABB, PointDistance, RTree, RTreeObject};

use super::{NetworkError, NoPathFound, NodeId, RoadNetworkPort, Waypoint};
use crate::geo::GeoPoint;

/// Entry stored in the spatial index: `[lat, lon]` plus the node it names.
#[derive(Clone, Debug)]
struct NodeEntry {
    point: [f64; 2],
    id: NodeId,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    /// Squared Euclidean distance in degree space; adequate for snapping
    /// within a city.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dlat = self.point[0] - point[0];
        let dlon = self.point[1] - point[1];
        dlat * dlat + dlon * dlon
    }
}

/// Undirected road graph. Edge cost is great-circle length.
///
/// Build with [`RoadGraphBuilder`] or [`RoadGraph::grid`].
pub struct RoadGraph {
    node_pos: Vec<GeoPoint>,
    /// Outgoing `(neighbor, cost_mm)` per node, sorted by neighbor.
    adjacency: Vec<Vec<(NodeId, u64)>>,
    spatial_idx: RTree<NodeEntry>,
}

impl RoadGraph {
    /// A graph with no nodes. Every query against it fails softly.
    pub fn empty() -> Self {
        RoadGraphBuilder::new().build()
    }

    /// Rectangular street grid centered on `center`.
    ///
    /// Nodes are laid out row-major, `rows × cols`, `spacing_km` apart, with
    /// roads between horizontal and vertical neighbours.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::EmptyGrid`] if `rows` or `cols` is zero.
    pub fn grid(
        center: GeoPoint,
        rows: usize,
        cols: usize,
        spacing_km: f64,
    ) -> Result<Self, NetworkError> {
        if rows == 0 || cols == 0 {
            return Err(NetworkError::EmptyGrid);
        }
        let half_h = (rows - 1) as f64 * spacing_km / 2.0;
        let half_w = (cols - 1) as f64 * spacing_km / 2.0;
        let origin = center.offset_km(-half_h, -half_w);

        let mut b = RoadGraphBuilder::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                b.add_node(origin.offset_km(r as f64 * spacing_km, c as f64 * spacing_km));
            }
        }
        let id = |r: usize, c: usize| NodeId((r * cols + c) as u32);
        for r in 0..rows {
            for c in 0..cols {
                if c + 1 < cols {
                    b.add_road(id(r, c), id(r, c + 1))?;
                }
                if r + 1 < rows {
                    b.add_road(id(r, c), id(r + 1, c))?;
                }
            }
        }
        Ok(b.build())
    }

    pub fn is_empty(&self) -> bool {
        self.node_pos.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum()
    }

    fn waypoint(&self, node: NodeId) -> Waypoint {
        Waypoint {
            node,
            position: self.node_pos[node.index()],
        }
    }

    fn dijkstra(&self, from: NodeId, to: NodeId) -> Result<Vec<Waypoint>, NoPathFound> {
        let n = self.node_pos.len();
        if from.index() >= n || to.index() >= n {
            return Err(NoPathFound { from, to });
        }
        if from == to {
            return Ok(vec![self.waypoint(from)]);
        }

        let mut dist = vec![u64::MAX; n];
        let mut prev: Vec<Option<NodeId>> = vec![None; n];
        dist[from.index()] = 0;

        // (cost, node) min-heap; NodeId breaks ties deterministically.
        let mut heap: BinaryHeap<Reverse<(u64, NodeId)>> = BinaryHeap::new();
        heap.push(Reverse((0, from)));

        while let Some(Reverse((cost, node))) = heap.pop() {
            if node == to {
                return Ok(self.reconstruct(&prev, to));
            }
            if cost > dist[node.index()] {
                continue;
            }
            for &(neighbor, edge_cost) in &self.adjacency[node.index()] {
                let next = cost.saturating_add(edge_cost);
                if next < dist[neighbor.index()] {
                    dist[neighbor.index()] = next;
                    prev[neighbor.index()] = Some(node);
                    heap.push(Reverse((next, neighbor)));
                }
            }
        }

        Err(NoPathFound { from, to })
    }

    fn reconstruct(&self, prev: &[Option<NodeId>], to: NodeId) -> Vec<Waypoint> {
        let mut nodes = vec![to];
        let mut cur = to;
        while let Some(p) = prev[cur.index()] {
            nodes.push(p);
            cur = p;
        }
        nodes.reverse();
        nodes.into_iter().map(|n| self.waypoint(n)).collect()
    }
}

impl fmt::Debug for RoadGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoadGraph")
            .field("nodes", &self.node_pos.len())
            .field("edges", &self.edge_count())
            .finish()
    }
}

impl RoadNetworkPort for RoadGraph {
    fn nearest_node(&self, at: GeoPoint) -> Option<NodeId> {
        self.spatial_idx
            .nearest_neighbor(&[at.lat, at.lon])
            .map(|e| e.id)
    }

    fn shortest_path(&self, from: NodeId, to: NodeId) -> Result<Vec<Waypoint>, NoPathFound> {
        self.dijkstra(from, to)
    }

    fn node_count(&self) -> usize {
        self.node_pos.len()
    }

    fn node_position(&self, node: NodeId) -> Option<GeoPoint> {
        self.node_pos.get(node.index()).copied()
    }
}

/// Incremental [`RoadGraph`] construction.
///
/// # Example
///
/// ```
/// use fleet_charge_sim::geo::GeoPoint;
/// use fleet_charge_sim::network::{RoadGraphBuilder, RoadNetworkPort};
///
/// let mut b = RoadGraphBuilder::new();
/// let a = b.add_node(GeoPoint::new(51.750, -1.258));
/// let c = b.add_node(GeoPoint::new(51.755, -1.258));
/// b.add_road(a, c).unwrap();
/// let graph = b.build();
/// assert_eq!(graph.node_count(), 2);
/// assert_eq!(graph.shortest_path(a, c).unwrap().len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct RoadGraphBuilder {
    nodes: Vec<GeoPoint>,
    adjacency: Vec<Vec<(NodeId, u64)>>,
}

impl RoadGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(nodes: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(nodes),
            adjacency: Vec::with_capacity(nodes),
        }
    }

    /// Adds a node and returns its id (ids are assigned densely from 0).
    pub fn add_node(&mut self, pos: GeoPoint) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(pos);
        self.adjacency.push(Vec::new());
        id
    }

    /// Adds a bidirectional road whose cost is the great-circle length.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::UnknownNode`] if either endpoint was not added.
    pub fn add_road(&mut self, a: NodeId, b: NodeId) -> Result<(), NetworkError> {
        let pa = *self
            .nodes
            .get(a.index())
            .ok_or(NetworkError::UnknownNode(a.0))?;
        let pb = *self
            .nodes
            .get(b.index())
            .ok_or(NetworkError::UnknownNode(b.0))?;
        let cost_mm = (pa.distance_km(pb) * 1_000_000.0).round() as u64;
        self.adjacency[a.index()].push((b, cost_mm));
        self.adjacency[b.index()].push((a, cost_mm));
        Ok(())
    }

    pub fn build(mut self) -> RoadGraph {
        for edges in &mut self.adjacency {
            edges.sort_unstable();
            edges.dedup_by_key(|(n, _)| *n);
        }
        let entries = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, p)| NodeEntry {
                point: [p.lat, p.lon],
                id: NodeId(i as u32),
            })
            .collect();
        RoadGraph {
            node_pos: self.nodes,
            adjacency: self.adjacency,
            spatial_idx: RTree::bulk_load(entries),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::energy::path_distance_km;

    fn center() -> GeoPoint {
        GeoPoint::new(51.752, -1.2577)
    }

    #[test]
    fn empty_graph_has_no_nearest_node() {
        let g = RoadGraph::empty();
        assert!(g.is_empty());
        assert_eq!(g.nearest_node(center()), None);
        assert!(g.shortest_path(NodeId(0), NodeId(1)).is_err());
    }

    #[test]
    fn grid_dimensions() {
        let g = RoadGraph::grid(center(), 3, 4, 0.5).unwrap();
        assert_eq!(g.node_count(), 12);
        // 3 rows * 3 horizontal + 2 * 4 vertical = 17 roads, both directions
        assert_eq!(g.edge_count(), 34);
    }

    #[test]
    fn zero_sized_grid_is_rejected() {
        assert!(matches!(
            RoadGraph::grid(center(), 0, 4, 0.5),
            Err(NetworkError::EmptyGrid)
        ));
    }

    #[test]
    fn shortest_path_on_grid_is_manhattan() {
        let g = RoadGraph::grid(center(), 3, 3, 1.0).unwrap();
        let path = g.shortest_path(NodeId(0), NodeId(8)).unwrap();
        assert_eq!(path.len(), 5);
        assert_eq!(path.first().map(|w| w.node), Some(NodeId(0)));
        assert_eq!(path.last().map(|w| w.node), Some(NodeId(8)));
        let km = path_distance_km(path.iter().map(|w| w.position));
        assert!((km - 4.0).abs() < 0.01);
    }

    #[test]
    fn path_to_self_is_single_waypoint() {
        let g = RoadGraph::grid(center(), 2, 2, 1.0).unwrap();
        let path = g.shortest_path(NodeId(3), NodeId(3)).unwrap();
        assert_eq!(path.len(), 1);
    }

    #[test]
    fn disconnected_nodes_report_no_path() {
        let mut b = RoadGraphBuilder::new();
        let a = b.add_node(center());
        let c = b.add_node(center().offset_km(1.0, 0.0));
        let g = b.build();
        assert_eq!(g.shortest_path(a, c), Err(NoPathFound { from: a, to: c }));
    }

    #[test]
    fn unknown_endpoint_is_rejected() {
        let mut b = RoadGraphBuilder::new();
        let a = b.add_node(center());
        assert!(matches!(
            b.add_road(a, NodeId(7)),
            Err(NetworkError::UnknownNode(7))
        ));
    }

    #[test]
    fn nearest_node_snaps_to_closest() {
        let g = RoadGraph::grid(center(), 3, 3, 1.0).unwrap();
        let near_corner = g.node_position(NodeId(8)).unwrap().offset_km(0.1, 0.1);
        assert_eq!(g.nearest_node(near_corner), Some(NodeId(8)));
    }

    #[test]
    fn routing_is_deterministic() {
        let g = RoadGraph::grid(center(), 4, 4, 0.5).unwrap();
        let a = g.shortest_path(NodeId(0), NodeId(15)).unwrap();
        let b = g.shortest_path(NodeId(0), NodeId(15)).unwrap();
        assert_eq!(a, b);
    }
}
