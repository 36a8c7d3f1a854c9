//! CSV road-network loader.
//!
//! Two files describe a network:
//!
//! ```text
//! nodes.csv: id,lat,lon      (ids dense, in order, starting at 0)
//! edges.csv: from,to         (bidirectional roads)
//! ```

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use super::{NetworkError, NodeId, RoadGraph, RoadGraphBuilder};
use crate::geo::GeoPoint;

#[derive(Debug, Deserialize)]
struct NodeRow {
    id: u32,
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct EdgeRow {
    from: u32,
    to: u32,
}

/// Loads a road graph from node and edge CSV files.
///
/// # Errors
///
/// Returns [`NetworkError`] if a file cannot be read or parsed, node ids are
/// not dense, or an edge references an unknown node.
pub fn load_csv(nodes_path: &Path, edges_path: &Path) -> Result<RoadGraph, NetworkError> {
    let nodes = csv::Reader::from_path(nodes_path)?;
    let edges = csv::Reader::from_path(edges_path)?;
    build_from_readers(nodes, edges)
}

pub(crate) fn build_from_readers<N: Read, E: Read>(
    mut nodes: csv::Reader<N>,
    mut edges: csv::Reader<E>,
) -> Result<RoadGraph, NetworkError> {
    let mut b = RoadGraphBuilder::new();
    for (expected, row) in nodes.deserialize::<NodeRow>().enumerate() {
        let row = row?;
        if row.id != expected as u32 {
            return Err(NetworkError::NodeOrder {
                expected: expected as u32,
                found: row.id,
            });
        }
        b.add_node(GeoPoint::new(row.lat, row.lon));
    }
    for row in edges.deserialize::<EdgeRow>() {
        let row = row?;
        b.add_road(NodeId(row.from), NodeId(row.to))?;
    }
    Ok(b.build())
}
