//! Structures and their thresholded connectivity.
//!
//! Adjacency is derived once at construction: `i -> j` is a valid connection
//! when `weight(i, j) >= highest_value * threshold_percentage`. Rows are
//! scanned left to right, so every adjacency list is in ascending order.
//! The diagonal is not special: a heavy enough self-weight makes a node its
//! own neighbour.

use log::debug;
use serde::{Deserialize, Serialize};

use super::error::GraphError;

/// One anatomical structure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
	index: usize,
	/// Display name.
	pub name: String,
	/// Free text, may span several lines.
	pub description: String,
}

impl Node {
	/// Stable index in the atlas.
	pub fn index(&self) -> usize {
		self.index
	}
}

/// Square matrix of non-negative connection weights.
#[derive(Clone, Debug, PartialEq)]
pub struct ConnectivityMatrix {
	dim: usize,
	weights: Vec<f64>,
}

impl ConnectivityMatrix {
	/// Validate rows read from a dataset.
	pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, GraphError> {
		let dim = rows.len();
		let mut weights = Vec::with_capacity(dim * dim);
		for (row, values) in rows.into_iter().enumerate() {
			if values.len() != dim {
				return Err(GraphError::NotSquare {
					row,
					expected: dim,
					found: values.len(),
				});
			}
			for (column, value) in values.into_iter().enumerate() {
				if !value.is_finite() || value < 0.0 {
					return Err(GraphError::InvalidWeight { row, column, value });
				}
				weights.push(value);
			}
		}
		Ok(Self { dim, weights })
	}

	/// Rows (and columns).
	pub fn dim(&self) -> usize {
		self.dim
	}

	/// Weight from `i` to `j`.
	pub fn weight(&self, i: usize, j: usize) -> Option<f64> {
		(i < self.dim && j < self.dim).then(|| self.weights[i * self.dim + j])
	}

	/// Row `i` as a slice.
	pub fn row(&self, i: usize) -> &[f64] {
		&self.weights[i * self.dim..(i + 1) * self.dim]
	}

	/// Largest weight, `0.0` for an empty matrix.
	pub fn max_weight(&self) -> f64 {
		self.weights.iter().copied().fold(0.0, f64::max)
	}
}

/// Node arena plus fixed, thresholded adjacency.
#[derive(Clone, Debug)]
pub struct AtlasGraph {
	nodes: Vec<Node>,
	matrix: ConnectivityMatrix,
	threshold: f64,
	valid_connections: Vec<Vec<usize>>,
}

impl AtlasGraph {
	/// Assign indices in load order and derive the valid connections.
	pub fn build(
		nodes: Vec<(String, String)>,
		matrix: ConnectivityMatrix,
		highest_value: f64,
		threshold_percentage: f64,
	) -> Result<Self, GraphError> {
		if nodes.len() != matrix.dim() {
			return Err(GraphError::NodeCountMismatch {
				nodes: nodes.len(),
				matrix: matrix.dim(),
			});
		}
		let nodes: Vec<Node> = nodes
			.into_iter()
			.enumerate()
			.map(|(index, (name, description))| Node {
				index,
				name,
				description,
			})
			.collect();

		let threshold = highest_value * threshold_percentage;
		let valid_connections: Vec<Vec<usize>> = (0..matrix.dim())
			.map(|i| {
				matrix
					.row(i)
					.iter()
					.enumerate()
					.filter(|&(_, &w)| w >= threshold)
					.map(|(j, _)| j)
					.collect()
			})
			.collect();

		let graph = Self {
			nodes,
			matrix,
			threshold,
			valid_connections,
		};
		debug!(
			"threshold {threshold} ({highest_value} x {threshold_percentage}): {} valid connections",
			graph.edge_count()
		);
		Ok(graph)
	}

	/// Number of nodes.
	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	/// Whether the atlas has no nodes.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// All nodes in index order.
	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	/// Node at `index`.
	pub fn node(&self, index: usize) -> Option<&Node> {
		self.nodes.get(index)
	}

	/// Index of `node` if it is one of this graph's nodes (identity, not equality).
	pub fn index_of(&self, node: &Node) -> Option<usize> {
		self.nodes.iter().position(|n| std::ptr::eq(n, node))
	}

	/// First node whose display name is `name`.
	pub fn find(&self, name: &str) -> Option<&Node> {
		self.nodes.iter().find(|n| n.name == name)
	}

	/// Valid connections of `index`, ascending.
	pub fn valid_connections(&self, index: usize) -> Option<&[usize]> {
		self.valid_connections.get(index).map(Vec::as_slice)
	}

	/// Position of `to` in the adjacency list of `from`.
	pub fn connection_slot(&self, from: usize, to: usize) -> Option<usize> {
		self.valid_connections
			.get(from)?
			.binary_search(&to)
			.ok()
	}

	/// Whether `from -> to` is a valid connection.
	pub fn is_connected(&self, from: usize, to: usize) -> bool {
		self.connection_slot(from, to).is_some()
	}

	/// Raw weight from the connectivity matrix.
	pub fn weight(&self, from: usize, to: usize) -> Option<f64> {
		self.matrix.weight(from, to)
	}

	/// The threshold weight the adjacency was derived with.
	pub fn threshold(&self) -> f64 {
		self.threshold
	}

	/// Total directed valid connections.
	pub fn edge_count(&self) -> usize {
		self.valid_connections.iter().map(Vec::len).sum()
	}

	/// Every adjacency list, indexed by node.
	pub fn adjacency(&self) -> &[Vec<usize>] {
		&self.valid_connections
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn named(n: usize) -> Vec<(String, String)> {
		(0..n).map(|i| (format!("N{i}"), String::new())).collect()
	}

	fn matrix(rows: &[&[f64]]) -> ConnectivityMatrix {
		ConnectivityMatrix::from_rows(rows.iter().map(|r| r.to_vec()).collect()).unwrap()
	}

	fn three_chain() -> AtlasGraph {
		let m = matrix(&[&[0.0, 5.0, 0.0], &[5.0, 0.0, 3.0], &[0.0, 3.0, 0.0]]);
		AtlasGraph::build(named(3), m, 5.0, 0.5).unwrap()
	}

	#[test]
	fn half_threshold_keeps_heavy_links() {
		let g = three_chain();
		assert_eq!(g.threshold(), 2.5);
		assert_eq!(g.adjacency(), &[vec![1], vec![0, 2], vec![1]]);
		assert_eq!(g.edge_count(), 4);
	}

	#[test]
	fn zero_threshold_connects_everything_including_self() {
		let m = matrix(&[&[0.0, 5.0, 0.0], &[5.0, 0.0, 3.0], &[0.0, 3.0, 0.0]]);
		let g = AtlasGraph::build(named(3), m, 5.0, 0.0).unwrap();
		for i in 0..3 {
			assert_eq!(g.valid_connections(i).unwrap(), &[0, 1, 2]);
		}
		// self-loops survive the threshold
		assert!(g.is_connected(1, 1));
	}

	#[test]
	fn full_threshold_keeps_only_the_maximum() {
		let m = matrix(&[&[0.0, 5.0, 0.0], &[5.0, 0.0, 3.0], &[0.0, 3.0, 0.0]]);
		let g = AtlasGraph::build(named(3), m, 5.0, 1.0).unwrap();
		assert_eq!(g.adjacency(), &[vec![1], vec![0], vec![]]);
	}

	#[test]
	fn heavy_diagonal_is_a_self_loop() {
		let m = matrix(&[&[4.0, 1.0], &[1.0, 0.0]]);
		let g = AtlasGraph::build(named(2), m, 4.0, 0.5).unwrap();
		assert_eq!(g.valid_connections(0).unwrap(), &[0]);
		assert_eq!(g.connection_slot(0, 0), Some(0));
	}

	#[test]
	fn asymmetric_weights_give_directed_edges() {
		let m = matrix(&[&[0.0, 3.0], &[1.0, 0.0]]);
		let g = AtlasGraph::build(named(2), m, 3.0, 0.5).unwrap();
		assert!(g.is_connected(0, 1));
		assert!(!g.is_connected(1, 0));
	}

	#[test]
	fn ragged_matrix_is_rejected() {
		let err = ConnectivityMatrix::from_rows(vec![vec![0.0, 1.0], vec![1.0]]).unwrap_err();
		assert_eq!(
			err,
			GraphError::NotSquare {
				row: 1,
				expected: 2,
				found: 1
			}
		);
	}

	#[test]
	fn negative_weight_is_rejected() {
		let err = ConnectivityMatrix::from_rows(vec![vec![-1.0]]).unwrap_err();
		assert!(matches!(err, GraphError::InvalidWeight { row: 0, column: 0, .. }));
	}

	#[test]
	fn node_count_must_match_matrix() {
		let m = matrix(&[&[0.0, 1.0], &[1.0, 0.0]]);
		let err = AtlasGraph::build(named(3), m, 1.0, 0.5).unwrap_err();
		assert_eq!(err, GraphError::NodeCountMismatch { nodes: 3, matrix: 2 });
	}

	#[test]
	fn lookups_miss_quietly() {
		let g = three_chain();
		assert_eq!(g.find("N2").map(Node::index), Some(2));
		assert!(g.find("nope").is_none());
		assert!(g.node(7).is_none());
		assert!(g.valid_connections(7).is_none());
		assert!(!g.is_connected(0, 2));
		assert!(!g.is_connected(9, 0));
	}

	#[test]
	fn index_of_uses_identity() {
		let g = three_chain();
		assert_eq!(g.index_of(&g.nodes()[2]), Some(2));
		let copy = g.nodes()[2].clone();
		assert_eq!(g.index_of(&copy), None);
	}
}
