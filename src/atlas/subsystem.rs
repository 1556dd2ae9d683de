//! Named, possibly overlapping groups of structures.
//!
//! Built in two steps: [`parse_subsystems`] turns membership rows into
//! [`PendingSubsystem`]s, then [`SubsystemRegistry::resolve`] binds them to a
//! finished [`AtlasGraph`]. Resolution consumes the pending values, so it can
//! only happen once.

use log::debug;
use serde::{Deserialize, Serialize};

use super::error::SubsystemError;
use super::graph::AtlasGraph;

/// Colors handed out to subsystems in registry order.
pub const PALETTE: &[&str] = &[
	"#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
	"#bcbd22", "#17becf",
];

/// A subsystem whose membership has been parsed but not bound to nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingSubsystem {
	name: String,
	description: String,
	color: String,
	membership: Vec<bool>,
}

impl PendingSubsystem {
	/// Display name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// One flag per node column.
	pub fn membership(&self) -> &[bool] {
		&self.membership
	}
}

/// A subsystem bound to the atlas.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Subsystem {
	index: usize,
	/// Display name.
	pub name: String,
	/// Free text.
	pub description: String,
	/// CSS color string.
	pub color: String,
	membership: Vec<bool>,
	valid_structures: Vec<usize>,
}

impl Subsystem {
	/// Position in the registry.
	pub fn index(&self) -> usize {
		self.index
	}

	/// Member node indices, ascending.
	pub fn valid_structures(&self) -> &[usize] {
		&self.valid_structures
	}

	/// Whether node `index` belongs to this subsystem.
	pub fn contains(&self, index: usize) -> bool {
		self.membership.get(index).copied().unwrap_or(false)
	}
}

/// One subsystem per row; a node is a member when its column is `> 0`.
pub fn parse_subsystems(
	names: Vec<String>,
	descriptions: Vec<String>,
	membership_rows: Vec<Vec<f64>>,
	palette: &[&str],
) -> Result<Vec<PendingSubsystem>, SubsystemError> {
	if descriptions.len() != names.len() {
		return Err(SubsystemError::CountMismatch {
			names: names.len(),
			other: descriptions.len(),
			what: "descriptions",
		});
	}
	if membership_rows.len() != names.len() {
		return Err(SubsystemError::CountMismatch {
			names: names.len(),
			other: membership_rows.len(),
			what: "membership rows",
		});
	}

	Ok(names
		.into_iter()
		.zip(descriptions)
		.zip(membership_rows)
		.enumerate()
		.map(|(i, ((name, description), row))| PendingSubsystem {
			name,
			description,
			color: palette
				.get(i % palette.len().max(1))
				.map_or_else(|| PALETTE[0].to_owned(), |c| (*c).to_owned()),
			membership: row.into_iter().map(|v| v > 0.0).collect(),
		})
		.collect())
}

/// The bound subsystems, in definition order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SubsystemRegistry {
	subsystems: Vec<Subsystem>,
}

impl SubsystemRegistry {
	/// Bind every pending subsystem to the nodes of `graph`.
	pub fn resolve(
		pending: Vec<PendingSubsystem>,
		graph: &AtlasGraph,
	) -> Result<Self, SubsystemError> {
		let subsystems = pending
			.into_iter()
			.enumerate()
			.map(|(index, p)| {
				if p.membership.len() != graph.len() {
					return Err(SubsystemError::MembershipLength {
						subsystem: p.name,
						found: p.membership.len(),
						nodes: graph.len(),
					});
				}
				let valid_structures: Vec<usize> = graph
					.nodes()
					.iter()
					.map(|n| n.index())
					.filter(|&i| p.membership[i])
					.collect();
				debug!("subsystem {:?}: {} structures", p.name, valid_structures.len());
				Ok(Subsystem {
					index,
					name: p.name,
					description: p.description,
					color: p.color,
					membership: p.membership,
					valid_structures,
				})
			})
			.collect::<Result<Vec<_>, _>>()?;
		Ok(Self { subsystems })
	}

	/// Number of subsystems.
	pub fn len(&self) -> usize {
		self.subsystems.len()
	}

	/// Whether no subsystems are defined.
	pub fn is_empty(&self) -> bool {
		self.subsystems.is_empty()
	}

	/// Subsystem at `index`.
	pub fn get(&self, index: usize) -> Option<&Subsystem> {
		self.subsystems.get(index)
	}

	/// All subsystems in registry order.
	pub fn iter(&self) -> impl Iterator<Item = &Subsystem> {
		self.subsystems.iter()
	}

	/// First subsystem named `name`.
	pub fn find(&self, name: &str) -> Option<&Subsystem> {
		self.subsystems.iter().find(|s| s.name == name)
	}

	/// Every subsystem containing `node`.
	pub fn subsystems_of(&self, node: usize) -> Vec<&Subsystem> {
		self.subsystems.iter().filter(|s| s.contains(node)).collect()
	}

	/// Every subsystem containing both `a` and `b`, in registry order.
	pub fn shared(&self, a: usize, b: usize) -> Vec<&Subsystem> {
		self.subsystems
			.iter()
			.filter(|s| s.contains(a) && s.contains(b))
			.collect()
	}
}

/// Free-text descriptions of node pairs, keyed `[from][to]`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionDescriptions {
	cells: Vec<Vec<String>>,
}

impl ConnectionDescriptions {
	/// Check the matrix is `node_count x node_count`.
	pub fn from_rows(rows: Vec<Vec<String>>, node_count: usize) -> Result<Self, SubsystemError> {
		if rows.len() != node_count {
			return Err(SubsystemError::DescriptionRows {
				expected: node_count,
				found: rows.len(),
			});
		}
		if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != node_count) {
			return Err(SubsystemError::DescriptionShape {
				row,
				expected: node_count,
				found: r.len(),
			});
		}
		Ok(Self { cells: rows })
	}

	/// Text for the ordered pair, if any.
	pub fn describe(&self, from: usize, to: usize) -> Option<&str> {
		self.cells
			.get(from)?
			.get(to)
			.map(String::as_str)
			.filter(|s| !s.trim().is_empty())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::atlas::graph::ConnectivityMatrix;

	fn graph(n: usize) -> AtlasGraph {
		let rows = vec![vec![1.0; n]; n];
		let nodes = (0..n).map(|i| (format!("N{i}"), String::new())).collect();
		AtlasGraph::build(nodes, ConnectivityMatrix::from_rows(rows).unwrap(), 1.0, 0.5).unwrap()
	}

	fn registry() -> SubsystemRegistry {
		let pending = parse_subsystems(
			vec!["Limbic".into(), "Motor".into(), "Visual".into()],
			vec![String::new(), String::new(), String::new()],
			vec![
				vec![1.0, 0.0, 1.0, 1.0],
				vec![0.0, 2.5, 1.0, 0.0],
				vec![0.0, 0.0, 0.0, -1.0],
			],
			PALETTE,
		)
		.unwrap();
		SubsystemRegistry::resolve(pending, &graph(4)).unwrap()
	}

	#[test]
	fn positive_values_are_members() {
		let r = registry();
		assert_eq!(r.get(0).unwrap().valid_structures(), &[0, 2, 3]);
		assert_eq!(r.get(1).unwrap().valid_structures(), &[1, 2]);
		assert!(r.get(2).unwrap().valid_structures().is_empty());
	}

	#[test]
	fn colors_cycle_through_palette() {
		let pending = parse_subsystems(
			vec!["a".into(), "b".into(), "c".into()],
			vec![String::new(); 3],
			vec![vec![]; 3],
			&["red", "blue"],
		)
		.unwrap();
		let colors: Vec<_> = pending.iter().map(|p| p.color.as_str()).collect();
		assert_eq!(colors, ["red", "blue", "red"]);
	}

	#[test]
	fn overlapping_membership() {
		let r = registry();
		let names = |v: Vec<&Subsystem>| v.into_iter().map(|s| s.name.clone()).collect::<Vec<_>>();
		assert_eq!(names(r.subsystems_of(2)), ["Limbic", "Motor"]);
		assert!(r.subsystems_of(5).is_empty());
		assert_eq!(names(r.shared(0, 3)), ["Limbic"]);
		assert_eq!(names(r.shared(2, 2)), ["Limbic", "Motor"]);
		assert!(r.shared(0, 1).is_empty());
	}

	#[test]
	fn shared_is_symmetric() {
		let r = registry();
		for a in 0..4 {
			for b in 0..4 {
				assert_eq!(r.shared(a, b), r.shared(b, a));
			}
		}
	}

	#[test]
	fn membership_length_must_match_nodes() {
		let pending =
			parse_subsystems(vec!["a".into()], vec![String::new()], vec![vec![1.0, 1.0]], PALETTE)
				.unwrap();
		let err = SubsystemRegistry::resolve(pending, &graph(3)).unwrap_err();
		assert!(matches!(err, SubsystemError::MembershipLength { found: 2, nodes: 3, .. }));
	}

	#[test]
	fn row_count_must_match_names() {
		let err = parse_subsystems(vec!["a".into()], vec![String::new()], vec![], PALETTE)
			.unwrap_err();
		assert!(matches!(err, SubsystemError::CountMismatch { what: "membership rows", .. }));
	}

	#[test]
	fn descriptions_skip_blank_cells() {
		let d = ConnectionDescriptions::from_rows(
			vec![
				vec![String::new(), "a to b".into()],
				vec!["b to a".into(), " ".into()],
			],
			2,
		)
		.unwrap();
		assert_eq!(d.describe(0, 1), Some("a to b"));
		assert_eq!(d.describe(1, 0), Some("b to a"));
		assert_eq!(d.describe(1, 1), None);
		assert_eq!(d.describe(5, 0), None);
		assert!(ConnectionDescriptions::from_rows(vec![vec![String::new()]], 2).is_err());
	}
}
