//! Atlas data model: structures, thresholded connectivity, subsystems and
//! the session completion ledger.
//!
//! [`Atlas::load`] runs the whole one-shot pipeline. Everything it returns is
//! immutable; progress lives in a [`CompletionTracker`] obtained from
//! [`Atlas::tracker`].

mod completion;
mod config;
mod error;
mod graph;
mod loader;
mod source;
mod subsystem;

use log::{info, warn};

pub use completion::{AggregationStrategy, CompletionSnapshot, CompletionState, CompletionTracker};
pub use config::AtlasConfig;
pub use error::{AtlasError, CompletionError, GraphError, LoadError, Result, SubsystemError};
pub use graph::{AtlasGraph, ConnectivityMatrix, Node};
pub use loader::{ColumnFormat, Table, expand_newlines, structure_name};
pub use source::{DataSource, EmbeddedSource, FsSource};
pub use subsystem::{
	ConnectionDescriptions, PALETTE, PendingSubsystem, Subsystem, SubsystemRegistry,
	parse_subsystems,
};

const NAME_DELIMITER: char = '|';
const MATRIX_DELIMITER: char = ',';

/// Read a dataset that may be left unconfigured.
fn read_optional(source: &dyn DataSource, name: Option<&str>) -> Result<Option<Table>> {
	match name {
		Some(name) => Ok(source.read(name)?),
		None => Ok(None),
	}
}

/// A loaded atlas.
#[derive(Clone, Debug)]
pub struct Atlas {
	graph: AtlasGraph,
	subsystems: Option<SubsystemRegistry>,
	descriptions: ConnectionDescriptions,
}

impl Atlas {
	/// Load every dataset named in `config` from `source`.
	pub fn load(config: &AtlasConfig, source: &dyn DataSource) -> Result<Self> {
		config.validate()?;

		let names = source
			.read(&config.names)?
			.ok_or_else(|| AtlasError::missing(&config.names))?;
		let labels = names.column(0, NAME_DELIMITER, ColumnFormat::StructureName)?;
		let about = names.column(1, NAME_DELIMITER, ColumnFormat::Plain)?;

		let connectivity = source
			.read(&config.connectivity)?
			.ok_or_else(|| AtlasError::missing(&config.connectivity))?;
		let rows = connectivity.float_matrix_of_width(MATRIX_DELIMITER, connectivity.row_count())?;
		let matrix = ConnectivityMatrix::from_rows(rows)?;
		let highest = config.highest_value.unwrap_or_else(|| matrix.max_weight());

		let graph = AtlasGraph::build(
			labels.into_iter().zip(about).collect(),
			matrix,
			highest,
			config.threshold_percentage,
		)?;

		let subsystems = Self::load_subsystems(config, source, &graph)?;
		let descriptions = match read_optional(source, config.subsystem_connections.as_deref())? {
			Some(table) => ConnectionDescriptions::from_rows(
				table.string_matrix_of_width(NAME_DELIMITER, graph.len())?,
				graph.len(),
			)?,
			None => ConnectionDescriptions::default(),
		};

		info!(
			"atlas loaded: {} structures, {} valid connections, {} subsystems",
			graph.len(),
			graph.edge_count(),
			subsystems.as_ref().map_or(0, SubsystemRegistry::len)
		);
		Ok(Self {
			graph,
			subsystems,
			descriptions,
		})
	}

	/// Load from the directory named by `config.base`.
	pub fn load_from_dir(config: &AtlasConfig) -> Result<Self> {
		Self::load(config, &FsSource::new(&config.base))
	}

	fn load_subsystems(
		config: &AtlasConfig,
		source: &dyn DataSource,
		graph: &AtlasGraph,
	) -> Result<Option<SubsystemRegistry>> {
		let Some(names) = read_optional(source, config.subsystem_names.as_deref())? else {
			warn!("no subsystem definitions, continuing without subsystems");
			return Ok(None);
		};
		let membership_name = config
			.subsystem_membership
			.as_deref()
			.ok_or_else(|| AtlasError::invalid("subsystem names given without a membership dataset"))?;
		let membership = source
			.read(membership_name)?
			.ok_or_else(|| AtlasError::missing(membership_name))?;

		let pending = parse_subsystems(
			names.column(0, NAME_DELIMITER, ColumnFormat::Plain)?,
			names.column(1, NAME_DELIMITER, ColumnFormat::Plain)?,
			membership.float_matrix_of_width(MATRIX_DELIMITER, graph.len())?,
			PALETTE,
		)?;
		Ok(Some(SubsystemRegistry::resolve(pending, graph)?))
	}

	/// Assemble an atlas from already-built parts.
	pub fn from_parts(
		graph: AtlasGraph,
		subsystems: Option<SubsystemRegistry>,
		descriptions: ConnectionDescriptions,
	) -> Self {
		Self {
			graph,
			subsystems,
			descriptions,
		}
	}

	/// The structure graph.
	pub fn graph(&self) -> &AtlasGraph {
		&self.graph
	}

	/// The subsystem registry, `None` when none was configured.
	pub fn subsystems(&self) -> Option<&SubsystemRegistry> {
		self.subsystems.as_ref()
	}

	/// Node at `index`.
	pub fn node(&self, index: usize) -> Option<&Node> {
		self.graph.node(index)
	}

	/// First node with display name `name`.
	pub fn find_node(&self, name: &str) -> Option<&Node> {
		self.graph.find(name)
	}

	/// Index of `node` within this atlas.
	pub fn index_of(&self, node: &Node) -> Option<usize> {
		self.graph.index_of(node)
	}

	/// Valid connections of `index`, empty when out of range.
	pub fn valid_connections(&self, index: usize) -> &[usize] {
		self.graph.valid_connections(index).unwrap_or_default()
	}

	/// Subsystems containing `node`.
	pub fn subsystems_of(&self, node: usize) -> Vec<&Subsystem> {
		self.subsystems
			.as_ref()
			.map(|r| r.subsystems_of(node))
			.unwrap_or_default()
	}

	/// Subsystems containing both `a` and `b`.
	pub fn shared_subsystems(&self, a: usize, b: usize) -> Vec<&Subsystem> {
		self.subsystems
			.as_ref()
			.map(|r| r.shared(a, b))
			.unwrap_or_default()
	}

	/// Description of the `from -> to` pairing, if one was supplied.
	pub fn connection_description(&self, from: usize, to: usize) -> Option<&str> {
		self.descriptions.describe(from, to)
	}

	/// A fresh completion ledger for this atlas.
	pub fn tracker(&self, strategy: AggregationStrategy) -> CompletionTracker {
		CompletionTracker::new(&self.graph, self.subsystems.as_ref(), strategy)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn source() -> EmbeddedSource {
		EmbeddedSource::new()
			.with("names.txt", "Thalamus_L|Relay\nThalamus_R|Relay\nBrain_Stem|Autonomic\\ncontrol\n")
			.with("connectivity.csv", "0,5,0\n5,0,3\n0,3,0\n")
			.with("subsystem_names.txt", "Diencephalon|Thalami\nAll|Everything\n")
			.with("subsystem_membership.csv", "1,1,0\n1,1,1\n")
			.with("subsystem_connections.txt", "|L-R|\nR-L||R-BS\n|BS-R|\n")
	}

	#[test]
	fn loads_full_pipeline() {
		let atlas = Atlas::load(&AtlasConfig::default(), &source()).unwrap();
		assert_eq!(atlas.graph().len(), 3);
		assert_eq!(atlas.node(0).unwrap().name, "Thalamus (Left)");
		assert_eq!(atlas.node(2).unwrap().description, "Autonomic\ncontrol");
		assert_eq!(atlas.find_node("Brain Stem").map(Node::index), Some(2));
		// highest value taken from the matrix: 5 * 0.5
		assert_eq!(atlas.valid_connections(1), &[0, 2]);
		assert_eq!(atlas.subsystems().unwrap().len(), 2);
		assert_eq!(atlas.shared_subsystems(0, 1).len(), 2);
		assert_eq!(atlas.shared_subsystems(0, 2).len(), 1);
		assert_eq!(atlas.connection_description(1, 2), Some("R-BS"));
		assert_eq!(atlas.connection_description(0, 0), None);
	}

	#[test]
	fn subsystems_are_optional() {
		let config = AtlasConfig {
			subsystem_names: Some("absent.txt".into()),
			subsystem_connections: None,
			..AtlasConfig::default()
		};
		let atlas = Atlas::load(&config, &source()).unwrap();
		assert!(atlas.subsystems().is_none());
		assert!(atlas.subsystems_of(0).is_empty());
		assert!(atlas.shared_subsystems(0, 1).is_empty());
		let mut tracker = atlas.tracker(AggregationStrategy::NodeAverage);
		tracker.mark_node_viewed(0).unwrap();
		assert!(tracker.subsystem_completion(0).is_err());
	}

	#[test]
	fn subsystem_names_need_a_membership_dataset() {
		let config = AtlasConfig {
			subsystem_membership: None,
			..AtlasConfig::default()
		};
		let err = Atlas::load(&config, &source()).unwrap_err();
		assert!(matches!(err, AtlasError::InvalidConfig { .. }));

		// unconfigured names skip membership entirely
		let config = AtlasConfig {
			subsystem_names: None,
			subsystem_membership: None,
			..AtlasConfig::default()
		};
		assert!(Atlas::load(&config, &source()).unwrap().subsystems().is_none());
	}

	#[test]
	fn short_rows_name_dataset_and_line() {
		let data = source().with("connectivity.csv", "0,5,0\n\n5,0\n0,3,0\n");
		let err = Atlas::load(&AtlasConfig::default(), &data).unwrap_err();
		assert_eq!(err.to_string(), "connectivity.csv:3: expected 3 entries, found 2");

		let data = source().with("subsystem_membership.csv", "1,1,0\n\n1\n");
		let err = Atlas::load(&AtlasConfig::default(), &data).unwrap_err();
		assert_eq!(
			err,
			AtlasError::Load(LoadError::RowLength {
				dataset: "subsystem_membership.csv".into(),
				line: 3,
				expected: 3,
				found: 1,
			})
		);

		let data = source().with("subsystem_connections.txt", "|L-R|\nR-L|\n|BS-R|\n");
		let err = Atlas::load(&AtlasConfig::default(), &data).unwrap_err();
		assert!(matches!(err, AtlasError::Load(LoadError::RowLength { line: 2, .. })));
	}

	#[test]
	fn missing_connectivity_is_fatal() {
		let config = AtlasConfig {
			connectivity: "nope.csv".into(),
			..AtlasConfig::default()
		};
		let err = Atlas::load(&config, &source()).unwrap_err();
		assert_eq!(err, AtlasError::MissingDataset { name: "nope.csv".into() });
	}

	#[test]
	fn explicit_highest_value_overrides_matrix_max() {
		let config = AtlasConfig {
			highest_value: Some(10.0),
			..AtlasConfig::default()
		};
		let atlas = Atlas::load(&config, &source()).unwrap();
		assert_eq!(atlas.graph().threshold(), 5.0);
		assert_eq!(atlas.valid_connections(1), &[0]);
	}

	#[test]
	fn malformed_number_names_dataset() {
		let source = source().with("connectivity.csv", "0,5,0\n5,x,3\n0,3,0\n");
		let err = Atlas::load(&AtlasConfig::default(), &source).unwrap_err();
		assert_eq!(err.to_string(), "connectivity.csv:2: invalid number \"x\"");
	}
}
