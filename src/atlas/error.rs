//! Error types for loading the atlas and driving the completion ledger.

use thiserror::Error;

/// Failure to parse a tabular dataset.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LoadError {
	/// A line has fewer fields than the requested column.
	#[error("{dataset}:{line}: missing column {column}")]
	MissingColumn {
		/// Dataset name
		dataset: String,
		/// 1-based line number
		line: usize,
		/// Requested column
		column: usize,
	},

	/// A token in a numeric dataset is not a number.
	#[error("{dataset}:{line}: invalid number {token:?}")]
	InvalidNumber {
		/// Dataset name
		dataset: String,
		/// 1-based line number
		line: usize,
		/// Offending token
		token: String,
	},

	/// The requested row does not exist.
	#[error("{dataset}: missing row {row} ({rows} rows available)")]
	MissingRow {
		/// Dataset name
		dataset: String,
		/// Requested row
		row: usize,
		/// Rows present
		rows: usize,
	},

	/// A row has the wrong number of fields for its matrix.
	#[error("{dataset}:{line}: expected {expected} entries, found {found}")]
	RowLength {
		/// Dataset name
		dataset: String,
		/// 1-based line number
		line: usize,
		/// Required width
		expected: usize,
		/// Entries found
		found: usize,
	},

	/// The dataset exists but could not be read as text.
	#[error("{dataset}: unreadable: {message}")]
	Unreadable {
		/// Dataset name
		dataset: String,
		/// Underlying I/O error
		message: String,
	},
}

/// Failure to construct an [`AtlasGraph`](super::AtlasGraph).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphError {
	/// A matrix row does not have one column per row.
	#[error("connectivity matrix is not square: row {row} has {found} columns, expected {expected}")]
	NotSquare {
		/// Offending row
		row: usize,
		/// Matrix dimension
		expected: usize,
		/// Columns found
		found: usize,
	},

	/// Node list and matrix disagree on the atlas size.
	#[error("{nodes} nodes but connectivity matrix is {matrix}x{matrix}")]
	NodeCountMismatch {
		/// Node count
		nodes: usize,
		/// Matrix dimension
		matrix: usize,
	},

	/// A weight is negative or not finite.
	#[error("invalid connectivity weight {value} at ({row}, {column})")]
	InvalidWeight {
		/// Row index
		row: usize,
		/// Column index
		column: usize,
		/// Offending weight
		value: f64,
	},
}

/// Failure to build the subsystem registry.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SubsystemError {
	/// Names, descriptions and membership rows disagree in length.
	#[error("{names} subsystem names but {other} {what}")]
	CountMismatch {
		/// Name count
		names: usize,
		/// Count of the other dataset
		other: usize,
		/// Which dataset disagreed
		what: &'static str,
	},

	/// A membership row is not one entry per node.
	#[error("subsystem {subsystem:?} has {found} membership entries for {nodes} nodes")]
	MembershipLength {
		/// Subsystem name
		subsystem: String,
		/// Entries found
		found: usize,
		/// Node count
		nodes: usize,
	},

	/// The connection description matrix has the wrong number of rows.
	#[error("connection description matrix has {found} rows for {expected} nodes")]
	DescriptionRows {
		/// Node count
		expected: usize,
		/// Rows found
		found: usize,
	},

	/// A connection description row does not match the node count.
	#[error("connection description matrix has shape mismatch at row {row}: expected {expected} entries, found {found}")]
	DescriptionShape {
		/// Offending row
		row: usize,
		/// Node count
		expected: usize,
		/// Entries found
		found: usize,
	},
}

/// Misuse of the completion ledger.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompletionError {
	/// The index does not name a node in the ledger.
	#[error("node {index} is not part of the completion ledger ({node_count} nodes)")]
	UnknownNode {
		/// Requested index
		index: usize,
		/// Ledger size
		node_count: usize,
	},

	/// The index does not name a subsystem.
	#[error("subsystem {index} does not exist ({count} subsystems)")]
	UnknownSubsystem {
		/// Requested index
		index: usize,
		/// Subsystem count
		count: usize,
	},
}

/// Top-level atlas construction failure.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AtlasError {
	/// A required dataset is missing or empty.
	#[error("required dataset {name:?} is missing")]
	MissingDataset {
		/// Dataset name
		name: String,
	},

	/// Configuration values are out of range.
	#[error("invalid atlas configuration: {message}")]
	InvalidConfig {
		/// What was wrong
		message: String,
	},

	/// Tabular parse failure.
	#[error(transparent)]
	Load(#[from] LoadError),

	/// Graph construction failure.
	#[error(transparent)]
	Graph(#[from] GraphError),

	/// Subsystem construction failure.
	#[error(transparent)]
	Subsystem(#[from] SubsystemError),
}

impl AtlasError {
	pub(crate) fn invalid(message: impl Into<String>) -> Self {
		Self::InvalidConfig {
			message: message.into(),
		}
	}

	pub(crate) fn missing(name: impl Into<String>) -> Self {
		Self::MissingDataset { name: name.into() }
	}
}

/// Result alias for atlas construction.
pub type Result<T> = std::result::Result<T, AtlasError>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn load_error_names_dataset_and_line() {
		let err = LoadError::InvalidNumber {
			dataset: "connectivity.csv".into(),
			line: 3,
			token: "x".into(),
		};
		assert_eq!(err.to_string(), "connectivity.csv:3: invalid number \"x\"");

		let err = LoadError::RowLength {
			dataset: "subsystem_membership.csv".into(),
			line: 4,
			expected: 8,
			found: 7,
		};
		assert_eq!(err.to_string(), "subsystem_membership.csv:4: expected 8 entries, found 7");
	}

	#[test]
	fn atlas_error_is_transparent_over_sources() {
		let err: AtlasError = GraphError::NodeCountMismatch { nodes: 2, matrix: 3 }.into();
		assert_eq!(err.to_string(), "2 nodes but connectivity matrix is 3x3");
	}
}
