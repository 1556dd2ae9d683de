//! Caller-supplied atlas configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::completion::AggregationStrategy;
use super::error::{AtlasError, Result};

/// Where the datasets live and how to threshold the connectivity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
	/// Directory the dataset names are relative to, read by
	/// [`Atlas::load_from_dir`](super::Atlas::load_from_dir). Hosts that pass
	/// their own [`DataSource`](super::DataSource) to `Atlas::load` ignore it.
	pub base: PathBuf,
	/// Structure names and descriptions (`|`-delimited).
	pub names: String,
	/// Square connectivity matrix (`,`-delimited).
	pub connectivity: String,
	/// Subsystem names and descriptions (`|`-delimited).
	pub subsystem_names: Option<String>,
	/// Subsystem membership rows (`,`-delimited).
	pub subsystem_membership: Option<String>,
	/// Node-pair connection descriptions (`|`-delimited).
	pub subsystem_connections: Option<String>,
	/// Global maximum weight; the matrix maximum when unset.
	pub highest_value: Option<f64>,
	/// Fraction of `highest_value` a weight must reach, in `[0, 1]`.
	pub threshold_percentage: f64,
	/// How subsystem completion is aggregated.
	pub aggregation: AggregationStrategy,
}

impl Default for AtlasConfig {
	fn default() -> Self {
		Self {
			base: PathBuf::from("data"),
			names: "names.txt".into(),
			connectivity: "connectivity.csv".into(),
			subsystem_names: Some("subsystem_names.txt".into()),
			subsystem_membership: Some("subsystem_membership.csv".into()),
			subsystem_connections: Some("subsystem_connections.txt".into()),
			highest_value: None,
			threshold_percentage: 0.5,
			aggregation: AggregationStrategy::default(),
		}
	}
}

impl AtlasConfig {
	/// Reject values that cannot produce a meaningful threshold.
	pub fn validate(&self) -> Result<()> {
		let t = self.threshold_percentage;
		if !t.is_finite() || !(0.0..=1.0).contains(&t) {
			return Err(AtlasError::invalid(format!(
				"threshold_percentage must be within [0, 1], got {t}"
			)));
		}
		if let Some(h) = self.highest_value {
			if !h.is_finite() || h < 0.0 {
				return Err(AtlasError::invalid(format!(
					"highest_value must be a non-negative number, got {h}"
				)));
			}
		}
		Ok(())
	}
}
