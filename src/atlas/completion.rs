//! Session progress: which structures and connections have been viewed.
//!
//! Every node carries `k + 1` facts, itself plus one per valid connection,
//! each worth `1 / (k + 1)`. Viewing only ever adds facts, so a node's
//! fraction never decreases. Subsystem aggregates are recomputed in full
//! after each change; atlases are small enough that this stays cheap.

use log::debug;
use serde::{Deserialize, Serialize};

use super::error::CompletionError;
use super::graph::AtlasGraph;
use super::subsystem::SubsystemRegistry;

/// How member completion is folded into a subsystem score.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationStrategy {
	/// Mean of the members' own fractions.
	#[default]
	NodeAverage,
	/// Mean over members of a fraction that only counts connections whose
	/// other endpoint is also a member.
	IntraSubsystemEdges,
}

/// Fraction boundaries of a node's progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletionState {
	/// Fraction is `0`.
	Unseen,
	/// Fraction is strictly between `0` and `1`.
	PartiallyViewed,
	/// Fraction is `1`.
	FullyViewed,
}

impl CompletionState {
	fn from_fraction(fraction: f64) -> Self {
		if fraction <= 0.0 {
			Self::Unseen
		} else if fraction >= 1.0 {
			Self::FullyViewed
		} else {
			Self::PartiallyViewed
		}
	}
}

#[derive(Clone, Debug)]
struct CompletionRecord {
	viewed: bool,
	viewed_edges: Vec<bool>,
	fraction: f64,
}

impl CompletionRecord {
	fn new(edges: usize) -> Self {
		Self {
			viewed: false,
			viewed_edges: vec![false; edges],
			fraction: 0.0,
		}
	}

	fn recompute(&mut self) {
		let facts = self.viewed_edges.len() + 1;
		let seen = usize::from(self.viewed) + self.viewed_edges.iter().filter(|&&v| v).count();
		self.fraction = seen as f64 / facts as f64;
	}
}

/// Copy of every score, for handing to a UI.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompletionSnapshot {
	/// Per-node fractions, by node index.
	pub nodes: Vec<f64>,
	/// Per-subsystem aggregates, by registry index.
	pub subsystems: Vec<f64>,
	/// Mean of all node fractions.
	pub overall: f64,
}

/// Per-node view ledger and derived subsystem aggregates.
#[derive(Clone, Debug)]
pub struct CompletionTracker {
	adjacency: Vec<Vec<usize>>,
	members: Vec<Vec<usize>>,
	strategy: AggregationStrategy,
	records: Vec<CompletionRecord>,
	subsystem_completion: Vec<f64>,
}

impl CompletionTracker {
	/// Size the ledger from `graph`; `subsystems` may be absent.
	pub fn new(
		graph: &AtlasGraph,
		subsystems: Option<&SubsystemRegistry>,
		strategy: AggregationStrategy,
	) -> Self {
		let adjacency = graph.adjacency().to_vec();
		let records = adjacency
			.iter()
			.map(|edges| CompletionRecord::new(edges.len()))
			.collect();
		let members: Vec<Vec<usize>> = subsystems
			.map(|r| r.iter().map(|s| s.valid_structures().to_vec()).collect())
			.unwrap_or_default();
		let subsystem_completion = vec![0.0; members.len()];
		Self {
			adjacency,
			members,
			strategy,
			records,
			subsystem_completion,
		}
	}

	/// The aggregation in use.
	pub fn strategy(&self) -> AggregationStrategy {
		self.strategy
	}

	/// Nodes in the ledger.
	pub fn node_count(&self) -> usize {
		self.records.len()
	}

	fn check(&self, index: usize) -> Result<(), CompletionError> {
		if index < self.records.len() {
			Ok(())
		} else {
			Err(CompletionError::UnknownNode {
				index,
				node_count: self.records.len(),
			})
		}
	}

	/// Mark node `index` itself as viewed. Returns its new fraction.
	pub fn mark_node_viewed(&mut self, index: usize) -> Result<f64, CompletionError> {
		self.check(index)?;
		let record = &mut self.records[index];
		if !record.viewed {
			record.viewed = true;
			record.recompute();
			debug!("node {index} viewed: {:.3}", record.fraction);
			self.recompute_subsystems();
		}
		Ok(self.records[index].fraction)
	}

	/// Mark the connection `from -> to` as viewed.
	///
	/// Returns `false` without changing anything when `to` is not a valid
	/// connection of `from`.
	pub fn mark_edge_viewed(&mut self, from: usize, to: usize) -> Result<bool, CompletionError> {
		self.check(from)?;
		let Ok(slot) = self.adjacency[from].binary_search(&to) else {
			return Ok(false);
		};
		let record = &mut self.records[from];
		if !record.viewed_edges[slot] {
			record.viewed_edges[slot] = true;
			record.recompute();
			debug!("edge {from} -> {to} viewed: {:.3}", record.fraction);
			self.recompute_subsystems();
		}
		Ok(true)
	}

	/// Fraction of node `index` in `[0, 1]`.
	pub fn node_completion(&self, index: usize) -> Result<f64, CompletionError> {
		self.check(index)?;
		Ok(self.records[index].fraction)
	}

	/// Discrete progress of node `index`.
	pub fn node_state(&self, index: usize) -> Result<CompletionState, CompletionError> {
		self.node_completion(index).map(CompletionState::from_fraction)
	}

	/// Whether node `index` itself has been viewed.
	pub fn is_node_viewed(&self, index: usize) -> Result<bool, CompletionError> {
		self.check(index)?;
		Ok(self.records[index].viewed)
	}

	/// Whether `from -> to` has been viewed; `false` for non-adjacent pairs.
	pub fn is_edge_viewed(&self, from: usize, to: usize) -> Result<bool, CompletionError> {
		self.check(from)?;
		Ok(self.adjacency[from]
			.binary_search(&to)
			.is_ok_and(|slot| self.records[from].viewed_edges[slot]))
	}

	/// Aggregate completion of subsystem `index`.
	pub fn subsystem_completion(&self, index: usize) -> Result<f64, CompletionError> {
		self.subsystem_completion
			.get(index)
			.copied()
			.ok_or(CompletionError::UnknownSubsystem {
				index,
				count: self.subsystem_completion.len(),
			})
	}

	/// Mean of every node's fraction, `0` for an empty atlas.
	pub fn overall_completion(&self) -> f64 {
		mean(self.records.iter().map(|r| r.fraction))
	}

	/// Copy every score out.
	pub fn snapshot(&self) -> CompletionSnapshot {
		CompletionSnapshot {
			nodes: self.records.iter().map(|r| r.fraction).collect(),
			subsystems: self.subsystem_completion.clone(),
			overall: self.overall_completion(),
		}
	}

	fn recompute_subsystems(&mut self) {
		if self.members.is_empty() {
			return;
		}
		let scores: Vec<f64> = self
			.members
			.iter()
			.map(|members| match self.strategy {
				AggregationStrategy::NodeAverage => {
					mean(members.iter().map(|&i| self.records[i].fraction))
				}
				AggregationStrategy::IntraSubsystemEdges => {
					mean(members.iter().map(|&i| self.restricted_fraction(i, members)))
				}
			})
			.collect();
		self.subsystem_completion = scores;
	}

	/// Fraction of node `index` counting only connections into `members`.
	fn restricted_fraction(&self, index: usize, members: &[usize]) -> f64 {
		let record = &self.records[index];
		let (facts, seen) = self.adjacency[index]
			.iter()
			.zip(&record.viewed_edges)
			.filter(|&(to, _)| members.binary_search(to).is_ok())
			.fold((1usize, usize::from(record.viewed)), |(facts, seen), (_, &v)| {
				(facts + 1, seen + usize::from(v))
			});
		seen as f64 / facts as f64
	}
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
	let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
	if count == 0 { 0.0 } else { sum / count as f64 }
}
