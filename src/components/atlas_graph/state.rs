use std::collections::HashSet;
use std::f64::consts::PI;
use std::rc::Rc;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};
use log::warn;

use crate::atlas::{AggregationStrategy, Atlas, CompletionTracker, PALETTE};

pub const NODE_RADIUS: f64 = 5.0;
pub const HIT_RADIUS: f64 = 12.0;
/// Pointer travel (screen px) beyond which a press is a drag, not a click.
const CLICK_SLOP: f64 = 3.0;

#[derive(Clone, Debug, Default)]
pub struct NodeInfo {
	pub index: usize,
	pub label: String,
	pub color: String,
}

/// What the page shows about the current selection.
#[derive(Clone, Debug, PartialEq)]
pub struct Selection {
	pub name: String,
	pub description: String,
	pub subsystems: Vec<String>,
	pub link: Option<String>,
	pub completion: f64,
}

#[derive(Clone, Debug, Default)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub moved: bool,
	pub node_idx: Option<DefaultNodeIdx>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f32,
	pub node_start_y: f32,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<DefaultNodeIdx>,
	pub neighbors: HashSet<DefaultNodeIdx>,
	pub highlight_t: f64,
	pub prev_node: Option<DefaultNodeIdx>,
	pub prev_neighbors: HashSet<DefaultNodeIdx>,
	delay_t: f64,
}

pub struct AtlasViewState {
	pub atlas: Rc<Atlas>,
	pub tracker: CompletionTracker,
	pub graph: ForceGraph<NodeInfo, ()>,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: HoverState,
	pub selected: Option<usize>,
	pub width: f64,
	pub height: f64,
	pub animation_running: bool,
	pub flow_time: f64,
	handles: Vec<DefaultNodeIdx>,
}

impl AtlasViewState {
	pub fn new(atlas: Rc<Atlas>, strategy: AggregationStrategy, width: f64, height: f64) -> Self {
		let mut graph = ForceGraph::new(SimulationParameters {
			force_charge: 150.0,
			force_spring: 0.05,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
		});
		let count = atlas.graph().len();

		let handles: Vec<DefaultNodeIdx> = atlas
			.graph()
			.nodes()
			.iter()
			.map(|node| {
				let i = node.index();
				let color = atlas
					.subsystems_of(i)
					.first()
					.map(|s| s.color.clone())
					.unwrap_or_else(|| PALETTE[i % PALETTE.len()].into());
				let angle = (i as f64) * 2.0 * PI / count.max(1) as f64;
				let (x, y) = (
					(width / 2.0 + 100.0 * angle.cos()) as f32,
					(height / 2.0 + 100.0 * angle.sin()) as f32,
				);
				graph.add_node(NodeData {
					x,
					y,
					mass: 10.0,
					is_anchor: false,
					user_data: NodeInfo {
						index: i,
						label: node.name.clone(),
						color,
					},
				})
			})
			.collect();

		// one spring per connected pair; direction is tracked by the ledger
		for from in 0..count {
			for &to in atlas.valid_connections(from) {
				let reverse_seen = to < from && atlas.graph().is_connected(to, from);
				if to != from && !reverse_seen {
					graph.add_edge(handles[from], handles[to], EdgeData::default());
				}
			}
		}

		let tracker = atlas.tracker(strategy);
		Self {
			atlas,
			tracker,
			graph,
			handles,
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			hover: HoverState::default(),
			selected: None,
			width,
			height,
			animation_running: true,
			flow_time: 0.0,
		}
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<DefaultNodeIdx> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let mut found = None;
		self.graph.visit_nodes(|node| {
			let (dx, dy) = (node.x() as f64 - gx, node.y() as f64 - gy);
			// world-space radius, scales with zoom like nodes
			if (dx * dx + dy * dy).sqrt() < HIT_RADIUS {
				found = Some(node.index());
			}
		});
		found
	}

	fn atlas_index(&self, idx: DefaultNodeIdx) -> Option<usize> {
		self.handles.iter().position(|&h| h == idx)
	}

	pub fn track_drag(&mut self, x: f64, y: f64) {
		let (dx, dy) = (x - self.drag.start_x, y - self.drag.start_y);
		if (dx * dx + dy * dy).sqrt() > CLICK_SLOP {
			self.drag.moved = true;
		}
	}

	/// Select the node under the pointer: it counts as viewed, and so does
	/// the connection from the previous selection when there is one.
	pub fn select(&mut self, idx: DefaultNodeIdx) -> Option<Selection> {
		let index = self.atlas_index(idx)?;
		let previous = self.selected.replace(index);

		let mut link = None;
		if let Some(from) = previous.filter(|&from| from != index) {
			match self.tracker.mark_edge_viewed(from, index) {
				Ok(true) => {
					link = self
						.atlas
						.connection_description(from, index)
						.map(str::to_owned)
				}
				Ok(false) => {}
				Err(err) => warn!("{err}"),
			}
		}
		let completion = match self.tracker.mark_node_viewed(index) {
			Ok(fraction) => fraction,
			Err(err) => {
				warn!("{err}");
				0.0
			}
		};

		let node = self.atlas.node(index)?;
		Some(Selection {
			name: node.name.clone(),
			description: node.description.clone(),
			subsystems: self
				.atlas
				.subsystems_of(index)
				.into_iter()
				.map(|s| s.name.clone())
				.collect(),
			link,
			completion,
		})
	}

	pub fn completion_of(&self, idx: DefaultNodeIdx) -> f64 {
		self.atlas_index(idx)
			.and_then(|i| self.tracker.node_completion(i).ok())
			.unwrap_or(0.0)
	}

	pub fn is_selected(&self, idx: DefaultNodeIdx) -> bool {
		self.selected.map(|i| self.handles[i]) == Some(idx)
	}

	/// Whether either direction of the pair has been viewed.
	pub fn is_link_viewed(&self, a: DefaultNodeIdx, b: DefaultNodeIdx) -> bool {
		let (Some(a), Some(b)) = (self.atlas_index(a), self.atlas_index(b)) else {
			return false;
		};
		self.tracker.is_edge_viewed(a, b).unwrap_or(false)
			|| self.tracker.is_edge_viewed(b, a).unwrap_or(false)
	}

	pub fn set_hover(&mut self, node: Option<DefaultNodeIdx>) {
		if self.hover.node == node {
			return;
		}
		let was_hovering = self.hover.node.is_some();

		// keep the old highlight around while it fades out
		if was_hovering && node.is_none() {
			self.hover.prev_node = self.hover.node.take();
			self.hover.prev_neighbors = std::mem::take(&mut self.hover.neighbors);
		} else {
			self.hover.prev_node = None;
			self.hover.prev_neighbors.clear();
		}

		self.hover.node = node;
		self.hover.neighbors.clear();

		if let Some(index) = node.and_then(|idx| self.atlas_index(idx)) {
			if !was_hovering {
				self.hover.delay_t = 0.0;
			}
			let graph = self.atlas.graph();
			for (other, &handle) in self.handles.iter().enumerate() {
				if other != index
					&& (graph.is_connected(index, other) || graph.is_connected(other, index))
				{
					self.hover.neighbors.insert(handle);
				}
			}
		}
	}

	pub fn is_highlighted(&self, idx: DefaultNodeIdx) -> bool {
		self.hover.node == Some(idx)
			|| self.hover.neighbors.contains(&idx)
			|| self.hover.prev_node == Some(idx)
			|| self.hover.prev_neighbors.contains(&idx)
	}

	pub fn is_hovered(&self, idx: DefaultNodeIdx) -> bool {
		self.hover.node == Some(idx) || self.hover.prev_node == Some(idx)
	}

	pub fn has_active_highlight(&self) -> bool {
		self.hover.node.is_some() || self.hover.prev_node.is_some()
	}

	pub fn tick(&mut self, dt: f32) {
		self.graph.update(dt);
		self.flow_time += dt as f64;

		let (target, delay, speed) = if self.hover.node.is_some() {
			(1.0, 0.08, 1.8)
		} else {
			(0.0, 0.0, 1.26)
		};

		if self.hover.node.is_some() {
			self.hover.delay_t = (self.hover.delay_t + dt as f64).min(delay);
			if self.hover.delay_t >= delay {
				self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt as f64;
			}
		} else {
			self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt as f64;
			if self.hover.highlight_t < 0.01 {
				self.hover.highlight_t = 0.0;
				self.hover.prev_node = None;
				self.hover.prev_neighbors.clear();
			}
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}
