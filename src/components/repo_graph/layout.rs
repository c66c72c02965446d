//! Boundary to the graph-drawing engine, plus the static placements used by
//! the non-physics view modes.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;

use serde::Deserialize;

use super::highlight::{EdgeStyle, NodeStyle};
use super::model::{GraphModel, ROOT_DIRECTORY, package_id};
use crate::data::FileDescriptor;

/// How the graph is laid out (or replaced by the table).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
	/// Free force-directed layout, physics on until stabilized.
	#[default]
	Cluster,
	/// Left-to-right hierarchy by edge direction.
	Flow,
	/// Directory grid without edges.
	Simple,
	/// No canvas; sortable file table.
	Table,
}

impl ViewMode {
	pub const ALL: [ViewMode; 4] = [
		ViewMode::Cluster,
		ViewMode::Flow,
		ViewMode::Simple,
		ViewMode::Table,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			ViewMode::Cluster => "cluster",
			ViewMode::Flow => "flow",
			ViewMode::Simple => "simple",
			ViewMode::Table => "table",
		}
	}

	pub fn uses_physics(self) -> bool {
		self == ViewMode::Cluster
	}

	pub fn shows_edges(self) -> bool {
		self != ViewMode::Simple
	}

	pub fn shows_graph(self) -> bool {
		self != ViewMode::Table
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NodeShape {
	#[default]
	Dot,
	Hexagon,
	Box,
}

/// Everything the engine needs to draw a new node.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeAttrs {
	pub label: String,
	pub shape: NodeShape,
	pub style: NodeStyle,
	/// Anchor the new node near this one, if it is already placed.
	pub near: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeAttrs {
	pub style: EdgeStyle,
	pub arrow: bool,
	pub dashed: bool,
}

/// Fixed position for a node, optionally switching its shape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
	pub x: f64,
	pub y: f64,
	pub shape: Option<NodeShape>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Easing {
	Linear,
	#[default]
	EaseInOutQuad,
	EaseOutCubic,
}

impl Easing {
	pub fn apply(self, t: f64) -> f64 {
		let t = t.clamp(0.0, 1.0);
		match self {
			Easing::Linear => t,
			Easing::EaseInOutQuad => {
				if t < 0.5 {
					2.0 * t * t
				} else {
					1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
				}
			}
			Easing::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FocusOptions {
	pub scale: f64,
	pub duration: Duration,
	pub easing: Easing,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitOptions {
	pub duration: Duration,
	pub easing: Easing,
}

/// Operations the view layer issues against the drawing engine.
///
/// Edges are addressed by their position in the model's edge list, since
/// repeated dependency edges share endpoints.
pub trait LayoutAdapter {
	fn add_node(&mut self, id: &str, attrs: NodeAttrs);
	fn add_edge(&mut self, edge: usize, from: &str, to: &str, attrs: EdgeAttrs);
	fn update_node(&mut self, id: &str, style: &NodeStyle);
	fn update_edge(&mut self, edge: usize, style: &EdgeStyle);
	fn place_node(&mut self, id: &str, placement: Placement);
	fn clear(&mut self);
	fn focus(&mut self, id: &str, options: FocusOptions);
	fn fit(&mut self, options: FitOptions);
	fn set_physics_enabled(&mut self, enabled: bool);
	fn set_edges_visible(&mut self, visible: bool);
}

/// Grid constants for the simple view.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GridConfig {
	pub columns: usize,
	pub cell_width: f64,
	pub cell_height: f64,
	pub group_gap: f64,
	pub header_height: f64,
}

impl Default for GridConfig {
	fn default() -> Self {
		Self {
			columns: 4,
			cell_width: 220.0,
			cell_height: 60.0,
			group_gap: 80.0,
			header_height: 50.0,
		}
	}
}

/// Spacing for the hierarchical flow view.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
	pub level_separation: f64,
	pub node_spacing: f64,
}

impl Default for FlowConfig {
	fn default() -> Self {
		Self {
			level_separation: 250.0,
			node_spacing: 200.0,
		}
	}
}

/// Bucket name for root-level files in the grid's own path split.
pub const GRID_ROOT_KEY: &str = "root";

/// Directory headers stacked vertically, files in fixed-width rows below.
///
/// Buckets are sorted by name, with root-level files filed under `"root"`.
pub fn grid_placements(files: &[FileDescriptor], config: &GridConfig) -> Vec<(String, Placement)> {
	// (sort key, real directory) keeps a literal `root/` directory apart
	// from the root bucket while sorting them side by side.
	let mut groups: BTreeMap<(&str, &str), Vec<&FileDescriptor>> = BTreeMap::new();
	let mut seen = HashSet::new();
	for file in files {
		if !seen.insert(file.path.as_str()) {
			continue;
		}
		let key = match file.path.rfind('/') {
			Some(idx) if idx > 0 => {
				let dir = &file.path[..idx];
				(dir, dir)
			}
			_ => (GRID_ROOT_KEY, ROOT_DIRECTORY),
		};
		groups.entry(key).or_default().push(file);
	}

	let columns = config.columns.max(1);
	let mut placements = Vec::new();
	let mut cursor_y = 0.0;
	for ((_, directory), children) in groups {
		let rows = children.len().div_ceil(columns);
		let group_width = children.len().min(columns) as f64 * config.cell_width;
		placements.push((
			package_id(directory),
			Placement {
				x: group_width / 2.0 - config.cell_width / 2.0,
				y: cursor_y,
				shape: Some(NodeShape::Box),
			},
		));
		cursor_y += config.header_height;

		for (i, file) in children.iter().enumerate() {
			placements.push((
				file.path.clone(),
				Placement {
					x: (i % columns) as f64 * config.cell_width,
					y: cursor_y + (i / columns) as f64 * config.cell_height,
					shape: Some(NodeShape::Box),
				},
			));
		}
		cursor_y += rows as f64 * config.cell_height + config.group_gap;
	}
	placements
}

/// Longest-path levels along edge direction, laid out left to right.
pub fn flow_placements(model: &GraphModel, config: &FlowConfig) -> Vec<(String, Placement)> {
	let nodes = model.nodes();
	let position: HashMap<&str, usize> = nodes
		.iter()
		.enumerate()
		.map(|(i, n)| (n.id(), i))
		.collect();
	let edges: Vec<(usize, usize)> = model
		.edges()
		.iter()
		.filter_map(|e| Some((*position.get(e.from.as_str())?, *position.get(e.to.as_str())?)))
		.filter(|(a, b)| a != b)
		.collect();

	// Relaxation bounded by node count so a cycle cannot spin forever.
	let mut level = vec![0usize; nodes.len()];
	for _ in 0..nodes.len() {
		let mut changed = false;
		for &(from, to) in &edges {
			if level[to] < level[from] + 1 && level[from] + 1 < nodes.len() {
				level[to] = level[from] + 1;
				changed = true;
			}
		}
		if !changed {
			break;
		}
	}

	let mut columns: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
	for (i, l) in level.iter().enumerate() {
		columns.entry(*l).or_default().push(i);
	}

	let mut placements = Vec::with_capacity(nodes.len());
	for (l, members) in columns {
		let span = (members.len() - 1) as f64 * config.node_spacing;
		for (row, &i) in members.iter().enumerate() {
			placements.push((
				nodes[i].id().to_string(),
				Placement {
					x: l as f64 * config.level_separation,
					y: row as f64 * config.node_spacing - span / 2.0,
					shape: None,
				},
			));
		}
	}
	placements
}
