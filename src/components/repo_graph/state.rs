//! Force-directed layout engine state.
//!
//! Wraps the `force_graph` physics simulation as a [`LayoutAdapter`]: it keeps
//! per-node display data keyed by node id, a pan/zoom transform with animated
//! camera moves for `fit` and `focus`, pointer drag/pan tracking, and a
//! stabilization detector that reports once the simulation has calmed down.

use std::collections::{BTreeMap, HashMap};
use std::f64::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};
use serde::Deserialize;

use super::highlight::{EdgeStyle, NodeStyle};
use super::layout::{
	EdgeAttrs, Easing, FitOptions, FocusOptions, LayoutAdapter, NodeAttrs, NodeShape, Placement,
};

/// Simulation and stabilization tuning.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
	pub force_charge: f32,
	pub force_spring: f32,
	pub force_max: f32,
	pub node_speed: f32,
	pub damping_factor: f32,
	/// Mean node speed, as a fraction of the layout's radius per second,
	/// below which a frame counts as calm. Motion of the whole layout is
	/// not counted.
	pub stable_speed: f64,
	/// Consecutive calm frames that count as stabilized.
	pub stable_frames: u32,
	/// Frames after which the layout is declared stable regardless.
	pub max_iterations: u32,
}

impl Default for PhysicsConfig {
	fn default() -> Self {
		Self {
			force_charge: 150.0,
			force_spring: 0.05,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
			stable_speed: 0.1,
			stable_frames: 30,
			max_iterations: 600,
		}
	}
}

impl PhysicsConfig {
	fn simulation(&self) -> SimulationParameters {
		SimulationParameters {
			force_charge: self.force_charge,
			force_spring: self.force_spring,
			force_max: self.force_max,
			node_speed: self.node_speed,
			damping_factor: self.damping_factor,
		}
	}
}

/// Simulation payload: just the id, display data lives in [`NodeSlot`].
#[derive(Clone, Debug, Default)]
pub struct NodeInfo {
	pub id: String,
}

#[derive(Clone, Debug)]
pub struct NodeSlot {
	idx: DefaultNodeIdx,
	pub label: String,
	pub shape: NodeShape,
	pub style: NodeStyle,
}

#[derive(Clone, Debug)]
pub struct EdgeSlot {
	from: DefaultNodeIdx,
	to: DefaultNodeIdx,
	/// Id of the target node, for sizing arrowheads.
	pub target: String,
	pub attrs: EdgeAttrs,
}

/// Pan and zoom transform applied to the entire graph view.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	/// Zoom factor (1.0 = 100%, clamped to 0.1..10.0).
	pub k: f64,
}

impl ViewTransform {
	fn lerp(self, to: ViewTransform, t: f64) -> Self {
		Self {
			x: self.x + (to.x - self.x) * t,
			y: self.y + (to.y - self.y) * t,
			k: self.k + (to.k - self.k) * t,
		}
	}
}

/// Tracks an in-progress node drag operation.
#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node_id: Option<String>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f32,
	pub node_start_y: f32,
	/// Whether the pointer travelled far enough to stop counting as a click.
	pub moved: bool,
}

/// Tracks an in-progress canvas pan operation.
#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
	pub moved: bool,
}

#[derive(Clone, Copy, Debug)]
struct CameraMove {
	from: ViewTransform,
	to: ViewTransform,
	elapsed: f64,
	duration: f64,
	easing: Easing,
}

#[derive(Clone, Copy, Debug, Default)]
struct Stability {
	calm_frames: u32,
	iterations: u32,
	settled: bool,
}

/// Pointer travel (screen px) that turns a click into a drag.
const CLICK_SLOP: f64 = 4.0;
const MIN_ZOOM: f64 = 0.1;
const MAX_ZOOM: f64 = 10.0;
const FIT_PADDING: f64 = 60.0;
/// Box-shaped nodes in the grid view, world units.
pub const BOX_HALF_WIDTH: f64 = 90.0;
pub const BOX_HALF_HEIGHT: f64 = 16.0;

/// Force-directed engine behind the canvas.
pub struct ForceLayout {
	graph: ForceGraph<NodeInfo, ()>,
	physics: PhysicsConfig,
	nodes: HashMap<String, NodeSlot>,
	edges: BTreeMap<usize, EdgeSlot>,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hovered: Option<String>,
	pub width: f64,
	pub height: f64,
	physics_enabled: bool,
	edges_visible: bool,
	camera: Option<CameraMove>,
	stability: Stability,
	radius_range: (f64, f64),
	/// Smallest and largest style size currently shown.
	size_range: (f64, f64),
	/// Elapsed animation time, drives dash offsets.
	pub flow_time: f64,
}

impl ForceLayout {
	pub fn new(width: f64, height: f64, physics: PhysicsConfig, radius_range: (f64, f64)) -> Self {
		Self {
			graph: ForceGraph::new(physics.simulation()),
			physics,
			nodes: HashMap::new(),
			edges: BTreeMap::new(),
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			hovered: None,
			width,
			height,
			physics_enabled: true,
			edges_visible: true,
			camera: None,
			stability: Stability::default(),
			radius_range,
			size_range: (0.0, 0.0),
			flow_time: 0.0,
		}
	}

	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	pub fn edge_count(&self) -> usize {
		self.edges.len()
	}

	pub fn physics_enabled(&self) -> bool {
		self.physics_enabled
	}

	pub fn edges_visible(&self) -> bool {
		self.edges_visible
	}

	pub fn slot(&self, id: &str) -> Option<&NodeSlot> {
		self.nodes.get(id)
	}

	pub fn edge(&self, edge: usize) -> Option<&EdgeSlot> {
		self.edges.get(&edge)
	}

	pub fn position(&self, id: &str) -> Option<(f64, f64)> {
		let idx = self.nodes.get(id)?.idx;
		let mut found = None;
		self.graph.visit_nodes(|node| {
			if node.index() == idx {
				found = Some((node.x() as f64, node.y() as f64));
			}
		});
		found
	}

	/// Positions of every simulated node, keyed by simulation index.
	pub fn positions(&self) -> HashMap<DefaultNodeIdx, (f64, f64)> {
		let mut out = HashMap::with_capacity(self.nodes.len());
		self.graph.visit_nodes(|node| {
			out.insert(node.index(), (node.x() as f64, node.y() as f64));
		});
		out
	}

	/// Visit each node with its display slot and world position.
	pub fn visit_nodes(&self, mut f: impl FnMut(&str, &NodeSlot, f64, f64)) {
		self.graph.visit_nodes(|node| {
			let id = &node.data.user_data.id;
			if let Some(slot) = self.nodes.get(id) {
				f(id, slot, node.x() as f64, node.y() as f64);
			}
		});
	}

	/// Visit each edge (in model order) with its endpoint positions.
	pub fn visit_edges(&self, mut f: impl FnMut(&EdgeSlot, (f64, f64), (f64, f64))) {
		let positions = self.positions();
		for slot in self.edges.values() {
			if let (Some(&a), Some(&b)) = (positions.get(&slot.from), positions.get(&slot.to)) {
				f(slot, a, b);
			}
		}
	}

	/// Map a style size onto the theme's radius range, relative to the
	/// smallest and largest sizes currently shown.
	pub fn radius_for(&self, size: f64) -> f64 {
		let (lo, hi) = self.size_range;
		let (r0, r1) = self.radius_range;
		if !(hi > lo) {
			return (r0 + r1) / 2.0;
		}
		r0 + (size - lo) / (hi - lo) * (r1 - r0)
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<String> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let mut found = None;
		self.visit_nodes(|id, slot, x, y| {
			let (dx, dy) = (x - gx, y - gy);
			let hit = match slot.shape {
				NodeShape::Box => dx.abs() < BOX_HALF_WIDTH && dy.abs() < BOX_HALF_HEIGHT,
				_ => (dx * dx + dy * dy).sqrt() < self.radius_for(slot.style.size),
			};
			if hit {
				found = Some(id.to_string());
			}
		});
		found
	}

	pub fn set_hover(&mut self, id: Option<String>) {
		self.hovered = id;
	}

	/// Pointer pressed: grab the node under it, or start panning.
	pub fn pointer_down(&mut self, x: f64, y: f64) {
		if let Some(id) = self.node_at_position(x, y) {
			let (nx, ny) = self.position(&id).unwrap_or((0.0, 0.0));
			self.drag = DragState {
				active: true,
				node_id: Some(id),
				start_x: x,
				start_y: y,
				node_start_x: nx as f32,
				node_start_y: ny as f32,
				moved: false,
			};
		} else {
			self.pan = PanState {
				active: true,
				start_x: x,
				start_y: y,
				transform_start_x: self.transform.x,
				transform_start_y: self.transform.y,
				moved: false,
			};
		}
	}

	pub fn pointer_move(&mut self, x: f64, y: f64) {
		if self.drag.active {
			let Some(id) = self.drag.node_id.clone() else {
				return;
			};
			let (sdx, sdy) = (x - self.drag.start_x, y - self.drag.start_y);
			self.drag.moved |= sdx.hypot(sdy) > CLICK_SLOP;
			if !self.drag.moved {
				return;
			}
			let (nx, ny) = (
				self.drag.node_start_x + (sdx / self.transform.k) as f32,
				self.drag.node_start_y + (sdy / self.transform.k) as f32,
			);
			self.move_node(&id, nx, ny, true);
		} else if self.pan.active {
			let (dx, dy) = (x - self.pan.start_x, y - self.pan.start_y);
			self.pan.moved |= dx.hypot(dy) > CLICK_SLOP;
			self.camera = None;
			self.transform.x = self.pan.transform_start_x + dx;
			self.transform.y = self.pan.transform_start_y + dy;
		} else {
			let hovered = self.node_at_position(x, y);
			self.set_hover(hovered);
		}
	}

	/// Pointer released. Returns `Some(target)` if this was a click rather
	/// than a drag: `Some(Some(id))` on a node, `Some(None)` on background.
	pub fn pointer_up(&mut self) -> Option<Option<String>> {
		let click = if self.drag.active {
			(!self.drag.moved).then(|| self.drag.node_id.clone())
		} else if self.pan.active {
			(!self.pan.moved).then_some(None)
		} else {
			None
		};
		self.drag = DragState::default();
		self.pan = PanState::default();
		click
	}

	pub fn pointer_leave(&mut self) {
		self.drag = DragState::default();
		self.pan = PanState::default();
		self.set_hover(None);
	}

	/// Zoom around a screen point.
	pub fn zoom_at(&mut self, x: f64, y: f64, zoom_in: bool) {
		self.camera = None;
		let factor = if zoom_in { 1.1 } else { 0.9 };
		let new_k = (self.transform.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = new_k / self.transform.k;
		self.transform.x = x - (x - self.transform.x) * ratio;
		self.transform.y = y - (y - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	/// Advance camera animation and, if enabled, the simulation. Returns
	/// `true` on the frame the layout first counts as stabilized.
	pub fn tick(&mut self, dt: f64) -> bool {
		self.flow_time += dt;
		self.advance_camera(dt);
		if !self.physics_enabled || self.nodes.is_empty() || self.stability.settled {
			return false;
		}

		let before = self.positions();
		self.graph.update(dt as f32);
		let speed = self.relative_speed(&before, dt);

		let s = &mut self.stability;
		s.iterations += 1;
		if speed < self.physics.stable_speed {
			s.calm_frames += 1;
		} else {
			s.calm_frames = 0;
		}
		if s.calm_frames >= self.physics.stable_frames || s.iterations >= self.physics.max_iterations {
			s.settled = true;
			return true;
		}
		false
	}

	/// Mean speed since `before`, net of drift, over the RMS distance of
	/// nodes from their centroid.
	fn relative_speed(&self, before: &HashMap<DefaultNodeIdx, (f64, f64)>, dt: f64) -> f64 {
		let mut moves = Vec::with_capacity(before.len());
		let mut points = Vec::with_capacity(before.len());
		self.graph.visit_nodes(|node| {
			let (x, y) = (node.x() as f64, node.y() as f64);
			if let Some(&(bx, by)) = before.get(&node.index()) {
				moves.push((x - bx, y - by));
			}
			points.push((x, y));
		});
		if moves.is_empty() || dt <= 0.0 {
			return 0.0;
		}

		let mean = |v: &[(f64, f64)]| {
			let n = v.len() as f64;
			let (sx, sy) = v.iter().fold((0.0, 0.0), |(ax, ay), (x, y)| (ax + x, ay + y));
			(sx / n, sy / n)
		};
		let (dx, dy) = mean(&moves);
		let (cx, cy) = mean(&points);
		let step = moves.iter().map(|(x, y)| (x - dx).hypot(y - dy)).sum::<f64>() / moves.len() as f64;
		let rms = (points.iter().map(|(x, y)| (x - cx).powi(2) + (y - cy).powi(2)).sum::<f64>()
			/ points.len() as f64)
			.sqrt();
		step / dt / rms.max(1.0)
	}

	pub fn is_stabilized(&self) -> bool {
		self.stability.settled
	}

	fn refresh_size_range(&mut self) {
		self.size_range = self
			.nodes
			.values()
			.map(|s| s.style.size)
			.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
	}

	fn unsettle(&mut self) {
		self.stability = Stability::default();
	}

	fn advance_camera(&mut self, dt: f64) {
		let Some(mut cam) = self.camera else {
			return;
		};
		cam.elapsed += dt;
		let t = if cam.duration <= 0.0 {
			1.0
		} else {
			cam.elapsed / cam.duration
		};
		self.transform = cam.from.lerp(cam.to, cam.easing.apply(t));
		self.camera = (t < 1.0).then_some(cam);
	}

	fn animate_to(&mut self, to: ViewTransform, seconds: f64, easing: Easing) {
		if seconds <= 0.0 {
			self.transform = to;
			self.camera = None;
			return;
		}
		self.camera = Some(CameraMove {
			from: self.transform,
			to,
			elapsed: 0.0,
			duration: seconds,
			easing,
		});
	}

	fn move_node(&mut self, id: &str, x: f32, y: f32, anchor: bool) {
		let Some(idx) = self.nodes.get(id).map(|s| s.idx) else {
			return;
		};
		self.graph.visit_nodes_mut(|node| {
			if node.index() == idx {
				node.data.x = x;
				node.data.y = y;
				node.data.is_anchor = anchor;
			}
		});
	}

	/// Spawn point for a new node: beside its anchor if placed, otherwise on
	/// a ring around the origin.
	fn spawn_point(&self, near: Option<&str>) -> (f32, f32) {
		let n = self.nodes.len() as f64;
		// golden angle keeps successive spawns apart
		let angle = n * PI * (3.0 - 5f64.sqrt());
		match near.and_then(|id| self.position(id)) {
			Some((x, y)) => ((x + 40.0 * angle.cos()) as f32, (y + 40.0 * angle.sin()) as f32),
			None => {
				let r = 100.0 + 4.0 * n.sqrt();
				((r * angle.cos()) as f32, (r * angle.sin()) as f32)
			}
		}
	}
}

impl LayoutAdapter for ForceLayout {
	fn add_node(&mut self, id: &str, attrs: NodeAttrs) {
		if self.nodes.contains_key(id) {
			return;
		}
		let (x, y) = self.spawn_point(attrs.near.as_deref());
		let idx = self.graph.add_node(NodeData {
			x,
			y,
			mass: 10.0,
			is_anchor: false,
			user_data: NodeInfo { id: id.to_string() },
		});
		self.nodes.insert(
			id.to_string(),
			NodeSlot {
				idx,
				label: attrs.label,
				shape: attrs.shape,
				style: attrs.style,
			},
		);
		self.refresh_size_range();
		self.unsettle();
	}

	fn add_edge(&mut self, edge: usize, from: &str, to_id: &str, attrs: EdgeAttrs) {
		let (Some(a), Some(b)) = (self.nodes.get(from), self.nodes.get(to_id)) else {
			return;
		};
		let (from, to) = (a.idx, b.idx);
		self.graph.add_edge(from, to, EdgeData::default());
		self.edges.insert(
			edge,
			EdgeSlot {
				from,
				to,
				target: to_id.to_string(),
				attrs,
			},
		);
		self.unsettle();
	}

	fn update_node(&mut self, id: &str, style: &NodeStyle) {
		if let Some(slot) = self.nodes.get_mut(id) {
			let resized = slot.style.size != style.size;
			slot.style = style.clone();
			if resized {
				self.refresh_size_range();
			}
		}
	}

	fn update_edge(&mut self, edge: usize, style: &EdgeStyle) {
		if let Some(slot) = self.edges.get_mut(&edge) {
			slot.attrs.style = style.clone();
		}
	}

	fn place_node(&mut self, id: &str, placement: Placement) {
		self.move_node(id, placement.x as f32, placement.y as f32, true);
		if let (Some(slot), Some(shape)) = (self.nodes.get_mut(id), placement.shape) {
			slot.shape = shape;
		}
	}

	fn clear(&mut self) {
		self.graph = ForceGraph::new(self.physics.simulation());
		self.nodes.clear();
		self.edges.clear();
		self.size_range = (0.0, 0.0);
		self.drag = DragState::default();
		self.hovered = None;
		self.unsettle();
	}

	fn focus(&mut self, id: &str, options: FocusOptions) {
		let Some((x, y)) = self.position(id) else {
			return;
		};
		let k = options.scale.clamp(MIN_ZOOM, MAX_ZOOM);
		let to = ViewTransform {
			x: self.width / 2.0 - x * k,
			y: self.height / 2.0 - y * k,
			k,
		};
		self.animate_to(to, options.duration.as_secs_f64(), options.easing);
	}

	fn fit(&mut self, options: FitOptions) {
		let mut bounds: Option<(f64, f64, f64, f64)> = None;
		self.visit_nodes(|_, _, x, y| {
			bounds = Some(match bounds {
				None => (x, y, x, y),
				Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
			});
		});
		let (x0, y0, x1, y1) = bounds.unwrap_or((0.0, 0.0, 0.0, 0.0));
		let (bw, bh) = ((x1 - x0).max(1.0), (y1 - y0).max(1.0));
		let k = ((self.width - 2.0 * FIT_PADDING) / bw)
			.min((self.height - 2.0 * FIT_PADDING) / bh)
			.clamp(MIN_ZOOM, 1.5);
		let (cx, cy) = ((x0 + x1) / 2.0, (y0 + y1) / 2.0);
		let to = ViewTransform {
			x: self.width / 2.0 - cx * k,
			y: self.height / 2.0 - cy * k,
			k,
		};
		self.animate_to(to, options.duration.as_secs_f64(), options.easing);
	}

	fn set_physics_enabled(&mut self, enabled: bool) {
		if enabled && !self.physics_enabled {
			self.unsettle();
		}
		self.physics_enabled = enabled;
	}

	fn set_edges_visible(&mut self, visible: bool) {
		self.edges_visible = visible;
	}
}
