//! `RepoGraph` driven against a recording layout engine.

use std::collections::{BTreeMap, HashMap};

use repomap_viz::VizConfig;
use repomap_viz::components::repo_graph::highlight::{ColorMode, EdgeStyle, NodeStyle};
use repomap_viz::components::repo_graph::layout::{
	EdgeAttrs, Easing, FitOptions, FocusOptions, LayoutAdapter, NodeAttrs, NodeShape, Placement,
	ViewMode,
};
use repomap_viz::components::repo_graph::state::{ForceLayout, PhysicsConfig};
use repomap_viz::components::repo_graph::story::{StoryEvent, StoryPhase};
use repomap_viz::components::repo_graph::theme::palette;
use repomap_viz::data::{FileDescriptor, Importance};
use repomap_viz::RepoGraph;

#[derive(Debug, Default)]
struct RecordingLayout {
	order: Vec<String>,
	nodes: BTreeMap<String, NodeStyle>,
	edges: BTreeMap<usize, (String, String, EdgeStyle)>,
	placements: HashMap<String, Placement>,
	physics: bool,
	edges_visible: bool,
	clears: usize,
	node_updates: usize,
	edge_updates: usize,
	focused: Vec<String>,
	focus_easing: Vec<Easing>,
	fits: usize,
}

impl LayoutAdapter for RecordingLayout {
	fn add_node(&mut self, id: &str, attrs: NodeAttrs) {
		self.order.push(id.to_string());
		self.nodes.insert(id.to_string(), attrs.style);
	}

	fn add_edge(&mut self, edge: usize, from: &str, to: &str, attrs: EdgeAttrs) {
		self.edges.insert(edge, (from.to_string(), to.to_string(), attrs.style));
	}

	fn update_node(&mut self, id: &str, style: &NodeStyle) {
		self.node_updates += 1;
		self.nodes.insert(id.to_string(), style.clone());
	}

	fn update_edge(&mut self, edge: usize, style: &EdgeStyle) {
		self.edge_updates += 1;
		if let Some(entry) = self.edges.get_mut(&edge) {
			entry.2 = style.clone();
		}
	}

	fn place_node(&mut self, id: &str, placement: Placement) {
		self.placements.insert(id.to_string(), placement);
	}

	fn clear(&mut self) {
		self.clears += 1;
		self.order.clear();
		self.nodes.clear();
		self.edges.clear();
		self.placements.clear();
	}

	fn focus(&mut self, id: &str, options: FocusOptions) {
		self.focused.push(id.to_string());
		self.focus_easing.push(options.easing);
	}

	fn fit(&mut self, _options: FitOptions) {
		self.fits += 1;
	}

	fn set_physics_enabled(&mut self, enabled: bool) {
		self.physics = enabled;
	}

	fn set_edges_visible(&mut self, visible: bool) {
		self.edges_visible = visible;
	}
}

fn files() -> Vec<FileDescriptor> {
	vec![
		FileDescriptor::new("a/x.ts", Importance::High).with_rank(0.8),
		FileDescriptor::new("a/y.ts", Importance::Low).with_rank(0.1),
		FileDescriptor::new("b/z.ts", Importance::Medium).with_rank(0.4),
	]
}

fn graph() -> RepoGraph<RecordingLayout> {
	let mut graph = RepoGraph::new(RecordingLayout::default(), VizConfig::default());
	graph.set_files(files());
	graph
}

/// Tick until the run ends, collecting every event.
fn play_out(graph: &mut RepoGraph<RecordingLayout>) -> Vec<StoryEvent> {
	let generation = graph.start_story();
	let mut events = Vec::new();
	for _ in 0..200 {
		let tick = graph.story_tick(generation);
		events.extend(tick.events);
		if tick.next.is_none() {
			return events;
		}
	}
	panic!("story did not finish");
}

#[test]
fn files_become_packages_files_and_containment_edges() {
	let graph = graph();
	let layout = graph.layout();
	assert_eq!(layout.order, ["pkg:a", "a/x.ts", "a/y.ts", "pkg:b", "b/z.ts"]);
	let edges: Vec<(&str, &str)> = layout
		.edges
		.values()
		.map(|(from, to, _)| (from.as_str(), to.as_str()))
		.collect();
	assert_eq!(edges, [("a/x.ts", "pkg:a"), ("a/y.ts", "pkg:a"), ("b/z.ts", "pkg:b")]);
	assert!(layout.physics);
	assert!(layout.edges_visible);
}

#[test]
fn reloading_the_same_files_is_idempotent() {
	let mut graph = graph();
	let model = graph.model().clone();
	let nodes = graph.layout().nodes.clone();
	graph.set_files(files());
	assert_eq!(graph.model(), &model);
	assert_eq!(graph.layout().nodes, nodes);
	assert_eq!(graph.layout().order.len(), 5);
}

#[test]
fn highlight_changes_push_only_changed_styles() {
	let mut graph = graph();
	graph.set_highlighted(["a/x.ts"]);
	let layout = graph.layout();
	assert_eq!(layout.nodes["a/x.ts"].fill, palette::EMPHASIS);
	assert_ne!(layout.nodes["b/z.ts"].fill, palette::EMPHASIS);
	assert_eq!(layout.edges[&0].2.color, palette::ACCENT);

	let pushed = (layout.node_updates, layout.edge_updates);
	graph.set_highlighted(["a/x.ts"]);
	let layout = graph.layout();
	assert_eq!((layout.node_updates, layout.edge_updates), pushed);

	graph.clear_highlights();
	assert_eq!(graph.layout().nodes["a/x.ts"].fill, palette::HIGH);
}

#[test]
fn color_mode_restyles_without_rebuilding() {
	let mut graph = RepoGraph::new(RecordingLayout::default(), VizConfig::default());
	graph.set_files(vec![
		FileDescriptor::new("src/db.rs", Importance::High).with_intent("Database Adapter Layer"),
	]);
	let clears = graph.layout().clears;
	graph.set_color_mode(ColorMode::Intent);
	assert_eq!(graph.layout().clears, clears);
	assert_eq!(graph.layout().nodes["src/db.rs"].fill, palette::INFRASTRUCTURE);
}

#[test]
fn simple_mode_places_boxes_and_hides_edges() {
	let mut graph = graph();
	graph.set_view_mode(ViewMode::Simple);
	let layout = graph.layout();
	assert!(!layout.physics);
	assert!(!layout.edges_visible);
	assert_eq!(layout.placements.len(), 5);
	assert!(layout.placements.values().all(|p| p.shape == Some(NodeShape::Box)));
	assert_eq!(layout.placements["pkg:a"].y, 0.0);
}

#[test]
fn mode_switch_keeps_selection_and_highlights() {
	let mut graph = graph();
	assert!(graph.select(Some("a/y.ts".into())));
	graph.set_highlighted(["b/z.ts"]);
	graph.set_view_mode(ViewMode::Flow);
	assert_eq!(graph.selection().selected(), Some("a/y.ts"));
	assert_eq!(graph.layout().nodes["b/z.ts"].fill, palette::EMPHASIS);
	assert!(!graph.layout().physics);
}

#[test]
fn selection_is_dropped_when_its_file_disappears() {
	let mut graph = graph();
	graph.select(Some("a/y.ts".into()));
	graph.set_files(vec![FileDescriptor::new("a/x.ts", Importance::High)]);
	assert_eq!(graph.selection().selected(), None);
	assert!(!graph.select(Some("a/y.ts".into())));
}

#[test]
fn story_reveals_every_matching_file_then_restores_the_graph() {
	let mut graph = graph();
	let events = play_out(&mut graph);

	let revealed: Vec<&str> = events
		.iter()
		.filter_map(|e| match e {
			StoryEvent::Revealed { path, .. } => Some(path.as_str()),
			_ => None,
		})
		.collect();
	assert_eq!(revealed, ["a/x.ts", "b/z.ts", "a/y.ts"]);
	assert_eq!(events.last(), Some(&StoryEvent::Completed));

	assert_eq!(graph.story_status().phase, StoryPhase::Idle);
	assert_eq!(graph.layout().order.len(), 5);
	assert_eq!(graph.layout().focused, ["a/x.ts", "b/z.ts", "a/y.ts"]);
	assert!(graph.layout().focus_easing.iter().all(|e| *e == Easing::EaseOutCubic));
}

#[test]
fn story_starts_from_an_empty_graph_and_grows() {
	let mut graph = graph();
	let generation = graph.start_story();
	assert!(graph.model().is_empty());
	assert!(graph.layout().order.is_empty());

	// overview, then first reveal
	graph.story_tick(generation);
	graph.story_tick(generation);
	assert_eq!(graph.layout().order, ["pkg:a", "a/x.ts"]);
	assert!(graph.layout().physics);
}

#[test]
fn stopping_turns_pending_ticks_into_no_ops() {
	let mut graph = graph();
	let generation = graph.start_story();
	graph.story_tick(generation);
	graph.story_tick(generation);

	assert!(graph.stop_story());
	let order = graph.layout().order.clone();
	assert_eq!(order.len(), 5);

	let stale = graph.story_tick(generation);
	assert!(stale.events.is_empty());
	assert_eq!(stale.next, None);
	assert_eq!(graph.layout().order, order);
	assert!(!graph.stop_story());
}

#[test]
fn new_files_stop_a_running_story() {
	let mut graph = graph();
	let generation = graph.start_story();
	graph.story_tick(generation);

	graph.set_files(vec![FileDescriptor::new("c/w.ts", Importance::Low)]);
	assert!(!graph.story_status().is_playing());
	assert_eq!(graph.layout().order, ["pkg:c", "c/w.ts"]);
	assert!(graph.story_tick(generation).events.is_empty());
}

#[test]
fn changes_during_a_story_apply_when_it_ends() {
	let mut graph = graph();
	let generation = graph.start_story();
	graph.story_tick(generation);

	graph.set_view_mode(ViewMode::Simple);
	graph.set_highlighted(["a/x.ts"]);
	assert!(graph.layout().placements.is_empty());
	assert!(graph.layout().edges_visible);

	graph.stop_story();
	let layout = graph.layout();
	assert_eq!(layout.placements.len(), 5);
	assert!(!layout.edges_visible);
	assert_eq!(layout.nodes["a/x.ts"].fill, palette::EMPHASIS);
}

#[test]
fn stabilization_freezes_cluster_physics_outside_stories() {
	let mut graph = graph();
	graph.on_stabilized();
	assert!(!graph.layout().physics);

	let generation = graph.start_story();
	graph.story_tick(generation);
	graph.story_tick(generation);
	graph.on_stabilized();
	assert!(graph.layout().physics);
}

fn force_graph() -> RepoGraph<ForceLayout> {
	let layout = ForceLayout::new(800.0, 600.0, PhysicsConfig::default(), (10.0, 30.0));
	RepoGraph::new(layout, VizConfig::default())
}

#[test]
fn mode_switch_keeps_the_camera() {
	let mut graph = graph();
	let fits = graph.layout().fits;
	graph.set_view_mode(ViewMode::Flow);
	graph.set_view_mode(ViewMode::Simple);
	graph.set_view_mode(ViewMode::Cluster);
	assert_eq!(graph.layout().fits, fits);

	let mut graph = force_graph();
	graph.set_files(files());
	graph.layout_mut().zoom_at(300.0, 200.0, true);
	graph.layout_mut().zoom_at(300.0, 200.0, true);
	let camera = graph.layout().transform;
	graph.set_view_mode(ViewMode::Flow);
	for _ in 0..10 {
		graph.layout_mut().tick(0.016);
	}
	assert_eq!(graph.layout().transform, camera);
}

#[test]
fn cluster_layout_settles_before_the_iteration_cap() {
	let files: Vec<_> = (0..12)
		.map(|i| FileDescriptor::new(format!("d{}/f{i}.rs", i % 3), Importance::Low))
		.collect();
	let mut graph = force_graph();
	graph.set_files(files);

	let frame = (1..=600).find(|_| graph.layout_mut().tick(0.016));
	let frame = frame.expect("layout never stabilized");
	assert!(frame < 400, "settled only at frame {frame}");

	graph.on_stabilized();
	assert!(!graph.layout().physics_enabled());
}

#[test]
fn single_files_can_be_added_next_to_the_graph() {
	let mut graph = graph();
	let extra = FileDescriptor::new("b/w.ts", Importance::High).with_imports(["lib/a"]);
	assert!(graph.add_file(&extra, true, true));
	assert!(!graph.add_file(&extra, true, false));

	let layout = graph.layout();
	assert_eq!(layout.order.last().map(String::as_str), Some("b/w.ts"));
	assert_eq!(layout.order.len(), 6);
	assert!(layout.nodes["b/w.ts"].fill.a < 0.5);
	let (from, to, style) = &layout.edges[&3];
	assert_eq!((from.as_str(), to.as_str()), ("b/w.ts", "pkg:b"));
	assert_eq!(style.opacity, 0.05);
	// the import suffix-matches `pkg:a`
	assert_eq!(layout.edges[&4].1, "pkg:a");

	let plain = FileDescriptor::new("c/v.ts", Importance::Low);
	assert!(graph.add_file(&plain, false, false));
	assert_eq!(graph.layout().order.len(), 8);
	assert_eq!(graph.layout().edges.len(), 5);
}
