//! The rendering-side owner of the graph.
//!
//! [`RepoGraph`] holds the model together with the layout engine that draws
//! it, so the two never drift apart. It applies the rebuild policy (mode
//! switches, new data, story runs), pushes only changed styles when the
//! highlight set or color mode moves, and hosts the story controller whose
//! reveals mutate the same model.

use std::time::Duration;

use log::{debug, info};

use super::highlight::{ColorMode, GraphStyles, HighlightEngine};
use super::layout::{
	EdgeAttrs, Easing, FitOptions, FocusOptions, LayoutAdapter, NodeAttrs, NodeShape, ViewMode,
	flow_placements, grid_placements,
};
use super::model::{EdgeKind, GraphModel, GraphNode};
use super::selection::SelectionController;
use super::story::{Generation, StoryController, StoryStage, StoryStatus, StoryStep, StoryTick, StoryTimings};
use crate::config::VizConfig;
use crate::data::FileDescriptor;

/// What has been pushed to the layout so far.
#[derive(Debug, Default)]
struct Synced {
	nodes: usize,
	edges: usize,
	/// Styles as last pushed, parallel to the model.
	styles: GraphStyles,
}

impl Synced {
	/// Push everything the model gained since the last sync.
	fn push_new(&mut self, model: &GraphModel, layout: &mut impl LayoutAdapter, engine: &HighlightEngine) {
		for node in &model.nodes()[self.nodes..] {
			let style = engine.initial_node_style(node);
			let (shape, near) = match node {
				GraphNode::Package(_) => (NodeShape::Hexagon, None),
				GraphNode::File(f) => (NodeShape::Dot, Some(f.package.clone())),
			};
			layout.add_node(
				node.id(),
				NodeAttrs {
					label: node.label().to_string(),
					shape,
					style: style.clone(),
					near,
				},
			);
			self.styles.nodes.push(style);
		}
		for (i, edge) in model.edges().iter().enumerate().skip(self.edges) {
			let style = engine.initial_edge_style(edge, model);
			let dependency = edge.kind == EdgeKind::InferredDependency;
			layout.add_edge(
				i,
				&edge.from,
				&edge.to,
				EdgeAttrs {
					style: style.clone(),
					arrow: dependency,
					dashed: dependency,
				},
			);
			self.styles.edges.push(style);
		}
		self.nodes = model.nodes().len();
		self.edges = model.edges().len();
	}

	fn reset(&mut self) {
		*self = Synced::default();
	}
}

/// Story-side view of the graph, borrowing the parts a reveal touches.
struct Stage<'a, L: LayoutAdapter> {
	model: &'a mut GraphModel,
	layout: &'a mut L,
	engine: &'a HighlightEngine,
	synced: &'a mut Synced,
	timings: &'a StoryTimings,
}

impl<L: LayoutAdapter> StoryStage for Stage<'_, L> {
	fn clear(&mut self) {
		self.model.clear();
		self.layout.clear();
		self.synced.reset();
		self.layout.set_physics_enabled(true);
		self.layout.set_edges_visible(true);
	}

	fn overview(&mut self) {
		self.layout.fit(FitOptions {
			duration: Duration::from_millis(self.timings.fit_duration_ms),
			easing: Easing::EaseInOutQuad,
		});
	}

	fn reveal(&mut self, file: &FileDescriptor) {
		if self.model.add_node(file, true, false) {
			self.synced.push_new(self.model, self.layout, self.engine);
		}
		self.layout.set_physics_enabled(true);
		self.layout.focus(
			&file.path,
			FocusOptions {
				scale: self.timings.focus_scale,
				duration: Duration::from_millis(self.timings.focus_duration_ms),
				easing: Easing::EaseOutCubic,
			},
		);
		debug!("repomap-viz: revealed {}", file.path);
	}
}

/// Graph model plus the layout engine drawing it.
pub struct RepoGraph<L: LayoutAdapter> {
	layout: L,
	model: GraphModel,
	files: Vec<FileDescriptor>,
	engine: HighlightEngine,
	view_mode: ViewMode,
	selection: SelectionController,
	synced: Synced,
	story: StoryController,
	config: VizConfig,
	/// Frame the graph once the next layout settles.
	fit_on_stable: bool,
}

impl<L: LayoutAdapter> RepoGraph<L> {
	pub fn new(layout: L, config: VizConfig) -> Self {
		let story = StoryController::new(config.story_steps(), config.story.clone());
		Self {
			layout,
			model: GraphModel::new(),
			files: Vec::new(),
			engine: HighlightEngine::default(),
			view_mode: ViewMode::default(),
			selection: SelectionController::new(),
			synced: Synced::default(),
			story,
			config,
			fit_on_stable: false,
		}
	}

	pub fn layout(&self) -> &L {
		&self.layout
	}

	pub fn layout_mut(&mut self) -> &mut L {
		&mut self.layout
	}

	pub fn model(&self) -> &GraphModel {
		&self.model
	}

	pub fn files(&self) -> &[FileDescriptor] {
		&self.files
	}

	pub fn view_mode(&self) -> ViewMode {
		self.view_mode
	}

	pub fn color_mode(&self) -> ColorMode {
		self.engine.mode
	}

	pub fn selection(&self) -> &SelectionController {
		&self.selection
	}

	/// Styles as currently shown, parallel to the model.
	pub fn styles(&self) -> &GraphStyles {
		&self.synced.styles
	}

	/// Load a new snapshot. A running story is stopped first.
	pub fn set_files(&mut self, files: Vec<FileDescriptor>) {
		if self.story.stop() {
			info!("repomap-viz: story stopped by new data");
		}
		self.files = files;
		self.rebuild();
		self.selection.retain_present(|id| self.model.contains(id));
		self.fit_on_stable = self.view_mode.uses_physics();
		self.fit_now();
		info!(
			"repomap-viz: graph has {} nodes, {} edges",
			self.model.nodes().len(),
			self.model.edges().len()
		);
	}

	/// Switch layout, keeping the camera where it is. Deferred until the
	/// story ends if one is playing.
	pub fn set_view_mode(&mut self, mode: ViewMode) {
		if mode == self.view_mode {
			return;
		}
		self.view_mode = mode;
		if !self.story.is_active() {
			self.rebuild();
		}
	}

	pub fn set_color_mode(&mut self, mode: ColorMode) {
		self.engine.mode = mode;
		self.restyle();
	}

	/// Focus a node, or clear the focus. Ids not in the graph are ignored.
	pub fn select(&mut self, id: Option<String>) -> bool {
		match id {
			Some(id) if !self.model.contains(&id) => false,
			id => {
				self.selection.select(id);
				true
			}
		}
	}

	pub fn toggle_highlight(&mut self, id: &str) -> bool {
		let on = self.selection.toggle_highlight(id);
		self.restyle();
		on
	}

	pub fn set_highlighted<I, S>(&mut self, ids: I)
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.selection.set_highlighted(ids);
		self.restyle();
	}

	pub fn clear_highlights(&mut self) {
		self.selection.clear_highlights();
		self.restyle();
	}

	/// Insert a single file outside of a story run.
	pub fn add_file(&mut self, file: &FileDescriptor, with_edges: bool, dimmed: bool) -> bool {
		let added = self.model.add_node(file, with_edges, dimmed);
		if added {
			self.synced.push_new(&self.model, &mut self.layout, &self.engine);
		}
		added
	}

	/// Clear model and layout, then re-add everything in the current mode.
	fn rebuild(&mut self) {
		self.model.rebuild(&self.files);
		self.layout.clear();
		self.synced.reset();
		self.synced.push_new(&self.model, &mut self.layout, &self.engine);

		let placements = match self.view_mode {
			ViewMode::Simple => grid_placements(&self.files, &self.config.grid),
			ViewMode::Flow => flow_placements(&self.model, &self.config.flow),
			ViewMode::Cluster | ViewMode::Table => Vec::new(),
		};
		for (id, placement) in placements {
			self.layout.place_node(&id, placement);
		}
		self.layout.set_physics_enabled(self.view_mode.uses_physics());
		self.layout.set_edges_visible(self.view_mode.shows_edges());
		self.restyle();
		debug!("repomap-viz: rebuilt in {} mode", self.view_mode.as_str());
	}

	/// Push the style changes implied by the highlight set and color mode.
	fn restyle(&mut self) {
		if self.story.is_active() {
			return;
		}
		let next = self.engine.styles(&self.model, self.selection.highlighted());
		let patch = next.diff(&self.synced.styles);
		for (i, style) in &patch.nodes {
			self.layout.update_node(self.model.nodes()[*i].id(), style);
		}
		for (i, style) in &patch.edges {
			self.layout.update_edge(*i, style);
		}
		self.synced.styles = next;
	}

	fn fit_now(&mut self) {
		self.layout.fit(FitOptions {
			duration: Duration::ZERO,
			easing: Easing::EaseInOutQuad,
		});
	}

	/// The layout engine reports its simulation has settled.
	pub fn on_stabilized(&mut self) {
		if self.story.is_active() {
			return;
		}
		if self.view_mode.uses_physics() {
			self.layout.set_physics_enabled(false);
		}
		if std::mem::take(&mut self.fit_on_stable) {
			self.layout.fit(FitOptions {
				duration: Duration::from_millis(self.config.story.fit_duration_ms),
				easing: Easing::EaseInOutQuad,
			});
		}
	}

	pub fn story_status(&self) -> StoryStatus {
		self.story.status()
	}

	pub fn story_steps(&self) -> &[StoryStep] {
		self.story.steps()
	}

	pub fn current_step(&self) -> Option<&StoryStep> {
		self.story.current_step()
	}

	/// Begin a story run on an emptied graph.
	pub fn start_story(&mut self) -> Generation {
		let timings = self.story.timings().clone();
		let mut stage = Stage {
			model: &mut self.model,
			layout: &mut self.layout,
			engine: &self.engine,
			synced: &mut self.synced,
			timings: &timings,
		};
		let generation = self.story.start(&mut stage);
		info!("repomap-viz: story started over {} files", self.files.len());
		generation
	}

	/// Run the continuation scheduled for `generation`.
	pub fn story_tick(&mut self, generation: Generation) -> StoryTick {
		let timings = self.story.timings().clone();
		let mut stage = Stage {
			model: &mut self.model,
			layout: &mut self.layout,
			engine: &self.engine,
			synced: &mut self.synced,
			timings: &timings,
		};
		let tick = self.story.tick(generation, &self.files, &mut stage);
		if tick.completed() {
			info!("repomap-viz: story complete");
			self.rebuild();
			self.fit_on_stable = self.view_mode.uses_physics();
		}
		tick
	}

	/// Cancel the story and restore the full graph.
	pub fn stop_story(&mut self) -> bool {
		if !self.story.stop() {
			return false;
		}
		info!("repomap-viz: story stopped");
		self.rebuild();
		self.fit_on_stable = self.view_mode.uses_physics();
		true
	}

	pub fn toggle_story_pause(&mut self) {
		self.story.toggle_pause();
	}

	pub fn pause_story(&mut self) {
		self.story.pause();
	}

	pub fn resume_story(&mut self) {
		self.story.resume();
	}

	pub fn next_story_step(&mut self) -> bool {
		self.story.next_step()
	}
}
