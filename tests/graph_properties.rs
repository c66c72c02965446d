//! Property-based invariants for the graph model, highlighting and story.
//!
//! Verifies:
//! 1. Rebuilding from the same files twice gives the same model
//! 2. Exactly one package node per distinct directory
//! 3. At most one containment edge per file, always to its own package
//! 4. An empty highlight set renders base styles
//! 5. Toggling a highlight twice restores the set
//! 6. A story reveals each matching file exactly once and completes

use std::collections::BTreeSet;

use proptest::prelude::*;
use repomap_viz::components::repo_graph::highlight::{ColorMode, HighlightEngine};
use repomap_viz::components::repo_graph::model::{EdgeKind, GraphModel, directory_of, package_id};
use repomap_viz::components::repo_graph::selection::SelectionController;
use repomap_viz::components::repo_graph::story::{
	StoryController, StoryEvent, StoryStage, StoryTimings, default_steps,
};
use repomap_viz::data::{FileDescriptor, Importance};

// ── Strategy helpers ──────────────────────────────────────────────────

fn arb_importance() -> impl Strategy<Value = Importance> {
	prop_oneof![
		Just(Importance::Low),
		Just(Importance::Medium),
		Just(Importance::High),
	]
}

fn arb_path() -> impl Strategy<Value = String> {
	let dir = prop_oneof![
		Just(""),
		Just("a/"),
		Just("b/"),
		Just("a/b/"),
		Just("root/"),
	];
	let name = prop_oneof![Just("x.ts"), Just("y.go"), Just("z.rs")];
	(dir, name).prop_map(|(d, n)| format!("{d}{n}"))
}

fn arb_file() -> impl Strategy<Value = FileDescriptor> {
	(
		arb_path(),
		arb_importance(),
		prop::option::of(0.0f64..1.0),
		prop::collection::vec(prop_oneof![Just("a"), Just("b"), Just("./a"), Just("pkg/a/b")], 0..3),
	)
		.prop_map(|(path, importance, rank, imports)| {
			let mut file = FileDescriptor::new(path, importance).with_imports(imports);
			file.rank = rank;
			file
		})
}

fn arb_files() -> impl Strategy<Value = Vec<FileDescriptor>> {
	prop::collection::vec(arb_file(), 0..16)
}

#[derive(Default)]
struct CountingStage {
	revealed: Vec<String>,
}

impl StoryStage for CountingStage {
	fn clear(&mut self) {
		self.revealed.clear();
	}

	fn overview(&mut self) {}

	fn reveal(&mut self, file: &FileDescriptor) {
		self.revealed.push(file.path.clone());
	}
}

// ═════════════════════════════════════════════════════════════════════════
// 1–3. Model structure
// ═════════════════════════════════════════════════════════════════════════

proptest! {
	#[test]
	fn rebuild_is_idempotent(files in arb_files()) {
		let mut once = GraphModel::new();
		once.rebuild(&files);
		let mut twice = GraphModel::new();
		twice.rebuild(&files);
		twice.rebuild(&files);
		prop_assert_eq!(once, twice);
	}

	#[test]
	fn one_package_per_directory(files in arb_files()) {
		let mut model = GraphModel::new();
		model.rebuild(&files);
		let directories: BTreeSet<&str> = files.iter().map(|f| directory_of(&f.path)).collect();
		let packages: Vec<&str> = model.packages().map(|p| p.directory.as_str()).collect();
		prop_assert_eq!(packages.len(), directories.len());
		for dir in directories {
			prop_assert!(model.contains(&package_id(dir)));
		}
	}

	#[test]
	fn containment_edges_point_at_own_package(files in arb_files()) {
		let mut model = GraphModel::new();
		model.rebuild(&files);
		for file in model.files() {
			let containment: Vec<_> = model
				.edges()
				.iter()
				.filter(|e| e.kind == EdgeKind::Containment && e.from == file.id)
				.collect();
			prop_assert_eq!(containment.len(), 1);
			prop_assert_eq!(&containment[0].to, &file.package);
		}
		for edge in model.edges().iter().filter(|e| e.kind == EdgeKind::InferredDependency) {
			let own = model.node(&edge.from).and_then(|n| n.as_file()).map(|f| f.package.clone());
			prop_assert_ne!(Some(edge.to.clone()), own);
		}
	}
}

// ═════════════════════════════════════════════════════════════════════════
// 4–5. Highlighting and selection
// ═════════════════════════════════════════════════════════════════════════

proptest! {
	#[test]
	fn empty_highlight_is_base_style(files in arb_files(), intent_mode in any::<bool>()) {
		let mode = if intent_mode { ColorMode::Intent } else { ColorMode::Importance };
		let engine = HighlightEngine::new(mode);
		let mut model = GraphModel::new();
		model.rebuild(&files);
		let styles = engine.styles(&model, &BTreeSet::new());
		for (node, style) in model.nodes().iter().zip(&styles.nodes) {
			prop_assert_eq!(style, &engine.base_node_style(node));
		}
	}

	#[test]
	fn toggle_twice_restores_highlights(
		start in prop::collection::btree_set("[a-c]/[xyz]\\.ts", 0..5),
		id in "[a-c]/[xyz]\\.ts",
	) {
		let mut selection = SelectionController::new();
		selection.set_highlighted(start.iter().cloned());
		selection.toggle_highlight(&id);
		selection.toggle_highlight(&id);
		prop_assert_eq!(selection.highlighted(), &start);
	}
}

// ═════════════════════════════════════════════════════════════════════════
// 6. Story coverage
// ═════════════════════════════════════════════════════════════════════════

proptest! {
	#[test]
	fn story_reveals_each_match_once(files in arb_files()) {
		let steps = default_steps();
		let expected: usize = steps
			.iter()
			.map(|s| files.iter().filter(|f| s.predicate.matches(f)).count())
			.sum();

		let mut story = StoryController::new(steps, StoryTimings::default());
		let mut stage = CountingStage::default();
		let generation = story.start(&mut stage);
		let mut completed = false;
		for _ in 0..(expected + 32) {
			let tick = story.tick(generation, &files, &mut stage);
			let status = story.status();
			if let Some(step) = story.steps().get(status.step_index) {
				let batch = files.iter().filter(|f| step.predicate.matches(f)).count();
				prop_assert!(status.batch_index <= batch);
			}
			if tick.events.contains(&StoryEvent::Completed) {
				completed = true;
				break;
			}
		}
		prop_assert!(completed);
		prop_assert_eq!(stage.revealed.len(), expected);
	}
}
