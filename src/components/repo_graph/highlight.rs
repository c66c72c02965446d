//! Node and edge styling from color mode, highlight set and dim state.
//!
//! Styles are a pure function of their inputs, so the view can recompute the
//! whole sheet after any change and push only the entries that differ from
//! what the layout engine currently shows.

use std::collections::BTreeSet;

use serde::Deserialize;

use super::model::{EdgeKind, FileNode, GraphEdge, GraphModel, GraphNode};
use super::theme::{Color, palette};
use crate::data::Importance;

/// Base coloring scheme for file nodes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
	#[default]
	Importance,
	Intent,
}

impl ColorMode {
	pub fn as_str(self) -> &'static str {
		match self {
			ColorMode::Importance => "importance",
			ColorMode::Intent => "intent",
		}
	}
}

/// Coarse architectural role parsed from a free-text intent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IntentBucket {
	Test,
	Configuration,
	Utility,
	InterfaceApi,
	DataModel,
	Infrastructure,
	BusinessLogic,
	CoreDomain,
	EntryPoint,
	Unclassified,
}

/// Substring rules in priority order. First hit wins.
const INTENT_RULES: &[(IntentBucket, &[&str])] = &[
	(IntentBucket::Test, &["test"]),
	(IntentBucket::Configuration, &["config"]),
	(IntentBucket::Utility, &["util"]),
	(IntentBucket::InterfaceApi, &["interface", "api"]),
	(IntentBucket::DataModel, &["data", "model", "entity"]),
	(IntentBucket::Infrastructure, &["infra", "adapter", "db"]),
	(IntentBucket::BusinessLogic, &["usecase", "service", "logic"]),
	(IntentBucket::CoreDomain, &["domain", "core"]),
	(IntentBucket::EntryPoint, &["main", "cmd", "entry"]),
];

impl IntentBucket {
	pub const ALL: [IntentBucket; 10] = [
		IntentBucket::EntryPoint,
		IntentBucket::CoreDomain,
		IntentBucket::BusinessLogic,
		IntentBucket::Infrastructure,
		IntentBucket::DataModel,
		IntentBucket::InterfaceApi,
		IntentBucket::Utility,
		IntentBucket::Configuration,
		IntentBucket::Test,
		IntentBucket::Unclassified,
	];

	pub fn classify(intent: &str) -> Self {
		// A database is storage plumbing, not a data model.
		let key = intent.to_lowercase().replace("database", "db");
		INTENT_RULES
			.iter()
			.find(|(_, needles)| needles.iter().any(|n| key.contains(n)))
			.map_or(IntentBucket::Unclassified, |(bucket, _)| *bucket)
	}

	pub fn color(self) -> Color {
		match self {
			IntentBucket::Test => palette::TEST,
			IntentBucket::Configuration => palette::CONFIGURATION,
			IntentBucket::Utility => palette::UTILITY,
			IntentBucket::InterfaceApi => palette::INTERFACE,
			IntentBucket::DataModel => palette::DATA_MODEL,
			IntentBucket::Infrastructure => palette::INFRASTRUCTURE,
			IntentBucket::BusinessLogic => palette::BUSINESS_LOGIC,
			IntentBucket::CoreDomain => palette::CORE_DOMAIN,
			IntentBucket::EntryPoint => palette::ENTRY_POINT,
			IntentBucket::Unclassified => palette::LOW,
		}
	}

	pub fn label(self) -> &'static str {
		match self {
			IntentBucket::Test => "test",
			IntentBucket::Configuration => "configuration",
			IntentBucket::Utility => "utility",
			IntentBucket::InterfaceApi => "interface/api",
			IntentBucket::DataModel => "data model",
			IntentBucket::Infrastructure => "infrastructure",
			IntentBucket::BusinessLogic => "business logic",
			IntentBucket::CoreDomain => "core domain",
			IntentBucket::EntryPoint => "entry point",
			IntentBucket::Unclassified => "unclassified",
		}
	}
}

pub fn importance_color(importance: Importance) -> Color {
	match importance {
		Importance::High => palette::HIGH,
		Importance::Medium => palette::MEDIUM,
		Importance::Low => palette::LOW,
	}
}

/// Visual state of one node as pushed to the layout engine.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeStyle {
	pub fill: Color,
	pub border: Color,
	pub font_color: Color,
	pub font_size: f64,
	/// Unscaled size value; the renderer maps it onto a radius range.
	pub size: f64,
}

/// Visual state of one edge.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeStyle {
	pub color: Color,
	pub opacity: f64,
	pub width: f64,
}

/// Styles for every node and edge, parallel to the model's own vectors.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphStyles {
	pub nodes: Vec<NodeStyle>,
	pub edges: Vec<EdgeStyle>,
}

/// Entries of a style sheet that changed since the previous one.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StylePatch {
	pub nodes: Vec<(usize, NodeStyle)>,
	pub edges: Vec<(usize, EdgeStyle)>,
}

impl StylePatch {
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty() && self.edges.is_empty()
	}
}

impl GraphStyles {
	/// Entries of `self` that differ from `previous` (or are new).
	pub fn diff(&self, previous: &GraphStyles) -> StylePatch {
		StylePatch {
			nodes: changed(&self.nodes, &previous.nodes),
			edges: changed(&self.edges, &previous.edges),
		}
	}
}

fn changed<T: Clone + PartialEq>(next: &[T], prev: &[T]) -> Vec<(usize, T)> {
	next.iter()
		.enumerate()
		.filter(|(i, style)| prev.get(*i) != Some(*style))
		.map(|(i, style)| (i, style.clone()))
		.collect()
}

const PACKAGE_SIZE: f64 = 20.0;
const FONT_SIZE: f64 = 14.0;
const EMPHASIS_FONT_SIZE: f64 = 16.0;

fn file_size(file: &FileNode) -> f64 {
	file.rank.map_or(5.0, |r| r * 10.0 + 5.0)
}

fn emphasized_size(file: &FileNode) -> f64 {
	file.rank.map_or(15.0, |r| r * 10.0 + 10.0)
}

/// Computes styles for a given color mode.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HighlightEngine {
	pub mode: ColorMode,
}

impl HighlightEngine {
	pub fn new(mode: ColorMode) -> Self {
		Self { mode }
	}

	pub fn base_color(&self, file: &FileNode) -> Color {
		match self.mode {
			ColorMode::Importance => importance_color(file.importance),
			ColorMode::Intent => match file.intent.as_deref() {
				Some(intent) if !intent.is_empty() => IntentBucket::classify(intent).color(),
				_ => palette::LOW,
			},
		}
	}

	/// Style at insertion time, honoring the node's `dimmed` flag.
	pub fn initial_node_style(&self, node: &GraphNode) -> NodeStyle {
		match node {
			GraphNode::Package(p) if p.dimmed => NodeStyle {
				fill: Color::rgba(30, 30, 30, 0.2),
				border: Color::rgba(50, 50, 50, 0.2),
				font_color: Color::rgba(100, 100, 100, 0.2),
				font_size: FONT_SIZE,
				size: PACKAGE_SIZE,
			},
			GraphNode::File(f) if f.dimmed => NodeStyle {
				fill: Color::rgba(50, 50, 50, 0.1),
				border: Color::rgba(100, 100, 100, 0.1),
				font_color: Color::rgba(150, 150, 150, 0.3),
				font_size: FONT_SIZE,
				size: file_size(f),
			},
			_ => self.base_node_style(node),
		}
	}

	/// Undimmed style in the current color mode.
	pub fn base_node_style(&self, node: &GraphNode) -> NodeStyle {
		match node {
			GraphNode::Package(_) => NodeStyle {
				fill: palette::PACKAGE_FILL,
				border: palette::EDGE,
				font_color: palette::PACKAGE_LABEL,
				font_size: FONT_SIZE,
				size: PACKAGE_SIZE,
			},
			GraphNode::File(f) => NodeStyle {
				fill: self.base_color(f),
				border: palette::WHITE,
				font_color: palette::LABEL,
				font_size: FONT_SIZE,
				size: file_size(f),
			},
		}
	}

	pub fn initial_edge_style(&self, edge: &GraphEdge, model: &GraphModel) -> EdgeStyle {
		let mut style = self.base_edge_style(edge, model);
		if edge.dimmed {
			style.opacity = 0.05;
		}
		style
	}

	/// Containment edges take the file's color; dependency edges the accent.
	pub fn base_edge_style(&self, edge: &GraphEdge, model: &GraphModel) -> EdgeStyle {
		match edge.kind {
			EdgeKind::Containment => EdgeStyle {
				color: model
					.node(&edge.from)
					.and_then(GraphNode::as_file)
					.map_or(palette::EDGE, |f| self.base_color(f)),
				opacity: 0.15,
				width: 1.0,
			},
			EdgeKind::InferredDependency => EdgeStyle {
				color: palette::ACCENT,
				opacity: 0.3,
				width: 1.0,
			},
		}
	}

	/// Full style sheet for `model` under the given highlight set.
	pub fn styles(&self, model: &GraphModel, highlighted: &BTreeSet<String>) -> GraphStyles {
		if highlighted.is_empty() {
			return GraphStyles {
				nodes: model.nodes().iter().map(|n| self.base_node_style(n)).collect(),
				edges: model
					.edges()
					.iter()
					.map(|e| self.base_edge_style(e, model))
					.collect(),
			};
		}

		let nodes = model
			.nodes()
			.iter()
			.map(|node| match node {
				GraphNode::Package(_) => NodeStyle {
					fill: Color::rgba(30, 30, 30, 0.1),
					border: Color::rgba(50, 50, 50, 0.1),
					font_color: Color::rgba(100, 100, 100, 0.1),
					font_size: FONT_SIZE,
					size: PACKAGE_SIZE,
				},
				GraphNode::File(f) if highlighted.contains(&f.id) => NodeStyle {
					fill: palette::EMPHASIS,
					border: palette::WHITE,
					font_color: palette::WHITE,
					font_size: EMPHASIS_FONT_SIZE,
					size: emphasized_size(f),
				},
				GraphNode::File(f) => NodeStyle {
					fill: Color::rgba(50, 50, 50, 0.05),
					border: Color::rgba(100, 100, 100, 0.05),
					font_color: Color::rgba(150, 150, 150, 0.1),
					font_size: FONT_SIZE,
					size: file_size(f),
				},
			})
			.collect();

		let is_lit = |id: &str| {
			highlighted.contains(id)
				&& model.node(id).is_some_and(|n| !n.is_package())
		};
		let edges = model
			.edges()
			.iter()
			.map(|e| {
				if is_lit(&e.from) || is_lit(&e.to) {
					EdgeStyle {
						color: palette::ACCENT,
						opacity: 0.6,
						width: 2.0,
					}
				} else {
					EdgeStyle {
						color: palette::EDGE,
						opacity: 0.02,
						width: 1.0,
					}
				}
			})
			.collect();

		GraphStyles { nodes, edges }
	}
}
