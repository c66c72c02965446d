//! Canonical node/edge set derived from a flat file list.
//!
//! Files are grouped under synthetic package nodes, one per directory. Each
//! file gets a containment edge to its package plus best-effort dependency
//! edges inferred from its import identifiers. The model is append-only
//! between clears, which lets the view layer sync it to the layout engine by
//! pushing whatever lies past its last synced length.

use std::collections::HashMap;

use crate::data::{FileDescriptor, Importance};

/// Id prefix for synthetic directory nodes.
pub const PACKAGE_PREFIX: &str = "pkg:";

/// Directory assigned to files that sit at the repository root.
pub const ROOT_DIRECTORY: &str = ".";

/// Directory part of a slash-separated path.
pub fn directory_of(path: &str) -> &str {
	match path.rfind('/') {
		Some(idx) if idx > 0 => &path[..idx],
		_ => ROOT_DIRECTORY,
	}
}

pub fn package_id(directory: &str) -> String {
	format!("{PACKAGE_PREFIX}{directory}")
}

pub fn is_package_id(id: &str) -> bool {
	id.starts_with(PACKAGE_PREFIX)
}

/// A source file in the graph.
#[derive(Clone, Debug, PartialEq)]
pub struct FileNode {
	pub id: String,
	pub label: String,
	/// Id of the owning package node.
	pub package: String,
	pub importance: Importance,
	/// Centrality, `None` when missing or zero.
	pub rank: Option<f64>,
	pub intent: Option<String>,
	pub dimmed: bool,
}

/// A directory, created lazily with its first child.
#[derive(Clone, Debug, PartialEq)]
pub struct PackageNode {
	pub id: String,
	pub directory: String,
	pub dimmed: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum GraphNode {
	File(FileNode),
	Package(PackageNode),
}

impl GraphNode {
	pub fn id(&self) -> &str {
		match self {
			GraphNode::File(f) => &f.id,
			GraphNode::Package(p) => &p.id,
		}
	}

	pub fn label(&self) -> &str {
		match self {
			GraphNode::File(f) => &f.label,
			GraphNode::Package(p) => &p.directory,
		}
	}

	pub fn as_file(&self) -> Option<&FileNode> {
		match self {
			GraphNode::File(f) => Some(f),
			GraphNode::Package(_) => None,
		}
	}

	pub fn is_package(&self) -> bool {
		matches!(self, GraphNode::Package(_))
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgeKind {
	/// File to its own package. Exactly one per file when edges are requested.
	Containment,
	/// File to another package whose directory its import names.
	InferredDependency,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphEdge {
	pub from: String,
	pub to: String,
	pub kind: EdgeKind,
	pub dimmed: bool,
}

/// Node/edge store. Creation order is preserved and significant.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphModel {
	nodes: Vec<GraphNode>,
	edges: Vec<GraphEdge>,
	index: HashMap<String, usize>,
	/// Package node positions in creation order; import matching walks this.
	packages: Vec<usize>,
}

impl GraphModel {
	pub fn new() -> Self {
		Self::default()
	}

	/// Replace the whole graph with one built from `files`, in input order.
	pub fn rebuild(&mut self, files: &[FileDescriptor]) {
		self.clear();
		for file in files {
			self.add_node(file, true, false);
		}
	}

	/// Insert one file (and its package if new). Returns `false` if a node
	/// with that id was already present, in which case nothing changes.
	pub fn add_node(&mut self, file: &FileDescriptor, with_edges: bool, dimmed: bool) -> bool {
		if self.index.contains_key(&file.path) {
			return false;
		}

		let directory = directory_of(&file.path);
		let pkg_id = package_id(directory);
		if !self.index.contains_key(&pkg_id) {
			let pos = self.push_node(GraphNode::Package(PackageNode {
				id: pkg_id.clone(),
				directory: directory.to_string(),
				dimmed,
			}));
			self.packages.push(pos);
		}

		self.push_node(GraphNode::File(FileNode {
			id: file.path.clone(),
			label: file.basename().to_string(),
			package: pkg_id.clone(),
			importance: file.importance,
			rank: file.effective_rank(),
			intent: file.intent.clone(),
			dimmed,
		}));

		if with_edges {
			self.edges.push(GraphEdge {
				from: file.path.clone(),
				to: pkg_id.clone(),
				kind: EdgeKind::Containment,
				dimmed,
			});

			for import in &file.imports {
				if let Some(target) = self.match_import(import, &pkg_id) {
					self.edges.push(GraphEdge {
						from: file.path.clone(),
						to: target,
						kind: EdgeKind::InferredDependency,
						dimmed,
					});
				}
			}
		}
		true
	}

	/// Drop every node and edge.
	pub fn clear(&mut self) {
		self.nodes.clear();
		self.edges.clear();
		self.index.clear();
		self.packages.clear();
	}

	/// First package whose directory label ends the import, unless that is
	/// the importer's own package. Relative imports stay inside the package
	/// and never produce an edge.
	fn match_import(&self, import: &str, own_package: &str) -> Option<String> {
		if import.starts_with('.') {
			return None;
		}
		let target = self.packages.iter().find_map(|&pos| match &self.nodes[pos] {
			GraphNode::Package(p) if import.ends_with(p.directory.as_str()) => Some(&p.id),
			_ => None,
		})?;
		(target != own_package).then(|| target.clone())
	}

	fn push_node(&mut self, node: GraphNode) -> usize {
		let pos = self.nodes.len();
		self.index.insert(node.id().to_string(), pos);
		self.nodes.push(node);
		pos
	}

	pub fn nodes(&self) -> &[GraphNode] {
		&self.nodes
	}

	pub fn edges(&self) -> &[GraphEdge] {
		&self.edges
	}

	pub fn node(&self, id: &str) -> Option<&GraphNode> {
		self.index.get(id).map(|&pos| &self.nodes[pos])
	}

	pub fn contains(&self, id: &str) -> bool {
		self.index.contains_key(id)
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn packages(&self) -> impl Iterator<Item = &PackageNode> {
		self.packages.iter().filter_map(|&pos| match &self.nodes[pos] {
			GraphNode::Package(p) => Some(p),
			GraphNode::File(_) => None,
		})
	}

	pub fn files(&self) -> impl Iterator<Item = &FileNode> {
		self.nodes.iter().filter_map(GraphNode::as_file)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample() -> Vec<FileDescriptor> {
		vec![
			FileDescriptor::new("a/x.ts", Importance::High).with_rank(0.8),
			FileDescriptor::new("a/y.ts", Importance::Low).with_rank(0.1),
			FileDescriptor::new("b/z.ts", Importance::Medium).with_rank(0.4),
		]
	}

	fn ids(model: &GraphModel) -> Vec<&str> {
		model.nodes().iter().map(GraphNode::id).collect()
	}

	fn edge_pairs(model: &GraphModel) -> Vec<(&str, &str)> {
		model
			.edges()
			.iter()
			.map(|e| (e.from.as_str(), e.to.as_str()))
			.collect()
	}

	#[test]
	fn rebuild_groups_files_under_packages_in_input_order() {
		let mut model = GraphModel::new();
		model.rebuild(&sample());
		assert_eq!(ids(&model), ["pkg:a", "a/x.ts", "a/y.ts", "pkg:b", "b/z.ts"]);
		assert_eq!(
			edge_pairs(&model),
			[("a/x.ts", "pkg:a"), ("a/y.ts", "pkg:a"), ("b/z.ts", "pkg:b")]
		);
		assert!(model.edges().iter().all(|e| e.kind == EdgeKind::Containment));
	}

	#[test]
	fn directory_derivation() {
		assert_eq!(directory_of("src/lib/a.rs"), "src/lib");
		assert_eq!(directory_of("main.go"), ".");
		assert_eq!(directory_of("/abs.go"), ".");
		assert_eq!(package_id(directory_of("main.go")), "pkg:.");
	}

	#[test]
	fn duplicate_paths_are_inserted_once() {
		let mut files = sample();
		files.push(FileDescriptor::new("a/x.ts", Importance::Low));
		let mut model = GraphModel::new();
		model.rebuild(&files);
		assert_eq!(model.nodes().len(), 5);
		assert_eq!(model.edges().len(), 3);
		let x = model.node("a/x.ts").and_then(GraphNode::as_file).unwrap();
		assert_eq!(x.importance, Importance::High);
	}

	#[test]
	fn add_node_is_idempotent_and_respects_flags() {
		let mut model = GraphModel::new();
		let f = FileDescriptor::new("pkg/util/str.go", Importance::Low);
		assert!(model.add_node(&f, false, true));
		assert!(!model.add_node(&f, true, false));
		assert!(model.edges().is_empty());
		let node = model.node("pkg/util/str.go").and_then(GraphNode::as_file).unwrap();
		assert!(node.dimmed);
		assert_eq!(node.label, "str.go");
	}

	#[test]
	fn imports_match_other_packages_by_suffix() {
		let files = vec![
			FileDescriptor::new("internal/graph/builder.go", Importance::High),
			FileDescriptor::new("cmd/repomap/main.go", Importance::Medium).with_imports([
				"github.com/acme/repomap/internal/graph",
				"./local",
				"fmt",
			]),
		];
		let mut model = GraphModel::new();
		model.rebuild(&files);
		let deps: Vec<_> = model
			.edges()
			.iter()
			.filter(|e| e.kind == EdgeKind::InferredDependency)
			.collect();
		assert_eq!(deps.len(), 1);
		assert_eq!(deps[0].from, "cmd/repomap/main.go");
		assert_eq!(deps[0].to, "pkg:internal/graph");
	}

	#[test]
	fn import_matching_own_package_first_draws_nothing() {
		let files = vec![
			FileDescriptor::new("lib/a.ts", Importance::Low).with_imports(["shared/lib"]),
			FileDescriptor::new("shared/lib/b.ts", Importance::Low),
		];
		let mut model = GraphModel::new();
		model.rebuild(&files);
		// `lib` is the only package that exists when lib/a.ts is inserted
		assert_eq!(model.edges().len(), 2);
		assert!(model.edges().iter().all(|e| e.kind == EdgeKind::Containment));
	}

	#[test]
	fn repeated_dependency_edges_are_kept() {
		let files = vec![
			FileDescriptor::new("core/a.go", Importance::Low),
			FileDescriptor::new("app/b.go", Importance::Low).with_imports(["x/core", "y/core"]),
		];
		let mut model = GraphModel::new();
		model.rebuild(&files);
		let deps = model
			.edges()
			.iter()
			.filter(|e| e.kind == EdgeKind::InferredDependency && e.to == "pkg:core")
			.count();
		assert_eq!(deps, 2);
	}

	#[test]
	fn clear_matches_fresh_model() {
		let mut model = GraphModel::new();
		model.rebuild(&sample());
		model.clear();
		assert_eq!(model, GraphModel::new());
		assert_eq!(model.packages().count(), 0);
	}
}
