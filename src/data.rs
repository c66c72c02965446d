//! Upstream repository map records.
//!
//! The backend (or a user upload) supplies a JSON document shaped either as
//! `{ "repomap": { "files": [...] } }` or the flat `{ "files": [...] }`
//! fallback. Both resolve to the same `Vec<FileDescriptor>`.

use serde::{Deserialize, Deserializer};

use crate::error::Result;

/// Relative importance assigned by the ranking pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
	#[default]
	Low,
	Medium,
	High,
}

impl Importance {
	/// Numeric weight used for sorting (high = 3, low = 1).
	pub fn weight(self) -> u8 {
		match self {
			Importance::Low => 1,
			Importance::Medium => 2,
			Importance::High => 3,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Importance::Low => "low",
			Importance::Medium => "medium",
			Importance::High => "high",
		}
	}
}

/// Planning lifecycle of a file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleStatus {
	#[default]
	Existing,
	Planned,
	Modified,
}

impl LifecycleStatus {
	pub fn as_str(self) -> &'static str {
		match self {
			LifecycleStatus::Existing => "existing",
			LifecycleStatus::Planned => "planned",
			LifecycleStatus::Modified => "modified",
		}
	}
}

/// A validation finding attached to a file.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Issue {
	#[serde(rename = "type")]
	pub kind: String,
	#[serde(default)]
	pub description: String,
	#[serde(default)]
	pub severity: Importance,
}

/// A review note attached to a file.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Comment {
	#[serde(alias = "user")]
	pub author: String,
	#[serde(default)]
	pub text: String,
}

/// Metadata for one source file, immutable per snapshot.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct FileDescriptor {
	/// Slash-separated path, unique within a snapshot.
	pub path: String,
	#[serde(default)]
	pub language: String,
	#[serde(default)]
	pub importance: Importance,
	/// Relative centrality. Zero is treated the same as absent.
	#[serde(default)]
	pub rank: Option<f64>,
	#[serde(default, deserialize_with = "nullable")]
	pub intent: Option<String>,
	#[serde(default)]
	pub token_count: Option<u64>,
	#[serde(default, deserialize_with = "nullable")]
	pub definitions: Vec<String>,
	#[serde(default, deserialize_with = "nullable")]
	pub imports: Vec<String>,
	#[serde(default, deserialize_with = "nullable")]
	pub issues: Vec<Issue>,
	#[serde(default, deserialize_with = "nullable")]
	pub comments: Vec<Comment>,
	#[serde(default, deserialize_with = "nullable")]
	pub status: LifecycleStatus,
}

impl FileDescriptor {
	/// Minimal descriptor, mostly useful for tests and demos.
	pub fn new(path: impl Into<String>, importance: Importance) -> Self {
		Self {
			path: path.into(),
			language: String::new(),
			importance,
			rank: None,
			intent: None,
			token_count: None,
			definitions: Vec::new(),
			imports: Vec::new(),
			issues: Vec::new(),
			comments: Vec::new(),
			status: LifecycleStatus::Existing,
		}
	}

	pub fn with_rank(mut self, rank: f64) -> Self {
		self.rank = Some(rank);
		self
	}

	pub fn with_intent(mut self, intent: impl Into<String>) -> Self {
		self.intent = Some(intent.into());
		self
	}

	pub fn with_imports<I, S>(mut self, imports: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.imports = imports.into_iter().map(Into::into).collect();
		self
	}

	/// Rank if it carries any weight. Zero and missing ranks both read as `None`.
	pub fn effective_rank(&self) -> Option<f64> {
		self.rank.filter(|r| *r > 0.0)
	}

	/// Final path segment, used as the node label.
	pub fn basename(&self) -> &str {
		self.path.rsplit('/').next().unwrap_or(&self.path)
	}
}

/// Treats an explicit JSON `null` like a missing field.
fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: Default + Deserialize<'de>,
{
	Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Default, Deserialize)]
struct RepoMapSection {
	#[serde(default)]
	files: Option<Vec<FileDescriptor>>,
}

#[derive(Default, Deserialize)]
struct RepoMapDocument {
	#[serde(default)]
	repomap: Option<RepoMapSection>,
	#[serde(default)]
	files: Option<Vec<FileDescriptor>>,
}

/// Parse an upstream document into its file list.
///
/// The nested `repomap.files` list wins over the flat `files` fallback. A
/// well-formed document carrying neither yields an empty list.
pub fn parse_repo_map(json: &str) -> Result<Vec<FileDescriptor>> {
	let doc: RepoMapDocument = serde_json::from_str(json)?;
	Ok(doc
		.repomap
		.and_then(|section| section.files)
		.or(doc.files)
		.unwrap_or_default())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::DataError;

	#[test]
	fn nested_and_flat_shapes_resolve_to_same_files() {
		let nested = r#"{"repomap":{"files":[{"path":"a/x.ts","language":"ts","importance":"high","rank":0.8}]}}"#;
		let flat = r#"{"files":[{"path":"a/x.ts","language":"ts","importance":"high","rank":0.8}]}"#;
		let a = parse_repo_map(nested).unwrap();
		let b = parse_repo_map(flat).unwrap();
		assert_eq!(a, b);
		assert_eq!(a[0].importance, Importance::High);
		assert_eq!(a[0].basename(), "x.ts");
	}

	#[test]
	fn null_lists_and_missing_fields_default() {
		let json = r#"{"files":[{"path":"main.go","importance":"low","rank":0,"definitions":null,"imports":null,"token_count":12}]}"#;
		let files = parse_repo_map(json).unwrap();
		let f = &files[0];
		assert!(f.imports.is_empty());
		assert!(f.definitions.is_empty());
		assert_eq!(f.token_count, Some(12));
		assert_eq!(f.status, LifecycleStatus::Existing);
		assert_eq!(f.effective_rank(), None);
	}

	#[test]
	fn planning_fields_deserialize() {
		let json = r#"{"files":[{"path":"svc/api.go","importance":"medium","status":"planned",
			"intent":"Interface/API","issues":[{"type":"dup","description":"copy","severity":"high"}],
			"comments":[{"user":"ana","text":"split this"}]}]}"#;
		let f = &parse_repo_map(json).unwrap()[0];
		assert_eq!(f.status, LifecycleStatus::Planned);
		assert_eq!(f.issues[0].kind, "dup");
		assert_eq!(f.issues[0].severity, Importance::High);
		assert_eq!(f.comments[0].author, "ana");
	}

	#[test]
	fn document_without_files_is_empty_not_an_error() {
		assert!(parse_repo_map("{}").unwrap().is_empty());
	}

	#[test]
	fn malformed_json_is_invalid_data() {
		let err = parse_repo_map("{ files: [").unwrap_err();
		assert!(matches!(err, DataError::InvalidJson(_)));
		assert!(err.to_string().starts_with("invalid repomap data"));
	}
}
