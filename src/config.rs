//! Runtime configuration, read from an optional `<script id="repomap-config">`.

use log::warn;
use serde::Deserialize;

use crate::components::repo_graph::layout::{FlowConfig, GridConfig};
use crate::components::repo_graph::state::PhysicsConfig;
use crate::components::repo_graph::story::{StoryStep, StoryTimings, default_steps};

/// Every section falls back to its defaults when absent.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct VizConfig {
	pub story: StoryTimings,
	pub physics: PhysicsConfig,
	pub grid: GridConfig,
	pub flow: FlowConfig,
	/// Replaces the built-in narrative when present and non-empty.
	pub steps: Option<Vec<StoryStep>>,
	/// Chat session id assigned by the host page.
	pub session_id: Option<String>,
}

impl VizConfig {
	/// Parse config JSON, logging and falling back to defaults on error.
	pub fn from_json(text: &str) -> Self {
		if text.trim().is_empty() {
			return Self::default();
		}
		serde_json::from_str(text).unwrap_or_else(|e| {
			warn!("repomap-viz: ignoring invalid config: {e}");
			Self::default()
		})
	}

	pub fn story_steps(&self) -> Vec<StoryStep> {
		match &self.steps {
			Some(steps) if !steps.is_empty() => steps.clone(),
			_ => default_steps(),
		}
	}

	pub fn session_id(&self) -> &str {
		self.session_id.as_deref().filter(|id| !id.is_empty()).unwrap_or("local")
	}
}
