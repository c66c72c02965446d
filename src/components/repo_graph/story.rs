//! Scripted reveal of the graph, one narrative step at a time.
//!
//! The controller is a timer-driven state machine. Every call to [`tick`]
//! performs one unit of work against a [`StoryStage`] and returns the delay
//! after which the host should call it again. Nothing here sleeps or owns a
//! timer: the host schedules continuations and passes back the
//! [`Generation`] it got from [`start`]. Any stop or restart bumps the
//! generation, turning continuations that were already queued into no-ops.
//!
//! [`tick`]: StoryController::tick
//! [`start`]: StoryController::start

use std::time::Duration;

use log::debug;
use serde::Deserialize;

use crate::data::{FileDescriptor, Importance, LifecycleStatus};

/// Named filter selecting which files a step reveals.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoryPredicate {
	/// High importance and rank above 0.5.
	CoreModules,
	/// Medium importance, or high importance with rank at most 0.5.
	SupportingLogic,
	Importance { level: Importance },
	Status { status: LifecycleStatus },
	/// Case-insensitive substring of the intent text.
	IntentContains { needle: String },
	PathPrefix { prefix: String },
	All,
}

impl StoryPredicate {
	pub fn matches(&self, file: &FileDescriptor) -> bool {
		match self {
			StoryPredicate::CoreModules => {
				file.importance == Importance::High && file.rank.is_some_and(|r| r > 0.5)
			}
			StoryPredicate::SupportingLogic => {
				file.importance == Importance::Medium
					|| (file.importance == Importance::High && file.rank.is_some_and(|r| r <= 0.5))
			}
			StoryPredicate::Importance { level } => file.importance == *level,
			StoryPredicate::Status { status } => file.status == *status,
			StoryPredicate::IntentContains { needle } => file
				.intent
				.as_deref()
				.is_some_and(|i| i.to_lowercase().contains(&needle.to_lowercase())),
			StoryPredicate::PathPrefix { prefix } => file.path.starts_with(prefix.as_str()),
			StoryPredicate::All => true,
		}
	}
}

/// One phase of the narrative.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct StoryStep {
	pub title: String,
	pub text: String,
	#[serde(alias = "filter")]
	pub predicate: StoryPredicate,
}

impl StoryStep {
	pub fn new(title: &str, text: &str, predicate: StoryPredicate) -> Self {
		Self {
			title: title.to_string(),
			text: text.to_string(),
			predicate,
		}
	}
}

/// The built-in three-act narrative: core, logic, application.
pub fn default_steps() -> Vec<StoryStep> {
	vec![
		StoryStep::new(
			"The Foundation",
			"Every great app starts with a solid core. These high-rank modules define the data structures and utilities that power everything else.",
			StoryPredicate::CoreModules,
		),
		StoryStep::new(
			"The Logic",
			"Building upon the core, these modules implement the business logic and algorithms. The complexity grows as the graph expands.",
			StoryPredicate::SupportingLogic,
		),
		StoryStep::new(
			"The Application",
			"Finally, the interface layers and entry points connect the logic to the user. The architecture is complete.",
			StoryPredicate::Importance {
				level: Importance::Low,
			},
		),
	]
}

/// Pacing of the reveal, in milliseconds.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct StoryTimings {
	/// Hold after framing the whole graph at the start of a step.
	pub overview_settle_ms: u64,
	/// Hold after each revealed node.
	pub reveal_ms: u64,
	/// Hold once a step's batch is exhausted.
	pub step_pause_ms: u64,
	/// Short gap before the next step starts.
	pub step_gap_ms: u64,
	/// Re-poll interval while paused.
	pub pause_poll_ms: u64,
	/// Camera zoom when focusing a revealed node.
	pub focus_scale: f64,
	pub focus_duration_ms: u64,
	pub fit_duration_ms: u64,
}

impl Default for StoryTimings {
	fn default() -> Self {
		Self {
			overview_settle_ms: 1100,
			reveal_ms: 650,
			step_pause_ms: 2500,
			step_gap_ms: 100,
			pause_poll_ms: 100,
			focus_scale: 1.2,
			focus_duration_ms: 400,
			fit_duration_ms: 1000,
		}
	}
}

/// Graph-side effects a story run needs.
pub trait StoryStage {
	/// Empty the graph before the first step.
	fn clear(&mut self);
	/// Frame the whole graph.
	fn overview(&mut self);
	/// Add `file` with its edges and bring it into focus.
	fn reveal(&mut self, file: &FileDescriptor);
}

/// Liveness token for one story run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Generation(u64);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StoryPhase {
	#[default]
	Idle,
	Playing,
	Paused,
}

/// Snapshot for overlays and progress bars.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StoryStatus {
	pub phase: StoryPhase,
	pub step_index: usize,
	pub batch_index: usize,
	/// Progress through the current step, 0 to 100.
	pub progress: f64,
}

impl StoryStatus {
	pub fn is_playing(&self) -> bool {
		self.phase != StoryPhase::Idle
	}

	pub fn is_paused(&self) -> bool {
		self.phase == StoryPhase::Paused
	}
}

#[derive(Clone, Debug, PartialEq)]
pub enum StoryEvent {
	StepStarted { step: usize },
	Progress { step: usize, percent: f64 },
	Revealed { step: usize, path: String },
	Completed,
}

/// Outcome of one tick: what happened, and when to tick again.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StoryTick {
	/// `None` means the run is over (or the tick was stale).
	pub next: Option<Duration>,
	pub events: Vec<StoryEvent>,
}

impl StoryTick {
	pub fn completed(&self) -> bool {
		self.events.contains(&StoryEvent::Completed)
	}

	fn after(mut self, ms: u64) -> Self {
		self.next = Some(Duration::from_millis(ms));
		self
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Cursor {
	/// Step not started; frame the graph first.
	#[default]
	Overview,
	/// Framed and settled; report 0% and begin revealing.
	Opening,
	Revealing,
	/// Skip requested; close the step without revealing the rest.
	Skipping,
	/// Inter-step hold is running; advance on the next tick.
	StepEnd,
}

pub struct StoryController {
	steps: Vec<StoryStep>,
	timings: StoryTimings,
	generation: u64,
	phase: StoryPhase,
	step_index: usize,
	batch_index: usize,
	progress: f64,
	cursor: Cursor,
}

impl StoryController {
	pub fn new(steps: Vec<StoryStep>, timings: StoryTimings) -> Self {
		Self {
			steps,
			timings,
			generation: 0,
			phase: StoryPhase::Idle,
			step_index: 0,
			batch_index: 0,
			progress: 0.0,
			cursor: Cursor::Overview,
		}
	}

	pub fn steps(&self) -> &[StoryStep] {
		&self.steps
	}

	pub fn timings(&self) -> &StoryTimings {
		&self.timings
	}

	pub fn current_step(&self) -> Option<&StoryStep> {
		self.is_active().then(|| self.steps.get(self.step_index)).flatten()
	}

	pub fn is_active(&self) -> bool {
		self.phase != StoryPhase::Idle
	}

	pub fn status(&self) -> StoryStatus {
		StoryStatus {
			phase: self.phase,
			step_index: self.step_index,
			batch_index: self.batch_index,
			progress: self.progress,
		}
	}

	/// Begin a run from the first step on an empty graph. Restarting while
	/// active abandons the previous run.
	pub fn start(&mut self, stage: &mut impl StoryStage) -> Generation {
		self.reset();
		self.generation += 1;
		self.phase = StoryPhase::Playing;
		stage.clear();
		debug!("repomap-viz: story run {} started", self.generation);
		Generation(self.generation)
	}

	/// Cancel the run. Returns `false` if nothing was playing.
	pub fn stop(&mut self) -> bool {
		if !self.is_active() {
			return false;
		}
		self.reset();
		self.generation += 1;
		true
	}

	pub fn pause(&mut self) {
		if self.phase == StoryPhase::Playing {
			self.phase = StoryPhase::Paused;
		}
	}

	pub fn resume(&mut self) {
		if self.phase == StoryPhase::Paused {
			self.phase = StoryPhase::Playing;
		}
	}

	pub fn toggle_pause(&mut self) {
		match self.phase {
			StoryPhase::Playing => self.pause(),
			StoryPhase::Paused => self.resume(),
			StoryPhase::Idle => {}
		}
	}

	/// Close the current step early: the next tick reports 100% and starts
	/// the inter-step hold without revealing the remaining files. Returns
	/// `false` when there is nothing left to skip.
	pub fn next_step(&mut self) -> bool {
		if !self.is_active() || self.step_index >= self.steps.len() {
			return false;
		}
		match self.cursor {
			Cursor::StepEnd | Cursor::Skipping => false,
			_ => {
				self.cursor = Cursor::Skipping;
				true
			}
		}
	}

	/// Advance the run by one unit of work.
	pub fn tick(
		&mut self,
		generation: Generation,
		files: &[FileDescriptor],
		stage: &mut impl StoryStage,
	) -> StoryTick {
		let mut tick = StoryTick::default();
		if generation.0 != self.generation || !self.is_active() {
			return tick;
		}
		if self.phase == StoryPhase::Paused {
			return tick.after(self.timings.pause_poll_ms);
		}
		if self.step_index >= self.steps.len() {
			tick.events.push(StoryEvent::Completed);
			self.reset();
			self.generation += 1;
			return tick;
		}

		let step = self.step_index;
		match self.cursor {
			Cursor::Overview => {
				stage.overview();
				self.cursor = Cursor::Opening;
				debug!("repomap-viz: story step {step} '{}'", self.steps[step].title);
				tick.events.push(StoryEvent::StepStarted { step });
				tick.after(self.timings.overview_settle_ms)
			}
			Cursor::Opening | Cursor::Revealing => {
				if self.cursor == Cursor::Opening {
					self.cursor = Cursor::Revealing;
					self.progress = 0.0;
					tick.events.push(StoryEvent::Progress { step, percent: 0.0 });
				}
				let predicate = &self.steps[step].predicate;
				let batch: Vec<&FileDescriptor> =
					files.iter().filter(|f| predicate.matches(f)).collect();

				match batch.get(self.batch_index) {
					Some(file) => {
						stage.reveal(file);
						self.batch_index += 1;
						self.progress = self.batch_index as f64 / batch.len() as f64 * 100.0;
						tick.events.push(StoryEvent::Revealed {
							step,
							path: file.path.clone(),
						});
						tick.events.push(StoryEvent::Progress {
							step,
							percent: self.progress,
						});
						tick.after(self.timings.reveal_ms)
					}
					None => {
						if batch.is_empty() {
							self.progress = 100.0;
							tick.events.push(StoryEvent::Progress { step, percent: 100.0 });
						}
						self.cursor = Cursor::StepEnd;
						tick.after(self.timings.step_pause_ms)
					}
				}
			}
			Cursor::Skipping => {
				self.progress = 100.0;
				self.cursor = Cursor::StepEnd;
				tick.events.push(StoryEvent::Progress { step, percent: 100.0 });
				tick.after(self.timings.step_pause_ms)
			}
			Cursor::StepEnd => {
				self.step_index += 1;
				self.batch_index = 0;
				self.cursor = Cursor::Overview;
				tick.after(self.timings.step_gap_ms)
			}
		}
	}

	fn reset(&mut self) {
		self.phase = StoryPhase::Idle;
		self.step_index = 0;
		self.batch_index = 0;
		self.progress = 0.0;
		self.cursor = Cursor::Overview;
	}
}
