//! Overlay panels around the canvas: header bar, story overlay, file
//! sidebar, intent legend and the highlight-from-text box.

use leptos::prelude::*;
use log::{debug, warn};
use web_sys::Event;

use super::repo_graph::component::GraphHandle;
use super::repo_graph::highlight::{ColorMode, IntentBucket, importance_color};
use super::repo_graph::layout::ViewMode;
use crate::assistant::{ChatSession, HighlightUpdate, UiContext};
use crate::data::{FileDescriptor, LifecycleStatus};

fn mode_label(mode: ViewMode) -> &'static str {
	match mode {
		ViewMode::Cluster => "Cluster",
		ViewMode::Flow => "Flow",
		ViewMode::Simple => "Simple",
		ViewMode::Table => "Table",
	}
}

/// Top bar: data upload, view modes, color mode and story toggle.
#[component]
pub fn Header(
	handle: GraphHandle,
	on_upload: impl Fn(Event) + Copy + Send + Sync + 'static,
) -> impl IntoView {
	let playing = move || handle.status.get().is_playing();

	let mode_buttons = ViewMode::ALL
		.into_iter()
		.map(|mode| {
			view! {
				<button
					class=move || if handle.view_mode.get() == mode { "mode active" } else { "mode" }
					on:click=move |_| handle.set_view_mode(mode)
				>
					{mode_label(mode)}
				</button>
			}
		})
		.collect_view();

	let toggle_color = move |_| {
		let next = match handle.color_mode.get_untracked() {
			ColorMode::Importance => ColorMode::Intent,
			ColorMode::Intent => ColorMode::Importance,
		};
		handle.set_color_mode(next);
	};

	let toggle_story = move |_| {
		if handle.status.get_untracked().is_playing() {
			handle.stop_story();
		} else {
			handle.start_story();
		}
	};

	view! {
		<header class="top-bar">
			<h1>"Repomap"</h1>
			<div class="divider" />
			<label class="upload">
				"Load JSON"
				<input type="file" accept=".json" class="hidden" on:change=on_upload />
			</label>
			<div class="divider" />
			<div class="modes">{mode_buttons}</div>
			<div class="divider" />
			<button class="color-mode" on:click=toggle_color>
				{move || format!("Color: {}", handle.color_mode.get().as_str())}
			</button>
			<div class="divider" />
			<button
				class=move || if playing() { "story stop" } else { "story" }
				on:click=toggle_story
			>
				{move || if playing() { "Stop" } else { "Play Story" }}
			</button>
		</header>
	}
}

/// Narrative card shown while a story plays.
#[component]
pub fn StoryOverlay(handle: GraphHandle) -> impl IntoView {
	let step_index = move || handle.status.get().step_index;
	let last_step = move || step_index() + 1 >= handle.step_count.get();

	view! {
		<Show when=move || handle.status.get().is_playing()>
			<div class="story-overlay">
				<div class="story-head">
					<div>
						<h2>{move || handle.step.get().map(|s| s.title).unwrap_or_default()}</h2>
						<p class="muted">
							{move || format!("Step {} of {}", step_index() + 1, handle.step_count.get())}
						</p>
					</div>
					<button class="close" on:click=move |_| handle.stop_story()>"\u{00d7}"</button>
				</div>
				<p class="story-text">{move || handle.step.get().map(|s| s.text).unwrap_or_default()}</p>
				<div class="story-controls">
					<div class="progress">
						<div
							class="progress-fill"
							style=move || format!("width: {:.0}%", handle.status.get().progress)
						/>
					</div>
					<button on:click=move |_| handle.toggle_story_pause()>
						{move || if handle.status.get().is_paused() { "\u{25b6}" } else { "\u{23f8}" }}
					</button>
					<button disabled=last_step on:click=move |_| handle.next_story_step()>
						"\u{203a}"
					</button>
				</div>
			</div>
		</Show>
	}
}

fn status_badge(status: LifecycleStatus) -> impl IntoView {
	let class = match status {
		LifecycleStatus::Existing => "badge status-existing",
		LifecycleStatus::Planned => "badge status-planned",
		LifecycleStatus::Modified => "badge status-modified",
	};
	let label = match status {
		LifecycleStatus::Existing => "Existing",
		LifecycleStatus::Planned => "Planned",
		LifecycleStatus::Modified => "Modified",
	};
	view! { <span class=class>{label}</span> }
}

fn file_details(handle: GraphHandle, file: FileDescriptor) -> impl IntoView {
	let path = StoredValue::new(file.path.clone());
	let is_highlighted = move || path.with_value(|p| handle.highlighted.with(|h| h.contains(p)));
	let color = importance_color(file.importance).to_css();
	let rank = file.rank.map_or_else(|| "0.00".to_string(), |r| format!("{r:.3}"));

	let list = |items: Vec<String>, empty: &'static str| {
		if items.is_empty() {
			view! { <span class="muted">{empty}</span> }.into_any()
		} else {
			items
				.into_iter()
				.map(|item| view! { <span class="chip">{item}</span> })
				.collect_view()
				.into_any()
		}
	};

	let issues = file
		.issues
		.iter()
		.map(|issue| {
			view! {
				<li class=format!("issue severity-{}", issue.severity.as_str())>
					<strong>{issue.kind.clone()}</strong>
					" "
					{issue.description.clone()}
				</li>
			}
		})
		.collect_view();
	let comments = file
		.comments
		.iter()
		.map(|c| view! { <li class="comment"><strong>{c.author.clone()}</strong>": "{c.text.clone()}</li> })
		.collect_view();

	view! {
		<div class="sidebar-head">
			<div class="mono path" title=file.path.clone()>{file.path.clone()}</div>
			<div class="meta">
				{status_badge(file.status)}
				<span class="mono muted">{file.language.clone()}</span>
			</div>
			<div class="actions">
				<button
					class=move || if is_highlighted() { "highlight on" } else { "highlight" }
					on:click=move |_| path.with_value(|p| handle.toggle_highlight(p))
				>
					{move || if is_highlighted() { "Clear Highlight" } else { "Highlight Node" }}
				</button>
				<button class="close" on:click=move |_| handle.select(None)>"\u{00d7}"</button>
			</div>
		</div>
		<section>
			<h3>"Intent"</h3>
			<p>
				{file
					.intent
					.clone()
					.unwrap_or_else(|| "No intent description provided for this module.".to_string())}
			</p>
		</section>
		<section class="metrics">
			<div>
				<span class="label">"Importance"</span>
				<span style=format!("color: {color}")>{file.importance.as_str().to_uppercase()}</span>
			</div>
			<div>
				<span class="label">"Rank"</span>
				<span class="mono">{rank}</span>
			</div>
			<div>
				<span class="label">"Tokens"</span>
				<span>{file.token_count.unwrap_or(0)}</span>
			</div>
		</section>
		<section>
			<h3>"Definitions"</h3>
			{list(file.definitions.clone(), "No public definitions")}
		</section>
		<section>
			<h3>"Dependencies"</h3>
			{list(file.imports.clone(), "No dependencies")}
		</section>
		<section>
			<h3>"Issues"</h3>
			<ul>{issues}</ul>
		</section>
		<section>
			<h3>"Comments"</h3>
			<ul>{comments}</ul>
		</section>
	}
}

/// Details for the selected file.
#[component]
pub fn Sidebar(handle: GraphHandle) -> impl IntoView {
	let selected_file = move || {
		let id = handle.selected.get()?;
		handle.files.with(|files| files.iter().find(|f| f.path == id).cloned())
	};

	view! {
		{move || {
			selected_file()
				.map(|file| {
					view! { <aside class="sidebar">{file_details(handle, file)}</aside> }
				})
		}}
	}
}

/// Color key for intent mode.
#[component]
pub fn IntentLegend(handle: GraphHandle) -> impl IntoView {
	let entries = IntentBucket::ALL
		.into_iter()
		.map(|bucket| {
			view! {
				<li>
					<span class="swatch" style=format!("background: {}", bucket.color().to_css()) />
					{bucket.label()}
				</li>
			}
		})
		.collect_view();

	view! {
		<ul
			class="legend"
			style=move || {
				if handle.color_mode.get() == ColorMode::Intent { "" } else { "display: none" }
			}
		>
			{entries}
		</ul>
	}
}

/// Question box bound to the assistant session. A question highlights the
/// files it mentions; a pasted reply (plain or streamed `data:` lines) is
/// appended to the conversation and highlights the files it names.
#[component]
pub fn HighlightBox(handle: GraphHandle, session_id: String) -> impl IntoView {
	let text = RwSignal::new(String::new());
	let session = StoredValue::new(ChatSession::new(session_id));

	let apply = move |update: HighlightUpdate| match update {
		HighlightUpdate::Replace(paths) => handle.set_highlighted(paths),
		HighlightUpdate::Clear => handle.clear_highlights(),
		HighlightUpdate::Keep => {}
	};

	let ask = move || {
		let context = UiContext {
			selected_node: handle.selected.get_untracked().unwrap_or_default(),
			view_mode: handle.view_mode.get_untracked().as_str().to_string(),
		};
		let question = text.get_untracked();
		match session.try_update_value(|s| s.ask(&question, &context)) {
			Some(Ok(request)) => debug!("repomap-viz: chat request {request}"),
			Some(Err(e)) => warn!("repomap-viz: could not encode chat request: {e}"),
			None => return,
		}
		let update = handle.files.with_untracked(|files| session.with_value(|s| s.highlight_update(files)));
		apply(update);
	};

	let receive = move || {
		let body = text.get_untracked();
		let added = session.try_update_value(|s| s.receive(&body)).unwrap_or(0);
		if added == 0 {
			return;
		}
		let update = handle.files.with_untracked(|files| session.with_value(|s| s.highlight_update(files)));
		apply(update);
		text.set(String::new());
	};

	view! {
		<form
			class="highlight-box"
			on:submit=move |ev| {
				ev.prevent_default();
				ask();
			}
		>
			<input
				type="text"
				placeholder="Ask about files, or paste a reply..."
				prop:value=move || text.get()
				on:input=move |ev| text.set(event_target_value(&ev))
			/>
			<button type="submit">"Ask"</button>
			<button type="button" on:click=move |_| receive()>
				"Reply"
			</button>
			<button
				type="button"
				on:click=move |_| {
					text.set(String::new());
					handle.clear_highlights();
				}
			>
				"Reset"
			</button>
		</form>
	}
}
