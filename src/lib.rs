//! repomap-viz: interactive repository map for the browser.
//!
//! Renders a repository's files as a graph grouped by directory, colored by
//! importance or intent, with a scripted "story" that reveals the codebase
//! step by step. Data comes from a `repomap.json` embedded in the page or
//! uploaded by the user.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{Event, FileReader, HtmlInputElement, HtmlScriptElement, Window};

pub mod assistant;
pub mod components;
pub mod config;
pub mod data;
pub mod error;

use components::panels::{Header, HighlightBox, IntentLegend, Sidebar, StoryOverlay};
use components::repo_graph::layout::ViewMode;
use components::table::TableView;
pub use components::repo_graph::{GraphHandle, RepoGraph, RepoGraphCanvas, Theme};
pub use config::VizConfig;
pub use data::{FileDescriptor, parse_repo_map};
pub use error::DataError;

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("repomap-viz: logging initialized");
}

/// Text of the `<script>` element with the given id, if present.
fn script_text(id: &str) -> Option<String> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id(id)?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	script.text().ok()
}

/// Load config from a script element with id="repomap-config".
fn load_config() -> VizConfig {
	script_text("repomap-config")
		.map(|text| VizConfig::from_json(&text))
		.unwrap_or_default()
}

/// Load files from a script element with id="repomap-data".
/// Expected format: `{ repomap: { files: [...] } }` or `{ files: [...] }`.
fn load_repo_map() -> Option<Result<Vec<FileDescriptor>, DataError>> {
	let text = script_text("repomap-data")?;
	if text.trim().is_empty() {
		return None;
	}
	Some(parse_repo_map(&text))
}

/// Parse what a `FileReader` produced. Anything but a string is a read failure.
fn parse_upload(result: Option<String>) -> Result<Vec<FileDescriptor>, DataError> {
	result
		.ok_or_else(|| DataError::Read("upload is not text".to_string()))
		.and_then(|text| parse_repo_map(&text))
}

/// Read an uploaded file and hand its parsed content, or the read failure,
/// to `done`. Exactly one of the reader's load and error events fires.
fn read_upload(ev: &Event, done: impl Fn(Result<Vec<FileDescriptor>, DataError>) + Copy + 'static) {
	let Some(file) = ev
		.target()
		.and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
		.and_then(|input| input.files())
		.and_then(|list| list.get(0))
	else {
		return;
	};
	let reader = match FileReader::new() {
		Ok(reader) => reader,
		Err(e) => return done(Err(DataError::Read(format!("{e:?}")))),
	};

	let result_reader = reader.clone();
	let onload = Closure::once_into_js(move || {
		done(parse_upload(result_reader.result().ok().and_then(|v| v.as_string())));
	});
	let error_reader = reader.clone();
	let onerror = Closure::once_into_js(move || {
		let reason = error_reader
			.error()
			.map(|e| e.message())
			.unwrap_or_else(|| "unknown error".to_string());
		done(Err(DataError::Read(reason)));
	});
	reader.set_onload(Some(onload.unchecked_ref()));
	reader.set_onerror(Some(onerror.unchecked_ref()));
	if let Err(e) = reader.read_as_text(&file) {
		reader.set_onload(None);
		reader.set_onerror(None);
		done(Err(DataError::Read(format!("{e:?}"))));
	}
}

/// Main application component.
/// Loads data and config from the DOM and lays out the graph with its panels.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let theme = Theme::default();
	let config = load_config();
	let session_id = config.session_id().to_string();
	let handle = GraphHandle::new(config, &theme);
	let error = RwSignal::new(None::<String>);

	let apply = move |parsed: Result<Vec<FileDescriptor>, DataError>| match parsed {
		Ok(files) => {
			info!("repomap-viz: loaded {} files", files.len());
			error.set(None);
			handle.set_files(files);
		}
		Err(e) => {
			warn!("repomap-viz: {e}");
			error.set(Some(e.to_string()));
		}
	};

	if let Some(parsed) = load_repo_map() {
		apply(parsed);
	}

	let on_upload = move |ev: Event| read_upload(&ev, apply);
	let on_table_select = move |path: String| handle.select(Some(path));
	let graph_visible = Signal::derive(move || handle.view_mode.get().shows_graph());

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />
		<Title text="Repomap" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="fullscreen-graph">
			<Header handle=handle on_upload=on_upload />
			<RepoGraphCanvas handle=handle visible=graph_visible fullscreen=true />
			<Show when=move || handle.view_mode.get() == ViewMode::Table>
				<TableView files=handle.files on_select=on_table_select />
			</Show>
			<Show when=move || handle.files.with(Vec::is_empty) && !handle.status.get().is_playing()>
				<div class="empty-state">
					<p>"Upload a " <code>"repomap.json"</code> " to explore"</p>
				</div>
			</Show>
			{move || error.get().map(|message| view! {
				<div class="error-notice" on:click=move |_| error.set(None)>
					<strong>"Invalid data"</strong>
					<span>{message}</span>
				</div>
			})}
			<StoryOverlay handle=handle />
			<Sidebar handle=handle />
			<IntentLegend handle=handle />
			<HighlightBox handle=handle session_id=session_id />
		</div>
	}
}
