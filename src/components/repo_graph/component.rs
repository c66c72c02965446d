//! Leptos component wrapping the repository graph canvas.
//!
//! [`GraphHandle`] owns the [`RepoGraph`] for the lifetime of the app and is
//! shared with the panels. The canvas component sizes itself, wires mouse and
//! wheel handlers to the layout, and runs a `requestAnimationFrame` loop that
//! advances the simulation and redraws. Story continuations run on browser
//! timeouts keyed by the run's generation. Once the canvas leaves the
//! document the handle is torn down and every later call is a no-op.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use leptos::prelude::*;
use log::{info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::highlight::ColorMode;
use super::layout::ViewMode;
use super::model::is_package_id;
use super::render;
use super::state::ForceLayout;
use super::story::{Generation, StoryStatus, StoryStep};
use super::theme::Theme;
use super::view::RepoGraph;
use crate::config::VizConfig;
use crate::data::FileDescriptor;

/// Fixed simulation step per animation frame, seconds.
const FRAME_DT: f64 = 0.016;

/// Shared, copyable access to the graph plus the signals panels render from.
#[derive(Clone, Copy)]
pub struct GraphHandle {
	graph: StoredValue<Option<RepoGraph<ForceLayout>>, LocalStorage>,
	timer: StoredValue<Option<TimeoutHandle>>,
	pub files: RwSignal<Vec<FileDescriptor>>,
	pub status: RwSignal<StoryStatus>,
	pub step: RwSignal<Option<StoryStep>>,
	pub step_count: RwSignal<usize>,
	pub selected: RwSignal<Option<String>>,
	pub highlighted: RwSignal<Vec<String>>,
	pub view_mode: RwSignal<ViewMode>,
	pub color_mode: RwSignal<ColorMode>,
}

impl GraphHandle {
	pub fn new(config: VizConfig, theme: &Theme) -> Self {
		let layout = ForceLayout::new(800.0, 600.0, config.physics.clone(), theme.radius_range);
		let graph = RepoGraph::new(layout, config);
		let step_count = graph.story_steps().len();
		Self {
			graph: StoredValue::new_local(Some(graph)),
			timer: StoredValue::new(None),
			files: RwSignal::new(Vec::new()),
			status: RwSignal::new(StoryStatus::default()),
			step: RwSignal::new(None),
			step_count: RwSignal::new(step_count),
			selected: RwSignal::new(None),
			highlighted: RwSignal::new(Vec::new()),
			view_mode: RwSignal::new(ViewMode::default()),
			color_mode: RwSignal::new(ColorMode::default()),
		}
	}

	/// Run `f` against the live graph and republish its state. `None` once
	/// torn down.
	fn update<R>(&self, f: impl FnOnce(&mut RepoGraph<ForceLayout>) -> R) -> Option<R> {
		let out = self.graph.try_update_value(|g| g.as_mut().map(f)).flatten()?;
		self.publish();
		Some(out)
	}

	fn with<R>(&self, f: impl FnOnce(&RepoGraph<ForceLayout>) -> R) -> Option<R> {
		self.graph.try_with_value(|g| g.as_ref().map(f)).flatten()
	}

	fn publish(&self) {
		let snapshot = self.with(|g| {
			(
				g.story_status(),
				g.current_step().cloned(),
				g.selection().selected().map(str::to_string),
				g.selection().highlighted().iter().cloned().collect::<Vec<_>>(),
			)
		});
		let Some((status, step, selected, highlighted)) = snapshot else {
			return;
		};
		self.status.set(status);
		self.step.set(step);
		self.selected.set(selected);
		self.highlighted.set(highlighted);
	}

	pub fn set_files(&self, files: Vec<FileDescriptor>) {
		self.cancel_timer();
		self.files.set(files.clone());
		self.update(|g| g.set_files(files));
	}

	pub fn set_view_mode(&self, mode: ViewMode) {
		self.view_mode.set(mode);
		self.update(|g| g.set_view_mode(mode));
	}

	pub fn set_color_mode(&self, mode: ColorMode) {
		self.color_mode.set(mode);
		self.update(|g| g.set_color_mode(mode));
	}

	pub fn select(&self, id: Option<String>) {
		self.update(|g| g.select(id));
	}

	pub fn toggle_highlight(&self, id: &str) {
		self.update(|g| g.toggle_highlight(id));
	}

	pub fn set_highlighted(&self, ids: Vec<String>) {
		self.update(|g| g.set_highlighted(ids));
	}

	pub fn clear_highlights(&self) {
		self.update(|g| g.clear_highlights());
	}

	pub fn start_story(&self) {
		self.cancel_timer();
		if let Some(generation) = self.update(|g| g.start_story()) {
			self.schedule(generation, Duration::ZERO);
		}
	}

	pub fn stop_story(&self) {
		self.cancel_timer();
		self.update(|g| g.stop_story());
	}

	pub fn toggle_story_pause(&self) {
		self.update(|g| g.toggle_story_pause());
	}

	pub fn next_story_step(&self) {
		self.update(|g| g.next_story_step());
	}

	fn schedule(&self, generation: Generation, delay: Duration) {
		let handle = *self;
		match set_timeout_with_handle(move || handle.run_story(generation), delay) {
			Ok(timeout) => self.timer.set_value(Some(timeout)),
			Err(e) => warn!("repomap-viz: could not schedule story step: {e:?}"),
		}
	}

	fn run_story(&self, generation: Generation) {
		self.timer.set_value(None);
		let next = self.update(|g| g.story_tick(generation)).and_then(|tick| tick.next);
		if let Some(delay) = next {
			self.schedule(generation, delay);
		}
	}

	fn cancel_timer(&self) {
		if let Some(timeout) = self.timer.try_update_value(Option::take).flatten() {
			timeout.clear();
		}
	}

	/// Release the graph; the canvas is gone.
	pub fn teardown(&self) {
		self.cancel_timer();
		self.graph.try_update_value(|g| *g = None);
		self.status.try_set(StoryStatus::default());
		self.step.try_set(None);
		info!("repomap-viz: graph torn down");
	}

	fn frame(&self, dt: f64) {
		self.graph.try_update_value(|g| {
			if let Some(g) = g.as_mut() {
				if g.layout_mut().tick(dt) {
					g.on_stabilized();
				}
			}
		});
	}
}

fn window_size(window: &Window) -> Option<(f64, f64)> {
	Some((
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

fn pointer(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((ev.client_x() as f64 - rect.left(), ev.client_y() as f64 - rect.top()))
}

/// Renders the repository graph on a canvas element.
///
/// The canvas fills the viewport when `fullscreen` is set and follows window
/// resizes; otherwise it takes its parent's size. It stays mounted while
/// `visible` is false so the layout keeps its state across table views.
#[component]
pub fn RepoGraphCanvas(
	handle: GraphHandle,
	#[prop(into)] visible: Signal<bool>,
	#[prop(default = false)] fullscreen: bool,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (animate_init, resize_cb_init) = (animate.clone(), resize_cb.clone());
	let theme = Rc::new(Theme::default());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window).unwrap_or((800.0, 600.0))
		} else {
			canvas
				.parent_element()
				.map(|p| (p.client_width() as f64, p.client_height() as f64))
				.unwrap_or((800.0, 600.0))
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);
		handle.update(|g| g.layout_mut().resize(w, h));

		let ctx: CanvasRenderingContext2d = match canvas.get_context("2d") {
			Ok(Some(ctx)) => match ctx.dyn_into() {
				Ok(ctx) => ctx,
				Err(_) => return,
			},
			_ => {
				warn!("repomap-viz: canvas 2d context unavailable");
				return;
			}
		};

		if fullscreen {
			let canvas_resize = canvas.clone();
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some((nw, nh)) = web_sys::window().as_ref().and_then(window_size) else {
					return;
				};
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				handle.update(|g| g.layout_mut().resize(nw, nh));
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (animate_inner, theme) = (animate_init.clone(), theme.clone());
		let canvas_anim = canvas.clone();
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if !canvas_anim.is_connected() {
				handle.teardown();
				return;
			}
			handle.frame(FRAME_DT);
			handle.with(|g| render::render(g.layout(), &ctx, &theme));
			if let (Some(cb), Some(win)) = (animate_inner.borrow().as_ref(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let on_mousedown = move |ev: MouseEvent| {
		if let Some((x, y)) = pointer(canvas_ref, &ev) {
			handle.graph.try_update_value(|g| {
				if let Some(g) = g.as_mut() {
					g.layout_mut().pointer_down(x, y);
				}
			});
		}
	};

	let on_mousemove = move |ev: MouseEvent| {
		if let Some((x, y)) = pointer(canvas_ref, &ev) {
			handle.graph.try_update_value(|g| {
				if let Some(g) = g.as_mut() {
					g.layout_mut().pointer_move(x, y);
				}
			});
		}
	};

	let on_mouseup = move |_: MouseEvent| {
		let click = handle
			.graph
			.try_update_value(|g| g.as_mut().and_then(|g| g.layout_mut().pointer_up()))
			.flatten();
		match click {
			Some(Some(id)) if !is_package_id(&id) => handle.select(Some(id)),
			Some(None) => handle.select(None),
			_ => {}
		}
	};

	let on_mouseleave = move |_: MouseEvent| {
		handle.graph.try_update_value(|g| {
			if let Some(g) = g.as_mut() {
				g.layout_mut().pointer_leave();
			}
		});
	};

	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let rect = canvas.get_bounding_client_rect();
		let (x, y) = (
			ev.client_x() as f64 - rect.left(),
			ev.client_y() as f64 - rect.top(),
		);
		handle.graph.try_update_value(|g| {
			if let Some(g) = g.as_mut() {
				g.layout_mut().zoom_at(x, y, ev.delta_y() < 0.0);
			}
		});
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="repo-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style=move || {
				let display = if visible.get() { "block" } else { "none" };
				format!("display: {display}; cursor: grab;")
			}
		/>
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::data::Importance;

	fn files() -> Vec<FileDescriptor> {
		vec![
			FileDescriptor::new("a/x.ts", Importance::High).with_rank(0.8),
			FileDescriptor::new("b/z.ts", Importance::Medium).with_rank(0.4),
		]
	}

	#[test]
	fn teardown_ends_the_story_and_later_calls_do_nothing() {
		Owner::new().with(|| {
			let handle = GraphHandle::new(VizConfig::default(), &Theme::default());
			handle.set_files(files());
			let generation = handle.update(|g| g.start_story()).expect("graph is live");
			assert!(handle.status.get_untracked().is_playing());

			handle.teardown();
			assert!(!handle.status.get_untracked().is_playing());
			assert!(handle.with(|_| ()).is_none());

			handle.run_story(generation);
			handle.set_files(files());
			handle.start_story();
			handle.next_story_step();
			handle.select(Some("a/x.ts".to_string()));
			handle.frame(FRAME_DT);

			assert!(handle.with(|_| ()).is_none());
			assert!(handle.timer.with_value(|t| t.is_none()));
			assert!(!handle.status.get_untracked().is_playing());
			assert_eq!(handle.selected.get_untracked(), None);
		});
	}
}
