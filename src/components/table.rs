//! Sortable, filterable file table shown in place of the canvas.

use std::cmp::Ordering;

use leptos::prelude::*;

use crate::data::{FileDescriptor, Importance};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortField {
	Path,
	Intent,
	Importance,
	Tokens,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
	Ascending,
	Descending,
}

impl SortOrder {
	fn flip(self) -> Self {
		match self {
			SortOrder::Ascending => SortOrder::Descending,
			SortOrder::Descending => SortOrder::Ascending,
		}
	}
}

/// Current sort column and direction plus the text filter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableState {
	pub field: SortField,
	pub order: SortOrder,
	pub filter: String,
}

impl Default for TableState {
	fn default() -> Self {
		Self {
			field: SortField::Importance,
			order: SortOrder::Descending,
			filter: String::new(),
		}
	}
}

impl TableState {
	/// Clicking the active column flips it; a new column starts ascending.
	pub fn sort_by(&mut self, field: SortField) {
		if self.field == field {
			self.order = self.order.flip();
		} else {
			self.field = field;
			self.order = SortOrder::Ascending;
		}
	}

	fn compare(&self, a: &FileDescriptor, b: &FileDescriptor) -> Ordering {
		let ord = match self.field {
			SortField::Path => a.path.cmp(&b.path),
			SortField::Intent => intent_key(a).cmp(intent_key(b)),
			SortField::Importance => a.importance.weight().cmp(&b.importance.weight()),
			SortField::Tokens => a.token_count.unwrap_or(0).cmp(&b.token_count.unwrap_or(0)),
		};
		match self.order {
			SortOrder::Ascending => ord,
			SortOrder::Descending => ord.reverse(),
		}
	}

	fn matches(&self, file: &FileDescriptor) -> bool {
		if self.filter.is_empty() {
			return true;
		}
		let needle = self.filter.to_lowercase();
		file.path.to_lowercase().contains(&needle)
			|| file
				.intent
				.as_deref()
				.is_some_and(|i| i.to_lowercase().contains(&needle))
	}

	/// Filtered rows in display order. The sort is stable.
	pub fn rows<'a>(&self, files: &'a [FileDescriptor]) -> Vec<&'a FileDescriptor> {
		let mut rows: Vec<_> = files.iter().filter(|f| self.matches(f)).collect();
		rows.sort_by(|a, b| self.compare(a, b));
		rows
	}
}

fn intent_key(file: &FileDescriptor) -> &str {
	file.intent.as_deref().unwrap_or("")
}

fn importance_class(importance: Importance) -> &'static str {
	match importance {
		Importance::High => "badge badge-high",
		Importance::Medium => "badge badge-medium",
		Importance::Low => "badge badge-low",
	}
}

/// File table. Clicking a row reports its path through `on_select`.
#[component]
pub fn TableView(
	#[prop(into)] files: Signal<Vec<FileDescriptor>>,
	on_select: impl Fn(String) + Copy + Send + Sync + 'static,
) -> impl IntoView {
	let state = RwSignal::new(TableState::default());

	let header = move |field: SortField, label: &'static str| {
		view! {
			<th class="sortable" on:click=move |_| state.update(|s| s.sort_by(field))>
				{label}
				{move || {
					let s = state.get();
					match (s.field == field, s.order) {
						(false, _) => "",
						(true, SortOrder::Ascending) => " \u{25b2}",
						(true, SortOrder::Descending) => " \u{25bc}",
					}
				}}
			</th>
		}
	};

	let rows = move || {
		let files = files.get();
		let s = state.get();
		s.rows(&files)
			.into_iter()
			.map(|file| {
				let path = file.path.clone();
				let intent = file.intent.clone();
				let tokens = file.token_count.map(|t| t.to_string()).unwrap_or_default();
				let (issues, comments) = (file.issues.len(), file.comments.len());
				view! {
					<tr on:click=move |_| on_select(path.clone())>
						<td class="mono">{file.path.clone()}</td>
						<td>
							{match intent {
								Some(intent) => view! { <span class="pill">{intent}</span> }.into_any(),
								None => view! { <span class="muted">"Unassigned"</span> }.into_any(),
							}}
						</td>
						<td>
							<span class=importance_class(file.importance)>
								{file.importance.as_str().to_uppercase()}
							</span>
						</td>
						<td class="mono">{tokens}</td>
						<td>
							{(issues > 0).then(|| view! { <span class="count-issues">{format!("! {issues}")}</span> })}
							{(comments > 0).then(|| view! { <span class="count-comments">{format!("# {comments}")}</span> })}
						</td>
					</tr>
				}
			})
			.collect_view()
	};

	view! {
		<div class="table-view">
			<div class="table-toolbar">
				<h2>"Repository Overview"</h2>
				<input
					type="text"
					placeholder="Filter files..."
					prop:value=move || state.get().filter
					on:input=move |ev| state.update(|s| s.filter = event_target_value(&ev))
				/>
			</div>
			<table>
				<thead>
					<tr>
						{header(SortField::Path, "Path")}
						{header(SortField::Intent, "Intent")}
						{header(SortField::Importance, "Importance")}
						{header(SortField::Tokens, "Tokens")}
						<th>"Issues"</th>
					</tr>
				</thead>
				<tbody>{rows}</tbody>
			</table>
		</div>
	}
}
