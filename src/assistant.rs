//! Client-side support for the repository assistant.
//!
//! The transport lives outside this crate. What stays here is the state a
//! chat needs on this side of the wire: the explicit session id, the UI
//! context sent with each message, decoding of the streamed reply, and the
//! rule that turns a message into a highlight update.

use serde::{Deserialize, Serialize};

use crate::data::FileDescriptor;

/// Reply that clears every highlight.
pub const RESET_REPLY: &str = "_RESET_";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	User,
	Assistant,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
	pub role: Role,
	pub content: String,
}

/// What the UI is showing, sent alongside each question.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UiContext {
	pub selected_node: String,
	pub view_mode: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequest<'a> {
	message: &'a str,
	session_id: &'a str,
	context: &'a UiContext,
}

/// How a message changes the highlight set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HighlightUpdate {
	Replace(Vec<String>),
	Clear,
	Keep,
}

/// Conversation bound to a host-supplied session id.
#[derive(Clone, Debug, PartialEq)]
pub struct ChatSession {
	session_id: String,
	messages: Vec<Message>,
}

impl ChatSession {
	pub fn new(session_id: impl Into<String>) -> Self {
		Self {
			session_id: session_id.into(),
			messages: Vec::new(),
		}
	}

	pub fn session_id(&self) -> &str {
		&self.session_id
	}

	pub fn messages(&self) -> &[Message] {
		&self.messages
	}

	/// Replace the history, e.g. with one loaded for this session.
	pub fn restore(&mut self, history: Vec<Message>) {
		self.messages = history;
	}

	/// Record a question and return the request body to send for it.
	pub fn ask(&mut self, text: &str, context: &UiContext) -> serde_json::Result<String> {
		self.messages.push(Message {
			role: Role::User,
			content: text.to_string(),
		});
		serde_json::to_string(&ChatRequest {
			message: text,
			session_id: &self.session_id,
			context,
		})
	}

	/// Append streamed tokens to the reply in progress, opening one if needed.
	pub fn append_reply(&mut self, token: &str) {
		match self.messages.last_mut() {
			Some(last) if last.role == Role::Assistant => last.content.push_str(token),
			_ => self.messages.push(Message {
				role: Role::Assistant,
				content: token.to_string(),
			}),
		}
	}

	/// Take in a whole reply body. `data:` lines are decoded as a stream;
	/// a body without any is kept as plain text. Returns the tokens added.
	pub fn receive(&mut self, body: &str) -> usize {
		let mut decoder = StreamDecoder::new();
		let mut tokens = decoder.feed(body);
		tokens.extend(decoder.finish());
		if tokens.is_empty() && !body.trim().is_empty() {
			tokens.push(body.trim().to_string());
		}
		for token in &tokens {
			self.append_reply(token);
		}
		tokens.len()
	}

	/// Highlight update implied by the latest message.
	pub fn highlight_update(&self, files: &[FileDescriptor]) -> HighlightUpdate {
		match self.messages.last() {
			Some(last) => highlight_update(last, files),
			None => HighlightUpdate::Keep,
		}
	}
}

/// Files whose full path or basename appears in `text`, in file order.
pub fn mentioned_paths(text: &str, files: &[FileDescriptor]) -> Vec<String> {
	let text = text.to_lowercase();
	files
		.iter()
		.filter(|f| {
			let basename = f.basename().to_lowercase();
			text.contains(&f.path.to_lowercase()) || (!basename.is_empty() && text.contains(&basename))
		})
		.map(|f| f.path.clone())
		.collect()
}

/// A reset reply clears; mentions replace; a user message without mentions
/// clears; an assistant reply without mentions keeps the current set.
pub fn highlight_update(message: &Message, files: &[FileDescriptor]) -> HighlightUpdate {
	if message.content.is_empty() {
		return HighlightUpdate::Keep;
	}
	if message.content == RESET_REPLY {
		return HighlightUpdate::Clear;
	}
	let paths = mentioned_paths(&message.content, files);
	match (paths.is_empty(), message.role) {
		(false, _) => HighlightUpdate::Replace(paths),
		(true, Role::User) => HighlightUpdate::Clear,
		(true, Role::Assistant) => HighlightUpdate::Keep,
	}
}

#[derive(Deserialize)]
struct StreamEvent {
	token: Option<String>,
}

/// Decoder for `data: {"token": "..."}` lines arriving in arbitrary chunks.
#[derive(Debug, Default)]
pub struct StreamDecoder {
	pending: String,
}

impl StreamDecoder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Feed one chunk; returns tokens from every line it completed.
	pub fn feed(&mut self, chunk: &str) -> Vec<String> {
		self.pending.push_str(chunk);
		let mut tokens = Vec::new();
		while let Some(end) = self.pending.find('\n') {
			let line: String = self.pending.drain(..=end).collect();
			tokens.extend(decode_line(line.trim_end_matches(['\n', '\r'])));
		}
		tokens
	}

	/// Flush a trailing line that never got its newline.
	pub fn finish(&mut self) -> Vec<String> {
		let line = std::mem::take(&mut self.pending);
		decode_line(line.trim_end_matches('\r')).into_iter().collect()
	}
}

fn decode_line(line: &str) -> Option<String> {
	let payload = line.strip_prefix("data: ")?;
	let event: StreamEvent = serde_json::from_str(payload).ok()?;
	event.token.filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::data::Importance;

	fn files() -> Vec<FileDescriptor> {
		vec![
			FileDescriptor::new("internal/db/store.go", Importance::High),
			FileDescriptor::new("cmd/main.go", Importance::Low),
			FileDescriptor::new("README.md", Importance::Low),
		]
	}

	fn msg(role: Role, content: &str) -> Message {
		Message {
			role,
			content: content.into(),
		}
	}

	#[test]
	fn mentions_match_path_or_basename_case_insensitively() {
		let found = mentioned_paths("Look at STORE.GO and cmd/main.go", &files());
		assert_eq!(found, ["internal/db/store.go", "cmd/main.go"]);
		assert!(mentioned_paths("nothing relevant", &files()).is_empty());
	}

	#[test]
	fn highlight_rules_depend_on_role() {
		let files = files();
		assert_eq!(
			highlight_update(&msg(Role::Assistant, "see readme.md"), &files),
			HighlightUpdate::Replace(vec!["README.md".into()])
		);
		assert_eq!(
			highlight_update(&msg(Role::User, "what is this?"), &files),
			HighlightUpdate::Clear
		);
		assert_eq!(
			highlight_update(&msg(Role::Assistant, "it is a tool"), &files),
			HighlightUpdate::Keep
		);
		assert_eq!(
			highlight_update(&msg(Role::Assistant, RESET_REPLY), &files),
			HighlightUpdate::Clear
		);
	}

	#[test]
	fn request_carries_session_and_context() {
		let mut chat = ChatSession::new("s-1");
		let ctx = UiContext {
			selected_node: "cmd/main.go".into(),
			view_mode: "cluster".into(),
		};
		let body = chat.ask("hello", &ctx).unwrap();
		let value: serde_json::Value = serde_json::from_str(&body).unwrap();
		assert_eq!(value["sessionId"], "s-1");
		assert_eq!(value["context"]["selectedNode"], "cmd/main.go");
		assert_eq!(value["context"]["viewMode"], "cluster");
		assert_eq!(chat.messages().len(), 1);
	}

	#[test]
	fn replies_accumulate_into_one_message() {
		let mut chat = ChatSession::new("s");
		chat.ask("q", &UiContext::default()).unwrap();
		chat.append_reply("store");
		chat.append_reply(".go");
		assert_eq!(chat.messages().len(), 2);
		assert_eq!(chat.messages()[1].content, "store.go");
		assert_eq!(
			chat.highlight_update(&files()),
			HighlightUpdate::Replace(vec!["internal/db/store.go".into()])
		);
	}

	#[test]
	fn decoder_handles_split_lines_and_junk() {
		let mut dec = StreamDecoder::new();
		assert!(dec.feed("data: {\"tok").is_empty());
		assert_eq!(dec.feed("en\": \"Hel\"}\ndata: {\"token\": \"lo\"}\n"), ["Hel", "lo"]);
		assert!(dec.feed(": keep-alive\ndata: not json\n\n").is_empty());
		assert!(dec.feed("data: {\"token\": \"!\"}").is_empty());
		assert_eq!(dec.finish(), ["!"]);
	}

	#[test]
	fn received_reply_highlights_without_clearing() {
		let files = files();
		let mut session = ChatSession::new("s");
		session.ask("where does it start?", &UiContext::default()).unwrap();

		let body = "data: {\"token\": \"See \"}\ndata: {\"token\": \"cmd/main.go\"}";
		assert_eq!(session.receive(body), 2);
		assert_eq!(session.messages().len(), 2);
		assert_eq!(session.messages()[1].content, "See cmd/main.go");
		assert_eq!(
			session.highlight_update(&files),
			HighlightUpdate::Replace(vec!["cmd/main.go".to_string()])
		);

		let mut plain = ChatSession::new("s");
		assert_eq!(plain.receive("  nothing relevant "), 1);
		assert_eq!(plain.messages()[0].content, "nothing relevant");
		assert_eq!(plain.highlight_update(&files), HighlightUpdate::Keep);
		assert_eq!(plain.receive("   "), 0);
		assert_eq!(plain.messages().len(), 1);
	}
}
