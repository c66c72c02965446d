//! Repository graph: model, styling, story playback and the canvas view.
//!
//! The pure parts (model, highlight, selection, story, layout placement and
//! [`RepoGraph`]) are target-independent and tested natively. The canvas
//! parts ([`render`], [`component`]) drive them from the browser:
//! - [`ForceLayout`] adapts the `force_graph` simulation to [`LayoutAdapter`]
//! - the animation loop ticks physics and reports stabilization
//! - story continuations run on timeouts keyed by a generation token
//!
//! # Example
//!
//! ```ignore
//! let handle = GraphHandle::new(VizConfig::default(), &Theme::default());
//! handle.set_files(files);
//! view! { <RepoGraphCanvas handle=handle visible=true fullscreen=true /> }
//! ```

pub mod component;
pub mod highlight;
pub mod layout;
pub mod model;
mod render;
pub mod selection;
pub mod state;
pub mod story;
pub mod theme;
pub mod view;

pub use component::{GraphHandle, RepoGraphCanvas};
pub use layout::LayoutAdapter;
pub use state::ForceLayout;
pub use theme::Theme;
pub use view::RepoGraph;
