//! UI components.

pub mod panels;
pub mod repo_graph;
pub mod table;
