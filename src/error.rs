//! Error types for loading repository map data.

use thiserror::Error;

/// Recoverable failures while turning upstream input into a file list.
///
/// None of these are fatal: callers keep their previous graph and surface the
/// message as an "invalid data" notice.
#[derive(Debug, Error)]
pub enum DataError {
	#[error("invalid repomap data: {0}")]
	InvalidJson(#[from] serde_json::Error),

	#[error("could not read upload: {0}")]
	Read(String),
}

pub type Result<T> = std::result::Result<T, DataError>;
