use thiserror::Error;

/// Errors surfaced by storage backends and the generation layer.
///
/// All failures are synchronous and immediate; nothing is retried
/// internally. Ingestion committed before a failing link stays committed.
#[derive(Debug, Error)]
pub enum StorageError {
	/// A non-creating lookup named a dataset that does not exist.
	#[error("dataset not found: {0}")]
	NotFound(String),

	/// A backward query reached a store built without backward support.
	#[error("unsupported operation: {0}")]
	Unsupported(&'static str),

	/// A malformed ingestion link, or a wire document with an invalid shape.
	#[error("structural error: {0}")]
	Structural(String),

	/// A corrupt or truncated persisted document.
	#[error("parse error: {0}")]
	Parse(#[from] serde_json::Error),

	/// Filesystem failure while reading or writing a snapshot.
	#[error(transparent)]
	Io(#[from] std::io::Error),
}
