//! Storage backends for the weighted transition graph.
//!
//! A backend stores, per named dataset, a forward map from composite state
//! keys to weighted multisets of successor tokens, plus an optional mirrored
//! backward map for reverse generation. The shared contract is the
//! [`Storage`] trait; [`json::JsonStorage`] is the in-memory backend
//! persisted as one JSON document.

/// Weighted multiset of successor tokens.
pub mod counter;

/// In-memory backend persisted as a single JSON document.
pub mod json;

/// Fixed-length rolling context window.
pub mod window;

use crate::error::StorageError;
use crate::settings::Settings;
use window::StateWindow;

/// One observed transition fed to [`Storage::add_links`].
///
/// The context is a materialized sequence: backward ingestion reads it twice
/// (once for the reverse key, once for the forward key), so a single-pass
/// source is not accepted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Link {
	/// Dataset the link belongs to, resolved against the ingestion prefix.
	pub dataset: String,

	/// Ordered window of tokens preceding the target.
	pub context: Vec<String>,

	/// Observed successor; `None` marks a chain boundary.
	pub target: Option<String>,

	/// Link weight.
	pub count: u64,
}

impl Link {
	/// Creates a link with the default weight of 1.
	pub fn new(dataset: impl Into<String>, context: Vec<String>, target: Option<String>) -> Self {
		Self { dataset: dataset.into(), context, target, count: 1 }
	}

	/// Creates a link with an explicit weight.
	pub fn with_count(
		dataset: impl Into<String>,
		context: Vec<String>,
		target: Option<String>,
		count: u64,
	) -> Self {
		Self { dataset: dataset.into(), context, target, count }
	}
}

/// Contract shared by every storage backend.
///
/// Generation and training code is generic over this trait and never names
/// a concrete backend; the backend is chosen once, at construction.
///
/// # Invariants
/// - All recorded counts are strictly positive; an absent entry means
///   weight zero.
/// - When backward support is enabled, every forward entry with a non-null
///   target has a mirrored backward entry of equal weight.
/// - All composite keys of one dataset encode the same window length.
pub trait Storage {
	/// Configuration the store was built with.
	fn settings(&self) -> &Settings;

	/// Separator between the tokens of a composite state key.
	fn state_separator(&self) -> &str;

	/// Encodes an ordered token window into one composite state key.
	///
	/// Tokens containing the separator produce ambiguous keys; this is a
	/// documented limitation, not detected here.
	fn join_state<I>(&self, tokens: I) -> String
	where
		I: IntoIterator,
		I::Item: AsRef<str>,
	{
		let mut key = String::new();
		for (index, token) in tokens.into_iter().enumerate() {
			if index > 0 {
				key.push_str(self.state_separator());
			}
			key.push_str(token.as_ref());
		}
		key
	}

	/// Builds the initial generation context from prior tokens.
	///
	/// The window has length `size`, left-padded with empty-string tokens
	/// when there is not enough history.
	fn state_window<I>(&self, history: I, size: usize) -> StateWindow
	where
		I: IntoIterator,
		I::Item: Into<String>,
	{
		StateWindow::from_history(history, size)
	}

	/// Ingests a sequence of observed transitions.
	///
	/// Each link's dataset is resolved as `dataset_prefix + link.dataset`,
	/// created lazily if absent. When backward support is enabled and the
	/// target is non-null, a mirrored backward link of equal weight is
	/// recorded along with the forward one.
	///
	/// # Errors
	/// `Structural` for a malformed link, before any mutation for that
	/// link; links committed earlier in the batch are not rolled back.
	fn add_links<I>(&mut self, links: I, dataset_prefix: &str) -> Result<(), StorageError>
	where
		I: IntoIterator<Item = Link>;

	/// Case-insensitive substring search over the state keys of a dataset.
	///
	/// Returns a sorted list; an empty list when nothing matches.
	///
	/// # Errors
	/// `NotFound` if the dataset does not exist.
	fn find_states(&self, dataset: &str, query: &str) -> Result<Vec<String>, StorageError>;

	/// Successor distribution recorded for a state.
	///
	/// An unknown state is a normal outcome and yields an empty list.
	///
	/// # Errors
	/// `Unsupported` when `backward` is requested on a store without
	/// backward support; `NotFound` if the dataset does not exist.
	fn successors(
		&self,
		dataset: &str,
		state: &StateWindow,
		backward: bool,
	) -> Result<Vec<(Option<String>, u64)>, StorageError>;

	/// Rewrites every stored key, replacing `old` with `new` textually.
	///
	/// Destructive and in place, with no re-validation of window length.
	/// Token text containing `old` corrupts key boundaries; acknowledged
	/// limitation of the migration.
	fn replace_state_separator(&mut self, old: &str, new: &str);

	/// Releases any resource the backend owns.
	///
	/// The JSON backend owns none; a file-backed sibling overrides this to
	/// release its handle.
	fn close(&mut self) -> Result<(), StorageError> {
		Ok(())
	}
}
