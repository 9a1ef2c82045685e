use rand::Rng;

use crate::error::StorageError;
use crate::storage::window::StateWindow;
use crate::storage::{Link, Storage};

/// High-level driver for training and sampling over a storage backend.
///
/// # Responsibilities
/// - Slide a fixed-length context window over training sequences and feed
///   the observed transitions to the store
/// - Walk the chain during generation, sampling successors proportionally
///   to their recorded weights
/// - Support both forward and backward walks when the store mirrors links
///
/// # Invariants
/// - `window_size` is always >= 1
/// - The store is only touched through the [`Storage`] trait
#[derive(Debug)]
pub struct Generator<S: Storage> {
	storage: S,
	window_size: usize,
}

impl<S: Storage> Generator<S> {
	/// Wraps a storage backend with a fixed context window length.
	///
	/// # Errors
	/// Returns an error if `window_size` is zero.
	pub fn new(storage: S, window_size: usize) -> Result<Self, StorageError> {
		if window_size == 0 {
			return Err(StorageError::Structural(
				"window size must be at least 1".to_owned(),
			));
		}
		Ok(Self { storage, window_size })
	}

	/// Read-only access to the wrapped store.
	pub fn storage(&self) -> &S {
		&self.storage
	}

	/// Mutable access to the wrapped store.
	pub fn storage_mut(&mut self) -> &mut S {
		&mut self.storage
	}

	/// Consumes the generator, returning the wrapped store.
	pub fn into_storage(self) -> S {
		self.storage
	}

	/// Context window length used for training and generation.
	pub fn window_size(&self) -> usize {
		self.window_size
	}

	/// Feeds one token sequence into a dataset.
	///
	/// Slides an initially-empty window over the tokens, recording one
	/// forward transition per token plus a terminal null-target link so
	/// chain ends are sampled like any other transition. An empty sequence
	/// records nothing.
	pub fn train<I>(&mut self, dataset: &str, tokens: I) -> Result<(), StorageError>
	where
		I: IntoIterator<Item = String>,
	{
		let mut window = StateWindow::new(self.window_size);
		let mut links = Vec::new();
		for token in tokens {
			let context: Vec<String> = window.iter().map(str::to_owned).collect();
			links.push(Link::new(dataset, context, Some(token.clone())));
			window.advance(token, false);
		}
		if links.is_empty() {
			return Ok(());
		}
		let context: Vec<String> = window.iter().map(str::to_owned).collect();
		links.push(Link::new(dataset, context, None));
		self.storage.add_links(links, "")
	}

	/// Samples a continuation of `start`.
	///
	/// Walks the chain until the distribution is empty, the null token is
	/// drawn, or `limit` tokens were produced. A backward walk uses the
	/// mirrored map and returns its tokens in natural reading order.
	///
	/// # Errors
	/// `NotFound` for an unknown dataset; `Unsupported` for a backward walk
	/// on a store without backward support.
	pub fn generate(
		&self,
		dataset: &str,
		start: &[String],
		limit: usize,
		backward: bool,
	) -> Result<Vec<String>, StorageError> {
		let mut window = self
			.storage
			.state_window(start.iter().cloned(), self.window_size);
		let mut tokens = Vec::new();
		while tokens.len() < limit {
			let links = self.storage.successors(dataset, &window, backward)?;
			match sample(&links) {
				Some(token) => {
					tokens.push(token.clone());
					window.advance(token, backward);
				}
				None => break,
			}
		}
		if backward {
			tokens.reverse();
		}
		Ok(tokens)
	}
}

/// Weighted random draw from a successor distribution.
///
/// Selection probability is proportional to the recorded weight. Returns
/// `None` for an empty distribution or when the null token is drawn.
fn sample(links: &[(Option<String>, u64)]) -> Option<String> {
	let total: u64 = links.iter().map(|(_, weight)| weight).sum();
	if total == 0 {
		return None;
	}

	let mut r = rand::rng().random_range(0..total);
	for (token, weight) in links {
		if r < *weight {
			return token.clone();
		}
		r -= weight;
	}

	// Fallback: should not happen, but kept for safety.
	None
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::settings::Settings;
	use crate::storage::json::JsonStorage;

	const SEP: &str = "\u{1}";

	fn trained_generator() -> Generator<JsonStorage> {
		let storage = JsonStorage::new(Settings::with_separator(true, SEP));
		let mut generator = Generator::new(storage, 2).unwrap();
		generator
			.train(
				"body",
				["the", "cat", "sat"].map(str::to_owned),
			)
			.unwrap();
		generator
	}

	#[test]
	fn zero_window_size_is_rejected() {
		let storage = JsonStorage::new(Settings::default());
		assert!(matches!(
			Generator::new(storage, 0),
			Err(StorageError::Structural(_))
		));
	}

	#[test]
	fn training_records_padded_windows_and_a_terminal_link() {
		let generator = trained_generator();
		let storage = generator.storage();

		let window = storage.state_window(std::iter::empty::<String>(), 2);
		assert_eq!(
			storage.successors("body", &window, false).unwrap(),
			vec![(Some("the".to_owned()), 1)]
		);

		let (forward, _) = storage.dataset("body").unwrap();
		assert_eq!(forward.len(), 4);
		assert_eq!(forward[&storage.join_state(["cat", "sat"])].weight(None), 1);
	}

	#[test]
	fn training_an_empty_sequence_records_nothing() {
		let storage = JsonStorage::new(Settings::with_separator(false, SEP));
		let mut generator = Generator::new(storage, 2).unwrap();
		generator.train("body", std::iter::empty()).unwrap();
		assert!(matches!(
			generator.storage().dataset("body"),
			Err(StorageError::NotFound(_))
		));
	}

	#[test]
	fn generation_replays_a_single_path_chain() {
		// Every state has exactly one successor, so sampling is deterministic.
		let generator = trained_generator();
		let tokens = generator.generate("body", &[], 10, false).unwrap();
		assert_eq!(tokens, ["the", "cat", "sat"].map(str::to_owned));
	}

	#[test]
	fn generation_respects_the_limit() {
		let generator = trained_generator();
		let tokens = generator.generate("body", &[], 2, false).unwrap();
		assert_eq!(tokens, ["the", "cat"].map(str::to_owned));
	}

	#[test]
	fn generation_from_an_unknown_dataset_fails() {
		let generator = trained_generator();
		assert!(matches!(
			generator.generate("nope", &[], 10, false),
			Err(StorageError::NotFound(_))
		));
	}

	#[test]
	fn backward_generation_walks_to_the_chain_start() {
		let generator = trained_generator();
		let start = ["cat".to_owned(), "sat".to_owned()];
		let tokens = generator.generate("body", &start, 10, true).unwrap();
		// Padding tokens from the start of the chain come back too.
		assert_eq!(tokens, ["", "", "the"].map(str::to_owned));
	}

	#[test]
	fn backward_generation_without_support_fails() {
		let storage = JsonStorage::new(Settings::with_separator(false, SEP));
		let mut generator = Generator::new(storage, 2).unwrap();
		generator
			.train("body", ["the", "cat"].map(str::to_owned))
			.unwrap();
		assert!(matches!(
			generator.generate("body", &[], 10, true),
			Err(StorageError::Unsupported(_))
		));
	}
}
