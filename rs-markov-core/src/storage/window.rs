use std::collections::VecDeque;

/// Bounded, ordered, mutable sequence of the most recent tokens driving
/// generation.
///
/// The length is fixed at construction: advancing the window adds a token
/// on one end and drops the oldest token on the other. Positions with no
/// history yet hold empty-string tokens.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateWindow {
	tokens: VecDeque<String>,
}

impl StateWindow {
	/// Creates a window of `size` empty-string tokens.
	pub fn new(size: usize) -> Self {
		Self::from_history(std::iter::empty::<String>(), size)
	}

	/// Builds the initial generation context from prior tokens.
	///
	/// The window is left-padded with empty-string tokens when there is not
	/// enough history; when there is more than `size`, only the most recent
	/// tokens are kept.
	pub fn from_history<I>(history: I, size: usize) -> Self
	where
		I: IntoIterator,
		I::Item: Into<String>,
	{
		let mut tokens = VecDeque::with_capacity(size);
		tokens.extend(std::iter::repeat_with(String::new).take(size));
		let mut window = Self { tokens };
		for token in history {
			window.advance(token, false);
		}
		window
	}

	/// Number of tokens in the window, constant over its lifetime.
	pub fn len(&self) -> usize {
		self.tokens.len()
	}

	/// Whether the window was created with size zero.
	pub fn is_empty(&self) -> bool {
		self.tokens.is_empty()
	}

	/// Iterates the window tokens, oldest first.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.tokens.iter().map(String::as_str)
	}

	/// Shifts the window by one token, in place.
	///
	/// Forward advancement appends on the right and drops the oldest token
	/// on the left; backward advancement prepends on the left and drops on
	/// the right. Returns the window for chaining.
	pub fn advance(&mut self, token: impl Into<String>, backward: bool) -> &mut Self {
		if self.tokens.is_empty() {
			return self;
		}
		if backward {
			let _ = self.tokens.pop_back();
			self.tokens.push_front(token.into());
		} else {
			let _ = self.tokens.pop_front();
			self.tokens.push_back(token.into());
		}
		self
	}
}
