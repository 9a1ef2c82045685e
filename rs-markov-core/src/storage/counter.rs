use std::collections::HashMap;

/// Weighted multiset of successor tokens.
///
/// Conceptually a node of the transition graph: outgoing edges weighted by
/// how many times each successor was observed. The null token (`None`)
/// marks a chain boundary and is an ordinary entry here; the wire-format
/// sentinel never appears in memory.
///
/// ## Invariants
/// - Every recorded count is strictly positive
/// - An absent entry means weight zero
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransitionCounter {
	weights: HashMap<Option<String>, u64>,
}

impl TransitionCounter {
	/// Creates an empty counter.
	pub fn new() -> Self {
		Self::default()
	}

	/// Records `count` more observations of a transition toward `token`.
	pub fn increment(&mut self, token: Option<String>, count: u64) {
		*self.weights.entry(token).or_insert(0) += count;
	}

	/// Weight of one successor; zero when the transition was never observed.
	pub fn weight(&self, token: Option<&str>) -> u64 {
		let key = token.map(str::to_owned);
		self.weights.get(&key).copied().unwrap_or(0)
	}

	/// Total number of recorded observations.
	pub fn total(&self) -> u64 {
		self.weights.values().sum()
	}

	/// Number of distinct successors.
	pub fn len(&self) -> usize {
		self.weights.len()
	}

	/// Whether no transition was ever recorded.
	pub fn is_empty(&self) -> bool {
		self.weights.is_empty()
	}

	/// Iterates `(token, weight)` pairs in arbitrary order.
	pub fn iter(&self) -> impl Iterator<Item = (Option<&str>, u64)> {
		self.weights.iter().map(|(token, weight)| (token.as_deref(), *weight))
	}
}

impl FromIterator<(Option<String>, u64)> for TransitionCounter {
	fn from_iter<I: IntoIterator<Item = (Option<String>, u64)>>(iter: I) -> Self {
		let mut counter = Self::new();
		for (token, count) in iter {
			counter.increment(token, count);
		}
		counter
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn increments_accumulate() {
		let mut counter = TransitionCounter::new();
		counter.increment(Some("the".to_owned()), 1);
		counter.increment(Some("the".to_owned()), 2);
		counter.increment(None, 1);
		assert_eq!(counter.weight(Some("the")), 3);
		assert_eq!(counter.weight(None), 1);
		assert_eq!(counter.total(), 4);
		assert_eq!(counter.len(), 2);
	}

	#[test]
	fn absent_entries_weigh_zero() {
		let counter = TransitionCounter::new();
		assert_eq!(counter.weight(Some("missing")), 0);
		assert_eq!(counter.weight(None), 0);
		assert!(counter.is_empty());
	}

	#[test]
	fn collects_from_pairs() {
		let counter: TransitionCounter = vec![
			(Some("a".to_owned()), 2),
			(Some("b".to_owned()), 1),
			(Some("a".to_owned()), 1),
		]
		.into_iter()
		.collect();
		assert_eq!(counter.weight(Some("a")), 3);
		assert_eq!(counter.weight(Some("b")), 1);
	}
}
