use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde_json::{Map, Value, json};
use tracing::debug;

use super::counter::TransitionCounter;
use super::window::StateWindow;
use super::{Link, Storage};
use crate::error::StorageError;
use crate::settings::Settings;

/// Reserved string substituted for the null token on the wire.
///
/// A real token equal to this value cannot survive a round trip. The
/// collision is a documented open limitation, not silently tolerated
/// corruption.
pub const NONE_VALUE: &str = "\u{0}\u{0}";

/// One dataset: composite state key to successor distribution.
pub type DatasetMap = HashMap<String, TransitionCounter>;

/// All datasets of one direction, by name.
pub type NodeMap = HashMap<String, DatasetMap>;

fn dehydrate_token(token: Option<&str>) -> &str {
	token.unwrap_or(NONE_VALUE)
}

fn hydrate_token(token: String) -> Option<String> {
	if token == NONE_VALUE { None } else { Some(token) }
}

fn expect_count(value: &Value) -> Result<u64, StorageError> {
	value
		.as_u64()
		.ok_or_else(|| StorageError::Structural(format!("invalid transition count: {value}")))
}

fn expect_string(value: Value) -> Result<String, StorageError> {
	match value {
		Value::String(token) => Ok(token),
		other => Err(StorageError::Structural(format!("invalid token: {other}"))),
	}
}

fn expect_object(value: Value, what: &str) -> Result<Map<String, Value>, StorageError> {
	match value {
		Value::Object(map) => Ok(map),
		other => Err(StorageError::Structural(format!("{what} must be an object, got {other}"))),
	}
}

/// Normalizes one wire counter entry into the canonical weighted multiset.
///
/// Three equivalent compact encodings are accepted:
/// - a plain `{token: count}` mapping,
/// - a `[count, token]` pair for a singleton distribution,
/// - a `[[counts...], [tokens...]]` pair of parallel arrays.
///
/// The wire sentinel is replaced by the null token here; nothing above this
/// boundary ever sees it.
fn counterify(value: Value) -> Result<TransitionCounter, StorageError> {
	match value {
		Value::Null => Ok(TransitionCounter::new()),
		Value::Object(entries) => entries
			.into_iter()
			.map(|(token, count)| Ok((hydrate_token(token), expect_count(&count)?)))
			.collect(),
		Value::Array(items) => {
			if items.is_empty() {
				Ok(TransitionCounter::new())
			} else {
				counterify_array(items)
			}
		}
		other => Err(StorageError::Structural(format!("invalid counter encoding: {other}"))),
	}
}

fn counterify_array(items: Vec<Value>) -> Result<TransitionCounter, StorageError> {
	let singleton = items[0].is_number();
	let mut items = items.into_iter();

	if singleton {
		let (count, token) = match (items.next(), items.next(), items.next()) {
			(Some(count), Some(token), None) => (expect_count(&count)?, expect_string(token)?),
			_ => {
				return Err(StorageError::Structural(
					"singleton counter must be a [count, token] pair".to_owned(),
				));
			}
		};
		let mut counter = TransitionCounter::new();
		counter.increment(hydrate_token(token), count);
		return Ok(counter);
	}

	let (counts, tokens) = match (items.next(), items.next(), items.next()) {
		(Some(Value::Array(counts)), Some(Value::Array(tokens)), None) => (counts, tokens),
		_ => {
			return Err(StorageError::Structural(
				"multi-entry counter must be [counts, tokens] parallel arrays".to_owned(),
			));
		}
	};
	if counts.len() != tokens.len() {
		return Err(StorageError::Structural(format!(
			"parallel counter arrays differ in length: {} counts, {} tokens",
			counts.len(),
			tokens.len()
		)));
	}
	counts
		.into_iter()
		.zip(tokens)
		.map(|(count, token)| Ok((hydrate_token(expect_string(token)?), expect_count(&count)?)))
		.collect()
}

/// Converts wire-format datasets into canonical maps.
fn hydrate_nodes(value: Value) -> Result<NodeMap, StorageError> {
	let datasets = expect_object(value, "nodes")?;
	datasets
		.into_iter()
		.map(|(name, states)| {
			let states = expect_object(states, "dataset")?;
			let dataset = states
				.into_iter()
				.map(|(key, counter)| Ok((key, counterify(counter)?)))
				.collect::<Result<DatasetMap, StorageError>>()?;
			Ok((name, dataset))
		})
		.collect()
}

/// Converts canonical maps into the wire format.
///
/// Counters are always written in the plain mapping encoding; the compact
/// array forms are accepted on read only.
fn dehydrate_nodes(nodes: &NodeMap) -> Value {
	let datasets: Map<String, Value> = nodes
		.iter()
		.map(|(name, dataset)| {
			let states: Map<String, Value> = dataset
				.iter()
				.map(|(key, counter)| {
					let entries: Map<String, Value> = counter
						.iter()
						.map(|(token, weight)| {
							(dehydrate_token(token).to_owned(), Value::from(weight))
						})
						.collect();
					(key.clone(), Value::Object(entries))
				})
				.collect();
			(name.clone(), Value::Object(states))
		})
		.collect();
	Value::Object(datasets)
}

/// In-memory storage backend persisted as one JSON document.
///
/// The whole transition graph lives in memory; persistence is always a full
/// snapshot, never incremental. The store owns no resource handle, so
/// closing it is a no-op.
///
/// Two stores are equal when their forward maps, backward maps (or both
/// absent) and settings are equal.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JsonStorage {
	settings: Settings,
	nodes: NodeMap,
	backward: Option<NodeMap>,
}

impl JsonStorage {
	/// Creates an empty store.
	///
	/// A backward map is allocated only when the settings request backward
	/// support.
	pub fn new(settings: Settings) -> Self {
		let backward = settings.storage.backward.then(NodeMap::new);
		Self { settings, nodes: NodeMap::new(), backward }
	}

	/// Whether this store maintains a mirrored backward map.
	pub fn backward_enabled(&self) -> bool {
		self.backward.is_some()
	}

	/// Non-creating dataset lookup.
	///
	/// The second half of the pair is `None` when the store has no backward
	/// support; callers must branch on it rather than assume presence.
	///
	/// # Errors
	/// `NotFound` if the dataset does not exist.
	pub fn dataset(&self, key: &str) -> Result<(&DatasetMap, Option<&DatasetMap>), StorageError> {
		let forward = self
			.nodes
			.get(key)
			.ok_or_else(|| StorageError::NotFound(key.to_owned()))?;
		let backward = match &self.backward {
			Some(nodes) => {
				Some(nodes.get(key).ok_or_else(|| StorageError::NotFound(key.to_owned()))?)
			}
			None => None,
		};
		Ok((forward, backward))
	}

	/// Creating dataset lookup; allocates empty maps lazily.
	///
	/// The backward half is allocated only when backward support is enabled;
	/// otherwise it stays `None` and callers must branch on the marker.
	pub fn dataset_mut(&mut self, key: &str) -> (&mut DatasetMap, Option<&mut DatasetMap>) {
		let forward = self.nodes.entry(key.to_owned()).or_default();
		let backward = self
			.backward
			.as_mut()
			.map(|nodes| nodes.entry(key.to_owned()).or_default());
		(forward, backward)
	}

	/// Serializes the full store as one JSON document to `writer`.
	pub fn dump<W: Write>(&self, writer: W) -> Result<(), StorageError> {
		debug!(
			datasets = self.nodes.len(),
			backward = self.backward.is_some(),
			"saving storage"
		);
		let document = json!({
			"settings": self.settings,
			"nodes": dehydrate_nodes(&self.nodes),
			"backward": self.backward.as_ref().map(dehydrate_nodes),
		});
		serde_json::to_writer(writer, &document)?;
		Ok(())
	}

	/// Saves to `target`, or to standard output when `None`.
	pub fn save(&self, target: Option<&Path>) -> Result<(), StorageError> {
		match target {
			Some(path) => self.dump(BufWriter::new(File::create(path)?)),
			None => self.dump(io::stdout().lock()),
		}
	}

	/// Reads one JSON document from an already-open source.
	///
	/// # Errors
	/// `Parse` for corrupt JSON, `Structural` for a well-formed document
	/// with an invalid shape. Either aborts the load; no partial store is
	/// returned.
	pub fn from_reader<R: Read>(reader: R) -> Result<Self, StorageError> {
		let document: Value = serde_json::from_reader(reader)?;
		Self::hydrate(document)
	}

	/// Loads a persisted snapshot from a path.
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
		Self::from_reader(BufReader::new(File::open(path)?))
	}

	fn hydrate(document: Value) -> Result<Self, StorageError> {
		let mut document = expect_object(document, "storage document")?;

		let settings = match document.remove("settings") {
			Some(Value::Null) | None => Settings::default(),
			Some(value) => serde_json::from_value(value)
				.map_err(|err| StorageError::Structural(format!("invalid settings: {err}")))?,
		};
		let nodes = match document.remove("nodes") {
			Some(Value::Null) | None => NodeMap::new(),
			Some(value) => hydrate_nodes(value)?,
		};
		// A null backward field still yields an empty backward map when the
		// settings request backward support.
		let backward = match document.remove("backward") {
			Some(Value::Null) | None => settings.storage.backward.then(NodeMap::new),
			Some(value) => Some(hydrate_nodes(value)?),
		};

		debug!(
			datasets = nodes.len(),
			backward = backward.is_some(),
			"loaded storage"
		);
		Ok(Self { settings, nodes, backward })
	}
}

impl Storage for JsonStorage {
	fn settings(&self) -> &Settings {
		&self.settings
	}

	fn state_separator(&self) -> &str {
		&self.settings.storage.state_separator
	}

	fn add_links<I>(&mut self, links: I, dataset_prefix: &str) -> Result<(), StorageError>
	where
		I: IntoIterator<Item = Link>,
	{
		for link in links {
			let Link { dataset, context, target, count } = link;
			let name = format!("{dataset_prefix}{dataset}");

			// The reverse transition drops the first context token, appends
			// the target, and records the dropped token as the successor.
			let reverse = if self.backward.is_some() && target.is_some() {
				let first = context.first().cloned().ok_or_else(|| {
					StorageError::Structural(
						"backward link requires a non-empty context".to_owned(),
					)
				})?;
				let reverse_context =
					context[1..].iter().map(String::as_str).chain(target.as_deref());
				Some((self.join_state(reverse_context), first))
			} else {
				None
			};
			let forward_key = self.join_state(&context);

			let (forward, backward) = self.dataset_mut(&name);
			if let (Some(backward), Some((reverse_key, first))) = (backward, reverse) {
				backward
					.entry(reverse_key)
					.or_default()
					.increment(Some(first), count);
			}
			forward.entry(forward_key).or_default().increment(target, count);
		}
		Ok(())
	}

	fn find_states(&self, dataset: &str, query: &str) -> Result<Vec<String>, StorageError> {
		let (forward, _) = self.dataset(dataset)?;
		let query = query.to_lowercase();
		let mut states: Vec<String> = forward
			.keys()
			.filter(|key| key.to_lowercase().contains(&query))
			.cloned()
			.collect();
		states.sort();
		Ok(states)
	}

	fn successors(
		&self,
		dataset: &str,
		state: &StateWindow,
		backward: bool,
	) -> Result<Vec<(Option<String>, u64)>, StorageError> {
		if backward && self.backward.is_none() {
			return Err(StorageError::Unsupported("no backward transition map"));
		}
		let (forward, backward_map) = self.dataset(dataset)?;
		let map = if backward {
			match backward_map {
				Some(map) => map,
				None => return Err(StorageError::Unsupported("no backward transition map")),
			}
		} else {
			forward
		};

		let key = self.join_state(state.iter());
		let mut links = match map.get(&key) {
			Some(counter) => counter
				.iter()
				.map(|(token, weight)| (token.map(str::to_owned), weight))
				.collect(),
			None => Vec::new(),
		};
		links.sort();
		Ok(links)
	}

	fn replace_state_separator(&mut self, old: &str, new: &str) {
		debug!(old, new, "replacing state separator");
		replace_separator(&mut self.nodes, old, new);
		if let Some(backward) = &mut self.backward {
			replace_separator(backward, old, new);
		}
		// Keep subsequent encodes consistent with the migrated keys.
		if self.settings.storage.state_separator == old {
			self.settings.storage.state_separator = new.to_owned();
		}
	}
}

/// Rewrites every stored key of every dataset by textual replacement.
fn replace_separator(nodes: &mut NodeMap, old: &str, new: &str) {
	for dataset in nodes.values_mut() {
		*dataset = dataset
			.drain()
			.map(|(key, counter)| (key.replace(old, new), counter))
			.collect();
	}
}
