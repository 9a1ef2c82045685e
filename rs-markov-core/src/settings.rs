use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

fn default_state_separator() -> String {
	" ".to_owned()
}

/// Storage-layer configuration.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StorageSettings {
	/// Whether the store keeps a mirrored backward transition map.
	#[serde(default)]
	pub backward: bool,

	/// Separator inserted between the tokens of a composite state key.
	///
	/// A token whose text contains the separator produces an ambiguous key;
	/// this is a documented limitation and is not detected.
	#[serde(default = "default_state_separator")]
	pub state_separator: String,
}

impl Default for StorageSettings {
	fn default() -> Self {
		Self { backward: false, state_separator: default_state_separator() }
	}
}

/// Immutable configuration record, read once when a store is built.
///
/// Callers may carry arbitrary extra keys next to `storage` (generation
/// parameters, corpus metadata); they are preserved verbatim so a persisted
/// snapshot round-trips without loss.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Settings {
	/// Storage-layer configuration.
	#[serde(default)]
	pub storage: StorageSettings,

	/// Caller-defined settings, kept opaque.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl Settings {
	/// Settings with backward support toggled and the default separator.
	pub fn with_backward(backward: bool) -> Self {
		Self {
			storage: StorageSettings { backward, ..StorageSettings::default() },
			..Self::default()
		}
	}

	/// Settings with backward support toggled and an explicit separator.
	pub fn with_separator(backward: bool, state_separator: &str) -> Self {
		Self {
			storage: StorageSettings {
				backward,
				state_separator: state_separator.to_owned(),
			},
			..Self::default()
		}
	}
}
