use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Retrieval view selected for a search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
	/// Diversified and re-ranked text chunks.
	Semantic,
	/// Current, deduplicated facts.
	State,
	/// Raw timestamped entries matched by substring.
	Episodic,
	/// Facts ahead of chunks from a single fan-out.
	#[default]
	Auto,
}
impl View {
	pub const ALL: [Self; 4] = [Self::Semantic, Self::State, Self::Episodic, Self::Auto];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Semantic => "semantic",
			Self::State => "state",
			Self::Episodic => "episodic",
			Self::Auto => "auto",
		}
	}
}
impl fmt::Display for View {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
impl FromStr for View {
	type Err = UnknownView;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let trimmed = s.trim();

		Self::ALL
			.into_iter()
			.find(|view| view.as_str().eq_ignore_ascii_case(trimmed))
			.ok_or_else(|| UnknownView(trimmed.to_string()))
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownView(pub String);
impl fmt::Display for UnknownView {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Unknown view {:?}; expected semantic, state, episodic or auto.", self.0)
	}
}
impl std::error::Error for UnknownView {}
