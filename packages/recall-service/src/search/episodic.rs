use serde_json::{Map, Value};
use time::format_description::well_known::Rfc3339;

use crate::{
	RecallService, TYPE_KEY,
	search::{SearchItem, SourceRef},
};
use recall_storage::models::Memory;

pub const MEMORY_TYPE: &str = "memory";

impl RecallService {
	/// Newest memories whose content contains `query`, ignoring case. Every item scores 1.0.
	pub(crate) async fn episodic_view(
		&self,
		owner_id: &str,
		query: &str,
		top_k: u32,
	) -> Vec<SearchItem> {
		match self.store.memories_matching(owner_id, query, top_k).await {
			Ok(memories) => memories.into_iter().map(memory_item).collect(),
			Err(err) => {
				tracing::warn!(error = %err, owner_id, "Episodic lookup failed.");

				Vec::new()
			},
		}
	}
}

fn memory_item(memory: Memory) -> SearchItem {
	let mut metadata = Map::new();

	metadata.insert(TYPE_KEY.to_string(), Value::String(MEMORY_TYPE.to_string()));
	metadata.insert("memory_id".to_string(), Value::String(memory.memory_id.to_string()));
	metadata.insert(
		"created_at".to_string(),
		Value::String(memory.created_at.format(&Rfc3339).unwrap_or_default()),
	);
	metadata.insert("title".to_string(), memory.title.map_or(Value::Null, Value::String));

	SearchItem {
		text: memory.content,
		score: 1.0,
		metadata,
		source_ref: SourceRef::Memory { memory_id: memory.memory_id },
	}
}
