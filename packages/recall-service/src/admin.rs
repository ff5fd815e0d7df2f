//! Owner-level index maintenance.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{CHUNK_TYPE, Error, FACT_TYPE, IndexPoint, OWNER_KEY, RecallService, Result, TYPE_KEY};
use recall_domain::display;
use recall_storage::models::{Chunk, Fact};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RebuildIndexRequest {
	pub owner_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebuildIndexResponse {
	pub chunks: u64,
	pub facts: u64,
	/// Points deleted for superseded or expired facts.
	pub removed: u64,
}

impl RecallService {
	/// Re-upserts the owner's chunks and current facts, and deletes points of retired facts.
	pub async fn rebuild_index(&self, req: RebuildIndexRequest) -> Result<RebuildIndexResponse> {
		let owner_id = req.owner_id.trim();

		if owner_id.is_empty() {
			return Err(Error::InvalidRequest { message: "owner_id must be non-empty.".to_string() });
		}

		let chunks = self.store.chunks_for_owner(owner_id).await?;
		let facts = self.store.facts_for_owner(owner_id).await?;
		let mut points = chunks.iter().map(chunk_point).collect::<Vec<_>>();
		let mut retired = Vec::new();
		let mut current = 0_u64;

		for fact in &facts {
			if fact.is_current() {
				points.push(fact_point(fact));

				current += 1;
			} else {
				retired.push(fact.fact_id);
			}
		}

		self.index.upsert(&points).await?;
		self.index.delete(&retired).await?;

		let response = RebuildIndexResponse {
			chunks: chunks.len() as u64,
			facts: current,
			removed: retired.len() as u64,
		};

		tracing::info!(
			owner_id,
			chunks = response.chunks,
			facts = response.facts,
			removed = response.removed,
			"Index rebuilt."
		);

		Ok(response)
	}
}

fn base_metadata(kind: &str, owner_id: &str) -> Map<String, Value> {
	let mut metadata = Map::new();

	metadata.insert(TYPE_KEY.to_string(), Value::String(kind.to_string()));
	metadata.insert(OWNER_KEY.to_string(), Value::String(owner_id.to_string()));

	metadata
}

fn chunk_point(chunk: &Chunk) -> IndexPoint {
	let mut metadata = base_metadata(CHUNK_TYPE, &chunk.owner_id);

	metadata.insert("chunk_id".to_string(), Value::String(chunk.chunk_id.to_string()));
	metadata.insert("chunk_index".to_string(), Value::from(chunk.chunk_index));

	if let Some(document_id) = chunk.parent.document_id() {
		metadata.insert("document_id".to_string(), Value::String(document_id.to_string()));
	}
	if let Some(memory_id) = chunk.parent.memory_id() {
		metadata.insert("memory_id".to_string(), Value::String(memory_id.to_string()));
	}

	IndexPoint { id: chunk.embedding_key, text: chunk.text.clone(), metadata }
}

fn fact_point(fact: &Fact) -> IndexPoint {
	let mut metadata = base_metadata(FACT_TYPE, &fact.owner_id);

	metadata.insert("fact_id".to_string(), Value::String(fact.fact_id.to_string()));

	IndexPoint {
		id: fact.fact_id,
		text: display::fact_text(&fact.subject, &fact.predicate, &fact.object),
		metadata,
	}
}
