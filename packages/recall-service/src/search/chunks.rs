use std::collections::HashMap;

use serde_json::{Number, Value};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	Candidate, Error, RecallService,
	search::{SearchItem, SourceRef, mmr},
};
use recall_domain::{display, recency};
use recall_storage::models::{Chunk, ChunkParent};

impl RecallService {
	/// Diversifies chunk candidates with MMR, hydrates the picks in one store call and orders
	/// them by composite score.
	pub(crate) async fn rank_chunks(
		&self,
		owner_id: &str,
		candidates: Vec<Candidate>,
		top_k: u32,
		now: OffsetDateTime,
	) -> Vec<SearchItem> {
		let picks = mmr::select(&candidates, top_k as usize, self.cfg.search.mmr_lambda);

		if picks.is_empty() {
			return Vec::new();
		}

		let mut slots = candidates.into_iter().map(Some).collect::<Vec<_>>();
		let selected = picks.iter().filter_map(|pick| slots[pick.index].take()).collect::<Vec<_>>();
		let keys = selected.iter().filter_map(|c| Uuid::parse_str(&c.id).ok()).collect::<Vec<_>>();
		let mut rows = self.hydrate_chunks(owner_id, &keys).await;
		let mut ranked = Vec::with_capacity(selected.len());

		for candidate in selected {
			let row = Uuid::parse_str(&candidate.id).ok().and_then(|key| rows.remove(&key));
			let rank = candidate.retrieval_rank;
			let item = match row {
				Some(chunk) => hydrated_item(candidate, &chunk, now),
				None => {
					tracing::debug!(
						owner_id,
						point_id = %candidate.id,
						"Chunk candidate not hydrated. Using index data."
					);

					fallback_item(candidate)
				},
			};

			ranked.push((rank, item));
		}

		ranked.sort_by(|(rank_a, a), (rank_b, b)| {
			b.score.total_cmp(&a.score).then_with(|| rank_a.cmp(rank_b))
		});

		ranked.into_iter().map(|(_, item)| item).collect()
	}

	async fn hydrate_chunks(&self, owner_id: &str, keys: &[Uuid]) -> HashMap<Uuid, Chunk> {
		if keys.is_empty() {
			return HashMap::new();
		}

		match self.store.chunks_by_embedding_keys(owner_id, keys).await {
			Ok(chunks) => {
				if chunks.len() < keys.len() {
					let err = Error::PartialDataMissing {
						message: format!("{} of {} chunks found.", chunks.len(), keys.len()),
					};

					tracing::debug!(error = %err, owner_id, "Chunk hydration incomplete.");
				}

				chunks.into_iter().map(|chunk| (chunk.embedding_key, chunk)).collect()
			},
			Err(err) => {
				let err = Error::PartialDataMissing { message: err.to_string() };

				tracing::warn!(
					error = %err,
					owner_id,
					count = keys.len(),
					"Chunk hydration failed."
				);

				HashMap::new()
			},
		}
	}
}

/// `base × (1 + feedback) × (0.5 + trust) × recency_modifier`.
pub fn composite_score(
	base_relevance: f32,
	feedback_score: f32,
	trust_score: f32,
	recency_modifier: f32,
) -> f32 {
	base_relevance * (1.0 + feedback_score) * (0.5 + trust_score) * recency_modifier
}

fn hydrated_item(candidate: Candidate, chunk: &Chunk, now: OffsetDateTime) -> SearchItem {
	let anchor = chunk.recency_anchor();
	let modifier = recency::chunk_recency_modifier(recency::whole_days_between(anchor, now));
	let score = composite_score(
		candidate.base_relevance,
		chunk.feedback_score,
		chunk.trust_score,
		modifier,
	);
	let mut metadata = candidate.metadata;

	metadata.insert(
		"summary".to_string(),
		chunk.summary.clone().map_or(Value::Null, Value::String),
	);
	metadata.insert("generated_qas".to_string(), chunk.generated_qas.clone());
	metadata.insert("trust_score".to_string(), json_number(f64::from(chunk.trust_score)));
	metadata.insert("chunk_id".to_string(), Value::String(chunk.chunk_id.to_string()));
	metadata.insert("recency_boost".to_string(), json_number(round2(f64::from(modifier))));

	let source_ref = match chunk.parent {
		ChunkParent::Document(document_id) => {
			metadata.remove("memory_id");
			metadata.insert("document_id".to_string(), Value::String(document_id.to_string()));

			SourceRef::DocumentChunk { document_id, chunk_id: chunk.chunk_id }
		},
		ChunkParent::Memory(memory_id) => {
			metadata.remove("document_id");
			metadata.insert("memory_id".to_string(), Value::String(memory_id.to_string()));

			SourceRef::MemoryChunk { memory_id, chunk_id: chunk.chunk_id }
		},
	};

	SearchItem {
		text: display::session_display_text(&chunk.text, anchor),
		score,
		metadata,
		source_ref,
	}
}

fn fallback_item(candidate: Candidate) -> SearchItem {
	SearchItem {
		text: candidate.raw_text,
		score: candidate.base_relevance,
		metadata: candidate.metadata,
		source_ref: SourceRef::Index { point_id: candidate.id },
	}
}

fn round2(value: f64) -> f64 {
	(value * 100.0).round() / 100.0
}

fn json_number(value: f64) -> Value {
	Number::from_f64(value).map_or(Value::Null, Value::Number)
}
