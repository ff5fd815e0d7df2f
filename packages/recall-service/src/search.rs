pub mod chunks;
pub mod episodic;
pub mod facts;
pub mod fanout;
pub mod mmr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{CHUNK_TYPE, Error, FACT_TYPE, RecallService, Result};
use recall_domain::view::View;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchRequest {
	pub owner_id: String,
	pub query: String,
	#[serde(default)]
	pub top_k: Option<u32>,
	#[serde(default)]
	pub view: Option<View>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchResponse {
	pub view: View,
	pub items: Vec<SearchItem>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchItem {
	pub text: String,
	pub score: f32,
	pub metadata: Map<String, Value>,
	pub source_ref: SourceRef,
}

/// Where a search item came from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceRef {
	DocumentChunk { document_id: Uuid, chunk_id: Uuid },
	MemoryChunk { memory_id: Uuid, chunk_id: Uuid },
	Fact { fact_id: Uuid, source_chunk_id: Option<Uuid> },
	Memory { memory_id: Uuid },
	/// A vector index hit that could not be hydrated.
	Index { point_id: String },
}

impl RecallService {
	/// Ranks the owner's knowledge for `query` through the requested view.
	///
	/// Upstream failures degrade to fewer or no items. Only blank owners or queries are errors.
	pub async fn search(&self, req: SearchRequest) -> Result<SearchResponse> {
		let owner_id = req.owner_id.trim();
		let query = req.query.trim();

		if owner_id.is_empty() {
			return Err(Error::InvalidRequest { message: "owner_id must be non-empty.".to_string() });
		}
		if query.is_empty() {
			return Err(Error::InvalidRequest { message: "query must be non-empty.".to_string() });
		}

		let view = req.view.unwrap_or_default();
		let top_k =
			req.top_k.unwrap_or(self.cfg.search.default_top_k).min(self.cfg.search.max_top_k);
		let now = OffsetDateTime::now_utc();
		let items = if top_k == 0 {
			Vec::new()
		} else {
			match view {
				View::Semantic => self.semantic_view(owner_id, query, top_k, now).await,
				View::State => self.state_view(owner_id, query, top_k, now).await,
				View::Episodic => self.episodic_view(owner_id, query, top_k).await,
				View::Auto => self.auto_view(owner_id, query, top_k, now).await,
			}
		};

		tracing::info!(owner_id, view = %view, top_k, results = items.len(), "Search completed.");

		Ok(SearchResponse { view, items })
	}

	async fn semantic_view(
		&self,
		owner_id: &str,
		query: &str,
		top_k: u32,
		now: OffsetDateTime,
	) -> Vec<SearchItem> {
		let fetch_k = top_k.saturating_mul(self.cfg.search.fanout_multiplier);
		let candidates = self.query_index(owner_id, query, fetch_k, Some(CHUNK_TYPE)).await;

		self.rank_chunks(owner_id, candidates, top_k, now).await
	}

	async fn state_view(
		&self,
		owner_id: &str,
		query: &str,
		top_k: u32,
		now: OffsetDateTime,
	) -> Vec<SearchItem> {
		let fetch_k = top_k.saturating_mul(self.cfg.search.state_fanout_multiplier);
		let candidates = self.query_index(owner_id, query, fetch_k, Some(FACT_TYPE)).await;

		self.rank_facts(owner_id, &candidates, top_k, now).await
	}

	async fn auto_view(
		&self,
		owner_id: &str,
		query: &str,
		top_k: u32,
		now: OffsetDateTime,
	) -> Vec<SearchItem> {
		let buckets = self.unified_fanout(owner_id, query, top_k).await;
		let (mut items, chunks) = tokio::join!(
			self.rank_facts(owner_id, &buckets.facts, self.cfg.search.state_top_k, now),
			self.rank_chunks(owner_id, buckets.chunks, top_k, now),
		);

		items.extend(chunks);

		items
	}
}
