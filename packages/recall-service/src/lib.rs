pub mod admin;
pub mod context;
pub mod feedback;
pub mod index;
pub mod maintenance;
pub mod search;
pub mod store;

mod error;

pub use admin::{RebuildIndexRequest, RebuildIndexResponse};
pub use context::{ContextRequest, ContextResponse};
pub use error::{Error, Result};
pub use feedback::{FeedbackRequest, FeedbackResponse};
pub use index::QdrantIndex;
pub use search::{SearchItem, SearchRequest, SearchResponse, SourceRef};
pub use store::PgStore;

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::{Map, Value};
use uuid::Uuid;

use maintenance::MaintenanceQueue;
use recall_config::{Config, EmbeddingProviderConfig};
use recall_providers::embedding;
use recall_storage::{
	db::Db,
	models::{Chunk, Fact, Memory},
	qdrant::QdrantStore,
	queries::NewFeedbackEvent,
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Metadata key that tags each index point with its kind.
pub const TYPE_KEY: &str = "type";
pub const OWNER_KEY: &str = "owner_id";
pub const FACT_TYPE: &str = "fact";
pub const CHUNK_TYPE: &str = "chunk";

/// One vector index hit, alive for a single search call.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
	pub id: String,
	pub raw_text: String,
	/// Similarity to the query in `[0, 1]`.
	pub base_relevance: f32,
	pub metadata: Map<String, Value>,
	pub embedding: Option<Vec<f32>>,
	/// 0-based position in the index response.
	pub retrieval_rank: u32,
}
impl Candidate {
	pub fn kind(&self) -> Option<&str> {
		self.metadata.get(TYPE_KEY).and_then(Value::as_str)
	}
}

#[derive(Clone, Copy, Debug)]
pub struct IndexFilter<'a> {
	pub owner_id: &'a str,
	/// Restricts hits to points whose `type` tag equals this value.
	pub kind: Option<&'a str>,
}

#[derive(Clone, Debug)]
pub struct IndexPoint {
	pub id: Uuid,
	pub text: String,
	pub metadata: Map<String, Value>,
}

pub trait VectorIndex
where
	Self: Send + Sync,
{
	fn query<'a>(
		&'a self,
		text: &'a str,
		top_k: u32,
		filter: IndexFilter<'a>,
		include_vectors: bool,
	) -> BoxFuture<'a, Result<Vec<Candidate>>>;

	fn upsert<'a>(&'a self, points: &'a [IndexPoint]) -> BoxFuture<'a, Result<()>>;

	fn delete<'a>(&'a self, ids: &'a [Uuid]) -> BoxFuture<'a, Result<()>>;
}

pub trait StructuredStore
where
	Self: Send + Sync,
{
	fn chunks_by_embedding_keys<'a>(
		&'a self,
		owner_id: &'a str,
		embedding_keys: &'a [Uuid],
	) -> BoxFuture<'a, Result<Vec<Chunk>>>;

	/// Facts among `fact_ids` that are neither expired nor superseded.
	fn current_facts_by_ids<'a>(
		&'a self,
		owner_id: &'a str,
		fact_ids: &'a [Uuid],
	) -> BoxFuture<'a, Result<Vec<Fact>>>;

	fn mark_superseded<'a>(
		&'a self,
		owner_id: &'a str,
		fact_ids: &'a [Uuid],
	) -> BoxFuture<'a, Result<u64>>;

	fn memories_matching<'a>(
		&'a self,
		owner_id: &'a str,
		needle: &'a str,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<Memory>>>;

	/// Returns the chunk's feedback score after the event is applied.
	fn apply_feedback<'a>(&'a self, event: &'a NewFeedbackEvent<'a>) -> BoxFuture<'a, Result<f32>>;

	fn chunks_for_owner<'a>(&'a self, owner_id: &'a str) -> BoxFuture<'a, Result<Vec<Chunk>>>;

	fn facts_for_owner<'a>(&'a self, owner_id: &'a str) -> BoxFuture<'a, Result<Vec<Fact>>>;
}

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>>;
}

/// Embeds through the configured HTTP provider.
pub struct HttpEmbedding;
impl EmbeddingProvider for HttpEmbedding {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		Box::pin(async move { Ok(embedding::embed(cfg, texts).await?) })
	}
}

pub struct RecallService {
	pub cfg: Config,
	pub index: Arc<dyn VectorIndex>,
	pub store: Arc<dyn StructuredStore>,
	maintenance: MaintenanceQueue,
}
impl RecallService {
	/// Wires the engine to its collaborators and starts the maintenance task.
	///
	/// Must be called from within a Tokio runtime.
	pub fn new(cfg: Config, index: Arc<dyn VectorIndex>, store: Arc<dyn StructuredStore>) -> Self {
		let maintenance = MaintenanceQueue::spawn(store.clone());

		Self { cfg, index, store, maintenance }
	}

	/// Connects to Postgres and Qdrant, bootstrapping the schema and the collection.
	pub async fn connect(cfg: Config) -> Result<Self> {
		let db = Db::connect(&cfg.storage.postgres).await?;

		db.ensure_schema().await?;

		let qdrant = QdrantStore::new(&cfg.storage.qdrant)?;

		qdrant.ensure_collection().await?;

		let index = QdrantIndex::new(
			qdrant,
			cfg.providers.embedding.clone(),
			Arc::new(HttpEmbedding),
		);

		Ok(Self::new(cfg, Arc::new(index), Arc::new(PgStore::new(db))))
	}

	/// Waits until every maintenance job queued so far has run.
	pub async fn drain_maintenance(&self) {
		self.maintenance.flush().await;
	}
}
