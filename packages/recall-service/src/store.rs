use uuid::Uuid;

use crate::{BoxFuture, Result, StructuredStore};
use recall_storage::{
	db::Db,
	models::{Chunk, Fact, Memory},
	queries::{self, NewFeedbackEvent},
};

/// Postgres-backed structured store. Calls share the pool, so they may run concurrently.
pub struct PgStore {
	db: Db,
}
impl PgStore {
	pub fn new(db: Db) -> Self {
		Self { db }
	}

	pub fn db(&self) -> &Db {
		&self.db
	}
}
impl StructuredStore for PgStore {
	fn chunks_by_embedding_keys<'a>(
		&'a self,
		owner_id: &'a str,
		embedding_keys: &'a [Uuid],
	) -> BoxFuture<'a, Result<Vec<Chunk>>> {
		Box::pin(async move {
			Ok(queries::chunks_by_embedding_keys(&self.db.pool, owner_id, embedding_keys).await?)
		})
	}

	fn current_facts_by_ids<'a>(
		&'a self,
		owner_id: &'a str,
		fact_ids: &'a [Uuid],
	) -> BoxFuture<'a, Result<Vec<Fact>>> {
		Box::pin(async move {
			Ok(queries::current_facts_by_ids(&self.db.pool, owner_id, fact_ids).await?)
		})
	}

	fn mark_superseded<'a>(
		&'a self,
		owner_id: &'a str,
		fact_ids: &'a [Uuid],
	) -> BoxFuture<'a, Result<u64>> {
		Box::pin(async move { Ok(queries::mark_superseded(&self.db.pool, owner_id, fact_ids).await?) })
	}

	fn memories_matching<'a>(
		&'a self,
		owner_id: &'a str,
		needle: &'a str,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<Memory>>> {
		Box::pin(async move {
			Ok(queries::memories_matching(&self.db.pool, owner_id, needle, limit).await?)
		})
	}

	fn apply_feedback<'a>(&'a self, event: &'a NewFeedbackEvent<'a>) -> BoxFuture<'a, Result<f32>> {
		Box::pin(async move { Ok(queries::apply_feedback(&self.db.pool, event).await?) })
	}

	fn chunks_for_owner<'a>(&'a self, owner_id: &'a str) -> BoxFuture<'a, Result<Vec<Chunk>>> {
		Box::pin(async move { Ok(queries::chunks_for_owner(&self.db.pool, owner_id).await?) })
	}

	fn facts_for_owner<'a>(&'a self, owner_id: &'a str) -> BoxFuture<'a, Result<Vec<Fact>>> {
		Box::pin(async move { Ok(queries::facts_for_owner(&self.db.pool, owner_id).await?) })
	}
}
