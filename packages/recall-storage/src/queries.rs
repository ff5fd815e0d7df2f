use serde_json::Value;
use sqlx::{PgExecutor, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	Error, Result,
	models::{Chunk, ChunkRow, Document, Fact, FeedbackEvent, Memory},
};

const CHUNK_COLUMNS: &str = "\
SELECT
\tc.chunk_id,
\tc.owner_id,
\tc.document_id,
\tc.memory_id,
\tc.chunk_index,
\tc.text,
\tc.embedding_key,
\tc.summary,
\tc.entities,
\tc.generated_qas,
\tc.trust_score,
\tc.feedback_score,
\tc.created_at,
\tCOALESCE(d.created_at, m.created_at) AS parent_created_at
FROM chunks c
LEFT JOIN documents d ON d.document_id = c.document_id
LEFT JOIN memories m ON m.memory_id = c.memory_id";
const FACT_COLUMNS: &str = "\
SELECT
\tfact_id,
\towner_id,
\tsubject,
\tpredicate,
\tobject,
\tlocation,
\tconfidence,
\tvalid_from,
\tvalid_until,
\tis_superseded,
\tsource_chunk_id,
\tcreated_at
FROM facts";

pub async fn insert_document<'e, E>(executor: E, doc: &Document) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO documents (document_id, owner_id, title, created_at)
VALUES ($1, $2, $3, $4)",
	)
	.bind(doc.document_id)
	.bind(doc.owner_id.as_str())
	.bind(doc.title.as_str())
	.bind(doc.created_at)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn insert_memory<'e, E>(executor: E, memory: &Memory) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO memories (memory_id, owner_id, title, content, created_at)
VALUES ($1, $2, $3, $4, $5)",
	)
	.bind(memory.memory_id)
	.bind(memory.owner_id.as_str())
	.bind(memory.title.as_deref())
	.bind(memory.content.as_str())
	.bind(memory.created_at)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn insert_chunk<'e, E>(executor: E, chunk: &Chunk) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO chunks (
\tchunk_id,
\towner_id,
\tdocument_id,
\tmemory_id,
\tchunk_index,
\ttext,
\tembedding_key,
\tsummary,
\tentities,
\tgenerated_qas,
\ttrust_score,
\tfeedback_score,
\tcreated_at
)
VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13)",
	)
	.bind(chunk.chunk_id)
	.bind(chunk.owner_id.as_str())
	.bind(chunk.parent.document_id())
	.bind(chunk.parent.memory_id())
	.bind(chunk.chunk_index)
	.bind(chunk.text.as_str())
	.bind(chunk.embedding_key)
	.bind(chunk.summary.as_deref())
	.bind(&chunk.entities)
	.bind(&chunk.generated_qas)
	.bind(chunk.trust_score)
	.bind(chunk.feedback_score)
	.bind(chunk.created_at)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn insert_fact<'e, E>(executor: E, fact: &Fact) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO facts (
\tfact_id,
\towner_id,
\tsubject,
\tpredicate,
\tobject,
\tlocation,
\tconfidence,
\tvalid_from,
\tvalid_until,
\tis_superseded,
\tsource_chunk_id,
\tcreated_at
)
VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12)",
	)
	.bind(fact.fact_id)
	.bind(fact.owner_id.as_str())
	.bind(fact.subject.as_str())
	.bind(fact.predicate.as_str())
	.bind(fact.object.as_str())
	.bind(fact.location.as_deref())
	.bind(fact.confidence)
	.bind(fact.valid_from)
	.bind(fact.valid_until)
	.bind(fact.is_superseded)
	.bind(fact.source_chunk_id)
	.bind(fact.created_at)
	.execute(executor)
	.await?;

	Ok(())
}

/// Chunks whose vector index point ids are in `embedding_keys`, in no particular order.
pub async fn chunks_by_embedding_keys<'e, E>(
	executor: E,
	owner_id: &str,
	embedding_keys: &[Uuid],
) -> Result<Vec<Chunk>>
where
	E: PgExecutor<'e>,
{
	if embedding_keys.is_empty() {
		return Ok(Vec::new());
	}

	let sql = format!("{CHUNK_COLUMNS}\nWHERE c.owner_id = $1 AND c.embedding_key = ANY($2)");
	let rows = sqlx::query_as::<_, ChunkRow>(sql.as_str())
		.bind(owner_id)
		.bind(embedding_keys)
		.fetch_all(executor)
		.await?;

	rows.into_iter().map(Chunk::try_from).collect()
}

pub async fn chunks_for_owner<'e, E>(executor: E, owner_id: &str) -> Result<Vec<Chunk>>
where
	E: PgExecutor<'e>,
{
	let sql = format!("{CHUNK_COLUMNS}\nWHERE c.owner_id = $1\nORDER BY c.created_at, c.chunk_index");
	let rows =
		sqlx::query_as::<_, ChunkRow>(sql.as_str()).bind(owner_id).fetch_all(executor).await?;

	rows.into_iter().map(Chunk::try_from).collect()
}

/// Facts in `fact_ids` that are neither expired nor superseded.
pub async fn current_facts_by_ids<'e, E>(
	executor: E,
	owner_id: &str,
	fact_ids: &[Uuid],
) -> Result<Vec<Fact>>
where
	E: PgExecutor<'e>,
{
	if fact_ids.is_empty() {
		return Ok(Vec::new());
	}

	let sql = format!(
		"{FACT_COLUMNS}
WHERE owner_id = $1
\tAND fact_id = ANY($2)
\tAND valid_until IS NULL
\tAND is_superseded = false"
	);
	let rows = sqlx::query_as::<_, Fact>(sql.as_str())
		.bind(owner_id)
		.bind(fact_ids)
		.fetch_all(executor)
		.await?;

	Ok(rows)
}

pub async fn facts_for_owner<'e, E>(executor: E, owner_id: &str) -> Result<Vec<Fact>>
where
	E: PgExecutor<'e>,
{
	let sql = format!("{FACT_COLUMNS}\nWHERE owner_id = $1\nORDER BY valid_from, fact_id");
	let rows = sqlx::query_as::<_, Fact>(sql.as_str()).bind(owner_id).fetch_all(executor).await?;

	Ok(rows)
}

/// Flags facts as superseded. Already superseded rows are left untouched.
pub async fn mark_superseded<'e, E>(executor: E, owner_id: &str, fact_ids: &[Uuid]) -> Result<u64>
where
	E: PgExecutor<'e>,
{
	if fact_ids.is_empty() {
		return Ok(0);
	}

	let result = sqlx::query(
		"\
UPDATE facts
SET is_superseded = true
WHERE owner_id = $1
\tAND fact_id = ANY($2)
\tAND is_superseded = false",
	)
	.bind(owner_id)
	.bind(fact_ids)
	.execute(executor)
	.await?;

	Ok(result.rows_affected())
}

/// Memories whose content contains `needle` case-insensitively, newest first.
pub async fn memories_matching<'e, E>(
	executor: E,
	owner_id: &str,
	needle: &str,
	limit: u32,
) -> Result<Vec<Memory>>
where
	E: PgExecutor<'e>,
{
	let pattern = format!("%{}%", escape_like(needle));
	let rows = sqlx::query_as::<_, Memory>(
		"\
SELECT memory_id, owner_id, title, content, created_at
FROM memories
WHERE owner_id = $1 AND content ILIKE $2 ESCAPE '\\'
ORDER BY created_at DESC, memory_id DESC
LIMIT $3",
	)
	.bind(owner_id)
	.bind(pattern)
	.bind(i64::from(limit))
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

pub struct NewFeedbackEvent<'a> {
	pub event_id: Uuid,
	pub owner_id: &'a str,
	pub chunk_id: Uuid,
	pub document_id: Option<Uuid>,
	pub event_type: &'a str,
	pub score_delta: f32,
	pub context: Option<&'a Value>,
	pub created_at: OffsetDateTime,
}

/// Logs a feedback event and adds its delta to the chunk's feedback score in one transaction.
///
/// Returns the chunk's updated feedback score. Unknown chunks leave no trace.
pub async fn apply_feedback(pool: &PgPool, event: &NewFeedbackEvent<'_>) -> Result<f32> {
	let mut tx = pool.begin().await?;
	let updated: Option<f32> = sqlx::query_scalar(
		"\
UPDATE chunks
SET feedback_score = feedback_score + $1
WHERE chunk_id = $2 AND owner_id = $3
RETURNING feedback_score",
	)
	.bind(event.score_delta)
	.bind(event.chunk_id)
	.bind(event.owner_id)
	.fetch_optional(&mut *tx)
	.await?;
	let Some(feedback_score) = updated else {
		tx.rollback().await?;

		return Err(Error::NotFound(format!("chunk {}", event.chunk_id)));
	};

	sqlx::query(
		"\
INSERT INTO feedback_events (
\tevent_id,
\towner_id,
\tchunk_id,
\tdocument_id,
\tevent_type,
\tscore_delta,
\tcontext,
\tcreated_at
)
VALUES ($1,$2,$3,$4,$5,$6,$7,$8)",
	)
	.bind(event.event_id)
	.bind(event.owner_id)
	.bind(event.chunk_id)
	.bind(event.document_id)
	.bind(event.event_type)
	.bind(event.score_delta)
	.bind(event.context)
	.bind(event.created_at)
	.execute(&mut *tx)
	.await?;

	tx.commit().await?;

	Ok(feedback_score)
}

pub async fn feedback_events_for_chunk<'e, E>(
	executor: E,
	chunk_id: Uuid,
) -> Result<Vec<FeedbackEvent>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, FeedbackEvent>(
		"\
SELECT event_id, owner_id, chunk_id, document_id, event_type, score_delta, context, created_at
FROM feedback_events
WHERE chunk_id = $1
ORDER BY created_at, event_id",
	)
	.bind(chunk_id)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

/// Escapes `%`, `_` and `\` so `raw` matches literally inside a LIKE pattern.
pub fn escape_like(raw: &str) -> String {
	let mut out = String::with_capacity(raw.len());

	for ch in raw.chars() {
		if matches!(ch, '%' | '_' | '\\') {
			out.push('\\');
		}

		out.push(ch);
	}

	out
}
