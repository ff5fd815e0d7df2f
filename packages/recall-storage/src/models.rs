use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, Result};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Document {
	pub document_id: Uuid,
	pub owner_id: String,
	pub title: String,
	pub created_at: OffsetDateTime,
}

/// A raw timestamped entry. Memories parent chunks and back the episodic view.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Memory {
	pub memory_id: Uuid,
	pub owner_id: String,
	pub title: Option<String>,
	pub content: String,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkParent {
	Document(Uuid),
	Memory(Uuid),
}
impl ChunkParent {
	pub fn id(self) -> Uuid {
		match self {
			Self::Document(id) | Self::Memory(id) => id,
		}
	}

	pub fn document_id(self) -> Option<Uuid> {
		match self {
			Self::Document(id) => Some(id),
			Self::Memory(_) => None,
		}
	}

	pub fn memory_id(self) -> Option<Uuid> {
		match self {
			Self::Memory(id) => Some(id),
			Self::Document(_) => None,
		}
	}

	pub fn from_columns(document_id: Option<Uuid>, memory_id: Option<Uuid>) -> Result<Self> {
		match (document_id, memory_id) {
			(Some(id), None) => Ok(Self::Document(id)),
			(None, Some(id)) => Ok(Self::Memory(id)),
			(Some(_), Some(_)) =>
				Err(Error::InvalidRow("Chunk references both a document and a memory.".to_string())),
			(None, None) => Err(Error::InvalidRow("Chunk has no parent.".to_string())),
		}
	}
}

/// Chunk as stored, with its parent's creation time when the parent row exists.
#[derive(Debug, sqlx::FromRow)]
pub struct ChunkRow {
	pub chunk_id: Uuid,
	pub owner_id: String,
	pub document_id: Option<Uuid>,
	pub memory_id: Option<Uuid>,
	pub chunk_index: i32,
	pub text: String,
	pub embedding_key: Uuid,
	pub summary: Option<String>,
	pub entities: Value,
	pub generated_qas: Value,
	pub trust_score: f32,
	pub feedback_score: f32,
	pub created_at: OffsetDateTime,
	pub parent_created_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone)]
pub struct Chunk {
	pub chunk_id: Uuid,
	pub owner_id: String,
	pub parent: ChunkParent,
	pub chunk_index: i32,
	pub text: String,
	pub embedding_key: Uuid,
	pub summary: Option<String>,
	pub entities: Value,
	pub generated_qas: Value,
	pub trust_score: f32,
	pub feedback_score: f32,
	pub created_at: OffsetDateTime,
	pub parent_created_at: Option<OffsetDateTime>,
}
impl Chunk {
	/// Instant that drives recency: the parent's creation time, else the chunk's own.
	pub fn recency_anchor(&self) -> OffsetDateTime {
		self.parent_created_at.unwrap_or(self.created_at)
	}
}
impl TryFrom<ChunkRow> for Chunk {
	type Error = Error;

	fn try_from(row: ChunkRow) -> Result<Self> {
		let parent = ChunkParent::from_columns(row.document_id, row.memory_id)?;

		Ok(Self {
			chunk_id: row.chunk_id,
			owner_id: row.owner_id,
			parent,
			chunk_index: row.chunk_index,
			text: row.text,
			embedding_key: row.embedding_key,
			summary: row.summary,
			entities: row.entities,
			generated_qas: row.generated_qas,
			trust_score: row.trust_score,
			feedback_score: row.feedback_score,
			created_at: row.created_at,
			parent_created_at: row.parent_created_at,
		})
	}
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Fact {
	pub fact_id: Uuid,
	pub owner_id: String,
	pub subject: String,
	pub predicate: String,
	pub object: String,
	pub location: Option<String>,
	pub confidence: f32,
	pub valid_from: OffsetDateTime,
	pub valid_until: Option<OffsetDateTime>,
	pub is_superseded: bool,
	pub source_chunk_id: Option<Uuid>,
	pub created_at: OffsetDateTime,
}
impl Fact {
	pub fn is_current(&self) -> bool {
		self.valid_until.is_none() && !self.is_superseded
	}
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FeedbackEvent {
	pub event_id: Uuid,
	pub owner_id: String,
	pub chunk_id: Uuid,
	pub document_id: Option<Uuid>,
	pub event_type: String,
	pub score_delta: f32,
	pub context: Option<Value>,
	pub created_at: OffsetDateTime,
}
