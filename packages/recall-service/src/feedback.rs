use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, RecallService, Result};
use recall_domain::feedback::FeedbackKind;
use recall_storage::queries::NewFeedbackEvent;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FeedbackRequest {
	pub owner_id: String,
	pub chunk_id: Uuid,
	pub event_type: FeedbackKind,
	#[serde(default)]
	pub document_id: Option<Uuid>,
	#[serde(default)]
	pub context: Option<Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FeedbackResponse {
	pub chunk_id: Uuid,
	pub event_type: FeedbackKind,
	pub score_delta: f32,
	/// The chunk's feedback score after this event.
	pub feedback_score: f32,
}

impl RecallService {
	/// Logs a feedback event and shifts the chunk's feedback score by the event's delta.
	pub async fn record_feedback(&self, req: FeedbackRequest) -> Result<FeedbackResponse> {
		let owner_id = req.owner_id.trim();

		if owner_id.is_empty() {
			return Err(Error::InvalidRequest { message: "owner_id must be non-empty.".to_string() });
		}

		let score_delta = req.event_type.delta();
		let event = NewFeedbackEvent {
			event_id: Uuid::new_v4(),
			owner_id,
			chunk_id: req.chunk_id,
			document_id: req.document_id,
			event_type: req.event_type.as_str(),
			score_delta,
			context: req.context.as_ref(),
			created_at: OffsetDateTime::now_utc(),
		};
		let feedback_score = self.store.apply_feedback(&event).await?;

		tracing::info!(
			owner_id,
			chunk_id = %req.chunk_id,
			event_type = req.event_type.as_str(),
			feedback_score,
			"Feedback recorded."
		);

		Ok(FeedbackResponse {
			chunk_id: req.chunk_id,
			event_type: req.event_type,
			score_delta,
			feedback_score,
		})
	}
}
