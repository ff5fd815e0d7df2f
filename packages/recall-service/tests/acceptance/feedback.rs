use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use super::{chunk_hit, chunk_row, harness, lock};
use recall_domain::{feedback::FeedbackKind, view::View};
use recall_service::{Error, FeedbackRequest, SearchRequest};

fn feedback(chunk_id: Uuid, event_type: FeedbackKind) -> FeedbackRequest {
	FeedbackRequest {
		owner_id: super::OWNER.to_string(),
		chunk_id,
		event_type,
		document_id: None,
		context: Some(serde_json::json!({ "query": "standup" })),
	}
}

#[tokio::test]
async fn feedback_shifts_the_score_and_is_logged() {
	let key = Uuid::new_v4();
	let created = OffsetDateTime::now_utc() - Duration::days(30);
	let h = harness(vec![chunk_hit(key, "Standup notes", 0.5, vec![1.0, 0.0])]);
	let chunk = chunk_row(key, "Standup notes", 0.0, 0.5, created);
	let chunk_id = chunk.chunk_id;

	h.store.seed_chunks(vec![chunk]);

	let up = h
		.service
		.record_feedback(feedback(chunk_id, FeedbackKind::ThumbsUp))
		.await
		.expect("Feedback failed.");
	let click = h
		.service
		.record_feedback(feedback(chunk_id, FeedbackKind::Click))
		.await
		.expect("Feedback failed.");

	assert_eq!(up.score_delta, 1.0);
	assert!((click.feedback_score - 1.1).abs() < 1e-6);
	assert!((h.store.chunk(chunk_id).expect("Chunk vanished.").feedback_score - 1.1).abs() < 1e-6);

	let events = lock(&h.store.state).feedback.clone();
	let kinds = events.iter().map(|event| event.event_type.as_str()).collect::<Vec<_>>();

	assert_eq!(kinds, vec!["thumbs_up", "click"]);
	assert!(events.iter().all(|event| event.chunk_id == chunk_id));

	let response = h
		.service
		.search(SearchRequest {
			owner_id: super::OWNER.to_string(),
			query: "standup".to_string(),
			top_k: Some(1),
			view: Some(View::Semantic),
		})
		.await
		.expect("Search failed.");

	// 0.5 × 2.1 × 1.0 × (1 + 0.1 / 30)
	assert!((response.items[0].score - 0.5 * 2.1 * (1.0 + 0.1 / 30.0)).abs() < 1e-5);
}

#[tokio::test]
async fn negative_feedback_lowers_the_score() {
	let key = Uuid::new_v4();
	let h = harness(Vec::new());
	let chunk = chunk_row(key, "Noise", 0.0, 0.5, OffsetDateTime::now_utc());
	let chunk_id = chunk.chunk_id;

	h.store.seed_chunks(vec![chunk]);

	let response = h
		.service
		.record_feedback(feedback(chunk_id, FeedbackKind::Dismiss))
		.await
		.expect("Feedback failed.");

	assert_eq!(response.score_delta, -0.5);
	assert_eq!(response.feedback_score, -0.5);
}

#[tokio::test]
async fn unknown_chunks_are_not_found_and_not_logged() {
	let h = harness(Vec::new());
	let result = h.service.record_feedback(feedback(Uuid::new_v4(), FeedbackKind::Insert)).await;

	assert!(matches!(result, Err(Error::NotFound { .. })));
	assert!(lock(&h.store.state).feedback.is_empty());
}

#[tokio::test]
async fn blank_owner_is_rejected() {
	let h = harness(Vec::new());
	let mut req = feedback(Uuid::new_v4(), FeedbackKind::Click);

	req.owner_id = " ".to_string();

	assert!(matches!(h.service.record_feedback(req).await, Err(Error::InvalidRequest { .. })));
}
