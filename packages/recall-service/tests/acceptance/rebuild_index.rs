use serde_json::Value;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use super::{OTHER_OWNER, chunk_row, fact_row, harness, lock};
use recall_service::{Error, RebuildIndexRequest, RebuildIndexResponse};

#[tokio::test]
async fn rebuild_upserts_live_rows_and_removes_retired_facts() {
	let now = OffsetDateTime::now_utc();
	let h = harness(Vec::new());
	let first = chunk_row(Uuid::new_v4(), "Kickoff agenda", 0.0, 0.5, now);
	let second = chunk_row(Uuid::new_v4(), "Retro outcomes", 0.0, 0.5, now);
	let mut foreign = chunk_row(Uuid::new_v4(), "Someone else", 0.0, 0.5, now);
	let current = fact_row("Eve", "manages", "Platform", 0.9, now - Duration::days(2));
	let mut superseded = fact_row("Eve", "manages", "Platform", 0.8, now - Duration::days(2));
	let mut expired = fact_row("Eve", "manages", "Growth", 0.9, now - Duration::days(90));

	foreign.owner_id = OTHER_OWNER.to_string();
	superseded.is_superseded = true;
	expired.valid_until = Some(now - Duration::days(3));

	h.store.seed_chunks(vec![first.clone(), second, foreign]);
	h.store.seed_facts(vec![current.clone(), superseded.clone(), expired.clone()]);

	let response = h
		.service
		.rebuild_index(RebuildIndexRequest { owner_id: super::OWNER.to_string() })
		.await
		.expect("Rebuild failed.");

	assert_eq!(response, RebuildIndexResponse { chunks: 2, facts: 1, removed: 2 });

	let upserted = lock(&h.index.upserted).clone();

	assert_eq!(upserted.len(), 3);
	assert!(upserted.iter().all(|point| point.metadata["owner_id"] == Value::from(super::OWNER)));

	let chunk_point = upserted
		.iter()
		.find(|point| point.id == first.embedding_key)
		.expect("Chunk point missing.");

	assert_eq!(chunk_point.text, "Kickoff agenda");
	assert_eq!(chunk_point.metadata["chunk_id"], Value::String(first.chunk_id.to_string()));

	let fact_point =
		upserted.iter().find(|point| point.id == current.fact_id).expect("Fact point missing.");

	assert_eq!(fact_point.text, "Eve manages Platform");
	assert_eq!(fact_point.metadata["type"], Value::from("fact"));

	let deleted = lock(&h.index.deleted).clone();

	assert_eq!(deleted, vec![superseded.fact_id, expired.fact_id]);
}

#[tokio::test]
async fn rebuild_rejects_blank_owner() {
	let h = harness(Vec::new());
	let result = h.service.rebuild_index(RebuildIndexRequest { owner_id: String::new() }).await;

	assert!(matches!(result, Err(Error::InvalidRequest { .. })));
}
