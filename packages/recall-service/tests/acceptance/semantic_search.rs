use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use super::{chunk_hit, chunk_row, harness};
use recall_domain::view::View;
use recall_service::{SearchRequest, SourceRef};

fn semantic(query: &str, top_k: u32) -> SearchRequest {
	SearchRequest {
		owner_id: super::OWNER.to_string(),
		query: query.to_string(),
		top_k: Some(top_k),
		view: Some(View::Semantic),
	}
}

#[tokio::test]
async fn exact_duplicate_text_surfaces_once_with_composite_score() {
	let a = Uuid::new_v4();
	let b = Uuid::new_v4();
	let created = OffsetDateTime::now_utc() - Duration::days(10);
	let h = harness(vec![
		chunk_hit(a, "Revenue grew 10%", 0.90, vec![1.0, 0.0]),
		chunk_hit(b, "Revenue grew 10%", 0.89, vec![1.0, 0.0]),
	]);

	h.store.seed_chunks(vec![
		chunk_row(a, "Revenue grew 10%", 1.0, 0.5, created),
		chunk_row(b, "Revenue grew 10%", 0.0, 0.5, created),
	]);

	let response = h.service.search(semantic("revenue", 5)).await.expect("Search failed.");

	assert_eq!(response.items.len(), 1);

	let item = &response.items[0];

	assert!((item.score - 0.90 * 2.0 * 1.0 * 1.01).abs() < 1e-5);
	assert!(item.text.starts_with("Revenue grew 10%\n(This session took place on "));
	assert!(matches!(item.source_ref, SourceRef::DocumentChunk { .. }));
}

#[tokio::test]
async fn semantic_view_queries_chunks_with_vectors() {
	let h = harness(Vec::new());
	let response = h.service.search(semantic("anything", 5)).await.expect("Search failed.");

	assert!(response.items.is_empty());

	let calls = h.index.calls();

	assert_eq!(calls.len(), 1);
	assert_eq!(calls[0].top_k, 50);
	assert_eq!(calls[0].kind.as_deref(), Some("chunk"));
	assert_eq!(calls[0].owner_id, super::OWNER);
	assert!(calls[0].include_vectors);
}

#[tokio::test]
async fn feedback_and_trust_reorder_chunks() {
	let first = Uuid::new_v4();
	let second = Uuid::new_v4();
	let created = OffsetDateTime::now_utc() - Duration::days(20);
	let h = harness(vec![
		chunk_hit(first, "Quarterly planning notes", 0.8, vec![1.0, 0.0]),
		chunk_hit(second, "Budget review with finance", 0.7, vec![0.0, 1.0]),
	]);

	h.store.seed_chunks(vec![
		chunk_row(first, "Quarterly planning notes", 0.0, 0.5, created),
		chunk_row(second, "Budget review with finance", 1.0, 0.5, created),
	]);

	let response = h.service.search(semantic("planning", 5)).await.expect("Search failed.");
	let texts = response.items.iter().map(|item| item.text.as_str()).collect::<Vec<_>>();

	assert_eq!(texts.len(), 2);
	assert!(texts[0].starts_with("Budget review with finance"));
	assert!(texts[1].starts_with("Quarterly planning notes"));
	assert!(response.items[0].score > response.items[1].score);
}

#[tokio::test]
async fn unhydrated_candidates_fall_back_to_index_data() {
	let known = Uuid::new_v4();
	let missing = Uuid::new_v4();
	let created = OffsetDateTime::now_utc() - Duration::days(2);
	let mut malformed = chunk_hit(Uuid::nil(), "Loose index text", 0.3, vec![0.5, 0.5]);

	malformed.id = "point-17".to_string();

	let h = harness(vec![
		chunk_hit(known, "Known chunk", 0.9, vec![1.0, 0.0]),
		chunk_hit(missing, "Orphaned point", 0.6, vec![0.0, 1.0]),
		malformed,
	]);

	h.store.seed_chunks(vec![chunk_row(known, "Known chunk", 0.0, 0.5, created)]);

	let response = h.service.search(semantic("chunk", 5)).await.expect("Search failed.");

	assert_eq!(response.items.len(), 3);

	let orphan = response
		.items
		.iter()
		.find(|item| item.text == "Orphaned point")
		.expect("Expected the orphaned point.");

	assert!((orphan.score - 0.6).abs() < 1e-6);
	assert_eq!(orphan.source_ref, SourceRef::Index { point_id: missing.to_string() });
	assert!(
		response
			.items
			.iter()
			.any(|item| item.source_ref == SourceRef::Index { point_id: "point-17".to_string() })
	);
	assert_eq!(h.store.chunk_reads.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn store_failure_degrades_to_index_results() {
	let key = Uuid::new_v4();
	let h = harness(vec![chunk_hit(key, "Index only", 0.7, vec![1.0, 0.0])]);

	h.store.fail_reads.store(true, std::sync::atomic::Ordering::SeqCst);

	let response = h.service.search(semantic("index", 5)).await.expect("Search failed.");

	assert_eq!(response.items.len(), 1);
	assert_eq!(response.items[0].text, "Index only");
	assert_eq!(response.items[0].source_ref, SourceRef::Index { point_id: key.to_string() });
}

#[tokio::test]
async fn repeated_searches_return_identical_results() {
	let created = OffsetDateTime::now_utc() - Duration::days(4);
	let keys = (0..12).map(|_| Uuid::new_v4()).collect::<Vec<_>>();
	let hits = keys
		.iter()
		.enumerate()
		.map(|(i, key)| {
			let angle = i as f32 * 0.4;
			let relevance = 0.9 - i as f32 * 0.05;

			chunk_hit(*key, &format!("note {i}"), relevance, vec![angle.cos(), angle.sin()])
		})
		.collect();
	let h = harness(hits);

	h.store.seed_chunks(
		keys.iter()
			.enumerate()
			.map(|(i, key)| chunk_row(*key, &format!("note {i}"), 0.0, 0.5, created))
			.collect(),
	);

	let first = h.service.search(semantic("notes", 5)).await.expect("Search failed.");
	let second = h.service.search(semantic("notes", 5)).await.expect("Search failed.");

	assert_eq!(first.items.len(), 5);
	assert_eq!(first.items, second.items);
}
