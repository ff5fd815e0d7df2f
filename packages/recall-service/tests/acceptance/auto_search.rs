use std::time::Instant;

use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use super::{
	IndexMode, OTHER_OWNER, chunk_hit, chunk_row, fact_hit, fact_row, harness, harness_with,
	memory_row, test_config, with_owner,
};
use recall_domain::view::View;
use recall_service::{Error, SearchRequest, SourceRef};

fn request(query: &str, top_k: Option<u32>, view: Option<View>) -> SearchRequest {
	SearchRequest { owner_id: super::OWNER.to_string(), query: query.to_string(), top_k, view }
}

#[tokio::test]
async fn auto_issues_one_index_call_and_puts_facts_first() {
	let now = OffsetDateTime::now_utc();
	let facts = ["Paris", "Berlin", "Rome", "Madrid", "Lisbon"]
		.iter()
		.map(|city| fact_row("Dana", "visited", city, 0.8, now - Duration::days(7)))
		.collect::<Vec<_>>();
	let key = Uuid::new_v4();
	let mut hits = vec![chunk_hit(key, "Travel diary", 0.95, vec![1.0, 0.0])];

	hits.extend(facts.iter().map(|fact| fact_hit(fact, 0.7)));

	let h = harness(hits);

	h.store.seed_facts(facts);
	h.store.seed_chunks(vec![chunk_row(key, "Travel diary", 0.0, 0.5, now - Duration::days(1))]);

	let response = h.service.search(request("trips", Some(4), None)).await.expect("Search failed.");

	assert_eq!(response.view, View::Auto);
	assert_eq!(response.items.len(), 4);
	assert!(
		response.items[..3]
			.iter()
			.all(|item| matches!(item.source_ref, SourceRef::Fact { .. }))
	);
	assert!(matches!(response.items[3].source_ref, SourceRef::DocumentChunk { .. }));

	let calls = h.index.calls();

	assert_eq!(calls.len(), 1);
	assert_eq!(calls[0].top_k, 40);
	assert_eq!(calls[0].kind, None);
	assert!(calls[0].include_vectors);
}

#[tokio::test]
async fn untagged_points_are_ranked_as_chunks() {
	let key = Uuid::new_v4();
	let mut hit = chunk_hit(key, "Legacy point", 0.6, vec![1.0, 0.0]);

	hit.metadata.remove("type");

	let h = harness(vec![hit]);
	let response = h.service.search(request("legacy", None, None)).await.expect("Search failed.");

	assert_eq!(response.items.len(), 1);
	assert_eq!(response.items[0].source_ref, SourceRef::Index { point_id: key.to_string() });
}

#[tokio::test]
async fn other_owners_are_invisible() {
	let key = Uuid::new_v4();
	let h = harness(vec![with_owner(chunk_hit(key, "Private", 0.9, vec![1.0, 0.0]), OTHER_OWNER)]);
	let response = h.service.search(request("private", None, None)).await.expect("Search failed.");

	assert!(response.items.is_empty());
	assert_eq!(h.index.calls()[0].owner_id, super::OWNER);
}

#[tokio::test]
async fn no_candidates_yield_no_items() {
	let h = harness(Vec::new());

	for view in View::ALL {
		let response =
			h.service.search(request("empty", Some(5), Some(view))).await.expect("Search failed.");

		assert!(response.items.is_empty());
	}
}

#[tokio::test]
async fn index_failure_degrades_to_empty_results() {
	let h = harness(vec![chunk_hit(Uuid::new_v4(), "Unreachable", 0.9, vec![1.0, 0.0])]);

	h.index.set_mode(IndexMode::Failing);

	let response = h.service.search(request("anything", None, None)).await.expect("Search failed.");

	assert!(response.items.is_empty());
}

#[tokio::test]
async fn index_timeout_degrades_to_empty_results() {
	let mut cfg = test_config();

	cfg.search.index_timeout_ms = 50;

	let h = harness_with(cfg, vec![chunk_hit(Uuid::new_v4(), "Slow", 0.9, vec![1.0, 0.0])]);

	h.index.set_mode(IndexMode::Hanging);

	let started = Instant::now();
	let response = h.service.search(request("anything", None, None)).await.expect("Search failed.");

	assert!(response.items.is_empty());
	assert!(started.elapsed() < std::time::Duration::from_secs(10));
}

#[tokio::test]
async fn blank_owner_or_query_is_rejected() {
	let h = harness(Vec::new());
	let blank_owner = SearchRequest {
		owner_id: "   ".to_string(),
		query: "hello".to_string(),
		top_k: None,
		view: None,
	};
	let blank_query = request(" \n", None, None);

	assert!(matches!(h.service.search(blank_owner).await, Err(Error::InvalidRequest { .. })));
	assert!(matches!(h.service.search(blank_query).await, Err(Error::InvalidRequest { .. })));
	assert!(h.index.calls().is_empty());
}

#[tokio::test]
async fn top_k_is_capped_and_zero_skips_the_index() {
	let h = harness(Vec::new());

	h.service.search(request("cap", Some(0), None)).await.expect("Search failed.");

	assert!(h.index.calls().is_empty());

	h.service.search(request("cap", Some(500), None)).await.expect("Search failed.");

	assert_eq!(h.index.calls()[0].top_k, 500);
}

#[tokio::test]
async fn episodic_view_matches_memories_newest_first() {
	let now = OffsetDateTime::now_utc();
	let h = harness(Vec::new());

	h.store.seed_memories(vec![
		memory_row("Lunch with the DESIGN team", now - Duration::days(3)),
		memory_row("Design review moved to Friday", now - Duration::days(1)),
		memory_row("Gym session", now),
		memory_row("Old design sketches", now - Duration::days(30)),
	]);

	let response = h
		.service
		.search(request("design", Some(2), Some(View::Episodic)))
		.await
		.expect("Search failed.");
	let texts = response.items.iter().map(|item| item.text.as_str()).collect::<Vec<_>>();

	assert_eq!(texts, vec!["Design review moved to Friday", "Lunch with the DESIGN team"]);
	assert!(response.items.iter().all(|item| item.score == 1.0));
	assert!(h.index.calls().is_empty());
}
