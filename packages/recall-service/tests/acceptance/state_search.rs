use std::sync::atomic::Ordering;

use time::{Duration, OffsetDateTime, macros::datetime};

use super::{fact_hit, fact_row, harness, raw_fact_hit};
use recall_domain::view::View;
use recall_service::{SearchRequest, SourceRef};

fn state(query: &str, top_k: u32) -> SearchRequest {
	SearchRequest {
		owner_id: super::OWNER.to_string(),
		query: query.to_string(),
		top_k: Some(top_k),
		view: Some(View::State),
	}
}

#[tokio::test]
async fn identical_facts_collapse_and_the_loser_is_superseded() {
	let valid_from = datetime!(2024-01-01 00:00 UTC);
	let keep = fact_row("Alice", "visited", "Paris", 0.9, valid_from);
	let drop = fact_row("Alice", "visited", "Paris", 0.8, valid_from);
	let h = harness(vec![fact_hit(&keep, 0.9), fact_hit(&drop, 0.88)]);

	h.store.seed_facts(vec![keep.clone(), drop.clone()]);

	let response = h.service.search(state("where did Alice go", 3)).await.expect("Search failed.");

	assert_eq!(response.items.len(), 1);
	assert_eq!(response.items[0].text, "Alice visited Paris (This event took place on 2024-01-01)");
	assert_eq!(
		response.items[0].source_ref,
		SourceRef::Fact { fact_id: keep.fact_id, source_chunk_id: None }
	);

	h.service.drain_maintenance().await;

	assert!(h.store.fact(drop.fact_id).expect("Fact vanished.").is_superseded);
	assert!(!h.store.fact(keep.fact_id).expect("Fact vanished.").is_superseded);

	let again = h.service.search(state("where did Alice go", 3)).await.expect("Search failed.");

	h.service.drain_maintenance().await;

	assert_eq!(again.items, response.items);
	assert_eq!(h.store.supersede_writes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn state_view_queries_facts_with_its_own_multiplier() {
	let h = harness(Vec::new());
	let response = h.service.search(state("anything", 3)).await.expect("Search failed.");

	assert!(response.items.is_empty());

	let calls = h.index.calls();

	assert_eq!(calls.len(), 1);
	assert_eq!(calls[0].top_k, 12);
	assert_eq!(calls[0].kind.as_deref(), Some("fact"));
}

#[tokio::test]
async fn malformed_and_retired_facts_are_skipped() {
	let now = OffsetDateTime::now_utc();
	let current = fact_row("Bob", "works at", "Acme", 0.7, now - Duration::days(5));
	let mut expired = fact_row("Bob", "works at", "Initech", 0.9, now - Duration::days(400));
	let mut superseded = fact_row("Bob", "lives in", "Oslo", 0.9, now - Duration::days(8));

	expired.valid_until = Some(now - Duration::days(10));
	superseded.is_superseded = true;

	let h = harness(vec![
		raw_fact_hit("not-a-fact-id"),
		fact_hit(&expired, 0.9),
		fact_hit(&superseded, 0.85),
		fact_hit(&current, 0.8),
	]);

	h.store.seed_facts(vec![current.clone(), expired, superseded]);

	let response = h.service.search(state("Bob", 5)).await.expect("Search failed.");

	assert_eq!(response.items.len(), 1);
	assert_eq!(
		response.items[0].metadata["fact_id"],
		serde_json::Value::String(current.fact_id.to_string())
	);
	// Rank 2 among parseable ids: 0.7 + (2.0 - 0.2) + 0.5.
	assert!((response.items[0].score - 3.0).abs() < 1e-5);
}

#[tokio::test]
async fn recent_and_confident_facts_rank_first() {
	let now = OffsetDateTime::now_utc();
	let stale = fact_row("Carol", "prefers", "tea", 0.9, now - Duration::days(500));
	let fresh = fact_row("Carol", "prefers", "coffee", 0.8, now - Duration::days(3));
	let h = harness(vec![fact_hit(&stale, 0.9), fact_hit(&fresh, 0.85)]);

	h.store.seed_facts(vec![stale.clone(), fresh.clone()]);

	let response = h.service.search(state("Carol", 5)).await.expect("Search failed.");
	let ids = response
		.items
		.iter()
		.map(|item| item.metadata["fact_id"].as_str().unwrap_or_default().to_string())
		.collect::<Vec<_>>();

	assert_eq!(ids, vec![fresh.fact_id.to_string(), stale.fact_id.to_string()]);
}
