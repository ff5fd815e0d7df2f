use std::sync::Arc;

use time::macros::datetime;

use super::{FakeIndex, fact_hit, fact_row, test_config};
use recall_domain::view::View;
use recall_service::{PgStore, RecallService, SearchRequest};
use recall_storage::{db::Db, queries};
use recall_testkit::TestDatabase;

#[tokio::test]
#[ignore = "Requires external Postgres. Set RECALL_PG_DSN to run."]
async fn duplicate_facts_are_superseded_in_postgres() {
	let Some(base_dsn) = recall_testkit::env_dsn() else {
		eprintln!("Skipping Postgres acceptance test; set RECALL_PG_DSN to run it.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let mut cfg = test_config();

	cfg.storage.postgres.dsn = test_db.dsn().to_string();

	let db = Db::connect(&cfg.storage.postgres).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");

	let valid_from = datetime!(2024-01-01 00:00 UTC);
	let keep = fact_row("Alice", "visited", "Paris", 0.9, valid_from);
	let drop = fact_row("Alice", "visited", "Paris", 0.8, valid_from);

	for fact in [&keep, &drop] {
		queries::insert_fact(&db.pool, fact).await.expect("Failed to insert fact.");
	}

	let index = Arc::new(FakeIndex::with_hits(vec![fact_hit(&keep, 0.9), fact_hit(&drop, 0.85)]));
	let store = Arc::new(PgStore::new(db));
	let pool = store.db().pool.clone();
	let service = RecallService::new(cfg, index, store);
	let request = SearchRequest {
		owner_id: super::OWNER.to_string(),
		query: "Alice".to_string(),
		top_k: Some(3),
		view: Some(View::State),
	};
	let response = service.search(request.clone()).await.expect("Search failed.");

	service.drain_maintenance().await;

	assert_eq!(response.items.len(), 1);

	let stored =
		queries::facts_for_owner(&pool, super::OWNER).await.expect("Failed to load facts.");
	let dropped = stored.iter().find(|fact| fact.fact_id == drop.fact_id).expect("Fact vanished.");

	assert!(dropped.is_superseded);

	let again = service.search(request).await.expect("Search failed.");

	assert_eq!(again.items, response.items);

	test_db.cleanup().await.expect("Failed to clean up test database.");
}
