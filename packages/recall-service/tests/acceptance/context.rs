use uuid::Uuid;

use super::{chunk_hit, harness, harness_with, test_config};
use recall_service::{ContextRequest, Error};

fn request(limit_tokens: Option<u32>) -> ContextRequest {
	ContextRequest {
		owner_id: super::OWNER.to_string(),
		query: "roadmap".to_string(),
		limit_tokens,
	}
}

fn hits() -> Vec<recall_service::Candidate> {
	vec![
		chunk_hit(Uuid::new_v4(), &"a".repeat(40), 0.9, vec![1.0, 0.0]),
		chunk_hit(Uuid::new_v4(), &"b".repeat(40), 0.5, vec![0.0, 1.0]),
	]
}

#[tokio::test]
async fn context_stops_before_the_snippet_that_overflows() {
	let h = harness(hits());
	let response = h.service.build_context(request(Some(15))).await.expect("Context failed.");

	assert_eq!(response.snippets, vec!["a".repeat(40)]);
	assert_eq!(response.text, "a".repeat(40));
	assert_eq!(response.token_count, 10);
}

#[tokio::test]
async fn context_uses_the_configured_default_limit() {
	let mut cfg = test_config();

	cfg.context.default_limit_tokens = 100;

	let h = harness_with(cfg, hits());
	let response = h.service.build_context(request(None)).await.expect("Context failed.");

	assert_eq!(response.snippets.len(), 2);
	assert_eq!(response.text, format!("{}\n\n---\n\n{}", "a".repeat(40), "b".repeat(40)));
	assert_eq!(response.token_count, 20);
}

#[tokio::test]
async fn context_rejects_blank_queries() {
	let h = harness(Vec::new());
	let mut req = request(None);

	req.query = String::new();

	assert!(matches!(h.service.build_context(req).await, Err(Error::InvalidRequest { .. })));
}
