use std::time::Duration;

use tokio::time;

use crate::{Candidate, Error, FACT_TYPE, IndexFilter, RecallService};

/// Index candidates split by their `type` tag, each bucket in index order.
#[derive(Debug, Default)]
pub struct Buckets {
	pub facts: Vec<Candidate>,
	pub chunks: Vec<Candidate>,
}

/// Facts go to their own bucket; every other tag, or none, counts as a chunk.
pub fn partition(candidates: Vec<Candidate>) -> Buckets {
	let mut buckets = Buckets::default();

	for candidate in candidates {
		if candidate.kind() == Some(FACT_TYPE) {
			buckets.facts.push(candidate);
		} else {
			buckets.chunks.push(candidate);
		}
	}

	buckets
}

impl RecallService {
	/// One vector index round trip for both facts and chunks.
	pub(crate) async fn unified_fanout(&self, owner_id: &str, query: &str, top_k: u32) -> Buckets {
		let fetch_k = top_k.saturating_mul(self.cfg.search.fanout_multiplier);
		let candidates = self.query_index(owner_id, query, fetch_k, None).await;
		let buckets = partition(candidates);

		tracing::debug!(
			owner_id,
			facts = buckets.facts.len(),
			chunks = buckets.chunks.len(),
			"Partitioned fan-out candidates."
		);

		buckets
	}

	/// Queries the vector index with vectors, bounded by the configured timeout.
	///
	/// Failures and timeouts are logged and yield no candidates.
	pub(crate) async fn query_index(
		&self,
		owner_id: &str,
		query: &str,
		fetch_k: u32,
		kind: Option<&str>,
	) -> Vec<Candidate> {
		let filter = IndexFilter { owner_id, kind };
		let timeout = Duration::from_millis(self.cfg.search.index_timeout_ms);
		let err = match time::timeout(timeout, self.index.query(query, fetch_k, filter, true)).await
		{
			Ok(Ok(candidates)) => return candidates,
			Ok(Err(err)) => Error::UpstreamUnavailable { message: err.to_string() },
			Err(_) => Error::UpstreamUnavailable {
				message: format!("Query timed out after {} ms.", self.cfg.search.index_timeout_ms),
			},
		};

		tracing::warn!(error = %err, owner_id, fetch_k, "Vector index query failed.");

		Vec::new()
	}
}
