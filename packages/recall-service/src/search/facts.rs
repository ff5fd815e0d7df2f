use std::collections::{HashMap, HashSet};

use serde_json::{Map, Number, Value};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use uuid::Uuid;

use crate::{
	Candidate, Error, FACT_TYPE, RecallService, TYPE_KEY,
	search::{SearchItem, SourceRef},
};
use recall_domain::{display, recency, sequence};
use recall_storage::models::Fact;

/// A current fact with its ranking score.
#[derive(Clone, Debug)]
pub struct ScoredFact {
	pub fact: Fact,
	pub score: f32,
}

/// Output of [`dedup`]: facts to return, and facts to mark superseded.
#[derive(Debug, Default)]
pub struct Dedup {
	pub kept: Vec<ScoredFact>,
	pub superseded: Vec<Uuid>,
}

impl RecallService {
	/// Ranks fact candidates, drops near-duplicates and queues their supersession.
	pub(crate) async fn rank_facts(
		&self,
		owner_id: &str,
		candidates: &[Candidate],
		top_k: u32,
		now: OffsetDateTime,
	) -> Vec<SearchItem> {
		if top_k == 0 {
			return Vec::new();
		}

		let ranked_ids = ranked_fact_ids(owner_id, candidates);

		if ranked_ids.is_empty() {
			return Vec::new();
		}

		let ids = ranked_ids.iter().map(|(id, _)| *id).collect::<Vec<_>>();
		let ranks = ranked_ids.into_iter().collect::<HashMap<_, _>>();
		let rows = match self.store.current_facts_by_ids(owner_id, &ids).await {
			Ok(rows) => rows,
			Err(err) => {
				let err = Error::PartialDataMissing { message: err.to_string() };

				tracing::warn!(error = %err, owner_id, count = ids.len(), "Fact hydration failed.");

				return Vec::new();
			},
		};
		let mut scored = Vec::with_capacity(rows.len());

		for fact in rows.into_iter().filter(Fact::is_current) {
			let Some(&rank) = ranks.get(&fact.fact_id) else {
				continue;
			};
			let score = fact_score(&fact, rank, now);

			scored.push(ScoredFact { fact, score });
		}

		sort_facts(&mut scored);

		let scan = (top_k as usize).saturating_mul(self.cfg.search.fact_scan_multiplier as usize);
		let Dedup { kept, superseded } =
			dedup(scored, top_k as usize, scan, self.cfg.search.fact_dedup_threshold);

		if !superseded.is_empty() {
			tracing::debug!(owner_id, count = superseded.len(), "Queueing duplicate facts.");
		}

		self.maintenance.supersede(owner_id, superseded);

		kept.into_iter().map(fact_item).collect()
	}
}

// Each parseable id with its 0-based rank among parseable ids, first occurrence only.
fn ranked_fact_ids(owner_id: &str, candidates: &[Candidate]) -> Vec<(Uuid, u32)> {
	let mut seen = HashSet::new();
	let mut ranked = Vec::with_capacity(candidates.len());

	for candidate in candidates {
		let Ok(id) = Uuid::parse_str(&candidate.id) else {
			let err = Error::MalformedCandidate {
				message: format!("Fact id {:?} is not a UUID.", candidate.id),
			};

			tracing::warn!(error = %err, owner_id, "Skipping fact candidate.");

			continue;
		};

		if seen.insert(id) {
			ranked.push((id, ranked.len() as u32));
		}
	}

	ranked
}

/// `confidence + (2.0 - 0.1 × rank) + recency bucket bonus`.
pub fn fact_score(fact: &Fact, rank: u32, now: OffsetDateTime) -> f32 {
	let days = recency::whole_days_between(fact.valid_from, now);

	fact.confidence + (2.0 - 0.1 * rank as f32) + recency::fact_recency_bonus(days)
}

/// Orders by score, then the newest `valid_from`, then the greater id.
pub fn sort_facts(facts: &mut [ScoredFact]) {
	facts.sort_by(|a, b| {
		b.score
			.total_cmp(&a.score)
			.then_with(|| b.fact.valid_from.cmp(&a.fact.valid_from))
			.then_with(|| b.fact.fact_id.cmp(&a.fact.fact_id))
	});
}

/// Scans the first `scan` ranked facts and keeps up to `top_k` of them.
///
/// A fact duplicates a kept one when both became valid at the same instant and their normalized
/// `subject predicate object` texts match above `threshold`. Duplicates met before the scan stops
/// are reported for supersession.
pub fn dedup(ranked: Vec<ScoredFact>, top_k: usize, scan: usize, threshold: f32) -> Dedup {
	let mut out = Dedup::default();
	let mut kept_texts: Vec<String> = Vec::new();

	for scored in ranked.into_iter().take(scan) {
		let text =
			display::fact_text(&scored.fact.subject, &scored.fact.predicate, &scored.fact.object);
		let duplicate = out.kept.iter().zip(&kept_texts).any(|(kept, kept_text)| {
			kept.fact.valid_from == scored.fact.valid_from
				&& sequence::normalized_ratio(&text, kept_text) > threshold
		});

		if duplicate {
			out.superseded.push(scored.fact.fact_id);

			continue;
		}
		if out.kept.len() >= top_k {
			break;
		}

		kept_texts.push(text);
		out.kept.push(scored);
	}

	out
}

fn fact_item(scored: ScoredFact) -> SearchItem {
	let ScoredFact { fact, score } = scored;
	let mut metadata = Map::new();

	metadata.insert(TYPE_KEY.to_string(), Value::String(FACT_TYPE.to_string()));
	metadata.insert("fact_id".to_string(), Value::String(fact.fact_id.to_string()));
	metadata.insert(
		"confidence".to_string(),
		Number::from_f64(f64::from(fact.confidence)).map_or(Value::Null, Value::Number),
	);
	metadata.insert(
		"valid_from".to_string(),
		Value::String(fact.valid_from.format(&Rfc3339).unwrap_or_default()),
	);
	metadata.insert("semantic_match".to_string(), Value::Bool(true));

	if let Some(location) = &fact.location {
		metadata.insert("location".to_string(), Value::String(location.clone()));
	}

	SearchItem {
		text: display::fact_display_text(
			&fact.subject,
			&fact.predicate,
			&fact.object,
			fact.valid_from,
		),
		score,
		metadata,
		source_ref: SourceRef::Fact { fact_id: fact.fact_id, source_chunk_id: fact.source_chunk_id },
	}
}
