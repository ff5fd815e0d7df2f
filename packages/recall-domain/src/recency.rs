use time::OffsetDateTime;

/// Whole days elapsed from `earlier` to `now`. Negative when `earlier` lies in the future.
pub fn whole_days_between(earlier: OffsetDateTime, now: OffsetDateTime) -> i64 {
	(now - earlier).whole_days()
}

/// Multiplier applied to chunk scores: `1 + 0.1 / max(1, days)`.
pub fn chunk_recency_modifier(days: i64) -> f32 {
	1.0 + 0.1 / days.max(1) as f32
}

/// Additive bonus for facts by age bucket. Future dates count as zero days old.
pub fn fact_recency_bonus(days: i64) -> f32 {
	match days.max(0) {
		0..30 => 0.5,
		30..90 => 0.3,
		90..365 => 0.1,
		_ => 0.0,
	}
}
