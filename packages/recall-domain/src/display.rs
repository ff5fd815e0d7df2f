use time::{OffsetDateTime, UtcOffset};

/// Calendar date of `at` in UTC, as `YYYY-MM-DD`.
pub fn display_date(at: OffsetDateTime) -> String {
	let date = at.to_offset(UtcOffset::UTC).date();

	format!("{:04}-{:02}-{:02}", date.year(), u8::from(date.month()), date.day())
}

pub fn fact_text(subject: &str, predicate: &str, object: &str) -> String {
	format!("{subject} {predicate} {object}")
}

/// Fact line shown to callers, with the date the fact became valid.
pub fn fact_display_text(
	subject: &str,
	predicate: &str,
	object: &str,
	valid_from: OffsetDateTime,
) -> String {
	format!(
		"{} (This event took place on {})",
		fact_text(subject, predicate, object),
		display_date(valid_from)
	)
}

/// Appends the session date line to a chunk's text.
pub fn session_display_text(text: &str, created_at: OffsetDateTime) -> String {
	format!("{text}\n(This session took place on {})", display_date(created_at))
}
