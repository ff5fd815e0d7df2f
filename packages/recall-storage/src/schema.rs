pub fn render_schema() -> String {
	expand_includes(include_str!("../../../sql/init.sql"))
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let include = line.trim().strip_prefix("\\ir ").map(str::trim);

		match include {
			Some("tables/001_documents.sql") =>
				out.push_str(include_str!("../../../sql/tables/001_documents.sql")),
			Some("tables/002_memories.sql") =>
				out.push_str(include_str!("../../../sql/tables/002_memories.sql")),
			Some("tables/003_chunks.sql") =>
				out.push_str(include_str!("../../../sql/tables/003_chunks.sql")),
			Some("tables/004_facts.sql") =>
				out.push_str(include_str!("../../../sql/tables/004_facts.sql")),
			Some("tables/005_feedback_events.sql") =>
				out.push_str(include_str!("../../../sql/tables/005_feedback_events.sql")),
			_ => out.push_str(line),
		}

		out.push('\n');
	}

	out
}
