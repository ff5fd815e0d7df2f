//! Packs search results into a single prompt-sized block of text.

use serde::{Deserialize, Serialize};

use crate::{RecallService, Result, SearchRequest};
use recall_domain::view::View;

pub const SNIPPET_SEPARATOR: &str = "\n\n---\n\n";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContextRequest {
	pub owner_id: String,
	pub query: String,
	#[serde(default)]
	pub limit_tokens: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextResponse {
	pub text: String,
	pub snippets: Vec<String>,
	/// Estimated from the character count.
	pub token_count: u32,
}

impl RecallService {
	pub async fn build_context(&self, req: ContextRequest) -> Result<ContextResponse> {
		let limit_tokens = req.limit_tokens.unwrap_or(self.cfg.context.default_limit_tokens);
		let chars_per_token = self.cfg.context.chars_per_token;
		let response = self
			.search(SearchRequest {
				owner_id: req.owner_id,
				query: req.query,
				top_k: None,
				view: Some(View::Auto),
			})
			.await?;
		let texts = response.items.into_iter().map(|item| item.text).collect::<Vec<_>>();
		let packed = pack_snippets(texts, limit_tokens, chars_per_token);

		tracing::debug!(
			snippets = packed.snippets.len(),
			token_count = packed.token_count,
			limit_tokens,
			"Context packed."
		);

		Ok(packed)
	}
}

/// Takes snippets in order until the next one would exceed `limit_tokens * chars_per_token`
/// characters.
pub fn pack_snippets(
	texts: Vec<String>,
	limit_tokens: u32,
	chars_per_token: u32,
) -> ContextResponse {
	let budget = u64::from(limit_tokens) * u64::from(chars_per_token);
	let mut used = 0_u64;
	let mut snippets = Vec::new();

	for text in texts {
		let chars = text.chars().count() as u64;

		if used + chars > budget {
			break;
		}

		used += chars;

		snippets.push(text);
	}

	let token_count = (used / u64::from(chars_per_token.max(1))) as u32;

	ContextResponse { text: snippets.join(SNIPPET_SEPARATOR), snippets, token_count }
}
