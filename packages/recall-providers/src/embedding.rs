use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

use recall_config::EmbeddingProviderConfig;

/// Embeds `texts` through an OpenAI-compatible endpoint, returning vectors in input order.
pub async fn embed(cfg: &EmbeddingProviderConfig, texts: &[String]) -> Result<Vec<Vec<f32>>> {
	if texts.is_empty() {
		return Ok(Vec::new());
	}

	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"input": texts,
		"dimensions": cfg.dimensions,
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;
	let vectors = parse_embedding_response(json)?;

	if vectors.len() != texts.len() {
		return Err(eyre::eyre!(
			"Embedding provider {} returned {} vectors for {} inputs.",
			cfg.provider_id,
			vectors.len(),
			texts.len()
		));
	}
	if let Some(bad) = vectors.iter().find(|vec| vec.len() != cfg.dimensions as usize) {
		return Err(eyre::eyre!(
			"Embedding provider {} returned a {}-dimensional vector; expected {}.",
			cfg.provider_id,
			bad.len(),
			cfg.dimensions
		));
	}

	tracing::debug!(provider_id = %cfg.provider_id, count = vectors.len(), "Embedded texts.");

	Ok(vectors)
}

fn parse_embedding_response(json: Value) -> Result<Vec<Vec<f32>>> {
	let data = json
		.get("data")
		.and_then(Value::as_array)
		.ok_or_else(|| eyre::eyre!("Embedding response is missing the data array."))?;
	let mut indexed = Vec::with_capacity(data.len());

	for (position, item) in data.iter().enumerate() {
		let index =
			item.get("index").and_then(Value::as_u64).map(|v| v as usize).unwrap_or(position);
		let values = item
			.get("embedding")
			.and_then(Value::as_array)
			.ok_or_else(|| eyre::eyre!("Embedding item {position} is missing its vector."))?;
		let vec = values
			.iter()
			.map(|value| {
				value
					.as_f64()
					.map(|number| number as f32)
					.ok_or_else(|| eyre::eyre!("Embedding values must be numeric."))
			})
			.collect::<Result<Vec<_>>>()?;

		indexed.push((index, vec));
	}

	indexed.sort_by_key(|(index, _)| *index);

	Ok(indexed.into_iter().map(|(_, vec)| vec).collect())
}
