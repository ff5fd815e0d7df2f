use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub context: Context,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub admin_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub qdrant: Qdrant,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
	pub vector_dim: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Search {
	/// Result count used when a request does not name one.
	pub default_top_k: u32,
	/// Upper bound applied to requested result counts.
	pub max_top_k: u32,
	/// Vector index over-fetch factor for the semantic and auto views.
	pub fanout_multiplier: u32,
	/// Vector index over-fetch factor for a standalone state view.
	pub state_fanout_multiplier: u32,
	/// Fact count contributed to an auto search.
	pub state_top_k: u32,
	pub index_timeout_ms: u64,
	/// Relevance weight in the MMR objective; `1 - mmr_lambda` weighs redundancy.
	pub mmr_lambda: f32,
	/// Facts sharing `valid_from` are duplicates above this sequence similarity.
	pub fact_dedup_threshold: f32,
	/// Ranked facts examined per requested fact.
	pub fact_scan_multiplier: u32,
}
impl Default for Search {
	fn default() -> Self {
		Self {
			default_top_k: 5,
			max_top_k: 50,
			fanout_multiplier: 10,
			state_fanout_multiplier: 4,
			state_top_k: 3,
			index_timeout_ms: 5_000,
			mmr_lambda: 0.7,
			fact_dedup_threshold: 0.9,
			fact_scan_multiplier: 2,
		}
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Context {
	pub default_limit_tokens: u32,
	pub chars_per_token: u32,
}
impl Default for Context {
	fn default() -> Self {
		Self { default_limit_tokens: 2_000, chars_per_token: 4 }
	}
}

fn default_log_level() -> String {
	"info".to_string()
}
