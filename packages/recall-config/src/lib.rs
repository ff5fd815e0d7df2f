mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, Context, EmbeddingProviderConfig, Postgres, Providers, Qdrant, Search, Service,
	Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;
	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	for (label, value) in [
		("service.http_bind", &cfg.service.http_bind),
		("service.admin_bind", &cfg.service.admin_bind),
		("storage.postgres.dsn", &cfg.storage.postgres.dsn),
		("storage.qdrant.url", &cfg.storage.qdrant.url),
		("storage.qdrant.collection", &cfg.storage.qdrant.collection),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}
	if cfg.providers.embedding.api_key.trim().is_empty() {
		return Err(Error::Validation {
			message: "Provider embedding api_key must be non-empty.".to_string(),
		});
	}

	validate_search(&cfg.search)?;

	if cfg.context.chars_per_token == 0 {
		return Err(Error::Validation {
			message: "context.chars_per_token must be greater than zero.".to_string(),
		});
	}
	if cfg.context.default_limit_tokens == 0 {
		return Err(Error::Validation {
			message: "context.default_limit_tokens must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn validate_search(search: &Search) -> Result<()> {
	if search.max_top_k == 0 {
		return Err(Error::Validation {
			message: "search.max_top_k must be greater than zero.".to_string(),
		});
	}
	if search.default_top_k == 0 || search.default_top_k > search.max_top_k {
		return Err(Error::Validation {
			message: "search.default_top_k must be between 1 and search.max_top_k.".to_string(),
		});
	}

	for (label, value) in [
		("search.fanout_multiplier", search.fanout_multiplier),
		("search.state_fanout_multiplier", search.state_fanout_multiplier),
		("search.fact_scan_multiplier", search.fact_scan_multiplier),
	] {
		if value == 0 {
			return Err(Error::Validation {
				message: format!("{label} must be greater than zero."),
			});
		}
	}

	if search.state_top_k == 0 {
		return Err(Error::Validation {
			message: "search.state_top_k must be greater than zero.".to_string(),
		});
	}
	if search.index_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "search.index_timeout_ms must be greater than zero.".to_string(),
		});
	}
	if !search.mmr_lambda.is_finite() {
		return Err(Error::Validation {
			message: "search.mmr_lambda must be a finite number.".to_string(),
		});
	}
	if !(0.0..=1.0).contains(&search.mmr_lambda) {
		return Err(Error::Validation {
			message: "search.mmr_lambda must be in the range 0.0-1.0.".to_string(),
		});
	}
	if !search.fact_dedup_threshold.is_finite() {
		return Err(Error::Validation {
			message: "search.fact_dedup_threshold must be a finite number.".to_string(),
		});
	}
	if search.fact_dedup_threshold <= 0.0 || search.fact_dedup_threshold > 1.0 {
		return Err(Error::Validation {
			message: "search.fact_dedup_threshold must be greater than 0.0 and at most 1.0."
				.to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.service.log_level.trim().is_empty() {
		cfg.service.log_level = "info".to_string();
	}
	if cfg.providers.embedding.api_base.ends_with('/') && cfg.providers.embedding.path.starts_with('/')
	{
		cfg.providers.embedding.api_base.pop();
	}
}
