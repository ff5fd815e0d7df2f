use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to read recall config at {path:?}.")]
	ReadConfig { path: PathBuf, source: std::io::Error },
	#[error("Failed to parse recall config at {path:?}: {source}")]
	ParseConfig { path: PathBuf, source: toml::de::Error },
	#[error("{message}")]
	Validation { message: String },
}
