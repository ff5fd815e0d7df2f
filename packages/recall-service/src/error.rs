pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Qdrant error: {message}")]
	Qdrant { message: String },
	/// The vector index failed or timed out. Searches degrade to no candidates.
	#[error("Vector index unavailable: {message}")]
	UpstreamUnavailable { message: String },
	/// Hydration found no row, or failed. The affected items fall back to index data.
	#[error("Hydration incomplete: {message}")]
	PartialDataMissing { message: String },
	/// An index point or fact id that cannot be used. The candidate is skipped.
	#[error("Malformed candidate: {message}")]
	MalformedCandidate { message: String },
	#[error("Maintenance write failed: {message}")]
	MaintenanceWriteFailed { message: String },
}
impl From<recall_storage::Error> for Error {
	fn from(err: recall_storage::Error) -> Self {
		match err {
			recall_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			recall_storage::Error::InvalidRow(message) => Self::Storage { message },
			recall_storage::Error::NotFound(message) => Self::NotFound { message },
			recall_storage::Error::Qdrant(inner) => Self::Qdrant { message: inner.to_string() },
		}
	}
}
impl From<qdrant_client::QdrantError> for Error {
	fn from(err: qdrant_client::QdrantError) -> Self {
		Self::Qdrant { message: err.to_string() }
	}
}
impl From<color_eyre::Report> for Error {
	fn from(err: color_eyre::Report) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
