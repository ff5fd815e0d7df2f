use std::sync::Arc;

use recall_service::RecallService;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<RecallService>,
}
impl AppState {
	/// Connects the engine to Postgres and Qdrant from `config`.
	pub async fn new(config: recall_config::Config) -> color_eyre::Result<Self> {
		let service = RecallService::connect(config).await?;

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: RecallService) -> Self {
		Self { service: Arc::new(service) }
	}
}
