//! Off-path writes produced while serving reads.
//!
//! Jobs run in submission order on one detached task. The queue is bounded: when it is full, or a
//! job fails, the job is logged and dropped. The next search that meets the same duplicates queues
//! it again.

use std::sync::Arc;

use tokio::sync::{
	mpsc::{self, error::TrySendError},
	oneshot,
};
use uuid::Uuid;

use crate::{Error, StructuredStore};

pub const MAINTENANCE_QUEUE_CAPACITY: usize = 1_024;

enum MaintenanceJob {
	Supersede { owner_id: String, fact_ids: Vec<Uuid> },
	Flush(oneshot::Sender<()>),
}

pub struct MaintenanceQueue {
	tx: mpsc::Sender<MaintenanceJob>,
}
impl MaintenanceQueue {
	pub fn spawn(store: Arc<dyn StructuredStore>) -> Self {
		Self::with_capacity(store, MAINTENANCE_QUEUE_CAPACITY)
	}

	pub fn with_capacity(store: Arc<dyn StructuredStore>, capacity: usize) -> Self {
		let (tx, rx) = mpsc::channel(capacity.max(1));

		tokio::spawn(run_maintenance(store, rx));

		Self { tx }
	}

	pub(crate) fn supersede(&self, owner_id: &str, fact_ids: Vec<Uuid>) {
		if fact_ids.is_empty() {
			return;
		}

		let count = fact_ids.len();
		let job = MaintenanceJob::Supersede { owner_id: owner_id.to_string(), fact_ids };
		let message = match self.tx.try_send(job) {
			Ok(()) => return,
			Err(TrySendError::Full(_)) => "Maintenance queue is full.",
			Err(TrySendError::Closed(_)) => "Maintenance task is not running.",
		};
		let err = Error::MaintenanceWriteFailed { message: message.to_string() };

		tracing::warn!(error = %err, owner_id, count, "Dropped supersession job.");
	}

	pub(crate) async fn flush(&self) {
		let (done_tx, done_rx) = oneshot::channel();

		if self.tx.send(MaintenanceJob::Flush(done_tx)).await.is_err() {
			return;
		}

		let _ = done_rx.await;
	}
}

async fn run_maintenance(
	store: Arc<dyn StructuredStore>,
	mut rx: mpsc::Receiver<MaintenanceJob>,
) {
	while let Some(job) = rx.recv().await {
		match job {
			MaintenanceJob::Supersede { owner_id, fact_ids } =>
				match store.mark_superseded(&owner_id, &fact_ids).await {
					Ok(updated) => tracing::info!(
						owner_id = %owner_id,
						requested = fact_ids.len(),
						updated,
						"Superseded duplicate facts."
					),
					Err(err) => {
						let err = Error::MaintenanceWriteFailed { message: err.to_string() };

						tracing::warn!(
							error = %err,
							owner_id = %owner_id,
							count = fact_ids.len(),
							"Supersession write failed."
						);
					},
				},
			MaintenanceJob::Flush(done) => {
				let _ = done.send(());
			},
		}
	}

	tracing::debug!("Maintenance task stopped.");
}
