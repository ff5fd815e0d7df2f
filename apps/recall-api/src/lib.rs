pub mod routes;
pub mod state;

use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;
use color_eyre::eyre;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(
	version = recall_cli::VERSION,
	rename_all = "kebab",
	styles = recall_cli::styles(),
)]
pub struct Args {
	/// Path to the TOML configuration file.
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = recall_config::load(&args.config)?;

	init_tracing(&config);

	let http_addr: SocketAddr = config.service.http_bind.parse()?;
	let admin_addr: SocketAddr = config.service.admin_bind.parse()?;

	ensure_loopback_admin(admin_addr)?;

	let state = AppState::new(config).await?;
	let app = routes::router(state.clone());
	let admin_app = routes::admin_router(state);
	let http_listener = TcpListener::bind(http_addr).await?;

	tracing::info!(%http_addr, "HTTP server listening.");

	let admin_listener = TcpListener::bind(admin_addr).await?;

	tracing::info!(%admin_addr, "Admin server listening.");

	tokio::try_join!(axum::serve(http_listener, app), axum::serve(admin_listener, admin_app))?;

	Ok(())
}

/// The admin router rebuilds indexes, so it only listens on loopback addresses.
pub fn ensure_loopback_admin(admin_addr: SocketAddr) -> color_eyre::Result<()> {
	if !admin_addr.ip().is_loopback() {
		return Err(eyre::eyre!("service.admin_bind must be a loopback address."));
	}

	Ok(())
}

fn init_tracing(config: &recall_config::Config) {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();
}
