//! Main entry point for the order desk service.
//!
//! Loads configuration, builds the order desk on the configured storage
//! backend and serves the HTTP API.

use clap::Parser;
use orderdesk_config::Config;
use orderdesk_core::{OrderDesk, OrderDeskBuilder, OrderDeskFactories};
use std::path::PathBuf;
use std::sync::Arc;

mod apis;
mod server;

use orderdesk_storage::implementations::file::create_storage as create_file_storage;
use orderdesk_storage::implementations::memory::create_storage as create_memory_storage;

/// Command-line arguments for the order desk service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started order desk");

	let config_path = args
		.config
		.to_str()
		.ok_or("Configuration path is not valid UTF-8")?;
	let config = Config::from_file(config_path).await?;
	tracing::info!("Loaded configuration [{}]", config.service.id);

	let desk = Arc::new(build_desk(config.clone()).await?);

	match config.api.filter(|api| api.enabled) {
		Some(api_config) => {
			tokio::select! {
				result = server::start_server(api_config, desk) => {
					tracing::info!("API server finished");
					result?;
				}
				_ = tokio::signal::ctrl_c() => {
					tracing::info!("Shutdown requested");
				}
			}
		},
		None => tracing::warn!("API server disabled in configuration, nothing to serve"),
	}

	tracing::info!("Stopped order desk");
	Ok(())
}

/// Macro to create a factory HashMap with the appropriate type aliases
macro_rules! create_factory_map {
    ($interface:path, $error:path, $( $name:literal => $factory:expr ),* $(,)?) => {{
        let mut factories = std::collections::HashMap::new();
        $(
            factories.insert(
                $name.to_string(),
                $factory as fn(&toml::Value) -> Result<Box<dyn $interface>, $error>
            );
        )*
        factories
    }};
}

/// Builds the order desk with the available storage backends.
async fn build_desk(config: Config) -> Result<OrderDesk, Box<dyn std::error::Error>> {
	let builder = OrderDeskBuilder::new(config);

	let storage_factories = create_factory_map!(
		orderdesk_storage::StorageInterface,
		orderdesk_storage::StorageError,
		"file" => create_file_storage,
		"memory" => create_memory_storage,
	);

	Ok(builder.build(OrderDeskFactories { storage_factories }).await?)
}
