//! greetme binary entry point.

use std::path::PathBuf;

use cli_harness::config::{Config, ENV_CONFIG_PATH};
use cli_harness::{cli, execute_root, logging};
use tracing::debug;

#[tokio::main]
async fn main() {
    let path = std::env::var_os(ENV_CONFIG_PATH).map(PathBuf::from);
    let config = match Config::load(path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    // Logging may already be set up by an embedding host.
    let _ = logging::try_init_with(config.log_filter());
    debug!("greetme v{}", env!("CARGO_PKG_VERSION"));

    execute_root(cli::root_command()).await;
}
