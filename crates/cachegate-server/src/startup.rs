//! Server startup utilities.

use cachegate_cache::redact_identity;
use cachegate_config::AppConfig;
use tracing::info;

/// Prints the startup banner.
pub fn print_banner() {
    info!(r#"
                 __                        __
  _________ ____/ /_  ___  ____ _____ _/ /____
 / ___/ __ `/ ___/ __ \/ _ \/ __ `/ __ `/ __/ _ \
/ /__/ /_/ / /__/ / / /  __/ /_/ / /_/ / /_/  __/
\___/\__,_/\___/_/ /_/\___/\__, /\__,_/\__/\___/
                          /____/
    "#);
}

/// Prints server startup information.
pub fn print_startup_info(config: &AppConfig) {
    let separator = "=".repeat(60);
    let addr = config.server.addr();
    info!("{}", separator);
    info!("Cache API: http://{}/api/cache", addr);
    info!("Health:    http://{}/health", addr);
    info!("Store:     {}", redact_identity(&config.cache.connection_string));
    info!("{}", separator);
}
