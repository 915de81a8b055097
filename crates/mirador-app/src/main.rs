mod bootstrap;
mod cli;

use std::path::Path;

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = cli::parse();

    // Config first: the logging section feeds the subscriber filter.
    let (config, config_error) = match &args.config {
        Some(path) => match mirador_config::load_from_path(Path::new(path)) {
            Ok(config) => (config, None),
            Err(e) => (mirador_config::MiradorConfig::default(), Some(e)),
        },
        None => match mirador_config::load_config() {
            Ok(config) => (config, None),
            Err(e) => (mirador_config::MiradorConfig::default(), Some(e)),
        },
    };

    let log_directive = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.filter.clone());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                log_directive
                    .parse()
                    .unwrap_or_else(|_| "mirador=info".parse().expect("valid default directive")),
            ),
        )
        .init();

    tracing::info!("mirador v{} starting...", env!("CARGO_PKG_VERSION"));
    if let Some(e) = config_error {
        tracing::warn!("config load failed, using defaults: {e}");
    }

    bootstrap::run(args, config).await;
}
