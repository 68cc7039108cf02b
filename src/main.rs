use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use neterra_proxy::server::{self, AppState};
use neterra_proxy::{ChannelRegistry, CliArgs, Config};

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "neterra_proxy=debug,tower_http=debug,hyper_util=warn,reqwest=warn"
    } else {
        "info,hyper_util=warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging(args.verbose);

    let config = match Config::load(args) {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    let registry = match ChannelRegistry::load(&config.channels_file) {
        Ok(registry) => registry,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    let state = match AppState::new(&config, registry) {
        Ok(state) => state,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    info!("----- Starting Neterra.tv Proxy ----");
    if let Err(e) = server::start_server(state).await {
        error!("server error: {e}");
        std::process::exit(1);
    }
}
