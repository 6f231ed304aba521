use std::sync::Arc;

use clap::Parser;
use mc_proxy::config::{Cli, ProxyConfig, StaticProfileStore};
use mc_proxy::listener::DownstreamListener;
use mc_proxy::observer::BroadcastObserver;
use mc_proxy::profile::ProfileStore;
use mc_proxy::session::SessionManager;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = ProxyConfig::load(&cli.config)?.apply_cli(&cli);

    let http = reqwest::Client::new();
    let profiles: Arc<dyn ProfileStore> = Arc::new(StaticProfileStore::from_config(&config));
    let observer = Arc::new(BroadcastObserver::new());
    let manager = SessionManager::new(config.upstream_addr.clone(), http.clone(), config.dump_dir.clone(), observer, profiles);

    let listener = Arc::new(DownstreamListener::new(
        config.listen_addr.clone(),
        config.status_motd.clone(),
        config.compression_threshold,
        manager,
        http,
    )?);

    listener.run().await
}
