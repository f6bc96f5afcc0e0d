use std::process;

use anyhow::{Result, anyhow};
use overcommit_webhook::{WebhookServer, cli, config::Config, tracing::setup_tracing};

fn main() {
    if let Err(e) = run() {
        eprintln!("{e:?}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("cannot install the rustls crypto provider"))?;

    let matches = cli::build_cli().get_matches();
    let config = Config::from_args(&matches)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        setup_tracing(&config.log_level, &config.log_fmt, config.log_no_color)?;

        let server = WebhookServer::new_from_config(config).await?;
        server.run().await
    })
}
