use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use generate_sso_profiles::app::Args;

mod defaults {
    pub const LOG_FILTER: &str = "info";
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(defaults::LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match args.run().await {
        Ok(_) => Ok(()),
        Err(e) => {
            error!("error:{:?}", e);
            Err(e)
        }
    }
}
