//! Serve command - run the review server in the foreground

use clap::Args;
use fleet_core::Config;
use fleet_server::ReviewServer;

/// Run the review server until Ctrl-C
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Interface to bind (overrides config)
    #[arg(long)]
    host: Option<String>,
}

impl ServeArgs {
    /// Execute the serve command
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let mut config = config.clone();
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }

        let server = ReviewServer::new(config).start().await?;
        println!("Review server listening on {}", server.url());

        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutting down");
        server.stop().await?;

        Ok(())
    }
}
