mod check;
mod cli;
mod config;
mod mailer;
mod server;
mod session;
mod store;

use std::env;
use std::sync::Arc;

use anyhow::Result;
use log::{error, info};
use tokio::time;

use crate::check::Watcher;
use crate::config::Config;

fn setup_logging() {
    if env::var("LOG").is_err() {
        env::set_var("LOG", "staffbook_watch=info");
    }

    pretty_env_logger::init_custom_env("LOG");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::parse(env::args().skip(1).collect());

    setup_logging();

    let config = Config::from_env()?;
    let watcher = Arc::new(Watcher::new(config)?);

    if args.once {
        let report = watcher.run_check().await?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if let Some(every) = args.interval {
        info!("running a check every {}s", every.as_secs());
        let watcher = Arc::clone(&watcher);
        tokio::spawn(async move {
            let mut interval = time::interval(every);
            loop {
                interval.tick().await;
                if let Err(err) = watcher.run_check().await {
                    error!("scheduled check failed: {err:#}");
                }
            }
        });
    }

    server::serve(args.address, watcher).await
}
