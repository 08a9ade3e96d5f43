//! Telegram intake bot for the Porechye orgkom questionnaire

mod config;
mod export;
mod telegram;

use std::sync::Arc;

use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use orgbot_core::IntakeFlow;
use orgbot_storage::{RecordSink, SinkWriter, SqliteSink};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    // No sink, no bot: a broken record store is fatal at startup.
    let sink: Arc<dyn RecordSink> = Arc::new(SqliteSink::new(&config.database_url).await?);
    let (handle, _writer) = SinkWriter::spawn(sink.clone());

    let flow = Arc::new(IntakeFlow::new(config.invite_link.as_str()));
    let bot = Bot::new(&config.token);
    let config = Arc::new(config);

    info!("starting orgkom intake bot");

    Dispatcher::builder(bot, telegram::schema())
        .dependencies(dptree::deps![flow, sink, handle, config])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
