use std::sync::Arc;

use anyhow::Result;

mod clock;
mod collector;
mod config;
mod context;
mod error;
mod ftp;
mod housekeeping;
mod logger;
mod sink;
mod supervisor;

use config::AppConfig;
use context::AppContext;

// TODO: сохранять последнюю принятую строку на диск, если дубли после рестарта станут проблемой

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load(AppConfig::config_path())?;
    let _log = logger::init(&config.settings.logging)?;
    config.debug_config();

    let ctx = Arc::new(AppContext::from_config(config)?);

    // Опросчики не завершаются сами, выходим только по сигналу
    tokio::select! {
        result = supervisor::run(ctx) => result?,
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::info!("Получен сигнал остановки, выходим");
        }
    }

    Ok(())
}
