use std::sync::Arc;

use anyhow::{Context, Result};

use crate::clock::{Clock, LocalClock};
use crate::config::AppConfig;
use crate::ftp::{FtpSource, SnapshotSource};
use crate::sink::{RecordSink, SqlSink};

/// Все, что нужно опросчикам и планировщику; собирается один раз в main
pub struct AppContext {
    pub config: AppConfig,
    pub source: Arc<dyn SnapshotSource>,
    pub sink: Arc<dyn RecordSink>,
    pub clock: Arc<dyn Clock>,
}

impl AppContext {
    /// Боевой контекст: FTP, SQL и локальное время
    pub fn from_config(config: AppConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.settings.scratch_dir).context(format!(
            "Не удалось создать временную директорию {}",
            config.settings.scratch_dir.display()
        ))?;

        let source = Arc::new(FtpSource::new(&config));
        let sink = Arc::new(SqlSink::new(&config.settings.database));

        Ok(Self {
            config,
            source,
            sink,
            clock: Arc::new(LocalClock),
        })
    }
}
