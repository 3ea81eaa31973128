use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::settings::LoggingSettings;

const LOG_FILE_PREFIX: &str = "store-counter-monitor.log";

/// Держит фоновый поток файлового лога; должен жить до конца main
pub struct LogHandle {
    _file_guard: Option<WorkerGuard>,
}

// Запуск логгера, делается в начале main
pub fn init(settings: &LoggingSettings) -> Result<LogHandle> {
    let console_filter = env_filter(&settings.level)?;
    let console_layer = fmt::Layer::new()
        .with_writer(std::io::stdout)
        .with_target(false)
        .with_filter(console_filter);

    let (file_layer, file_guard) = match &settings.directory {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .context(format!("Не удалось создать директорию логов {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::Layer::new()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false)
                .with_thread_names(true)
                .with_filter(env_filter(&settings.level)?);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Логгер уже инициализирован")?;

    Ok(LogHandle {
        _file_guard: file_guard,
    })
}

/// RUST_LOG важнее уровня из конфигурации
fn env_filter(level: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level).context(format!("Невалидный уровень логов: {}", level)),
    }
}
