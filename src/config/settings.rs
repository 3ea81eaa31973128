use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Базовые настройки приложения
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Директория для временных файлов устройств
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,
    /// Имя файла со счетчиками на устройстве
    #[serde(default = "default_remote_file")]
    pub remote_file: String,
    /// Пауза между циклами опроса (секунды)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Настройки FTP
    #[serde(default)]
    pub transfer: TransferSettings,
    /// Настройки базы данных
    pub database: DatabaseSettings,
    /// Настройки ежедневной очистки
    #[serde(default)]
    pub housekeeping: HousekeepingSettings,
    /// Настройки логирования
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferSettings {
    /// FTP порт по умолчанию
    #[serde(default = "default_ftp_port")]
    pub port: u16,
    /// Таймаут подключения и чтения (секунды)
    #[serde(default = "default_transfer_timeout")]
    pub timeout_secs: u64,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Строка подключения sqlx: mysql://, postgres://, sqlite://
    pub url: String,
    /// Целевая таблица
    #[serde(default = "default_table")]
    pub table: String,
}

// В url лежит пароль, поэтому Debug без него
impl std::fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("url", &"***")
            .field("table", &self.table)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HousekeepingSettings {
    /// Время ежедневной очистки, "HH:MM"
    #[serde(default = "default_cleanup_at")]
    pub at: String,
    /// Как часто проверять, не пора ли чистить (секунды)
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Уровень по умолчанию, если RUST_LOG не задан
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Директория для файлового лога; без нее пишем только в консоль
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

fn default_scratch_dir() -> PathBuf {
    PathBuf::from("./temp")
}

fn default_remote_file() -> String {
    "test.txt".to_string()
}

fn default_poll_interval() -> u64 {
    1800
}

fn default_ftp_port() -> u16 {
    21
}

fn default_transfer_timeout() -> u64 {
    30
}

fn default_table() -> String {
    "PeopleCounter".to_string()
}

fn default_cleanup_at() -> String {
    "00:00".to_string()
}

fn default_check_interval() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            port: default_ftp_port(),
            timeout_secs: default_transfer_timeout(),
        }
    }
}

impl Default for HousekeepingSettings {
    fn default() -> Self {
        Self {
            at: default_cleanup_at(),
            check_interval_secs: default_check_interval(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
        }
    }
}

impl Settings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn transfer_timeout(&self) -> Duration {
        Duration::from_secs(self.transfer.timeout_secs)
    }
}

impl HousekeepingSettings {
    /// Разбирает время очистки ("00:00" или "00:00:00")
    pub fn cleanup_time(&self) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(&self.at, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&self.at, "%H:%M:%S"))
            .context(format!("Невалидное время очистки: {}", self.at))
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }
}
