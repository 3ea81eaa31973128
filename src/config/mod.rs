use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::path::Path;

pub mod devices;
pub mod settings;

pub use devices::DeviceConfig;
pub use settings::Settings;

/// Путь к конфигурации по умолчанию
pub const DEFAULT_CONFIG_PATH: &str = "./config/monitor.yaml";

/// Главная конфигурация приложения
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Общие настройки
    #[serde(flatten)]
    pub settings: Settings,
    /// Список опрашиваемых устройств
    pub devices: Vec<DeviceConfig>,
}

impl AppConfig {
    /// Путь к конфигурации из переменной окружения или по умолчанию
    pub fn config_path() -> String {
        env::var("MONITOR_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
    }

    /// Загружает конфигурацию из YAML файла
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .context(format!("Не удалось прочитать файл: {}", path.display()))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let mut config: AppConfig =
            serde_yml::from_str(content).context("Не удалось распарсить YAML")?;

        if let Ok(url) = env::var("MONITOR_DATABASE_URL") {
            config.settings.database.url = url;
        }
        if let Ok(level) = env::var("MONITOR_LOG_LEVEL") {
            config.settings.logging.level = level;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.devices.is_empty() {
            anyhow::bail!("Список устройств пустой");
        }

        let mut names = HashSet::new();
        let mut scratch_files = HashSet::new();
        for device in &self.devices {
            if device.name.trim().is_empty() {
                anyhow::bail!("Устройство {} без названия", device.host);
            }
            if !names.insert(device.name.as_str()) {
                anyhow::bail!("Название '{}' встречается несколько раз", device.name);
            }
            // "a/b" и "a_b" дают один и тот же временный файл
            if !scratch_files.insert(device.scratch_file_name()) {
                anyhow::bail!(
                    "Временный файл устройства '{}' совпадает с другим: {}",
                    device.name,
                    device.scratch_file_name()
                );
            }
        }

        if self.settings.poll_interval_secs == 0 {
            anyhow::bail!("poll_interval_secs должен быть больше нуля");
        }
        if self.settings.housekeeping.check_interval_secs == 0 {
            anyhow::bail!("housekeeping.check_interval_secs должен быть больше нуля");
        }
        self.settings.housekeeping.cleanup_time()?;

        if !is_valid_table_name(&self.settings.database.table) {
            anyhow::bail!(
                "Невалидное имя таблицы: {}",
                self.settings.database.table
            );
        }

        Ok(())
    }

    pub fn debug_config(&self) {
        tracing::info!("=== Конфигурация ===");
        tracing::info!("Устройств: {}", self.devices.len());
        tracing::info!("Файл на устройстве: {}", self.settings.remote_file);
        tracing::info!("Интервал опроса: {}с", self.settings.poll_interval_secs);
        tracing::info!("Временная директория: {}", self.settings.scratch_dir.display());
        tracing::info!("Таблица: {}", self.settings.database.table);
        tracing::info!("Очистка ежедневно в {}", self.settings.housekeeping.at);
    }
}

/// Имя таблицы подставляется в SQL текстом, поэтому пропускаем только
/// идентификаторы вида `dbo.Table` или `[dbo].[Table]`
fn is_valid_table_name(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|part| {
            let inner = part
                .strip_prefix('[')
                .and_then(|p| p.strip_suffix(']'))
                .unwrap_or(part);
            !inner.is_empty() && inner.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
scratch_dir: /tmp/monitor
database:
  url: "sqlite://counter.db"
  table: "[dbo].[PeopleCounterDivio]"
devices:
  - host: 10.0.0.5
    user: adminftp
    password: "1234"
    name: "TEST 1"
  - host: 10.0.0.6
    port: 2121
    user: adminftp
    password: "1234"
    name: "TEST 2"
"#;

    #[test]
    fn loads_sample_with_defaults() {
        let config = AppConfig::from_yaml(SAMPLE).unwrap();

        assert_eq!(config.devices.len(), 2);
        assert_eq!(config.settings.remote_file, "test.txt");
        assert_eq!(config.settings.poll_interval_secs, 1800);
        assert_eq!(config.settings.housekeeping.at, "00:00");
        assert_eq!(config.settings.housekeeping.check_interval_secs, 60);
        assert_eq!(config.devices[0].port_or(config.settings.transfer.port), 21);
        assert_eq!(config.devices[1].port_or(config.settings.transfer.port), 2121);
    }

    #[test]
    fn rejects_duplicate_names() {
        let yaml = SAMPLE.replace("TEST 2", "TEST 1");
        let err = AppConfig::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("несколько раз"));
    }

    #[test]
    fn rejects_names_sharing_scratch_file() {
        let yaml = SAMPLE.replace("TEST 1", "TEST/2").replace("TEST 2", "TEST_2");
        let err = AppConfig::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("TEST_2_temp.txt"));
    }

    #[test]
    fn rejects_empty_device_list() {
        let yaml = "database:\n  url: \"sqlite://x.db\"\ndevices: []\n";
        assert!(AppConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn rejects_bad_cleanup_time() {
        let yaml = format!("{}housekeeping:\n  at: \"25:99\"\n", SAMPLE);
        assert!(AppConfig::from_yaml(&yaml).is_err());
    }

    #[test]
    fn table_name_validation() {
        assert!(is_valid_table_name("PeopleCounter"));
        assert!(is_valid_table_name("dbo.PeopleCounter"));
        assert!(is_valid_table_name("[dbo].[PeopleCounterDivio]"));
        assert!(!is_valid_table_name("x; DROP TABLE y"));
        assert!(!is_valid_table_name("dbo..x"));
        assert!(!is_valid_table_name(""));
    }
}
