use serde::{Deserialize, Serialize};

/// Один счетчик посетителей в магазине
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// IP или hostname FTP сервера устройства
    pub host: String,
    /// Порт, если отличается от общего
    #[serde(default)]
    pub port: Option<u16>,
    pub user: String,
    pub password: String,
    /// Название магазина, уникальное в парке
    pub name: String,
}

impl DeviceConfig {
    /// Свой порт устройства или общий из настроек
    pub fn port_or(&self, default: u16) -> u16 {
        self.port.unwrap_or(default)
    }

    /// Имя временного файла устройства без спецсимволов
    pub fn scratch_file_name(&self) -> String {
        let safe: String = self
            .name
            .trim()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        format!("{}_temp.txt", safe)
    }
}

impl std::fmt::Debug for DeviceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("name", &self.name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(name: &str) -> DeviceConfig {
        DeviceConfig {
            host: "10.0.0.5".to_string(),
            port: None,
            user: "adminftp".to_string(),
            password: "1234".to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn scratch_file_name_replaces_unsafe_chars() {
        assert_eq!(device("TEST 1 ").scratch_file_name(), "TEST_1_temp.txt");
        assert_eq!(device("a/b").scratch_file_name(), "a_b_temp.txt");
    }

    #[test]
    fn own_port_wins_over_default() {
        let mut store = device("Store");
        assert_eq!(store.port_or(21), 21);
        store.port = Some(2121);
        assert_eq!(store.port_or(21), 2121);
    }

    #[test]
    fn debug_hides_password() {
        let printed = format!("{:?}", device("Store"));
        assert!(!printed.contains("1234"));
        assert!(printed.contains("***"));
    }
}
