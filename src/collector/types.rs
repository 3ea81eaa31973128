use chrono::NaiveDateTime;

/// Полное содержимое файла устройства на момент опроса
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    content: String,
}

impl Snapshot {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            content: String::from_utf8_lossy(bytes).into_owned(),
        }
    }

    /// Последняя строка без пробелов по краям, "" для пустого файла
    pub fn last_line(&self) -> &str {
        self.content.lines().last().map(str::trim).unwrap_or("")
    }
}

impl From<&str> for Snapshot {
    fn from(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }
}

/// Одно показание счетчика, готовое к записи
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasurementRecord {
    pub device_name: String,
    pub device_address: String,
    pub left: u32,
    pub right: u32,
    pub observed_at: NaiveDateTime,
}

/// Чем закончился один цикл опроса устройства
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Inserted(MeasurementRecord),
    /// Файл не изменился
    Unchanged,
    /// Файл перезаписан, но последняя строка прежняя
    SameTail,
    FetchFailed,
    ParseFailed,
    InsertFailed,
}
