use thiserror::Error;

/// Ошибки получения файла с устройства по FTP
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("не удалось разрешить адрес {address}: {source}")]
    Resolve {
        address: String,
        source: std::io::Error,
    },
    #[error("не удалось подключиться к {address}: {reason}")]
    Connect { address: String, reason: String },
    #[error("авторизация на {address} отклонена: {reason}")]
    Login { address: String, reason: String },
    #[error("не удалось скачать '{file}': {reason}")]
    Download { file: String, reason: String },
    #[error("таймаут FTP операции с {address}")]
    Timeout { address: String },
    #[error("рабочий поток FTP завершился аварийно: {0}")]
    Worker(String),
}

/// Ошибки разбора строки счетчика
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("пустая строка")]
    Empty,
    #[error("нет разделителя '/' в '{0}'")]
    MissingSeparator(String),
    #[error("больше одного разделителя '/' в '{0}'")]
    ExtraSeparator(String),
    #[error("невалидное значение счетчика '{0}'")]
    InvalidCount(String),
}

/// Ошибки записи в базу данных
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("не удалось подключиться к базе: {0}")]
    Connect(#[source] sqlx::Error),
    #[error("не удалось записать строку: {0}")]
    Write(#[source] sqlx::Error),
}

/// Ошибки очистки временной директории
#[derive(Debug, Error)]
pub enum HousekeepingError {
    #[error("не удалось прочитать директорию {path}: {source}")]
    ReadDir {
        path: String,
        source: std::io::Error,
    },
    #[error("не удалось удалить {path}: {source}")]
    Remove {
        path: String,
        source: std::io::Error,
    },
}
