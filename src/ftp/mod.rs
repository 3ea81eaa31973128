use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use crate::collector::Snapshot;
use crate::config::{AppConfig, DeviceConfig};
use crate::error::TransferError;

pub mod client;

pub use client::FtpClient;

/// Запас на всю сессию: подключение, логин, PASV, передача
const SESSION_TIMEOUT_FACTOR: u32 = 4;

/// Откуда берется содержимое файла устройства
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch(&self, device: &DeviceConfig) -> Result<Snapshot, TransferError>;
}

/// Забирает файл со счетчиками по FTP
pub struct FtpSource {
    remote_file: String,
    default_port: u16,
    timeout: Duration,
    scratch_dir: PathBuf,
}

impl FtpSource {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            remote_file: config.settings.remote_file.clone(),
            default_port: config.settings.transfer.port,
            timeout: config.settings.transfer_timeout(),
            scratch_dir: config.settings.scratch_dir.clone(),
        }
    }

    fn download_blocking(
        device: DeviceConfig,
        port: u16,
        remote_file: String,
        timeout: Duration,
    ) -> Result<Vec<u8>, TransferError> {
        let mut client =
            FtpClient::connect(&device.host, port, &device.user, &device.password, timeout)?;
        let bytes = client.download(&remote_file)?;
        client.quit();
        Ok(bytes)
    }
}

#[async_trait]
impl SnapshotSource for FtpSource {
    async fn fetch(&self, device: &DeviceConfig) -> Result<Snapshot, TransferError> {
        let port = device.port_or(self.default_port);
        let owned = device.clone();
        let remote_file = self.remote_file.clone();
        let timeout = self.timeout;

        // suppaftp блокирующий, уводим его с рантайма
        let download = async move {
            tokio::task::spawn_blocking(move || {
                FtpSource::download_blocking(owned, port, remote_file, timeout)
            })
            .await
            .map_err(|e| TransferError::Worker(e.to_string()))?
        };
        let address = format!("{}:{}", device.host, port);
        let bytes = with_deadline(&address, timeout * SESSION_TIMEOUT_FACTOR, download).await?;

        write_scratch(&self.scratch_dir, device, &bytes).await;

        Ok(Snapshot::from_bytes(&bytes))
    }
}

/// Ограничивает всю сессию по времени. Заблокированный поток при этом
/// остается жить до таймаута своего сокета, но цикл опроса идет дальше.
async fn with_deadline<T>(
    address: &str,
    deadline: Duration,
    work: impl Future<Output = Result<T, TransferError>>,
) -> Result<T, TransferError> {
    match tokio::time::timeout(deadline, work).await {
        Ok(result) => result,
        Err(_) => Err(TransferError::Timeout {
            address: address.to_string(),
        }),
    }
}

/// Перезаписывает временный файл устройства. Файл нужен только для учета,
/// поэтому ошибка записи не валит цикл.
async fn write_scratch(dir: &Path, device: &DeviceConfig, bytes: &[u8]) {
    let path = dir.join(device.scratch_file_name());
    if let Err(e) = tokio::fs::write(&path, bytes).await {
        tracing::warn!("Не удалось записать временный файл {}: {}", path.display(), e);
    }
}
