use std::io::ErrorKind;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use suppaftp::{FtpError, FtpStream};

use crate::error::TransferError;

/// Блокирующая FTP сессия с одним устройством
pub struct FtpClient {
    stream: FtpStream,
    address: String,
}

impl FtpClient {
    /// Подключается и авторизуется
    pub fn connect(
        host: &str,
        port: u16,
        user: &str,
        password: &str,
        timeout: Duration,
    ) -> Result<Self, TransferError> {
        let address = format!("{}:{}", host, port);
        let socket = resolve(host, port, &address)?;

        let stream = FtpStream::connect_timeout(socket, timeout)
            .map_err(|e| classify(e, &address, |reason| TransferError::Connect {
                address: address.clone(),
                reason,
            }))?
            .passive_stream_builder(move |data_addr| {
                // канал данных с теми же таймаутами, что и управляющий
                let data = TcpStream::connect_timeout(&data_addr, timeout)
                    .map_err(FtpError::ConnectionError)?;
                data.set_read_timeout(Some(timeout))
                    .map_err(FtpError::ConnectionError)?;
                Ok(data)
            });
        stream
            .get_ref()
            .set_read_timeout(Some(timeout))
            .map_err(|e| TransferError::Connect {
                address: address.clone(),
                reason: e.to_string(),
            })?;

        let mut client = Self { stream, address };
        client.login(user, password)?;
        Ok(client)
    }

    fn login(&mut self, user: &str, password: &str) -> Result<(), TransferError> {
        let address = self.address.clone();
        self.stream
            .login(user, password)
            .map_err(|e| classify(e, &address, |reason| TransferError::Login {
                address: address.clone(),
                reason,
            }))
    }

    /// Скачивает файл целиком в память
    pub fn download(&mut self, file: &str) -> Result<Vec<u8>, TransferError> {
        let cursor = self.stream.retr_as_buffer(file).map_err(|e| {
            classify(e, &self.address, |reason| TransferError::Download {
                file: file.to_string(),
                reason,
            })
        })?;
        Ok(cursor.into_inner())
    }

    /// Закрывает сессию. Ошибка QUIT не влияет на уже скачанные данные.
    pub fn quit(mut self) {
        if let Err(e) = self.stream.quit() {
            tracing::debug!("QUIT для {} не удался: {}", self.address, e);
        }
    }
}

fn resolve(host: &str, port: u16, address: &str) -> Result<SocketAddr, TransferError> {
    let mut candidates = (host, port)
        .to_socket_addrs()
        .map_err(|source| TransferError::Resolve {
            address: address.to_string(),
            source,
        })?;

    candidates.next().ok_or_else(|| TransferError::Resolve {
        address: address.to_string(),
        source: std::io::Error::new(ErrorKind::NotFound, "адрес не найден"),
    })
}

/// Таймауты выделяем отдельно, остальное заворачиваем в ошибку этапа
fn classify(
    error: FtpError,
    address: &str,
    stage: impl FnOnce(String) -> TransferError,
) -> TransferError {
    match &error {
        FtpError::ConnectionError(io)
            if matches!(io.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) =>
        {
            TransferError::Timeout {
                address: address.to_string(),
            }
        }
        _ => stage(error.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeouts_are_classified_separately() {
        let timed_out = FtpError::ConnectionError(std::io::Error::from(ErrorKind::TimedOut));
        let err = classify(timed_out, "10.0.0.5:21", |reason| TransferError::Connect {
            address: "10.0.0.5:21".to_string(),
            reason,
        });
        assert!(matches!(err, TransferError::Timeout { .. }));

        let refused = FtpError::ConnectionError(std::io::Error::from(ErrorKind::ConnectionRefused));
        let err = classify(refused, "10.0.0.5:21", |reason| TransferError::Connect {
            address: "10.0.0.5:21".to_string(),
            reason,
        });
        assert!(matches!(err, TransferError::Connect { .. }));
    }

    #[test]
    fn refused_connection_is_transfer_error() {
        // порт 1 на localhost почти всегда закрыт
        let result = FtpClient::connect(
            "127.0.0.1",
            1,
            "adminftp",
            "1234",
            Duration::from_millis(500),
        );
        assert!(matches!(
            result,
            Err(TransferError::Connect { .. }) | Err(TransferError::Timeout { .. })
        ));
    }
}
