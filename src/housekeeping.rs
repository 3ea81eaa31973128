use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDateTime, NaiveTime, TimeDelta};
use tracing::{error, info};

use crate::clock::Clock;
use crate::error::HousekeepingError;

/// Ежедневный запуск в заданное время. Если время сегодня уже прошло,
/// первый запуск будет завтра.
#[derive(Debug, Clone)]
pub struct DailyTrigger {
    at: NaiveTime,
    next_run: NaiveDateTime,
}

impl DailyTrigger {
    pub fn new(at: NaiveTime, now: NaiveDateTime) -> Self {
        Self {
            at,
            next_run: Self::next_after(at, now),
        }
    }

    fn next_after(at: NaiveTime, now: NaiveDateTime) -> NaiveDateTime {
        let today = now.date().and_time(at);
        if today > now {
            today
        } else {
            today + TimeDelta::days(1)
        }
    }

    pub fn next_run(&self) -> NaiveDateTime {
        self.next_run
    }

    /// true, если пора запускать; сразу переносит следующий запуск
    pub fn poll(&mut self, now: NaiveDateTime) -> bool {
        if now < self.next_run {
            return false;
        }
        self.next_run = Self::next_after(self.at, now);
        true
    }
}

/// Итог одной очистки
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub removed: usize,
    pub failed: usize,
}

/// Удаляет все обычные файлы в директории. Ошибка на одном файле не
/// останавливает остальные.
pub async fn sweep(dir: &Path) -> Result<SweepReport, HousekeepingError> {
    let mut entries =
        tokio::fs::read_dir(dir)
            .await
            .map_err(|source| HousekeepingError::ReadDir {
                path: dir.display().to_string(),
                source,
            })?;

    let mut report = SweepReport::default();
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(source) => {
                error!(
                    "{}",
                    HousekeepingError::ReadDir {
                        path: dir.display().to_string(),
                        source,
                    }
                );
                report.failed += 1;
                break;
            }
        };

        // Файл мог исчезнуть между read_dir и проверкой типа
        let is_file = match entry.file_type().await {
            Ok(kind) => kind.is_file(),
            Err(_) => continue,
        };
        if !is_file {
            continue;
        }

        let path = entry.path();
        match tokio::fs::remove_file(&path).await {
            Ok(()) => report.removed += 1,
            Err(source) => {
                error!(
                    "{}",
                    HousekeepingError::Remove {
                        path: path.display().to_string(),
                        source,
                    }
                );
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

/// Планировщик ежедневной очистки временной директории
pub struct Housekeeper {
    scratch_dir: PathBuf,
    trigger: DailyTrigger,
    clock: Arc<dyn Clock>,
}

impl Housekeeper {
    pub fn new(scratch_dir: PathBuf, at: NaiveTime, clock: Arc<dyn Clock>) -> Self {
        let trigger = DailyTrigger::new(at, clock.now());
        Self {
            scratch_dir,
            trigger,
            clock,
        }
    }

    /// Одна проверка: если пора, чистим. Возвращает отчет, если очистка была.
    pub async fn run_pending(&mut self) -> Option<SweepReport> {
        if !self.trigger.poll(self.clock.now()) {
            return None;
        }

        match sweep(&self.scratch_dir).await {
            Ok(report) => {
                info!(
                    "Временные файлы удалены: {}, не удалось: {}",
                    report.removed, report.failed
                );
                Some(report)
            }
            Err(e) => {
                error!("Ошибка очистки временных файлов: {}", e);
                Some(SweepReport::default())
            }
        }
    }

    pub async fn run(mut self, check_interval: Duration) {
        info!(
            "Очистка {} запланирована на {}",
            self.scratch_dir.display(),
            self.trigger.next_run()
        );

        let mut ticker = tokio::time::interval(check_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.run_pending().await;
        }
    }
}
