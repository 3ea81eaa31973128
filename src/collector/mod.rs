use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use crate::clock::Clock;
use crate::config::DeviceConfig;
use crate::ftp::SnapshotSource;
use crate::sink::RecordSink;

pub mod detector;
pub mod parser;
pub mod types;

pub use detector::{ChangeDetector, Detection};
pub use parser::parse_counts;
pub use types::{CycleOutcome, MeasurementRecord, Snapshot};

/// Этапы одного цикла опроса
#[derive(Debug)]
enum PollState {
    Fetching,
    Detecting(Snapshot),
    Parsing(String),
    Inserting { line: String, record: MeasurementRecord },
    Sleeping(CycleOutcome),
}

/// Опрос одного устройства: скачать, сравнить, разобрать, записать, поспать
pub struct DevicePoller {
    device: DeviceConfig,
    source: Arc<dyn SnapshotSource>,
    sink: Arc<dyn RecordSink>,
    clock: Arc<dyn Clock>,
    detector: ChangeDetector,
}

impl DevicePoller {
    pub fn new(
        device: DeviceConfig,
        source: Arc<dyn SnapshotSource>,
        sink: Arc<dyn RecordSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            device,
            source,
            sink,
            clock,
            detector: ChangeDetector::new(),
        }
    }

    /// Крутится до завершения процесса
    pub async fn run(mut self, interval: Duration) {
        loop {
            self.run_cycle().await;
            tokio::time::sleep(interval).await;
        }
    }

    /// Один проход от скачивания до записи, без сна
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let mut state = PollState::Fetching;
        loop {
            state = match state {
                PollState::Sleeping(outcome) => return outcome,
                other => self.step(other).await,
            };
        }
    }

    async fn step(&mut self, state: PollState) -> PollState {
        let name = &self.device.name;

        match state {
            PollState::Fetching => match self.source.fetch(&self.device).await {
                Ok(snapshot) => PollState::Detecting(snapshot),
                Err(e) => {
                    error!("Ошибка для {} на этапе скачивания: {}", name, e);
                    PollState::Sleeping(CycleOutcome::FetchFailed)
                }
            },
            PollState::Detecting(snapshot) => match self.detector.observe(snapshot) {
                Detection::Candidate(line) => PollState::Parsing(line),
                Detection::Unchanged => {
                    info!("Файл {} не изменился. Пропускаем.", name);
                    PollState::Sleeping(CycleOutcome::Unchanged)
                }
                Detection::SameTail => {
                    info!("Нет новых данных для {}. Пропускаем запись.", name);
                    PollState::Sleeping(CycleOutcome::SameTail)
                }
            },
            PollState::Parsing(line) => match parse_counts(&line) {
                Ok((left, right)) => {
                    let record = MeasurementRecord {
                        device_name: name.clone(),
                        device_address: self.device.host.clone(),
                        left,
                        right,
                        observed_at: self.clock.now(),
                    };
                    PollState::Inserting { line, record }
                }
                Err(e) => {
                    error!("Ошибка разбора строки '{}' для {}: {}", line, name, e);
                    PollState::Sleeping(CycleOutcome::ParseFailed)
                }
            },
            PollState::Inserting { line, record } => {
                // Строка считается принятой до записи: упавшая вставка не повторяется
                self.detector.accept(line);
                match self.sink.insert(&record).await {
                    Ok(()) => {
                        info!(
                            "Записано: {}, {}, {}, {}, {}",
                            record.device_name,
                            record.device_address,
                            record.left,
                            record.right,
                            record.observed_at
                        );
                        PollState::Sleeping(CycleOutcome::Inserted(record))
                    }
                    Err(e) => {
                        error!("Ошибка записи в базу для {}: {}", name, e);
                        PollState::Sleeping(CycleOutcome::InsertFailed)
                    }
                }
            }
            sleeping @ PollState::Sleeping(_) => sleeping,
        }
    }
}


#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use tracing_test::traced_test;

    use super::testing::*;
    use super::*;
    use crate::clock::manual::ManualClock;

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            NaiveDate::from_ymd_opt(2024, 5, 1)
                .unwrap()
                .and_hms_opt(10, 30, 0)
                .unwrap(),
        ))
    }

    fn poller(source: ScriptedSource, sink: Arc<RecordingSink>) -> DevicePoller {
        DevicePoller::new(device("D1"), Arc::new(source), sink, clock())
    }

    #[tokio::test]
    async fn end_to_end_scenario() {
        let sink = Arc::new(RecordingSink::default());
        let mut poller = poller(
            ScriptedSource::new(vec![
                Ok("1/2 10:00\n3/4 10:30\n"),
                Ok("1/2 10:00\n3/4 10:30\n"),
                Ok("1/2 10:00\n3/4 10:30\n5/6 11:00\n"),
            ]),
            sink.clone(),
        );

        assert!(matches!(poller.run_cycle().await, CycleOutcome::Inserted(_)));
        assert_eq!(poller.run_cycle().await, CycleOutcome::Unchanged);
        assert!(matches!(poller.run_cycle().await, CycleOutcome::Inserted(_)));

        assert_eq!(
            sink.counts(),
            vec![("D1".to_string(), 3, 4), ("D1".to_string(), 5, 6)]
        );
    }

    #[tokio::test]
    async fn first_cycle_record_has_device_fields() {
        let sink = Arc::new(RecordingSink::default());
        let mut poller = poller(ScriptedSource::new(vec![Ok("7/8 x\n")]), sink.clone());

        let CycleOutcome::Inserted(record) = poller.run_cycle().await else {
            panic!("expected insert");
        };
        assert_eq!(record.device_address, "10.0.0.2");
        assert_eq!(record.observed_at.to_string(), "2024-05-01 10:30:00");
    }

    #[tokio::test]
    #[traced_test]
    async fn rewritten_file_with_same_tail_is_not_inserted_again() {
        let sink = Arc::new(RecordingSink::default());
        let mut poller = poller(
            ScriptedSource::new(vec![Ok("5/7 foo\n"), Ok("1/1 a\n2/2 b\n5/7 foo\n")]),
            sink.clone(),
        );

        poller.run_cycle().await;
        assert_eq!(poller.run_cycle().await, CycleOutcome::SameTail);
        assert_eq!(sink.counts().len(), 1);
        assert!(logs_contain("Нет новых данных для D1"));
    }

    #[tokio::test]
    async fn changed_tail_inserts_exactly_once() {
        let sink = Arc::new(RecordingSink::default());
        let mut poller = poller(
            ScriptedSource::new(vec![Ok("5/7 foo\n"), Ok("5/7 foo\n6/7 bar\n")]),
            sink.clone(),
        );

        poller.run_cycle().await;
        poller.run_cycle().await;
        poller.run_cycle().await;

        assert_eq!(
            sink.counts(),
            vec![("D1".to_string(), 5, 7), ("D1".to_string(), 6, 7)]
        );
    }

    #[tokio::test]
    #[traced_test]
    async fn fetch_failure_skips_cycle_and_keeps_state() {
        let sink = Arc::new(RecordingSink::default());
        let mut poller = poller(
            ScriptedSource::new(vec![Ok("1/2 a\n"), Err("connection refused"), Ok("1/2 a\n")]),
            sink.clone(),
        );

        poller.run_cycle().await;
        assert_eq!(poller.run_cycle().await, CycleOutcome::FetchFailed);
        assert_eq!(poller.run_cycle().await, CycleOutcome::Unchanged);
        assert_eq!(sink.counts().len(), 1);
        assert!(logs_contain("на этапе скачивания"));
    }

    #[tokio::test]
    async fn malformed_line_is_not_inserted() {
        let sink = Arc::new(RecordingSink::default());
        let mut poller = poller(
            ScriptedSource::new(vec![Ok("1/2 a\nbroken line\n"), Ok("")]),
            sink.clone(),
        );

        assert_eq!(poller.run_cycle().await, CycleOutcome::ParseFailed);
        assert_eq!(poller.run_cycle().await, CycleOutcome::ParseFailed);
        assert!(sink.counts().is_empty());
    }

    #[tokio::test]
    async fn failed_insert_is_not_retried_for_same_tail() {
        let sink = Arc::new(RecordingSink::failing_for("D1"));
        let mut poller = poller(
            ScriptedSource::new(vec![Ok("3/4 a\n"), Ok("1/1 z\n3/4 a\n")]),
            sink.clone(),
        );

        assert_eq!(poller.run_cycle().await, CycleOutcome::InsertFailed);
        assert_eq!(poller.run_cycle().await, CycleOutcome::SameTail);
    }

    #[tokio::test(start_paused = true)]
    async fn run_sleeps_between_cycles() {
        let sink = Arc::new(RecordingSink::default());
        let poller = poller(
            ScriptedSource::new(vec![Ok("1/1 a\n"), Ok("1/1 a\n2/2 b\n"), Ok("1/1 a\n2/2 b\n3/3 c\n")]),
            sink.clone(),
        );
        let interval = Duration::from_secs(1800);
        let handle = tokio::spawn(poller.run(interval));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(sink.counts().len(), 1);

        tokio::time::sleep(interval).await;
        assert_eq!(sink.counts().len(), 2);

        tokio::time::sleep(interval).await;
        assert_eq!(sink.counts().len(), 3);

        handle.abort();
    }
}
