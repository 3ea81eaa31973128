use chrono::{Local, NaiveDateTime};

/// Источник настенного времени: локальное время в проде, ручное в тестах
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Локальное время машины
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}
