use super::types::Snapshot;

/// Решение по свежему снимку
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    /// Файл байт в байт как в прошлый раз
    Unchanged,
    /// Файл изменился, но последняя строка уже записана
    SameTail,
    /// Новая последняя строка, ее надо разобрать
    Candidate(String),
}

/// Состояние устройства между циклами, живет только в памяти
#[derive(Debug, Default)]
pub struct ChangeDetector {
    previous_snapshot: Option<Snapshot>,
    accepted_line: Option<String>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Сравнивает снимок с предыдущим. Снимок запоминается всегда,
    /// принятая строка меняется только через `accept`.
    pub fn observe(&mut self, snapshot: Snapshot) -> Detection {
        if self.previous_snapshot.as_ref() == Some(&snapshot) {
            return Detection::Unchanged;
        }

        let last_line = snapshot.last_line().to_string();
        self.previous_snapshot = Some(snapshot);

        if self.accepted_line.as_deref() == Some(last_line.as_str()) {
            Detection::SameTail
        } else {
            Detection::Candidate(last_line)
        }
    }

    /// Строка разобрана и отправлена в базу
    pub fn accept(&mut self, line: String) {
        self.accepted_line = Some(line);
    }

    #[cfg(test)]
    pub fn accepted_line(&self) -> Option<&str> {
        self.accepted_line.as_deref()
    }
}
