use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::category::Category;
use super::record::{RawId, TaskRecord};
use super::urgency::{DueDate, Urgency};
use crate::error::{Error, Result};

/// Canonical task identifier.
///
/// External ids arrive as numbers or strings; both are normalized to their
/// trimmed decimal/text form at the boundary so comparisons never coerce.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The numeric value, for ids that are plain non-negative integers.
    pub fn as_number(&self) -> Option<u64> {
        if self.0.is_empty() || !self.0.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        self.0.parse().ok()
    }

    fn to_raw(&self) -> RawId {
        match self.as_number().and_then(|n| i64::try_from(n).ok()) {
            Some(n) if n.to_string() == self.0 => RawId::Number(n),
            _ => RawId::Text(self.0.clone()),
        }
    }
}

impl From<u64> for TaskId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.trim().to_string())
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<RawId> for TaskId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Number(n) => Self(n.to_string()),
            RawId::Text(s) => Self::from(s),
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub category: Category,
    /// Effective urgency. Never below what the due date implies (see [`Urgency::escalate`]).
    pub urgency: Urgency,
    pub date: DueDate,
    pub content: String,
    pub user: String,
    pub checked: bool,
}

impl Task {
    pub fn new(
        id: impl Into<TaskId>,
        category: Category,
        urgency: Urgency,
        date: DueDate,
        content: impl Into<String>,
        user: impl Into<String>,
        now: NaiveDateTime,
    ) -> Self {
        let mut task = Self {
            id: id.into(),
            category,
            urgency,
            date,
            content: content.into(),
            user: user.into(),
            checked: false,
        };
        task.refresh_urgency(now);
        task
    }

    /// Build a task from a wire record, validating the record and deriving urgency.
    ///
    /// A missing urgency defaults to `low`; an unrecognised one rejects the record.
    pub fn from_record(record: TaskRecord, now: NaiveDateTime) -> Result<Self> {
        let id = TaskId::from(record.id);
        if id.as_str().is_empty() {
            return Err(Error::InvalidRecord("empty id".to_string()));
        }
        let category = Category::new(record.category)
            .map_err(|e| Error::InvalidRecord(format!("task {}: {}", id, e)))?;
        let urgency = match record.urgency.as_deref() {
            None => Urgency::Low,
            Some(raw) => Urgency::parse(raw).ok_or_else(|| {
                Error::InvalidRecord(format!("task {}: unknown urgency {:?}", id, raw))
            })?,
        };

        let mut task = Self::new(
            id,
            category,
            urgency,
            DueDate::from_raw(record.date.as_deref()),
            record.content.unwrap_or_default(),
            record.user.unwrap_or_default(),
            now,
        );
        task.checked = record.checked.unwrap_or(false);
        Ok(task)
    }

    pub fn to_record(&self) -> TaskRecord {
        TaskRecord {
            id: self.id.to_raw(),
            category: self.category.into(),
            urgency: Some(self.urgency.as_str().to_string()),
            date: self.date.to_raw(),
            content: Some(self.content.clone()),
            user: Some(self.user.clone()),
            checked: Some(self.checked),
        }
    }

    pub fn refresh_urgency(&mut self, now: NaiveDateTime) {
        let effective = self.urgency.escalate(&self.date, now);
        if effective != self.urgency {
            log::debug!(
                "Task {} escalated from {} to {}",
                self.id,
                self.urgency,
                effective
            );
            self.urgency = effective;
        }
    }

    /// Replace every mutable field with `other`'s. The id is left alone.
    pub fn overwrite_from(&mut self, other: Task) {
        self.category = other.category;
        self.urgency = other.urgency;
        self.date = other.date;
        self.content = other.content;
        self.user = other.user;
        self.checked = other.checked;
    }
}
