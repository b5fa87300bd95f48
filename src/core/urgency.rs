use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

const MS_PER_DAY: f64 = 1000.0 * 60.0 * 60.0 * 24.0;

/// How pressing a task is, in ascending severity.
///
/// The derived `Ord` follows declaration order, so `Unurgent < Low < ... < Urgent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Unurgent,
    Low,
    Medium,
    High,
    Urgent,
}

impl Urgency {
    pub const ALL: [Urgency; 5] = [
        Self::Unurgent,
        Self::Low,
        Self::Medium,
        Self::High,
        Self::Urgent,
    ];

    pub fn rank(self) -> u8 {
        self as u8
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unurgent => "unurgent",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unurgent" => Some(Self::Unurgent),
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "urgent" => Some(Self::Urgent),
            _ => None,
        }
    }

    /// Urgency implied solely by how many (fractional) days remain until the due date.
    pub fn from_days_left(days: f64) -> Self {
        if days > 14.0 {
            Self::Low
        } else if days > 7.0 {
            Self::Medium
        } else if days > 0.0 {
            Self::High
        } else {
            Self::Urgent
        }
    }

    /// Effective urgency: the higher of `self` and the date-derived urgency.
    ///
    /// `Unurgent` is a user override and is never escalated. A task without a
    /// usable due date keeps its declared urgency.
    pub fn escalate(self, due: &DueDate, now: NaiveDateTime) -> Self {
        if self == Self::Unurgent {
            return self;
        }
        match due.days_until(now) {
            Some(days) => self.max(Self::from_days_left(days)),
            None => self,
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A task's due date as it arrived: absent, present but unparseable, or a real date.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum DueDate {
    #[default]
    Unset,
    /// Kept verbatim so a save writes back what was loaded.
    Invalid(String),
    On(NaiveDate),
}

impl DueDate {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return Self::Unset;
        }
        match parse_date(raw) {
            Some(date) => Self::On(date),
            None => Self::Invalid(raw.to_string()),
        }
    }

    pub fn from_raw(raw: Option<&str>) -> Self {
        raw.map(Self::parse).unwrap_or_default()
    }

    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Self::On(date) => Some(*date),
            _ => None,
        }
    }

    /// Fractional days from `now` until the start of the due day. Negative when overdue.
    pub fn days_until(&self, now: NaiveDateTime) -> Option<f64> {
        let due = self.date()?.and_time(NaiveTime::MIN);
        Some((due - now).num_milliseconds() as f64 / MS_PER_DAY)
    }

    /// The storage form: ISO date, the original text for invalid input, or nothing.
    pub fn to_raw(&self) -> Option<String> {
        match self {
            Self::Unset => None,
            Self::Invalid(raw) => Some(raw.clone()),
            Self::On(date) => Some(date.format("%Y-%m-%d").to_string()),
        }
    }

    /// `dd/mm/yyyy`, or an empty string when there is no usable date.
    pub fn display(&self) -> String {
        match self {
            Self::On(date) => date.format("%d/%m/%Y").to_string(),
            _ => String::new(),
        }
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(raw, "%d/%m/%Y").ok()
}
