use std::cmp::Ordering;
use std::str::FromStr;

use super::task::{Task, TaskId};

/// A task field that can be filtered or sorted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskField {
    Id,
    Category,
    Urgency,
    Date,
    Content,
    User,
    Checked,
}

impl TaskField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Category => "category",
            Self::Urgency => "urgency",
            Self::Date => "date",
            Self::Content => "content",
            Self::User => "user",
            Self::Checked => "checked",
        }
    }

    /// The field's value in the same text form records use.
    pub fn value_of(&self, task: &Task) -> String {
        match self {
            Self::Id => task.id.to_string(),
            Self::Category => task.category.to_string(),
            Self::Urgency => task.urgency.as_str().to_string(),
            Self::Date => task.date.to_raw().unwrap_or_default(),
            Self::Content => task.content.clone(),
            Self::User => task.user.clone(),
            Self::Checked => task.checked.to_string(),
        }
    }
}

impl FromStr for TaskField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "id" => Ok(Self::Id),
            "category" => Ok(Self::Category),
            "urgency" => Ok(Self::Urgency),
            "date" => Ok(Self::Date),
            "content" => Ok(Self::Content),
            "user" => Ok(Self::User),
            "checked" => Ok(Self::Checked),
            other => Err(format!("unknown task field: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            other => Err(format!("unknown sort order: {}", other)),
        }
    }
}

/// Tasks whose `field` equals `value` exactly (case- and whitespace-sensitive).
pub fn filter<'a>(tasks: &'a [Task], field: TaskField, value: &str) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|t| field.value_of(t) == value)
        .collect()
}

/// Stable sort by `field`.
///
/// Urgency sorts by rank, dates chronologically with undated tasks last,
/// text lexically. Ties fall back to id so the order is total.
pub fn order_by(tasks: &mut [&Task], field: TaskField, order: SortOrder) {
    tasks.sort_by(|a, b| {
        compare_field(a, b, field, order).then_with(|| compare_ids(&a.id, &b.id))
    });
}

/// `order` flips the comparison of present values only; undated tasks stay last.
fn compare_field(a: &Task, b: &Task, field: TaskField, order: SortOrder) -> Ordering {
    let directed = |ordering: Ordering| match order {
        SortOrder::Ascending => ordering,
        SortOrder::Descending => ordering.reverse(),
    };
    match field {
        TaskField::Id => directed(compare_ids(&a.id, &b.id)),
        TaskField::Category => directed(a.category.cmp(&b.category)),
        TaskField::Urgency => directed(a.urgency.rank().cmp(&b.urgency.rank())),
        TaskField::Date => match (a.date.date(), b.date.date()) {
            (Some(x), Some(y)) => directed(x.cmp(&y)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        TaskField::Content => directed(a.content.cmp(&b.content)),
        TaskField::User => directed(a.user.cmp(&b.user)),
        TaskField::Checked => directed(a.checked.cmp(&b.checked)),
    }
}

/// Numeric ids in numeric order, before any non-numeric ids in lexical order.
fn compare_ids(a: &TaskId, b: &TaskId) -> Ordering {
    match (a.as_number(), b.as_number()) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// The active filter and ordering applied before rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskView {
    pub filter: Option<(TaskField, String)>,
    pub order: Option<(TaskField, SortOrder)>,
}

impl TaskView {
    pub fn apply<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        let mut visible = match &self.filter {
            Some((field, value)) => filter(tasks, *field, value),
            None => tasks.iter().collect(),
        };
        if let Some((field, order)) = self.order {
            order_by(&mut visible, field, order);
        }
        visible
    }
}
