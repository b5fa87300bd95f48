use chrono::NaiveDateTime;

use crate::core::category::Category;
use crate::core::query::{self, SortOrder, TaskField, TaskView};
use crate::core::record::TaskRecord;
use crate::core::task::{Task, TaskId};
use crate::core::urgency::{DueDate, Urgency};
use crate::error::{Error, Result};
use crate::storage::merge::merge_records;
use crate::storage::{KeyValueStore, TaskStorage};
use crate::sync::TaskSource;

/// Raw form input for a new task. Every field is the text the user typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub content: String,
    pub user: String,
    /// Empty means `low`.
    pub urgency: String,
    /// 1-based category index. Empty means the first category.
    pub category: String,
    pub date: String,
}

type Listener = Box<dyn FnMut(&[&Task]) + Send>;

/// The authoritative in-memory task collection and its persistence.
///
/// Every mutation saves the whole collection and then calls the change
/// listener with the tasks visible under the current [`TaskView`].
pub struct TaskStore<S> {
    tasks: Vec<Task>,
    /// Unset until loading finishes.
    next_id: Option<u64>,
    storage: TaskStorage<S>,
    view: TaskView,
    listener: Option<Listener>,
}

impl<S: KeyValueStore> TaskStore<S> {
    pub fn new(storage: TaskStorage<S>) -> Self {
        Self {
            tasks: Vec::new(),
            next_id: None,
            storage,
            view: TaskView::default(),
            listener: None,
        }
    }

    pub fn set_listener(&mut self, listener: impl FnMut(&[&Task]) + Send + 'static) {
        self.listener = Some(Box::new(listener));
    }

    /// Startup sequence: remote baseline, then saved edits on top, then id seeding.
    ///
    /// A failed fetch is logged and loading carries on with what is in memory.
    pub async fn load<R: TaskSource>(&mut self, source: &R, now: NaiveDateTime) {
        let fetched = source.fetch_records().await;
        self.ingest_remote(fetched, now);
        self.restore_saved(now);
        self.finish_loading();
    }

    /// Startup without a remote feed.
    pub fn load_offline(&mut self, now: NaiveDateTime) {
        log::info!("Loading saved tasks only");
        self.restore_saved(now);
        self.finish_loading();
    }

    fn ingest_remote(&mut self, fetched: Result<Vec<TaskRecord>>, now: NaiveDateTime) {
        match fetched {
            Ok(records) => {
                let summary = merge_records(&mut self.tasks, records, now);
                log::info!(
                    "Loaded {} remote tasks ({} skipped)",
                    summary.added + summary.updated,
                    summary.skipped
                );
            }
            Err(e) => log::error!("Failed to fetch initial tasks: {}", e),
        }
    }

    fn restore_saved(&mut self, now: NaiveDateTime) {
        let records = self.storage.load();
        if records.is_empty() {
            return;
        }
        let summary = merge_records(&mut self.tasks, records, now);
        log::info!(
            "Restored saved tasks: {} new, {} updated, {} skipped",
            summary.added,
            summary.updated,
            summary.skipped
        );
    }

    fn finish_loading(&mut self) {
        self.next_id = Some(self.seed_id());
        self.notify();
    }

    fn max_numeric_id(&self) -> Option<u64> {
        self.tasks.iter().filter_map(|t| t.id.as_number()).max()
    }

    /// One past the largest numeric id, or the lowest free id when that would overflow.
    fn seed_id(&self) -> u64 {
        match self.max_numeric_id() {
            None => 1,
            Some(max) => max.checked_add(1).unwrap_or_else(|| {
                log::warn!("Task id {} is at the limit, reusing free ids", max);
                self.lowest_free_id()
            }),
        }
    }

    fn lowest_free_id(&self) -> u64 {
        (1u64..)
            .find(|n| !self.contains(&TaskId::from(*n)))
            .unwrap_or(1)
    }

    fn allocate_id(&mut self) -> TaskId {
        let mut next = self.next_id.unwrap_or_else(|| self.seed_id());
        while self.contains(&TaskId::from(next)) {
            next = next.checked_add(1).unwrap_or_else(|| self.lowest_free_id());
        }
        self.next_id = next.checked_add(1).or_else(|| Some(self.lowest_free_id()));
        TaskId::from(next)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// The id the next added task will get, once loading has finished.
    pub fn next_id(&self) -> Option<u64> {
        self.next_id
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.tasks.iter().any(|t| &t.id == id)
    }

    pub fn get(&self, id: impl Into<TaskId>) -> Option<&Task> {
        let id = id.into();
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn storage(&self) -> &TaskStorage<S> {
        &self.storage
    }

    pub fn filter(&self, field: TaskField, value: &str) -> Vec<&Task> {
        query::filter(&self.tasks, field, value)
    }

    pub fn ordered(&self, field: TaskField, order: SortOrder) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self.tasks.iter().collect();
        query::order_by(&mut tasks, field, order);
        tasks
    }

    pub fn view(&self) -> &TaskView {
        &self.view
    }

    pub fn set_view(&mut self, view: TaskView) {
        self.view = view;
        self.notify();
    }

    /// Tasks under the current view.
    pub fn visible(&self) -> Vec<&Task> {
        self.view.apply(&self.tasks)
    }

    /// Validate `draft`, append it as a new task and persist.
    ///
    /// Blank content or user, an unknown urgency, or a category index that is
    /// not a number ≥ 1 rejects the draft and changes nothing. Content and
    /// user are stored exactly as typed.
    pub fn add_task(&mut self, draft: TaskDraft, now: NaiveDateTime) -> Result<TaskId> {
        if draft.content.trim().is_empty() {
            return Err(Error::Rejected("content is empty".to_string()));
        }
        if draft.user.trim().is_empty() {
            return Err(Error::Rejected("user is empty".to_string()));
        }

        let urgency = match draft.urgency.trim() {
            "" => Urgency::Low,
            raw => Urgency::parse(raw)
                .ok_or_else(|| Error::Rejected(format!("unknown urgency {:?}", raw)))?,
        };
        let category = match draft.category.trim() {
            "" => Category::default(),
            raw => raw
                .parse::<i64>()
                .map_err(|_| Error::Rejected(format!("category {:?} is not a number", raw)))
                .and_then(|index| {
                    Category::new(index).map_err(|e| Error::Rejected(e.to_string()))
                })?,
        };
        let date = DueDate::parse(&draft.date);
        if let DueDate::Invalid(raw) = &date {
            log::debug!("Adding task with unreadable date {:?}", raw);
        }

        let id = self.allocate_id();
        let task = Task::new(
            id.clone(),
            category,
            urgency,
            date,
            draft.content,
            draft.user,
            now,
        );
        log::info!("Added task {} ({})", id, task.urgency);
        self.tasks.push(task);
        self.persist();
        self.notify();
        Ok(id)
    }

    /// Remove the task with `id`. Returns false, and does nothing, if there is none.
    pub fn remove_task(&mut self, id: impl Into<TaskId>) -> bool {
        let id = id.into();
        let Some(pos) = self.tasks.iter().position(|t| t.id == id) else {
            log::debug!("Remove: no task {}", id);
            return false;
        };
        self.tasks.remove(pos);
        log::info!("Removed task {}", id);
        self.persist();
        self.notify();
        true
    }

    /// Set the completion flag of `id`. Returns false if there is no such task.
    pub fn set_checked(&mut self, id: impl Into<TaskId>, checked: bool) -> bool {
        let id = id.into();
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            log::debug!("Check: no task {}", id);
            return false;
        };
        task.checked = checked;
        self.persist();
        self.notify();
        true
    }

    fn persist(&mut self) {
        if let Err(e) = self.storage.save(&self.tasks) {
            log::warn!("Failed to save tasks, keeping changes in memory: {}", e);
        }
    }

    fn notify(&mut self) {
        if let Some(listener) = self.listener.as_mut() {
            let visible = self.view.apply(&self.tasks);
            listener(&visible);
        }
    }
}
