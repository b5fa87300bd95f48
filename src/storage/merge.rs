use chrono::NaiveDateTime;

use crate::core::record::TaskRecord;
use crate::core::task::Task;

/// Counts from one merge pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Records whose id was new and were appended.
    pub added: usize,
    /// Records that overwrote a task already in memory.
    pub updated: usize,
    /// Records that failed validation.
    pub skipped: usize,
}

/// Merge `records` into `tasks` by id.
///
/// New ids are appended (urgency derived against `now`). Known ids have all
/// their mutable fields replaced by the record's, so the incoming side wins
/// for tasks present on both sides. A repeated id within `records` simply
/// overwrites again; `tasks` never ends up with two entries for one id.
pub fn merge_records(
    tasks: &mut Vec<Task>,
    records: Vec<TaskRecord>,
    now: NaiveDateTime,
) -> MergeSummary {
    let mut summary = MergeSummary::default();

    for record in records {
        let incoming = match Task::from_record(record, now) {
            Ok(task) => task,
            Err(e) => {
                log::warn!("Skipping record: {}", e);
                summary.skipped += 1;
                continue;
            }
        };

        if let Some(existing) = tasks.iter_mut().find(|t| t.id == incoming.id) {
            log::debug!("Restoring saved version of task {}", incoming.id);
            existing.overwrite_from(incoming);
            summary.updated += 1;
        } else {
            tasks.push(incoming);
            summary.added += 1;
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::RawId;
    use crate::core::task::TaskId;
    use crate::core::urgency::Urgency;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn record(id: i64, content: &str) -> TaskRecord {
        TaskRecord {
            id: RawId::Number(id),
            category: 1,
            urgency: Some("unurgent".to_string()),
            date: None,
            content: Some(content.to_string()),
            user: Some("Lael".to_string()),
            checked: Some(false),
        }
    }

    fn ids(tasks: &[Task]) -> Vec<String> {
        tasks.iter().map(|t| t.id.to_string()).collect()
    }

    #[test]
    fn saved_versions_win_and_ids_stay_unique() {
        let mut tasks = Vec::new();
        merge_records(
            &mut tasks,
            vec![record(1, "remote 1"), record(2, "remote 2"), record(3, "remote 3")],
            now(),
        );

        let mut saved_2 = record(2, "local 2");
        saved_2.checked = Some(true);
        saved_2.urgency = Some("high".to_string());
        let summary = merge_records(
            &mut tasks,
            vec![saved_2, record(3, "local 3"), record(4, "local 4")],
            now(),
        );

        assert_eq!(summary, MergeSummary { added: 1, updated: 2, skipped: 0 });
        assert_eq!(ids(&tasks), vec!["1", "2", "3", "4"]);
        assert_eq!(tasks[0].content, "remote 1");
        assert_eq!(tasks[1].content, "local 2");
        assert!(tasks[1].checked);
        assert_eq!(tasks[1].urgency, Urgency::High);
        assert_eq!(tasks[2].content, "local 3");
    }

    #[test]
    fn string_and_numeric_ids_match() {
        let mut tasks = Vec::new();
        merge_records(&mut tasks, vec![record(9, "remote")], now());

        let mut saved = record(0, "local");
        saved.id = RawId::Text("9".to_string());
        merge_records(&mut tasks, vec![saved], now());

        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, TaskId::from(9u64));
        assert_eq!(tasks[0].content, "local");
    }

    #[test]
    fn duplicate_ids_in_one_batch_overwrite() {
        let mut tasks = Vec::new();
        let records = vec![record(5, "first"), record(5, "second")];
        let summary = merge_records(&mut tasks, records, now());
        assert_eq!(summary, MergeSummary { added: 1, updated: 1, skipped: 0 });
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].content, "second");
    }

    #[test]
    fn invalid_records_are_skipped() {
        let mut tasks = Vec::new();
        let mut bad = record(1, "bad");
        bad.category = 0;
        let summary = merge_records(&mut tasks, vec![bad, record(2, "ok")], now());
        assert_eq!(summary.skipped, 1);
        assert_eq!(ids(&tasks), vec!["2"]);
    }

    #[test]
    fn reloaded_tasks_are_escalated() {
        let mut tasks = Vec::new();
        let mut r = record(1, "soon");
        r.urgency = Some("low".to_string());
        r.date = Some("2025-01-03".to_string());
        merge_records(&mut tasks, vec![r], now());
        assert_eq!(tasks[0].urgency, Urgency::High);
    }
}
