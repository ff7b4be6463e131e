use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::model::{
    CivilInspection, DailyReport, GeodeticInspection, NcrReport, Record, RemarkReport,
};
use crate::store::backend::StorageBackend;
use crate::store::RecordStore;

/// Listing filter. Empty strings mean "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub status: Option<String>,
    pub decision: Option<String>,
    pub priority: Option<String>,
    /// Case-insensitive substring of the report author (daily reports).
    pub author: Option<String>,
    /// Inclusive lower bound on the record date, `YYYY-MM-DD`.
    pub date_from: Option<String>,
    /// Inclusive upper bound on the record date, `YYYY-MM-DD`.
    pub date_to: Option<String>,
}

/// The filterable dimensions of a record kind. `None` means the kind has no
/// such field and a filter on it is ignored.
pub trait Filterable: Record {
    fn status(&self) -> Option<&str> {
        None
    }

    fn decision(&self) -> Option<&str> {
        None
    }

    fn priority(&self) -> Option<&str> {
        None
    }

    fn author_name(&self) -> Option<&str> {
        None
    }

    /// The date ranges compare against.
    fn record_date(&self) -> &str;
}

impl Filterable for GeodeticInspection {
    fn status(&self) -> Option<&str> {
        Some(&self.status)
    }

    fn decision(&self) -> Option<&str> {
        Some(&self.decision)
    }

    fn record_date(&self) -> &str {
        &self.inspection_date
    }
}

impl Filterable for CivilInspection {
    fn status(&self) -> Option<&str> {
        Some(&self.status)
    }

    fn decision(&self) -> Option<&str> {
        Some(&self.decision)
    }

    fn record_date(&self) -> &str {
        &self.inspection_date
    }
}

impl Filterable for NcrReport {
    fn status(&self) -> Option<&str> {
        Some(&self.status)
    }

    fn priority(&self) -> Option<&str> {
        Some(&self.priority)
    }

    fn record_date(&self) -> &str {
        &self.inspection_date
    }
}

impl Filterable for RemarkReport {
    fn status(&self) -> Option<&str> {
        Some(&self.status)
    }

    fn record_date(&self) -> &str {
        &self.inspection_date
    }
}

impl Filterable for DailyReport {
    fn author_name(&self) -> Option<&str> {
        Some(&self.author)
    }

    fn record_date(&self) -> &str {
        &self.report_date
    }
}

fn active(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn equals(want: Option<&str>, have: Option<&str>) -> bool {
    match (want, have) {
        (Some(want), Some(have)) => have.trim() == want,
        _ => true,
    }
}

impl RecordFilter {
    pub fn is_empty(&self) -> bool {
        [
            &self.status,
            &self.decision,
            &self.priority,
            &self.author,
            &self.date_from,
            &self.date_to,
        ]
        .into_iter()
        .all(|v| active(v).is_none())
    }

    pub fn matches<T: Filterable>(&self, record: &T) -> bool {
        if !equals(active(&self.status), record.status())
            || !equals(active(&self.decision), record.decision())
            || !equals(active(&self.priority), record.priority())
        {
            return false;
        }

        if let (Some(want), Some(have)) = (active(&self.author), record.author_name()) {
            if !have.to_lowercase().contains(&want.to_lowercase()) {
                return false;
            }
        }

        // ISO dates order correctly as strings; an undated record fails any bound.
        let date = record.record_date();
        if active(&self.date_from).is_some_and(|from| date < from) {
            return false;
        }
        if active(&self.date_to).is_some_and(|to| date > to) {
            return false;
        }
        true
    }
}

/// Apply `filter` and order newest first.
pub fn select<T: Filterable>(records: Vec<T>, filter: &RecordFilter) -> Vec<T> {
    let mut selected: Vec<T> = records
        .into_iter()
        .filter(|r| filter.matches(r))
        .collect();
    selected.sort_by(|a, b| b.meta().created_at.cmp(&a.meta().created_at));
    selected
}

pub fn run<T: Filterable, B: StorageBackend>(
    store: &RecordStore<B>,
    filter: &RecordFilter,
) -> Result<CmdResult<T>> {
    let records = select(store.load::<T>(), filter);
    let mut result = CmdResult::default();
    if records.is_empty() {
        result.add_message(CmdMessage::info(if filter.is_empty() {
            "No records yet."
        } else {
            "No records match the filter."
        }));
    }
    Ok(result.with_records(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecordMeta;
    use crate::store::mem_backend::MemBackend;

    fn ncr(id: u64, created_at: &str, status: &str, priority: &str, date: &str) -> NcrReport {
        NcrReport {
            meta: RecordMeta {
                id,
                created_at: created_at.into(),
                updated_at: None,
            },
            status: status.into(),
            priority: priority.into(),
            inspection_date: date.into(),
            ..Default::default()
        }
    }

    fn sample() -> Vec<NcrReport> {
        vec![
            ncr(1, "2025-03-01T08:00:00.000000", "Открыто", "High", "2025-03-01"),
            ncr(2, "2025-03-05T08:00:00.000000", "Закрыто", "Low", "2025-03-05"),
            ncr(3, "2025-03-03T08:00:00.000000", "Открыто", "Low", "2025-03-10"),
        ]
    }

    fn ids(records: &[NcrReport]) -> Vec<u64> {
        records.iter().map(|r| r.id()).collect()
    }

    #[test]
    fn empty_filter_sorts_newest_first() {
        let selected = select(sample(), &RecordFilter::default());
        assert_eq!(ids(&selected), vec![2, 3, 1]);
    }

    #[test]
    fn status_and_priority_are_exact() {
        let filter = RecordFilter {
            status: Some("Открыто".into()),
            priority: Some("Low".into()),
            ..Default::default()
        };
        assert_eq!(ids(&select(sample(), &filter)), vec![3]);
    }

    #[test]
    fn blank_values_do_not_filter() {
        let filter = RecordFilter {
            status: Some("  ".into()),
            date_from: Some(String::new()),
            ..Default::default()
        };
        assert!(filter.is_empty());
        assert_eq!(select(sample(), &filter).len(), 3);
    }

    #[test]
    fn date_range_is_inclusive() {
        let filter = RecordFilter {
            date_from: Some("2025-03-01".into()),
            date_to: Some("2025-03-05".into()),
            ..Default::default()
        };
        assert_eq!(ids(&select(sample(), &filter)), vec![2, 1]);
    }

    #[test]
    fn undated_records_fail_a_date_bound() {
        let mut records = sample();
        records.push(ncr(4, "2025-03-06T08:00:00.000000", "Открыто", "Low", ""));
        let filter = RecordFilter {
            date_to: Some("2025-12-31".into()),
            ..Default::default()
        };
        assert!(!ids(&select(records, &filter)).contains(&4));
    }

    #[test]
    fn inapplicable_dimensions_are_ignored() {
        let filter = RecordFilter {
            decision: Some("Accepted".into()),
            author: Some("nobody".into()),
            ..Default::default()
        };
        assert_eq!(select(sample(), &filter).len(), 3);
    }

    #[test]
    fn daily_author_is_case_insensitive_substring() {
        let reports = vec![
            DailyReport {
                author: "Said Djurabekov".into(),
                ..Default::default()
            },
            DailyReport {
                author: "Madiyar".into(),
                ..Default::default()
            },
        ];
        let filter = RecordFilter {
            author: Some("djura".into()),
            ..Default::default()
        };
        let selected = select(reports, &filter);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].author, "Said Djurabekov");
    }

    #[test]
    fn run_reports_an_empty_listing() {
        let store = RecordStore::with_backend(MemBackend::new());
        let result = run::<RemarkReport, _>(&store, &RecordFilter::default()).unwrap();
        assert!(result.records.is_empty());
        assert_eq!(result.messages[0].content, "No records yet.");
    }
}
