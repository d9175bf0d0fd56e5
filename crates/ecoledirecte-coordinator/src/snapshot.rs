//! Result of one poll.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::Value;

use ecoledirecte_core::{
    AttendanceEvent, Discipline, Evaluation, Form, GeneralAverage, Grade, Homework, Lesson,
    MailboxSummary, Session, Wallet,
};

use crate::views::DaySchedule;

/// One stored collection or value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Resource {
    Homework(Vec<Homework>),
    Grades(Vec<Grade>),
    Evaluations(Vec<Evaluation>),
    Disciplines(Vec<Discipline>),
    GeneralAverage(GeneralAverage),
    Attendance(Vec<AttendanceEvent>),
    Lessons(Vec<Lesson>),
    /// `None` when no upcoming day has lessons.
    Schedule(Option<DaySchedule>),
    Mailbox(MailboxSummary),
    Wallets(Vec<Wallet>),
    Forms(Vec<Form>),
}

impl Resource {
    /// The records of a collection, serialized for diffing. Single values
    /// yield nothing.
    pub fn records(&self) -> Vec<Value> {
        fn to_values<T: Serialize>(items: &[T]) -> Vec<Value> {
            items
                .iter()
                .filter_map(|item| serde_json::to_value(item).ok())
                .collect()
        }

        match self {
            Resource::Homework(items) => to_values(items),
            Resource::Grades(items) => to_values(items),
            Resource::Evaluations(items) => to_values(items),
            Resource::Disciplines(items) => to_values(items),
            Resource::Attendance(items) => to_values(items),
            Resource::Lessons(items) => to_values(items),
            Resource::Wallets(items) => to_values(items),
            Resource::Forms(items) => to_values(items),
            Resource::GeneralAverage(_) | Resource::Schedule(_) | Resource::Mailbox(_) => {
                Vec::new()
            }
        }
    }

    /// Number of records, or 1 for a single value.
    pub fn len(&self) -> usize {
        match self {
            Resource::Homework(items) => items.len(),
            Resource::Grades(items) => items.len(),
            Resource::Evaluations(items) => items.len(),
            Resource::Disciplines(items) => items.len(),
            Resource::Attendance(items) => items.len(),
            Resource::Lessons(items) => items.len(),
            Resource::Wallets(items) => items.len(),
            Resource::Forms(items) => items.len(),
            Resource::Schedule(day) => day.as_ref().map_or(0, |d| d.lessons.len()),
            Resource::GeneralAverage(_) | Resource::Mailbox(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Everything fetched during one refresh, keyed by
/// `"{student_key}_{resource}"` or by the resource name for account-level data.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub taken_at: NaiveDateTime,
    pub session: Option<Session>,
    pub entries: BTreeMap<String, Resource>,
    /// Keys copied from the previous snapshot because their fetch failed.
    pub stale: BTreeSet<String>,
}

impl Snapshot {
    pub fn new(taken_at: NaiveDateTime) -> Self {
        Self {
            taken_at,
            session: None,
            entries: BTreeMap::new(),
            stale: BTreeSet::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Resource> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, resource: Resource) {
        self.entries.insert(key.into(), resource);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn is_stale(&self, key: &str) -> bool {
        self.stale.contains(key)
    }

    /// Copy `keys` from `previous` and mark them stale. Keys `previous` lacks
    /// stay absent.
    pub fn carry_over(&mut self, previous: Option<&Snapshot>, keys: &[String]) -> usize {
        let Some(previous) = previous else {
            return 0;
        };
        let mut carried = 0;
        for key in keys {
            if let Some(resource) = previous.get(key) {
                self.entries.insert(key.clone(), resource.clone());
                self.stale.insert(key.clone());
                carried += 1;
            }
        }
        carried
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 15)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn form(title: &str) -> Form {
        Form {
            id: 1,
            title: title.into(),
            created: "2025-01-06".into(),
        }
    }

    #[test]
    fn test_records_serialize_items() {
        let resource = Resource::Forms(vec![form("Sortie")]);
        let records = resource.records();
        assert_eq!(records[0]["title"], "Sortie");
        assert!(Resource::Mailbox(MailboxSummary::default()).records().is_empty());
        assert_eq!(Resource::Mailbox(MailboxSummary::default()).len(), 1);
    }

    #[test]
    fn test_carry_over_marks_stale() {
        let mut previous = Snapshot::new(now());
        previous.insert("forms", Resource::Forms(vec![form("Sortie")]));

        let mut next = Snapshot::new(now());
        let carried = next.carry_over(
            Some(&previous),
            &["forms".to_string(), "wallets".to_string()],
        );
        assert_eq!(carried, 1);
        assert!(next.is_stale("forms"));
        assert!(!next.contains("wallets"));
        assert_eq!(next.get("forms"), previous.get("forms"));

        let mut first = Snapshot::new(now());
        assert_eq!(first.carry_over(None, &["forms".to_string()]), 0);
        assert!(first.is_empty());
    }

    #[test]
    fn test_serializes_untagged() {
        let mut snapshot = Snapshot::new(now());
        snapshot.insert("forms", Resource::Forms(vec![form("Sortie")]));
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["entries"]["forms"][0]["title"], "Sortie");
    }
}
