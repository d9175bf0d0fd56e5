//! Typed records produced by the resource fetchers.
//!
//! Field names are part of the external contract: the coordinator compares
//! records by a subset of their serialized fields, and events carry the
//! serialized record as their `data`.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One homework assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Homework {
    pub id: i64,
    /// Due date, `YYYY-MM-DD`.
    pub date: String,
    pub subject: String,
    pub subject_code: Option<String>,
    pub short_description: String,
    pub description: String,
    pub done: bool,
    /// The assignment is a test (`interrogation`).
    pub requires_quiz: bool,
    pub given_on: Option<String>,
    pub submit_online: bool,
    pub max_submit_days: Option<i64>,
}

/// A numeric grade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    pub id: i64,
    pub date: String,
    /// Subject code.
    pub subject: String,
    pub subject_name: String,
    /// Assignment title (`devoir`).
    pub comment: String,
    /// Dot-separated decimal, e.g. `"14.5"`.
    pub value: String,
    pub out_of: String,
    /// Display form in the upstream convention, e.g. `"14,5/20"`.
    pub grade_out_of: String,
    pub coefficient: String,
    pub class_average: String,
    pub min: String,
    pub max: String,
    pub period_code: Option<String>,
    pub not_significant: bool,
    pub entered_on: Option<String>,
}

/// A skill assessed in an evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    pub description: String,
    pub value: String,
    pub level: String,
}

impl Skill {
    /// Mastery label for a skill value.
    pub fn level_label(value: &str) -> &'static str {
        match value {
            "1" => "Maîtrise insuffisante",
            "2" => "Maîtrise fragile",
            "3" => "Maîtrise satisfaisante",
            "4" => "Très bonne maîtrise",
            _ => "Unknown",
        }
    }
}

/// A skills-based evaluation (a note with `noteSur == "0"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub id: i64,
    pub date: String,
    pub subject: String,
    pub subject_name: String,
    pub name: String,
    pub comment: Option<String>,
    pub skills: Vec<Skill>,
}

/// Per-subject averages of the current term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discipline {
    pub code: String,
    pub name: String,
    pub average: Option<String>,
    pub class_average: Option<String>,
    pub min: Option<String>,
    pub max: Option<String>,
    pub coefficient: Option<String>,
    pub teachers: Vec<String>,
}

/// Overall average of the current term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralAverage {
    pub value: String,
    pub class_average: Option<String>,
    pub min: Option<String>,
    pub max: Option<String>,
    pub computed_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceKind {
    Absence,
    Lateness,
    Sanction,
    Commendation,
}

/// Absence, lateness, sanction or commendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceEvent {
    pub kind: AttendanceKind,
    pub date: String,
    /// Raw upstream `typeElement`.
    pub type_element: String,
    pub display_date: String,
    pub justified: bool,
    pub label: Option<String>,
    pub reason: Option<String>,
    pub comment: Option<String>,
}

/// One timetable slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: i64,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub subject: String,
    pub subject_code: Option<String>,
    pub teacher: Option<String>,
    pub room: Option<String>,
    /// `typeCours`, e.g. `COURS` or `PERMANENCE`.
    pub kind: Option<String>,
    pub canceled: bool,
    pub modified: bool,
}

/// Counters of a mailbox.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailboxSummary {
    pub received: u64,
    pub sent: u64,
    pub archived: u64,
    pub unread: u64,
    pub drafts: u64,
}

/// A cafeteria / school wallet account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: i64,
    pub label: String,
    /// Dot-separated decimal.
    pub balance: String,
    pub student_id: Option<i64>,
}

/// An administrative form awaiting the family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Form {
    pub id: i64,
    pub title: String,
    pub created: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skill_levels() {
        assert_eq!(Skill::level_label("1"), "Maîtrise insuffisante");
        assert_eq!(Skill::level_label("4"), "Très bonne maîtrise");
        assert_eq!(Skill::level_label("A"), "Unknown");
    }

    #[test]
    fn test_attendance_kind_serializes_snake_case() {
        let json = serde_json::to_value(AttendanceKind::Commendation).unwrap();
        assert_eq!(json, "commendation");
    }
}
