//! School life (`vie scolaire`): absences, lateness, sanctions, commendations.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use ecoledirecte_core::config::defaults;
use ecoledirecte_core::{AttendanceEvent, AttendanceKind, Result, Session, Student};

use super::parse_entries;
use crate::client::EdClient;
use crate::text::{lenient_bool, lenient_opt_string};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttendanceReport {
    pub absences: Vec<AttendanceEvent>,
    pub lateness: Vec<AttendanceEvent>,
    pub sanctions: Vec<AttendanceEvent>,
    pub commendations: Vec<AttendanceEvent>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Entry {
    #[serde(default)]
    type_element: String,
    #[serde(default)]
    date: String,
    #[serde(default)]
    display_date: String,
    #[serde(default, deserialize_with = "lenient_bool")]
    justifie: bool,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    libelle: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    motif: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    commentaire: Option<String>,
}

impl EdClient {
    pub async fn fetch_attendance(
        &self,
        session: &mut Session,
        student: &Student,
    ) -> Result<AttendanceReport> {
        let envelope = self
            .call_with_session(
                session,
                &format!("attendance_{}", student.id),
                &format!("eleves/{}/viescolaire.awp?verbe=get", student.id),
                json!({}),
            )
            .await?;

        let report = parse_attendance(&envelope.data, defaults::ATTENDANCE_TO_DISPLAY);
        info!(
            category = "fetch",
            student = %student.full_name(),
            absences = report.absences.len(),
            lateness = report.lateness.len(),
            sanctions = report.sanctions.len(),
            commendations = report.commendations.len(),
            "Attendance fetched"
        );
        Ok(report)
    }
}

/// Split both upstream lists into four, most recent first, `limit` each.
pub fn parse_attendance(data: &Value, limit: usize) -> AttendanceReport {
    let mut report = AttendanceReport::default();

    for entry in sorted_entries(data, "absencesRetards") {
        if entry.type_element == "Absence" {
            push_capped(&mut report.absences, entry, AttendanceKind::Absence, limit);
        } else {
            push_capped(&mut report.lateness, entry, AttendanceKind::Lateness, limit);
        }
    }

    for entry in sorted_entries(data, "sanctionsEncouragements") {
        if entry.type_element == "Punition" {
            push_capped(&mut report.sanctions, entry, AttendanceKind::Sanction, limit);
        } else {
            push_capped(
                &mut report.commendations,
                entry,
                AttendanceKind::Commendation,
                limit,
            );
        }
    }

    report
}

fn sorted_entries(data: &Value, field: &str) -> Vec<Entry> {
    let mut entries: Vec<Entry> = parse_entries(field, data.get(field).unwrap_or(&Value::Null));
    entries.sort_by(|a, b| b.date.cmp(&a.date));
    entries
}

fn push_capped(list: &mut Vec<AttendanceEvent>, entry: Entry, kind: AttendanceKind, limit: usize) {
    if list.len() >= limit {
        return;
    }
    list.push(AttendanceEvent {
        kind,
        date: entry.date,
        type_element: entry.type_element,
        display_date: entry.display_date,
        justified: entry.justifie,
        label: entry.libelle,
        reason: entry.motif,
        comment: entry.commentaire,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(kind: &str, date: &str) -> Value {
        json!({
            "typeElement": kind, "date": date, "displayDate": format!("le {}", date),
            "justifie": true, "libelle": "1 demi-journée", "motif": "", "commentaire": "Malade"
        })
    }

    #[test]
    fn test_split_by_type() {
        let data = json!({
            "absencesRetards": [
                entry("Absence", "2025-01-10"),
                entry("Retard", "2025-01-12"),
                entry("Absence", "2025-01-14"),
            ],
            "sanctionsEncouragements": [
                entry("Punition", "2025-01-05"),
                entry("Encouragement", "2025-01-06"),
            ]
        });

        let report = parse_attendance(&data, 20);
        assert_eq!(report.absences.len(), 2);
        assert_eq!(report.absences[0].date, "2025-01-14");
        assert_eq!(report.absences[0].kind, AttendanceKind::Absence);
        assert_eq!(report.lateness.len(), 1);
        assert_eq!(report.lateness[0].type_element, "Retard");
        assert_eq!(report.sanctions.len(), 1);
        assert_eq!(report.commendations.len(), 1);
        assert_eq!(report.commendations[0].kind, AttendanceKind::Commendation);
        assert_eq!(report.absences[0].reason, None);
        assert_eq!(report.absences[0].comment.as_deref(), Some("Malade"));
    }

    #[test]
    fn test_cap_keeps_most_recent() {
        let absences: Vec<Value> = (1..=25)
            .map(|d| entry("Absence", &format!("2025-01-{:02}", d)))
            .collect();
        let report = parse_attendance(&json!({"absencesRetards": absences}), 20);
        assert_eq!(report.absences.len(), 20);
        assert_eq!(report.absences[0].date, "2025-01-25");
        assert_eq!(report.absences[19].date, "2025-01-06");
    }

    #[test]
    fn test_missing_lists() {
        let report = parse_attendance(&json!({}), 20);
        assert_eq!(report, AttendanceReport::default());
    }
}
