//! Timetable (`emploi du temps`).

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use ecoledirecte_core::{Lesson, Result, Session, Student};

use super::parse_entries;
use crate::client::EdClient;
use crate::text::{lenient_bool, lenient_opt_string};

const LESSON_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LessonEntry {
    #[serde(default)]
    id: i64,
    #[serde(default)]
    matiere: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    code_matiere: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    type_cours: Option<String>,
    #[serde(rename = "start_date")]
    start_date: String,
    #[serde(rename = "end_date")]
    end_date: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    prof: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    salle: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    is_annule: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    is_modifie: bool,
}

impl EdClient {
    /// Lessons between `from` and `to` (inclusive), sorted by start.
    pub async fn fetch_lessons(
        &self,
        session: &mut Session,
        student: &Student,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Lesson>> {
        let envelope = self
            .call_with_session(
                session,
                &format!("lessons_{}", student.id),
                &format!("E/{}/emploidutemps.awp?verbe=get", student.id),
                json!({
                    "dateDebut": from.format("%Y-%m-%d").to_string(),
                    "dateFin": to.format("%Y-%m-%d").to_string(),
                    "avecTrous": false,
                }),
            )
            .await?;

        let lessons = parse_lessons(&envelope.data);
        info!(
            category = "fetch",
            student = %student.full_name(),
            count = lessons.len(),
            from = %from,
            to = %to,
            "Lessons fetched"
        );
        Ok(lessons)
    }
}

/// Canceled lessons are kept with their flag set.
pub fn parse_lessons(data: &Value) -> Vec<Lesson> {
    let mut lessons: Vec<Lesson> = parse_entries::<LessonEntry>("lessons", data)
        .into_iter()
        .filter_map(|entry| {
            let start = NaiveDateTime::parse_from_str(&entry.start_date, LESSON_TIME_FORMAT);
            let end = NaiveDateTime::parse_from_str(&entry.end_date, LESSON_TIME_FORMAT);
            match (start, end) {
                (Ok(start), Ok(end)) => Some(Lesson {
                    id: entry.id,
                    start,
                    end,
                    subject: entry.matiere,
                    subject_code: entry.code_matiere,
                    teacher: entry.prof.map(|p| p.trim().to_string()),
                    room: entry.salle,
                    kind: entry.type_cours,
                    canceled: entry.is_annule,
                    modified: entry.is_modifie,
                }),
                _ => {
                    warn!(
                        category = "fetch",
                        id = entry.id,
                        start = %entry.start_date,
                        "Skipping lesson with unreadable dates"
                    );
                    None
                }
            }
        })
        .collect();

    lessons.sort_by_key(|lesson| lesson.start);
    lessons
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lessons_sorted_and_flags() {
        let data = json!([
            {"id": 2, "matiere": "FRANCAIS", "codeMatiere": "FRAN", "typeCours": "COURS",
             "start_date": "2025-01-13 10:00", "end_date": "2025-01-13 11:00",
             "prof": " DURAND M. ", "salle": "B12", "isAnnule": true, "isModifie": false},
            {"id": 1, "matiere": "MATHEMATIQUES", "typeCours": "COURS",
             "start_date": "2025-01-13 08:00", "end_date": "2025-01-13 09:00",
             "prof": "MARTIN P.", "salle": "", "isAnnule": false, "isModifie": true},
            {"id": 3, "matiere": "EPS", "start_date": "13/01/2025 14:00", "end_date": "x"}
        ]);

        let lessons = parse_lessons(&data);
        assert_eq!(lessons.len(), 2);
        assert_eq!(lessons[0].id, 1);
        assert!(lessons[0].modified);
        assert_eq!(lessons[0].room, None);
        assert!(lessons[1].canceled);
        assert_eq!(lessons[1].teacher.as_deref(), Some("DURAND M."));
    }
}
