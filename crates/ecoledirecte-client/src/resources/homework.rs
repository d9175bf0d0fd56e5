//! Homework (`cahier de textes`).

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use ecoledirecte_core::config::defaults;
use ecoledirecte_core::{Homework, Result, Session, Student};

use super::parse_entries;
use crate::client::EdClient;
use crate::text::{self, lenient_bool, lenient_opt_i64};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HomeworkEntry {
    id_devoir: i64,
    #[serde(default)]
    matiere: String,
    #[serde(default)]
    code_matiere: Option<String>,
    #[serde(default)]
    donne_le: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    effectue: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    interrogation: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    rendre_en_ligne: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubjectDetail {
    id: i64,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    nb_jour_max_rendu_devoir: Option<i64>,
    #[serde(default)]
    a_faire: Option<ToDo>,
}

#[derive(Debug, Clone, Deserialize)]
struct ToDo {
    #[serde(default)]
    contenu: String,
}

impl EdClient {
    /// Homework of a student, sorted by due date.
    ///
    /// The summary gives the entries per due date; one detail call per date
    /// adds the description.
    pub async fn fetch_homework(
        &self,
        session: &mut Session,
        student: &Student,
    ) -> Result<Vec<Homework>> {
        let summary = self
            .call_with_session(
                session,
                &format!("homework_{}", student.id),
                &format!("Eleves/{}/cahierdetexte.awp?verbe=get", student.id),
                json!({}),
            )
            .await?;

        let days = summary
            .data
            .as_object()
            .cloned()
            .unwrap_or_default();

        let mut homework = Vec::new();
        for (date, entries) in days {
            let entries: Vec<HomeworkEntry> = parse_entries("homework", &entries);
            if entries.is_empty() {
                continue;
            }

            let detail = self
                .call_with_session(
                    session,
                    &format!("homework_{}_{}", student.id, date),
                    &format!("Eleves/{}/cahierdetexte/{}.awp?verbe=get", student.id, date),
                    json!({}),
                )
                .await?;
            let subjects: Vec<SubjectDetail> =
                parse_entries("homework_detail", detail.data.get("matieres").unwrap_or(&Value::Null));

            for entry in &entries {
                let subject = subjects.iter().find(|s| s.id == entry.id_devoir);
                homework.push(build_homework(&date, entry, subject, self.config.decode_html));
            }
        }

        homework.sort_by(|a, b| a.date.cmp(&b.date));
        info!(
            category = "fetch",
            student = %student.full_name(),
            count = homework.len(),
            "Homework fetched"
        );
        Ok(homework)
    }

    /// Mark a homework as done, or not done when `done` is false.
    pub async fn set_homework_done(
        &self,
        session: &mut Session,
        student_id: i64,
        homework_id: i64,
        done: bool,
    ) -> Result<()> {
        let payload = if done {
            json!({ "idDevoirsEffectues": [homework_id] })
        } else {
            json!({ "idDevoirsNonEffectues": [homework_id] })
        };

        self.call_with_session(
            session,
            &format!("homework_put_{}", student_id),
            &format!("Eleves/{}/cahierdetexte.awp?verbe=put", student_id),
            payload,
        )
        .await?;

        debug!(category = "fetch", student_id, homework_id, done, "Homework updated");
        Ok(())
    }
}

fn build_homework(
    date: &str,
    entry: &HomeworkEntry,
    detail: Option<&SubjectDetail>,
    decode_html: bool,
) -> Homework {
    let raw = detail
        .and_then(|d| d.a_faire.as_ref())
        .map(|a| text::decode_base64_lenient(&a.contenu))
        .unwrap_or_default();
    let description = if decode_html {
        text::strip_html(&raw)
    } else {
        raw
    };

    Homework {
        id: entry.id_devoir,
        date: date.to_string(),
        subject: entry.matiere.clone(),
        subject_code: entry.code_matiere.clone(),
        short_description: text::truncate_chars(&description, defaults::HOMEWORK_DESC_MAX_LENGTH),
        description,
        done: entry.effectue,
        requires_quiz: entry.interrogation,
        given_on: entry.donne_le.clone(),
        submit_online: entry.rendre_en_ligne,
        max_submit_days: detail.and_then(|d| d.nb_jour_max_rendu_devoir),
    }
}
