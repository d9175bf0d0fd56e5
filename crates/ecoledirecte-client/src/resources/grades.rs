//! Grades, skills evaluations and term averages.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use ecoledirecte_core::{
    Discipline, Evaluation, GeneralAverage, Grade, Result, Session, Skill, Student,
};

use super::{parse_entries, school_year};
use crate::client::EdClient;
use crate::text::{self, lenient_bool, lenient_opt_string, lenient_string};

/// Everything the grades endpoint yields for one student.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GradesReport {
    /// Most recent first.
    pub grades: Vec<Grade>,
    /// Most recent first.
    pub evaluations: Vec<Evaluation>,
    /// Averages of the current term.
    pub disciplines: Vec<Discipline>,
    pub general_average: Option<GeneralAverage>,
    /// Name of the current term, when one is open.
    pub period: Option<String>,
}

/// One term (`periode`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    #[serde(default)]
    pub id_periode: String,
    #[serde(default)]
    pub code_periode: String,
    /// Display name, e.g. `1er Trimestre`.
    #[serde(default)]
    pub periode: String,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub cloture: bool,
    #[serde(default)]
    pub date_debut: String,
    #[serde(default)]
    pub date_fin: String,
    #[serde(default)]
    pub ensemble_matieres: Option<TermSummary>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermSummary {
    #[serde(default)]
    disciplines: Value,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    moyenne_generale: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    moyenne_classe: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    moyenne_min: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    moyenne_max: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    date_calcul: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DisciplineEntry {
    #[serde(default)]
    code_matiere: String,
    #[serde(default)]
    discipline: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    moyenne: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    moyenne_classe: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    moyenne_min: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    moyenne_max: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    coef: Option<String>,
    #[serde(default)]
    professeurs: Vec<Teacher>,
}

#[derive(Debug, Clone, Deserialize)]
struct Teacher {
    #[serde(default)]
    nom: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NoteEntry {
    #[serde(default)]
    id: i64,
    #[serde(default)]
    devoir: String,
    #[serde(default)]
    code_periode: Option<String>,
    #[serde(default)]
    code_matiere: String,
    #[serde(default)]
    libelle_matiere: String,
    #[serde(default, deserialize_with = "lenient_string")]
    coef: String,
    #[serde(default, deserialize_with = "lenient_string")]
    note_sur: String,
    #[serde(default, deserialize_with = "lenient_string")]
    valeur: String,
    #[serde(default, deserialize_with = "lenient_bool")]
    non_significatif: bool,
    #[serde(default)]
    date: String,
    #[serde(default)]
    date_saisie: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    moyenne_classe: String,
    #[serde(default, deserialize_with = "lenient_string")]
    min_classe: String,
    #[serde(default, deserialize_with = "lenient_string")]
    max_classe: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    commentaire: Option<String>,
    #[serde(default)]
    elements_programme: Vec<SkillEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SkillEntry {
    #[serde(default)]
    libelle_competence: String,
    #[serde(default)]
    descriptif: String,
    #[serde(default, deserialize_with = "lenient_string")]
    valeur: String,
}

impl EdClient {
    /// Grades and evaluations of the school year containing `today`, with the
    /// averages of the current term.
    pub async fn fetch_grades(
        &self,
        session: &mut Session,
        student: &Student,
        today: NaiveDate,
    ) -> Result<GradesReport> {
        let envelope = self
            .call_with_session(
                session,
                &format!("grades_{}", student.id),
                &format!("eleves/{}/notes.awp?verbe=get", student.id),
                json!({ "anneeScolaire": school_year(today) }),
            )
            .await?;

        let report = parse_grades(&envelope.data, today, self.config.grades_to_display);
        info!(
            category = "fetch",
            student = %student.full_name(),
            grades = report.grades.len(),
            evaluations = report.evaluations.len(),
            period = report.period.as_deref().unwrap_or("-"),
            "Grades fetched"
        );
        Ok(report)
    }
}

/// The open term containing `today`: not closed, named like a trimester or
/// semester, and with `today` between its bounds.
pub fn select_current_period(periods: &[Period], today: NaiveDate) -> Option<&Period> {
    periods.iter().find(|period| {
        let name = period.periode.to_lowercase();
        let is_term = name.contains("trimestre") || name.contains("semestre");
        let start = NaiveDate::parse_from_str(&period.date_debut, "%Y-%m-%d");
        let end = NaiveDate::parse_from_str(&period.date_fin, "%Y-%m-%d");
        match (start, end) {
            (Ok(start), Ok(end)) => !period.cloture && is_term && start <= today && today <= end,
            _ => false,
        }
    })
}

/// Reshape the `data` of the grades endpoint.
pub fn parse_grades(data: &Value, today: NaiveDate, limit: usize) -> GradesReport {
    let mut report = GradesReport::default();

    let periods: Vec<Period> = parse_entries("periods", data.get("periodes").unwrap_or(&Value::Null));
    if let Some(period) = select_current_period(&periods, today) {
        debug!(category = "fetch", period = %period.periode, "Current term");
        report.period = Some(period.periode.clone());
        if let Some(summary) = &period.ensemble_matieres {
            report.disciplines = parse_entries::<DisciplineEntry>("disciplines", &summary.disciplines)
                .into_iter()
                .map(to_discipline)
                .collect();
            report.general_average = summary.moyenne_generale.as_ref().map(|value| GeneralAverage {
                value: text::normalize_decimal(value),
                class_average: summary.moyenne_classe.as_deref().map(text::normalize_decimal),
                min: summary.moyenne_min.as_deref().map(text::normalize_decimal),
                max: summary.moyenne_max.as_deref().map(text::normalize_decimal),
                computed_at: summary.date_calcul.clone(),
            });
        }
    }

    let mut notes: Vec<NoteEntry> = parse_entries("notes", data.get("notes").unwrap_or(&Value::Null));
    notes.sort_by(|a, b| b.date.cmp(&a.date));

    for note in notes {
        if note.note_sur == "0" {
            if report.evaluations.len() < limit {
                report.evaluations.push(to_evaluation(note));
            }
        } else if report.grades.len() < limit {
            report.grades.push(to_grade(note));
        }
    }

    report
}

fn to_discipline(entry: DisciplineEntry) -> Discipline {
    Discipline {
        code: entry.code_matiere,
        name: entry.discipline,
        average: entry.moyenne.as_deref().map(text::normalize_decimal),
        class_average: entry.moyenne_classe.as_deref().map(text::normalize_decimal),
        min: entry.moyenne_min.as_deref().map(text::normalize_decimal),
        max: entry.moyenne_max.as_deref().map(text::normalize_decimal),
        coefficient: entry.coef.as_deref().map(text::normalize_decimal),
        teachers: entry.professeurs.into_iter().map(|t| t.nom).collect(),
    }
}

fn to_grade(note: NoteEntry) -> Grade {
    Grade {
        id: note.id,
        grade_out_of: text::grade_out_of(&note.valeur, &note.note_sur),
        date: note.date,
        subject: note.code_matiere,
        subject_name: note.libelle_matiere,
        comment: note.devoir,
        value: text::normalize_decimal(&note.valeur),
        out_of: text::normalize_decimal(&note.note_sur),
        coefficient: text::normalize_decimal(&note.coef),
        class_average: text::normalize_decimal(&note.moyenne_classe),
        min: text::normalize_decimal(&note.min_classe),
        max: text::normalize_decimal(&note.max_classe),
        period_code: note.code_periode,
        not_significant: note.non_significatif,
        entered_on: note.date_saisie,
    }
}

fn to_evaluation(note: NoteEntry) -> Evaluation {
    Evaluation {
        id: note.id,
        date: note.date,
        subject: note.code_matiere,
        subject_name: note.libelle_matiere,
        name: note.devoir,
        comment: note.commentaire,
        skills: note
            .elements_programme
            .into_iter()
            .map(|s| Skill {
                level: Skill::level_label(&s.valeur).to_string(),
                name: s.libelle_competence,
                description: s.descriptif,
                value: s.valeur,
            })
            .collect(),
    }
}
