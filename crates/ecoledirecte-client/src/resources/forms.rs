//! Administrative forms (`EDForms`).

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use ecoledirecte_core::{Form, Result, Session};

use super::{parse_entries, school_year};
use crate::client::EdClient;
use crate::text::lenient_string;

#[derive(Debug, Clone, Deserialize)]
struct FormEntry {
    #[serde(default)]
    id: i64,
    #[serde(default)]
    titre: String,
    #[serde(default, deserialize_with = "lenient_string")]
    created: String,
}

impl EdClient {
    pub async fn fetch_forms(&self, session: &mut Session, today: NaiveDate) -> Result<Vec<Form>> {
        let payload = json!({
            "anneeForms": school_year(today),
            "typeEntity": session.account_type.code(),
            "idEntity": session.user_id,
        });
        let envelope = self
            .call_with_session(session, "forms", "edforms.awp?verbe=list", payload)
            .await?;

        let forms = parse_forms(&envelope.data);
        info!(category = "fetch", count = forms.len(), "Forms fetched");
        Ok(forms)
    }
}

pub fn parse_forms(data: &Value) -> Vec<Form> {
    parse_entries::<FormEntry>("forms", data)
        .into_iter()
        .map(|entry| Form {
            id: entry.id,
            title: entry.titre,
            created: entry.created,
        })
        .collect()
}
