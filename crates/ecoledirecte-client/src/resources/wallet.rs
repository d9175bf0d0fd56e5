//! Wallet balances (`situation financière`).

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use ecoledirecte_core::{Result, Session, Wallet};

use super::parse_entries;
use crate::client::EdClient;
use crate::text::{self, lenient_opt_i64, lenient_string};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountEntry {
    #[serde(default)]
    id: i64,
    #[serde(default)]
    libelle: String,
    #[serde(default, deserialize_with = "lenient_string")]
    solde: String,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    id_eleve: Option<i64>,
}

impl EdClient {
    pub async fn fetch_wallets(&self, session: &mut Session) -> Result<Vec<Wallet>> {
        let envelope = self
            .call_with_session(session, "wallets", "comptes/sansdetails.awp?verbe=get", json!({}))
            .await?;

        let wallets = parse_wallets(&envelope.data);
        info!(category = "fetch", count = wallets.len(), "Wallets fetched");
        Ok(wallets)
    }
}

pub fn parse_wallets(data: &Value) -> Vec<Wallet> {
    parse_entries::<AccountEntry>("wallets", data.get("comptes").unwrap_or(&Value::Null))
        .into_iter()
        .map(|entry| Wallet {
            id: entry.id,
            label: entry.libelle,
            balance: if entry.solde.is_empty() {
                "0".to_string()
            } else {
                text::normalize_decimal(&entry.solde)
            },
            student_id: entry.id_eleve.filter(|id| *id != 0),
        })
        .collect()
}
