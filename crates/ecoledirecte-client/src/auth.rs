//! Login and the QCM double authentication.

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use ecoledirecte_core::{AccountType, EcoleDirecteEvent, Error, Result, Session, Student};

use crate::client::EdClient;
use crate::text::{self, lenient_opt_i64};

const LOGIN_PATH: &str = "login.awp";
const QCM_GET_PATH: &str = "connexion/doubleauth.awp?verbe=get";
const QCM_POST_PATH: &str = "connexion/doubleauth.awp?verbe=post";

/// Proof of a solved QCM, sent back with the second login.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DoubleAuthProof {
    pub cn: String,
    pub cv: String,
}

#[derive(Debug, Deserialize)]
struct QcmChallenge {
    question: String,
    #[serde(default)]
    propositions: Vec<String>,
}

impl EdClient {
    /// Log in with the configured credentials.
    ///
    /// A device the API does not know yet gets a QCM challenge first, answered
    /// from the answer table. [`Error::Qcm`] means the table needs a human edit.
    pub async fn login(&self) -> Result<Session> {
        let login = self
            .call("login", LOGIN_PATH, self.login_payload(None), None)
            .await?;

        let login = if login.requires_double_auth() {
            let token = login
                .token()
                .ok_or_else(|| Error::Auth("double authentication without token".into()))?
                .to_string();
            info!(category = "auth", "Double authentication required");

            let proof = self.solve_qcm(&token).await?;
            debug!(category = "auth", cn = %proof.cn, "QCM solved, logging in again");

            let relogin = self
                .call("login_fa", LOGIN_PATH, self.login_payload(Some(&proof)), None)
                .await?;
            if relogin.requires_double_auth() {
                return Err(Error::Auth(
                    "double authentication still required after QCM".into(),
                ));
            }
            relogin
        } else {
            login
        };

        let token = login
            .token()
            .ok_or_else(|| Error::Auth("login response without token".into()))?;
        let session = parse_session(token, &login.data)?;

        info!(
            category = "auth",
            identifier = %session.identifier,
            account_type = session.account_type.code(),
            students = session.students.len(),
            "Connection OK"
        );
        Ok(session)
    }

    /// Whether the credentials are accepted.
    ///
    /// Running out of QCM attempts still proves the password right, so it
    /// counts as valid.
    pub async fn check_credentials(&self) -> Result<bool> {
        match self.login().await {
            Ok(_) => Ok(true),
            Err(e) if e.is_qcm() => {
                warn!(category = "auth", error = %e, "Credentials OK, QCM file needs editing");
                Ok(true)
            }
            Err(Error::Api { code, message, .. }) => {
                warn!(category = "auth", code, message = %message, "Credentials rejected");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    fn login_payload(&self, proof: Option<&DoubleAuthProof>) -> Value {
        let mut payload = json!({
            "identifiant": self.config.username,
            "motdepasse": self.config.password,
            "isRelogin": false,
            "uuid": "",
        });
        if let Some(proof) = proof {
            payload["fa"] = json!([{ "cn": proof.cn, "cv": proof.cv }]);
        }
        payload
    }

    /// Run the bounded QCM loop. Every pass that does not end in an accepted
    /// answer consumes one attempt.
    async fn solve_qcm(&self, token: &str) -> Result<DoubleAuthProof> {
        let mut table = self.qcm.open()?;
        let mut attempts = self.config.qcm_attempts;

        while attempts > 0 {
            attempts -= 1;

            let challenge = self.qcm_challenge(token).await?;
            let question = text::decode_base64(&challenge.question)?;

            if let Some(answer) = table.accepted_answer(&question) {
                match self.qcm_submit(token, answer).await? {
                    Some(proof) => return Ok(proof),
                    None => {
                        warn!(
                            category = "qcm",
                            question = %question,
                            file = %self.qcm.path().display(),
                            "QCM answer rejected, check the QCM file"
                        );
                    }
                }
            } else if let Some(answers) = table.answers(&question) {
                debug!(
                    category = "qcm",
                    question = %question,
                    answers = answers.len(),
                    "QCM question not resolved yet, skipping"
                );
            } else {
                let candidates = challenge
                    .propositions
                    .iter()
                    .map(|p| text::decode_base64(p))
                    .collect::<Result<Vec<_>>>()?;
                info!(
                    category = "qcm",
                    question = %question,
                    candidates = candidates.len(),
                    "New QCM question recorded"
                );
                table.record(question.clone(), candidates);
                table.commit()?;
                self.events.publish(
                    EcoleDirecteEvent::new_qcm(&self.config.username, &question),
                    "auth",
                );
            }
        }

        Err(Error::Qcm(format!(
            "no accepted answer after {} attempts, edit {} and keep one answer per question",
            self.config.qcm_attempts,
            self.qcm.path().display()
        )))
    }

    async fn qcm_challenge(&self, token: &str) -> Result<QcmChallenge> {
        let envelope = self
            .call("qcm_get", QCM_GET_PATH, json!({}), Some(token))
            .await?;
        serde_json::from_value(envelope.data)
            .map_err(|e| Error::Schema(format!("QCM challenge: {}", e)))
    }

    async fn qcm_submit(&self, token: &str, answer: &str) -> Result<Option<DoubleAuthProof>> {
        let envelope = self
            .call(
                "qcm_post",
                QCM_POST_PATH,
                json!({ "choix": text::encode_base64(answer) }),
                Some(token),
            )
            .await?;
        Ok(serde_json::from_value(envelope.data).ok())
    }
}

#[derive(Debug, Deserialize)]
struct LoginData {
    #[serde(default)]
    accounts: Vec<Account>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Account {
    id: i64,
    #[serde(default)]
    identifiant: String,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    id_login: Option<i64>,
    #[serde(default)]
    type_compte: String,
    #[serde(default)]
    nom_etablissement: Option<String>,
    #[serde(default)]
    prenom: String,
    #[serde(default)]
    nom: String,
    #[serde(default)]
    modules: Vec<ModuleFlag>,
    #[serde(default)]
    profile: Profile,
}

#[derive(Debug, Deserialize)]
struct ModuleFlag {
    code: String,
    #[serde(default)]
    enable: bool,
}

#[derive(Debug, Default, Deserialize)]
struct Profile {
    #[serde(default)]
    classe: Option<Classe>,
    #[serde(default)]
    eleves: Vec<Eleve>,
}

#[derive(Debug, Deserialize)]
struct Classe {
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    id: Option<i64>,
    #[serde(default)]
    libelle: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Eleve {
    id: i64,
    #[serde(default)]
    prenom: String,
    #[serde(default)]
    nom: String,
    #[serde(default)]
    classe: Option<Classe>,
    #[serde(default)]
    modules: Vec<ModuleFlag>,
}

fn enabled(modules: &[ModuleFlag]) -> Vec<String> {
    modules
        .iter()
        .filter(|m| m.enable)
        .map(|m| m.code.clone())
        .collect()
}

/// Build the session from the `data` of a successful login.
pub fn parse_session(token: &str, data: &Value) -> Result<Session> {
    let login: LoginData = serde_json::from_value(data.clone())
        .map_err(|e| Error::Schema(format!("login payload: {}", e)))?;
    let account = login
        .accounts
        .into_iter()
        .next()
        .ok_or_else(|| Error::Schema("login payload has no account".into()))?;

    let account_type = AccountType::from_code(&account.type_compte);
    let modules = enabled(&account.modules);
    let establishment = account.nom_etablissement.clone();

    let students = match account_type {
        AccountType::Student => {
            let classe = account.profile.classe.as_ref();
            vec![Student {
                id: account.id,
                first_name: account.prenom.clone(),
                last_name: account.nom.clone(),
                class_id: classe.and_then(|c| c.id),
                class_name: classe.and_then(|c| c.libelle.clone()),
                establishment: establishment.clone(),
                modules: modules.clone(),
            }]
        }
        _ => account
            .profile
            .eleves
            .iter()
            .map(|eleve| Student {
                id: eleve.id,
                first_name: eleve.prenom.clone(),
                last_name: eleve.nom.clone(),
                class_id: eleve.classe.as_ref().and_then(|c| c.id),
                class_name: eleve.classe.as_ref().and_then(|c| c.libelle.clone()),
                establishment: establishment.clone(),
                modules: enabled(&eleve.modules),
            })
            .collect(),
    };

    Ok(Session {
        token: token.to_string(),
        user_id: account.id,
        login_id: account.id_login,
        identifier: account.identifiant,
        account_type,
        establishment,
        modules,
        students,
    })
}
