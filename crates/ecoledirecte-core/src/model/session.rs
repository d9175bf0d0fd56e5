//! Authenticated session and the students it gives access to.

use serde::{Deserialize, Serialize};

/// Module codes used to decide which resources are fetched.
pub mod modules {
    pub const HOMEWORK: &str = "CAHIER_DE_TEXTES";
    pub const GRADES: &str = "NOTES";
    pub const TIMETABLE: &str = "EDT";
    pub const ATTENDANCE: &str = "VIE_SCOLAIRE";
    pub const MESSAGING: &str = "MESSAGERIE";
    pub const FORMS: &str = "EDFORMS";
    pub const WALLET: &str = "SITUATION_FINANCIERE";
}

/// Kind of account that logged in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    /// `"E"`: the student logs in directly.
    Student,
    /// `"1"`: a parent account with one or more children.
    Family,
    /// `"P"`: teacher account.
    Professor,
    Other(String),
}

impl AccountType {
    /// Map the API `typeCompte` code.
    pub fn from_code(code: &str) -> Self {
        match code {
            "E" => Self::Student,
            "1" => Self::Family,
            "P" => Self::Professor,
            other => Self::Other(other.to_string()),
        }
    }

    /// The API `typeCompte` code.
    pub fn code(&self) -> &str {
        match self {
            Self::Student => "E",
            Self::Family => "1",
            Self::Professor => "P",
            Self::Other(code) => code,
        }
    }
}

/// A student reachable from the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub class_id: Option<i64>,
    pub class_name: Option<String>,
    pub establishment: Option<String>,
    /// Codes of the enabled modules only.
    pub modules: Vec<String>,
}

impl Student {
    /// `"First Last"`.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Lower-case identifier used to prefix snapshot keys, e.g. `marie_claire_dupont`.
    pub fn key(&self) -> String {
        format!(
            "{}_{}",
            sanitize_name(&self.first_name),
            sanitize_name(&self.last_name)
        )
    }

    pub fn has_module(&self, code: &str) -> bool {
        self.modules.iter().any(|m| m == code)
    }
}

fn sanitize_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphabetic() { c } else { '_' })
        .collect()
}

/// An authenticated Ecole Directe session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Value of the `X-Token` header; replaced whenever a response carries a new one.
    #[serde(skip_serializing)]
    pub token: String,
    pub user_id: i64,
    pub login_id: Option<i64>,
    /// The login name (`identifiant`).
    pub identifier: String,
    pub account_type: AccountType,
    pub establishment: Option<String>,
    pub modules: Vec<String>,
    pub students: Vec<Student>,
}

impl Session {
    pub fn has_module(&self, code: &str) -> bool {
        self.modules.iter().any(|m| m == code)
    }

    pub fn is_family(&self) -> bool {
        self.account_type == AccountType::Family
    }

    /// Keep the token fresh when the API rotates it.
    pub fn update_token(&mut self, token: Option<&str>) {
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            self.token = token.to_string();
        }
    }
}
