//! Response envelope: `{code, message, token?, data}`.

use serde::Deserialize;
use serde_json::Value;

use ecoledirecte_core::{Error, Result};

/// Success.
pub const CODE_OK: i64 = 200;
/// Double authentication required.
pub const CODE_DOUBLE_AUTH: i64 = 250;

#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    pub code: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    /// Parse a raw body and validate its code.
    ///
    /// `250` is only accepted for calls made without a token, i.e. the
    /// initial login.
    pub fn parse(url: &str, body: &str, token_sent: bool) -> Result<Self> {
        let raw: Value = serde_json::from_str(body).map_err(|e| Error::InvalidResponse {
            url: url.to_string(),
            reason: format!("not JSON ({}): {}", e, preview(body)),
        })?;
        Self::from_value(url, raw, token_sent)
    }

    pub fn from_value(url: &str, raw: Value, token_sent: bool) -> Result<Self> {
        if raw.get("code").is_none() {
            return Err(Error::InvalidResponse {
                url: url.to_string(),
                reason: format!("missing code: {}", preview(&raw.to_string())),
            });
        }
        let envelope: Envelope =
            serde_json::from_value(raw).map_err(|e| Error::InvalidResponse {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        match envelope.code {
            CODE_OK => Ok(envelope),
            CODE_DOUBLE_AUTH if !token_sent => Ok(envelope),
            code => Err(Error::Api {
                url: url.to_string(),
                code,
                message: envelope.message.unwrap_or_default(),
            }),
        }
    }

    pub fn requires_double_auth(&self) -> bool {
        self.code == CODE_DOUBLE_AUTH
    }

    /// The token, when present and non-empty.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }
}

fn preview(body: &str) -> String {
    body.chars().take(200).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ok_envelope() {
        let body = json!({"code": 200, "token": "abc", "message": "", "data": {"x": 1}});
        let env = Envelope::parse("u", &body.to_string(), true).unwrap();
        assert_eq!(env.token(), Some("abc"));
        assert_eq!(env.data["x"], 1);
    }

    #[test]
    fn test_double_auth_only_without_token() {
        let body = json!({"code": 250, "token": "t", "message": "", "data": {}}).to_string();
        assert!(Envelope::parse("u", &body, false)
            .unwrap()
            .requires_double_auth());
        let err = Envelope::parse("u", &body, true).unwrap_err();
        assert_eq!(err.api_code(), Some(250));
    }

    #[test]
    fn test_api_error_keeps_message() {
        let body = json!({"code": 505, "message": "Identifiant et/ou mot de passe invalide !"});
        let err = Envelope::parse("login", &body.to_string(), false).unwrap_err();
        assert!(err.to_string().contains("mot de passe invalide"));
    }

    #[test]
    fn test_rejects_non_json_and_missing_code() {
        assert!(matches!(
            Envelope::parse("u", "<html>maintenance</html>", false),
            Err(Error::InvalidResponse { .. })
        ));
        assert!(matches!(
            Envelope::parse("u", "{\"data\": {}}", false),
            Err(Error::InvalidResponse { .. })
        ));
    }

    #[test]
    fn test_empty_token_ignored() {
        let body = json!({"code": 200, "token": "", "data": []});
        let env = Envelope::parse("u", &body.to_string(), true).unwrap();
        assert_eq!(env.token(), None);
    }
}
