//! Scripted transport and payload fixtures for tests.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use ecoledirecte_core::{Error, Result};

use crate::transport::{ApiRequest, Transport};

#[derive(Debug, Clone)]
enum Reply {
    Body(String),
    Fail(String),
}

#[derive(Debug)]
struct Route {
    pattern: String,
    replies: VecDeque<Reply>,
}

/// Transport answering from scripted routes.
///
/// A request goes to the first route whose pattern is a substring of its URL.
/// Replies queued on a route are consumed in order; the last one repeats.
#[derive(Debug, Default)]
pub struct MockTransport {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a JSON reply for URLs containing `pattern`.
    pub fn respond(&self, pattern: &str, body: Value) -> &Self {
        self.push(pattern, Reply::Body(body.to_string()))
    }

    /// Queue a raw body, e.g. an HTML error page.
    pub fn respond_raw(&self, pattern: &str, body: &str) -> &Self {
        self.push(pattern, Reply::Body(body.to_string()))
    }

    /// Queue a transport failure.
    pub fn fail(&self, pattern: &str, reason: &str) -> &Self {
        self.push(pattern, Reply::Fail(reason.to_string()))
    }

    /// Drop every reply queued for `pattern`.
    pub fn clear(&self, pattern: &str) {
        self.routes.lock().retain(|route| route.pattern != pattern);
    }

    fn push(&self, pattern: &str, reply: Reply) -> &Self {
        let mut routes = self.routes.lock();
        match routes.iter_mut().find(|r| r.pattern == pattern) {
            Some(route) => route.replies.push_back(reply),
            None => routes.push(Route {
                pattern: pattern.to_string(),
                replies: VecDeque::from([reply]),
            }),
        }
        self
    }

    /// Every request sent so far.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    /// Requests whose URL contains `pattern`.
    pub fn requests_to(&self, pattern: &str) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.url.contains(pattern))
            .cloned()
            .collect()
    }

    pub fn request_count(&self, pattern: &str) -> usize {
        self.requests_to(pattern).len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &ApiRequest) -> Result<String> {
        self.requests.lock().push(request.clone());

        let reply = {
            let mut routes = self.routes.lock();
            let route = routes
                .iter_mut()
                .find(|r| request.url.contains(&r.pattern) && !r.replies.is_empty())
                .ok_or_else(|| Error::Transport(format!("no scripted reply for {}", request.url)))?;
            if route.replies.len() > 1 {
                route.replies.pop_front()
            } else {
                route.replies.front().cloned()
            }
        };

        match reply {
            Some(Reply::Body(body)) => Ok(body),
            Some(Reply::Fail(reason)) => Err(Error::Transport(reason)),
            None => Err(Error::Transport(format!("no scripted reply for {}", request.url))),
        }
    }
}

/// Envelope and payload builders.
pub mod fixtures {
    use serde_json::{json, Value};

    use crate::text::encode_base64;

    pub const TOKEN: &str = "token-1";

    pub fn ok(data: Value) -> Value {
        ok_with_token(data, TOKEN)
    }

    pub fn ok_with_token(data: Value, token: &str) -> Value {
        json!({"code": 200, "token": token, "message": "", "data": data})
    }

    pub fn double_auth(token: &str) -> Value {
        json!({"code": 250, "token": token, "message": "", "data": {}})
    }

    pub fn api_error(code: i64, message: &str) -> Value {
        json!({"code": code, "token": "", "message": message, "data": {}})
    }

    fn modules(codes: &[&str]) -> Value {
        Value::Array(
            codes
                .iter()
                .map(|code| json!({"code": code, "enable": true}))
                .chain(std::iter::once(json!({"code": "CLOUD", "enable": false})))
                .collect(),
        )
    }

    /// Family account login with the given `(id, first name, last name)`
    /// children, every module enabled.
    pub fn family_login(children: &[(i64, &str, &str)]) -> Value {
        let all = [
            "CAHIER_DE_TEXTES",
            "NOTES",
            "EDT",
            "VIE_SCOLAIRE",
            "MESSAGERIE",
            "EDFORMS",
            "SITUATION_FINANCIERE",
        ];
        let eleves: Vec<Value> = children
            .iter()
            .map(|(id, first, last)| {
                json!({
                    "id": id, "prenom": first, "nom": last,
                    "classe": {"id": 17, "libelle": "4ème B"},
                    "modules": modules(&all[..5]),
                })
            })
            .collect();

        ok(json!({"accounts": [{
            "id": 900, "identifiant": "famille.dupont", "idLogin": 4242, "typeCompte": "1",
            "nomEtablissement": "Collège Jean Moulin", "prenom": "Claire", "nom": "Dupont",
            "modules": modules(&all),
            "profile": {"eleves": eleves}
        }]}))
    }

    /// Student account login.
    pub fn student_login(id: i64, first: &str, last: &str, module_codes: &[&str]) -> Value {
        ok(json!({"accounts": [{
            "id": id, "identifiant": "eleve", "idLogin": 1, "typeCompte": "E",
            "nomEtablissement": "Lycée Victor Hugo", "prenom": first, "nom": last,
            "modules": modules(module_codes),
            "profile": {"classe": {"id": 3, "libelle": "2nde 4"}}
        }]}))
    }

    pub fn qcm_challenge(question: &str, propositions: &[&str]) -> Value {
        ok(json!({
            "question": encode_base64(question),
            "propositions": propositions.iter().map(|p| encode_base64(p)).collect::<Vec<_>>(),
        }))
    }

    pub fn qcm_accepted(cn: &str, cv: &str) -> Value {
        ok(json!({"cn": cn, "cv": cv}))
    }

    pub fn qcm_rejected() -> Value {
        ok(json!({}))
    }
}
