//! Domain events fired when new items show up.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name under which every event is published to external consumers.
pub const EVENT_TYPE: &str = "ecole_directe_event";

/// Event kinds.
pub mod kinds {
    pub const NEW_QCM: &str = "new_qcm";
    pub const NEW_HOMEWORK: &str = "new_homework";
    pub const NEW_GRADE: &str = "new_grade";
    pub const NEW_EVALUATION: &str = "new_evaluations";
    pub const NEW_ABSENCE: &str = "new_absence";
    pub const NEW_LATENESS: &str = "new_retard";
    pub const NEW_SANCTION: &str = "new_sanction";
    pub const NEW_COMMENDATION: &str = "new_encouragement";
    pub const NEW_FORM: &str = "new_formulaires";
}

/// Payload of an `ecole_directe_event`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EcoleDirecteEvent {
    /// Full name of the student, empty for account-level events.
    pub child_name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: serde_json::Value,
}

impl EcoleDirecteEvent {
    pub fn new(
        child_name: impl Into<String>,
        kind: impl Into<String>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            child_name: child_name.into(),
            kind: kind.into(),
            data,
        }
    }

    /// A QCM question was seen for the first time and recorded.
    pub fn new_qcm(username: &str, question: &str) -> Self {
        Self::new(
            "",
            kinds::NEW_QCM,
            serde_json::json!({
                "device_id": format!("ED - {}", username),
                "question": question,
            }),
        )
    }

    pub fn is_qcm(&self) -> bool {
        self.kind == kinds::NEW_QCM
    }
}

/// Metadata attached to every published event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMetadata {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Component that fired the event, e.g. `auth` or `coordinator`.
    pub source: String,
}

impl EventMetadata {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_type_field() {
        let event = EcoleDirecteEvent::new(
            "Marie Dupont",
            kinds::NEW_GRADE,
            serde_json::json!({"subject": "MATH"}),
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "new_grade");
        assert_eq!(json["child_name"], "Marie Dupont");
        assert_eq!(json["data"]["subject"], "MATH");
    }

    #[test]
    fn test_kind_wire_names() {
        let expected = [
            (kinds::NEW_HOMEWORK, "new_homework"),
            (kinds::NEW_GRADE, "new_grade"),
            (kinds::NEW_EVALUATION, "new_evaluations"),
            (kinds::NEW_ABSENCE, "new_absence"),
            (kinds::NEW_LATENESS, "new_retard"),
            (kinds::NEW_SANCTION, "new_sanction"),
            (kinds::NEW_COMMENDATION, "new_encouragement"),
            (kinds::NEW_FORM, "new_formulaires"),
            (kinds::NEW_QCM, "new_qcm"),
        ];
        for (kind, wire) in expected {
            let event = EcoleDirecteEvent::new("", kind, serde_json::json!({}));
            assert_eq!(serde_json::to_value(&event).unwrap()["type"], wire);
        }
    }

    #[test]
    fn test_new_qcm_payload() {
        let event = EcoleDirecteEvent::new_qcm("jdupont", "Quelle est votre ville de naissance ?");
        assert!(event.is_qcm());
        assert_eq!(event.child_name, "");
        assert_eq!(event.data["device_id"], "ED - jdupont");
        assert_eq!(event.data["question"], "Quelle est votre ville de naissance ?");
    }
}
