//! New-item detection between two polls.
//!
//! Records are compared by a projection onto a few of their serialized
//! fields. Two different records sharing those fields count as the same, and
//! an edited field outside the projection goes unnoticed.

use serde_json::Value;

use ecoledirecte_core::kinds;

/// A diffed collection: snapshot key suffix, compare keys and event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffRule {
    pub resource: &'static str,
    pub keys: &'static [&'static str],
    pub event: &'static str,
}

const ATTENDANCE_KEYS: &[&str] = &["date", "type_element", "display_date"];

/// Collections diffed for every student.
pub const STUDENT_RULES: &[DiffRule] = &[
    DiffRule {
        resource: "homework",
        keys: &["date", "subject", "short_description"],
        event: kinds::NEW_HOMEWORK,
    },
    DiffRule {
        resource: "grades",
        keys: &["date", "subject", "comment"],
        event: kinds::NEW_GRADE,
    },
    DiffRule {
        resource: "evaluations",
        keys: &["date", "subject", "name"],
        event: kinds::NEW_EVALUATION,
    },
    DiffRule {
        resource: "absences",
        keys: ATTENDANCE_KEYS,
        event: kinds::NEW_ABSENCE,
    },
    DiffRule {
        resource: "lateness",
        keys: ATTENDANCE_KEYS,
        event: kinds::NEW_LATENESS,
    },
    DiffRule {
        resource: "sanctions",
        keys: ATTENDANCE_KEYS,
        event: kinds::NEW_SANCTION,
    },
    DiffRule {
        resource: "commendations",
        keys: ATTENDANCE_KEYS,
        event: kinds::NEW_COMMENDATION,
    },
];

/// Account-level forms.
pub const FORMS_RULE: DiffRule = DiffRule {
    resource: "forms",
    keys: &["created", "title"],
    event: kinds::NEW_FORM,
};

fn project<'a>(record: &'a Value, keys: &[&str]) -> Vec<&'a Value> {
    keys.iter()
        .map(|key| record.get(*key).unwrap_or(&Value::Null))
        .collect()
}

/// Records of `current` whose projection on `keys` matches no record of
/// `previous`, in `current` order.
pub fn new_items(previous: &[Value], current: &[Value], keys: &[&str]) -> Vec<Value> {
    let seen: Vec<Vec<&Value>> = previous.iter().map(|r| project(r, keys)).collect();
    current
        .iter()
        .filter(|record| {
            let projection = project(record, keys);
            !seen.iter().any(|p| *p == projection)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const KEYS: &[&str] = &["date", "subject", "comment"];

    #[test]
    fn test_emits_only_unseen_projection() {
        let previous = vec![json!({"date": "2024-05-01", "subject": "MATH", "comment": "Quiz"})];
        let current = vec![
            json!({"date": "2024-05-01", "subject": "MATH", "comment": "Quiz"}),
            json!({"date": "2024-05-02", "subject": "MATH", "comment": "Test"}),
        ];

        let new = new_items(&previous, &current, KEYS);
        assert_eq!(new.len(), 1);
        assert_eq!(new[0]["comment"], "Test");
    }

    #[test]
    fn test_same_input_emits_nothing() {
        let records = vec![
            json!({"date": "2024-05-01", "subject": "MATH", "comment": "Quiz", "value": "12"}),
            json!({"date": "2024-05-03", "subject": "FRAN", "comment": "Dictée", "value": "9"}),
        ];
        assert!(new_items(&records, &records, KEYS).is_empty());
    }

    #[test]
    fn test_fields_outside_projection_ignored() {
        let previous = vec![json!({"date": "2024-05-01", "subject": "MATH", "comment": "Quiz", "value": "12"})];
        let current = vec![json!({"date": "2024-05-01", "subject": "MATH", "comment": "Quiz", "value": "15"})];
        assert!(new_items(&previous, &current, KEYS).is_empty());
    }

    #[test]
    fn test_missing_field_projects_to_null() {
        let previous = vec![json!({"date": "2024-05-01", "subject": "MATH"})];
        let current = vec![
            json!({"date": "2024-05-01", "subject": "MATH", "comment": null}),
            json!({"date": "2024-05-01", "subject": "MATH", "comment": "x"}),
        ];
        assert_eq!(new_items(&previous, &current, KEYS).len(), 1);
    }

    #[test]
    fn test_empty_previous_returns_everything() {
        let current = vec![json!({"date": "2024-05-01", "subject": "MATH", "comment": "Quiz"})];
        assert_eq!(new_items(&[], &current, KEYS), current);
    }
}
