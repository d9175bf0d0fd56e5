//! Mailbox counters.

use chrono::NaiveDate;
use serde_json::{json, Value};
use tracing::info;

use ecoledirecte_core::{MailboxSummary, Result, Session, Student};

use super::school_year;
use crate::client::EdClient;
use crate::text::value_to_string;

const MAILBOX_QUERY: &str = "force=false&typeRecuperation=received&idClasseur=0&orderBy=date\
&order=desc&query=&onlyRead=&page=0&itemsPerPage=100&getAll=0&verbe=get";

impl EdClient {
    /// Counters of the family mailbox, or of a student's when `student` is set.
    pub async fn fetch_mailbox(
        &self,
        session: &mut Session,
        student: Option<&Student>,
        today: NaiveDate,
    ) -> Result<MailboxSummary> {
        let (label, path) = match student {
            Some(student) => (
                format!("mailbox_student_{}", student.id),
                format!("eleves/{}/messages.awp?{}", student.id, MAILBOX_QUERY),
            ),
            None => (
                format!("mailbox_family_{}", session.user_id),
                format!("familles/{}/messages.awp?{}", session.user_id, MAILBOX_QUERY),
            ),
        };

        let envelope = self
            .call_with_session(
                session,
                &label,
                &path,
                json!({ "anneeMessages": school_year(today) }),
            )
            .await?;

        let summary = parse_mailbox(&envelope.data);
        info!(
            category = "fetch",
            owner = %student.map(Student::full_name).unwrap_or_else(|| "family".into()),
            received = summary.received,
            unread = summary.unread,
            "Mailbox fetched"
        );
        Ok(summary)
    }
}

/// Read the counters from `pagination`, or from `data` itself on older payloads.
pub fn parse_mailbox(data: &Value) -> MailboxSummary {
    let source = data
        .get("pagination")
        .filter(|p| p.is_object())
        .unwrap_or(data);

    let count = |field: &str| -> u64 {
        source
            .get(field)
            .and_then(value_to_string)
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    };

    MailboxSummary {
        received: count("messagesRecusCount"),
        sent: count("messagesEnvoyesCount"),
        archived: count("messagesArchivesCount"),
        unread: count("messagesRecusNotReadCount"),
        drafts: count("messagesDraftCount"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_from_pagination() {
        let data = json!({
            "messages": {"received": []},
            "pagination": {
                "messagesRecusCount": 42, "messagesEnvoyesCount": 3,
                "messagesArchivesCount": 7, "messagesRecusNotReadCount": "2",
                "messagesDraftCount": 0
            }
        });
        assert_eq!(
            parse_mailbox(&data),
            MailboxSummary { received: 42, sent: 3, archived: 7, unread: 2, drafts: 0 }
        );
    }

    #[test]
    fn test_counts_fallback_to_data() {
        let data = json!({"messagesRecusCount": 5, "messagesRecusNotReadCount": 1});
        let summary = parse_mailbox(&data);
        assert_eq!(summary.received, 5);
        assert_eq!(summary.unread, 1);
        assert_eq!(summary.sent, 0);
    }
}
