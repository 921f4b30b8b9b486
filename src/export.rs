//! Transcript export artifact and its reconstruction

use crate::error::{ChatError, ChatResult};
use crate::events::{ConversationRole, Message};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Serializable snapshot of a transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptExport {
    pub export_date: String,
    pub messages: Vec<ExportedMessage>,
}

/// One message as written to an export file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedMessage {
    pub from: ConversationRole,
    pub content: String,
    pub timestamp: String,
}

/// ISO-8601 in UTC with millisecond precision (`2025-01-31T12:00:00.000Z`)
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// File name offered for an export taken at `at`
pub fn export_file_name(at: DateTime<Utc>) -> String {
    format!("docker-k8s-chat-{}.json", at.format("%Y-%m-%d"))
}

impl TranscriptExport {
    /// Snapshot `messages`, stamping the export with `exported_at`.
    pub fn capture(messages: &[Message], exported_at: DateTime<Utc>) -> Self {
        Self {
            export_date: iso_timestamp(exported_at),
            messages: messages
                .iter()
                .map(|message| ExportedMessage {
                    from: message.role(),
                    content: message.content().to_string(),
                    timestamp: iso_timestamp(message.created_at()),
                })
                .collect(),
        }
    }

    pub fn to_json(&self) -> ChatResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> ChatResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Rebuild messages in export order. Ids are freshly generated.
    pub fn to_messages(&self) -> ChatResult<Vec<Message>> {
        self.messages
            .iter()
            .map(|exported| {
                let created_at = DateTime::parse_from_rfc3339(&exported.timestamp)
                    .map_err(|_| ChatError::InvalidTimestamp {
                        value: exported.timestamp.clone(),
                    })?
                    .with_timezone(&Utc);
                Ok(Message::restore(
                    exported.content.clone(),
                    exported.from == ConversationRole::User,
                    created_at,
                ))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Vec<Message> {
        let at = Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap();
        vec![
            Message::restore("welcome", false, at),
            Message::restore("kubectl get pods", true, at),
            Message::restore("Try:\n```\nkubectl get pods -A\n```\n  — ünïcödé ✓", false, at),
        ]
    }

    #[test]
    fn capture_uses_export_labels_and_iso_timestamps() {
        let at = Utc.with_ymd_and_hms(2025, 3, 15, 0, 0, 0).unwrap();
        let export = TranscriptExport::capture(&sample(), at);

        assert_eq!(export.export_date, "2025-03-15T00:00:00.000Z");
        assert_eq!(export.messages[0].from, ConversationRole::Assistant);
        assert_eq!(export.messages[1].from, ConversationRole::User);
        assert_eq!(export.messages[1].timestamp, "2025-03-14T09:26:53.000Z");
    }

    #[test]
    fn json_field_names_match_artifact() {
        let export = TranscriptExport::capture(&sample(), Utc::now());
        let value: serde_json::Value = serde_json::from_str(&export.to_json().unwrap()).unwrap();

        assert!(value.get("exportDate").is_some());
        let first = &value["messages"][1];
        assert_eq!(first["from"], "User");
        assert_eq!(first["content"], "kubectl get pods");
        assert!(first["timestamp"].is_string());
    }

    #[test]
    fn reconstruction_preserves_content_order_and_time() {
        let original = sample();
        let export = TranscriptExport::capture(&original, Utc::now());
        let parsed = TranscriptExport::from_json(&export.to_json().unwrap()).unwrap();
        let rebuilt = parsed.to_messages().unwrap();

        assert_eq!(rebuilt.len(), original.len());
        for (before, after) in original.iter().zip(&rebuilt) {
            assert_eq!(before.content(), after.content());
            assert_eq!(before.from_user(), after.from_user());
            assert_eq!(before.created_at(), after.created_at());
        }
    }

    #[test]
    fn bad_timestamp_is_reported() {
        let export = TranscriptExport {
            export_date: "2025-01-01T00:00:00.000Z".into(),
            messages: vec![ExportedMessage {
                from: ConversationRole::User,
                content: "hi".into(),
                timestamp: "yesterday".into(),
            }],
        };
        match export.to_messages() {
            Err(ChatError::InvalidTimestamp { value }) => assert_eq!(value, "yesterday"),
            other => panic!("expected invalid timestamp, got {other:?}"),
        }
    }

    #[test]
    fn file_name_carries_calendar_date() {
        let at = Utc.with_ymd_and_hms(2025, 1, 9, 23, 59, 0).unwrap();
        assert_eq!(export_file_name(at), "docker-k8s-chat-2025-01-09.json");
    }
}
