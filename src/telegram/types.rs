use crate::error::{CertbotError, Result};
use log::warn;
use serde::Deserialize;
use serde_json::Value;

/// Hülle jeder Bot-API-Antwort
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i64>,
}

impl<T> ApiResponse<T> {
    pub fn into_result(self) -> Result<T> {
        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            (true, None) => Err(CertbotError::Telegram {
                code: 0,
                description: "response without result".to_string(),
            }),
            (false, _) => Err(CertbotError::Telegram {
                code: self.error_code.unwrap_or_default(),
                description: self
                    .description
                    .unwrap_or_else(|| "unknown error".to_string()),
            }),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

impl Update {
    /// Text der Nachricht, falls vorhanden
    pub fn text(&self) -> Option<&str> {
        self.message.as_ref()?.text.as_deref()
    }

    pub fn chat_id(&self) -> Option<i64> {
        self.message.as_ref().map(|m| m.chat.id)
    }
}

/// Ergebnis eines getUpdates-Aufrufs.
///
/// Jedes Update wird einzeln dekodiert. Ein Eintrag, der nicht passt, wird
/// übersprungen, zählt aber für den Offset, sonst liefert Telegram ihn bei
/// jedem Poll erneut.
#[derive(Debug, Clone, Default)]
pub struct UpdateBatch {
    pub updates: Vec<Update>,
    /// Höchste gesehene `update_id`, auch von übersprungenen Einträgen
    pub last_update_id: Option<i64>,
}

impl UpdateBatch {
    pub fn from_values(values: Vec<Value>) -> Self {
        let mut batch = Self::default();

        for value in values {
            let update_id = value.get("update_id").and_then(Value::as_i64);
            if let Some(id) = update_id {
                batch.last_update_id = Some(batch.last_update_id.map_or(id, |last| last.max(id)));
            }

            match serde_json::from_value::<Update>(value) {
                Ok(update) => batch.updates.push(update),
                Err(e) => warn!("Skipping update {:?}: {}", update_id, e),
            }
        }

        batch
    }

    /// Offset für den nächsten Poll
    pub fn next_offset(&self, offset: i64) -> i64 {
        match self.last_update_id {
            Some(id) => offset.max(id + 1),
            None => offset,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub date: i64,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
    pub username: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_updates() {
        let json = r#"{
            "ok": true,
            "result": [
                {
                    "update_id": 1001,
                    "message": {
                        "message_id": 5,
                        "date": 1700000000,
                        "chat": {"id": 42, "type": "private", "first_name": "Alice"},
                        "from": {"id": 42, "is_bot": false, "first_name": "Alice"},
                        "text": "Alice, 12345"
                    }
                },
                {
                    "update_id": 1002,
                    "edited_message": {"message_id": 5}
                }
            ]
        }"#;

        let response: ApiResponse<Vec<Update>> = serde_json::from_str(json).unwrap();
        let updates = response.into_result().unwrap();

        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].text(), Some("Alice, 12345"));
        assert_eq!(updates[0].chat_id(), Some(42));
        assert_eq!(updates[1].update_id, 1002);
        assert!(updates[1].text().is_none());
    }

    #[test]
    fn test_malformed_update_is_skipped_but_advances_offset() {
        let json = r#"{
            "ok": true,
            "result": [
                {
                    "update_id": 7,
                    "message": {
                        "message_id": 1,
                        "date": 1700000000,
                        "chat": {"id": 42, "type": "private"},
                        "text": "Alice, 1"
                    }
                },
                {
                    "update_id": 8,
                    "message": {"message_id": "not a number", "chat": {}}
                }
            ]
        }"#;

        let response: ApiResponse<Vec<Value>> = serde_json::from_str(json).unwrap();
        let batch = UpdateBatch::from_values(response.into_result().unwrap());

        assert_eq!(batch.updates.len(), 1);
        assert_eq!(batch.updates[0].update_id, 7);
        assert_eq!(batch.last_update_id, Some(8));
        assert_eq!(batch.next_offset(0), 9);
    }

    #[test]
    fn test_empty_batch_keeps_offset() {
        let batch = UpdateBatch::from_values(Vec::new());
        assert!(batch.updates.is_empty());
        assert_eq!(batch.next_offset(12), 12);

        let without_id = UpdateBatch::from_values(vec![serde_json::json!({"message": null})]);
        assert!(without_id.updates.is_empty());
        assert_eq!(without_id.next_offset(12), 12);
    }

    #[test]
    fn test_api_error() {
        let json = r#"{"ok": false, "error_code": 401, "description": "Unauthorized"}"#;
        let response: ApiResponse<Vec<Update>> = serde_json::from_str(json).unwrap();

        match response.into_result() {
            Err(CertbotError::Telegram { code, description }) => {
                assert_eq!(code, 401);
                assert_eq!(description, "Unauthorized");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_ok_without_result() {
        let response: ApiResponse<User> = serde_json::from_str(r#"{"ok": true}"#).unwrap();
        assert!(response.into_result().is_err());
    }
}
