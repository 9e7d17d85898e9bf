//! Chat namespace: consultation messages, typing indicators, read receipts

use serde::{Deserialize, Serialize};

use super::{inbound_event, outbound_event};
use crate::session::ChannelKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinSession {
    pub session_id: String,
    pub user_id: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessage {
    pub session_id: String,
    pub sender_id: String,
    pub sender_model: String,
    pub receiver_id: String,
    pub receiver_model: String,
    #[serde(rename = "type")]
    pub message_type: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Typing {
    pub session_id: String,
    pub user_id: String,
    pub is_typing: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkRead {
    pub session_id: String,
    pub user_id: String,
    pub message_ids: Vec<String>,
}

outbound_event!(JoinSession, ChannelKind::Chat, "join_session");
outbound_event!(SendMessage, ChannelKind::Chat, "send_message");
outbound_event!(Typing, ChannelKind::Chat, "typing");
outbound_event!(MarkRead, ChannelKind::Chat, "mark_read");

/// A message persisted by the server and pushed to both participants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub sender_id: Option<String>,
    #[serde(default)]
    pub sender_model: Option<String>,
    #[serde(default, rename = "type")]
    pub message_type: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTyping {
    #[serde(default)]
    pub session_id: Option<String>,
    pub user_id: String,
    pub is_typing: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesRead {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub message_ids: Vec<String>,
}

inbound_event!(NewMessage, ChannelKind::Chat, "new_message");
inbound_event!(UserTyping, ChannelKind::Chat, "user_typing");
inbound_event!(MessagesRead, ChannelKind::Chat, "messages_read");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{InboundEvent, OutboundEvent};
    use serde_json::json;

    #[test]
    fn test_send_message_wire_names() {
        let message = SendMessage {
            session_id: "S1".into(),
            sender_id: "U1".into(),
            sender_model: "User".into(),
            receiver_id: "A9".into(),
            receiver_model: "Astrologer".into(),
            message_type: "text".into(),
            content: "Namaste".into(),
        };

        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["sessionId"], "S1");
        assert_eq!(value["receiverModel"], "Astrologer");
        assert_eq!(value["type"], "text");
        assert_eq!(SendMessage::NAME, "send_message");
        assert_eq!(SendMessage::KIND, ChannelKind::Chat);
    }

    #[test]
    fn test_new_message_accepts_mongo_id() {
        let message: NewMessage = serde_json::from_value(json!({
            "_id": "m-1",
            "sessionId": "S1",
            "senderId": "A9",
            "type": "text",
            "content": "Your chart looks favorable",
            "createdAt": "2024-05-01T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(message.id.as_deref(), Some("m-1"));
        assert_eq!(message.message_type.as_deref(), Some("text"));
        assert_eq!(NewMessage::NAMES, &["new_message"]);
    }

    #[test]
    fn test_mark_read_ids() {
        let value = serde_json::to_value(MarkRead {
            session_id: "S1".into(),
            user_id: "U1".into(),
            message_ids: vec!["m-1".into(), "m-2".into()],
        })
        .unwrap();
        assert_eq!(value["messageIds"], json!(["m-1", "m-2"]));
    }
}
