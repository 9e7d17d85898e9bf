//! Engine.IO v4 / Socket.IO v5 text packet codec
//!
//! A websocket text frame carries one engine packet (`<type digit><data>`).
//! Engine `message` packets wrap one socket packet:
//! `<type digit>[<namespace>,][<ack id>][<json data>]`, with the namespace
//! omitted when it is `/`. Binary attachments are not supported.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PacketError {
    #[error("empty packet")]
    Empty,

    #[error("unknown packet type: {0}")]
    UnknownType(char),

    #[error("binary packets are not supported")]
    BinaryUnsupported,

    #[error("invalid packet data: {0}")]
    InvalidData(String),
}

/// Data of the engine `open` packet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandshakeData {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    /// Milliseconds between server pings
    pub ping_interval: u64,
    /// Milliseconds the server waits for a pong
    pub ping_timeout: u64,
    #[serde(default)]
    pub max_payload: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    Open(HandshakeData),
    Close,
    Ping(String),
    Pong(String),
    Message(String),
    Upgrade,
    Noop,
}

impl EnginePacket {
    pub fn decode(frame: &str) -> Result<Self, PacketError> {
        let first = frame.chars().next().ok_or(PacketError::Empty)?;
        let data = &frame[first.len_utf8()..];

        match first {
            '0' => serde_json::from_str(data)
                .map(EnginePacket::Open)
                .map_err(|e| PacketError::InvalidData(e.to_string())),
            '1' => Ok(EnginePacket::Close),
            '2' => Ok(EnginePacket::Ping(data.to_string())),
            '3' => Ok(EnginePacket::Pong(data.to_string())),
            '4' => Ok(EnginePacket::Message(data.to_string())),
            '5' => Ok(EnginePacket::Upgrade),
            '6' => Ok(EnginePacket::Noop),
            other => Err(PacketError::UnknownType(other)),
        }
    }

    pub fn encode(&self) -> String {
        match self {
            EnginePacket::Open(data) => {
                format!("0{}", serde_json::to_string(data).unwrap_or_default())
            }
            EnginePacket::Close => "1".to_string(),
            EnginePacket::Ping(data) => format!("2{}", data),
            EnginePacket::Pong(data) => format!("3{}", data),
            EnginePacket::Message(data) => format!("4{}", data),
            EnginePacket::Upgrade => "5".to_string(),
            EnginePacket::Noop => "6".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketPacketType {
    Connect,
    Disconnect,
    Event,
    Ack,
    ConnectError,
    BinaryEvent,
    BinaryAck,
}

impl SocketPacketType {
    fn from_char(c: char) -> Result<Self, PacketError> {
        match c {
            '0' => Ok(SocketPacketType::Connect),
            '1' => Ok(SocketPacketType::Disconnect),
            '2' => Ok(SocketPacketType::Event),
            '3' => Ok(SocketPacketType::Ack),
            '4' => Ok(SocketPacketType::ConnectError),
            '5' => Ok(SocketPacketType::BinaryEvent),
            '6' => Ok(SocketPacketType::BinaryAck),
            other => Err(PacketError::UnknownType(other)),
        }
    }

    fn as_char(&self) -> char {
        match self {
            SocketPacketType::Connect => '0',
            SocketPacketType::Disconnect => '1',
            SocketPacketType::Event => '2',
            SocketPacketType::Ack => '3',
            SocketPacketType::ConnectError => '4',
            SocketPacketType::BinaryEvent => '5',
            SocketPacketType::BinaryAck => '6',
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SocketPacket {
    pub packet_type: SocketPacketType,
    pub namespace: String,
    pub ack_id: Option<u64>,
    pub data: Option<serde_json::Value>,
}

impl SocketPacket {
    /// Namespace connect carrying the auth object
    pub fn connect(namespace: &str, auth: serde_json::Value) -> Self {
        Self {
            packet_type: SocketPacketType::Connect,
            namespace: namespace.to_string(),
            ack_id: None,
            data: Some(auth),
        }
    }

    pub fn disconnect(namespace: &str) -> Self {
        Self {
            packet_type: SocketPacketType::Disconnect,
            namespace: namespace.to_string(),
            ack_id: None,
            data: None,
        }
    }

    pub fn event(namespace: &str, event: &str, payload: serde_json::Value) -> Self {
        Self {
            packet_type: SocketPacketType::Event,
            namespace: namespace.to_string(),
            ack_id: None,
            data: Some(serde_json::Value::Array(vec![
                serde_json::Value::String(event.to_string()),
                payload,
            ])),
        }
    }

    pub fn decode(input: &str) -> Result<Self, PacketError> {
        let first = input.chars().next().ok_or(PacketError::Empty)?;
        let packet_type = SocketPacketType::from_char(first)?;
        if matches!(
            packet_type,
            SocketPacketType::BinaryEvent | SocketPacketType::BinaryAck
        ) {
            return Err(PacketError::BinaryUnsupported);
        }

        let mut rest = &input[1..];

        let namespace = if rest.starts_with('/') {
            match rest.find(',') {
                Some(idx) => {
                    let ns = &rest[..idx];
                    rest = &rest[idx + 1..];
                    ns
                }
                None => {
                    let ns = rest;
                    rest = "";
                    ns
                }
            }
        } else {
            "/"
        };

        let digits = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
        let ack_id = if digits > 0 {
            let id = rest[..digits]
                .parse::<u64>()
                .map_err(|e| PacketError::InvalidData(e.to_string()))?;
            rest = &rest[digits..];
            Some(id)
        } else {
            None
        };

        let data = if rest.is_empty() {
            None
        } else {
            Some(
                serde_json::from_str(rest).map_err(|e| PacketError::InvalidData(e.to_string()))?,
            )
        };

        Ok(Self {
            packet_type,
            namespace: namespace.to_string(),
            ack_id,
            data,
        })
    }

    pub fn encode(&self) -> String {
        let mut out = String::new();
        out.push(self.packet_type.as_char());
        if self.namespace != "/" {
            out.push_str(&self.namespace);
            out.push(',');
        }
        if let Some(id) = self.ack_id {
            out.push_str(&id.to_string());
        }
        if let Some(data) = &self.data {
            out.push_str(&data.to_string());
        }
        out
    }

    /// Split an EVENT packet into (name, payload).
    ///
    /// A single argument is returned as-is, several arguments as an array,
    /// none as `null`.
    pub fn event_parts(&self) -> Option<(String, serde_json::Value)> {
        if self.packet_type != SocketPacketType::Event {
            return None;
        }
        let args = self.data.as_ref()?.as_array()?;
        let (name, rest) = args.split_first()?;
        let name = name.as_str()?.to_string();
        let payload = match rest {
            [] => serde_json::Value::Null,
            [single] => single.clone(),
            many => serde_json::Value::Array(many.to_vec()),
        };
        Some((name, payload))
    }

    /// Human-readable reason carried by a CONNECT_ERROR packet
    pub fn error_message(&self) -> String {
        match &self.data {
            Some(serde_json::Value::Object(map)) => map
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("connection refused")
                .to_string(),
            Some(serde_json::Value::String(s)) => s.clone(),
            _ => "connection refused".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_engine_open() {
        let frame = r#"0{"sid":"lv_VI97HAXpY6yYWAAAC","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;
        match EnginePacket::decode(frame).unwrap() {
            EnginePacket::Open(data) => {
                assert_eq!(data.sid, "lv_VI97HAXpY6yYWAAAC");
                assert_eq!(data.ping_interval, 25000);
                assert_eq!(data.ping_timeout, 20000);
            }
            other => panic!("expected open packet, got {:?}", other),
        }
    }

    #[test]
    fn test_engine_ping_pong() {
        assert_eq!(EnginePacket::decode("2").unwrap(), EnginePacket::Ping(String::new()));
        assert_eq!(EnginePacket::Pong(String::new()).encode(), "3");
        assert!(matches!(
            EnginePacket::decode("9"),
            Err(PacketError::UnknownType('9'))
        ));
        assert_eq!(EnginePacket::decode(""), Err(PacketError::Empty));
    }

    #[test]
    fn test_encode_connect_with_auth() {
        let packet = SocketPacket::connect("/chat", json!({"token": "abc"}));
        assert_eq!(packet.encode(), r#"0/chat,{"token":"abc"}"#);
    }

    #[test]
    fn test_encode_event_default_namespace() {
        let packet = SocketPacket::event("/", "typing", json!({"isTyping": true}));
        assert_eq!(packet.encode(), r#"2["typing",{"isTyping":true}]"#);
    }

    #[test]
    fn test_decode_namespaced_event_with_ack() {
        let packet = SocketPacket::decode(r#"2/stream,12["new_comment",{"text":"hi, there"}]"#).unwrap();
        assert_eq!(packet.packet_type, SocketPacketType::Event);
        assert_eq!(packet.namespace, "/stream");
        assert_eq!(packet.ack_id, Some(12));

        let (name, payload) = packet.event_parts().unwrap();
        assert_eq!(name, "new_comment");
        assert_eq!(payload["text"], "hi, there");
    }

    #[test]
    fn test_decode_disconnect_without_trailing_comma() {
        let packet = SocketPacket::decode("1/call").unwrap();
        assert_eq!(packet.packet_type, SocketPacketType::Disconnect);
        assert_eq!(packet.namespace, "/call");
        assert!(packet.data.is_none());
    }

    #[test]
    fn test_connect_error_message() {
        let packet = SocketPacket::decode(r#"4/chat,{"message":"Authentication error"}"#).unwrap();
        assert_eq!(packet.packet_type, SocketPacketType::ConnectError);
        assert_eq!(packet.error_message(), "Authentication error");
    }

    #[test]
    fn test_event_parts_argument_shapes() {
        let none = SocketPacket::decode(r#"2["viewer_count_updated"]"#).unwrap();
        assert_eq!(none.event_parts().unwrap().1, serde_json::Value::Null);

        let many = SocketPacket::decode(r#"2["call_started","S1",42]"#).unwrap();
        assert_eq!(many.event_parts().unwrap().1, json!(["S1", 42]));

        let not_event = SocketPacket::decode(r#"3["ok"]"#).unwrap();
        assert!(not_event.event_parts().is_none());
    }

    #[test]
    fn test_binary_packets_rejected() {
        assert_eq!(
            SocketPacket::decode(r#"51-["upload",{"_placeholder":true,"num":0}]"#),
            Err(PacketError::BinaryUnsupported)
        );
    }
}
