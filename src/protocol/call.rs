//! Call namespace: one-to-one voice/video consultation signaling

use serde::{Deserialize, Serialize};

use super::{inbound_event, outbound_event};
use crate::session::ChannelKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoom {
    pub session_id: String,
    pub user_id: String,
    pub role: String,
}

/// Periodic link quality report from the local participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkQuality {
    pub session_id: String,
    pub user_id: String,
    pub quality: u8,
}

outbound_event!(JoinRoom, ChannelKind::Call, "join_room");
outbound_event!(NetworkQuality, ChannelKind::Call, "network_quality");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingCall {
    pub session_id: String,
    #[serde(default)]
    pub caller_id: Option<String>,
    #[serde(default)]
    pub caller_name: Option<String>,
    #[serde(default)]
    pub call_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallAccepted {
    pub session_id: String,
    #[serde(default)]
    pub accepted_by: Option<String>,
}

/// Final call summary; billing is confirmed separately over REST
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallEnded {
    pub session_id: String,
    /// Seconds
    #[serde(default)]
    pub duration: Option<u64>,
    #[serde(default)]
    pub total_amount: Option<f64>,
    #[serde(default)]
    pub reason: Option<String>,
}

inbound_event!(IncomingCall, ChannelKind::Call, "incoming_call");
inbound_event!(CallAccepted, ChannelKind::Call, "call_accepted");
inbound_event!(CallEnded, ChannelKind::Call, "call_ended");
