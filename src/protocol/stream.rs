//! Stream namespace: live broadcasts with comments, likes, gifts and on-air calls

use serde::{Deserialize, Serialize};

use super::{inbound_event, outbound_event};
use crate::session::ChannelKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinStream {
    pub stream_id: String,
    pub user_id: String,
    pub user_name: String,
    pub is_host: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveStream {
    pub stream_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendComment {
    pub stream_id: String,
    pub user_id: String,
    pub user_name: String,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendLike {
    pub stream_id: String,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendGift {
    pub stream_id: String,
    pub user_id: String,
    pub user_name: String,
    pub gift_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
}

/// Host decision on a viewer's on-air call request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallDecision {
    pub stream_id: String,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostCallAccepted(pub CallDecision);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostCallRejected(pub CallDecision);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostCallEnded {
    pub stream_id: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostMicToggled {
    pub stream_id: String,
    pub is_muted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostCameraToggled {
    pub stream_id: String,
    pub is_camera_off: bool,
}

outbound_event!(JoinStream, ChannelKind::Stream, "join_stream");
outbound_event!(LeaveStream, ChannelKind::Stream, "leave_stream");
outbound_event!(SendComment, ChannelKind::Stream, "send_comment");
outbound_event!(SendLike, ChannelKind::Stream, "send_like");
outbound_event!(SendGift, ChannelKind::Stream, "send_gift");
outbound_event!(HostCallAccepted, ChannelKind::Stream, "call_accepted");
outbound_event!(HostCallRejected, ChannelKind::Stream, "call_rejected");
outbound_event!(HostCallEnded, ChannelKind::Stream, "call_ended");
outbound_event!(HostMicToggled, ChannelKind::Stream, "host_mic_toggled");
outbound_event!(HostCameraToggled, ChannelKind::Stream, "host_camera_toggled");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    #[serde(default)]
    pub stream_id: Option<String>,
    pub user_id: String,
    #[serde(default)]
    pub user_name: Option<String>,
    pub comment: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLike {
    #[serde(default)]
    pub stream_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub total_likes: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGift {
    #[serde(default)]
    pub stream_id: Option<String>,
    pub user_id: String,
    #[serde(default)]
    pub user_name: Option<String>,
    pub gift_id: String,
    #[serde(default)]
    pub gift_name: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerPresence {
    #[serde(default)]
    pub stream_id: Option<String>,
    pub user_id: String,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub viewer_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewerJoined(pub ViewerPresence);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewerLeft(pub ViewerPresence);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerCountUpdated {
    #[serde(default)]
    pub stream_id: Option<String>,
    #[serde(alias = "viewerCount")]
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRequestReceived {
    #[serde(default)]
    pub stream_id: Option<String>,
    pub user_id: String,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub call_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallStarted {
    #[serde(default)]
    pub stream_id: Option<String>,
    pub user_id: String,
    #[serde(default)]
    pub user_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallFinished {
    #[serde(default)]
    pub stream_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub duration: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRequestRejected {
    #[serde(default)]
    pub stream_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

inbound_event!(NewComment, ChannelKind::Stream, "new_comment");
inbound_event!(NewLike, ChannelKind::Stream, "new_like");
inbound_event!(NewGift, ChannelKind::Stream, "new_gift");
inbound_event!(ViewerJoined, ChannelKind::Stream, "viewer_joined");
inbound_event!(ViewerLeft, ChannelKind::Stream, "viewer_left");
inbound_event!(ViewerCountUpdated, ChannelKind::Stream, "viewer_count_updated");
inbound_event!(CallRequestReceived, ChannelKind::Stream, "call_request_received");
inbound_event!(CallStarted, ChannelKind::Stream, "call_started");
inbound_event!(CallFinished, ChannelKind::Stream, "call_finished", "call_ended");
inbound_event!(CallRequestRejected, ChannelKind::Stream, "call_request_rejected");
