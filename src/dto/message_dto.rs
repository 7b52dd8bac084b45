use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dto::{draft_dto::DraftState, player_dto::Player};

/// Raw `{type, data}` frame as it arrives off the socket.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    pub r#type: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JoinData {
    pub username: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartDraftData {
    pub username: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DraftPlayerData {
    pub username: String,
    pub player: Player,
}

/// Frames the coordinator sends out.
#[derive(Debug, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum Outbound<'a> {
    DraftState(&'a DraftState),
    ParticipantUpdate {
        participants: &'a [String],
        connected: Vec<String>,
    },
}
