use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::dto::{
    draft_dto::DraftState,
    message_dto::{DraftPlayerData, Envelope, JoinData, Outbound, StartDraftData},
};
use crate::error::ProtocolError;

/// A decoded inbound frame.
#[derive(Debug, Clone)]
pub enum Command {
    Join(JoinData),
    StartDraft(StartDraftData),
    DraftPlayer(DraftPlayerData),
    Unknown(String),
}

pub fn decode(text: &str) -> Result<Command, ProtocolError> {
    let envelope: Envelope = serde_json::from_str(text).map_err(ProtocolError::Malformed)?;

    let command = match envelope.r#type.as_str() {
        "join" => {
            let data: JoinData = payload("join", envelope.data)?;
            require_username("join", &data.username)?;
            Command::Join(data)
        }
        "startDraft" => {
            let data: StartDraftData = payload("startDraft", envelope.data)?;
            require_username("startDraft", &data.username)?;
            Command::StartDraft(data)
        }
        "draftPlayer" => {
            let data: DraftPlayerData = payload("draftPlayer", envelope.data)?;
            require_username("draftPlayer", &data.username)?;
            Command::DraftPlayer(data)
        }
        _ => Command::Unknown(envelope.r#type),
    };

    Ok(command)
}

fn payload<T: DeserializeOwned>(kind: &'static str, data: Value) -> Result<T, ProtocolError> {
    serde_json::from_value(data).map_err(|source| ProtocolError::InvalidPayload { kind, source })
}

fn require_username(kind: &'static str, username: &str) -> Result<(), ProtocolError> {
    if username.trim().is_empty() {
        return Err(ProtocolError::EmptyUsername { kind });
    }
    Ok(())
}

pub fn encode_state(state: &DraftState) -> Result<String, ProtocolError> {
    serde_json::to_string(&Outbound::DraftState(state)).map_err(ProtocolError::Encode)
}

pub fn encode_participants(
    participants: &[String],
    connected: Vec<String>,
) -> Result<String, ProtocolError> {
    serde_json::to_string(&Outbound::ParticipantUpdate {
        participants,
        connected,
    })
    .map_err(ProtocolError::Encode)
}
