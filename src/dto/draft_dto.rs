use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::dto::{player_dto::Player, roster_dto::{RosterState, Slot}};

/// The single record of draft progress.
///
/// Fields are crate-private: the only way to change a `DraftState` from
/// outside the crate is through the coordinator's join/start/pick operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftState {
    pub(crate) participants: Vec<String>,
    pub(crate) draft_order: Vec<String>,
    pub(crate) current_pick_index: usize,
    pub(crate) draft_history: Vec<Pick>,
    pub(crate) teams: BTreeMap<String, RosterState>,
    pub(crate) draft_started: bool,
    pub(crate) draft_complete: bool,
}

impl DraftState {
    pub fn participants(&self) -> &[String] {
        &self.participants
    }

    pub fn draft_order(&self) -> &[String] {
        &self.draft_order
    }

    pub fn current_pick_index(&self) -> usize {
        self.current_pick_index
    }

    pub fn history(&self) -> &[Pick] {
        &self.draft_history
    }

    pub fn roster(&self, username: &str) -> Option<&RosterState> {
        self.teams.get(username)
    }

    pub fn is_started(&self) -> bool {
        self.draft_started
    }

    pub fn is_complete(&self) -> bool {
        self.draft_complete
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pick {
    pub round: usize,
    pub pick_number: usize,
    pub drafter: String,
    pub player: Player,
    pub slot_filled: Slot,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    NotStarted,
    InProgress,
    Complete,
}

pub type SharedDraftState = Arc<RwLock<DraftState>>;
