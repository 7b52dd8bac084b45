use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use thiserror::Error;

use crate::dto::{
    draft_dto::{DraftState, Phase, Pick},
    player_dto::Player,
    roster_dto::{PICKS_PER_PARTICIPANT, RosterState},
};
use crate::services::{roster_allocator, snake_order};

pub const MIN_PARTICIPANTS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Added,
    Rejoined,
}

/// Why a start or pick left the state alone. Never sent to the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("{0} is not allowed to start the draft")]
    NotPrivileged(String),

    #[error("need at least two participants, have {have}")]
    TooFewParticipants { have: usize },

    #[error("draft has already started")]
    AlreadyStarted,

    #[error("draft has not started")]
    NotStarted,

    #[error("draft is complete")]
    Complete,

    #[error("it is {expected}'s turn, not {actual}'s")]
    NotYourTurn { expected: String, actual: String },

    #[error("{0} has no open roster slot for this player")]
    NoSlotAvailable(String),
}

impl DraftState {
    pub fn phase(&self) -> Phase {
        match (self.draft_started, self.draft_complete) {
            (_, true) => Phase::Complete,
            (true, false) => Phase::InProgress,
            (false, false) => Phase::NotStarted,
        }
    }

    /// Participants taking part in the pick rotation. Late joiners are not
    /// counted once the order is fixed.
    pub fn participant_count(&self) -> usize {
        if self.draft_started {
            self.draft_order.len()
        } else {
            self.participants.len()
        }
    }

    pub fn current_drafter(&self) -> Option<&str> {
        if self.phase() != Phase::InProgress {
            return None;
        }
        self.draft_order
            .get(self.current_pick_index)
            .map(String::as_str)
    }

    pub fn join(&mut self, username: &str) -> JoinOutcome {
        if self.participants.iter().any(|p| p == username) {
            return JoinOutcome::Rejoined;
        }

        self.participants.push(username.to_string());
        self.teams
            .insert(username.to_string(), RosterState::default());
        JoinOutcome::Added
    }

    pub fn start_draft<R>(&mut self, username: &str, admin: &str, rng: &mut R) -> Result<(), Rejection>
    where
        R: Rng + ?Sized,
    {
        if username != admin {
            return Err(Rejection::NotPrivileged(username.to_string()));
        }
        if self.draft_started {
            return Err(Rejection::AlreadyStarted);
        }
        if self.participants.len() < MIN_PARTICIPANTS {
            return Err(Rejection::TooFewParticipants {
                have: self.participants.len(),
            });
        }

        let mut order = self.participants.clone();
        order.shuffle(rng);

        self.draft_order = order;
        self.current_pick_index = 0;
        self.draft_history.clear();
        self.draft_started = true;
        Ok(())
    }

    pub fn draft_player(
        &mut self,
        username: &str,
        player: Player,
        picked_at: DateTime<Utc>,
    ) -> Result<&Pick, Rejection> {
        if !self.draft_started {
            return Err(Rejection::NotStarted);
        }
        if self.draft_complete {
            return Err(Rejection::Complete);
        }

        let expected = self
            .draft_order
            .get(self.current_pick_index)
            .ok_or(Rejection::NotStarted)?;
        if expected != username {
            return Err(Rejection::NotYourTurn {
                expected: expected.clone(),
                actual: username.to_string(),
            });
        }

        let roster = self
            .teams
            .entry(username.to_string())
            .or_default();
        let slot = roster_allocator::allocate(roster, &player.position)
            .ok_or_else(|| Rejection::NoSlotAvailable(username.to_string()))?;
        if !roster.place(slot, player.clone()) {
            return Err(Rejection::NoSlotAvailable(username.to_string()));
        }

        let participant_count = self.participant_count();
        let history_len = self.draft_history.len();

        self.draft_history.push(Pick {
            round: snake_order::round_of(history_len, participant_count),
            pick_number: history_len + 1,
            drafter: username.to_string(),
            player,
            slot_filled: slot,
            timestamp: picked_at,
        });
        self.current_pick_index =
            snake_order::next_pick_index(self.current_pick_index, participant_count, history_len);

        if self.draft_history.len() == participant_count * PICKS_PER_PARTICIPANT {
            self.draft_complete = true;
        }

        Ok(&self.draft_history[history_len])
    }
}
