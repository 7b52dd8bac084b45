use serde::{Deserialize, Serialize};

use crate::dto::player_dto::Player;

pub const BENCH_CAPACITY: usize = 3;

/// Number of named starting slots, which is also the number of picks each
/// participant makes over a full draft.
pub const PICKS_PER_PARTICIPANT: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Slot {
    Top,
    Jungle,
    Mid,
    Adc,
    Support,
    Flex,
    Bench,
}

impl Slot {
    /// The dedicated starting slot for a nominal player position, if any.
    /// `FLEX` and `BENCH` are never a player's own position.
    pub fn for_position(position: &str) -> Option<Slot> {
        match position.trim().to_ascii_uppercase().as_str() {
            "TOP" => Some(Slot::Top),
            "JUNGLE" => Some(Slot::Jungle),
            "MID" => Some(Slot::Mid),
            "ADC" => Some(Slot::Adc),
            "SUPPORT" => Some(Slot::Support),
            _ => None,
        }
    }
}

/// One participant's team: six starting slots plus a capped bench.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct RosterState {
    pub top: Option<Player>,
    pub jungle: Option<Player>,
    pub mid: Option<Player>,
    pub adc: Option<Player>,
    pub support: Option<Player>,
    pub flex: Option<Player>,
    pub bench: Vec<Player>,
}

impl RosterState {
    fn starter(&self, slot: Slot) -> Option<&Option<Player>> {
        match slot {
            Slot::Top => Some(&self.top),
            Slot::Jungle => Some(&self.jungle),
            Slot::Mid => Some(&self.mid),
            Slot::Adc => Some(&self.adc),
            Slot::Support => Some(&self.support),
            Slot::Flex => Some(&self.flex),
            Slot::Bench => None,
        }
    }

    fn starter_mut(&mut self, slot: Slot) -> Option<&mut Option<Player>> {
        match slot {
            Slot::Top => Some(&mut self.top),
            Slot::Jungle => Some(&mut self.jungle),
            Slot::Mid => Some(&mut self.mid),
            Slot::Adc => Some(&mut self.adc),
            Slot::Support => Some(&mut self.support),
            Slot::Flex => Some(&mut self.flex),
            Slot::Bench => None,
        }
    }

    pub fn is_open(&self, slot: Slot) -> bool {
        match self.starter(slot) {
            Some(occupant) => occupant.is_none(),
            None => self.bench.len() < BENCH_CAPACITY,
        }
    }

    /// Puts `player` into `slot`. Returns `false` and leaves the roster
    /// untouched when the slot is already taken.
    pub fn place(&mut self, slot: Slot, player: Player) -> bool {
        if !self.is_open(slot) {
            return false;
        }
        match self.starter_mut(slot) {
            Some(occupant) => *occupant = Some(player),
            None => self.bench.push(player),
        }
        true
    }

    /// Players on the roster, starters and bench together.
    pub fn filled(&self) -> usize {
        [
            &self.top,
            &self.jungle,
            &self.mid,
            &self.adc,
            &self.support,
            &self.flex,
        ]
        .iter()
        .filter(|occupant| occupant.is_some())
        .count()
            + self.bench.len()
    }
}
