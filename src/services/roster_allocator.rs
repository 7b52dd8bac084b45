use crate::dto::roster_dto::{RosterState, Slot};

/// Picks the slot a newly drafted player lands in.
///
/// Priority is fixed: the player's own position, then FLEX, then the bench.
/// `None` means the roster has nowhere to put them and the pick is refused.
pub fn allocate(roster: &RosterState, position: &str) -> Option<Slot> {
    if let Some(slot) = Slot::for_position(position) {
        if roster.is_open(slot) {
            return Some(slot);
        }
    }

    if roster.is_open(Slot::Flex) {
        return Some(Slot::Flex);
    }

    if roster.is_open(Slot::Bench) {
        return Some(Slot::Bench);
    }

    None
}
