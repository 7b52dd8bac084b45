/// Index into the draft order of whoever picks after the current drafter.
///
/// `history_len` counts picks made *before* the one that just happened, so
/// the round it falls in is `history_len / participant_count`. Even rounds
/// walk forward, odd rounds walk backward, and whoever ends a round also
/// opens the next one.
pub fn next_pick_index(current: usize, participant_count: usize, history_len: usize) -> usize {
    if participant_count == 0 {
        return 0;
    }

    let round = history_len / participant_count;
    if round % 2 == 1 {
        current.saturating_sub(1)
    } else if current + 1 >= participant_count {
        participant_count - 1
    } else {
        current + 1
    }
}

/// 1-based round number recorded on a pick.
pub fn round_of(history_len: usize, participant_count: usize) -> usize {
    if participant_count == 0 {
        return 1;
    }
    history_len / participant_count + 1
}
