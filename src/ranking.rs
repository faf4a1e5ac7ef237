use std::cmp::Reverse;

use crate::types::Conversation;

pub const DEFAULT_MESSAGE_THRESHOLD: usize = 20;

/// Keep conversations with at least `threshold` messages, largest first.
///
/// Equal counts are ordered by identifier, descending, so the order matches a
/// reversed sort on `(count, id)`.
pub fn filter_and_rank(conversations: Vec<Conversation>, threshold: usize) -> Vec<Conversation> {
    let mut retained: Vec<Conversation> = conversations
        .into_iter()
        .filter(|c| c.message_count() >= threshold)
        .collect();

    retained.sort_by(|a, b| {
        Reverse((a.message_count(), &a.id)).cmp(&Reverse((b.message_count(), &b.id)))
    });
    retained
}
